//! Telemetry sampling task

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_time::{Duration, Instant, Ticker};

use crate::channels::{LinkStatus, LINK_STATUS, TELEMETRY};
use crate::items::Telemetry;

/// How often a fresh report is produced
const REPORT_INTERVAL_MS: u64 = 1000;

/// Convert a 12-bit reading of VSYS/3 against 3.3 V to millivolts
fn vsys_millivolts(raw: u16) -> u16 {
    (u32::from(raw) * 3 * 3300 / 4096) as u16
}

/// Telemetry task - samples supply voltage and link health
#[embassy_executor::task]
pub async fn telemetry_task(mut adc: Adc<'static, Async>, mut vsys: Channel<'static>) {
    info!("Telemetry task started");

    let mut ticker = Ticker::every(Duration::from_millis(REPORT_INTERVAL_MS));
    let mut status = LinkStatus::default();

    loop {
        ticker.next().await;

        if let Some(latest) = LINK_STATUS.try_take() {
            status = latest;
        }

        let battery_mv = match adc.read(&mut vsys).await {
            Ok(raw) => vsys_millivolts(raw),
            Err(e) => {
                warn!("VSYS read failed: {:?}", e);
                0
            }
        };

        let report = Telemetry {
            battery_mv,
            uptime_s: Instant::now().as_secs() as u32,
            link_errors: status.rejected_frames.min(u32::from(u16::MAX)) as u16,
            failsafe: status.failsafe,
        };
        trace!("Telemetry: {}", report);
        TELEMETRY.signal(report);
    }
}
