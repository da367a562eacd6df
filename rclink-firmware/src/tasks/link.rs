//! Link task
//!
//! Owns the engine and polls it every millisecond. Control inputs are
//! forwarded as they arrive; a quiet link trips failsafe.

use defmt::*;
use embassy_time::{Duration, Ticker};
use static_cell::StaticCell;

use rclink_hal::Clock;
use rclink_hal_rp2040::{EmbassyClock, LinkUart};
use rclink_protocol::{
    region_of, wire, DiscardReason, Engine, LinkConfig, LinkHooks, WireItem,
};

use crate::channels::{LinkStatus, CONTROL, LINK_STATUS, TELEMETRY};
use crate::items::{ControlInputs, Telemetry, CONTROL_ID, TELEMETRY_ID};

/// Engine poll period
const POLL_INTERVAL_MS: u64 = 1;

/// Silence on the control item before outputs drop to failsafe
const FAILSAFE_TIMEOUT_MS: u32 = 500;

static CONTROL_BUF: StaticCell<[u8; ControlInputs::WIRE_SIZE]> = StaticCell::new();
static TELEMETRY_BUF: StaticCell<[u8; Telemetry::WIRE_SIZE]> = StaticCell::new();

/// Hooks that log what the engine could not use
struct LogHooks;

impl LinkHooks for LogHooks {
    fn unknown_packet(&mut self, kind: u8, remaining: &[u8]) -> usize {
        debug!(
            "unknown packet type {=u8:#x}, dropping {} bytes",
            kind,
            remaining.len()
        );
        0
    }

    fn discarding_data(&mut self, bytes: &[u8], reason: DiscardReason) {
        warn!("discarding {} bytes: {}", bytes.len(), reason);
    }
}

/// Link task - talks to the transmitter over UART0
#[embassy_executor::task]
pub async fn link_task(uart: LinkUart) {
    info!("Link task started");

    let control = region_of(CONTROL_BUF.init([0; ControlInputs::WIRE_SIZE]));
    let telemetry = region_of(TELEMETRY_BUF.init([0; Telemetry::WIRE_SIZE]));

    // The transmitter opens the conversation
    let mut engine = Engine::with_hooks(uart, LinkConfig::default(), LogHooks);
    let bound = engine
        .bind(CONTROL_ID, Some(control), false)
        .and_then(|()| engine.bind(TELEMETRY_ID, Some(telemetry), true));
    if let Err(e) = bound {
        error!("Item binding failed: {}", e);
        return;
    }
    engine.begin();

    let clock = EmbassyClock;
    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    let mut last_control = clock.now_ms();
    let mut failsafe = true;
    let mut synchronized = false;
    CONTROL.signal(ControlInputs::FAILSAFE);

    loop {
        ticker.next().await;
        engine.poll(&clock);
        let now = clock.now_ms();

        if engine.is_synchronized() != synchronized {
            synchronized = engine.is_synchronized();
            info!("Link synchronized (peer frame {})", engine.remote_serial());
        }

        match engine.take::<ControlInputs>(CONTROL_ID) {
            Ok(Some(inputs)) => {
                last_control = now;
                if failsafe {
                    info!("Control restored");
                    failsafe = false;
                }
                CONTROL.signal(inputs.clamped());
            }
            Ok(None) => {
                if !failsafe && now.wrapping_sub(last_control) >= FAILSAFE_TIMEOUT_MS {
                    warn!("No control for {} ms, entering failsafe", FAILSAFE_TIMEOUT_MS);
                    failsafe = true;
                    CONTROL.signal(ControlInputs::FAILSAFE);
                }
            }
            Err(e) => warn!("Control item unreadable: {}", e),
        }

        if let Some(mut report) = TELEMETRY.try_take() {
            report.failsafe = failsafe;
            // Autosend picks the new value up on its next cycle
            if let Err(e) = wire::store(telemetry, &report) {
                warn!("Telemetry item unwritable: {}", e);
            }
        }

        LINK_STATUS.signal(LinkStatus {
            rejected_frames: engine.stats().frames_rejected(),
            failsafe,
        });
    }
}
