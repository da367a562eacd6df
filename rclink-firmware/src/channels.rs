//! Inter-task communication channels

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::items::{ControlInputs, Telemetry};

/// Latest control inputs (or failsafe), updated by the link task
pub static CONTROL: Signal<CriticalSectionRawMutex, ControlInputs> = Signal::new();

/// Fresh telemetry for the link task to autosend
pub static TELEMETRY: Signal<CriticalSectionRawMutex, Telemetry> = Signal::new();

/// Link health, updated by the link task
pub static LINK_STATUS: Signal<CriticalSectionRawMutex, LinkStatus> = Signal::new();

/// Snapshot of link health for the telemetry task
#[derive(Debug, Clone, Copy, Default, defmt::Format)]
pub struct LinkStatus {
    pub rejected_frames: u32,
    pub failsafe: bool,
}
