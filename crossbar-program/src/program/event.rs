use crate::trace::PulseAction;

/// Control actions supported by the programming loop.
pub enum Action {
    /// Stop the current device's convergence loop early.
    StopEarly,
}

/// Per-pulse event emitted while a device converges.
#[derive(Debug, Clone, Copy)]
pub struct Event {
    /// Index of the device being programmed.
    pub device: usize,

    /// Pulse counter within this device's loop (0-based, reads included).
    pub pulse: usize,

    pub action: PulseAction,

    /// Resistance read at the top of this iteration, in ohms.
    pub resistance: f64,

    /// Voltage applied this iteration, in volts.
    pub voltage: f64,
}
