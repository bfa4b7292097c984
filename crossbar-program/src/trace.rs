use serde::{Deserialize, Serialize};

/// What a single programming iteration did to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseAction {
    /// The device was inside the tolerance window; only a read was issued.
    Read,

    /// A positive pulse was applied to lower the resistance.
    Set,

    /// A negative pulse was applied to raise the resistance.
    Reset,
}

/// One resistance sample of the convergence trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResistancePoint {
    /// Resistance read at this iteration, in ohms.
    pub resistance: f64,

    /// Pulse index within the device's convergence loop.
    pub pulse: usize,

    pub action: PulseAction,

    /// True on the iteration that ended the device's loop.
    pub finished: bool,
}

/// One applied-voltage sample of the convergence trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoltagePoint {
    /// Voltage applied at this iteration, in volts. Pure reads record the
    /// fixed read voltage.
    pub voltage: f64,

    /// Pulse index within the device's convergence loop.
    pub pulse: usize,

    pub action: PulseAction,
}

/// Append-only record of every pulse across a whole programming run.
///
/// Grows monotonically across all combinations and devices; never
/// truncated. Used only for post-hoc diagnostics and persistence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trace {
    pub resistances: Vec<ResistancePoint>,
    pub voltages: Vec<VoltagePoint>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }
}
