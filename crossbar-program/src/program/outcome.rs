use serde::{Deserialize, Serialize};

/// Indicates how a device's convergence loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// The required number of consecutive in-window reads was reached.
    Converged,

    /// The pulse ceiling was reached without convergence. A soft stop, not
    /// an error; the final resistance may be outside the window.
    MaxPulses,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The result of programming one device to one target resistance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceOutcome {
    /// Index of the device within the circuit.
    pub device: usize,

    /// Target resistance, in ohms.
    pub target: f64,

    /// Resistance read after the loop ended, in ohms.
    pub final_resistance: f64,

    /// Pulses issued (reads included) before the loop ended.
    pub pulses: usize,

    pub status: Status,
}

/// Per-device outcomes for one resistance combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationOutcome {
    pub devices: Vec<DeviceOutcome>,
}

impl CombinationOutcome {
    /// True iff every device in the combination converged.
    pub fn converged(&self) -> bool {
        self.devices
            .iter()
            .all(|outcome| outcome.status == Status::Converged)
    }
}
