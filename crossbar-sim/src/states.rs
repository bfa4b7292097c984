use crossbar_core::{Circuit, Device};
use serde::{Deserialize, Serialize};

/// Policy for distributing target resistance states across devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// One ladder of evenly spaced states, shared identically by all devices.
    Linear,

    /// An independent, symmetrically offset ladder per device, so identical
    /// nominal states do not collapse to identical physical resistances.
    FullSpread,
}

/// Errors that can occur when building a state table.
#[derive(Debug, thiserror::Error)]
pub enum StateTableError {
    #[error("state count {nb_states} is degenerate; at least 2 states are required")]
    DegenerateStateCount { nb_states: usize },
}

/// Target resistance ladders for every device in a circuit.
///
/// Each ladder spans `[r_on, r_off]` with its first and last entries pinned
/// exactly to the bounds. Built once per enumeration run; immutable after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTable {
    distribution: Distribution,
    nb_states: usize,
    rows: Vec<Vec<f64>>,
}

impl StateTable {
    /// Builds the resistance ladders for `circuit` under `distribution`.
    ///
    /// Values are truncated to integer resistance units, except the pinned
    /// `r_on`/`r_off` endpoints which are kept exact.
    ///
    /// # Errors
    ///
    /// Returns [`StateTableError::DegenerateStateCount`] if `nb_states < 2`,
    /// since the spacing formula divides by `nb_states - 1`.
    pub fn build<D: Device>(
        circuit: &Circuit<D>,
        nb_states: usize,
        distribution: Distribution,
    ) -> Result<Self, StateTableError> {
        if nb_states < 2 {
            return Err(StateTableError::DegenerateStateCount { nb_states });
        }

        let (r_on, r_off) = circuit.resistance_bounds();
        let spacing = (r_off - r_on) / (nb_states - 1) as f64;

        let rows = match distribution {
            Distribution::Linear => {
                let mut row: Vec<f64> = (0..nb_states)
                    .map(|i| (r_on + i as f64 * spacing).trunc())
                    .collect();
                pin_endpoints(&mut row, r_on, r_off);
                vec![row]
            }
            Distribution::FullSpread => (0..circuit.number_of_devices())
                .map(|j| {
                    let offset = spread_offset(j, r_on, r_off, nb_states);
                    let mut row: Vec<f64> = (0..nb_states)
                        .map(|i| (r_on + i as f64 * spacing + offset).trunc())
                        .collect();
                    pin_endpoints(&mut row, r_on, r_off);
                    row
                })
                .collect(),
        };

        Ok(Self {
            distribution,
            nb_states,
            rows,
        })
    }

    /// The distribution policy this table was built with.
    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    /// Number of states per ladder.
    pub fn nb_states(&self) -> usize {
        self.nb_states
    }

    /// All ladders: one row under [`Distribution::Linear`], one per device
    /// under [`Distribution::FullSpread`].
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// The ladder assigned to `device_index`.
    pub fn row_for(&self, device_index: usize) -> &[f64] {
        match self.distribution {
            Distribution::Linear => &self.rows[0],
            Distribution::FullSpread => &self.rows[device_index],
        }
    }
}

/// Per-device ladder offset: alternating sign, growing every two devices,
/// an eighth of the nominal spacing in scale.
fn spread_offset(device_index: usize, r_on: f64, r_off: f64, nb_states: usize) -> f64 {
    let sign = if device_index % 2 == 0 { 1.0 } else { -1.0 };
    let magnitude = ((device_index + 1) / 2) as f64;
    sign * magnitude * (r_off - r_on) / ((nb_states - 1) as f64 * 8.0)
}

fn pin_endpoints(row: &mut [f64], r_on: f64, r_off: f64) {
    row[0] = r_on;
    *row.last_mut().expect("rows are never empty") = r_off;
}
