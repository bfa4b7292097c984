use std::error::Error as StdError;

use crossbar_core::{Circuit, Device};
use itertools::Itertools;

use crate::{
    Distribution, StateTable, VoltageMap,
    voltage_map::VoltageMapBuilder,
};

/// Errors that can occur during enumeration.
#[derive(Debug, thiserror::Error)]
pub enum EnumerateError {
    #[error("state table has {rows} rows but the circuit has {devices} devices")]
    DeviceCountMismatch { rows: usize, devices: usize },

    #[error("device error: {0}")]
    Device(#[source] Box<dyn StdError + Send + Sync>),
}

impl EnumerateError {
    fn device<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Device(Box::new(err))
    }
}

/// Exhaustively maps every achievable resistance combination to the
/// circuit's output voltage.
///
/// Under [`Distribution::Linear`] the combinations are all multisets of
/// size `n` drawn from the shared ladder (`C(nb_states + n - 1, n)` of
/// them); under [`Distribution::FullSpread`] the full cross-product of the
/// per-device ladders is walked with a mixed-radix index counter
/// (`nb_states^n` combinations).
///
/// Post-conditions: the returned map is sorted ascending by voltage, and
/// every device is left at its baseline low-resistance state (conductance
/// `1/r_on`).
///
/// # Errors
///
/// Returns an error if a full-spread table's row count does not match the
/// circuit's device count, or if a device read fails during voltage
/// computation.
pub fn enumerate<D: Device>(
    circuit: &mut Circuit<D>,
    table: &StateTable,
) -> Result<VoltageMap, EnumerateError> {
    let n = circuit.number_of_devices();
    let mut builder = VoltageMapBuilder::new();

    match table.distribution() {
        Distribution::Linear => {
            let ladder = table.row_for(0).to_vec();
            for combination in ladder.into_iter().combinations_with_replacement(n) {
                record(circuit, &combination, &mut builder)?;
            }
        }
        Distribution::FullSpread => {
            if table.rows().len() != n {
                return Err(EnumerateError::DeviceCountMismatch {
                    rows: table.rows().len(),
                    devices: n,
                });
            }

            let nb_states = table.nb_states();
            let mut indices = vec![0usize; n];
            let mut combination = vec![0.0; n];
            loop {
                for (j, &i) in indices.iter().enumerate() {
                    combination[j] = table.row_for(j)[i];
                }
                record(circuit, &combination, &mut builder)?;

                // Mixed-radix increment, rightmost digit fastest.
                let mut position = n;
                loop {
                    if position == 0 {
                        return finish(circuit, builder);
                    }
                    position -= 1;
                    indices[position] += 1;
                    if indices[position] < nb_states {
                        break;
                    }
                    indices[position] = 0;
                }
            }
        }
    }

    finish(circuit, builder)
}

/// Sets every device to one resistance combination and records the
/// resulting output voltage.
fn record<D: Device>(
    circuit: &mut Circuit<D>,
    combination: &[f64],
    builder: &mut VoltageMapBuilder,
) -> Result<(), EnumerateError> {
    for (device, &resistance) in circuit.devices_mut().iter_mut().zip(combination) {
        device.set_conductance(1.0 / resistance);
    }
    let voltage = circuit
        .output_voltage()
        .map_err(EnumerateError::device)?;
    builder.insert(voltage, combination.to_vec());
    Ok(())
}

/// Sorts the map and resets every device to its baseline conductance.
fn finish<D: Device>(
    circuit: &mut Circuit<D>,
    builder: VoltageMapBuilder,
) -> Result<VoltageMap, EnumerateError> {
    for device in circuit.devices_mut() {
        device.set_conductance(1.0 / device.r_on());
    }
    Ok(builder.finish())
}
