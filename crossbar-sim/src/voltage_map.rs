use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Scale factor keying voltages to 12 decimal digits.
const VOLTAGE_KEY_SCALE: f64 = 1e12;

/// One achievable output voltage and the per-device resistances producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageEntry {
    /// Output voltage, rounded to 12 decimal digits.
    pub voltage: f64,

    /// The resistance assigned to each device, in index order.
    pub resistances: Vec<f64>,
}

/// Every achievable output voltage of a circuit, ascending by voltage.
///
/// Keys are voltages rounded to a fixed precision; distinct resistance
/// tuples that round to the same voltage collide, and the later tuple
/// silently overwrites the earlier one. This mirrors the measurement
/// reality that such states are indistinguishable at the readout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VoltageMap {
    entries: Vec<VoltageEntry>,
}

impl VoltageMap {
    /// The entries, ascending by voltage.
    pub fn entries(&self) -> &[VoltageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VoltageEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a VoltageMap {
    type Item = &'a VoltageEntry;
    type IntoIter = std::slice::Iter<'a, VoltageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Accumulates voltage/resistance pairs during enumeration.
#[derive(Debug, Default)]
pub(crate) struct VoltageMapBuilder {
    by_key: HashMap<u64, VoltageEntry>,
}

impl VoltageMapBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records one combination, overwriting any earlier tuple whose voltage
    /// rounds to the same key.
    pub(crate) fn insert(&mut self, voltage: f64, resistances: Vec<f64>) {
        let rounded = round_voltage(voltage);
        self.by_key.insert(
            rounded.to_bits(),
            VoltageEntry {
                voltage: rounded,
                resistances,
            },
        );
    }

    /// Finishes the map, sorting entries ascending by voltage.
    pub(crate) fn finish(self) -> VoltageMap {
        let mut entries: Vec<VoltageEntry> = self.by_key.into_values().collect();
        entries.sort_by(|a, b| a.voltage.total_cmp(&b.voltage));
        VoltageMap { entries }
    }
}

pub(crate) fn round_voltage(voltage: f64) -> f64 {
    let rounded = (voltage * VOLTAGE_KEY_SCALE).round() / VOLTAGE_KEY_SCALE;
    // Negative zero would key apart from positive zero under to_bits.
    if rounded == 0.0 { 0.0 } else { rounded }
}
