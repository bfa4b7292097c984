//! Exhaustive state enumeration for crossbar readout circuits.
//!
//! Given a [`Circuit`](crossbar_core::Circuit) and a number of target
//! resistance states per device, this crate:
//!
//! 1. Builds a [`StateTable`] of candidate resistance ladders according to a
//!    [`Distribution`] policy.
//! 2. [`enumerate`]s every achievable combination of device resistances and
//!    maps each combination to the circuit's output voltage, producing a
//!    [`VoltageMap`] ordered ascending by voltage.
//!
//! Enumeration leaves every device at its baseline low-resistance state
//! (conductance `1/r_on`), the documented post-condition the programming
//! engine depends on.

mod enumerate;
mod states;
mod voltage_map;

pub use enumerate::{EnumerateError, enumerate};
pub use states::{Distribution, StateTable, StateTableError};
pub use voltage_map::{VoltageEntry, VoltageMap};
