//! Closed-loop pulsed programming of crossbar device resistances.
//!
//! Given the [`VoltageMap`](crossbar_sim::VoltageMap) produced by
//! enumeration, the [`Programmer`] drives every device of a circuit to its
//! assigned target resistance with one of two adaptive pulse algorithms:
//!
//! - [`Algorithm::Fabien`]: fixed-step voltage escalation, reset on
//!   direction change
//! - [`Algorithm::Log`]: logarithmic voltage growth when progress stalls,
//!   reset when progress is fast
//!
//! Each pulse perturbs the written conductance with a seeded Gaussian
//! write-variability factor, and every pulse is recorded in an append-only
//! [`Trace`]. Convergence is reported per device as a
//! [`Status`](program::Status): reaching the pulse ceiling is a soft stop,
//! never an error.

mod config;
mod noise;
pub mod program;
mod trace;

pub use config::{Algorithm, Config, ParseAlgorithmError, Tolerance};
pub use noise::WriteVariability;
pub use program::Programmer;
pub use trace::{PulseAction, ResistancePoint, Trace, VoltagePoint};
