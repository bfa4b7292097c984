//! Core abstractions for crossbar readout simulation.
//!
//! This crate defines the shared types that the enumeration and programming
//! engines build on:
//!
//! - [`Device`], the capability trait a resistive memory element exposes
//! - [`Circuit`], a crossbar of owned devices behind an analog readout stage
//! - [`Architecture`], the two supported voltage-transfer architectures
//! - [`Observer`], which receives engine events and may return control
//!   actions

mod circuit;
mod device;
mod observer;

pub use circuit::{Architecture, Circuit, CircuitConfig, CircuitError};
pub use device::Device;
pub use observer::Observer;
