use serde::{Deserialize, Serialize};

use crate::Device;

/// The readout architecture wrapped around the crossbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// The devices sit in the feedback loop of an op-amp, so the output is
    /// inversely proportional to the total conductance:
    /// `V = (1/g) * (v_in / R_L)`.
    Feedback,

    /// A voltage-divider stage, with output proportional to conductance:
    /// `V = g * gain_resistance * v_in`.
    Divider,
}

/// Voltage-transfer parameters of the readout stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitConfig {
    pub architecture: Architecture,

    /// Gain of the divider stage, in ohms. Unused under [`Architecture::Feedback`].
    pub gain_resistance: f64,

    /// Input voltage, in volts.
    pub v_in: f64,

    /// Load resistance of the wires, in ohms.
    pub load_resistance: f64,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            architecture: Architecture::Feedback,
            gain_resistance: 0.0,
            v_in: 1e-3,
            load_resistance: 1.0,
        }
    }
}

/// Errors that can occur when constructing a circuit.
#[derive(Debug, thiserror::Error)]
pub enum CircuitError {
    #[error("circuit must contain at least one device")]
    NoDevices,

    #[error("prototype device has invalid resistance bounds: r_on = {r_on}, r_off = {r_off}")]
    InvalidDeviceBounds { r_on: f64, r_off: f64 },

    #[error("prototype device has non-positive time series resolution: {value}")]
    InvalidResolution { value: f64 },

    #[error("invalid circuit config: {reason}")]
    InvalidConfig { reason: &'static str },
}

/// A crossbar of independently owned devices behind an analog readout stage.
///
/// The device array is cloned from a single prototype at construction, so
/// mutating one device never affects another. The array length is fixed for
/// the circuit's lifetime.
#[derive(Debug, Clone)]
pub struct Circuit<D> {
    config: CircuitConfig,
    devices: Vec<D>,
}

impl<D: Device> Circuit<D> {
    /// Creates a circuit holding `count` independent clones of `prototype`.
    ///
    /// # Errors
    ///
    /// Returns a [`CircuitError`] if the prototype's bounds or resolution are
    /// degenerate, the device count is zero, or the transfer parameters are
    /// invalid. These are fatal configuration errors; no partially built
    /// circuit is ever returned.
    pub fn new(prototype: D, count: usize, config: CircuitConfig) -> Result<Self, CircuitError> {
        if count == 0 {
            return Err(CircuitError::NoDevices);
        }

        let (r_on, r_off) = (prototype.r_on(), prototype.r_off());
        if !r_on.is_finite() || !r_off.is_finite() || r_on <= 0.0 || r_off <= r_on {
            return Err(CircuitError::InvalidDeviceBounds { r_on, r_off });
        }

        let resolution = prototype.time_series_resolution();
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(CircuitError::InvalidResolution { value: resolution });
        }

        validate_config(&config)?;

        let devices = vec![prototype; count];
        Ok(Self { config, devices })
    }

    /// Number of devices in the crossbar.
    pub fn number_of_devices(&self) -> usize {
        self.devices.len()
    }

    /// The transfer parameters this circuit was built with.
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    /// Shared access to the device array.
    pub fn devices(&self) -> &[D] {
        &self.devices
    }

    /// Mutable access to the device array.
    pub fn devices_mut(&mut self) -> &mut [D] {
        &mut self.devices
    }

    /// The `(r_on, r_off)` bounds shared by every device in the crossbar.
    pub fn resistance_bounds(&self) -> (f64, f64) {
        let device = &self.devices[0];
        (device.r_on(), device.r_off())
    }

    /// Converts a total conductance into the readout stage's output voltage.
    ///
    /// Pure function of the scalar conductance; no device state is touched.
    pub fn voltage_from_conductance(&self, conductance: f64) -> f64 {
        match self.config.architecture {
            Architecture::Feedback => {
                (1.0 / conductance) * (self.config.v_in / self.config.load_resistance)
            }
            Architecture::Divider => {
                conductance * self.config.gain_resistance * self.config.v_in
            }
        }
    }

    /// Sums `1/resistance` over every device (parallel conductance rule).
    ///
    /// # Errors
    ///
    /// Returns the device model's error unmodified if any read fails. A zero
    /// resistance is the device model's contract to prevent; it is not
    /// guarded here.
    pub fn total_conductance(&self) -> Result<f64, D::Error> {
        let mut g = 0.0;
        for device in &self.devices {
            g += 1.0 / device.read()?;
        }
        Ok(g)
    }

    /// The circuit's current output voltage.
    ///
    /// # Errors
    ///
    /// Returns the device model's error unmodified if any read fails.
    pub fn output_voltage(&self) -> Result<f64, D::Error> {
        Ok(self.voltage_from_conductance(self.total_conductance()?))
    }
}

fn validate_config(config: &CircuitConfig) -> Result<(), CircuitError> {
    if !config.v_in.is_finite() {
        return Err(CircuitError::InvalidConfig {
            reason: "v_in must be finite",
        });
    }
    if !config.load_resistance.is_finite() || config.load_resistance <= 0.0 {
        return Err(CircuitError::InvalidConfig {
            reason: "load_resistance must be finite and positive",
        });
    }
    if !config.gain_resistance.is_finite() || config.gain_resistance < 0.0 {
        return Err(CircuitError::InvalidConfig {
            reason: "gain_resistance must be finite and non-negative",
        });
    }
    Ok(())
}
