use std::convert::Infallible;

use crossbar_core::Device;

/// A threshold-linear ion-drift device, used as the reference device model
/// in integration tests.
///
/// Voltage samples above the threshold drift the conductance up (lowering
/// resistance); samples below the negative threshold drift it down. The
/// conductance is clamped to the physical `[1/r_off, 1/r_on]` band after
/// every pulse.
#[derive(Debug, Clone)]
pub struct IonDriftDevice {
    conductance: f64,
    r_on: f64,
    r_off: f64,
    threshold: f64,
    drift_rate: f64,
    resolution: f64,
}

impl IonDriftDevice {
    /// A device spanning 100 ohms to 1 kiloohm, starting at `r_on`, with a
    /// drift rate tuned so a 0.5 V, 200 ns pulse moves the conductance by
    /// well under the width of a 10 % tolerance window.
    pub fn new() -> Self {
        Self::with_bounds(100.0, 1000.0)
    }

    pub fn with_bounds(r_on: f64, r_off: f64) -> Self {
        Self {
            conductance: 1.0 / r_on,
            r_on,
            r_off,
            threshold: 0.2,
            drift_rate: 500.0,
            resolution: 1e-9,
        }
    }
}

impl Default for IonDriftDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for IonDriftDevice {
    type Error = Infallible;

    fn read(&self) -> Result<f64, Self::Error> {
        Ok(1.0 / self.conductance)
    }

    fn apply(&mut self, signal: &[f64]) -> Result<(), Self::Error> {
        for &v in signal {
            if v > self.threshold {
                self.conductance += self.drift_rate * (v - self.threshold) * self.resolution;
            } else if v < -self.threshold {
                self.conductance -= self.drift_rate * (-v - self.threshold) * self.resolution;
            }
        }
        self.conductance = self.conductance.clamp(1.0 / self.r_off, 1.0 / self.r_on);
        Ok(())
    }

    fn conductance(&self) -> f64 {
        self.conductance
    }

    fn set_conductance(&mut self, siemens: f64) {
        self.conductance = siemens;
    }

    fn r_on(&self) -> f64 {
        self.r_on
    }

    fn r_off(&self) -> f64 {
        self.r_off
    }

    fn time_series_resolution(&self) -> f64 {
        self.resolution
    }
}
