use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The adaptive pulse algorithm used to converge on a target resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Fixed-step voltage escalation, magnitude reset on direction change.
    Fabien,

    /// Logarithmic voltage growth when the resistance shift stalls.
    Log,
}

/// Error returned when an algorithm name is not recognized.
#[derive(Debug, thiserror::Error)]
#[error("unknown pulse algorithm: {name}")]
pub struct ParseAlgorithmError {
    pub name: String,
}

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fabien" => Ok(Self::Fabien),
            "log" => Ok(Self::Log),
            other => Err(ParseAlgorithmError {
                name: other.to_string(),
            }),
        }
    }
}

/// Tolerance around a target resistance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    /// Window of `target ± ohms`.
    Absolute(f64),

    /// Window of `target * (1 ± percent/100)`.
    Relative(f64),
}

impl Tolerance {
    /// The `(min, max)` acceptance window around `target`.
    pub fn window(&self, target: f64) -> (f64, f64) {
        match *self {
            Tolerance::Absolute(ohms) => (target - ohms, target + ohms),
            Tolerance::Relative(percent) => {
                let delta = target * percent / 100.0;
                (target - delta, target + delta)
            }
        }
    }

    fn value(&self) -> f64 {
        match *self {
            Tolerance::Absolute(v) | Tolerance::Relative(v) => v,
        }
    }
}

/// Configuration for a programming run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub algorithm: Algorithm,

    /// Acceptance window around each target resistance.
    pub tolerance: Tolerance,

    /// Magnitude cap for pulse voltages; `None` applies no limit.
    pub max_voltage: Option<f64>,

    /// Duration of one programming pulse, in seconds.
    pub pulse_duration: f64,

    /// Standard deviation of the Gaussian write variability; `0` disables it.
    pub write_std: f64,

    /// Seed for the write-variability buffer.
    pub seed: u64,

    /// Consecutive in-window reads required before a device counts as
    /// converged.
    pub number_of_reading: usize,

    /// Hard ceiling on pulses (reads included) per device.
    pub max_pulse: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Fabien,
            tolerance: Tolerance::Absolute(0.0),
            max_voltage: None,
            pulse_duration: 200e-9,
            write_std: 0.0,
            seed: 0,
            number_of_reading: 1,
            max_pulse: 20_000,
        }
    }
}

impl Config {
    /// Validates that all fields are in range.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range field.
    pub fn validate(&self) -> Result<(), &'static str> {
        let tolerance = self.tolerance.value();
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err("tolerance must be finite and non-negative");
        }
        if let Some(max_voltage) = self.max_voltage {
            if !max_voltage.is_finite() || max_voltage <= 0.0 {
                return Err("max_voltage must be finite and positive");
            }
        }
        if !self.pulse_duration.is_finite() || self.pulse_duration <= 0.0 {
            return Err("pulse_duration must be finite and positive");
        }
        if !self.write_std.is_finite() || self.write_std < 0.0 {
            return Err("write_std must be finite and non-negative");
        }
        if self.number_of_reading == 0 {
            return Err("number_of_reading must be at least 1");
        }
        if self.max_pulse == 0 {
            return Err("max_pulse must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names_round_trip() {
        assert_eq!("fabien".parse::<Algorithm>().unwrap(), Algorithm::Fabien);
        assert_eq!("log".parse::<Algorithm>().unwrap(), Algorithm::Log);
    }

    #[test]
    fn unknown_algorithm_name_is_rejected() {
        let err = "anneal".parse::<Algorithm>().unwrap_err();
        assert_eq!(err.name, "anneal");
    }

    #[test]
    fn absolute_window_is_symmetric_in_ohms() {
        let (min, max) = Tolerance::Absolute(50.0).window(500.0);
        assert_eq!((min, max), (450.0, 550.0));
    }

    #[test]
    fn relative_window_scales_with_target() {
        let (min, max) = Tolerance::Relative(10.0).window(500.0);
        assert_eq!((min, max), (450.0, 550.0));

        let (min, max) = Tolerance::Relative(10.0).window(2000.0);
        assert_eq!((min, max), (1800.0, 2200.0));
    }

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_fields() {
        let config = Config {
            tolerance: Tolerance::Absolute(-1.0),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            max_voltage: Some(0.0),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            pulse_duration: 0.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            write_std: f64::NAN,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            number_of_reading: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            max_pulse: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
