//! Closed-loop pulse programming of device resistances.
//!
//! The [`Programmer`] drives a device toward a target resistance by reading
//! it and issuing set (positive) or reset (negative) voltage pulses until
//! the read falls inside the tolerance window for the configured number of
//! consecutive reads, or the pulse ceiling is reached.
//!
//! Two adaptive-step algorithms are provided:
//!
//! - [`Algorithm::Fabien`] escalates the active direction's magnitude by a
//!   fixed step each pulse and resets the opposite direction to its base.
//! - [`Algorithm::Log`] grows the magnitude logarithmically when the
//!   observed resistance shift stalls and resets it when progress is fast.
//!
//! # Observer
//!
//! Every iteration emits an [`Event`]; the observer may return
//! [`Action::StopEarly`] to end the current device's loop with
//! [`Status::StoppedByObserver`].

mod error;
mod event;
mod outcome;

pub use error::Error;
pub use event::{Action, Event};
pub use outcome::{CombinationOutcome, DeviceOutcome, Status};

use crossbar_core::{Circuit, Device, Observer};
use crossbar_sim::VoltageMap;

use crate::{
    Algorithm, Config, WriteVariability,
    trace::{PulseAction, ResistancePoint, Trace, VoltagePoint},
};

/// Base magnitude for set and reset pulses, in volts.
const BASE_VOLTAGE: f64 = 0.5;

/// Fixed escalation step of the fabien algorithm, in volts.
const FABIEN_STEP: f64 = 0.005;

/// Voltage recorded for pure read iterations, in volts.
const READ_VOLTAGE: f64 = 0.2;

/// Below this fraction of the device's resistance range, a shift counts as
/// stalled and the log algorithm grows its magnitude.
const LOG_MIN_SHIFT_FRACTION: f64 = 0.005;

/// Above this fraction of the device's resistance range, a shift counts as
/// fast and the log algorithm resets its magnitude.
const LOG_MAX_SHIFT_FRACTION: f64 = 0.2;

/// Gain of the log algorithm's magnitude growth term.
const LOG_GAIN: f64 = 0.1;

/// Programs devices to target resistances, accumulating a run-wide trace.
#[derive(Debug, Clone)]
pub struct Programmer {
    config: Config,
    noise: WriteVariability,
    trace: Trace,
}

impl Programmer {
    /// Creates a programmer from a validated config.
    ///
    /// The write-variability buffer is seeded here, before any pulse is
    /// issued, so the whole run is reproducible from `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any config field is out of range.
    pub fn new(config: Config) -> Result<Self, Error> {
        config
            .validate()
            .map_err(|reason| Error::InvalidConfig { reason })?;

        Ok(Self {
            noise: WriteVariability::new(config.write_std, config.seed),
            config,
            trace: Trace::new(),
        })
    }

    /// The config this programmer was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The trace accumulated so far.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Consumes the programmer, returning the accumulated trace.
    pub fn into_trace(self) -> Trace {
        self.trace
    }

    /// Programs a single device to `target` ohms.
    ///
    /// Convergence targets the device's own `read()`, not the circuit
    /// output.
    ///
    /// # Errors
    ///
    /// Returns an error only if the device model itself fails; exhausting
    /// the pulse ceiling is reported as [`Status::MaxPulses`].
    pub fn program_device<D, Obs>(
        &mut self,
        device: &mut D,
        target: f64,
        mut observer: Obs,
    ) -> Result<DeviceOutcome, Error>
    where
        D: Device,
        Obs: Observer<Event, Action>,
    {
        self.converge(device, 0, target, &mut observer)
    }

    /// Programs a single device without observation.
    ///
    /// # Errors
    ///
    /// Returns an error if the device model fails.
    pub fn program_device_unobserved<D: Device>(
        &mut self,
        device: &mut D,
        target: f64,
    ) -> Result<DeviceOutcome, Error> {
        self.program_device(device, target, ())
    }

    /// Programs every device of `circuit` to its entry in `targets`, in
    /// index order. Devices are programmed independently; no cross-device
    /// coupling is consulted during convergence.
    ///
    /// # Errors
    ///
    /// Returns an error if the target count does not match the device count
    /// or if the device model fails.
    pub fn program_combination<D, Obs>(
        &mut self,
        circuit: &mut Circuit<D>,
        targets: &[f64],
        mut observer: Obs,
    ) -> Result<CombinationOutcome, Error>
    where
        D: Device,
        Obs: Observer<Event, Action>,
    {
        self.converge_combination(circuit, targets, &mut observer)
    }

    /// Programs a combination without observation.
    ///
    /// # Errors
    ///
    /// Returns an error if the target count does not match the device count
    /// or if the device model fails.
    pub fn program_combination_unobserved<D: Device>(
        &mut self,
        circuit: &mut Circuit<D>,
        targets: &[f64],
    ) -> Result<CombinationOutcome, Error> {
        self.program_combination(circuit, targets, ())
    }

    /// Programs the circuit to every resistance combination of the map in
    /// turn. This is the expensive outer loop of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the device model fails; per-combination
    /// non-convergence is reported through the outcomes.
    pub fn program_all<D, Obs>(
        &mut self,
        circuit: &mut Circuit<D>,
        map: &VoltageMap,
        mut observer: Obs,
    ) -> Result<Vec<CombinationOutcome>, Error>
    where
        D: Device,
        Obs: Observer<Event, Action>,
    {
        let mut outcomes = Vec::with_capacity(map.len());
        for entry in map {
            outcomes.push(self.converge_combination(circuit, &entry.resistances, &mut observer)?);
        }
        Ok(outcomes)
    }

    /// Programs the whole map without observation.
    ///
    /// # Errors
    ///
    /// Returns an error if the device model fails.
    pub fn program_all_unobserved<D: Device>(
        &mut self,
        circuit: &mut Circuit<D>,
        map: &VoltageMap,
    ) -> Result<Vec<CombinationOutcome>, Error> {
        self.program_all(circuit, map, ())
    }

    /// Programs every device of `circuit` to its target, sharing one
    /// observer across the per-device loops.
    fn converge_combination<D, Obs>(
        &mut self,
        circuit: &mut Circuit<D>,
        targets: &[f64],
        observer: &mut Obs,
    ) -> Result<CombinationOutcome, Error>
    where
        D: Device,
        Obs: Observer<Event, Action>,
    {
        if targets.len() != circuit.number_of_devices() {
            return Err(Error::TargetCountMismatch {
                targets: targets.len(),
                devices: circuit.number_of_devices(),
            });
        }

        let mut devices = Vec::with_capacity(targets.len());
        for (index, &target) in targets.iter().enumerate() {
            let device = &mut circuit.devices_mut()[index];
            devices.push(self.converge(device, index, target, observer)?);
        }

        Ok(CombinationOutcome { devices })
    }

    fn converge<D, Obs>(
        &mut self,
        device: &mut D,
        index: usize,
        target: f64,
        observer: &mut Obs,
    ) -> Result<DeviceOutcome, Error>
    where
        D: Device,
        Obs: Observer<Event, Action>,
    {
        match self.config.algorithm {
            Algorithm::Fabien => self.fabien_convergence(device, index, target, observer),
            Algorithm::Log => self.log_convergence(device, index, target, observer),
        }
    }

    /// Fixed-step convergence: the active direction's magnitude grows by
    /// [`FABIEN_STEP`] each pulse, and switching direction resets the new
    /// direction to [`BASE_VOLTAGE`].
    fn fabien_convergence<D, Obs>(
        &mut self,
        device: &mut D,
        index: usize,
        target: f64,
        observer: &mut Obs,
    ) -> Result<DeviceOutcome, Error>
    where
        D: Device,
        Obs: Observer<Event, Action>,
    {
        let (res_min, res_max) = self.config.tolerance.window(target);
        let mut set_voltage = BASE_VOLTAGE;
        let mut reset_voltage = BASE_VOLTAGE;
        let mut pulse = 0;
        let mut good_reads = 0;

        loop {
            let current = device.read().map_err(Error::device)?;

            let (action, applied) = if current >= res_min && current <= res_max {
                good_reads += 1;
                (PulseAction::Read, READ_VOLTAGE)
            } else if current < res_min {
                // Resistance too low; a negative pulse raises it.
                good_reads = 0;
                reset_voltage = self.clamp(reset_voltage);
                let applied = -reset_voltage;
                self.write(device, applied)?;
                reset_voltage += FABIEN_STEP;
                set_voltage = BASE_VOLTAGE;
                (PulseAction::Reset, applied)
            } else {
                good_reads = 0;
                set_voltage = self.clamp(set_voltage);
                let applied = set_voltage;
                self.write(device, applied)?;
                set_voltage += FABIEN_STEP;
                reset_voltage = BASE_VOLTAGE;
                (PulseAction::Set, applied)
            };

            if let Some(outcome) = self.finish_iteration(
                device, index, target, &mut pulse, good_reads, current, action, applied, observer,
            )? {
                return Ok(outcome);
            }
        }
    }

    /// Logarithmic convergence: coarse corrections when the resistance
    /// shift stalls, cautious steps when progress is fast.
    fn log_convergence<D, Obs>(
        &mut self,
        device: &mut D,
        index: usize,
        target: f64,
        observer: &mut Obs,
    ) -> Result<DeviceOutcome, Error>
    where
        D: Device,
        Obs: Observer<Event, Action>,
    {
        let (res_min, res_max) = self.config.tolerance.window(target);
        let range = device.r_off() - device.r_on();
        let mut set_voltage = BASE_VOLTAGE;
        let mut reset_voltage = BASE_VOLTAGE;
        let mut pulse = 0;
        let mut good_reads = 0;

        // Shift of 1 ohm assumed before the first pulse, avoiding the
        // log-term singularity.
        let mut r_shift = 1.0;
        let mut current = device.read().map_err(Error::device)?;

        loop {
            let (action, applied) = if current > res_min && current < res_max {
                good_reads += 1;
                (PulseAction::Read, READ_VOLTAGE)
            } else if current > res_max {
                good_reads = 0;
                if r_shift < LOG_MIN_SHIFT_FRACTION * range {
                    set_voltage += LOG_GAIN * ((target - current).abs() / r_shift).log10();
                } else if r_shift > LOG_MAX_SHIFT_FRACTION * range {
                    set_voltage = BASE_VOLTAGE;
                }
                set_voltage = self.clamp(set_voltage);
                let applied = set_voltage;
                self.write(device, applied)?;
                (PulseAction::Set, applied)
            } else {
                good_reads = 0;
                if r_shift < LOG_MIN_SHIFT_FRACTION * range {
                    reset_voltage += LOG_GAIN * ((target - current).abs() / r_shift).log10();
                } else if r_shift > LOG_MAX_SHIFT_FRACTION * range {
                    reset_voltage = BASE_VOLTAGE;
                }
                reset_voltage = self.clamp(reset_voltage);
                let applied = -reset_voltage;
                self.write(device, applied)?;
                (PulseAction::Reset, applied)
            };

            if let Some(outcome) = self.finish_iteration(
                device, index, target, &mut pulse, good_reads, current, action, applied, observer,
            )? {
                return Ok(outcome);
            }

            let previous = current;
            current = device.read().map_err(Error::device)?;
            let shift = (current - previous).abs();
            r_shift = if shift == 0.0 { 1.0 } else { shift };
        }
    }

    /// Records the iteration in the trace, consults the observer, and
    /// decides whether the loop is over.
    #[allow(clippy::too_many_arguments)]
    fn finish_iteration<D, Obs>(
        &mut self,
        device: &D,
        index: usize,
        target: f64,
        pulse: &mut usize,
        good_reads: usize,
        current: f64,
        action: PulseAction,
        applied: f64,
        observer: &mut Obs,
    ) -> Result<Option<DeviceOutcome>, Error>
    where
        D: Device,
        Obs: Observer<Event, Action>,
    {
        // Convergence wins if both conditions are met on the same pulse.
        let status = if good_reads >= self.config.number_of_reading {
            Some(Status::Converged)
        } else if *pulse + 1 >= self.config.max_pulse {
            Some(Status::MaxPulses)
        } else {
            None
        };

        self.trace.voltages.push(VoltagePoint {
            voltage: applied,
            pulse: *pulse,
            action,
        });
        self.trace.resistances.push(ResistancePoint {
            resistance: current,
            pulse: *pulse,
            action,
            finished: status.is_some(),
        });

        let event = Event {
            device: index,
            pulse: *pulse,
            action,
            resistance: current,
            voltage: applied,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            *pulse += 1;
            return Ok(Some(outcome(
                device,
                index,
                target,
                *pulse,
                Status::StoppedByObserver,
            )?));
        }

        *pulse += 1;
        match status {
            Some(status) => Ok(Some(outcome(device, index, target, *pulse, status)?)),
            None => Ok(None),
        }
    }

    fn clamp(&self, magnitude: f64) -> f64 {
        match self.config.max_voltage {
            Some(max) => magnitude.min(max),
            None => magnitude,
        }
    }

    /// Applies one constant-voltage pulse, then perturbs the resulting
    /// conductance by the next write-variability factor.
    fn write<D: Device>(&mut self, device: &mut D, voltage: f64) -> Result<(), Error> {
        let resolution = device.time_series_resolution();
        let samples = (self.config.pulse_duration / resolution).max(1.0) as usize;
        let signal = vec![voltage; samples];
        device.apply(&signal).map_err(Error::device)?;

        let conductance = device.conductance();
        let perturbed = conductance + conductance * self.noise.next_factor();
        // A perturbation driving the conductance non-physical is discarded
        // rather than propagated into the read path.
        if perturbed.is_finite() && perturbed > 0.0 {
            device.set_conductance(perturbed);
        }
        Ok(())
    }
}

fn outcome<D: Device>(
    device: &D,
    index: usize,
    target: f64,
    pulses: usize,
    status: Status,
) -> Result<DeviceOutcome, Error> {
    let final_resistance = device.read().map_err(Error::device)?;
    Ok(DeviceOutcome {
        device: index,
        target,
        final_resistance,
        pulses,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use crate::Tolerance;

    /// A device whose conductance drifts linearly with over-threshold
    /// voltage, clamped to its physical bounds.
    #[derive(Debug, Clone)]
    struct DriftDevice {
        g: f64,
        r_on: f64,
        r_off: f64,
        threshold: f64,
        rate: f64,
    }

    impl DriftDevice {
        fn new(r_on: f64, r_off: f64) -> Self {
            Self {
                g: 1.0 / r_on,
                r_on,
                r_off,
                threshold: 0.2,
                rate: 500.0,
            }
        }
    }

    impl Device for DriftDevice {
        type Error = Infallible;

        fn read(&self) -> Result<f64, Self::Error> {
            Ok(1.0 / self.g)
        }

        fn apply(&mut self, signal: &[f64]) -> Result<(), Self::Error> {
            let dt = self.time_series_resolution();
            for &v in signal {
                if v > self.threshold {
                    self.g += self.rate * (v - self.threshold) * dt;
                } else if v < -self.threshold {
                    self.g -= self.rate * (-v - self.threshold) * dt;
                }
            }
            self.g = self.g.clamp(1.0 / self.r_off, 1.0 / self.r_on);
            Ok(())
        }

        fn conductance(&self) -> f64 {
            self.g
        }

        fn set_conductance(&mut self, siemens: f64) {
            self.g = siemens;
        }

        fn r_on(&self) -> f64 {
            self.r_on
        }

        fn r_off(&self) -> f64 {
            self.r_off
        }

        fn time_series_resolution(&self) -> f64 {
            1e-9
        }
    }

    /// A device whose reads always fail.
    #[derive(Debug, Clone)]
    struct BrokenDevice;

    #[derive(Debug, thiserror::Error)]
    #[error("sense amplifier offline")]
    struct SenseError;

    impl Device for BrokenDevice {
        type Error = SenseError;

        fn read(&self) -> Result<f64, Self::Error> {
            Err(SenseError)
        }

        fn apply(&mut self, _signal: &[f64]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn conductance(&self) -> f64 {
            1e-2
        }

        fn set_conductance(&mut self, _siemens: f64) {}

        fn r_on(&self) -> f64 {
            100.0
        }

        fn r_off(&self) -> f64 {
            1000.0
        }

        fn time_series_resolution(&self) -> f64 {
            1e-9
        }
    }

    fn config(algorithm: Algorithm) -> Config {
        Config {
            algorithm,
            tolerance: Tolerance::Relative(10.0),
            max_voltage: Some(1.2),
            number_of_reading: 2,
            max_pulse: 5000,
            ..Config::default()
        }
    }

    #[test]
    fn fabien_converges_on_drift_device() {
        let mut device = DriftDevice::new(100.0, 1000.0);
        let mut programmer = Programmer::new(config(Algorithm::Fabien)).unwrap();

        let outcome = programmer.program_device_unobserved(&mut device, 500.0).unwrap();

        assert_eq!(outcome.status, Status::Converged);
        assert!(
            (450.0..=550.0).contains(&outcome.final_resistance),
            "final resistance {} outside window",
            outcome.final_resistance
        );
        assert!(outcome.pulses < 5000);
    }

    #[test]
    fn log_converges_on_drift_device() {
        let mut device = DriftDevice::new(100.0, 1000.0);
        let mut programmer = Programmer::new(Config {
            max_voltage: Some(1.5),
            ..config(Algorithm::Log)
        })
        .unwrap();

        let outcome = programmer.program_device_unobserved(&mut device, 500.0).unwrap();

        assert_eq!(outcome.status, Status::Converged);
        assert!(
            (450.0..=550.0).contains(&outcome.final_resistance),
            "final resistance {} outside window",
            outcome.final_resistance
        );
    }

    #[test]
    fn pulse_ceiling_is_a_soft_stop() {
        // A zero-width window is unreachable, so the ceiling must trip.
        let mut device = DriftDevice::new(100.0, 1000.0);
        let mut programmer = Programmer::new(Config {
            tolerance: Tolerance::Absolute(0.0),
            max_pulse: 50,
            ..config(Algorithm::Fabien)
        })
        .unwrap();

        let outcome = programmer.program_device_unobserved(&mut device, 500.0).unwrap();

        assert_eq!(outcome.status, Status::MaxPulses);
        assert_eq!(outcome.pulses, 50);
    }

    #[test]
    fn observer_can_stop_a_device_early() {
        let mut device = DriftDevice::new(100.0, 1000.0);
        let mut programmer = Programmer::new(config(Algorithm::Fabien)).unwrap();

        let observer = |event: &Event| {
            if event.pulse >= 2 {
                Some(Action::StopEarly)
            } else {
                None
            }
        };
        let outcome = programmer
            .program_device(&mut device, 500.0, observer)
            .unwrap();

        assert_eq!(outcome.status, Status::StoppedByObserver);
        assert_eq!(outcome.pulses, 3);
    }

    #[test]
    fn device_errors_surface_unmodified() {
        let mut device = BrokenDevice;
        let mut programmer = Programmer::new(config(Algorithm::Fabien)).unwrap();

        let result = programmer.program_device_unobserved(&mut device, 500.0);

        match result {
            Err(Error::Device(source)) => {
                assert!(source.downcast_ref::<SenseError>().is_some());
            }
            other => panic!("expected a device error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_any_pulse() {
        let result = Programmer::new(Config {
            max_pulse: 0,
            ..Config::default()
        });
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn trace_grows_across_devices_and_marks_the_finish() {
        let mut first = DriftDevice::new(100.0, 1000.0);
        let mut second = DriftDevice::new(100.0, 1000.0);
        let mut programmer = Programmer::new(config(Algorithm::Fabien)).unwrap();

        let a = programmer.program_device_unobserved(&mut first, 400.0).unwrap();
        let b = programmer.program_device_unobserved(&mut second, 700.0).unwrap();

        let trace = programmer.trace();
        assert_eq!(trace.resistances.len(), a.pulses + b.pulses);
        assert_eq!(trace.voltages.len(), a.pulses + b.pulses);

        let finished = trace
            .resistances
            .iter()
            .filter(|point| point.finished)
            .count();
        assert_eq!(finished, 2);
    }

    #[test]
    fn same_seed_reproduces_the_trace() {
        let run = |seed: u64| {
            let mut device = DriftDevice::new(100.0, 1000.0);
            let mut programmer = Programmer::new(Config {
                write_std: 0.02,
                seed,
                ..config(Algorithm::Fabien)
            })
            .unwrap();
            programmer.program_device_unobserved(&mut device, 500.0).unwrap();
            programmer.into_trace()
        };

        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    #[test]
    fn combination_target_count_must_match_devices() {
        use crossbar_core::CircuitConfig;

        let mut circuit =
            Circuit::new(DriftDevice::new(100.0, 1000.0), 2, CircuitConfig::default()).unwrap();
        let mut programmer = Programmer::new(config(Algorithm::Fabien)).unwrap();

        let result = programmer.program_combination_unobserved(&mut circuit, &[500.0]);
        assert!(matches!(
            result,
            Err(Error::TargetCountMismatch { targets: 1, devices: 2 })
        ));
    }

    #[test]
    fn map_entry_width_must_match_devices() {
        use crossbar_core::CircuitConfig;
        use crossbar_sim::{Distribution, StateTable, enumerate};

        // Enumerate one device, then try to program a two-device circuit
        // from that map.
        let mut one_device =
            Circuit::new(DriftDevice::new(100.0, 1000.0), 1, CircuitConfig::default()).unwrap();
        let table = StateTable::build(&one_device, 2, Distribution::Linear).unwrap();
        let map = enumerate(&mut one_device, &table).unwrap();

        let mut two_devices =
            Circuit::new(DriftDevice::new(100.0, 1000.0), 2, CircuitConfig::default()).unwrap();
        let mut programmer = Programmer::new(config(Algorithm::Fabien)).unwrap();

        let result = programmer.program_all_unobserved(&mut two_devices, &map);
        assert!(matches!(
            result,
            Err(Error::TargetCountMismatch { targets: 1, devices: 2 })
        ));
    }
}
