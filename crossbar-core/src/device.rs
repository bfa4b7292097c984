/// The capability set a resistive memory element must expose.
///
/// The physical update equations live entirely behind this trait; the
/// enumeration and programming engines only orchestrate pulses and reads.
/// Implementations serve as circuit prototypes, so they must be [`Clone`].
pub trait Device: Clone {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads the device's current resistance, in ohms.
    ///
    /// # Errors
    ///
    /// Returns the device model's own error if the read fails.
    fn read(&self) -> Result<f64, Self::Error>;

    /// Applies a voltage signal, one sample per `time_series_resolution`,
    /// mutating the device's internal physical state.
    ///
    /// # Errors
    ///
    /// Returns the device model's own error if the write fails.
    fn apply(&mut self, signal: &[f64]) -> Result<(), Self::Error>;

    /// The device's current conductance, in siemens.
    fn conductance(&self) -> f64;

    /// Overwrites the device's conductance, in siemens.
    ///
    /// Callers must pass a finite, positive value; a conductance of zero
    /// would make every resistance read degenerate.
    fn set_conductance(&mut self, siemens: f64);

    /// Minimum achievable resistance, in ohms.
    fn r_on(&self) -> f64;

    /// Maximum achievable resistance, in ohms.
    fn r_off(&self) -> f64;

    /// Sampling period of the device's time series, in seconds.
    fn time_series_resolution(&self) -> f64;
}
