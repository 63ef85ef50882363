use crate::sensor::SensorError;

/// Startup failures. None of them is recovered: the firmware reports the
/// error and halts.
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalError {
    /// The sensor bus cannot run at the configured clock.
    BusConfig { hz: u32 },
    /// The UART cannot provide the requested line settings.
    SerialConfig,
    SensorSetup(SensorError),
    TaskSpawn,
}

impl From<SensorError> for FatalError {
    fn from(err: SensorError) -> Self {
        FatalError::SensorSetup(err)
    }
}
