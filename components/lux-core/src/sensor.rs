#![allow(async_fn_in_trait)]

use crate::Lux;

pub mod opt3001;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    Bus(embedded_hal::i2c::ErrorKind),
    UnknownDevice(u16),
}

/// An ambient light sensor that owns its bus handle.
pub trait AmbientLightSensor {
    /// One-time configuration, called after the bus has settled.
    async fn setup(&mut self) -> Result<(), SensorError>;

    async fn read_lux(&mut self) -> Result<Lux, SensorError>;
}
