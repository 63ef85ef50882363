use embedded_hal::i2c::Error as _;
use embedded_hal_async::i2c::I2c;

use crate::{
    Lux,
    sensor::{AmbientLightSensor, SensorError},
};

/// ADDR pin tied to ground.
pub const DEFAULT_ADDRESS: u8 = 0x44;

const REG_RESULT: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;
const REG_DEVICE_ID: u8 = 0x7F;

const DEVICE_ID: u16 = 0x3001;

// automatic full-scale range, 100 ms conversion, continuous mode, latched interrupt
const CONFIG_CONTINUOUS: u16 = 0xC410;

pub struct Opt3001<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Opt3001<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Opt3001 { i2c, address }
    }

    #[cfg(test)]
    pub fn release(self) -> I2C {
        self.i2c
    }

    async fn read_register(&mut self, register: u8) -> Result<u16, SensorError> {
        let mut buffer = [0u8; 2];
        self.i2c
            .write_read(self.address, &[register], &mut buffer)
            .await
            .map_err(|e| SensorError::Bus(e.kind()))?;
        let value = u16::from_be_bytes(buffer);
        trace!("OPT3001.Read> reg {:02X} => {:04X}", register, value);
        Ok(value)
    }

    async fn write_register(&mut self, register: u8, value: u16) -> Result<(), SensorError> {
        let [high, low] = value.to_be_bytes();
        trace!("OPT3001.Write> reg {:02X} <= {:04X}", register, value);
        self.i2c
            .write(self.address, &[register, high, low])
            .await
            .map_err(|e| SensorError::Bus(e.kind()))
    }
}

impl<I2C: I2c> AmbientLightSensor for Opt3001<I2C> {
    async fn setup(&mut self) -> Result<(), SensorError> {
        let id = self.read_register(REG_DEVICE_ID).await?;
        if id != DEVICE_ID {
            error!("OPT3001> unexpected device id {:04X}", id);
            return Err(SensorError::UnknownDevice(id));
        }
        self.write_register(REG_CONFIG, CONFIG_CONTINUOUS).await?;
        info!("OPT3001> configured for continuous conversion");
        Ok(())
    }

    async fn read_lux(&mut self) -> Result<Lux, SensorError> {
        let raw = self.read_register(REG_RESULT).await?;
        Ok(raw_to_lux(raw))
    }
}

/// `lux = 0.01 * 2^E * M` with the exponent in the upper nibble and the
/// mantissa in the lower twelve bits.
///
/// Every reading is a whole number of hundredths, so the product is taken in
/// integers and divided once, giving the closest `Lux` to the exact value.
pub fn raw_to_lux(raw: u16) -> Lux {
    let exponent = u32::from(raw >> 12);
    let mantissa = u32::from(raw & 0x0FFF);
    // exponents above 11 are reserved, the shift still stays below 2^27
    (mantissa << exponent) as Lux / 100.0
}
