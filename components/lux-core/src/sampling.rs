use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};

use crate::{
    Lux,
    error::FatalError,
    sample::SampleSlot,
    sensor::{AmbientLightSensor, SensorError},
};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplingOutcome {
    Published(Lux),
    /// The previous sample is still unread, nothing was measured.
    Skipped,
    Failed(SensorError),
}

pub struct Runner<'a, M: RawMutex, Sensor: AmbientLightSensor> {
    slot: &'a SampleSlot<M>,
    sensor: Sensor,
    settle: Duration,
    period: Duration,
}

pub fn new<'a, M: RawMutex, Sensor: AmbientLightSensor>(slot: &'a SampleSlot<M>, sensor: Sensor) -> Runner<'a, M, Sensor> {
    Runner {
        slot,
        sensor,
        settle: Duration::from_millis(crate::config::SENSOR_SETTLE_MS),
        period: Duration::from_millis(crate::config::SAMPLE_PERIOD_MS),
    }
}

impl<'a, M: RawMutex, Sensor: AmbientLightSensor> Runner<'a, M, Sensor> {
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn sensor(&self) -> &Sensor {
        &self.sensor
    }

    pub async fn run(mut self) -> Result<Infallible, FatalError> {
        self.start().await?;
        loop {
            self.once().await;
            Timer::after(self.period).await;
        }
    }

    /// Lets the bus settle, then configures the sensor.
    pub async fn start(&mut self) -> Result<(), FatalError> {
        Timer::after(self.settle).await;
        match self.sensor.setup().await {
            Ok(()) => {
                info!("Sampling> sensor ready, period {}ms", self.period.as_millis());
                Ok(())
            }
            Err(e) => {
                error!("Sampling> sensor setup failed: {:?}", e);
                Err(e.into())
            }
        }
    }

    pub async fn once(&mut self) -> SamplingOutcome {
        if !self.slot.is_waiting() {
            trace!("Sampling> previous sample unread => skip");
            return SamplingOutcome::Skipped;
        }
        match self.sensor.read_lux().await {
            Ok(lux) => {
                if let Some(unread) = self.slot.publish(lux) {
                    warn!("Sampling> replaced unread {}", unread);
                }
                debug!("Sampling> published {}", lux);
                SamplingOutcome::Published(lux)
            }
            Err(e) => {
                warn!("Sampling> read failed: {:?}", e);
                SamplingOutcome::Failed(e)
            }
        }
    }
}
