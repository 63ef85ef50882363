use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};
use embedded_io_async::{Error as _, Write};
use heapless::String;

use crate::{Lux, sample::SampleSlot};

pub const REPORT_LABEL: &str = "Valoisuus";
pub const REPORT_LINE_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportOutcome {
    /// Nothing new to report.
    Idle,
    Sent(Lux),
    /// Consumed but could not be written out.
    Dropped(Lux),
}

/// `"Valoisuus: <lux with two decimals>\n\r"`
pub fn format_report(lux: Lux) -> Result<String<REPORT_LINE_SIZE>, core::fmt::Error> {
    heapless::format!(REPORT_LINE_SIZE; "{}: {:.2}\n\r", REPORT_LABEL, lux)
}

pub struct Runner<'a, M: RawMutex, Serial: Write> {
    slot: &'a SampleSlot<M>,
    serial: Serial,
    period: Duration,
}

pub fn new<'a, M: RawMutex, Serial: Write>(slot: &'a SampleSlot<M>, serial: Serial) -> Runner<'a, M, Serial> {
    Runner {
        slot,
        serial,
        period: Duration::from_millis(crate::config::REPORT_PERIOD_MS),
    }
}

impl<'a, M: RawMutex, Serial: Write> Runner<'a, M, Serial> {
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn serial(&self) -> &Serial {
        &self.serial
    }

    pub async fn run(mut self) {
        info!("Reporting> polling every {}ms", self.period.as_millis());
        loop {
            self.once().await;
            Timer::after(self.period).await;
        }
    }

    pub async fn once(&mut self) -> ReportOutcome {
        let Some(lux) = self.slot.consume() else {
            return ReportOutcome::Idle;
        };
        let line = match format_report(lux) {
            Ok(line) => line,
            Err(_) => {
                error!("Reporting> {} does not fit a report line => drop", lux);
                return ReportOutcome::Dropped(lux);
            }
        };
        if let Err(e) = self.serial.write_all(line.as_bytes()).await {
            warn!("Reporting> write failed: {:?}", e.kind());
            return ReportOutcome::Dropped(lux);
        }
        if let Err(e) = self.serial.flush().await {
            warn!("Reporting> flush failed: {:?}", e.kind());
            return ReportOutcome::Dropped(lux);
        }
        debug!("Reporting> sent {}", lux);
        ReportOutcome::Sent(lux)
    }
}

#[cfg(test)]
pub mod tests {
    use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};

    use super::*;
    use crate::{sample::SampleState, serial::mocks::SerialMock};

    #[test]
    fn formats_two_decimals_with_rounding() {
        assert_eq!(format_report(123.4567).unwrap().as_str(), "Valoisuus: 123.46\n\r");
        assert_eq!(format_report(500.0).unwrap().as_str(), "Valoisuus: 500.00\n\r");
        assert_eq!(format_report(0.0).unwrap().as_str(), "Valoisuus: 0.00\n\r");
        assert_eq!(format_report(0.004).unwrap().as_str(), "Valoisuus: 0.00\n\r");
        assert_eq!(format_report(2.999).unwrap().as_str(), "Valoisuus: 3.00\n\r");
        assert_eq!(format_report(83865.6).unwrap().as_str(), "Valoisuus: 83865.60\n\r");
        assert_eq!(format_report(-1000.0).unwrap().as_str(), "Valoisuus: -1000.00\n\r");
    }

    #[test]
    fn oversized_value_is_a_format_error() {
        assert!(format_report(Lux::MAX).is_err());
    }

    #[tokio::test]
    async fn idle_when_nothing_published() {
        let slot = SampleSlot::<NoopRawMutex>::new();
        let mut runner = new(&slot, SerialMock::default());
        assert_eq!(runner.once().await, ReportOutcome::Idle);
        assert!(runner.serial().written().is_empty());
        assert_eq!(runner.serial().flushes(), 0);
    }

    #[tokio::test]
    async fn writes_and_resets_slot() {
        let slot = SampleSlot::<NoopRawMutex>::new();
        slot.publish(123.4567);
        let mut runner = new(&slot, SerialMock::default());
        assert_eq!(runner.once().await, ReportOutcome::Sent(123.4567));
        assert_eq!(runner.serial().written(), b"Valoisuus: 123.46\n\r");
        assert_eq!(runner.serial().flushes(), 1);
        assert_eq!(slot.state(), SampleState::Waiting);

        assert_eq!(runner.once().await, ReportOutcome::Idle);
        assert_eq!(runner.serial().written(), b"Valoisuus: 123.46\n\r");
    }

    #[tokio::test]
    async fn write_failure_drops_the_sample() {
        let slot = SampleSlot::<NoopRawMutex>::new();
        slot.publish(5.0);
        let mut runner = new(&slot, SerialMock::failing());
        assert_eq!(runner.once().await, ReportOutcome::Dropped(5.0));
        assert!(slot.is_waiting());
    }

    #[tokio::test]
    async fn format_failure_drops_the_sample() {
        let slot = SampleSlot::<NoopRawMutex>::new();
        slot.publish(Lux::MAX);
        let mut runner = new(&slot, SerialMock::default());
        assert_eq!(runner.once().await, ReportOutcome::Dropped(Lux::MAX));
        assert!(runner.serial().written().is_empty());
        assert!(slot.is_waiting());
    }

    #[tokio::test]
    async fn run_reports_each_sample_once() {
        let slot = SampleSlot::<CriticalSectionRawMutex>::new();
        let mut serial = SerialMock::default();
        let runner = new(&slot, &mut serial).with_period(Duration::from_millis(2));

        let producer = async {
            for lux in [10.0, 20.0] {
                while !slot.is_waiting() {
                    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                }
                slot.publish(lux);
            }
            while !slot.is_waiting() {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        };

        tokio::select! {
            _ = runner.run() => panic!("reporting loop ended"),
            _ = producer => {}
        }
        assert!(slot.is_waiting());
        assert_eq!(serial.written(), b"Valoisuus: 10.00\n\rValoisuus: 20.00\n\r");
    }
}
