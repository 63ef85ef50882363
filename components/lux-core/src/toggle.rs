//! Button driven output toggle.
//!
//! Every falling edge on the input flips the output once. There is no
//! debounce: a bouncing contact produces one toggle per detected edge.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::{Error as _, ErrorKind, StatefulOutputPin};
use embedded_hal_async::digital::Wait;

/// Pause after a pin error before waiting for the next edge.
pub const ERROR_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ToggleError {
    Input(ErrorKind),
    Output(ErrorKind),
}

/// Owns the output pin, so nothing else can write it between the read and the
/// write of a toggle.
pub struct OutputToggle<Pin: StatefulOutputPin> {
    pin: Pin,
    toggles: u32,
}

impl<Pin: StatefulOutputPin> OutputToggle<Pin> {
    pub fn new(pin: Pin) -> Self {
        OutputToggle { pin, toggles: 0 }
    }

    /// Reads the output level, writes its inverse and returns the new level.
    pub fn toggle(&mut self) -> Result<bool, ToggleError> {
        let high = self.pin.is_set_high().map_err(|e| ToggleError::Output(e.kind()))?;
        let written = if high { self.pin.set_low() } else { self.pin.set_high() };
        written.map_err(|e| ToggleError::Output(e.kind()))?;
        self.toggles = self.toggles.wrapping_add(1);
        Ok(!high)
    }

    pub fn toggles(&self) -> u32 {
        self.toggles
    }

    #[cfg(test)]
    pub fn pin_mut(&mut self) -> &mut Pin {
        &mut self.pin
    }
}

pub struct Runner<Input: Wait, Pin: StatefulOutputPin> {
    input: Input,
    output: OutputToggle<Pin>,
}

pub fn new<Input: Wait, Pin: StatefulOutputPin>(input: Input, output: Pin) -> Runner<Input, Pin> {
    Runner {
        input,
        output: OutputToggle::new(output),
    }
}

impl<Input: Wait, Pin: StatefulOutputPin> Runner<Input, Pin> {
    pub async fn run(mut self) {
        info!("Toggle> waiting for falling edges");
        loop {
            if let Err(e) = self.once().await {
                warn!("Toggle> {:?}", e);
                Timer::after(ERROR_BACKOFF).await;
            }
        }
    }

    /// Waits for one falling edge and toggles the output.
    pub async fn once(&mut self) -> Result<bool, ToggleError> {
        self.input
            .wait_for_falling_edge()
            .await
            .map_err(|e| ToggleError::Input(e.kind()))?;
        let level = self.output.toggle()?;
        debug!("Toggle> edge #{} => output {}", self.output.toggles(), level);
        Ok(level)
    }

    pub fn output(&self) -> &OutputToggle<Pin> {
        &self.output
    }
}
