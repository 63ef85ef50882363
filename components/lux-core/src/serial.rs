//! Line settings of the serial port the reporter writes to.

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
}

/// Frames are always 8 data bits with one stop bit, and bytes go out exactly
/// as formatted, without newline translation.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialSettings {
    pub baudrate: u32,
    pub parity: Parity,
    pub echo: bool,
}

impl SerialSettings {
    /// 9600 8N1, no echo.
    pub const REPORTER: SerialSettings = SerialSettings {
        baudrate: 9600,
        parity: Parity::None,
        echo: false,
    };
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self::REPORTER
    }
}
