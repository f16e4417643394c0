//! Error types for W5500 transaction decoding

use thiserror::Error;

/// Fatal wiring faults: a channel the protocol needs is not present in the capture
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// The chip-select line cannot be resolved on either side of a transition
    #[error("CS# pin required")]
    MissingChipSelect,

    /// A byte pair arrived with the MOSI or MISO value absent
    #[error("both MISO and MOSI pins required (missing: {missing})")]
    MissingDataLines {
        /// Which of the two data lines was absent
        missing: DataLine,
    },
}

/// One of the two SPI data lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLine {
    /// Host to chip
    Mosi,
    /// Chip to host
    Miso,
    /// Neither line carried a value
    Both,
}

impl std::fmt::Display for DataLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataLine::Mosi => write!(f, "MOSI"),
            DataLine::Miso => write!(f, "MISO"),
            DataLine::Both => write!(f, "MOSI and MISO"),
        }
    }
}

/// Errors returned by [`crate::Decoder::decode`]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The capture is missing a mandatory channel
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// An earlier channel error stopped the decoder; no further events are processed
    #[error("decoder halted by an earlier channel error")]
    Halted,
}

/// A command byte that matches none of the known opcodes
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown command: 0x{0:02X}")]
pub struct UnknownCommand(pub u8);

/// A trailing byte beyond the command's maximum length
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("excess byte: command accepts at most {max} data bytes")]
pub struct ExcessByte {
    /// The command's maximum trailing byte count
    pub max: usize,
}
