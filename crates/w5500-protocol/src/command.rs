//! Command byte classification
//!
//! The first MOSI byte of every transaction is a command. Its bit pattern
//! selects the command and, for some commands, carries an operand:
//!
//! ```text
//! 000a aaaa  R_REGISTER          a = register address, width data bytes
//! 001a aaaa  W_REGISTER          a = register address, width data bytes
//! 0101 0000  ACTIVATE            exactly 1 data byte (0x73)
//! 0110 0001  R_RX_PAYLOAD        1..=32 data bytes
//! 0110 0000  R_RX_PL_WID         exactly 1 data byte
//! 1010 0000  W_TX_PAYLOAD        1..=32 data bytes
//! 1011 0000  W_TX_PAYLOAD_NOACK  1..=32 data bytes
//! 1010 1ppp  W_ACK_PAYLOAD       p = pipe, 1..=32 data bytes
//! 1110 0001  FLUSH_TX            no data
//! 1110 0010  FLUSH_RX            no data
//! 1110 0011  REUSE_TX_PL         no data
//! 1111 1111  NOP                 no data
//! ```
//!
//! The register masks cover every byte from `0x00` to `0x3F` and are matched
//! before the fixed opcodes.

use crate::catalog;
use crate::error::UnknownCommand;

/// Maximum payload length for FIFO commands
pub const MAX_PAYLOAD_LEN: usize = 32;

/// Data byte that must follow `ACTIVATE`
pub const ACTIVATE_KEY: u8 = 0x73;

/// Decoded command, with any operand carried in the command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandKind {
    /// Read a common register
    ReadRegister { address: u8 },
    /// Write a common register
    WriteRegister { address: u8 },
    /// Toggle the extended feature set
    Activate,
    /// Read the top RX FIFO payload
    ReadRxPayload,
    /// Read the width of the top RX FIFO payload
    ReadRxPayloadWidth,
    /// Write a TX FIFO payload
    WriteTxPayload,
    /// Write a TX FIFO payload with auto-acknowledge disabled
    WriteTxPayloadNoAck,
    /// Write the payload sent with the next acknowledge on a pipe
    WriteAckPayload { pipe: u8 },
    /// Flush the TX FIFO
    FlushTx,
    /// Flush the RX FIFO
    FlushRx,
    /// Retransmit the last TX payload
    ReuseTxPayload,
    /// No operation; used to read the status register
    Nop,
}

impl CommandKind {
    /// Protocol mnemonic for this command
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::ReadRegister { .. } => "R_REGISTER",
            CommandKind::WriteRegister { .. } => "W_REGISTER",
            CommandKind::Activate => "ACTIVATE",
            CommandKind::ReadRxPayload => "R_RX_PAYLOAD",
            CommandKind::ReadRxPayloadWidth => "R_RX_PL_WID",
            CommandKind::WriteTxPayload => "W_TX_PAYLOAD",
            CommandKind::WriteTxPayloadNoAck => "W_TX_PAYLOAD_NOACK",
            CommandKind::WriteAckPayload { .. } => "W_ACK_PAYLOAD",
            CommandKind::FlushTx => "FLUSH_TX",
            CommandKind::FlushRx => "FLUSH_RX",
            CommandKind::ReuseTxPayload => "REUSE_TX_PL",
            CommandKind::Nop => "NOP",
        }
    }

    /// Operand carried in the command byte: register address or pipe number
    pub fn auxiliary(&self) -> Option<u8> {
        match self {
            CommandKind::ReadRegister { address } | CommandKind::WriteRegister { address } => {
                Some(*address)
            }
            CommandKind::WriteAckPayload { pipe } => Some(*pipe),
            _ => None,
        }
    }

    /// Encode back to the command byte
    pub fn to_byte(&self) -> u8 {
        match self {
            CommandKind::ReadRegister { address } => address & 0x1F,
            CommandKind::WriteRegister { address } => 0x20 | (address & 0x1F),
            CommandKind::Activate => 0x50,
            CommandKind::ReadRxPayload => 0x61,
            CommandKind::ReadRxPayloadWidth => 0x60,
            CommandKind::WriteTxPayload => 0xA0,
            CommandKind::WriteTxPayloadNoAck => 0xB0,
            CommandKind::WriteAckPayload { pipe } => 0xA8 | (pipe & 0x07),
            CommandKind::FlushTx => 0xE1,
            CommandKind::FlushRx => 0xE2,
            CommandKind::ReuseTxPayload => 0xE3,
            CommandKind::Nop => 0xFF,
        }
    }
}

impl TryFrom<u8> for CommandKind {
    type Error = UnknownCommand;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b if b & 0xE0 == 0x00 => Ok(Self::ReadRegister { address: b & 0x1F }),
            b if b & 0xE0 == 0x20 => Ok(Self::WriteRegister { address: b & 0x1F }),
            0x50 => Ok(Self::Activate),
            0x61 => Ok(Self::ReadRxPayload),
            0x60 => Ok(Self::ReadRxPayloadWidth),
            0xA0 => Ok(Self::WriteTxPayload),
            0xB0 => Ok(Self::WriteTxPayloadNoAck),
            b if b & 0xF8 == 0xA8 => Ok(Self::WriteAckPayload { pipe: b & 0x07 }),
            0xE1 => Ok(Self::FlushTx),
            0xE2 => Ok(Self::FlushRx),
            0xE3 => Ok(Self::ReuseTxPayload),
            0xFF => Ok(Self::Nop),
            other => Err(UnknownCommand(other)),
        }
    }
}

/// When the command's own label is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelTiming {
    /// Emit `Cmd <NAME>` as soon as the command byte is classified
    AtClassify,
    /// Fold the command label into the data annotation emitted at frame end
    AtFrameEnd,
}

/// A classified command byte and the data bytes it expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Which command
    pub kind: CommandKind,
    /// Fewest data bytes that complete the command
    pub min_trailing: usize,
    /// Most data bytes the command accepts
    pub max_trailing: usize,
    /// When the command label is emitted
    pub label_timing: LabelTiming,
    /// Frame-end annotations start at the command byte instead of the first data byte
    pub span_from_command: bool,
}

impl Command {
    /// Classify a command byte
    ///
    /// Register commands resolve their width through the common register
    /// table and expect exactly that many bytes; an address missing from the
    /// table expects a single byte.
    pub fn classify(byte: u8) -> Result<Self, UnknownCommand> {
        CommandKind::try_from(byte).map(Self::from_kind)
    }

    /// Build the descriptor for an already decoded command
    pub fn from_kind(kind: CommandKind) -> Self {
        let (min_trailing, max_trailing) = match kind {
            CommandKind::ReadRegister { address } | CommandKind::WriteRegister { address } => {
                let width = catalog::common_register(address).map_or(1, |entry| entry.width);
                (width, width)
            }
            CommandKind::Activate | CommandKind::ReadRxPayloadWidth => (1, 1),
            CommandKind::ReadRxPayload
            | CommandKind::WriteTxPayload
            | CommandKind::WriteTxPayloadNoAck
            | CommandKind::WriteAckPayload { .. } => (1, MAX_PAYLOAD_LEN),
            CommandKind::FlushTx
            | CommandKind::FlushRx
            | CommandKind::ReuseTxPayload
            | CommandKind::Nop => (0, 0),
        };

        let label_timing = match kind {
            CommandKind::WriteRegister { .. } => LabelTiming::AtFrameEnd,
            _ => LabelTiming::AtClassify,
        };

        let span_from_command = matches!(
            kind,
            CommandKind::ReadRegister { .. }
                | CommandKind::WriteRegister { .. }
                | CommandKind::Activate
        );

        Self {
            kind,
            min_trailing,
            max_trailing,
            label_timing,
            span_from_command,
        }
    }

    /// Whether the command carries data bytes at all
    pub fn expects_data(&self) -> bool {
        self.max_trailing > 0
    }
}
