//! Virtual chip
//!
//! Answers the host byte for byte the way the device would: the status
//! register during the command byte, register or FIFO contents during data
//! bytes of read commands, and zero otherwise. Writes take effect when
//! chip-select is released.

use std::collections::VecDeque;

use tracing::debug;
use w5500_protocol::command::{ACTIVATE_KEY, MAX_PAYLOAD_LEN};
use w5500_protocol::CommandKind;

/// Size of the common register space addressable from a command byte
pub const REGISTER_SPACE: usize = 32;

/// Depth of each FIFO
pub const FIFO_DEPTH: usize = 3;

/// Number of acknowledge payload pipes
const PIPES: usize = 8;

/// Chip-side view of the transaction in progress
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChipTransaction {
    /// Selected, command byte not yet shifted in
    AwaitingCommand,
    /// Command recognized, data bytes so far
    Command { kind: CommandKind, data: Vec<u8> },
    /// Command byte not recognized; the rest of the frame is ignored
    Ignored,
}

/// A simulated chip holding registers and FIFOs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualChip {
    registers: [u8; REGISTER_SPACE],
    rx_fifo: VecDeque<Vec<u8>>,
    tx_fifo: VecDeque<Vec<u8>>,
    last_tx: Option<Vec<u8>>,
    ack_payloads: Vec<Option<Vec<u8>>>,
    features_active: bool,
    current: Option<ChipTransaction>,
}

impl Default for VirtualChip {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualChip {
    /// Create a chip with cleared registers and empty FIFOs
    pub fn new() -> Self {
        Self {
            registers: [0; REGISTER_SPACE],
            rx_fifo: VecDeque::new(),
            tx_fifo: VecDeque::new(),
            last_tx: None,
            ack_payloads: vec![None; PIPES],
            features_active: false,
            current: None,
        }
    }

    /// Current contents of the register space
    pub fn registers(&self) -> &[u8; REGISTER_SPACE] {
        &self.registers
    }

    /// Store register bytes starting at `address`, LSB first
    pub fn set_register(&mut self, address: u8, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.registers[(address as usize + i) % REGISTER_SPACE] = b;
        }
    }

    /// Queue a received payload for the host to read
    ///
    /// Returns `false` when the RX FIFO is full or the payload is empty or too long.
    pub fn receive(&mut self, payload: &[u8]) -> bool {
        if payload.is_empty() || payload.len() > MAX_PAYLOAD_LEN || self.rx_fifo.len() >= FIFO_DEPTH
        {
            return false;
        }
        self.rx_fifo.push_back(payload.to_vec());
        true
    }

    /// Payloads written by the host and not yet flushed
    pub fn tx_fifo(&self) -> impl Iterator<Item = &[u8]> {
        self.tx_fifo.iter().map(Vec::as_slice)
    }

    /// Number of payloads waiting in the RX FIFO
    pub fn rx_pending(&self) -> usize {
        self.rx_fifo.len()
    }

    /// Acknowledge payload queued for a pipe
    pub fn ack_payload(&self, pipe: u8) -> Option<&[u8]> {
        self.ack_payloads
            .get(pipe as usize)
            .and_then(|p| p.as_deref())
    }

    /// Whether `ACTIVATE` has enabled the extended features
    pub fn features_active(&self) -> bool {
        self.features_active
    }

    /// Status register: RX pipe number in bits 3:1 (`111` when empty), TX full in bit 0
    pub fn status(&self) -> u8 {
        let rx_pipe: u8 = if self.rx_fifo.is_empty() { 0b111 } else { 0 };
        let tx_full = u8::from(self.tx_fifo.len() >= FIFO_DEPTH);
        (rx_pipe << 1) | tx_full
    }

    /// Chip-select asserted
    pub fn select(&mut self) {
        self.current = Some(ChipTransaction::AwaitingCommand);
    }

    /// Shift one byte in each direction, returning the MISO byte
    ///
    /// Bytes exchanged while not selected are answered with `0xFF`.
    pub fn exchange(&mut self, mosi: u8) -> u8 {
        let status = self.status();
        let Some(current) = self.current.as_mut() else {
            return 0xFF;
        };

        let (kind, index) = match current {
            ChipTransaction::AwaitingCommand => {
                *current = match CommandKind::try_from(mosi) {
                    Ok(kind) => ChipTransaction::Command {
                        kind,
                        data: Vec::new(),
                    },
                    Err(err) => {
                        debug!("virtual chip ignoring frame: {}", err);
                        ChipTransaction::Ignored
                    }
                };
                return status;
            }
            ChipTransaction::Ignored => return 0,
            ChipTransaction::Command { kind, data } => {
                data.push(mosi);
                (*kind, data.len() - 1)
            }
        };

        match kind {
            CommandKind::ReadRegister { address } => {
                self.registers[(address as usize + index) % REGISTER_SPACE]
            }
            CommandKind::ReadRxPayload => self
                .rx_fifo
                .front()
                .and_then(|p| p.get(index).copied())
                .unwrap_or(0),
            CommandKind::ReadRxPayloadWidth => self.rx_fifo.front().map_or(0, |p| p.len() as u8),
            _ => 0,
        }
    }

    /// Chip-select released: apply the transaction
    pub fn release(&mut self) {
        let Some(ChipTransaction::Command { kind, mut data }) = self.current.take() else {
            return;
        };

        debug!(
            "virtual chip applying {} with {} data bytes",
            kind.name(),
            data.len()
        );

        match kind {
            CommandKind::WriteRegister { address } => self.set_register(address, &data),
            CommandKind::ReadRxPayload => {
                if !data.is_empty() {
                    self.rx_fifo.pop_front();
                }
            }
            CommandKind::WriteTxPayload | CommandKind::WriteTxPayloadNoAck => {
                if !data.is_empty() && self.tx_fifo.len() < FIFO_DEPTH {
                    data.truncate(MAX_PAYLOAD_LEN);
                    self.last_tx = Some(data.clone());
                    self.tx_fifo.push_back(data);
                }
            }
            CommandKind::WriteAckPayload { pipe } => {
                if !data.is_empty() {
                    data.truncate(MAX_PAYLOAD_LEN);
                    self.ack_payloads[pipe as usize] = Some(data);
                }
            }
            CommandKind::Activate => {
                if data.first() == Some(&ACTIVATE_KEY) {
                    self.features_active = !self.features_active;
                }
            }
            CommandKind::FlushTx => self.tx_fifo.clear(),
            CommandKind::FlushRx => self.rx_fifo.clear(),
            CommandKind::ReuseTxPayload => {
                if let Some(last) = self.last_tx.clone() {
                    if self.tx_fifo.len() < FIFO_DEPTH {
                        self.tx_fifo.push_back(last);
                    }
                }
            }
            CommandKind::ReadRegister { .. } | CommandKind::ReadRxPayloadWidth | CommandKind::Nop => {}
        }
    }
}
