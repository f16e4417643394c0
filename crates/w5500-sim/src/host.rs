//! Virtual host
//!
//! Drives transactions against a [`VirtualChip`] and records the resulting
//! capture as decoder input events, with sample positions laid out by a
//! [`TimingConfig`].

use serde::{Deserialize, Serialize};
use w5500_protocol::{CommandKind, Level, SpiEvent};

use crate::chip::VirtualChip;

/// Dummy byte clocked out by the host while reading
pub const DUMMY: u8 = 0xFF;

/// Sample layout of generated captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Samples covered by one byte
    pub byte_samples: u64,
    /// Idle samples between bytes
    pub byte_gap: u64,
    /// Idle samples between chip-select edges and the nearest byte
    pub select_gap: u64,
    /// Idle samples between frames
    pub frame_gap: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            byte_samples: 16,
            byte_gap: 4,
            select_gap: 8,
            frame_gap: 40,
        }
    }
}

/// A simulated SPI host attached to a [`VirtualChip`]
#[derive(Debug)]
pub struct VirtualHost {
    chip: VirtualChip,
    timing: TimingConfig,
    events: Vec<SpiEvent>,
    sample: u64,
}

impl VirtualHost {
    /// Create a host with default timing
    pub fn new(chip: VirtualChip) -> Self {
        Self::with_timing(chip, TimingConfig::default())
    }

    /// Create a host with custom timing
    ///
    /// The capture opens with chip-select observed released.
    pub fn with_timing(chip: VirtualChip, timing: TimingConfig) -> Self {
        Self {
            chip,
            timing,
            events: vec![SpiEvent::ChipSelect {
                sample: 0,
                old: None,
                new: Some(Level::High),
            }],
            sample: timing.frame_gap,
        }
    }

    /// The attached chip
    pub fn chip(&self) -> &VirtualChip {
        &self.chip
    }

    /// Mutable access to the attached chip, e.g. to queue received payloads
    pub fn chip_mut(&mut self) -> &mut VirtualChip {
        &mut self.chip
    }

    /// Events recorded so far
    pub fn events(&self) -> &[SpiEvent] {
        &self.events
    }

    /// Take the recorded events, leaving the capture empty
    ///
    /// Later transactions keep counting samples from where this one stopped.
    pub fn take_events(&mut self) -> Vec<SpiEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run one chip-select frame with the given MOSI bytes, returning the MISO bytes
    ///
    /// No check is made that the bytes form a valid command, so this also
    /// produces malformed traffic.
    pub fn transaction(&mut self, mosi: &[u8]) -> Vec<u8> {
        self.events
            .push(SpiEvent::chip_select(self.sample, Level::High, Level::Low));
        self.chip.select();
        self.sample += self.timing.select_gap;

        let mut miso = Vec::with_capacity(mosi.len());
        for (i, &out) in mosi.iter().enumerate() {
            if i > 0 {
                self.sample += self.timing.byte_gap;
            }
            let start = self.sample;
            self.sample += self.timing.byte_samples;
            let inp = self.chip.exchange(out);
            self.events
                .push(SpiEvent::data(start, self.sample, out, inp));
            miso.push(inp);
        }

        self.sample += self.timing.select_gap;
        self.events
            .push(SpiEvent::chip_select(self.sample, Level::Low, Level::High));
        self.chip.release();
        self.sample += self.timing.frame_gap;

        miso
    }

    fn command(&mut self, kind: CommandKind, data: &[u8]) -> (u8, Vec<u8>) {
        let mut mosi = Vec::with_capacity(data.len() + 1);
        mosi.push(kind.to_byte());
        mosi.extend_from_slice(data);
        let mut miso = self.transaction(&mosi);
        let status = miso.remove(0);
        (status, miso)
    }

    /// Read `len` bytes of a register, returned LSB first as shifted out
    pub fn read_register(&mut self, address: u8, len: usize) -> Vec<u8> {
        self.command(CommandKind::ReadRegister { address }, &vec![DUMMY; len])
            .1
    }

    /// Write a register, `value` LSB first
    pub fn write_register(&mut self, address: u8, value: &[u8]) {
        self.command(CommandKind::WriteRegister { address }, value);
    }

    /// Send `ACTIVATE` with the given key byte
    pub fn activate(&mut self, key: u8) {
        self.command(CommandKind::Activate, &[key]);
    }

    /// Read the width of the top RX payload
    pub fn read_rx_payload_width(&mut self) -> u8 {
        self.command(CommandKind::ReadRxPayloadWidth, &[DUMMY])
            .1
            .first()
            .copied()
            .unwrap_or(0)
    }

    /// Read `len` bytes of the top RX payload
    pub fn read_rx_payload(&mut self, len: usize) -> Vec<u8> {
        self.command(CommandKind::ReadRxPayload, &vec![DUMMY; len]).1
    }

    /// Queue a TX payload
    pub fn write_tx_payload(&mut self, payload: &[u8]) {
        self.command(CommandKind::WriteTxPayload, payload);
    }

    /// Queue a TX payload without auto-acknowledge
    pub fn write_tx_payload_no_ack(&mut self, payload: &[u8]) {
        self.command(CommandKind::WriteTxPayloadNoAck, payload);
    }

    /// Set the acknowledge payload for a pipe
    pub fn write_ack_payload(&mut self, pipe: u8, payload: &[u8]) {
        self.command(CommandKind::WriteAckPayload { pipe: pipe & 0x07 }, payload);
    }

    /// Flush the TX FIFO
    pub fn flush_tx(&mut self) {
        self.command(CommandKind::FlushTx, &[]);
    }

    /// Flush the RX FIFO
    pub fn flush_rx(&mut self) {
        self.command(CommandKind::FlushRx, &[]);
    }

    /// Requeue the last TX payload
    pub fn reuse_tx_payload(&mut self) {
        self.command(CommandKind::ReuseTxPayload, &[]);
    }

    /// Read the status register
    pub fn nop(&mut self) -> u8 {
        self.command(CommandKind::Nop, &[]).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use w5500_protocol::{Annotation, Decoder, SampleSpan};

    fn decode(events: &[SpiEvent]) -> Vec<Annotation> {
        let mut decoder = Decoder::new();
        let mut out = Vec::new();
        decoder.decode_all(events, &mut out).unwrap();
        out
    }

    fn labels(out: &[Annotation]) -> Vec<&str> {
        out.iter().map(|a| a.label()).collect()
    }

    #[test]
    fn test_sample_layout() {
        let mut host = VirtualHost::new(VirtualChip::new());
        host.transaction(&[0xFF, 0xFF]);

        let events = host.events();
        assert_eq!(events.len(), 5);
        assert_eq!(events[1], SpiEvent::chip_select(40, Level::High, Level::Low));
        assert_eq!(
            events[2],
            SpiEvent::Data {
                span: SampleSpan::new(48, 64),
                mosi: Some(0xFF),
                miso: Some(0x0E),
            }
        );
        assert_eq!(events[3].start_sample(), 68);
        assert_eq!(events[4], SpiEvent::chip_select(92, Level::Low, Level::High));
    }

    #[test]
    fn test_samples_increase() {
        let mut host = VirtualHost::new(VirtualChip::new());
        host.write_register(0x01, &[192, 168, 0, 1]);
        host.nop();
        host.flush_tx();

        let starts: Vec<u64> = host.events().iter().map(SpiEvent::start_sample).collect();
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_register_round_trip_decodes() {
        let mut host = VirtualHost::new(VirtualChip::new());
        host.write_register(0x0F, &[1, 0, 168, 192]);
        let value = host.read_register(0x0F, 4);
        assert_eq!(value, vec![1, 0, 168, 192]);

        let out = decode(host.events());
        assert_eq!(
            labels(&out),
            vec![
                "Reg STATUS = \"0E\"",
                "Cmd W_REGISTER: SOURCE_IP_ADDR = \"C0A80001\"",
                "Cmd R_REGISTER \"SOURCE_IP_ADDR\"",
                "Reg STATUS = \"0E\"",
                "Reg SOURCE_IP_ADDR = \"C0A80001\"",
            ]
        );
    }

    #[test]
    fn test_fifo_traffic_decodes() {
        let mut host = VirtualHost::new(VirtualChip::new());
        host.chip_mut().receive(b"pong");
        let width = host.read_rx_payload_width();
        let payload = host.read_rx_payload(width as usize);
        assert_eq!(payload, b"pong");
        host.write_ack_payload(1, b"ack");
        host.write_tx_payload_no_ack(b"ping\r");

        let out = decode(host.events());
        let labels = labels(&out);
        assert!(labels.contains(&"Payload width = 4"));
        assert!(labels.contains(&"RX payload = \"pong\""));
        assert!(labels.contains(&"ACK payload for pipe 1 = \"ack\""));
        assert!(labels.contains(&"TX payload = \"ping\\x0D\""));
        assert!(out.iter().all(|a| !a.is_warning()));
    }

    #[test]
    fn test_take_events_continues_samples() {
        let mut host = VirtualHost::new(VirtualChip::new());
        host.nop();
        let first = host.take_events();
        host.nop();

        let last_first = first.last().unwrap().start_sample();
        assert!(host.events()[0].start_sample() > last_first);
    }
}
