//! Transaction state machine
//!
//! The decoder follows chip-select framing. The first byte pair after the
//! line is asserted holds the command (MOSI) and the status register (MISO).
//! Following pairs are collected into a [`Frame`] until the line is
//! released, at which point the frame is rendered or reported as short.
//!
//! ```text
//!            data (command byte)
//!   Idle ────────────────────────▶ InCommand ──┐ data: append or "excess byte"
//!    ▲                                  │      │
//!    │          CS# rising edge         │ ◀────┘
//!    └──────────────────────────────────┘
//! ```
//!
//! Exactly one command is decoded per frame. Missing chip-select or data
//! channels are wiring faults that stop the decoder for the rest of the run.

use tracing::{debug, trace, warn};

use crate::annotation::AnnotationSink;
use crate::command::{Command, CommandKind};
use crate::error::{ChannelError, DataLine, DecodeError, UnknownCommand};
use crate::event::{Level, SampleSpan, SpiEvent};
use crate::frame::{BytePair, Frame};
use crate::render::{self, warnings};

/// Decoder configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecoderConfig {
    /// Ignore data until chip-select has been seen released once
    ///
    /// Protects against starting a capture in the middle of a transaction,
    /// where the first byte seen would be mistaken for a command.
    pub require_cs_release: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            require_cs_release: true,
        }
    }
}

/// Observable decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Waiting for a command byte
    Idle,
    /// Collecting data bytes for a command
    InCommand(CommandKind),
    /// The command byte was not recognized; remaining bytes are discarded
    Unrecognized,
}

/// Per-frame state, replaced wholesale at every frame boundary
#[derive(Debug)]
enum Transaction {
    Idle,
    InCommand {
        frame: Frame,
        /// Rejected bytes whose warnings follow the frame-end annotations
        excess: Vec<SampleSpan>,
    },
    Unrecognized,
}

/// W5500 transaction decoder
#[derive(Debug)]
pub struct Decoder {
    config: DecoderConfig,
    transaction: Transaction,
    cs_released: bool,
    halted: bool,
    frames: u64,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Create a decoder with default configuration
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            transaction: Transaction::Idle,
            cs_released: false,
            halted: false,
            frames: 0,
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Current state
    pub fn state(&self) -> DecoderState {
        match &self.transaction {
            Transaction::Idle => DecoderState::Idle,
            Transaction::InCommand { frame, .. } => DecoderState::InCommand(frame.command().kind),
            Transaction::Unrecognized => DecoderState::Unrecognized,
        }
    }

    /// The frame being collected, if a command is active
    pub fn current_frame(&self) -> Option<&Frame> {
        match &self.transaction {
            Transaction::InCommand { frame, .. } => Some(frame),
            _ => None,
        }
    }

    /// Whether a channel error has stopped the decoder
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Number of frames closed after a command byte
    pub fn frames_decoded(&self) -> u64 {
        self.frames
    }

    /// Start a new run, clearing the halted flag and all framing state
    pub fn reset(&mut self) {
        self.transaction = Transaction::Idle;
        self.cs_released = false;
        self.halted = false;
        self.frames = 0;
    }

    /// Process one event, emitting any resulting annotations into `sink`
    ///
    /// Returns an error on a missing channel. After that every call returns
    /// [`DecodeError::Halted`] until [`Decoder::reset`].
    pub fn decode<S: AnnotationSink + ?Sized>(
        &mut self,
        event: &SpiEvent,
        sink: &mut S,
    ) -> Result<(), DecodeError> {
        if self.halted {
            return Err(DecodeError::Halted);
        }

        trace!(?event, "spi event");

        match *event {
            SpiEvent::ChipSelect { sample, old, new } => self.on_chip_select(sample, old, new, sink),
            SpiEvent::Data { span, mosi, miso } => self.on_data(span, mosi, miso, sink),
        }
    }

    /// Process a sequence of events, stopping at the first error
    pub fn decode_all<'a, I, S>(&mut self, events: I, sink: &mut S) -> Result<(), DecodeError>
    where
        I: IntoIterator<Item = &'a SpiEvent>,
        S: AnnotationSink + ?Sized,
    {
        for event in events {
            self.decode(event, sink)?;
        }
        Ok(())
    }

    fn fail(&mut self, err: ChannelError) -> Result<(), DecodeError> {
        warn!("W5500 decoder stopped: {}", err);
        self.halted = true;
        Err(err.into())
    }

    fn on_chip_select<S: AnnotationSink + ?Sized>(
        &mut self,
        sample: u64,
        old: Option<Level>,
        new: Option<Level>,
        sink: &mut S,
    ) -> Result<(), DecodeError> {
        match (old, new) {
            (None, None) => return self.fail(ChannelError::MissingChipSelect),
            (None, Some(Level::High)) => self.cs_released = true,
            (Some(Level::Low), Some(Level::High)) => {
                self.end_frame(sample, sink);
                self.cs_released = true;
            }
            _ => {}
        }
        Ok(())
    }

    /// Close the current frame at the rising chip-select edge
    fn end_frame<S: AnnotationSink + ?Sized>(&mut self, sample: u64, sink: &mut S) {
        let transaction = std::mem::replace(&mut self.transaction, Transaction::Idle);
        if !matches!(transaction, Transaction::Idle) {
            self.frames += 1;
        }

        if let Transaction::InCommand { frame, excess } = transaction {
            let command = frame.command();
            if !frame.is_complete() {
                debug!(
                    "{} ended after {} of {} data bytes",
                    command.kind.name(),
                    frame.len(),
                    command.min_trailing
                );
                sink.put(render::warning(SampleSpan::at(sample), warnings::MISSING_DATA));
            } else if !frame.is_empty() {
                render::finish(&frame, sink);
            }

            for span in excess {
                sink.put(render::warning(span, warnings::EXCESS_BYTE));
            }
        }
    }

    fn on_data<S: AnnotationSink + ?Sized>(
        &mut self,
        span: SampleSpan,
        mosi: Option<u8>,
        miso: Option<u8>,
        sink: &mut S,
    ) -> Result<(), DecodeError> {
        let (mosi, miso) = match (mosi, miso) {
            (Some(mosi), Some(miso)) => (mosi, miso),
            (None, Some(_)) => {
                return self.fail(ChannelError::MissingDataLines {
                    missing: DataLine::Mosi,
                })
            }
            (Some(_), None) => {
                return self.fail(ChannelError::MissingDataLines {
                    missing: DataLine::Miso,
                })
            }
            (None, None) => {
                return self.fail(ChannelError::MissingDataLines {
                    missing: DataLine::Both,
                })
            }
        };

        if self.config.require_cs_release && !self.cs_released {
            trace!("ignoring byte before CS# was released");
            return Ok(());
        }

        match &mut self.transaction {
            Transaction::Idle => self.begin_command(span, mosi, miso, sink),
            Transaction::InCommand { frame, excess } => {
                if let Err(err) = frame.append(BytePair { mosi, miso }, span) {
                    debug!("{}: {}", frame.command().kind.name(), err);
                    // Frame-end annotations start before this byte, so hold the warning until then
                    if frame.command().expects_data() {
                        excess.push(span);
                    } else {
                        sink.put(render::warning(span, warnings::EXCESS_BYTE));
                    }
                }
            }
            Transaction::Unrecognized => {
                sink.put(render::warning(span, warnings::EXCESS_BYTE));
            }
        }

        Ok(())
    }

    fn begin_command<S: AnnotationSink + ?Sized>(
        &mut self,
        span: SampleSpan,
        mosi: u8,
        miso: u8,
        sink: &mut S,
    ) {
        self.transaction = match Command::classify(mosi) {
            Ok(command) => {
                debug!(
                    "command 0x{:02X} = {} expecting {}..={} data bytes",
                    mosi,
                    command.kind.name(),
                    command.min_trailing,
                    command.max_trailing
                );
                if let Some(annotation) = render::classified(&command, span) {
                    sink.put(annotation);
                }
                Transaction::InCommand {
                    frame: Frame::begin(command, span),
                    excess: Vec::new(),
                }
            }
            Err(UnknownCommand(byte)) => {
                debug!("unknown command byte 0x{:02X}", byte);
                sink.put(render::warning(span, warnings::UNKNOWN_COMMAND));
                Transaction::Unrecognized
            }
        };

        // The chip always shifts out its status register during the command byte
        sink.put(render::status(span, miso));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Annotation, AnnotationKind};

    fn cs_low(sample: u64) -> SpiEvent {
        SpiEvent::chip_select(sample, Level::High, Level::Low)
    }

    fn cs_high(sample: u64) -> SpiEvent {
        SpiEvent::chip_select(sample, Level::Low, Level::High)
    }

    fn labels(out: &[Annotation]) -> Vec<&str> {
        out.iter().map(|a| a.label()).collect()
    }

    #[test]
    fn test_ignores_data_before_release() {
        let mut decoder = Decoder::new();
        let mut out = Vec::new();

        decoder
            .decode(&SpiEvent::data(0, 8, 0xFF, 0x0E), &mut out)
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(decoder.state(), DecoderState::Idle);
    }

    #[test]
    fn test_initial_level_marks_release() {
        let mut decoder = Decoder::new();
        let mut out = Vec::new();

        let initial = SpiEvent::ChipSelect {
            sample: 0,
            old: None,
            new: Some(Level::High),
        };
        decoder.decode(&initial, &mut out).unwrap();
        decoder.decode(&cs_low(5), &mut out).unwrap();
        decoder
            .decode(&SpiEvent::data(10, 18, 0xFF, 0x0E), &mut out)
            .unwrap();

        assert_eq!(labels(&out), vec!["Cmd NOP", "Reg STATUS = \"0E\""]);
    }

    #[test]
    fn test_release_not_required() {
        let config = DecoderConfig {
            require_cs_release: false,
        };
        let mut decoder = Decoder::with_config(config);
        let mut out = Vec::new();

        decoder
            .decode(&SpiEvent::data(0, 8, 0xE1, 0x0E), &mut out)
            .unwrap();
        assert_eq!(labels(&out), vec!["Cmd FLUSH_TX", "Reg STATUS = \"0E\""]);
    }

    #[test]
    fn test_state_transitions() {
        let mut decoder = Decoder::new();
        let mut out = Vec::new();

        decoder.decode(&cs_high(0), &mut out).unwrap();
        decoder.decode(&cs_low(10), &mut out).unwrap();
        assert_eq!(decoder.state(), DecoderState::Idle);

        decoder
            .decode(&SpiEvent::data(20, 28, 0x61, 0x40), &mut out)
            .unwrap();
        assert_eq!(
            decoder.state(),
            DecoderState::InCommand(CommandKind::ReadRxPayload)
        );
        assert_eq!(decoder.current_frame().map(Frame::len), Some(0));

        decoder
            .decode(&SpiEvent::data(30, 38, 0xFF, b'A'), &mut out)
            .unwrap();
        assert_eq!(decoder.current_frame().map(Frame::len), Some(1));

        decoder.decode(&cs_high(40), &mut out).unwrap();
        assert_eq!(decoder.state(), DecoderState::Idle);
        assert_eq!(decoder.frames_decoded(), 1);
        assert_eq!(out.last().unwrap().label(), "RX payload = \"A\"");
    }

    #[test]
    fn test_missing_data_warning_at_edge() {
        let mut decoder = Decoder::new();
        let mut out = Vec::new();

        decoder.decode(&cs_high(0), &mut out).unwrap();
        decoder.decode(&cs_low(10), &mut out).unwrap();
        decoder
            .decode(&SpiEvent::data(20, 28, 0xA0, 0x0E), &mut out)
            .unwrap();
        decoder.decode(&cs_high(30), &mut out).unwrap();

        let last = out.last().unwrap();
        assert_eq!(last.label(), "missing data bytes");
        assert_eq!(last.span, SampleSpan::at(30));
        assert_eq!(last.kind, AnnotationKind::Warning);
    }

    #[test]
    fn test_unknown_command_discards_rest_of_frame() {
        let mut decoder = Decoder::new();
        let mut out = Vec::new();

        decoder.decode(&cs_high(0), &mut out).unwrap();
        decoder.decode(&cs_low(10), &mut out).unwrap();
        decoder
            .decode(&SpiEvent::data(20, 28, 0x67, 0x0E), &mut out)
            .unwrap();
        assert_eq!(decoder.state(), DecoderState::Unrecognized);
        decoder
            .decode(&SpiEvent::data(30, 38, 0x01, 0x00), &mut out)
            .unwrap();
        decoder.decode(&cs_high(40), &mut out).unwrap();

        assert_eq!(
            labels(&out),
            vec!["unknown command", "Reg STATUS = \"0E\"", "excess byte"]
        );
        assert_eq!(decoder.state(), DecoderState::Idle);
    }

    #[test]
    fn test_missing_chip_select_is_fatal() {
        let mut decoder = Decoder::new();
        let mut out = Vec::new();

        let event = SpiEvent::ChipSelect {
            sample: 0,
            old: None,
            new: None,
        };
        assert_eq!(
            decoder.decode(&event, &mut out),
            Err(DecodeError::Channel(ChannelError::MissingChipSelect))
        );
        assert!(decoder.is_halted());
        assert!(out.is_empty());

        assert_eq!(decoder.decode(&cs_high(5), &mut out), Err(DecodeError::Halted));

        decoder.reset();
        assert!(decoder.decode(&cs_high(5), &mut out).is_ok());
    }

    #[test]
    fn test_missing_data_line_is_fatal_even_before_release() {
        let mut decoder = Decoder::new();
        let mut out = Vec::new();

        let event = SpiEvent::Data {
            span: SampleSpan::new(0, 8),
            mosi: Some(0xFF),
            miso: None,
        };
        assert_eq!(
            decoder.decode(&event, &mut out),
            Err(DecodeError::Channel(ChannelError::MissingDataLines {
                missing: DataLine::Miso
            }))
        );
        assert!(out.is_empty());
    }
}
