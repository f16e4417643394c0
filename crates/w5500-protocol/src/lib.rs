//! W5500 SPI Transaction Decoder
//!
//! This crate turns framed SPI traffic into labelled annotations describing
//! the chip's command protocol:
//!
//! - **Catalog**: register names and widths, chip-wide and per socket
//! - **Command**: classification of the command byte into an opcode and the
//!   number of data bytes it expects
//! - **Frame**: collection of the byte pairs that follow a command byte
//! - **Decoder**: the chip-select driven transaction state machine
//! - **Render**: annotation text for commands, registers and payloads
//!
//! # Architecture
//!
//! The decoder consumes [`SpiEvent`]s that an SPI front end has already
//! assembled (chip-select transitions and MOSI/MISO byte pairs with their
//! sample positions) and pushes [`Annotation`]s into an [`AnnotationSink`].
//! Processing is strictly sequential: each event is fully handled, and all
//! its annotations emitted, before the next one is accepted.
//!
//! Protocol violations (unknown commands, short or overlong frames) become
//! warning annotations and decoding continues. A missing chip-select or data
//! channel is a wiring fault returned as [`DecodeError`], after which the
//! decoder refuses further input.
//!
//! # Example
//!
//! ```rust
//! use w5500_protocol::{Annotation, Decoder, Level, SpiEvent};
//!
//! let events = [
//!     SpiEvent::chip_select(0, Level::Low, Level::High),
//!     SpiEvent::chip_select(10, Level::High, Level::Low),
//!     SpiEvent::data(20, 28, 0x00, 0x0E),
//!     SpiEvent::data(30, 38, 0xFF, 0x18),
//!     SpiEvent::chip_select(40, Level::Low, Level::High),
//! ];
//!
//! let mut decoder = Decoder::new();
//! let mut annotations: Vec<Annotation> = Vec::new();
//! decoder.decode_all(&events, &mut annotations).unwrap();
//!
//! let labels: Vec<&str> = annotations.iter().map(|a| a.label()).collect();
//! assert_eq!(
//!     labels,
//!     ["Cmd R_REGISTER \"MODE\"", "Reg STATUS = \"0E\"", "Reg MODE = \"18\""]
//! );
//! ```

pub mod annotation;
pub mod catalog;
pub mod command;
pub mod decoder;
pub mod error;
pub mod event;
pub mod frame;
pub mod render;

pub use annotation::{Annotation, AnnotationKind, AnnotationRow, AnnotationSink};
pub use catalog::RegisterEntry;
pub use command::{Command, CommandKind, LabelTiming};
pub use decoder::{Decoder, DecoderConfig, DecoderState};
pub use error::{ChannelError, DataLine, DecodeError, ExcessByte, UnknownCommand};
pub use event::{Level, SampleSpan, SpiEvent};
pub use frame::{BytePair, Frame};
