//! W5500 Capture Simulation Library
//!
//! This crate produces decoder input without a logic analyzer. It includes:
//!
//! - **VirtualChip**: Simulates the device side, holding registers and FIFOs
//!   and answering each byte with what the chip would shift out
//! - **VirtualHost**: Runs transactions against a chip and records them as
//!   [`SpiEvent`](w5500_protocol::SpiEvent)s with sample positions
//!
//! # Example
//!
//! ```rust
//! use w5500_sim::{VirtualChip, VirtualHost};
//! use w5500_protocol::{Annotation, Decoder};
//!
//! let mut host = VirtualHost::new(VirtualChip::new());
//! host.write_register(0x00, &[0x80]);
//! host.chip_mut().receive(b"hello");
//! let len = host.read_rx_payload_width();
//! host.read_rx_payload(len as usize);
//!
//! let mut decoder = Decoder::new();
//! let mut annotations: Vec<Annotation> = Vec::new();
//! decoder.decode_all(host.events(), &mut annotations).unwrap();
//! assert!(annotations.iter().any(|a| a.label() == "RX payload = \"hello\""));
//! ```

pub mod chip;
pub mod host;

pub use chip::VirtualChip;
pub use host::{TimingConfig, VirtualHost};
