//! Annotation text for classified commands and finished frames

use crate::annotation::{Annotation, AnnotationKind, AnnotationSink};
use crate::catalog::{self, STATUS_REGISTER};
use crate::command::{Command, CommandKind, LabelTiming, ACTIVATE_KEY};
use crate::event::SampleSpan;
use crate::frame::Frame;

/// Name shown for register addresses missing from the catalog
pub const UNKNOWN_REGISTER: &str = "unknown register";

/// Warning texts
pub mod warnings {
    /// Command byte matched no opcode
    pub const UNKNOWN_COMMAND: &str = "unknown command";
    /// Register address missing from the catalog
    pub const UNKNOWN_REGISTER: &str = super::UNKNOWN_REGISTER;
    /// Chip-select released before the command's minimum data length
    pub const MISSING_DATA: &str = "missing data bytes";
    /// Data byte beyond the command's maximum length
    pub const EXCESS_BYTE: &str = "excess byte";
    /// `ACTIVATE` followed by something other than its key byte
    pub const WRONG_ACTIVATE_DATA: &str = "wrong data for \"ACTIVATE\" command";
}

/// Bytes as concatenated two-digit uppercase hex
pub fn hex_bytes(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Bytes as text, with non-printable characters written as `\xHH`
pub fn escape_payload(data: &[u8]) -> String {
    data.iter()
        .map(|&b| {
            if is_printable(b) {
                char::from(b).to_string()
            } else {
                format!("\\x{:02X}", b)
            }
        })
        .collect()
}

/// Latin-1 printability: control characters, no-break space and soft hyphen are escaped
fn is_printable(b: u8) -> bool {
    !(char::from(b).is_control() || b == 0xA0 || b == 0xAD)
}

/// `Cmd <NAME>`, naming the register for register reads
pub fn command_label(kind: &CommandKind) -> String {
    match kind {
        CommandKind::ReadRegister { address } => {
            let name = catalog::common_register(*address).map_or(UNKNOWN_REGISTER, |e| e.name);
            format!("Cmd {} \"{}\"", kind.name(), name)
        }
        _ => format!("Cmd {}", kind.name()),
    }
}

/// Annotation emitted when a command byte is classified, if the command labels eagerly
pub fn classified(command: &Command, span: SampleSpan) -> Option<Annotation> {
    match command.label_timing {
        LabelTiming::AtClassify => Some(
            Annotation::new(span, AnnotationKind::Command, command_label(&command.kind))
                .with_short(command.kind.name()),
        ),
        LabelTiming::AtFrameEnd => None,
    }
}

/// The status register shifted out alongside every command byte
pub fn status(span: SampleSpan, miso: u8) -> Annotation {
    register_value(span, AnnotationKind::Register, &reg_label(STATUS_REGISTER), &[miso])
}

/// Warning annotation
pub fn warning(span: SampleSpan, text: &str) -> Annotation {
    Annotation::new(span, AnnotationKind::Warning, text)
}

fn reg_label(name: &str) -> String {
    format!("Reg {}", name)
}

/// Register content, reassembled most significant byte first from LSB-first wire order
fn register_value(span: SampleSpan, kind: AnnotationKind, label: &str, wire: &[u8]) -> Annotation {
    let msb_first: Vec<u8> = wire.iter().rev().copied().collect();
    Annotation::new(
        span,
        kind,
        format!("{} = \"{}\"", label, hex_bytes(&msb_first)),
    )
}

fn payload(span: SampleSpan, kind: AnnotationKind, label: &str, data: &[u8]) -> Annotation {
    Annotation::new(
        span,
        kind,
        format!("{} = \"{}\"", label, escape_payload(data)),
    )
}

/// Emit the frame-end annotations for a frame holding at least one data byte
pub fn finish<S: AnnotationSink + ?Sized>(frame: &Frame, sink: &mut S) {
    let Some(span) = frame.render_span() else {
        return;
    };
    let kind = frame.command().kind;

    match kind {
        CommandKind::ReadRegister { address } => match catalog::common_register(address) {
            Some(entry) => sink.put(register_value(
                span,
                AnnotationKind::Register,
                &reg_label(entry.name),
                &frame.miso_bytes(),
            )),
            None => sink.put(warning(span, warnings::UNKNOWN_REGISTER)),
        },
        CommandKind::WriteRegister { address } => match catalog::common_register(address) {
            Some(entry) => {
                let label = format!("Cmd {}: {}", kind.name(), entry.name);
                sink.put(register_value(
                    span,
                    AnnotationKind::Command,
                    &label,
                    &frame.mosi_bytes(),
                ));
            }
            None => sink.put(warning(span, warnings::UNKNOWN_REGISTER)),
        },
        CommandKind::ReadRxPayload => sink.put(payload(
            span,
            AnnotationKind::RxData,
            "RX payload",
            &frame.miso_bytes(),
        )),
        CommandKind::WriteTxPayload | CommandKind::WriteTxPayloadNoAck => sink.put(payload(
            span,
            AnnotationKind::TxData,
            "TX payload",
            &frame.mosi_bytes(),
        )),
        CommandKind::WriteAckPayload { pipe } => sink.put(payload(
            span,
            AnnotationKind::TxData,
            &format!("ACK payload for pipe {}", pipe),
            &frame.mosi_bytes(),
        )),
        CommandKind::ReadRxPayloadWidth => {
            if let Some(first) = frame.collected().first() {
                sink.put(Annotation::new(
                    span,
                    AnnotationKind::Register,
                    format!("Payload width = {}", first.miso),
                ));
            }
        }
        CommandKind::Activate => {
            if frame.collected().first().map(|p| p.mosi) != Some(ACTIVATE_KEY) {
                sink.put(warning(span, warnings::WRONG_ACTIVATE_DATA));
            }
        }
        CommandKind::FlushTx
        | CommandKind::FlushRx
        | CommandKind::ReuseTxPayload
        | CommandKind::Nop => {}
    }
}
