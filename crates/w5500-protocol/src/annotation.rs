//! Decoder output: annotations and the sink that receives them

use crate::event::SampleSpan;

/// Category of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AnnotationKind {
    /// Command sent to the chip
    Command,
    /// Payload sent to the chip
    TxData,
    /// Register read from the chip
    Register,
    /// Payload read from the chip
    RxData,
    /// Protocol violation
    Warning,
}

/// Display row grouping related annotation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AnnotationRow {
    /// Commands and payloads sent to the chip
    Commands,
    /// Registers and payloads returned by the chip
    Responses,
    /// Warnings
    Warnings,
}

impl AnnotationKind {
    /// Row this kind is displayed in
    pub fn row(&self) -> AnnotationRow {
        match self {
            AnnotationKind::Command | AnnotationKind::TxData => AnnotationRow::Commands,
            AnnotationKind::Register | AnnotationKind::RxData => AnnotationRow::Responses,
            AnnotationKind::Warning => AnnotationRow::Warnings,
        }
    }

    /// Short identifier
    pub fn id(&self) -> &'static str {
        match self {
            AnnotationKind::Command => "cmd",
            AnnotationKind::TxData => "tx-data",
            AnnotationKind::Register => "register",
            AnnotationKind::RxData => "rx-data",
            AnnotationKind::Warning => "warning",
        }
    }
}

impl AnnotationRow {
    /// Row title
    pub fn title(&self) -> &'static str {
        match self {
            AnnotationRow::Commands => "Commands",
            AnnotationRow::Responses => "Responses",
            AnnotationRow::Warnings => "Warnings",
        }
    }
}

/// A labelled sample range
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Annotation {
    /// Samples the annotation covers
    pub span: SampleSpan,
    /// Category
    pub kind: AnnotationKind,
    /// Label variants, longest first
    pub labels: Vec<String>,
}

impl Annotation {
    /// Annotation with a single label
    pub fn new(span: SampleSpan, kind: AnnotationKind, label: impl Into<String>) -> Self {
        Self {
            span,
            kind,
            labels: vec![label.into()],
        }
    }

    /// Add a shorter label variant
    pub fn with_short(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// The full label
    pub fn label(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or_default()
    }

    /// Whether this is a warning
    pub fn is_warning(&self) -> bool {
        self.kind == AnnotationKind::Warning
    }
}

/// Receiver of decoder output
pub trait AnnotationSink {
    /// Accept one annotation
    fn put(&mut self, annotation: Annotation);
}

impl AnnotationSink for Vec<Annotation> {
    fn put(&mut self, annotation: Annotation) {
        self.push(annotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows() {
        assert_eq!(AnnotationKind::Command.row(), AnnotationRow::Commands);
        assert_eq!(AnnotationKind::TxData.row(), AnnotationRow::Commands);
        assert_eq!(AnnotationKind::Register.row(), AnnotationRow::Responses);
        assert_eq!(AnnotationKind::RxData.row(), AnnotationRow::Responses);
        assert_eq!(AnnotationKind::Warning.row(), AnnotationRow::Warnings);
    }

    #[test]
    fn test_labels() {
        let ann = Annotation::new(SampleSpan::new(1, 2), AnnotationKind::Command, "Cmd NOP")
            .with_short("NOP");
        assert_eq!(ann.label(), "Cmd NOP");
        assert_eq!(ann.labels, vec!["Cmd NOP".to_string(), "NOP".to_string()]);
        assert!(!ann.is_warning());
    }

    #[test]
    fn test_vec_sink() {
        let mut sink: Vec<Annotation> = Vec::new();
        sink.put(Annotation::new(
            SampleSpan::at(5),
            AnnotationKind::Warning,
            "excess byte",
        ));
        assert_eq!(sink.len(), 1);
        assert!(sink[0].is_warning());
    }
}
