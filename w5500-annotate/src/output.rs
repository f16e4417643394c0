//! Annotation output

use std::io::{self, Write};

use serde::Serialize;
use w5500_protocol::{Annotation, AnnotationKind, AnnotationRow, SampleSpan};

use crate::settings::{OutputFormat, Settings};

#[derive(Serialize)]
struct JsonAnnotation<'a> {
    #[serde(flatten)]
    span: SampleSpan,
    row: AnnotationRow,
    kind: AnnotationKind,
    labels: &'a [String],
}

/// Format one annotation as an aligned text line
pub fn text_line(annotation: &Annotation) -> String {
    format!(
        "{:>10}-{:<10} {:<9} {:<8} {}",
        annotation.span.start,
        annotation.span.end,
        annotation.kind.row().title(),
        annotation.kind.id(),
        annotation.label()
    )
}

/// Write the annotations the settings ask for, returning how many were written
pub fn write_annotations(
    mut writer: impl Write,
    annotations: &[Annotation],
    settings: &Settings,
) -> io::Result<usize> {
    let mut written = 0;
    for annotation in annotations.iter().filter(|a| settings.shows(a.kind)) {
        match settings.format {
            OutputFormat::Text => writeln!(writer, "{}", text_line(annotation))?,
            OutputFormat::Json => {
                let json = serde_json::to_string(&JsonAnnotation {
                    span: annotation.span,
                    row: annotation.kind.row(),
                    kind: annotation.kind,
                    labels: &annotation.labels,
                })?;
                writeln!(writer, "{json}")?;
            }
        }
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Annotation> {
        vec![
            Annotation::new(SampleSpan::new(10, 20), AnnotationKind::Command, "Cmd NOP")
                .with_short("NOP"),
            Annotation::new(
                SampleSpan::new(10, 20),
                AnnotationKind::Register,
                "Reg STATUS = \"0E\"",
            ),
            Annotation::new(SampleSpan::at(30), AnnotationKind::Warning, "excess byte"),
        ]
    }

    fn render(settings: &Settings) -> String {
        let mut buf = Vec::new();
        write_annotations(&mut buf, &sample(), settings).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_line() {
        let line = text_line(&sample()[0]);
        assert_eq!(line, "        10-20         Commands  cmd      Cmd NOP");
    }

    #[test]
    fn test_row_filter_applies() {
        let settings = Settings {
            show_warnings: false,
            ..Default::default()
        };
        let text = render(&settings);
        assert_eq!(text.lines().count(), 2);
        assert!(!text.contains("excess byte"));
    }

    #[test]
    fn test_json_lines() {
        let settings = Settings {
            format: OutputFormat::Json,
            ..Default::default()
        };
        let text = render(&settings);
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["start"], 10);
        assert_eq!(first["end"], 20);
        assert_eq!(first["row"], "commands");
        assert_eq!(first["kind"], "command");
        assert_eq!(first["labels"][1], "NOP");
    }
}
