//! Capture files
//!
//! A capture is JSON lines, one [`SpiEvent`] per line in capture order, as
//! written by `w5500-annotate simulate`. Blank lines are skipped.

use std::io::{BufRead, Write};

use thiserror::Error;
use w5500_protocol::SpiEvent;

/// Errors reading or writing a capture
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("event {index}: {source}")]
    Serialize {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Read every event from a capture
pub fn read_events(reader: impl BufRead) -> Result<Vec<SpiEvent>, CaptureError> {
    let mut events = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event = serde_json::from_str(trimmed).map_err(|source| CaptureError::Parse {
            line: i + 1,
            source,
        })?;
        events.push(event);
    }
    tracing::debug!("read {} capture events", events.len());
    Ok(events)
}

/// Write events as a capture
pub fn write_events(mut writer: impl Write, events: &[SpiEvent]) -> Result<(), CaptureError> {
    for (index, event) in events.iter().enumerate() {
        let json =
            serde_json::to_string(event).map_err(|source| CaptureError::Serialize { index, source })?;
        writeln!(writer, "{json}")?;
    }
    writer.flush()?;
    Ok(())
}
