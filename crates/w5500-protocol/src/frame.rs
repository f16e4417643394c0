//! Per-command data byte accumulation
//!
//! A [`Frame`] is created when a command byte is classified and dropped when
//! chip-select is released. It collects the MOSI/MISO pairs that follow the
//! command byte, up to the command's maximum, and tracks the samples they span.

use crate::command::Command;
use crate::error::ExcessByte;
use crate::event::SampleSpan;

/// One word clocked on both data lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BytePair {
    /// Host to chip
    pub mosi: u8,
    /// Chip to host
    pub miso: u8,
}

/// Data bytes collected for one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    command_span: SampleSpan,
    pairs: Vec<BytePair>,
    data_span: Option<SampleSpan>,
}

impl Frame {
    /// Start collecting for a command whose byte occupied `command_span`
    pub fn begin(command: Command, command_span: SampleSpan) -> Self {
        Self {
            command,
            command_span,
            pairs: Vec::with_capacity(command.max_trailing),
            data_span: None,
        }
    }

    /// The command this frame belongs to
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Append a data byte pair
    ///
    /// Once the command's maximum is reached further pairs are rejected and
    /// the frame is left untouched.
    pub fn append(&mut self, pair: BytePair, span: SampleSpan) -> Result<(), ExcessByte> {
        if self.pairs.len() >= self.command.max_trailing {
            return Err(ExcessByte {
                max: self.command.max_trailing,
            });
        }

        let start = self.data_span.map_or(span.start, |s| s.start);
        self.data_span = Some(SampleSpan::new(start, span.end));
        self.pairs.push(pair);
        Ok(())
    }

    /// Collected pairs in arrival order
    pub fn collected(&self) -> &[BytePair] {
        &self.pairs
    }

    /// Number of collected pairs
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no data byte has arrived yet
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Samples covered by the collected data bytes, `None` before the first one
    pub fn span(&self) -> Option<SampleSpan> {
        self.data_span
    }

    /// Span reported for frame-end annotations
    ///
    /// Commands whose result merges with the command byte start at the
    /// command byte; the rest cover the data bytes only.
    pub fn render_span(&self) -> Option<SampleSpan> {
        self.data_span.map(|data| {
            if self.command.span_from_command {
                SampleSpan::new(self.command_span.start, data.end)
            } else {
                data
            }
        })
    }

    /// MOSI bytes in arrival order
    pub fn mosi_bytes(&self) -> Vec<u8> {
        self.pairs.iter().map(|p| p.mosi).collect()
    }

    /// MISO bytes in arrival order
    pub fn miso_bytes(&self) -> Vec<u8> {
        self.pairs.iter().map(|p| p.miso).collect()
    }

    /// Whether enough data bytes arrived to complete the command
    pub fn is_complete(&self) -> bool {
        self.pairs.len() >= self.command.min_trailing
    }
}
