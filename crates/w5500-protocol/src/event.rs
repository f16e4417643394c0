//! Input events from the SPI front end
//!
//! The decoder does not see electrical samples. The front end has already
//! found chip-select edges and assembled 8-bit words on both data lines; it
//! hands over one event at a time, in capture order.

/// Logic level of the chip-select line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    /// Asserted (CS# is active low)
    Low,
    /// Released
    High,
}

/// Sample positions covered by an event or annotation, inclusive start, exclusive end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleSpan {
    /// First sample
    pub start: u64,
    /// Sample after the last
    pub end: u64,
}

impl SampleSpan {
    /// Create a span
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// A zero-width span at a single sample
    pub fn at(sample: u64) -> Self {
        Self {
            start: sample,
            end: sample,
        }
    }
}

/// One event from the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum SpiEvent {
    /// The chip-select line changed (or was first observed)
    ///
    /// `old` is `None` when no earlier level is known; `old` and `new` both
    /// `None` means the capture has no chip-select channel at all.
    ChipSelect {
        /// Sample position of the transition
        sample: u64,
        /// Level before the transition
        old: Option<Level>,
        /// Level after the transition
        new: Option<Level>,
    },

    /// One word clocked on both data lines
    Data {
        /// Samples covered by the word
        span: SampleSpan,
        /// Host to chip byte
        mosi: Option<u8>,
        /// Chip to host byte
        miso: Option<u8>,
    },
}

impl SpiEvent {
    /// Chip-select transition from `old` to `new`
    pub fn chip_select(sample: u64, old: Level, new: Level) -> Self {
        SpiEvent::ChipSelect {
            sample,
            old: Some(old),
            new: Some(new),
        }
    }

    /// Byte pair with both lines present
    pub fn data(start: u64, end: u64, mosi: u8, miso: u8) -> Self {
        SpiEvent::Data {
            span: SampleSpan::new(start, end),
            mosi: Some(mosi),
            miso: Some(miso),
        }
    }

    /// First sample covered by this event
    pub fn start_sample(&self) -> u64 {
        match self {
            SpiEvent::ChipSelect { sample, .. } => *sample,
            SpiEvent::Data { span, .. } => span.start,
        }
    }
}
