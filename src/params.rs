//! Parameter bounds of the acquisition board and the clamping rule applied to them.

use std::fmt;

/// Inclusive integer range a configuration field must lie in when it is sent to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32) -> Bounds {
        Bounds { min, max }
    }

    pub fn contains(self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

pub const CHANNEL_COUNT: Bounds = Bounds::new(1, 8);
/// Device-global; the effective cap is divided by the channel count, see [`Caps`].
pub const SAMPLES_PER_CHANNEL: Bounds = Bounds::new(1, 50_000);
/// Device-global; the effective cap is divided by the channel count, see [`Caps`].
/// The board actually manages about 86000 S/s summed over all channels.
pub const SAMPLE_RATE_PER_CHANNEL: Bounds = Bounds::new(1, 100_000);
pub const TRIGGER_ENABLED: Bounds = Bounds::new(0, 1);
pub const TRIGGER_EDGE: Bounds = Bounds::new(0, 4);
pub const DEBOUNCE_MICROSECONDS: Bounds = Bounds::new(0, 10_000);

/// Record of a value that was replaced by the nearest bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampNotice {
    pub field: &'static str,
    pub original: u32,
    pub replacement: u32,
}

impl fmt::Display for ClampNotice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let direction = if self.original < self.replacement { "too low" } else { "too large" };
        write!(f, "the {} value {} is {}, replaced with {}",
            self.field, self.original, direction, self.replacement)
    }
}

/// Clamp `value` into `bounds`.
///
/// Returns the value to use together with a notice if it differs from the input. Out of range
/// input is never an error; replacing it with the nearest bound is the recovery.
pub fn clamp(field: &'static str, value: u32, bounds: Bounds) -> (u32, Option<ClampNotice>) {
    debug_assert!(bounds.min <= bounds.max);
    if bounds.contains(value) {
        return (value, None)
    }
    let replacement = if value < bounds.min { bounds.min } else { bounds.max };
    (replacement, Some(ClampNotice { field, original: value, replacement }))
}

/// Effective per-channel limits once the number of active channels is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caps {
    pub samples_per_channel: Bounds,
    pub sample_rate_per_channel: Bounds,
}

impl Caps {
    /// Derive the limits from the device-global maxima. `channel_count` is clamped first.
    pub fn for_channels(channel_count: u32) -> Caps {
        let (channel_count, _) = clamp("channel count", channel_count, CHANNEL_COUNT);
        Caps {
            samples_per_channel: Bounds::new(
                SAMPLES_PER_CHANNEL.min,
                SAMPLES_PER_CHANNEL.max / channel_count),
            sample_rate_per_channel: Bounds::new(
                SAMPLE_RATE_PER_CHANNEL.min,
                SAMPLE_RATE_PER_CHANNEL.max / channel_count),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerEdge {
    /// Trigger whenever the pin level is low.
    Low,
    /// Trigger whenever the pin level is high.
    High,
    Change,
    #[default]
    Rising,
    Falling,
}

impl TriggerEdge {
    pub const ALL: [TriggerEdge; 5] = [
        TriggerEdge::Low,
        TriggerEdge::High,
        TriggerEdge::Change,
        TriggerEdge::Rising,
        TriggerEdge::Falling,
    ];

    pub fn code(self) -> u32 {
        match self {
            Self::Low     => 0,
            Self::High    => 1,
            Self::Change  => 2,
            Self::Rising  => 3,
            Self::Falling => 4,
        }
    }

    /// Decode after clamping into [`TRIGGER_EDGE`].
    pub fn from_code(code: u32) -> (TriggerEdge, Option<ClampNotice>) {
        let (code, notice) = clamp("trigger edge", code, TRIGGER_EDGE);
        (Self::ALL[code as usize], notice)
    }

    /// Level modes are the only ones where the board applies a debounce interval.
    pub fn is_level(self) -> bool {
        matches!(self, Self::Low | Self::High)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    Adc,
    Text,
    /// Reserved by the firmware; not implemented.
    Dac,
    /// Reserved by the firmware; not implemented.
    Att,
}

impl Category {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Adc  => "ADC",
            Self::Text => "TEXT",
            Self::Dac  => "DAC",
            Self::Att  => "ATT",
        }
    }

    pub fn is_implemented(self) -> bool {
        matches!(self, Self::Adc | Self::Text)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
