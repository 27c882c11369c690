//! Acquisition configuration as requested by the user, and its validated form.

use crate::params::{self, Caps, Category, ClampNotice, TriggerEdge};

pub const DEFAULT_CHANNEL_COUNT: u32 = 2;
pub const DEFAULT_SAMPLES_PER_CHANNEL: u32 = 1000;
pub const DEFAULT_SAMPLE_RATE_PER_CHANNEL: u32 = 10_000;

/// Requested acquisition settings. Numeric fields are taken as given and only brought into range
/// by [`Configuration::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub category: Category,
    pub channel_count: u32,
    pub samples_per_channel: u32,
    pub sample_rate_per_channel: u32,
    /// `0` starts converting immediately, `1` waits for the trigger input.
    pub trigger_enabled: u32,
    /// Code of a [`TriggerEdge`]. Only taken when the trigger is on.
    pub trigger_edge: u32,
    /// Time a level must be stable before it triggers. Only taken when the trigger is on in a
    /// level mode; the default is sent otherwise.
    pub debounce_microseconds: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            category: Category::Adc,
            channel_count: DEFAULT_CHANNEL_COUNT,
            samples_per_channel: DEFAULT_SAMPLES_PER_CHANNEL,
            sample_rate_per_channel: DEFAULT_SAMPLE_RATE_PER_CHANNEL,
            trigger_enabled: 0,
            trigger_edge: TriggerEdge::default().code(),
            debounce_microseconds: 0,
        }
    }
}

/// Configuration with every field inside its bounds. Cannot be constructed other than through
/// [`Configuration::finalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcParameters {
    category: Category,
    channel_count: u32,
    samples_per_channel: u32,
    sample_rate_per_channel: u32,
    trigger_enabled: bool,
    trigger_edge: TriggerEdge,
    debounce_microseconds: u32,
}

impl AdcParameters {
    pub fn category(&self) -> Category {
        self.category
    }

    pub fn channel_count(&self) -> u32 {
        self.channel_count
    }

    pub fn samples_per_channel(&self) -> u32 {
        self.samples_per_channel
    }

    pub fn sample_rate_per_channel(&self) -> u32 {
        self.sample_rate_per_channel
    }

    pub fn trigger_enabled(&self) -> bool {
        self.trigger_enabled
    }

    pub fn trigger_edge(&self) -> TriggerEdge {
        self.trigger_edge
    }

    pub fn debounce_microseconds(&self) -> u32 {
        self.debounce_microseconds
    }

    /// Number of sample words the board emits for one acquisition, over all channels.
    pub fn total_samples(&self) -> u32 {
        self.channel_count * self.samples_per_channel
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finalized {
    pub parameters: AdcParameters,
    /// Every field that had to be clamped, in validation order.
    pub notices: Vec<ClampNotice>,
}

impl Configuration {
    /// Bring every field into range.
    ///
    /// The channel count is validated first because the per-channel caps of the sample count and
    /// the sample rate are derived from it.
    pub fn finalize(&self) -> Finalized {
        let mut notices = Vec::new();
        let mut check = |field, value, bounds| {
            let (value, notice) = params::clamp(field, value, bounds);
            if let Some(notice) = notice {
                log::warn!("{}", notice);
                notices.push(notice);
            }
            value
        };

        let channel_count = check("channel count", self.channel_count, params::CHANNEL_COUNT);
        let caps = Caps::for_channels(channel_count);
        let samples_per_channel =
            check("samples per channel", self.samples_per_channel, caps.samples_per_channel);
        let sample_rate_per_channel =
            check("sample rate per channel", self.sample_rate_per_channel,
                caps.sample_rate_per_channel);
        let trigger_enabled =
            check("trigger enabled", self.trigger_enabled, params::TRIGGER_ENABLED) != 0;

        // The edge is only read when the trigger is on, and the debounce only for the level
        // modes; otherwise the defaults are sent.
        let defaults = Configuration::default();
        let trigger_edge = if trigger_enabled {
            TriggerEdge::from_code(
                check("trigger edge", self.trigger_edge, params::TRIGGER_EDGE)).0
        } else {
            if self.trigger_edge != defaults.trigger_edge {
                log::debug!("trigger off, sending default edge instead of {}", self.trigger_edge);
            }
            TriggerEdge::from_code(defaults.trigger_edge).0
        };
        let debounce_microseconds = if trigger_enabled && trigger_edge.is_level() {
            check("debounce", self.debounce_microseconds, params::DEBOUNCE_MICROSECONDS)
        } else {
            if self.debounce_microseconds != defaults.debounce_microseconds {
                log::debug!("debounce of {} us unused with edge {:?}, sending default",
                    self.debounce_microseconds, trigger_edge);
            }
            defaults.debounce_microseconds
        };

        Finalized {
            parameters: AdcParameters {
                category: self.category,
                channel_count,
                samples_per_channel,
                sample_rate_per_channel,
                trigger_enabled,
                trigger_edge,
                debounce_microseconds,
            },
            notices,
        }
    }
}
