//! Line protocol spoken from the host to the board.
//!
//! Every command is a single line of space separated tokens, led by the category keyword and
//! terminated by CR LF. Fields are positional; the board expects all of them even when some are
//! not used by the selected mode.

use std::fmt;

use crate::{Error, Result};
use crate::config::AdcParameters;
use crate::params::Category;

pub const LINE_TERMINATOR: &[u8; 2] = b"\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `ADC <channels> <total samples> <rate per channel> <trigger> <edge> <debounce>`
    Adc(AdcParameters),
    /// `TEXT <text> <column> <row>`, shown on the optional LCD.
    Text { text: String, column: u32, row: u32 },
    /// A category the firmware reserves but does not implement yet.
    Reserved(Category),
}

impl Command {
    /// Command applying `parameters`. The category selected in the configuration decides which
    /// command is built; only `ADC` carries acquisition parameters, and `TEXT` is refused.
    pub fn acquisition(parameters: &AdcParameters) -> Result<Command> {
        match parameters.category() {
            Category::Adc => Ok(Command::Adc(*parameters)),
            category if !category.is_implemented() => Ok(Command::Reserved(category)),
            category => Err(Error::NotAnAcquisition(category)),
        }
    }

    pub fn text(text: impl Into<String>, column: u32, row: u32) -> Command {
        Command::Text { text: text.into(), column, row }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Adc(_) => Category::Adc,
            Self::Text { .. } => Category::Text,
            Self::Reserved(category) => *category,
        }
    }

    /// Check that the command can be represented on the wire.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Adc(_) => Ok(()),
            Self::Text { text, .. } => {
                if text.is_empty() || text.chars().any(char::is_whitespace) {
                    Err(Error::InvalidText(text.clone()))
                } else {
                    Ok(())
                }
            }
            Self::Reserved(category) =>
                Err(Error::UnimplementedCategory(*category)),
        }
    }

    /// Serialize into the bytes sent to the board, including the line terminator.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let mut line = self.to_string().into_bytes();
        line.extend_from_slice(LINE_TERMINATOR);
        Ok(line)
    }
}

/// Formats the line without its terminator. Reserved categories format as the bare keyword, but
/// [`Command::encode`] refuses them.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Adc(params) =>
                write!(f, "{} {} {} {} {} {} {}",
                    Category::Adc,
                    params.channel_count(),
                    params.total_samples(),
                    params.sample_rate_per_channel(),
                    params.trigger_enabled() as u32,
                    params.trigger_edge().code(),
                    params.debounce_microseconds()),
            Self::Text { text, column, row } =>
                write!(f, "{} {} {} {}", Category::Text, text, column, row),
            Self::Reserved(category) =>
                write!(f, "{}", category),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Configuration;
    use crate::params::TriggerEdge;

    fn adc(config: Configuration) -> Command {
        Command::acquisition(&config.finalize().parameters).unwrap()
    }

    #[test]
    fn test_adc_defaults() {
        let command = adc(Configuration::default());
        assert_eq!(command.encode().unwrap(), b"ADC 2 2000 10000 0 3 0\r\n");
    }

    #[test]
    fn test_adc_total_samples() {
        let command = adc(Configuration {
            channel_count: 2,
            samples_per_channel: 3,
            sample_rate_per_channel: 10_000,
            ..Default::default()
        });
        assert_eq!(command.to_string(), "ADC 2 6 10000 0 3 0");
    }

    #[test]
    fn test_adc_trigger_fields_always_present() {
        let command = adc(Configuration {
            channel_count: 1,
            trigger_enabled: 1,
            trigger_edge: TriggerEdge::Low.code(),
            debounce_microseconds: 500,
            ..Default::default()
        });
        assert_eq!(command.to_string(), "ADC 1 1000 10000 1 0 500");
        let command = adc(Configuration {
            channel_count: 1,
            trigger_enabled: 1,
            trigger_edge: TriggerEdge::Change.code(),
            debounce_microseconds: 250,
            ..Default::default()
        });
        assert_eq!(command.to_string(), "ADC 1 1000 10000 1 2 0");
        let command = adc(Configuration {
            channel_count: 1,
            trigger_enabled: 0,
            trigger_edge: TriggerEdge::Low.code(),
            debounce_microseconds: 500,
            ..Default::default()
        });
        assert_eq!(command.to_string(), "ADC 1 1000 10000 0 3 0");
    }

    #[test]
    fn test_adc_clamped_values_encoded() {
        let command = adc(Configuration {
            channel_count: 4,
            samples_per_channel: 99_999,
            sample_rate_per_channel: 99_999,
            ..Default::default()
        });
        assert_eq!(command.to_string(), "ADC 4 50000 25000 0 3 0");
    }

    #[test]
    fn test_text() {
        let command = Command::text("__Hello__", 0, 2);
        assert_eq!(command.encode().unwrap(), b"TEXT __Hello__ 0 2\r\n");
        assert_eq!(command.category(), Category::Text);
    }

    #[test]
    fn test_text_rejects_spaces() {
        assert!(matches!(Command::text("Hello there", 0, 0).encode(),
            Err(Error::InvalidText(_))));
        assert!(matches!(Command::text("", 0, 0).encode(),
            Err(Error::InvalidText(_))));
    }

    #[test]
    fn test_reserved_categories_fail() {
        for category in [Category::Dac, Category::Att] {
            let command = adc(Configuration { category, ..Default::default() });
            assert_eq!(command, Command::Reserved(category));
            assert!(matches!(command.encode(),
                Err(Error::UnimplementedCategory(c)) if c == category));
        }
    }

    #[test]
    fn test_text_category_is_not_an_acquisition() {
        let parameters = Configuration { category: Category::Text, ..Default::default() }
            .finalize().parameters;
        let error = Command::acquisition(&parameters).unwrap_err();
        assert!(matches!(error, Error::NotAnAcquisition(Category::Text)));
        assert_eq!(error.to_string(), "category TEXT does not take acquisition parameters");
    }
}
