//! Decoding of the multiplexed sample stream sent by the board.
//!
//! The board sends a flat sequence of 16-bit big-endian words, one per conversion, in the order
//! the conversions happened:
//!
//! ```text
//! | 15 | 14 13 12 | 11 10 9 8 7 6 5 4 3 2 1 0 |
//! |  - |   tag    |          sample           |
//! ```
//!
//! The tag names the analog input the sample was taken from. There is no other framing.

use bitflags::bitflags;

use crate::{Error, Result};

/// Size of the tag space, independent of how many channels are configured.
pub const CHANNEL_SLOTS: usize = 8;
pub const BYTES_PER_WORD: usize = 2;
pub const SAMPLE_MAX: u16 = 0x0fff;

const TAG_SHIFT: u32 = 12;
const TAG_MASK: u16 = 0b111;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWord(pub u16);

impl SampleWord {
    pub fn from_be_bytes(bytes: [u8; 2]) -> SampleWord {
        SampleWord(u16::from_be_bytes(bytes))
    }

    pub fn new(channel_tag: u8, sample_value: u16) -> SampleWord {
        assert!((channel_tag as usize) < CHANNEL_SLOTS && sample_value <= SAMPLE_MAX);
        SampleWord((channel_tag as u16) << TAG_SHIFT | sample_value)
    }

    pub fn channel_tag(self) -> u8 {
        ((self.0 >> TAG_SHIFT) & TAG_MASK) as u8
    }

    pub fn sample_value(self) -> u16 {
        self.0 & SAMPLE_MAX
    }

    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

bitflags! {
    /// Set of channel slots, one bit per tag value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelMask: u8 {
        const Ch0 = 1<<0;
        const Ch1 = 1<<1;
        const Ch2 = 1<<2;
        const Ch3 = 1<<3;
        const Ch4 = 1<<4;
        const Ch5 = 1<<5;
        const Ch6 = 1<<6;
        const Ch7 = 1<<7;
    }
}

impl ChannelMask {
    pub fn channel(index: usize) -> Self {
        assert!(index < CHANNEL_SLOTS);
        ChannelMask::from_bits_retain(1 << index)
    }

    /// The first `count` channels.
    pub fn first(count: usize) -> Self {
        assert!(count <= CHANNEL_SLOTS);
        ChannelMask::from_bits_retain(((1u16 << count) - 1) as u8)
    }

    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..CHANNEL_SLOTS).filter(move |&index| self.contains(Self::channel(index)))
    }
}

/// Per-channel sample sequences, allocated for the whole tag space. Only the first `active`
/// of them are expected to receive data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBuffers {
    channels: [Vec<u16>; CHANNEL_SLOTS],
    active: usize,
}

impl ChannelBuffers {
    fn new(active: usize) -> ChannelBuffers {
        assert!(active >= 1 && active <= CHANNEL_SLOTS);
        ChannelBuffers { channels: Default::default(), active }
    }

    fn push(&mut self, word: SampleWord) {
        self.channels[word.channel_tag() as usize].push(word.sample_value())
    }

    /// Number of configured channels.
    pub fn active(&self) -> usize {
        self.active
    }

    pub fn channel(&self, index: usize) -> &[u16] {
        &self.channels[index][..]
    }

    /// Sequences of the configured channels, in channel order.
    pub fn active_channels(&self) -> &[Vec<u16>] {
        &self.channels[..self.active]
    }

    /// Slots that received at least one sample.
    pub fn populated(&self) -> ChannelMask {
        (0..CHANNEL_SLOTS)
            .filter(|&index| !self.channels[index].is_empty())
            .fold(ChannelMask::empty(), |mask, index| mask | ChannelMask::channel(index))
    }

    /// Slots beyond the configured channel count that nonetheless received samples. Empty unless
    /// the board or the link misbehaved.
    pub fn anomalous(&self) -> ChannelMask {
        self.populated() - ChannelMask::first(self.active)
    }
}

/// Split `bytes` into per-channel sequences.
///
/// `active` must be within the tag space. `bytes` must hold exactly `total_samples` words;
/// anything else means the stream is out of step with the command that was sent, and nothing is
/// decoded. Words tagged with a channel at or above `active` are kept in their own slot and
/// reported through [`ChannelBuffers::anomalous`].
pub fn demultiplex(bytes: &[u8], total_samples: usize, active: usize) -> Result<ChannelBuffers> {
    if active == 0 || active > CHANNEL_SLOTS {
        return Err(Error::InvalidPlan { total_samples, channel_count: active })
    }
    let expected = total_samples.checked_mul(BYTES_PER_WORD)
        .ok_or(Error::InvalidPlan { total_samples, channel_count: active })?;
    if bytes.len() != expected {
        return Err(Error::ProtocolLengthMismatch { expected, actual: bytes.len() })
    }

    let mut buffers = ChannelBuffers::new(active);
    let words: &[[u8; 2]] = bytemuck::cast_slice(bytes);
    for &word in words {
        buffers.push(SampleWord::from_be_bytes(word));
    }

    let anomalous = buffers.anomalous();
    if !anomalous.is_empty() {
        log::warn!("samples tagged for unconfigured channels {:?} (configured {})",
            anomalous.indices().collect::<Vec<_>>(), active);
    }
    log::debug!("demultiplexed {} words into {:?}", total_samples, buffers.populated());
    Ok(buffers)
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode(words: &[(u8, u16)]) -> Vec<u8> {
        words.iter()
            .flat_map(|&(tag, value)| SampleWord::new(tag, value).to_be_bytes())
            .collect()
    }

    #[test]
    fn test_word_fields() {
        let word = SampleWord(0b1_101_111111111111);
        assert_eq!(word.channel_tag(), 5);
        assert_eq!(word.sample_value(), 4095);
        let word = SampleWord(0x0000);
        assert_eq!(word.channel_tag(), 0);
        assert_eq!(word.sample_value(), 0);
    }

    #[test]
    fn test_word_ignores_bit_15() {
        assert_eq!(SampleWord(0x8000 | 0x3123).channel_tag(), 3);
        assert_eq!(SampleWord(0x8000 | 0x3123).sample_value(), 0x123);
    }

    #[test]
    fn test_word_big_endian() {
        let word = SampleWord::from_be_bytes([0x51, 0x02]);
        assert_eq!(word.channel_tag(), 5);
        assert_eq!(word.sample_value(), 0x102);
    }

    #[test]
    fn test_two_channels() {
        let bytes = encode(&[(0, 10), (1, 20), (0, 30), (1, 40), (0, 50), (1, 60)]);
        assert_eq!(bytes.len(), 12);
        let buffers = demultiplex(&bytes, 6, 2).unwrap();
        assert_eq!(buffers.channel(0), [10, 30, 50]);
        assert_eq!(buffers.channel(1), [20, 40, 60]);
        assert_eq!(buffers.populated(), ChannelMask::Ch0 | ChannelMask::Ch1);
        assert!(buffers.anomalous().is_empty());
    }

    #[test]
    fn test_cycled_channels() {
        for active in 1..=CHANNEL_SLOTS {
            let per_channel = 5;
            let words = (0..active * per_channel)
                .map(|index| ((index % active) as u8, ((index * 37) % 4096) as u16))
                .collect::<Vec<_>>();
            let buffers = demultiplex(&encode(&words), words.len(), active).unwrap();
            for channel in 0..CHANNEL_SLOTS {
                let expected = words.iter()
                    .filter(|&&(tag, _)| tag as usize == channel)
                    .map(|&(_, value)| value)
                    .collect::<Vec<_>>();
                assert_eq!(buffers.channel(channel), &expected[..]);
                assert_eq!(buffers.channel(channel).len(),
                    if channel < active { per_channel } else { 0 });
            }
            assert_eq!(buffers.populated(), ChannelMask::first(active));
            assert_eq!(buffers.active_channels().len(), active);
        }
    }

    #[test]
    fn test_anomalous_tag_kept() {
        let bytes = encode(&[(0, 1), (1, 2), (6, 3), (1, 4)]);
        let buffers = demultiplex(&bytes, 4, 2).unwrap();
        assert_eq!(buffers.channel(0), [1]);
        assert_eq!(buffers.channel(1), [2, 4]);
        assert_eq!(buffers.channel(6), [3]);
        assert_eq!(buffers.anomalous(), ChannelMask::Ch6);
        assert_eq!(buffers.anomalous().indices().collect::<Vec<_>>(), [6]);
    }

    #[test]
    fn test_length_short() {
        let bytes = encode(&[(0, 1), (1, 2), (0, 3)]);
        assert!(matches!(demultiplex(&bytes[..5], 3, 2),
            Err(Error::ProtocolLengthMismatch { expected: 6, actual: 5 })));
    }

    #[test]
    fn test_length_long() {
        let mut bytes = encode(&[(0, 1), (1, 2), (0, 3)]);
        bytes.push(0);
        assert!(matches!(demultiplex(&bytes, 3, 2),
            Err(Error::ProtocolLengthMismatch { expected: 6, actual: 7 })));
    }

    #[test]
    fn test_length_even_but_wrong() {
        let bytes = encode(&[(0, 1), (1, 2)]);
        assert!(matches!(demultiplex(&bytes, 3, 2),
            Err(Error::ProtocolLengthMismatch { expected: 6, actual: 4 })));
    }

    #[test]
    fn test_channel_count_out_of_range() {
        for active in [0, CHANNEL_SLOTS + 1] {
            assert!(matches!(demultiplex(&[0, 1], 1, active),
                Err(Error::InvalidPlan { total_samples: 1, channel_count }) if channel_count == active));
        }
    }

    #[test]
    fn test_byte_count_overflow() {
        assert!(matches!(demultiplex(&[], usize::MAX, 2),
            Err(Error::InvalidPlan { total_samples: usize::MAX, channel_count: 2 })));
    }

    #[test]
    fn test_empty() {
        let buffers = demultiplex(&[], 0, 1).unwrap();
        assert!(buffers.populated().is_empty());
    }

    #[test]
    fn test_channel_mask() {
        assert_eq!(ChannelMask::first(0), ChannelMask::empty());
        assert_eq!(ChannelMask::first(3), ChannelMask::Ch0 | ChannelMask::Ch1 | ChannelMask::Ch2);
        assert_eq!(ChannelMask::first(8), ChannelMask::all());
        assert_eq!(ChannelMask::channel(7), ChannelMask::Ch7);
    }
}
