use crate::Result;

/// Byte stream to the board. Implementations block until each call completes or fails; retrying
/// and timeouts are their own business.
pub trait Transport {
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Fill `data` completely, or fail with [`crate::Error::Timeout`] reporting how much arrived.
    /// On timeout the bytes that did arrive are at the start of `data`; they are consumed from
    /// the stream either way.
    fn read_exact(&mut self, data: &mut [u8]) -> Result<()>;

    /// Discard anything received but not read yet.
    fn clear_input(&mut self) -> Result<()>;
}

#[cfg(feature = "hardware")]
pub mod serial;
