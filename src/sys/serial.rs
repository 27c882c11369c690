use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};

use crate::{Error, Result};

/// Matches the rate the board firmware is built with; it shows it on the LCD after power-on.
pub const DEFAULT_BAUD_RATE: u32 = 230_400;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.port.name())
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}

impl SerialTransport {
    /// Open `path`. `timeout` bounds how long a single read may wait without receiving anything.
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<SerialTransport> {
        log::debug!("opening {} at {} baud", path, baud_rate);
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()?;
        Ok(SerialTransport { port })
    }

    pub fn available_ports() -> Result<Vec<String>> {
        Ok(serialport::available_ports()?
            .into_iter()
            .map(|info| info.port_name)
            .collect())
    }
}

impl super::Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        log::trace!("write({:02x?})", data);
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_exact(&mut self, data: &mut [u8]) -> Result<()> {
        let mut received = 0;
        while received < data.len() {
            match self.port.read(&mut data[received..]) {
                Ok(0) =>
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into()),
                Ok(count) => {
                    received += count;
                    log::trace!("received {}/{} bytes", received, data.len());
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted =>
                    continue,
                Err(error) if error.kind() == io::ErrorKind::TimedOut =>
                    return Err(Error::Timeout { expected: data.len(), received }),
                Err(error) =>
                    return Err(error.into()),
            }
        }
        Ok(())
    }

    fn clear_input(&mut self) -> Result<()> {
        Ok(self.port.clear(ClearBuffer::Input)?)
    }
}
