//! One acquisition run: configure the board, collect its sample stream, and decode it.

use std::ops::Range;

use crate::{Error, Result};
use crate::sys::Transport;
use crate::params::ClampNotice;
use crate::config::{AdcParameters, Configuration};
use crate::command::Command;
use crate::sample::{self, ChannelBuffers, ChannelMask, BYTES_PER_WORD};

/// Quantities fixed by the parameters sent to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionPlan {
    pub channel_count: usize,
    pub samples_per_channel: usize,
    /// Number of words the board sends back.
    pub total_samples: usize,
    pub expected_byte_count: usize,
}

impl AcquisitionPlan {
    pub fn new(parameters: &AdcParameters) -> AcquisitionPlan {
        let total_samples = parameters.total_samples() as usize;
        AcquisitionPlan {
            channel_count: parameters.channel_count() as usize,
            samples_per_channel: parameters.samples_per_channel() as usize,
            total_samples,
            expected_byte_count: total_samples * BYTES_PER_WORD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Configuring,
    AwaitingData,
    Decoded,
    Done,
}

/// Decoded result of a run, ready for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    buffers: ChannelBuffers,
    samples_per_channel: usize,
    sample_rate_per_channel: u32,
}

impl Acquisition {
    /// Sample sequences of the configured channels.
    pub fn channels(&self) -> &[Vec<u16>] {
        self.buffers.active_channels()
    }

    pub fn channel(&self, index: usize) -> &[u16] {
        self.buffers.channel(index)
    }

    /// Channels that received samples without being configured.
    pub fn anomalous(&self) -> ChannelMask {
        self.buffers.anomalous()
    }

    /// Sample indices shared by every channel.
    pub fn sample_axis(&self) -> Range<usize> {
        0..self.samples_per_channel
    }

    pub fn sample_rate_per_channel(&self) -> u32 {
        self.sample_rate_per_channel
    }

    /// Time covered by one channel's samples.
    pub fn elapsed_seconds(&self) -> f64 {
        self.samples_per_channel as f64 / self.sample_rate_per_channel as f64
    }
}

/// Drives a single acquisition through `Configuring -> AwaitingData -> Decoded -> Done`.
///
/// There is no way back to `Configuring`; start a new session for the next run.
#[derive(Debug)]
pub struct Session<T: Transport> {
    transport: T,
    parameters: AdcParameters,
    notices: Vec<ClampNotice>,
    plan: AcquisitionPlan,
    state: State,
    received: Vec<u8>,
    buffers: Option<ChannelBuffers>,
}

impl<T: Transport> Session<T> {
    /// Finalize `configuration` and prepare a run over `transport`. Values that had to be
    /// clamped are available from [`Session::notices`].
    pub fn new(transport: T, configuration: &Configuration) -> Session<T> {
        let finalized = configuration.finalize();
        let plan = AcquisitionPlan::new(&finalized.parameters);
        log::debug!("acquisition plan: {:?}", plan);
        Session {
            transport,
            parameters: finalized.parameters,
            notices: finalized.notices,
            plan,
            state: State::Configuring,
            received: Vec::new(),
            buffers: None,
        }
    }

    /// Configure, wait for the samples, and decode them in one go.
    pub fn run(transport: T, configuration: &Configuration) -> Result<Acquisition> {
        let mut session = Session::new(transport, configuration);
        session.configure()?;
        session.acquire()?;
        session.finish()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn plan(&self) -> &AcquisitionPlan {
        &self.plan
    }

    pub fn parameters(&self) -> &AdcParameters {
        &self.parameters
    }

    pub fn notices(&self) -> &[ClampNotice] {
        &self.notices[..]
    }

    /// Command sent by [`Session::configure`].
    pub fn command(&self) -> Result<Command> {
        Command::acquisition(&self.parameters)
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn expect_state(&self, operation: &'static str, state: State) -> Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(Error::InvalidState { operation, state: self.state })
        }
    }

    fn send(&mut self, command: &Command) -> Result<()> {
        let line = command.encode()?;
        log::debug!("send({})", command);
        self.transport.write_all(&line[..])
    }

    /// Discard anything the board sent before the session started; its first bytes after
    /// power-on are not meaningful.
    pub fn flush_input(&mut self) -> Result<()> {
        self.expect_state("flush input", State::Configuring)?;
        self.transport.clear_input()
    }

    /// Show `text` on the board's display. Only possible before the acquisition is configured.
    pub fn send_text(&mut self, text: &str, column: u32, row: u32) -> Result<()> {
        self.expect_state("send text", State::Configuring)?;
        self.send(&Command::text(text, column, row))
    }

    /// Send the acquisition parameters. The board starts converting once it has them (or once it
    /// is triggered).
    pub fn configure(&mut self) -> Result<()> {
        self.expect_state("configure", State::Configuring)?;
        let command = self.command()?;
        self.send(&command)?;
        self.received.clear();
        self.received.reserve_exact(self.plan.expected_byte_count);
        self.state = State::AwaitingData;
        Ok(())
    }

    /// Number of sample bytes still missing.
    pub fn remaining(&self) -> usize {
        self.plan.expected_byte_count - self.received.len()
    }

    /// Take a chunk of the sample stream, as it arrives.
    ///
    /// The session decodes once exactly the expected byte count has been collected. A chunk
    /// that would exceed it is refused whole.
    pub fn accept(&mut self, chunk: &[u8]) -> Result<State> {
        self.expect_state("accept data", State::AwaitingData)?;
        let actual = self.received.len() + chunk.len();
        if actual > self.plan.expected_byte_count {
            return Err(Error::ProtocolLengthMismatch {
                expected: self.plan.expected_byte_count,
                actual,
            })
        }
        self.received.extend_from_slice(chunk);
        self.decode_if_complete()
    }

    fn decode_if_complete(&mut self) -> Result<State> {
        if self.remaining() == 0 {
            let buffers = sample::demultiplex(
                &self.received[..], self.plan.total_samples, self.plan.channel_count)?;
            self.received = Vec::new();
            self.buffers = Some(buffers);
            self.state = State::Decoded;
        }
        Ok(self.state)
    }

    /// Block until the rest of the sample stream has been read from the transport.
    ///
    /// If the transport times out, whatever did arrive is kept and the session keeps waiting;
    /// calling `acquire` again continues where the stream stopped.
    pub fn acquire(&mut self) -> Result<()> {
        self.expect_state("acquire", State::AwaitingData)?;
        log::debug!("waiting for {} samples ({} bytes)",
            self.plan.total_samples, self.remaining());
        let start = self.received.len();
        self.received.resize(self.plan.expected_byte_count, 0);
        match self.transport.read_exact(&mut self.received[start..]) {
            Ok(()) => (),
            Err(Error::Timeout { expected, received }) => {
                self.received.truncate(start + received);
                log::debug!("kept {} partial bytes, {} missing", received, self.remaining());
                return Err(Error::Timeout { expected, received })
            }
            Err(error) => {
                self.received.truncate(start);
                return Err(error)
            }
        }
        self.decode_if_complete()?;
        Ok(())
    }

    /// Hand out the decoded channels and end the session.
    pub fn finish(&mut self) -> Result<Acquisition> {
        self.expect_state("finish", State::Decoded)?;
        let buffers = self.buffers.take().ok_or(Error::InvalidState {
            operation: "finish",
            state: self.state,
        })?;
        self.state = State::Done;
        Ok(Acquisition {
            buffers,
            samples_per_channel: self.plan.samples_per_channel,
            sample_rate_per_channel: self.parameters.sample_rate_per_channel(),
        })
    }
}
