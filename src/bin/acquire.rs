use std::io::Write;
use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use clap::Parser;

use espdaq::{Acquisition, Configuration, SerialTransport, Session, TriggerEdge};

/// The board resets when the port is opened and needs a moment before it listens.
const BOOT_DELAY: Duration = Duration::from_millis(1500);

const GREETING: [&str; 3] = ["__Hello__", "___from__", "__Rust___"];

/// Run one acquisition on the ESP32 DAQ board and write the samples as CSV
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Serial port the board is connected to
    #[arg(short, long, required_unless_present = "list")]
    port: Option<String>,

    #[arg(short, long, default_value_t = espdaq::DEFAULT_BAUD_RATE)]
    baud_rate: u32,

    /// Seconds to wait for the board to send data
    #[arg(long, default_value_t = espdaq::DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Number of analog inputs (1-8)
    #[arg(short, long, default_value_t = espdaq::Configuration::default().channel_count)]
    channels: u32,

    /// Samples per analog input
    #[arg(short = 'n', long, default_value_t = espdaq::Configuration::default().samples_per_channel)]
    samples: u32,

    /// Samples per second per analog input
    #[arg(short = 'r', long, default_value_t = espdaq::Configuration::default().sample_rate_per_channel)]
    rate: u32,

    /// Wait for an event on the trigger input before converting
    #[arg(short, long)]
    trigger: bool,

    /// Trigger event: 0 = LOW, 1 = HIGH, 2 = CHANGE, 3 = RISING, 4 = FALLING
    #[arg(short, long, default_value_t = TriggerEdge::default().code())]
    edge: u32,

    /// Microseconds a level must be stable before it triggers (LOW and HIGH only)
    #[arg(short, long, default_value_t = 0)]
    debounce: u32,

    /// Skip the greeting on the board's display
    #[arg(long)]
    quiet: bool,

    /// Write CSV here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// List serial ports and exit
    #[arg(long)]
    list: bool,
}

fn write_csv<W: Write>(writer: W, acquisition: &Acquisition) -> espdaq::Result<()> {
    fn csv_error(error: csv::Error) -> espdaq::Error {
        espdaq::Error::Other(error.into())
    }

    let mut writer = csv::Writer::from_writer(writer);
    let mut header = vec!["sample".to_owned()];
    header.extend((0..acquisition.channels().len()).map(|index| format!("ch{}", index)));
    writer.write_record(&header).map_err(csv_error)?;
    for index in acquisition.sample_axis() {
        let mut record = vec![index.to_string()];
        record.extend(acquisition.channels().iter().map(|channel| {
            channel.get(index).map(|value| value.to_string()).unwrap_or_default()
        }));
        writer.write_record(&record).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> espdaq::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list {
        for port in SerialTransport::available_ports()? {
            println!("{}", port);
        }
        return Ok(())
    }

    let configuration = Configuration {
        channel_count: args.channels,
        samples_per_channel: args.samples,
        sample_rate_per_channel: args.rate,
        trigger_enabled: args.trigger as u32,
        trigger_edge: args.edge,
        debounce_microseconds: args.debounce,
        ..Default::default()
    };

    let port = args.port.as_deref().unwrap_or_default();
    let transport = SerialTransport::open(port, args.baud_rate, Duration::from_secs(args.timeout))?;
    sleep(BOOT_DELAY);

    let mut session = Session::new(transport, &configuration);
    for notice in session.notices() {
        eprintln!("{}", notice);
    }
    session.flush_input()?;
    if !args.quiet {
        for (row, line) in GREETING.iter().enumerate() {
            session.send_text(line, 0, row as u32)?;
        }
    }

    eprintln!("parameters sent to DAQ: {}", session.command()?);
    session.configure()?;
    eprintln!("waiting for {} samples in total...", session.plan().total_samples);
    session.acquire()?;
    let acquisition = session.finish()?;

    eprintln!("received {} bytes", session.plan().expected_byte_count);
    if !acquisition.anomalous().is_empty() {
        eprintln!("warning: samples arrived for unconfigured channels {:?}",
            acquisition.anomalous().indices().collect::<Vec<_>>());
    }
    eprintln!("{} samples/channel, total time = {} seconds",
        acquisition.sample_axis().len(), acquisition.elapsed_seconds());

    match args.output {
        Some(path) => write_csv(std::fs::File::create(path)?, &acquisition)?,
        None => write_csv(std::io::stdout().lock(), &acquisition)?,
    }
    Ok(())
}
