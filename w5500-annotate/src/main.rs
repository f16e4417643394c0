//! W5500 SPI Annotator
//!
//! Decodes captured SPI traffic into labelled annotations, prints the
//! register catalog, and generates demonstration captures.

mod capture;
mod output;
mod settings;

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use settings::{OutputFormat, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use w5500_protocol::{catalog, Annotation, Decoder};
use w5500_sim::{VirtualChip, VirtualHost};

#[derive(Parser, Debug)]
#[command(name = "w5500-annotate", version, about = "Annotate captured W5500 SPI traffic")]
struct Cli {
    /// Settings file (defaults to $XDG_CONFIG_HOME/w5500-annotate/settings.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a capture into annotations
    Decode {
        /// Capture file, one event per line, or `-` for stdin
        capture: PathBuf,

        /// Output format, overriding the settings file
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Write annotations to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List register names and widths
    Registers {
        /// Show the socket register block with names for this socket
        #[arg(short, long)]
        socket: Option<u8>,
    },

    /// Generate a demonstration capture from the simulated chip
    Simulate {
        /// Write the capture to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the current settings to the settings file
    InitConfig,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "w5500_annotate=info,w5500_protocol=info,w5500_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref());

    match cli.command {
        Command::Decode {
            capture,
            format,
            output,
        } => decode(&capture, format, output.as_deref(), settings),
        Command::Registers { socket } => registers(socket),
        Command::Simulate { output } => simulate(output.as_deref()),
        Command::InitConfig => {
            let path = settings.save(cli.config.as_deref())?;
            tracing::info!("Settings written to {}", path.display());
            Ok(())
        }
    }
}

fn open_output(path: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn decode(
    capture: &Path,
    format: Option<OutputFormat>,
    output: Option<&Path>,
    mut settings: Settings,
) -> anyhow::Result<()> {
    if let Some(format) = format {
        settings.format = format;
    }

    let events = if capture == Path::new("-") {
        capture::read_events(io::stdin().lock())
    } else {
        let file = File::open(capture)
            .with_context(|| format!("Failed to open capture {}", capture.display()))?;
        capture::read_events(BufReader::new(file))
    }
    .with_context(|| format!("Failed to read capture {}", capture.display()))?;

    let mut decoder = Decoder::with_config(settings.decoder.clone());
    let mut annotations: Vec<Annotation> = Vec::new();
    let result = decoder.decode_all(&events, &mut annotations);

    // Whatever was decoded before a wiring fault is still written out
    let written = write_annotations(output, &annotations, &settings)?;
    let warnings = annotations.iter().filter(|a| a.is_warning()).count();
    tracing::info!(
        "{} events, {} frames, {} annotations written, {} warnings",
        events.len(),
        decoder.frames_decoded(),
        written,
        warnings
    );

    result.with_context(|| format!("Decoding {} stopped", capture.display()))
}

fn write_annotations(
    output: Option<&Path>,
    annotations: &[Annotation],
    settings: &Settings,
) -> anyhow::Result<usize> {
    let writer = open_output(output)?;
    output::write_annotations(writer, annotations, settings).context("Failed to write annotations")
}

fn registers(socket: Option<u8>) -> anyhow::Result<()> {
    let mut out = open_output(None)?;
    match socket {
        None => {
            writeln!(out, "Common registers")?;
            for (address, entry) in catalog::common_registers() {
                writeln!(out, "  0x{address:02X}  {:<20} {} bytes", entry.name, entry.width)?;
            }
        }
        Some(socket) => {
            writeln!(out, "Socket {socket} registers")?;
            for (offset, entry) in catalog::socket_registers() {
                writeln!(
                    out,
                    "  0x{offset:04X}  {:<20} {} bytes",
                    entry.socket_name(socket),
                    entry.width
                )?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Register writes, payload traffic and a few malformed frames
fn demo_capture() -> VirtualHost {
    let mut host = VirtualHost::new(VirtualChip::new());

    host.write_register(0x00, &[0x80]);
    host.write_register(0x01, &[1, 0, 168, 192]);
    host.write_register(0x05, &[0, 255, 255, 255]);
    host.read_register(0x01, 4);
    host.read_register(0x05, 4);

    host.activate(w5500_protocol::command::ACTIVATE_KEY);
    host.chip_mut().receive(b"hello\r\n");
    let width = host.read_rx_payload_width();
    host.read_rx_payload(width as usize);
    host.write_tx_payload(b"ping");
    host.write_ack_payload(2, b"ack");
    host.reuse_tx_payload();
    host.flush_tx();
    host.flush_rx();
    host.nop();

    host.activate(0x00);
    host.transaction(&[0x2F, 0x01]);
    host.transaction(&[0xE1, 0x00]);

    host
}

fn simulate(output: Option<&Path>) -> anyhow::Result<()> {
    let host = demo_capture();
    let mut out = open_output(output)?;
    capture::write_events(&mut out, host.events()).context("Failed to write capture")?;
    tracing::info!("{} events generated", host.events().len());
    Ok(())
}
