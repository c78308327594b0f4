use std::{fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use emu::{Machine, MachineConfig, TraceMode, config::DEFAULT_RAM_SIZE};

#[derive(Parser, Debug)]
#[command(
    name = "armlet",
    version,
    about = "Runs a raw little-endian ARM image until PC leaves RAM."
)]
struct Args {
    /// Raw image loaded at address 0.
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// RAM capacity in bytes (decimal or 0x-prefixed hex).
    #[arg(long, value_parser = parse_usize, default_value_t = DEFAULT_RAM_SIZE)]
    ram_size: usize,

    /// Initial program counter.
    #[arg(long, value_parser = parse_u32, default_value_t = 0)]
    start_pc: u32,

    /// Start with LR = 0 instead of LR = RAM size.
    #[arg(long, default_value_t = false)]
    no_link_sentinel: bool,

    /// Stop after this many instructions.
    #[arg(long, value_name = "N")]
    max_steps: Option<u64>,

    /// Log every executed instruction (trace level).
    #[arg(long, default_value_t = false)]
    trace: bool,

    /// Write logs to this file instead of stderr.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the final state as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Args {
    const fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            ram_size: self.ram_size,
            start_pc: self.start_pc,
            link_sentinel: !self.no_link_sentinel,
            trace: if self.trace {
                TraceMode::EveryStep
            } else {
                TraceMode::Off
            },
            max_steps: self.max_steps,
        }
    }
}

fn parse_u32(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid number {value:?}: {e}"))
}

fn parse_usize(value: &str) -> Result<usize, String> {
    parse_u32(value).map(|v| v as usize)
}

/// Installs the global subscriber. The returned guard flushes the log file
/// when dropped.
fn init_logging(args: &Args) -> std::io::Result<Option<WorkerGuard>> {
    let default_filter = if args.trace { "emu=trace,info" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match &args.log_file {
        Some(path) => {
            let file = fs::File::create(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let _guard = match init_logging(&args) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("cannot open log file: {e}");
            return ExitCode::from(2);
        }
    };

    let image = match fs::read(&args.image) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("cannot read {}: {e}", args.image.display());
            return ExitCode::from(2);
        }
    };
    tracing::info!("loaded {} ({} bytes)", args.image.display(), image.len());

    let mut machine = match Machine::with_image(args.machine_config(), &image) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let result = machine.run();

    if args.json {
        match serde_json::to_string_pretty(&machine.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("cannot serialize state: {e}"),
        }
    } else {
        println!("{:?}", machine.registers);
        println!("flags: {:?}", machine.cpsr);
    }

    match result {
        Ok(summary) => {
            tracing::info!("halted after {} steps ({:?})", summary.steps, summary.reason);
            ExitCode::SUCCESS
        }
        Err(fault) => {
            eprintln!("fault: {fault}");
            ExitCode::FAILURE
        }
    }
}
