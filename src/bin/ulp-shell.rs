use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ulp_asm::loader::DEFAULT_RESERVED_BYTES;
use ulp_asm::shell::MAX_LINE_LENGTH;
use ulp_asm::{ProgramSession, RtcMemory, SessionConfig, Shell};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Interactive ESP32 ULP assembler shell (runs against a host RTC memory model)"
)]
struct Opts {
    /// Session config as JSON ({ "capacity": .., "load_address": .. })
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Override the number of program slots
    #[arg(long)]
    capacity: Option<usize>,
    /// Override the load address (in words)
    #[arg(long)]
    load_address: Option<usize>,
    /// Bytes of RTC slow memory reserved for the coprocessor
    #[arg(long, default_value_t = DEFAULT_RESERVED_BYTES)]
    reserved: usize,
    /// Lines of this many bytes or more are ignored
    #[arg(long, default_value_t = MAX_LINE_LENGTH)]
    max_line_length: usize,
}

fn load_config(opts: &Opts) -> Result<SessionConfig> {
    let mut cfg = match &opts.config {
        Some(path) => {
            let txt = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&txt).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    if let Some(c) = opts.capacity {
        cfg.capacity = c;
    }
    if let Some(a) = opts.load_address {
        cfg.load_address = a;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let opts = Opts::parse();
    let cfg = load_config(&opts)?;
    let rtc = RtcMemory::new(opts.reserved).with_load_address(cfg.load_address);
    let mut shell = Shell::new(ProgramSession::new(cfg)?, rtc);

    println!("ULP shell ready, {} slots. Type `help` for commands.", cfg.capacity);
    shell
        .serve(io::stdin().lock(), io::stdout().lock(), opts.max_line_length)
        .context("shell i/o")?;
    Ok(())
}
