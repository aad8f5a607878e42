use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use ulp_asm::SessionConfig;
use ulp_disasm::assemble_source;

#[derive(Parser, Debug)]
#[command(author, version, about = "Assemble an ESP32 ULP source file into a loadable image")]
struct Opts {
    /// Input source (one instruction or var(...) per line; `#`/`;` comments)
    #[arg(short, long)]
    input: PathBuf,
    /// Output image (ULP header + text)
    #[arg(short, long)]
    output: PathBuf,
    /// Slot the program is started at; checked against the program length
    #[arg(long, default_value_t = 0usize)]
    start: usize,
    /// Maximum number of program words
    #[arg(long)]
    capacity: Option<usize>,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let src = fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;

    let mut cfg = SessionConfig::default();
    if let Some(c) = opts.capacity {
        cfg.capacity = c;
    }
    let req = assemble_source(&src, cfg, opts.start)?;
    fs::write(&opts.output, &req.image)
        .with_context(|| format!("writing {}", opts.output.display()))?;
    println!(
        "wrote {} bytes ({} words) to {}",
        req.image.len(),
        (req.image.len() - ulp_asm::image::HEADER_SIZE) / 4,
        opts.output.display()
    );
    Ok(())
}
