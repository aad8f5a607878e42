use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use ulp_asm::decoder::{Decoded, Decoder};
use ulp_asm::disasm::fmt_word;
use ulp_asm::isa::esp32::Esp32Decoder;
use ulp_asm::Word;

use ulp_disasm::{load_image, load_raw_bin, read_word, Image};

#[derive(Parser, Debug)]
#[command(author, version, about = "ESP32 ULP image inspector", long_about = None)]
struct Cli {
    /// Treat the input as bare words instead of a ULP image
    #[arg(long)]
    raw: bool,
    /// Skip N bytes at start of file (raw mode)
    #[arg(long, default_value_t = 0usize)]
    skip: usize,
    /// Limit bytes loaded (raw mode, default: to EOF after --skip)
    #[arg(long)]
    len: Option<usize>,
    /// Input file
    #[arg(value_name = "BINFILE")]
    input: String,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the image header
    Header,
    /// Disassemble word indices [start, end)
    Range {
        /// First word index (hex or dec)
        start: String,
        /// End word index (hex or dec, exclusive)
        end: String,
        /// Show the four bytes of each word
        #[arg(long)]
        show_bytes: bool,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
    /// Disassemble every word
    Listing {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct WordOut {
    index: usize,
    bytes: Word,
    text: String,
    decoded: Option<Decoded>,
}

fn parse_index(s: &str) -> Result<usize> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(usize::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<usize>()?)
    }
}

fn emit(out: Option<String>, buf: String) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, buf)?,
        None => print!("{}", buf),
    }
    Ok(())
}

fn render_range(img: &Image, start: usize, end: usize, show_bytes: bool) -> String {
    let mut buf = String::new();
    for index in start..end {
        let Some(w) = read_word(img, index) else {
            let _ = writeln!(buf, "{index:4}: <oob>");
            break;
        };
        if show_bytes {
            let _ = writeln!(buf, "{index:4}: {w}   {}", fmt_word(w));
        } else {
            let _ = writeln!(buf, "{index:4}: {}", fmt_word(w));
        }
    }
    buf
}

fn listing_json(img: &Image) -> Result<String> {
    let dec = Esp32Decoder::new();
    let words: Vec<WordOut> = img
        .words
        .iter()
        .enumerate()
        .map(|(index, &w)| WordOut { index, bytes: w, text: fmt_word(w), decoded: dec.decode(w) })
        .collect();
    Ok(serde_json::to_string_pretty(&words)?)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = Path::new(&cli.input);
    let img = if cli.raw { load_raw_bin(path, cli.skip, cli.len)? } else { load_image(path)? };

    match cli.cmd {
        Command::Header => match &img.header {
            Some(h) => {
                println!("magic       : {:#010x}", h.magic);
                println!("text_offset : {}", h.text_offset);
                println!("text_size   : {} ({} words)", h.text_size, h.text_size / 4);
                println!("data_size   : {}", h.data_size);
                println!("bss_size    : {}", h.bss_size);
            }
            None => println!("raw input, {} words, no header", img.words.len()),
        },
        Command::Range { start, end, show_bytes, out } => {
            let start = parse_index(&start)?;
            let end = parse_index(&end)?;
            anyhow::ensure!(end >= start, "end must be >= start");
            emit(out, render_range(&img, start, end, show_bytes))?;
        }
        Command::Listing { format, out } => {
            let buf = match format {
                OutputFormat::Text => render_range(&img, 0, img.words.len(), true),
                OutputFormat::Json => listing_json(&img)? + "\n",
            };
            emit(out, buf)?;
        }
    }

    Ok(())
}
