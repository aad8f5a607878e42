use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use ulp_asm::image::{text_words, ImageHeader};
use ulp_asm::Word;

#[derive(Debug, Clone, Serialize)]
pub struct Image {
    /// `None` for raw word dumps.
    pub header: Option<ImageHeader>,
    pub words: Vec<Word>,
}

fn words_of(bytes: &[u8]) -> Result<Vec<Word>> {
    anyhow::ensure!(bytes.len() % 4 == 0, "{} bytes is not a whole number of words", bytes.len());
    Ok(bytes
        .chunks_exact(4)
        .map(|c| Word::from_bytes(c[0], c[1], c[2], c[3]))
        .collect())
}

/// Reads a ULP image (header + text) as produced by the assembler.
pub fn load_image(path: &Path) -> Result<Image> {
    let file = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (header, words) = text_words(&file).with_context(|| format!("{} is not a ULP image", path.display()))?;
    Ok(Image { header: Some(header), words })
}

/// Reads bare words, e.g. a dump of RTC slow memory.
pub fn load_raw_bin(path: &Path, skip: usize, len: Option<usize>) -> Result<Image> {
    let file = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    anyhow::ensure!(skip <= file.len(), "--skip exceeds file size");
    let mut payload = &file[skip..];
    if let Some(lim) = len {
        anyhow::ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }
    Ok(Image { header: None, words: words_of(payload)? })
}

pub fn read_word(img: &Image, index: usize) -> Option<Word> {
    img.words.get(index).copied()
}
