use serde::{Deserialize, Serialize};

use crate::word::Word;

/// "ulp\0" read as a little-endian u32.
pub const ULP_MAGIC: u32 = 0x0070_6c75;
pub const HEADER_SIZE: usize = 12;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("image is {len} bytes, shorter than the 12-byte header")]
    TooShort { len: usize },
    #[error("bad magic {found:#010x}, expected 0x00706c75")]
    BadMagic { found: u32 },
    #[error("header describes {expected} bytes but image has {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("{words} words do not fit the 16-bit text size field")]
    TextTooLarge { words: usize },
    #[error("text size {0} is not a multiple of 4")]
    Unaligned(u16),
}

/// Program header understood by `ulp_load_binary`. All fields little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHeader {
    pub magic: u32,
    pub text_offset: u16,
    pub text_size: u16,
    pub data_size: u16,
    pub bss_size: u16,
}

impl ImageHeader {
    pub fn for_text(word_count: usize) -> Result<Self, ImageError> {
        let text_size = word_count
            .checked_mul(4)
            .and_then(|n| u16::try_from(n).ok())
            .ok_or(ImageError::TextTooLarge { words: word_count })?;
        Ok(Self {
            magic: ULP_MAGIC,
            text_offset: HEADER_SIZE as u16,
            text_size,
            data_size: 0,
            bss_size: 0,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..6].copy_from_slice(&self.text_offset.to_le_bytes());
        out[6..8].copy_from_slice(&self.text_size.to_le_bytes());
        out[8..10].copy_from_slice(&self.data_size.to_le_bytes());
        out[10..12].copy_from_slice(&self.bss_size.to_le_bytes());
        out
    }

    /// Reads the header fields without judging them.
    pub fn parse(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() < HEADER_SIZE {
            return Err(ImageError::TooShort { len: bytes.len() });
        }
        let u16_at = |off: usize| u16::from_le_bytes([bytes[off], bytes[off + 1]]);
        Ok(Self {
            magic: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            text_offset: u16_at(4),
            text_size: u16_at(6),
            data_size: u16_at(8),
            bss_size: u16_at(10),
        })
    }

    /// Bytes the image must have on disk: header (via the offset) plus text and data.
    pub fn image_len(&self) -> usize {
        self.text_offset as usize + self.text_size as usize + self.data_size as usize
    }
}

pub fn build_image(words: &[Word]) -> Result<Vec<u8>, ImageError> {
    let header = ImageHeader::for_text(words.len())?;
    let mut out = Vec::with_capacity(HEADER_SIZE + words.len() * 4);
    out.extend_from_slice(&header.to_bytes());
    for w in words {
        out.extend_from_slice(&w.bytes());
    }
    Ok(out)
}

/// Validates an image and returns its header and text words.
pub fn text_words(image: &[u8]) -> Result<(ImageHeader, Vec<Word>), ImageError> {
    let header = ImageHeader::parse(image)?;
    if header.magic != ULP_MAGIC {
        return Err(ImageError::BadMagic { found: header.magic });
    }
    if header.image_len() != image.len() {
        return Err(ImageError::SizeMismatch { expected: header.image_len(), actual: image.len() });
    }
    if header.text_size % 4 != 0 {
        return Err(ImageError::Unaligned(header.text_size));
    }
    let start = header.text_offset as usize;
    let text = &image[start..start + header.text_size as usize];
    let words = text
        .chunks_exact(4)
        .map(|c| Word::from_bytes(c[0], c[1], c[2], c[3]))
        .collect();
    Ok((header, words))
}
