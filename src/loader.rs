use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::image::{ImageHeader, HEADER_SIZE, ULP_MAGIC};
use crate::word::Word;

/// Device side of a run: puts an image into RTC slow memory, starts the
/// coprocessor and reads words back for listings.
pub trait Loader {
    fn load_image(&mut self, image: &[u8]) -> Result<()>;
    fn start_execution(&mut self, start_index: usize) -> Result<()>;
    fn read_device_memory(&mut self, word_count: usize) -> Result<Vec<Word>>;
}

/// Error codes returned by `ulp_load_binary` / `ulp_run`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    #[error("ESP_ERR_INVALID_SIZE: {0}")]
    InvalidSize(String),
    #[error("ESP_ERR_INVALID_ARG: {0}")]
    InvalidArg(String),
    #[error("ESP_ERR_NOT_SUPPORTED: magic {0:#010x} is not a ULP binary")]
    NotSupported(u32),
}

/// Slow memory reserved for the coprocessor when nothing else is configured.
pub const DEFAULT_RESERVED_BYTES: usize = 8 * 1024;

/// Host model of the reserved RTC slow memory region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtcMemory {
    pub mem: Vec<u8>,
    /// Where images are placed, in words from the start of the region.
    pub load_address: usize,
    /// Text words of the last successful load.
    pub loaded_words: Option<usize>,
    /// Word address the coprocessor was last started at.
    pub entry: Option<usize>,
}

impl Default for RtcMemory {
    fn default() -> Self {
        Self::new(DEFAULT_RESERVED_BYTES)
    }
}

impl RtcMemory {
    pub fn new(size: usize) -> Self {
        Self {
            mem: vec![0; size],
            load_address: 0,
            loaded_words: None,
            entry: None,
        }
    }

    pub fn with_load_address(mut self, words: usize) -> Self {
        self.load_address = words;
        self
    }

    /// Byte offset of the load address, or `InvalidArg` when it does not
    /// even fit the address space.
    fn load_offset(&self) -> Result<usize, LoaderError> {
        self.load_address.checked_mul(4).ok_or_else(|| {
            LoaderError::InvalidArg(format!("load address {:#x} is out of range", self.load_address))
        })
    }

    fn load_checked(&mut self, image: &[u8]) -> Result<(), LoaderError> {
        let reserved = self.mem.len();
        if image.len() < HEADER_SIZE {
            return Err(LoaderError::InvalidSize(format!(
                "image of {} bytes has no room for a header",
                image.len()
            )));
        }
        let base = self.load_offset()?;
        if base > reserved {
            return Err(LoaderError::InvalidArg(format!(
                "load address {:#x} beyond {} reserved bytes",
                base, reserved
            )));
        }
        if base.checked_add(image.len()).map_or(true, |end| end > reserved) {
            return Err(LoaderError::InvalidSize(format!(
                "{} bytes at {:#x} overflow {} reserved bytes",
                image.len(),
                base,
                reserved
            )));
        }
        let header = ImageHeader::parse(image)
            .map_err(|e| LoaderError::InvalidSize(e.to_string()))?;
        if header.magic != ULP_MAGIC {
            return Err(LoaderError::NotSupported(header.magic));
        }
        if header.image_len() != image.len() {
            return Err(LoaderError::InvalidSize(format!(
                "header describes {} bytes, got {}",
                header.image_len(),
                image.len()
            )));
        }

        let payload = header.text_size as usize + header.data_size as usize;
        let bss_end = (base + payload)
            .checked_add(header.bss_size as usize)
            .filter(|&end| end <= reserved)
            .ok_or_else(|| {
                LoaderError::InvalidSize(format!("{} bss bytes overflow the region", header.bss_size))
            })?;
        let src = header.text_offset as usize;
        self.mem[base..base + payload].copy_from_slice(&image[src..src + payload]);
        self.mem[base + payload..bss_end].fill(0);
        self.loaded_words = Some(header.text_size as usize / 4);
        self.entry = None;
        debug!(base, payload, bss = header.bss_size, "image copied to rtc memory");
        Ok(())
    }
}

impl Loader for RtcMemory {
    fn load_image(&mut self, image: &[u8]) -> Result<()> {
        Ok(self.load_checked(image)?)
    }

    fn start_execution(&mut self, start_index: usize) -> Result<()> {
        let loaded = self.loaded_words.unwrap_or(0);
        if start_index >= loaded {
            return Err(LoaderError::InvalidArg(format!(
                "entry {} outside the {} loaded words",
                start_index, loaded
            ))
            .into());
        }
        let entry = self.load_address.checked_add(start_index).ok_or_else(|| {
            LoaderError::InvalidArg(format!("entry {} past the address space", start_index))
        })?;
        self.entry = Some(entry);
        debug!(entry, "coprocessor started");
        Ok(())
    }

    fn read_device_memory(&mut self, word_count: usize) -> Result<Vec<Word>> {
        let base = self.load_offset()?;
        let end = word_count
            .checked_mul(4)
            .and_then(|n| n.checked_add(base))
            .filter(|&end| end <= self.mem.len())
            .ok_or_else(|| {
                LoaderError::InvalidSize(format!("{} words at {:#x} leave the region", word_count, base))
            })?;
        Ok(self.mem[base..end]
            .chunks_exact(4)
            .map(|c| Word::from_bytes(c[0], c[1], c[2], c[3]))
            .collect())
    }
}
