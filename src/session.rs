use std::fmt;

use anyhow::Error;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::disasm::fmt_word;
use crate::image::{build_image, ImageError};
use crate::instructions::{self, EncodeError};
use crate::isa::esp32;
use crate::loader::Loader;
use crate::word::Word;

/// Largest value `var(...)` accepts.
pub const MAX_VARIABLE: u64 = 0xffff;
/// Words appended after the last program slot by [`ProgramSession::finalize_for_run`].
pub const EPILOGUE_WORDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Program slots available to user input.
    pub capacity: usize,
    /// Word offset of the program inside RTC slow memory.
    pub load_address: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            load_address: 0,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.capacity == 0 {
            return Err(SessionError::InvalidConfig("capacity must be at least 1".into()));
        }
        let text_bytes = (self.capacity + EPILOGUE_WORDS).saturating_mul(4);
        if text_bytes > u16::MAX as usize {
            return Err(SessionError::InvalidConfig(format!(
                "capacity {} overflows the image text size field",
                self.capacity
            )));
        }
        if self.load_address.checked_mul(4).is_none() {
            return Err(SessionError::InvalidConfig(format!(
                "load address {:#x} is out of range",
                self.load_address
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// The device holds what the session holds.
    Resident,
    /// Appends happened since the last run or reset.
    Draft,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("program is full ({capacity} instructions)")]
    CapacityExceeded { capacity: usize },
    #[error("no instructions to run")]
    EmptyProgram,
    #[error("invalid start index, maximum is {max}")]
    InvalidRunIndex { max: usize },
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("{stage} failed: {source}")]
    Loader {
        stage: &'static str,
        #[source]
        source: Error,
    },
    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}

/// Finalized program ready for the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub image: Vec<u8>,
    pub start_index: usize,
}

/// `reg_wr 0x6, 24, 24, 0` clears the ULP sleep-timer enable bit in
/// RTC_CNTL_STATE0_REG so the program does not rearm itself, then `halt`.
pub fn epilogue() -> [Word; EPILOGUE_WORDS] {
    [esp32::reg_wr(0x6, 24, 24, 0), Word::HALT]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    Empty,
    Stale,
    Resident(Vec<Word>),
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listing::Empty => write!(f, "Program is empty"),
            Listing::Stale => write!(f, "Program must be run before listing"),
            Listing::Resident(words) => {
                for (i, w) in words.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{:2}: {}    {}", i, w, fmt_word(*w))?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgramSession {
    cfg: SessionConfig,
    slots: Vec<Word>,
    next_free: usize,
    status: SessionStatus,
}

impl ProgramSession {
    pub fn new(cfg: SessionConfig) -> Result<Self, SessionError> {
        cfg.validate()?;
        Ok(Self {
            slots: vec![Word::NOP; cfg.capacity],
            cfg,
            next_free: 0,
            status: SessionStatus::Resident,
        })
    }

    pub fn capacity(&self) -> usize {
        self.cfg.capacity
    }

    pub fn next_free(&self) -> usize {
        self.next_free
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_dirty(&self) -> bool {
        self.status == SessionStatus::Draft
    }

    /// Every slot, including the unused NOP tail.
    pub fn slots(&self) -> &[Word] {
        &self.slots
    }

    /// The appended program.
    pub fn words(&self) -> &[Word] {
        &self.slots[..self.next_free]
    }

    pub fn reset(&mut self) {
        self.slots.fill(Word::NOP);
        self.next_free = 0;
        self.status = SessionStatus::Resident;
        debug!("session reset");
    }

    /// Encodes `line` and stores it in the next free slot. Returns the slot index.
    pub fn append_instruction(&mut self, line: &str) -> Result<usize, SessionError> {
        let word = instructions::assemble(line)?;
        self.push(word)
    }

    pub fn append_variable(&mut self, value: u64) -> Result<usize, SessionError> {
        if value > MAX_VARIABLE {
            return Err(EncodeError::InvalidOperand {
                operand: value.to_string(),
                reason: "variable must be in 0..=65535",
            }
            .into());
        }
        self.push(esp32::data(value as u16))
    }

    fn push(&mut self, word: Word) -> Result<usize, SessionError> {
        if self.next_free == self.cfg.capacity {
            warn!(capacity = self.cfg.capacity, "program full, word dropped");
            return Err(SessionError::CapacityExceeded { capacity: self.cfg.capacity });
        }
        let index = self.next_free;
        self.slots[index] = word;
        self.next_free += 1;
        self.status = SessionStatus::Draft;
        debug!(index, %word, "word appended");
        Ok(index)
    }

    /// Builds the image (program plus epilogue) and marks the session resident.
    pub fn finalize_for_run(&mut self, start_index: usize) -> Result<RunRequest, SessionError> {
        if self.next_free == 0 {
            return Err(SessionError::EmptyProgram);
        }
        if start_index >= self.next_free {
            return Err(SessionError::InvalidRunIndex { max: self.next_free - 1 });
        }
        let mut text = Vec::with_capacity(self.next_free + EPILOGUE_WORDS);
        text.extend_from_slice(self.words());
        text.extend_from_slice(&epilogue());
        let image = build_image(&text)?;
        self.status = SessionStatus::Resident;
        Ok(RunRequest { image, start_index })
    }

    /// Finalizes, loads and starts the program. A loader failure leaves the
    /// session in `Draft` so `list` keeps refusing a stale device image.
    pub fn run<L: Loader>(&mut self, start_index: usize, loader: &mut L) -> Result<(), SessionError> {
        let req = self.finalize_for_run(start_index)?;
        info!(words = self.next_free, start_index, bytes = req.image.len(), "running program");
        let outcome = loader
            .load_image(&req.image)
            .map_err(|source| SessionError::Loader { stage: "load", source })
            .and_then(|()| {
                loader
                    .start_execution(req.start_index)
                    .map_err(|source| SessionError::Loader { stage: "start", source })
            });
        if let Err(e) = &outcome {
            warn!(error = %e, "run failed");
            self.status = SessionStatus::Draft;
        }
        outcome
    }

    pub fn list_snapshot<L: Loader>(&self, loader: &mut L) -> Result<Listing, SessionError> {
        if self.next_free == 0 {
            return Ok(Listing::Empty);
        }
        if self.is_dirty() {
            return Ok(Listing::Stale);
        }
        let words = loader
            .read_device_memory(self.next_free)
            .map_err(|source| SessionError::Loader { stage: "read", source })?;
        Ok(Listing::Resident(words))
    }
}
