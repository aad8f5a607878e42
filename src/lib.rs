pub mod decoder;
pub mod disasm;
pub mod image;
pub mod instructions;
pub mod loader;
pub mod session;
pub mod shell;
pub mod text;
pub mod word;

pub mod isa {
    pub mod esp32; // ESP32 ULP FSM coprocessor
}

pub use image::{build_image, ImageError, ImageHeader};
pub use instructions::{assemble, EncodeError};
pub use loader::{Loader, LoaderError, RtcMemory};
pub use session::{Listing, ProgramSession, SessionConfig, SessionError, SessionStatus};
pub use shell::{Command, Reply, Shell};
pub use word::Word;
