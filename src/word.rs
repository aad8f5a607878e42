use serde::{Deserialize, Serialize};
use std::fmt;

/// One 32-bit ULP instruction or data word, stored as it sits in RTC memory
/// (byte0 is the least significant byte). The primary opcode lives in the
/// high nibble of byte3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Word(pub [u8; 4]);

impl Word {
    /// `wait 0`, the value every empty program slot holds.
    pub const NOP: Word = Word([0x00, 0x00, 0x00, 0x40]);
    pub const HALT: Word = Word([0x00, 0x00, 0x00, 0xB0]);

    pub const fn from_bytes(byte0: u8, byte1: u8, byte2: u8, byte3: u8) -> Self {
        Self([byte0, byte1, byte2, byte3])
    }

    pub const fn bytes(&self) -> [u8; 4] {
        self.0
    }

    pub const fn to_u32(&self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub const fn opcode(&self) -> u8 {
        self.0[3] >> 4
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [b0, b1, b2, b3] = self.0;
        write!(f, "{b0:02x} {b1:02x} {b2:02x} {b3:02x}")
    }
}

impl From<[u8; 4]> for Word {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_view() {
        let w = Word::from_bytes(0x01, 0x00, 0x00, 0x90);
        assert_eq!(w.to_u32(), 0x9000_0001);
        assert_eq!(w.opcode(), 9);
        assert_eq!(w.to_string(), "01 00 00 90");
    }
}
