use crate::word::Word;
use serde::{Deserialize, Serialize};

/// ALU operation numbers as they appear in the 4-bit ALU field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluOp {
    Add = 0,
    Sub = 1,
    And = 2,
    Or = 3,
    Move = 4,
    Lsh = 5,
    Rsh = 6,
}

impl AluOp {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => Self::Add,
            1 => Self::Sub,
            2 => Self::And,
            3 => Self::Or,
            4 => Self::Move,
            5 => Self::Lsh,
            6 => Self::Rsh,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::And => "and",
            Self::Or => "or",
            Self::Move => "move",
            Self::Lsh => "lsh",
            Self::Rsh => "rsh",
        }
    }
}

/// Stage-count operations share the ALU encoding with sub-opcode 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageOp {
    Inc = 0,
    Dec = 1,
    Rst = 2,
}

impl StageOp {
    pub fn from_bits(bits: u8) -> Option<Self> {
        Some(match bits {
            0 => Self::Inc,
            1 => Self::Dec,
            2 => Self::Rst,
            _ => return None,
        })
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Inc => "stage_inc",
            Self::Dec => "stage_dec",
            Self::Rst => "stage_rst",
        }
    }
}

/// Condition of an absolute `jump`; type 0 is unconditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpCond {
    Eq = 1,
    Ov = 2,
}

/// Conditions `jumpr` can encode (R0 compared with the threshold).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum R0Cond {
    Lt = 0,
    Ge = 1,
}

/// Conditions `jumps` can encode (stage count compared with the threshold).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageCond {
    Lt = 0,
    Ge = 1,
    Le = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpTarget {
    Reg(u8),
    /// Absolute address in 32-bit words.
    Words(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decoded {
    AluReg { alu: AluOp, rd: u8, rs1: u8, rs2: u8 },
    AluImm { alu: AluOp, rd: u8, rs: u8, imm: u16 },
    Stage { op: StageOp, imm: u8 },
    Store { rs: u8, rd: u8, offset_words: u16 },
    Load { rd: u8, rs: u8, offset_words: u16 },
    Jump { target: JumpTarget, cond: Option<JumpCond> },
    JumpR { step_words: u8, backward: bool, threshold: u16, cond: R0Cond },
    JumpS { step_words: u8, backward: bool, threshold: u8, cond: StageCond },
    Adc { rd: u8, sar: u8, pad: u8 },
    I2c { write: bool, sub_addr: u8, data: u8, high: u8, low: u8, slave: u8 },
    RegRd { addr: u16, high: u8, low: u8 },
    RegWr { addr: u16, high: u8, low: u8, data: u8 },
    Halt,
    Wake,
    Sleep(u8),
    Wait(u16),
    Tsens { rd: u8, cycles: u16 },
    /// 16-bit value appended with `var(...)`.
    Data(u16),
}

pub trait Decoder {
    fn decode(&self, word: Word) -> Option<Decoded>;
}
