//! ESP32 ULP FSM instruction set.
//!
//! Layout of every word, byte3 first:
//!
//! ```text
//! byte3      byte2      byte1      byte0
//! 1098 7654  3210 9876  5432 1098  7654 3210
//! oooo ....  .... ....  .... ....  .... ....   o = primary opcode
//! ```
//!
//! Immediates are masked to their field widths; nothing else is range
//! checked, so oversized values lose their high bits exactly as the
//! hardware field would.

use crate::decoder::{
    AluOp, Decoded, Decoder, JumpCond, JumpTarget, R0Cond, StageCond, StageOp,
};
use crate::instructions::{EncodeError, Op};
use crate::text;
use crate::word::Word;

pub const UNSUPPORTED_JUMPR: &str = "The conditions \"eq\", \"le\" and \"gt\" are not supported by the ULP. \
     Please use \"lt\" or \"ge\" instead.";
pub const UNSUPPORTED_JUMPS: &str = "The conditions \"eq\" and \"gt\" are not supported by the ULP. \
     Please use \"lt\", \"le\" or \"ge\" instead.";

const OP_REG_WR: i64 = 1;
const OP_REG_RD: i64 = 2;
const OP_I2C: i64 = 3;
const OP_ADC: i64 = 5;
const OP_ST: i64 = 6;
const OP_ALU: i64 = 7;
const OP_JUMP: i64 = 8;
const OP_LD: i64 = 13;

const SUB_ALU_REG: i64 = 0;
const SUB_ALU_IMM: i64 = 1;
const SUB_ALU_STAGE: i64 = 2;
const SUB_ST: i64 = 4;
const SUB_JUMP: i64 = 0;
const SUB_JUMPR: i64 = 1;
const SUB_JUMPS: i64 = 2;

#[inline]
fn word(b0: i64, b1: i64, b2: i64, b3: i64) -> Word {
    // keep the low 8 bits of every byte expression
    Word::from_bytes(b0 as u8, b1 as u8, b2 as u8, b3 as u8)
}

/// Cursor over the operand tokens of a matched line.
struct Operands<'a> {
    toks: &'a [&'a str],
    pos: usize,
}

impl<'a> Operands<'a> {
    fn new(toks: &'a [&'a str]) -> Self {
        Self { toks, pos: 0 }
    }

    fn next(&mut self) -> Result<&'a str, EncodeError> {
        let tok = self
            .toks
            .get(self.pos)
            .copied()
            .ok_or(EncodeError::MissingOperand { index: self.pos })?;
        self.pos += 1;
        Ok(tok)
    }

    fn reg(&mut self) -> Result<u8, EncodeError> {
        let tok = self.next()?;
        text::parse_register(tok).ok_or_else(|| EncodeError::InvalidOperand {
            operand: tok.to_string(),
            reason: "expected a register r0..r3",
        })
    }

    fn num(&mut self) -> Result<i64, EncodeError> {
        let tok = self.next()?;
        text::parse_number(tok).ok_or_else(|| EncodeError::InvalidOperand {
            operand: tok.to_string(),
            reason: "number does not fit in 64 bits",
        })
    }

    fn keyword(&mut self) -> Result<&'a str, EncodeError> {
        self.next()
    }
}

fn bad_condition(tok: &str) -> EncodeError {
    EncodeError::InvalidOperand {
        operand: tok.to_string(),
        reason: "unknown condition",
    }
}

/// Runs the encoder selected by `op` on the operand tokens (mnemonic excluded).
pub fn encode(op: Op, operands: &[&str]) -> Result<Word, EncodeError> {
    let mut args = Operands::new(operands);
    let a = &mut args;
    Ok(match op {
        Op::AluImm(AluOp::Move) => {
            let rd = a.reg()?;
            alu_imm(AluOp::Move, rd, 0, a.num()?)
        }
        Op::AluImm(alu) => {
            let (rd, rs) = (a.reg()?, a.reg()?);
            alu_imm(alu, rd, rs, a.num()?)
        }
        Op::AluReg(AluOp::Move) => {
            // src2 mirrors src1 for register moves
            let (rd, rs) = (a.reg()?, a.reg()?);
            alu_reg(AluOp::Move, rd, rs, rs)
        }
        Op::AluReg(alu) => {
            let (rd, rs1, rs2) = (a.reg()?, a.reg()?, a.reg()?);
            alu_reg(alu, rd, rs1, rs2)
        }
        Op::Stage(StageOp::Rst) => stage(StageOp::Rst, 0),
        Op::Stage(s) => stage(s, a.num()?),
        Op::Store => {
            let (rs, rd) = (a.reg()?, a.reg()?);
            store(rs, rd, a.num()?)
        }
        Op::Load => {
            let (rd, rs) = (a.reg()?, a.reg()?);
            load(rd, rs, a.num()?)
        }
        Op::JumpReg => jump_reg(a.reg()?, None),
        Op::JumpRegCond => {
            let rd = a.reg()?;
            jump_reg(rd, Some(jump_cond(a.keyword()?)?))
        }
        Op::JumpImm => jump_imm(a.num()?, None),
        Op::JumpImmCond => {
            let address = a.num()?;
            jump_imm(address, Some(jump_cond(a.keyword()?)?))
        }
        Op::JumpR => {
            let (step, threshold) = (a.num()?, a.num()?);
            let cond = match a.keyword()? {
                "lt" => R0Cond::Lt,
                "ge" => R0Cond::Ge,
                other => return Err(bad_condition(other)),
            };
            jumpr(step, threshold, cond)
        }
        Op::JumpRUnsupported => return Err(EncodeError::UnsupportedVariant(UNSUPPORTED_JUMPR)),
        Op::JumpS => {
            let (step, threshold) = (a.num()?, a.num()?);
            let cond = match a.keyword()? {
                "lt" => StageCond::Lt,
                "ge" => StageCond::Ge,
                "le" => StageCond::Le,
                other => return Err(bad_condition(other)),
            };
            jumps(step, threshold, cond)
        }
        Op::JumpSUnsupported => return Err(EncodeError::UnsupportedVariant(UNSUPPORTED_JUMPS)),
        Op::Halt => Word::HALT,
        Op::Wake => wake(),
        Op::Sleep => sleep(a.num()?),
        Op::Wait => wait(a.num()?),
        Op::Nop => wait(0),
        Op::Tsens => {
            let rd = a.reg()?;
            tsens(rd, a.num()?)
        }
        Op::Adc => {
            let rd = a.reg()?;
            let (sar, pad) = (a.num()?, a.num()?);
            adc(rd, sar, pad)
        }
        Op::I2cRd => {
            let (sub_addr, high, low, slave) = (a.num()?, a.num()?, a.num()?, a.num()?);
            i2c(false, sub_addr, 0, high, low, slave)
        }
        Op::I2cWr => {
            let (sub_addr, data) = (a.num()?, a.num()?);
            let (high, low, slave) = (a.num()?, a.num()?, a.num()?);
            i2c(true, sub_addr, data, high, low, slave)
        }
        Op::RegRd => {
            let (addr, high, low) = (a.num()?, a.num()?, a.num()?);
            reg_rd(addr, high, low)
        }
        Op::RegWr => {
            let (addr, high, low, data) = (a.num()?, a.num()?, a.num()?, a.num()?);
            reg_wr(addr, high, low, data)
        }
    })
}

fn jump_cond(tok: &str) -> Result<JumpCond, EncodeError> {
    match tok {
        "eq" => Ok(JumpCond::Eq),
        "ov" => Ok(JumpCond::Ov),
        other => Err(bad_condition(other)),
    }
}

// oooo 001a  aaa0 iiii  iiii iiii  iiii ssdd
pub fn alu_imm(alu: AluOp, rd: u8, rs: u8, imm: i64) -> Word {
    let (d, s, alu) = (rd as i64, rs as i64, alu as i64);
    word(
        (d & 0x3) | ((s & 0x3) << 2) | ((imm & 0xf) << 4),
        (imm & 0xff0) >> 4,
        ((alu & 0x7) << 5) | ((imm & 0xf000) >> 12),
        (OP_ALU << 4) | (SUB_ALU_IMM << 1) | ((alu & 0x8) >> 3),
    )
}

// oooo 000a  aaa0 0000  0000 0000  00SS ssdd
pub fn alu_reg(alu: AluOp, rd: u8, rs1: u8, rs2: u8) -> Word {
    let (d, s1, s2, alu) = (rd as i64, rs1 as i64, rs2 as i64, alu as i64);
    word(
        (d & 0x3) | ((s1 & 0x3) << 2) | ((s2 & 0x3) << 4),
        0,
        (alu & 0x7) << 5,
        (OP_ALU << 4) | (SUB_ALU_REG << 1) | ((alu & 0x8) >> 3),
    )
}

// oooo 010a  aaa0 0000  0000 iiii  iiii 0000
pub fn stage(op: StageOp, imm: i64) -> Word {
    let op = op as i64;
    word(
        (imm & 0x0f) << 4,
        (imm & 0xf0) >> 4,
        (op & 0x7) << 5,
        (OP_ALU << 4) | (SUB_ALU_STAGE << 1) | ((op & 0x8) >> 3),
    )
}

// oooo 1000  000k kkkk  kkkk kk00  0000 ddss
pub fn store(rs: u8, rd: u8, offset_bytes: i64) -> Word {
    let words = offset_bytes / 4;
    word(
        (rs as i64 & 0x3) | ((rd as i64 & 0x3) << 2),
        (words & 0x3f) << 2,
        // five high bits here, four for `ld`: matches the IDF assembler output
        (words & 0x7c0) >> 6,
        (OP_ST << 4) | (SUB_ST << 1),
    )
}

// oooo 0000  0000 kkkk  kkkk kk00  0000 ssdd
pub fn load(rd: u8, rs: u8, offset_bytes: i64) -> Word {
    let words = offset_bytes / 4;
    word(
        (rd as i64 & 0x3) | ((rs as i64 & 0x3) << 2),
        (words & 0x3f) << 2,
        (words & 0x3c0) >> 6,
        OP_LD << 4,
    )
}

// oooo 000t  ttg0 0000  000k kkkk  kkkk kkdd
fn jump_word(rd: u8, words: i64, in_register: bool, cond: Option<JumpCond>) -> Word {
    let ty = cond.map_or(0, |c| c as i64);
    word(
        (rd as i64 & 0x3) | ((words & 0x3f) << 2),
        (words & 0x7c0) >> 6,
        ((ty & 0x3) << 6) | ((in_register as i64) << 5),
        (OP_JUMP << 4) | (SUB_JUMP << 1) | ((ty & 0x4) >> 2),
    )
}

pub fn jump_reg(rd: u8, cond: Option<JumpCond>) -> Word {
    jump_word(rd, 0, true, cond)
}

pub fn jump_imm(address_bytes: i64, cond: Option<JumpCond>) -> Word {
    jump_word(0, address_bytes / 4, false, cond)
}

/// Splits a byte step into (words, backward). The direction comes from bit
/// 7 of the operand and the magnitude from its low 7 bits.
fn relative_step(step_bytes: i64) -> (i64, bool) {
    let backward = step_bytes & 0x80 != 0;
    let magnitude = (if backward { step_bytes.wrapping_neg() } else { step_bytes }) & 0x7f;
    (magnitude / 4, backward)
}

// oooo 001k  ssss sssc  tttt tttt  tttt tttt
pub fn jumpr(step_bytes: i64, threshold: i64, cond: R0Cond) -> Word {
    let (words, backward) = relative_step(step_bytes);
    word(
        threshold & 0xff,
        (threshold & 0xff00) >> 8,
        (words << 1) | cond as i64,
        (OP_JUMP << 4) | (SUB_JUMPR << 1) | backward as i64,
    )
}

// oooo 010k  ssss sssc  c000 0000  tttt tttt
pub fn jumps(step_bytes: i64, threshold: i64, cond: StageCond) -> Word {
    let (words, backward) = relative_step(step_bytes);
    let cond = cond as i64;
    word(
        threshold & 0xff,
        (cond & 0x1) << 7,
        (words << 1) | ((cond & 0x2) >> 1),
        (OP_JUMP << 4) | (SUB_JUMPS << 1) | backward as i64,
    )
}

// oooo 0000  0000 0000  0000 0000  0smm mmdd
pub fn adc(rd: u8, sar: i64, pad: i64) -> Word {
    word(
        (rd as i64 & 0x3) | (pad << 2) | ((sar & 0x1) << 6),
        0,
        0,
        OP_ADC << 4,
    )
}

// oooo r0ss  sshh hlll  dddd dddd  aaaa aaaa
pub fn i2c(write: bool, sub_addr: i64, data: i64, high: i64, low: i64, slave: i64) -> Word {
    let rw = write as i64;
    word(
        sub_addr & 0xff,
        data & 0xff,
        low | (high << 3) | ((slave & 0x3) << 6),
        (OP_I2C << 4) | (rw << 3) | ((slave & 0xc) >> 2),
    )
}

// oooo hhhh  hlll ll00  0000 00aa  aaaa aaaa
pub fn reg_rd(addr: i64, high: i64, low: i64) -> Word {
    word(
        addr & 0xff,
        (addr & 0x300) >> 8,
        (low << 2) | ((high & 0x1) << 7),
        (OP_REG_RD << 4) | ((high & 0x1e) >> 1),
    )
}

// oooo hhhh  hlll lldd  dddd ddaa  aaaa aaaa
pub fn reg_wr(addr: i64, high: i64, low: i64, data: i64) -> Word {
    word(
        addr & 0xff,
        ((addr & 0x300) >> 8) | ((data & 0x3f) << 2),
        (low << 2) | ((high & 0x1) << 7) | ((data & 0xc0) >> 6),
        (OP_REG_WR << 4) | ((high & 0x1e) >> 1),
    )
}

pub fn wake() -> Word {
    Word::from_bytes(0x01, 0x00, 0x00, 0x90)
}

/// Selects one of the five sleep-cycle registers.
pub fn sleep(reg: i64) -> Word {
    word(reg, 0, 0, 0x92)
}

pub fn wait(cycles: i64) -> Word {
    word(cycles & 0xff, (cycles & 0xff00) >> 8, 0, 0x40)
}

pub fn tsens(rd: u8, cycles: i64) -> Word {
    word(
        rd as i64 | ((cycles & 0x3f) << 2),
        (cycles & 0x3fc0) >> 6,
        0,
        0xa0,
    )
}

/// Plain 16-bit data word as appended by `var(...)`.
pub fn data(value: u16) -> Word {
    let [lo, hi] = value.to_le_bytes();
    Word::from_bytes(lo, hi, 0, 0)
}

/// Decoder for every word the encoders above can produce.
pub struct Esp32Decoder;

impl Esp32Decoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Esp32Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for Esp32Decoder {
    fn decode(&self, word: Word) -> Option<Decoded> {
        let [b0, b1, b2, b3] = word.bytes();
        let sub = (b3 >> 1) & 0x7;
        let alu_bits = ((b2 >> 5) & 0x7) | ((b3 & 0x1) << 3);
        let backward = b3 & 0x1 == 1;

        let d = match b3 >> 4 {
            0x0 if b2 == 0 && b3 == 0 => Decoded::Data(u16::from_le_bytes([b0, b1])),
            0x1 => Decoded::RegWr {
                addr: b0 as u16 | ((b1 as u16 & 0x3) << 8),
                high: (b2 >> 7) | ((b3 & 0xf) << 1),
                low: (b2 >> 2) & 0x1f,
                data: (b1 >> 2) | ((b2 & 0x3) << 6),
            },
            0x2 => Decoded::RegRd {
                addr: b0 as u16 | ((b1 as u16 & 0x3) << 8),
                high: (b2 >> 7) | ((b3 & 0xf) << 1),
                low: (b2 >> 2) & 0x1f,
            },
            0x3 => Decoded::I2c {
                write: b3 & 0x08 != 0,
                sub_addr: b0,
                data: b1,
                high: (b2 >> 3) & 0x7,
                low: b2 & 0x7,
                slave: (b2 >> 6) | ((b3 & 0x3) << 2),
            },
            0x4 => Decoded::Wait(u16::from_le_bytes([b0, b1])),
            0x5 => Decoded::Adc {
                rd: b0 & 0x3,
                sar: (b0 >> 6) & 0x1,
                pad: (b0 >> 2) & 0xf,
            },
            0x6 if sub as i64 == SUB_ST => Decoded::Store {
                rs: b0 & 0x3,
                rd: (b0 >> 2) & 0x3,
                offset_words: (b1 >> 2) as u16 | ((b2 as u16 & 0x1f) << 6),
            },
            0x7 => match sub as i64 {
                SUB_ALU_REG => Decoded::AluReg {
                    alu: AluOp::from_bits(alu_bits)?,
                    rd: b0 & 0x3,
                    rs1: (b0 >> 2) & 0x3,
                    rs2: (b0 >> 4) & 0x3,
                },
                SUB_ALU_IMM => Decoded::AluImm {
                    alu: AluOp::from_bits(alu_bits)?,
                    rd: b0 & 0x3,
                    rs: (b0 >> 2) & 0x3,
                    imm: (b0 >> 4) as u16 | ((b1 as u16) << 4) | ((b2 as u16 & 0xf) << 12),
                },
                SUB_ALU_STAGE => Decoded::Stage {
                    op: StageOp::from_bits(alu_bits)?,
                    imm: (b0 >> 4) | ((b1 & 0xf) << 4),
                },
                _ => return None,
            },
            0x8 => match sub as i64 {
                SUB_JUMP => {
                    let cond = match (b2 >> 6) | ((b3 & 0x1) << 2) {
                        0 => None,
                        1 => Some(JumpCond::Eq),
                        2 => Some(JumpCond::Ov),
                        _ => return None,
                    };
                    let target = if b2 & 0x20 != 0 {
                        JumpTarget::Reg(b0 & 0x3)
                    } else {
                        JumpTarget::Words((b0 >> 2) as u16 | ((b1 as u16 & 0x1f) << 6))
                    };
                    Decoded::Jump { target, cond }
                }
                SUB_JUMPR => Decoded::JumpR {
                    step_words: b2 >> 1,
                    backward,
                    threshold: u16::from_le_bytes([b0, b1]),
                    cond: if b2 & 0x1 == 0 { R0Cond::Lt } else { R0Cond::Ge },
                },
                SUB_JUMPS => Decoded::JumpS {
                    step_words: b2 >> 1,
                    backward,
                    threshold: b0,
                    cond: match (b1 >> 7) | ((b2 & 0x1) << 1) {
                        0 => StageCond::Lt,
                        1 => StageCond::Ge,
                        2 => StageCond::Le,
                        _ => return None,
                    },
                },
                _ => return None,
            },
            0x9 => match b3 {
                0x90 => Decoded::Wake,
                0x92 => Decoded::Sleep(b0),
                _ => return None,
            },
            0xA => Decoded::Tsens {
                rd: b0 & 0x3,
                cycles: (b0 >> 2) as u16 | ((b1 as u16) << 6),
            },
            0xB => Decoded::Halt,
            0xD => Decoded::Load {
                rd: b0 & 0x3,
                rs: (b0 >> 2) & 0x3,
                offset_words: (b1 >> 2) as u16 | ((b2 as u16 & 0xf) << 6),
            },
            _ => return None,
        };
        Some(d)
    }
}
