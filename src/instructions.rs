use tracing::trace;

use crate::decoder::{AluOp, StageOp};
use crate::isa::esp32;
use crate::text;
use crate::word::Word;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("unsupported command \"{line}\"")]
    UnsupportedCommand { line: String },
    #[error("{0}")]
    UnsupportedVariant(&'static str),
    #[error("invalid operand \"{operand}\": {reason}")]
    InvalidOperand { operand: String, reason: &'static str },
    #[error("missing operand #{index}")]
    MissingOperand { index: usize },
}

/// Lexical class of one operand token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// `r0`..`r3`
    Reg,
    /// Decimal or `0x` hex.
    Imm,
    /// `Imm` with an optional leading `-`.
    Signed,
    /// One keyword out of a fixed set.
    Cond(&'static [&'static str]),
    /// A single decimal digit in `0..=max`.
    Digit { max: u8 },
}

impl Operand {
    pub fn matches(&self, tok: &str) -> bool {
        match self {
            Operand::Reg => text::is_register(tok),
            Operand::Imm => text::is_unsigned(tok),
            Operand::Signed => text::is_signed(tok),
            Operand::Cond(set) => set.contains(&tok),
            Operand::Digit { max } => {
                matches!(tok.as_bytes(), [d @ b'0'..=b'9'] if d - b'0' <= *max)
            }
        }
    }
}

/// Encoder selected by a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    AluImm(AluOp),
    AluReg(AluOp),
    Stage(StageOp),
    Store,
    Load,
    JumpReg,
    JumpRegCond,
    JumpImm,
    JumpImmCond,
    JumpR,
    JumpRUnsupported,
    JumpS,
    JumpSUnsupported,
    Halt,
    Wake,
    Sleep,
    Wait,
    Nop,
    Tsens,
    Adc,
    I2cRd,
    I2cWr,
    RegRd,
    RegWr,
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub mnemonic: &'static str,
    pub operands: &'static [Operand],
    pub op: Op,
}

impl InstrDesc {
    pub fn matches(&self, toks: &[&str]) -> bool {
        match toks.split_first() {
            Some((mn, rest)) => {
                *mn == self.mnemonic
                    && rest.len() == self.operands.len()
                    && self.operands.iter().zip(rest).all(|(o, t)| o.matches(t))
            }
            None => false,
        }
    }
}

use self::Operand::{Imm, Reg, Signed};

const EQ_OV: Operand = Operand::Cond(&["eq", "ov"]);
const LT_GE: Operand = Operand::Cond(&["lt", "ge"]);
const EQ_LE_GT: Operand = Operand::Cond(&["eq", "le", "gt"]);
const LT_LE_GE: Operand = Operand::Cond(&["lt", "le", "ge"]);
const EQ_GT: Operand = Operand::Cond(&["eq", "gt"]);

const fn desc(mnemonic: &'static str, operands: &'static [Operand], op: Op) -> InstrDesc {
    InstrDesc { mnemonic, operands, op }
}

/// Matched top to bottom, first hit wins. Register and immediate forms of a
/// mnemonic are told apart only by the lexical class of their last operand.
pub const TABLE: &[InstrDesc] = &[
    desc("add", &[Reg, Reg, Imm], Op::AluImm(AluOp::Add)),
    desc("add", &[Reg, Reg, Reg], Op::AluReg(AluOp::Add)),
    desc("sub", &[Reg, Reg, Imm], Op::AluImm(AluOp::Sub)),
    desc("sub", &[Reg, Reg, Reg], Op::AluReg(AluOp::Sub)),
    desc("and", &[Reg, Reg, Imm], Op::AluImm(AluOp::And)),
    desc("and", &[Reg, Reg, Reg], Op::AluReg(AluOp::And)),
    desc("or", &[Reg, Reg, Imm], Op::AluImm(AluOp::Or)),
    desc("or", &[Reg, Reg, Reg], Op::AluReg(AluOp::Or)),
    desc("move", &[Reg, Reg], Op::AluReg(AluOp::Move)),
    desc("move", &[Reg, Imm], Op::AluImm(AluOp::Move)),
    desc("lsh", &[Reg, Reg, Imm], Op::AluImm(AluOp::Lsh)),
    desc("lsh", &[Reg, Reg, Reg], Op::AluReg(AluOp::Lsh)),
    desc("rsh", &[Reg, Reg, Imm], Op::AluImm(AluOp::Rsh)),
    desc("rsh", &[Reg, Reg, Reg], Op::AluReg(AluOp::Rsh)),
    desc("stage_rst", &[], Op::Stage(StageOp::Rst)),
    desc("stage_inc", &[Imm], Op::Stage(StageOp::Inc)),
    desc("stage_dec", &[Imm], Op::Stage(StageOp::Dec)),
    desc("st", &[Reg, Reg, Imm], Op::Store),
    desc("ld", &[Reg, Reg, Imm], Op::Load),
    desc("jump", &[Reg], Op::JumpReg),
    desc("jump", &[Reg, EQ_OV], Op::JumpRegCond),
    desc("jump", &[Imm], Op::JumpImm),
    desc("jump", &[Imm, EQ_OV], Op::JumpImmCond),
    desc("jumpr", &[Signed, Imm, LT_GE], Op::JumpR),
    desc("jumpr", &[Signed, Imm, EQ_LE_GT], Op::JumpRUnsupported),
    desc("jumps", &[Signed, Imm, LT_LE_GE], Op::JumpS),
    desc("jumps", &[Signed, Imm, EQ_GT], Op::JumpSUnsupported),
    desc("halt", &[], Op::Halt),
    desc("wake", &[], Op::Wake),
    desc("sleep", &[Operand::Digit { max: 4 }], Op::Sleep),
    desc("wait", &[Imm], Op::Wait),
    desc("nop", &[], Op::Nop),
    desc("tsens", &[Reg, Imm], Op::Tsens),
    desc("adc", &[Reg, Imm, Imm], Op::Adc),
    desc("i2c_rd", &[Imm, Imm, Imm, Imm], Op::I2cRd),
    desc("i2c_wr", &[Imm, Imm, Imm, Imm, Imm], Op::I2cWr),
    desc("reg_rd", &[Imm, Imm, Imm], Op::RegRd),
    desc("reg_wr", &[Imm, Imm, Imm, Imm], Op::RegWr),
];

pub fn lookup(toks: &[&str]) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.matches(toks))
}

/// Normalizes, matches and encodes one instruction line.
pub fn assemble(line: &str) -> Result<Word, EncodeError> {
    let normalized = text::normalize(line);
    assemble_tokens(&text::tokens(&normalized))
}

/// Same as [`assemble`] for a line that has already been normalized and split.
pub fn assemble_tokens(toks: &[&str]) -> Result<Word, EncodeError> {
    let desc = lookup(toks).ok_or_else(|| EncodeError::UnsupportedCommand {
        line: toks.join(" "),
    })?;
    trace!(mnemonic = desc.mnemonic, op = ?desc.op, "matched instruction pattern");
    esp32::encode(desc.op, &toks[1..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_immediate_forms_are_distinct() {
        assert_eq!(lookup(&["add", "r0", "r1", "r2"]).unwrap().op, Op::AluReg(AluOp::Add));
        assert_eq!(lookup(&["add", "r0", "r1", "2"]).unwrap().op, Op::AluImm(AluOp::Add));
        assert_eq!(lookup(&["move", "r0", "r1"]).unwrap().op, Op::AluReg(AluOp::Move));
        assert_eq!(lookup(&["move", "r0", "0x1"]).unwrap().op, Op::AluImm(AluOp::Move));
        assert_eq!(lookup(&["jump", "r1"]).unwrap().op, Op::JumpReg);
        assert_eq!(lookup(&["jump", "16", "ov"]).unwrap().op, Op::JumpImmCond);
    }

    #[test]
    fn whole_line_must_match() {
        assert!(lookup(&["halt", "now"]).is_none());
        assert!(lookup(&["add", "r0", "r1"]).is_none());
        assert!(lookup(&["add", "r0", "r4", "r1"]).is_none());
        assert!(lookup(&["sleep", "5"]).is_none());
        assert!(lookup(&["sleep", "04"]).is_none());
        assert!(lookup(&[]).is_none());
    }

    #[test]
    fn rejected_conditions_still_match_an_entry() {
        assert_eq!(lookup(&["jumpr", "8", "1", "eq"]).unwrap().op, Op::JumpRUnsupported);
        assert_eq!(lookup(&["jumps", "-4", "1", "gt"]).unwrap().op, Op::JumpSUnsupported);
        assert_eq!(lookup(&["jumps", "-4", "1", "le"]).unwrap().op, Op::JumpS);
        assert!(lookup(&["jumpr", "8", "1", "ov"]).is_none());
    }

    #[test]
    fn unknown_line_reports_normalized_text() {
        let err = assemble("  FOO r1,r2 ").unwrap_err();
        assert_eq!(err, EncodeError::UnsupportedCommand { line: "foo r1 r2".into() });
    }
}
