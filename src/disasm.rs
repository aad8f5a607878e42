use crate::decoder::{AluOp, Decoded, Decoder, JumpCond, JumpTarget, R0Cond, StageCond, StageOp};
use crate::isa::esp32::Esp32Decoder;
use crate::word::Word;

fn jump_cond(c: JumpCond) -> &'static str {
    match c {
        JumpCond::Eq => "eq",
        JumpCond::Ov => "ov",
    }
}

fn r0_cond(c: R0Cond) -> &'static str {
    match c {
        R0Cond::Lt => "lt",
        R0Cond::Ge => "ge",
    }
}

fn stage_cond(c: StageCond) -> &'static str {
    match c {
        StageCond::Lt => "lt",
        StageCond::Ge => "ge",
        StageCond::Le => "le",
    }
}

/// Relative steps are printed in bytes, negative when the PC is decremented.
fn step(words: u8, backward: bool) -> i32 {
    let bytes = words as i32 * 4;
    if backward { -bytes } else { bytes }
}

/// Renders a decoded word as a line the assembler accepts again.
pub fn fmt_decoded(d: &Decoded) -> String {
    match *d {
        Decoded::AluReg { alu: AluOp::Move, rd, rs1, .. } => format!("move r{}, r{}", rd, rs1),
        Decoded::AluReg { alu, rd, rs1, rs2 } => {
            format!("{} r{}, r{}, r{}", alu.mnemonic(), rd, rs1, rs2)
        }
        Decoded::AluImm { alu: AluOp::Move, rd, imm, .. } => format!("move r{}, {:#x}", rd, imm),
        Decoded::AluImm { alu, rd, rs, imm } => {
            format!("{} r{}, r{}, {:#x}", alu.mnemonic(), rd, rs, imm)
        }
        Decoded::Stage { op: StageOp::Rst, .. } => StageOp::Rst.mnemonic().to_string(),
        Decoded::Stage { op, imm } => format!("{} {}", op.mnemonic(), imm),
        Decoded::Store { rs, rd, offset_words } => {
            format!("st r{}, r{}, {}", rs, rd, offset_words as u32 * 4)
        }
        Decoded::Load { rd, rs, offset_words } => {
            format!("ld r{}, r{}, {}", rd, rs, offset_words as u32 * 4)
        }
        Decoded::Jump { target, cond } => {
            let target = match target {
                JumpTarget::Reg(r) => format!("r{}", r),
                JumpTarget::Words(w) => (w as u32 * 4).to_string(),
            };
            match cond {
                Some(c) => format!("jump {}, {}", target, jump_cond(c)),
                None => format!("jump {}", target),
            }
        }
        Decoded::JumpR { step_words, backward, threshold, cond } => format!(
            "jumpr {}, {}, {}",
            step(step_words, backward),
            threshold,
            r0_cond(cond)
        ),
        Decoded::JumpS { step_words, backward, threshold, cond } => format!(
            "jumps {}, {}, {}",
            step(step_words, backward),
            threshold,
            stage_cond(cond)
        ),
        Decoded::Adc { rd, sar, pad } => format!("adc r{}, {}, {}", rd, sar, pad),
        Decoded::I2c { write: false, sub_addr, high, low, slave, .. } => {
            format!("i2c_rd {:#x}, {}, {}, {}", sub_addr, high, low, slave)
        }
        Decoded::I2c { write: true, sub_addr, data, high, low, slave } => {
            format!("i2c_wr {:#x}, {:#x}, {}, {}, {}", sub_addr, data, high, low, slave)
        }
        Decoded::RegRd { addr, high, low } => format!("reg_rd {:#x}, {}, {}", addr, high, low),
        Decoded::RegWr { addr, high, low, data } => {
            format!("reg_wr {:#x}, {}, {}, {:#x}", addr, high, low, data)
        }
        Decoded::Halt => "halt".to_string(),
        Decoded::Wake => "wake".to_string(),
        Decoded::Sleep(r) => format!("sleep {}", r),
        Decoded::Wait(0) => "nop".to_string(),
        Decoded::Wait(c) => format!("wait {}", c),
        Decoded::Tsens { rd, cycles } => format!("tsens r{}, {}", rd, cycles),
        Decoded::Data(v) => format!("var({})", v),
    }
}

pub fn fmt_word(word: Word) -> String {
    match Esp32Decoder.decode(word) {
        Some(d) => fmt_decoded(&d),
        None => format!(".word {:#010x}", word.to_u32()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backward_steps_print_negative() {
        let d = Decoded::JumpR { step_words: 2, backward: true, threshold: 1, cond: R0Cond::Lt };
        assert_eq!(fmt_decoded(&d), "jumpr -8, 1, lt");
    }

    #[test]
    fn undecodable_word_falls_back_to_raw() {
        assert_eq!(fmt_word(Word::from_bytes(0, 0, 0, 0xf0)), ".word 0xf0000000");
    }
}
