use pretty_assertions::assert_eq;
use ulp_asm::decoder::{Decoded, Decoder, JumpTarget, StageCond};
use ulp_asm::disasm::{fmt_decoded, fmt_word};
use ulp_asm::isa::esp32::Esp32Decoder;
use ulp_asm::session::epilogue;
use ulp_asm::{assemble, Listing, Word};

fn text(line: &str) -> String {
    fmt_word(assemble(line).unwrap())
}

#[test]
fn decode_jump_and_jumps() {
    let dec = Esp32Decoder::new();
    assert_eq!(
        dec.decode(assemble("jump 0x100").unwrap()),
        Some(Decoded::Jump { target: JumpTarget::Words(0x40), cond: None })
    );
    assert_eq!(
        dec.decode(assemble("jumps -16, 3, ge").unwrap()),
        Some(Decoded::JumpS { step_words: 4, backward: true, threshold: 3, cond: StageCond::Ge })
    );
}

#[test]
fn listing_text_is_canonical_assembly() {
    assert_eq!(text("JUMPR -8,1,LT"), "jumpr -8, 1, lt");
    assert_eq!(text("st r1 r2 8"), "st r1, r2, 8");
    assert_eq!(text("move r2, r1"), "move r2, r1");
    assert_eq!(text("move r0, 16"), "move r0, 0x10");
    assert_eq!(text("add r1, r2, 0x123"), "add r1, r2, 0x123");
    assert_eq!(text("stage_rst"), "stage_rst");
    assert_eq!(text("jump r1, eq"), "jump r1, eq");
    assert_eq!(text("i2c_wr 0x20, 0xab, 7, 0, 5"), "i2c_wr 0x20, 0xab, 7, 0, 5");
    assert_eq!(text("nop"), "nop");
    assert_eq!(text("sleep 3"), "sleep 3");
    assert_eq!(fmt_word(Word::from_bytes(0x64, 0, 0, 0)), "var(100)");
}

#[test]
fn epilogue_disassembles_and_reassembles() {
    let [reg_wr, halt] = epilogue();
    let line = fmt_word(reg_wr);
    assert_eq!(line, "reg_wr 0x6, 24, 24, 0x0");
    assert_eq!(assemble(&line).unwrap(), reg_wr);
    assert_eq!(fmt_decoded(&Decoded::Halt), fmt_word(halt));
}

#[test]
fn resident_listing_dump() {
    let listing = Listing::Resident(vec![Word::from_bytes(0x01, 0x00, 0x00, 0x90), Word::HALT]);
    assert_eq!(
        listing.to_string(),
        " 0: 01 00 00 90    wake\n 1: 00 00 00 b0    halt"
    );
}
