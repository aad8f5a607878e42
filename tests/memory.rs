use pretty_assertions::assert_eq;
use ulp_asm::assemble;

fn asm(line: &str) -> [u8; 4] {
    assemble(line).unwrap().bytes()
}

#[test]
fn store_and_load_word_offsets() {
    assert_eq!(asm("st r1, r2, 8"), [0x09, 0x08, 0x00, 0x68]);
    assert_eq!(asm("ld r1, r2, 8"), [0x09, 0x08, 0x00, 0xd0]);
    assert_eq!(asm("st r3, r0, 0x7fc"), [0x03, 0xfc, 0x07, 0x68]);
    assert_eq!(asm("ld r0, r3, 0x7fc"), [0x0c, 0xfc, 0x07, 0xd0]);
}

#[test]
fn byte_offsets_round_down_to_words() {
    assert_eq!(asm("st r0, r1, 6"), [0x04, 0x04, 0x00, 0x68]);
}

#[test]
fn store_keeps_one_more_high_offset_bit_than_load() {
    // word offset 0x400: bit 10 survives the store mask (0x7c0) but not the load mask (0x3c0)
    assert_eq!(asm("st r0, r0, 0x1000"), [0x00, 0x00, 0x10, 0x68]);
    assert_eq!(asm("ld r0, r0, 0x1000"), [0x00, 0x00, 0x00, 0xd0]);
}
