use pretty_assertions::assert_eq;
use ulp_asm::{assemble, EncodeError};

fn asm(line: &str) -> [u8; 4] {
    assemble(line).unwrap().bytes()
}

#[test]
fn fixed_encodings() {
    assert_eq!(asm("halt"), [0x00, 0x00, 0x00, 0xb0]);
    assert_eq!(asm("wake"), [0x01, 0x00, 0x00, 0x90]);
    assert_eq!(asm("nop"), [0x00, 0x00, 0x00, 0x40]);
    assert_eq!(asm("sleep 2"), [0x02, 0x00, 0x00, 0x92]);
    assert_eq!(asm("sleep 4"), [0x04, 0x00, 0x00, 0x92]);
    assert_eq!(asm("wait 0x1234"), [0x34, 0x12, 0x00, 0x40]);
}

#[test]
fn sleep_register_is_limited_to_four() {
    assert!(matches!(
        assemble("sleep 5"),
        Err(EncodeError::UnsupportedCommand { .. })
    ));
}

#[test]
fn tsens_splits_cycles() {
    // cycles 0x1000: low six bits in byte0, next eight in byte1
    assert_eq!(asm("tsens r1, 0x1000"), [0x01, 0x40, 0x00, 0xa0]);
    assert_eq!(asm("tsens r2, 3"), [0x0e, 0x00, 0x00, 0xa0]);
}

#[test]
fn same_line_same_word() {
    assert_eq!(asm("ADD r0, r1, 5"), asm("add r0,r1,5"));
    assert_eq!(asm("  jumpr -8,1,lt "), asm("jumpr -8 1 lt"));
}

#[test]
fn unknown_mnemonic() {
    let err = assemble("mul r0, r1, r2").unwrap_err();
    assert_eq!(err.to_string(), "unsupported command \"mul r0 r1 r2\"");
}
