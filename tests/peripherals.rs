use pretty_assertions::assert_eq;
use ulp_asm::assemble;

fn asm(line: &str) -> [u8; 4] {
    assemble(line).unwrap().bytes()
}

#[test]
fn adc_fields() {
    assert_eq!(asm("adc r1, 1, 3"), [0x4d, 0x00, 0x00, 0x50]);
    assert_eq!(asm("adc r0, 0, 0"), [0x00, 0x00, 0x00, 0x50]);
}

#[test]
fn i2c_read_and_write() {
    assert_eq!(asm("i2c_rd 0x10, 7, 0, 1"), [0x10, 0x00, 0x78, 0x30]);
    // slave 5 splits across byte2 (low two bits) and byte3
    assert_eq!(asm("i2c_wr 0x20, 0xab, 7, 0, 5"), [0x20, 0xab, 0x78, 0x39]);
}

#[test]
fn register_read() {
    assert_eq!(asm("reg_rd 0x120, 7, 4"), [0x20, 0x01, 0x90, 0x23]);
}

#[test]
fn register_write() {
    assert_eq!(asm("reg_wr 0x6, 24, 24, 0"), [0x06, 0x00, 0x60, 0x1c]);
    assert_eq!(asm("reg_wr 0x3ff, 31, 0, 0xff"), [0xff, 0xff, 0x83, 0x1f]);
}
