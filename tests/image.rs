use pretty_assertions::assert_eq;
use ulp_asm::image::{text_words, HEADER_SIZE};
use ulp_asm::{build_image, ImageError, ImageHeader, Word};

#[test]
fn image_bytes() {
    let image = build_image(&[Word::from_bytes(0x01, 0x00, 0x00, 0x90), Word::HALT]).unwrap();
    assert_eq!(
        image,
        vec![
            0x75, 0x6c, 0x70, 0x00, // magic
            0x0c, 0x00, // text offset
            0x08, 0x00, // text size
            0x00, 0x00, 0x00, 0x00, // data, bss
            0x01, 0x00, 0x00, 0x90, //
            0x00, 0x00, 0x00, 0xb0,
        ]
    );
    let (header, words) = text_words(&image).unwrap();
    assert_eq!(header, ImageHeader::for_text(2).unwrap());
    assert_eq!(words.len(), 2);
}

#[test]
fn magic_reads_as_decimal_7367797() {
    assert_eq!(ulp_asm::image::ULP_MAGIC, 7367797);
}

#[test]
fn damaged_images() {
    assert_eq!(text_words(&[0u8; 4]), Err(ImageError::TooShort { len: 4 }));

    let mut image = build_image(&[Word::HALT]).unwrap();
    image[0] = 0x76;
    assert!(matches!(text_words(&image), Err(ImageError::BadMagic { .. })));

    let mut image = build_image(&[Word::HALT]).unwrap();
    image.extend_from_slice(&[0, 0, 0, 0]);
    assert_eq!(
        text_words(&image),
        Err(ImageError::SizeMismatch { expected: HEADER_SIZE + 4, actual: HEADER_SIZE + 8 })
    );

    let mut image = build_image(&[Word::HALT]).unwrap();
    image[6] = 3;
    image.truncate(HEADER_SIZE + 3);
    assert_eq!(text_words(&image), Err(ImageError::Unaligned(3)));
}
