use aes::Aes256;
use aes::cipher::{AsyncStreamCipher, KeyIvInit, StreamCipher};

use super::{SNG_KEY, TOC_IV, TOC_KEY, decrypt_sng, decrypt_toc};

type TocEncryptor = cfb_mode::Encryptor<Aes256>;
type SngCipher = ctr::Ctr128BE<Aes256>;

#[test]
fn toc_roundtrip_block_aligned() {
    let plain = [0x42u8; 32];

    let mut buf = plain;
    let enc = TocEncryptor::new_from_slices(&TOC_KEY, &TOC_IV).unwrap();
    enc.encrypt(&mut buf);

    let dec = decrypt_toc(&buf).unwrap();
    assert_eq!(dec, plain);
}

#[test]
fn toc_roundtrip_partial_block() {
    // 23 bytes: the decryptor pads to 32, decrypts, and truncates back.
    let plain: Vec<u8> = (0u8..23).collect();

    let mut buf = plain.clone();
    buf.resize(32, 0);
    let enc = TocEncryptor::new_from_slices(&TOC_KEY, &TOC_IV).unwrap();
    enc.encrypt(&mut buf);
    buf.truncate(plain.len());

    let dec = decrypt_toc(&buf).unwrap();
    assert_eq!(dec.len(), plain.len());
    assert_eq!(dec, plain);
}

#[test]
fn toc_empty_input() {
    assert!(decrypt_toc(&[]).unwrap().is_empty());
}

#[test]
fn sng_ctr_is_symmetric() {
    let iv = [0x11u8; 16];
    let plain = b"an arbitrary-length payload, not block aligned".to_vec();

    let mut cipher_text = plain.clone();
    let mut cipher = SngCipher::new_from_slices(&SNG_KEY, &iv).unwrap();
    cipher.apply_keystream(&mut cipher_text);
    assert_ne!(cipher_text, plain);

    let dec = decrypt_sng(&iv, &cipher_text).unwrap();
    assert_eq!(dec, plain);
}

#[test]
fn sng_iv_matters() {
    let plain = vec![0u8; 16];
    let a = decrypt_sng(&[0u8; 16], &plain).unwrap();
    let b = decrypt_sng(&[1u8; 16], &plain).unwrap();
    assert_ne!(a, b);
}
