//! Hex frame codec for the device command protocol.
//!
//! The radar firmware documents its command frames as hex strings. This
//! module converts between hex text and raw bytes, and holds the login
//! command submitted during the session handshake.

use crate::error::CodecError;

/// Login command with the device default password, as a hex frame.
///
/// Submitted once per session, immediately after the link is established.
/// The firmware ignores every other command until it has accepted this
/// one. The frame is fixed for compatibility with stock firmware; a
/// custom-password device needs a protocol layer above this crate.
pub const AUTH_COMMAND_HEX: &str = "FDFCFBFA0800A80048694C696E6B04030201";

/// Decode a hex string into raw frame bytes.
///
/// Each two-character chunk is parsed as a base-16 byte value.
///
/// # Errors
///
/// Returns [`CodecError::OddLength`] when the input cannot decode to
/// whole bytes, and [`CodecError::InvalidDigit`] when a chunk is not
/// valid base-16.
pub fn decode_hex(hex: &str) -> Result<Vec<u8>, CodecError> {
    if hex.len() % 2 != 0 {
        return Err(CodecError::OddLength { len: hex.len() });
    }

    hex.as_bytes()
        .chunks(2)
        .enumerate()
        .map(|(index, pair)| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|chunk| u8::from_str_radix(chunk, 16).ok())
                .ok_or(CodecError::InvalidDigit { offset: index * 2 })
        })
        .collect()
}

/// Encode raw frame bytes as an uppercase hex string.
///
/// Canonical inverse of [`decode_hex`]; used for frame logging.
pub fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02X}", byte)).collect()
}

/// Decode the fixed login command into its 18 frame bytes.
pub fn auth_command() -> Result<Vec<u8>, CodecError> {
    decode_hex(AUTH_COMMAND_HEX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_rejects_odd_length() {
        assert_eq!(decode_hex("ABC"), Err(CodecError::OddLength { len: 3 }));
        assert_eq!(decode_hex("F"), Err(CodecError::OddLength { len: 1 }));
    }

    #[test]
    fn test_decode_rejects_invalid_digits() {
        assert_eq!(decode_hex("ZZ"), Err(CodecError::InvalidDigit { offset: 0 }));
        assert_eq!(
            decode_hex("00G1"),
            Err(CodecError::InvalidDigit { offset: 2 })
        );
        // Multi-byte characters must fail cleanly, not split mid-codepoint.
        assert!(decode_hex("日本").is_err());
    }

    #[test]
    fn test_decode_accepts_empty_and_lowercase() {
        assert_eq!(decode_hex("").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_hex("ab").unwrap(), vec![0xAB]);
        assert_eq!(decode_hex("ff00").unwrap(), vec![0xFF, 0x00]);
    }

    #[test]
    fn test_auth_command_frame() {
        let frame = auth_command().unwrap();
        assert_eq!(frame.len(), 18);
        assert_eq!(frame[0], 0xFD);
        assert_eq!(frame[17], 0x01);
    }

    #[test]
    fn test_encode_is_uppercase() {
        assert_eq!(encode_hex(&[0xFD, 0x0A, 0x00]), "FD0A00");
    }

    proptest! {
        #[test]
        fn decode_is_left_inverse_of_encode(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let hex = encode_hex(&bytes);
            prop_assert_eq!(decode_hex(&hex).unwrap(), bytes);
        }

        #[test]
        fn decode_then_encode_reproduces_uppercase_input(hex in "([0-9A-F]{2}){0,32}") {
            let bytes = decode_hex(&hex).unwrap();
            prop_assert_eq!(encode_hex(&bytes), hex);
        }
    }
}
