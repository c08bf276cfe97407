//! Custom-error payload decoding
//!
//! A contract's custom error carries its identifier as bytes, rendered as
//! a hex string. The first two characters are a marker slot (`0x` in the
//! rendered form, the length byte in the raw form) and are skipped; every
//! following pair is one ASCII character.

use crate::{HarnessError, HarnessResult};

/// Decode a custom-error payload to its identifier
///
/// ```
/// use psp34_harness::error_decoder::decode;
/// assert_eq!(decode("0x4d696e74456e64").unwrap(), "MintEnd");
/// ```
pub fn decode(payload: &str) -> HarnessResult<String> {
    let body = match payload.as_bytes() {
        [] => &[][..],
        [first, second, rest @ ..] if first.is_ascii() && second.is_ascii() => rest,
        _ => {
            return Err(HarnessError::MalformedPayload(format!(
                "no two-character marker in {:?}",
                payload
            )))
        }
    };
    if body.len() % 2 != 0 {
        return Err(HarnessError::MalformedPayload(format!(
            "odd hex length in {:?}",
            payload
        )));
    }
    let bytes = hex::decode(body)
        .map_err(|e| HarnessError::MalformedPayload(format!("{:?}: {}", payload, e)))?;

    Ok(bytes.into_iter().map(char::from).collect())
}

/// Render an identifier the way the node reports custom errors
pub fn encode(identifier: &str) -> String {
    format!("0x{}", hex::encode(identifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_mint_end() {
        assert_eq!(decode("0x4d696e74456e64").unwrap(), "MintEnd");
    }

    #[test]
    fn test_decode_cannot_mint_more_than_once() {
        assert_eq!(
            decode("0x43616e6e6f744d696e744d6f72655468616e4f6e6365").unwrap(),
            "CannotMintMoreThanOnce"
        );
    }

    #[test]
    fn test_length_prefixed_form() {
        // length byte 0x1c followed by "MintEnd"
        assert_eq!(decode("1c4d696e74456e64").unwrap(), "MintEnd");
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(decode("0x").unwrap(), "");
        assert_eq!(decode("").unwrap(), "");
    }

    #[test]
    fn test_odd_length_is_malformed() {
        assert!(matches!(
            decode("0x4d6"),
            Err(HarnessError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_non_hex_is_malformed() {
        assert!(matches!(
            decode("0xzz"),
            Err(HarnessError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_bad_marker_is_malformed() {
        for payload in ["x", "0\u{e9}4d", "a\u{e9}4d", "\u{e9}4d"] {
            assert!(
                matches!(decode(payload), Err(HarnessError::MalformedPayload(_))),
                "{:?} should be rejected",
                payload
            );
        }
        // non-ASCII after an intact marker fails the hex decode
        assert!(matches!(
            decode("0x\u{e9}4d"),
            Err(HarnessError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("MintEnd"), "0x4d696e74456e64");
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(identifier in "[A-Za-z:_]{0,40}") {
            prop_assert_eq!(decode(&encode(&identifier)).unwrap(), identifier);
        }
    }
}
