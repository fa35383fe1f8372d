//! Shared utilities for the casemix pipeline.

pub mod logging;
pub mod numeric;

/// Decode a Latin-1 (ISO 8859-1) byte slice into a `String`.
///
/// The yearly tariff extracts are published in Latin-1; every byte maps
/// directly to the code point of the same value.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin1_ascii() {
        assert_eq!(decode_latin1(b"GHM 01C031"), "GHM 01C031");
    }

    #[test]
    fn test_decode_latin1_accents() {
        // "Libellé" with an e-acute encoded as 0xE9
        assert_eq!(decode_latin1(&[0x4C, 0x69, 0x62, 0x65, 0x6C, 0x6C, 0xE9]), "Libellé");
    }
}
