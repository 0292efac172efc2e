//! Utility functions for Robokassa operations.
//!
//! This module provides the hashing primitive, the shop-data suffix and
//! receipt encodings used by every signature variant, and a few string
//! helpers.

use crate::errors::Result;
use crate::types::{HashAlgorithm, Receipt, ShopData};
use sha2::Digest;
use url::form_urlencoded;

/// Separator between the fields of a signable string.
pub const DELIMITER: &str = ":";

/// Maximum length, in characters, of the shop-data suffix.
pub const SHOP_DATA_SUFFIX_LIMIT: usize = 2048;

/// Hashes `input` with `algorithm` and returns the lowercase hex digest.
///
/// # Examples
///
/// ```
/// use robokassa_rs::types::HashAlgorithm;
/// use robokassa_rs::utils::hex_digest;
///
/// assert_eq!(
///     hex_digest(HashAlgorithm::Md5, "abc"),
///     "900150983cd24fb0d6963f7d28e17f72"
/// );
/// ```
pub fn hex_digest(algorithm: HashAlgorithm, input: &str) -> String {
    let bytes = input.as_bytes();
    match algorithm {
        HashAlgorithm::Md5 => hex::encode(md5::compute(bytes).0),
        HashAlgorithm::Ripemd160 => digest_hex::<ripemd::Ripemd160>(bytes),
        HashAlgorithm::Sha1 => digest_hex::<sha1::Sha1>(bytes),
        HashAlgorithm::Sha256 => digest_hex::<sha2::Sha256>(bytes),
        HashAlgorithm::Sha384 => digest_hex::<sha2::Sha384>(bytes),
        HashAlgorithm::Sha512 => digest_hex::<sha2::Sha512>(bytes),
        HashAlgorithm::Sha3_256 => digest_hex::<sha3::Sha3_256>(bytes),
        HashAlgorithm::Sha3_512 => digest_hex::<sha3::Sha3_512>(bytes),
    }
}

fn digest_hex<D: Digest>(bytes: &[u8]) -> String {
    hex::encode(D::digest(bytes))
}

/// Builds the shop-data suffix appended to a signable string.
///
/// Each pair contributes `:key=value` in insertion order. The result is cut
/// to [`SHOP_DATA_SUFFIX_LIMIT`] characters.
///
/// # Examples
///
/// ```
/// use robokassa_rs::types::ShopData;
/// use robokassa_rs::utils::shop_data_suffix;
///
/// let mut data = ShopData::new();
/// data.insert("Shp_login".to_string(), "alice".to_string());
/// data.insert("Shp_item".to_string(), "7".to_string());
///
/// assert_eq!(shop_data_suffix(&data), ":Shp_login=alice:Shp_item=7");
/// ```
pub fn shop_data_suffix(shop_data: &ShopData) -> String {
    let mut suffix = String::new();
    for (key, value) in shop_data {
        suffix.push_str(DELIMITER);
        suffix.push_str(key);
        suffix.push('=');
        suffix.push_str(value);
    }
    truncate_chars(&suffix, SHOP_DATA_SUFFIX_LIMIT).to_string()
}

/// Returns the longest prefix of `s` holding at most `max` characters.
///
/// ```
/// use robokassa_rs::utils::truncate_chars;
///
/// assert_eq!(truncate_chars("привет", 3), "при");
/// assert_eq!(truncate_chars("abc", 10), "abc");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Serializes a receipt to JSON and url-encodes it.
///
/// Non-ASCII characters are left as-is in the JSON and only then
/// percent-encoded, which is the form both signed and sent as `Receipt`.
pub fn encode_receipt(receipt: &Receipt) -> Result<String> {
    let json = serde_json::to_string(receipt)?;
    Ok(form_urlencoded::byte_serialize(json.as_bytes()).collect())
}

/// Compares two hex digests ignoring ASCII case, without short-circuiting on
/// the first differing byte.
pub fn digest_eq(expected: &str, received: &str) -> bool {
    if expected.len() != received.len() {
        return false;
    }
    expected
        .bytes()
        .zip(received.bytes())
        .fold(0u8, |acc, (a, b)| {
            acc | (a.to_ascii_lowercase() ^ b.to_ascii_lowercase())
        })
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReceiptItem;

    #[test]
    fn test_hex_digest_known_vectors() {
        assert_eq!(
            hex_digest(HashAlgorithm::Sha1, "abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            hex_digest(HashAlgorithm::Sha256, "abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hex_digest(HashAlgorithm::Ripemd160, "abc"),
            "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"
        );
        assert_eq!(
            hex_digest(HashAlgorithm::Sha3_256, "abc"),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }

    #[test]
    fn test_hex_digest_lengths() {
        assert_eq!(hex_digest(HashAlgorithm::Md5, "").len(), 32);
        assert_eq!(hex_digest(HashAlgorithm::Sha384, "").len(), 96);
        assert_eq!(hex_digest(HashAlgorithm::Sha512, "").len(), 128);
        assert_eq!(hex_digest(HashAlgorithm::Sha3_512, "").len(), 128);
    }

    #[test]
    fn test_shop_data_suffix_empty() {
        assert_eq!(shop_data_suffix(&ShopData::new()), "");
    }

    #[test]
    fn test_shop_data_suffix_is_capped() {
        let mut data = ShopData::new();
        for i in 0..500 {
            data.insert(format!("Shp_key{}", i), "значение".to_string());
        }

        let suffix = shop_data_suffix(&data);
        assert_eq!(suffix.chars().count(), SHOP_DATA_SUFFIX_LIMIT);
        assert!(suffix.len() > SHOP_DATA_SUFFIX_LIMIT); // multibyte characters
        assert!(suffix.starts_with(":Shp_key0=значение:Shp_key1="));
    }

    #[test]
    fn test_truncate_chars_boundaries() {
        assert_eq!(truncate_chars("", 5), "");
        assert_eq!(truncate_chars("abc", 0), "");
        assert_eq!(truncate_chars("ab", 2), "ab");
    }

    #[test]
    fn test_encode_receipt_keeps_unicode_before_encoding() {
        let receipt = Receipt::new()
            .with_sno("osn")
            .with_item(ReceiptItem::new("Чай зелёный", 1.0, 250.5, "none"));

        let encoded = encode_receipt(&receipt).unwrap();
        assert!(!encoded.contains('{'));
        assert!(!encoded.contains("%5Cu")); // no \u escapes

        let (decoded, _) = form_urlencoded::parse(encoded.as_bytes()).next().unwrap();
        assert!(decoded.contains("Чай зелёный"));

        let parsed: Receipt = serde_json::from_str(&decoded).unwrap();
        assert_eq!(parsed, receipt);
    }

    #[test]
    fn test_digest_eq() {
        assert!(digest_eq("abcdef", "ABCDEF"));
        assert!(!digest_eq("abcdef", "abcdee"));
        assert!(!digest_eq("abcdef", "abcde"));
    }
}
