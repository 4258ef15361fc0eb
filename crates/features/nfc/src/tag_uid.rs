//! ISO 14443 tag identifiers.

/// Valid UID lengths in bytes: single, double and triple size.
pub const UID_BYTES: [usize; 3] = [4, 7, 10];

/// Strips `:`, `-` and whitespace and uppercases. The result must be hex of 4, 7 or
/// 10 bytes.
pub fn normalize(raw: &str) -> Result<String, &'static str> {
    let uid: String = raw
        .chars()
        .filter(|c| !matches!(c, ':' | '-') && !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if !uid.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err("tag uid must be hexadecimal");
    }
    if uid.len() % 2 != 0 || !UID_BYTES.contains(&(uid.len() / 2)) {
        return Err("tag uid must be 4, 7 or 10 bytes long");
    }
    Ok(uid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn separators_are_stripped() {
        assert_eq!(normalize("04:a2:2b:c1").unwrap(), "04A22BC1");
        assert_eq!(normalize(" 04-A2-2B-C1-5E-80-00 ").unwrap(), "04A22BC15E8000");
        assert_eq!(normalize("04 a2 2b c1 5e 80 00 11 22 33").unwrap().len(), 20);
    }

    #[test]
    fn bad_lengths_and_characters_fail() {
        assert!(normalize("").is_err());
        assert!(normalize("04A22B").is_err());
        assert!(normalize("04A22BC1F").is_err());
        assert!(normalize("04A22BZZ").is_err());
        assert!(normalize("04A22BC15E80001122").is_err());
    }

    proptest! {
        #[test]
        fn normalizing_is_idempotent(bytes in prop::sample::select(UID_BYTES.to_vec())
            .prop_flat_map(|n| prop::collection::vec(any::<u8>(), n)))
        {
            let raw = bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(":");
            let once = normalize(&raw).unwrap();
            prop_assert_eq!(normalize(&once).unwrap(), once.clone());
            prop_assert_eq!(once.len(), bytes.len() * 2);
        }
    }
}
