//! Boolean <-> integer mapping at the SQLite boundary
//!
//! SQLite has no boolean column type, so flags are stored as 0/1. These two
//! functions are the only place that conversion happens.

/// Encode a flag for storage
pub fn bool_to_stored(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Decode a stored flag. Any non-zero value reads as `true`.
pub fn bool_from_stored(value: i64) -> bool {
    value != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_both_values() {
        for flag in [true, false] {
            assert_eq!(bool_from_stored(bool_to_stored(flag)), flag);
        }
    }

    #[test]
    fn test_stored_encoding() {
        assert_eq!(bool_to_stored(true), 1);
        assert_eq!(bool_to_stored(false), 0);
    }

    #[test]
    fn test_nonzero_is_true() {
        assert!(bool_from_stored(2));
        assert!(bool_from_stored(-1));
        assert!(!bool_from_stored(0));
    }
}
