//! Public address rules shared by card slugs and experiment keys.

use crate::constants::is_reserved_slug;

pub const MIN_SLUG_LEN: usize = 3;
pub const MAX_SLUG_LEN: usize = 40;

/// Trims and lowercases user input before validation.
#[must_use]
pub fn normalize(slug: &str) -> String {
    slug.trim().to_ascii_lowercase()
}

/// `[a-z0-9-]{3,40}` without leading, trailing or doubled `-`.
#[must_use]
pub fn is_valid_format(slug: &str) -> bool {
    (MIN_SLUG_LEN..=MAX_SLUG_LEN).contains(&slug.len())
        && slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
}

/// Checks the format and the reserved word list; the error is a user-facing reason.
pub fn validate(slug: &str) -> Result<(), &'static str> {
    if !is_valid_format(slug) {
        return Err("slugs are 3 to 40 characters of a-z, 0-9 and single '-' between words");
    }
    if is_reserved_slug(slug) {
        return Err("this slug is reserved");
    }
    Ok(())
}
