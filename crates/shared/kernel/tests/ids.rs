use cardly_kernel::{SAFE_ALPHABET, safe_nanoid};
use std::collections::HashSet;

#[test]
fn default_ids_are_twelve_unambiguous_chars() {
    let id = safe_nanoid!();
    assert_eq!(id.chars().count(), 12);
    assert!(id.chars().all(|ch| SAFE_ALPHABET.contains(&ch)), "{id}");
    assert!(!id.contains(['0', 'O', '1', 'l', 'I']));
}

#[test]
fn ids_are_path_safe_and_distinct() {
    let ids: HashSet<String> = (0..1_000).map(|_| safe_nanoid!(16)).collect();
    assert_eq!(ids.len(), 1_000);
    assert!(ids.iter().all(|id| id.len() == 16 && id.chars().all(|ch| ch.is_ascii_alphanumeric())));
}
