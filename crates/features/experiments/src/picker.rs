//! Variant validation and weighted selection.

use crate::model::Variant;
use rand::Rng;
use std::collections::HashSet;

pub const MIN_VARIANTS: usize = 2;
pub const MAX_VARIANTS: usize = 10;
pub const MAX_WEIGHT: u32 = 10_000;

pub(crate) fn validate_variants(variants: &[Variant]) -> Result<(), String> {
    if !(MIN_VARIANTS..=MAX_VARIANTS).contains(&variants.len()) {
        return Err(format!("an experiment needs {MIN_VARIANTS} to {MAX_VARIANTS} variants"));
    }
    let mut seen = HashSet::new();
    for variant in variants {
        let key_ok = (1..=32).contains(&variant.key.len())
            && variant.key.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
        if !key_ok {
            return Err(format!("variant key '{}' must be 1 to 32 of a-z, 0-9, '_' and '-'", variant.key));
        }
        if !seen.insert(variant.key.as_str()) {
            return Err(format!("duplicate variant '{}'", variant.key));
        }
        if !(1..=MAX_WEIGHT).contains(&variant.weight) {
            return Err(format!("variant weights must be 1 to {MAX_WEIGHT}"));
        }
    }
    Ok(())
}

/// The first variant whose cumulative weight exceeds `roll`, for `roll` in
/// `0..total_weight`.
pub(crate) fn pick_with_roll(variants: &[Variant], roll: u32) -> Option<&Variant> {
    let mut cumulative = 0u32;
    variants.iter().find(|variant| {
        cumulative += variant.weight;
        cumulative > roll
    })
}

/// Weighted random pick.
pub(crate) fn pick(variants: &[Variant]) -> Option<&Variant> {
    let total: u32 = variants.iter().map(|v| v.weight).sum();
    if total == 0 {
        return None;
    }
    pick_with_roll(variants, rand::rng().random_range(0..total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn variants(weights: &[u32]) -> Vec<Variant> {
        weights.iter().enumerate().map(|(i, w)| Variant { key: format!("v{i}"), weight: *w }).collect()
    }

    #[test]
    fn rolls_map_onto_cumulative_ranges() {
        let v = variants(&[1, 3]);
        assert_eq!(pick_with_roll(&v, 0).unwrap().key, "v0");
        assert_eq!(pick_with_roll(&v, 1).unwrap().key, "v1");
        assert_eq!(pick_with_roll(&v, 3).unwrap().key, "v1");
        assert!(pick_with_roll(&v, 4).is_none());
    }

    #[test]
    fn variant_rules() {
        assert!(validate_variants(&variants(&[1, 1])).is_ok());
        assert!(validate_variants(&variants(&[1])).is_err());
        assert!(validate_variants(&variants(&[1; 11])).is_err());
        assert!(validate_variants(&variants(&[0, 1])).is_err());
        assert!(validate_variants(&variants(&[1, MAX_WEIGHT + 1])).is_err());

        let mut dup = variants(&[1, 1]);
        dup[1].key = "v0".into();
        assert!(validate_variants(&dup).is_err());
        dup[1].key = "Bad Key".into();
        assert!(validate_variants(&dup).is_err());
    }

    proptest! {
        #[test]
        fn every_roll_picks_a_variant(weights in prop::collection::vec(1u32..=MAX_WEIGHT, 2..=10), seed in any::<u32>()) {
            let v = variants(&weights);
            let total: u32 = weights.iter().sum();
            let roll = seed % total;
            let picked = pick_with_roll(&v, roll).unwrap();
            let index = v.iter().position(|x| x.key == picked.key).unwrap();
            let before: u32 = weights[..index].iter().sum();
            prop_assert!(before <= roll && roll < before + weights[index]);
        }

        #[test]
        fn random_picks_stay_in_the_list(weights in prop::collection::vec(1u32..=MAX_WEIGHT, 2..=10)) {
            let v = variants(&weights);
            prop_assert!(pick(&v).is_some());
        }
    }
}
