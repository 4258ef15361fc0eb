//! Subscription tiers and the entitlement rule table derived from them.

use crate::component::{ComponentKind, ComponentSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MIB: u64 = 1024 * 1024;

/// Subscription level. Ordered `Free < Pro < Premium`.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Premium,
}

impl Tier {
    pub const ALL: [Self; 3] = [Self::Free, Self::Pro, Self::Premium];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "FREE",
            Self::Pro => "PRO",
            Self::Premium => "PREMIUM",
        }
    }

    #[must_use]
    pub const fn is_paid(self) -> bool {
        !matches!(self, Self::Free)
    }

    #[must_use]
    pub const fn entitlements(self) -> Entitlements {
        Entitlements::for_tier(self)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tier '{s}'"))
    }
}

/// Static limits granted by a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlements {
    pub tier: Tier,
    pub component_kinds: ComponentSet,
    pub max_components_per_card: u32,
    pub max_cards: u32,
    pub max_nfc_tags: u32,
    pub analytics_history_days: u32,
    pub storage_quota_bytes: u64,
    pub experiments: bool,
    pub remove_branding: bool,
}

impl Entitlements {
    #[must_use]
    pub const fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Free => Self {
                tier,
                component_kinds: ComponentSet::BASIC,
                max_components_per_card: 5,
                max_cards: 1,
                max_nfc_tags: 1,
                analytics_history_days: 7,
                storage_quota_bytes: 10 * MIB,
                experiments: false,
                remove_branding: false,
            },
            Tier::Pro => Self {
                tier,
                component_kinds: ComponentSet::STANDARD,
                max_components_per_card: 15,
                max_cards: 3,
                max_nfc_tags: 5,
                analytics_history_days: 90,
                storage_quota_bytes: 250 * MIB,
                experiments: false,
                remove_branding: true,
            },
            Tier::Premium => Self {
                tier,
                component_kinds: ComponentSet::ALL,
                max_components_per_card: 50,
                max_cards: 10,
                max_nfc_tags: 25,
                analytics_history_days: 365,
                storage_quota_bytes: 2048 * MIB,
                experiments: true,
                remove_branding: true,
            },
        }
    }

    #[must_use]
    pub const fn allows(&self, kind: ComponentKind) -> bool {
        self.component_kinds.allows(kind)
    }

    /// Checks whether one more component of `kind` fits on a card that already has
    /// `current_count` components.
    pub fn check_component(
        &self,
        kind: ComponentKind,
        current_count: u32,
    ) -> Result<(), EntitlementViolation> {
        if !self.allows(kind) {
            return Err(EntitlementViolation::KindNotAllowed {
                kind,
                tier: self.tier,
                required: minimum_tier(kind),
            });
        }
        if current_count >= self.max_components_per_card {
            return Err(EntitlementViolation::LimitReached {
                limit: self.max_components_per_card,
                tier: self.tier,
            });
        }
        Ok(())
    }
}

/// The cheapest tier that allows `kind`.
#[must_use]
pub fn minimum_tier(kind: ComponentKind) -> Tier {
    Tier::ALL.into_iter().find(|tier| tier.entitlements().allows(kind)).unwrap_or(Tier::Premium)
}

/// Why a component cannot be added under the current tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitlementViolation {
    KindNotAllowed { kind: ComponentKind, tier: Tier, required: Tier },
    LimitReached { limit: u32, tier: Tier },
}

impl fmt::Display for EntitlementViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KindNotAllowed { kind, tier, required } => write!(
                f,
                "component '{kind}' is not available on the {tier} plan (requires {required})"
            ),
            Self::LimitReached { limit, tier } => {
                write!(f, "the {tier} plan allows at most {limit} components per card")
            }
        }
    }
}

impl std::error::Error for EntitlementViolation {}
