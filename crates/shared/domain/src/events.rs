//! Domain events exchanged between slices over the event bus.

use crate::tier::Tier;

/// A public card page was rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardViewed {
    pub card: String,
    pub owner: String,
    pub session: Option<String>,
    pub occurred_at: i64,
}

/// An NFC tag linked to a card was tapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTapped {
    pub card: String,
    pub owner: String,
    pub tag: String,
    pub occurred_at: i64,
}

/// A visitor followed a link published on a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkClicked {
    pub card: String,
    pub owner: String,
    pub target: String,
    pub session: Option<String>,
    pub occurred_at: i64,
}

/// A visitor left their details through a card form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactCaptured {
    pub card: String,
    pub owner: String,
    pub contact: String,
    pub occurred_at: i64,
}

/// The effective tier of a user changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChanged {
    pub owner: String,
    pub tier: Tier,
}
