//! Brings existing cards back within the limits of a (usually lower) tier.

use crate::Cards;
use crate::error::CardsError;
use crate::model::{CardRow, EnforcementReport};
use crate::service::CARD_FIELDS;
use cardly_domain::events::SubscriptionChanged;
use cardly_domain::tier::{Entitlements, Tier};
use cardly_kernel::time;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

impl Cards {
    /// Disables components of kinds the tier does not allow, disables enabled components
    /// past the per-card limit (by position) and unpublishes the newest published cards
    /// past the card limit.
    pub async fn enforce_entitlements(&self, owner: &str, tier: Tier) -> Result<EnforcementReport, CardsError> {
        let entitlements = Entitlements::for_tier(tier);
        let mut report = EnforcementReport::default();

        let cards: Vec<CardRow> = self
            .db
            .query(format!("SELECT {CARD_FIELDS} FROM card WHERE owner = $owner ORDER BY created_at ASC"))
            .bind(("owner", owner.to_owned()))
            .await?
            .take(0)?;

        let max_components = usize::try_from(entitlements.max_components_per_card).unwrap_or(usize::MAX);
        for card in &cards {
            let mut enabled = 0usize;
            for component in self.components(&card.uid).await? {
                if !component.enabled {
                    continue;
                }
                if entitlements.allows(component.kind) && enabled < max_components {
                    enabled += 1;
                } else {
                    report.disabled_components.push(component.id);
                }
            }
        }

        let max_cards = usize::try_from(entitlements.max_cards).unwrap_or(usize::MAX);
        report.unpublished_cards = cards
            .iter()
            .filter(|card| card.published)
            .skip(max_cards)
            .map(|card| card.uid.clone())
            .collect();

        if !report.disabled_components.is_empty() || !report.unpublished_cards.is_empty() {
            self.db
                .query(
                    "BEGIN TRANSACTION;
                    UPDATE component SET enabled = false, updated_at = $now WHERE uid IN $components;
                    UPDATE card SET published = false, updated_at = $now WHERE uid IN $cards;
                    COMMIT TRANSACTION;",
                )
                .bind(("components", report.disabled_components.clone()))
                .bind(("cards", report.unpublished_cards.clone()))
                .bind(("now", time::now()))
                .await?
                .check()?;
        }

        info!(
            owner = %owner,
            tier = %tier,
            disabled = report.disabled_components.len(),
            unpublished = report.unpublished_cards.len(),
            "Entitlements enforced"
        );
        Ok(report)
    }

    /// Runs [`Cards::enforce_entitlements`] for every `SubscriptionChanged` event.
    pub fn listen(&self) -> Result<JoinHandle<()>, CardsError> {
        let cards = self.clone();
        Ok(self.events.listen::<SubscriptionChanged, _, _>("cards.entitlements", move |event: Arc<SubscriptionChanged>| {
            let cards = cards.clone();
            async move {
                if let Err(err) = cards.enforce_entitlements(&event.owner, event.tier).await {
                    error!(owner = %event.owner, error = %err, "Entitlement enforcement failed");
                }
            }
        })?)
    }
}
