//! Plan catalog and the rules deciding which tier is in force.

use crate::model::{BillingInterval, Plan, Subscription, SubscriptionStatus};
use cardly_domain::config::PriceConfig;
use cardly_domain::tier::{Entitlements, Tier};
use cardly_kernel::time::DAY;

/// `(tier, display name, monthly cents, yearly cents)`.
const CATALOG: [(Tier, &str, u32, u32); 3] = [
    (Tier::Free, "Free", 0, 0),
    (Tier::Pro, "Pro", 900, 9_000),
    (Tier::Premium, "Premium", 1_900, 19_000),
];

#[must_use]
pub fn plans() -> Vec<Plan> {
    CATALOG
        .into_iter()
        .map(|(tier, name, monthly_cents, yearly_cents)| Plan {
            tier,
            name: name.to_owned(),
            monthly_cents,
            yearly_cents,
            entitlements: Entitlements::for_tier(tier).into(),
        })
        .collect()
}

/// The tier a subscription grants at `now`.
///
/// Active and trialing subscriptions count until their period ends; past-due ones keep
/// their tier for `grace_days` after the period end. Everything else is FREE.
#[must_use]
pub fn effective_tier(subscription: Option<&Subscription>, now: i64, grace_days: u32) -> Tier {
    let Some(sub) = subscription else {
        return Tier::Free;
    };
    let in_force = match sub.status {
        SubscriptionStatus::Active | SubscriptionStatus::Trialing => {
            sub.current_period_end.is_none_or(|end| now < end)
        }
        SubscriptionStatus::PastDue => sub
            .current_period_end
            .is_some_and(|end| now < end.saturating_add(i64::from(grace_days) * DAY)),
        SubscriptionStatus::Canceled | SubscriptionStatus::Incomplete => false,
    };
    if in_force { sub.tier } else { Tier::Free }
}

/// Provider price id for a paid tier and interval.
#[must_use]
pub fn price_for(prices: &PriceConfig, tier: Tier, interval: BillingInterval) -> Option<&str> {
    let price = match (tier, interval) {
        (Tier::Free, _) => None,
        (Tier::Pro, BillingInterval::Monthly) => prices.pro_monthly.as_ref(),
        (Tier::Pro, BillingInterval::Yearly) => prices.pro_yearly.as_ref(),
        (Tier::Premium, BillingInterval::Monthly) => prices.premium_monthly.as_ref(),
        (Tier::Premium, BillingInterval::Yearly) => prices.premium_yearly.as_ref(),
    };
    price.map(String::as_str).filter(|p| !p.is_empty())
}

/// Reverse lookup of [`price_for`].
#[must_use]
pub fn plan_for_price(prices: &PriceConfig, price_id: &str) -> Option<(Tier, BillingInterval)> {
    [Tier::Pro, Tier::Premium]
        .into_iter()
        .flat_map(|tier| {
            [BillingInterval::Monthly, BillingInterval::Yearly].map(|interval| (tier, interval))
        })
        .find(|(tier, interval)| price_for(prices, *tier, *interval) == Some(price_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscription(status: SubscriptionStatus, period_end: Option<i64>) -> Subscription {
        Subscription {
            owner: "u1".into(),
            tier: Tier::Pro,
            status,
            interval: Some(BillingInterval::Monthly),
            customer_id: None,
            subscription_id: None,
            current_period_end: period_end,
            cancel_at_period_end: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn catalog_prices() {
        let plans = plans();
        assert_eq!(plans.len(), 3);
        assert_eq!((plans[1].monthly_cents, plans[1].yearly_cents), (900, 9_000));
        assert_eq!((plans[2].monthly_cents, plans[2].yearly_cents), (1_900, 19_000));
        assert_eq!(plans[0].entitlements.max_cards, 1);
    }

    #[test]
    fn no_subscription_is_free() {
        assert_eq!(effective_tier(None, 100, 3), Tier::Free);
    }

    #[test]
    fn active_until_period_end() {
        let sub = subscription(SubscriptionStatus::Active, Some(1_000));
        assert_eq!(effective_tier(Some(&sub), 999, 3), Tier::Pro);
        assert_eq!(effective_tier(Some(&sub), 1_000, 3), Tier::Free);

        let open_ended = subscription(SubscriptionStatus::Trialing, None);
        assert_eq!(effective_tier(Some(&open_ended), i64::MAX - 1, 3), Tier::Pro);
    }

    #[test]
    fn past_due_keeps_tier_during_grace() {
        let sub = subscription(SubscriptionStatus::PastDue, Some(1_000));
        assert_eq!(effective_tier(Some(&sub), 1_000 + 2 * DAY, 3), Tier::Pro);
        assert_eq!(effective_tier(Some(&sub), 1_000 + 3 * DAY, 3), Tier::Free);
        assert_eq!(effective_tier(Some(&subscription(SubscriptionStatus::PastDue, None)), 0, 3), Tier::Free);
    }

    #[test]
    fn canceled_and_incomplete_are_free() {
        for status in [SubscriptionStatus::Canceled, SubscriptionStatus::Incomplete] {
            let sub = subscription(status, Some(i64::MAX));
            assert_eq!(effective_tier(Some(&sub), 0, 3), Tier::Free);
        }
    }

    #[test]
    fn prices_round_trip() {
        let prices = PriceConfig {
            pro_monthly: Some("price_pro_m".into()),
            premium_yearly: Some("price_prem_y".into()),
            ..PriceConfig::default()
        };
        assert_eq!(price_for(&prices, Tier::Pro, BillingInterval::Monthly), Some("price_pro_m"));
        assert_eq!(price_for(&prices, Tier::Pro, BillingInterval::Yearly), None);
        assert_eq!(price_for(&prices, Tier::Free, BillingInterval::Monthly), None);
        assert_eq!(
            plan_for_price(&prices, "price_prem_y"),
            Some((Tier::Premium, BillingInterval::Yearly))
        );
        assert_eq!(plan_for_price(&prices, "unknown"), None);
    }
}
