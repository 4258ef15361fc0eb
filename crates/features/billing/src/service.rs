use crate::Billing;
use crate::error::BillingError;
use crate::model::{
    BillingInterval, CheckoutResponse, Payment, PaymentRow, Subscription, SubscriptionRow,
    SubscriptionStatus, SubscriptionView,
};
use crate::plans::{effective_tier, price_for};
use crate::stripe::CheckoutParams;
use cardly_domain::events::SubscriptionChanged;
use cardly_domain::tier::{Entitlements, Tier};
use cardly_kernel::{safe_nanoid, time};
use tracing::info;

const SUBSCRIPTION_FIELDS: &str = "owner, tier, status, billing_interval, customer_id, \
    subscription_id, current_period_end, cancel_at_period_end, created_at, updated_at";

/// Longest manual grant, in days.
pub const MAX_GRANT_DAYS: u32 = 3_650;

impl Billing {
    pub async fn subscription(&self, owner: &str) -> Result<Option<Subscription>, BillingError> {
        self.find_subscription("owner = $value", owner).await
    }

    pub(crate) async fn find_subscription(
        &self,
        condition: &str,
        value: &str,
    ) -> Result<Option<Subscription>, BillingError> {
        let rows: Vec<SubscriptionRow> = self
            .db
            .query(format!(
                "SELECT {SUBSCRIPTION_FIELDS} FROM subscription WHERE {condition} LIMIT 1"
            ))
            .bind(("value", value.to_owned()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next().map(Subscription::from))
    }

    /// The tier in force for `owner` right now.
    pub async fn effective_tier(&self, owner: &str) -> Result<Tier, BillingError> {
        let subscription = self.subscription(owner).await?;
        Ok(effective_tier(subscription.as_ref(), time::now(), self.config.grace_days))
    }

    pub async fn entitlements(&self, owner: &str) -> Result<Entitlements, BillingError> {
        Ok(Entitlements::for_tier(self.effective_tier(owner).await?))
    }

    pub async fn subscription_view(&self, owner: &str) -> Result<SubscriptionView, BillingError> {
        let subscription = self.subscription(owner).await?;
        Ok(self.view(subscription.as_ref()))
    }

    pub(crate) fn view(&self, subscription: Option<&Subscription>) -> SubscriptionView {
        let effective = effective_tier(subscription, time::now(), self.config.grace_days);
        SubscriptionView {
            tier: subscription.map_or(Tier::Free, |s| s.tier),
            effective_tier: effective,
            status: subscription.map(|s| s.status),
            interval: subscription.and_then(|s| s.interval),
            current_period_end: subscription.and_then(|s| s.current_period_end),
            cancel_at_period_end: subscription.is_some_and(|s| s.cancel_at_period_end),
            entitlements: Entitlements::for_tier(effective).into(),
        }
    }

    /// Starts a provider checkout for a paid tier and returns the hosted page URL.
    pub async fn checkout(
        &self,
        owner: &str,
        tier: Tier,
        interval: BillingInterval,
    ) -> Result<CheckoutResponse, BillingError> {
        if !tier.is_paid() {
            return Err(BillingError::Validation {
                message: "only paid plans can be purchased".into(),
                context: None,
            });
        }
        let stripe = self.stripe.as_ref().ok_or_else(|| BillingError::NotConfigured {
            message: "billing is not configured".into(),
            context: None,
        })?;
        let price = price_for(&self.config.prices, tier, interval).ok_or_else(|| {
            BillingError::NotConfigured {
                message: format!("no price configured for {tier} {interval}").into(),
                context: None,
            }
        })?;

        let existing = self.subscription(owner).await?;
        let session = stripe
            .create_checkout_session(&CheckoutParams {
                user: owner,
                tier: tier.as_str(),
                interval: interval.into(),
                price,
                customer: existing.as_ref().and_then(|s| s.customer_id.as_deref()),
                success_url: &self.config.success_url,
                cancel_url: &self.config.cancel_url,
            })
            .await?;

        let url = session.url.ok_or_else(|| BillingError::Provider {
            message: "checkout session has no URL".into(),
            context: Some(session.id.clone().into()),
        })?;
        info!(owner, %tier, %interval, session = %session.id, "Checkout started");
        Ok(CheckoutResponse { session_id: session.id, url })
    }

    /// Stops renewal at the end of the current period.
    pub async fn cancel(&self, owner: &str) -> Result<SubscriptionView, BillingError> {
        let mut subscription = self
            .subscription(owner)
            .await?
            .filter(|s| s.tier.is_paid() && s.status != SubscriptionStatus::Canceled)
            .ok_or_else(|| BillingError::NotFound {
                message: "no active paid subscription".into(),
                context: None,
            })?;
        if subscription.cancel_at_period_end {
            return Err(BillingError::Conflict {
                message: "subscription is already set to cancel".into(),
                context: None,
            });
        }

        if let (Some(stripe), Some(id)) = (&self.stripe, subscription.subscription_id.as_deref()) {
            stripe.cancel_at_period_end(id).await?;
        }

        subscription.cancel_at_period_end = true;
        subscription.updated_at = time::now();
        self.save(&subscription).await?;
        info!(owner, "Subscription set to cancel at period end");
        Ok(self.view(Some(&subscription)))
    }

    pub async fn payments(&self, owner: &str) -> Result<Vec<Payment>, BillingError> {
        let rows: Vec<PaymentRow> = self
            .db
            .query(
                "SELECT uid, owner, invoice_id, amount, currency, status, created_at FROM payment \
                 WHERE owner = $owner ORDER BY created_at DESC",
            )
            .bind(("owner", owner.to_owned()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(Payment::from).collect())
    }

    /// Support tooling: puts `owner` on `tier` for `days` without a provider subscription.
    /// Granting FREE cancels the current subscription.
    pub async fn grant(
        &self,
        owner: &str,
        tier: Tier,
        days: u32,
    ) -> Result<SubscriptionView, BillingError> {
        if owner.trim().is_empty() {
            return Err(BillingError::Validation {
                message: "user is required".into(),
                context: None,
            });
        }
        if tier.is_paid() && !(1..=MAX_GRANT_DAYS).contains(&days) {
            return Err(BillingError::Validation {
                message: format!("days must be between 1 and {MAX_GRANT_DAYS}").into(),
                context: None,
            });
        }

        let now = time::now();
        let existing = self.subscription(owner).await?;
        let before = effective_tier(existing.as_ref(), now, self.config.grace_days);

        let mut subscription = existing.unwrap_or_else(|| Subscription::new(owner, now));
        subscription.tier = tier;
        subscription.status =
            if tier.is_paid() { SubscriptionStatus::Active } else { SubscriptionStatus::Canceled };
        subscription.interval = None;
        subscription.current_period_end = Some(now + i64::from(days) * time::DAY);
        subscription.cancel_at_period_end = true;
        subscription.updated_at = now;

        self.save(&subscription).await?;
        self.notify_change(&subscription, before)?;
        info!(owner, %tier, days, "Subscription granted");
        Ok(self.view(Some(&subscription)))
    }

    pub(crate) async fn save(&self, subscription: &Subscription) -> Result<(), BillingError> {
        let exists = self.subscription(&subscription.owner).await?.is_some();
        let query = if exists {
            "UPDATE subscription CONTENT $row WHERE owner = $row.owner"
        } else {
            "CREATE subscription CONTENT $row"
        };
        self.db.query(query).bind(("row", SubscriptionRow::from(subscription))).await?.check()?;
        Ok(())
    }

    /// Stores or updates a payment keyed by provider invoice id.
    pub(crate) async fn record_payment(
        &self,
        owner: &str,
        invoice_id: &str,
        amount: i64,
        currency: &str,
        status: &str,
        created_at: i64,
    ) -> Result<(), BillingError> {
        let existing: Vec<String> = self
            .db
            .query("SELECT VALUE uid FROM payment WHERE invoice_id = $invoice")
            .bind(("invoice", invoice_id.to_owned()))
            .await?
            .take(0)?;
        if !existing.is_empty() {
            self.db
                .query("UPDATE payment SET status = $status, amount = $amount WHERE invoice_id = $invoice")
                .bind(("status", status.to_owned()))
                .bind(("amount", amount))
                .bind(("invoice", invoice_id.to_owned()))
                .await?
                .check()?;
            return Ok(());
        }

        let row = PaymentRow {
            uid: safe_nanoid!(),
            owner: owner.to_owned(),
            invoice_id: invoice_id.to_owned(),
            amount,
            currency: currency.to_lowercase(),
            status: status.to_owned(),
            created_at,
        };
        self.db.query("CREATE payment CONTENT $row").bind(("row", row)).await?.check()?;
        Ok(())
    }

    /// Publishes [`SubscriptionChanged`] when the tier in force differs from `before`.
    pub(crate) fn notify_change(
        &self,
        subscription: &Subscription,
        before: Tier,
    ) -> Result<(), BillingError> {
        let after = effective_tier(Some(subscription), time::now(), self.config.grace_days);
        if after != before {
            info!(owner = %subscription.owner, from = %before, to = %after, "Effective tier changed");
            self.events
                .publish(SubscriptionChanged { owner: subscription.owner.clone(), tier: after })?;
        }
        Ok(())
    }
}

impl Subscription {
    pub(crate) fn new(owner: &str, now: i64) -> Self {
        Self {
            owner: owner.to_owned(),
            tier: Tier::Free,
            status: SubscriptionStatus::Incomplete,
            interval: None,
            customer_id: None,
            subscription_id: None,
            current_period_end: None,
            cancel_at_period_end: false,
            created_at: now,
            updated_at: now,
        }
    }
}
