//! Provider webhook processing. Events are verified, deduplicated by id and folded into
//! the local subscription state.

use crate::Billing;
use crate::error::BillingError;
use crate::model::{BillingInterval, Subscription, SubscriptionStatus, WebhookEventRow};
use crate::plans::{effective_tier, plan_for_price};
use crate::stripe::{WebhookEvent, verify_signature};
use cardly_domain::tier::Tier;
use cardly_kernel::time;
use serde_json::Value;
use tracing::{debug, info, warn};

fn text<'a>(object: &'a Value, pointer: &str) -> Option<&'a str> {
    object.pointer(pointer).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn number(object: &Value, pointer: &str) -> Option<i64> {
    object.pointer(pointer).and_then(Value::as_i64)
}

impl Billing {
    /// Verifies and applies one webhook delivery.
    ///
    /// Returns `false` when the event id was already processed. Unknown event types are
    /// recorded and acknowledged without effect.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<bool, BillingError> {
        let secret = self.config.webhook_secret.as_deref().filter(|s| !s.is_empty()).ok_or_else(
            || BillingError::NotConfigured {
                message: "webhook secret is not configured".into(),
                context: None,
            },
        )?;
        let header = signature.ok_or_else(|| BillingError::InvalidSignature {
            message: "missing Stripe-Signature header".into(),
            context: None,
        })?;
        verify_signature(payload, header, secret, self.config.webhook_tolerance_seconds, time::now())?;

        let event: WebhookEvent = serde_json::from_slice(payload)?;
        if self.is_processed(&event.id).await? {
            info!(event = %event.id, kind = %event.kind, "Webhook already processed");
            return Ok(false);
        }

        let object = &event.data.object;
        match event.kind.as_str() {
            "checkout.session.completed" => self.on_checkout_completed(object).await?,
            "customer.subscription.updated" => self.on_subscription_updated(object, false).await?,
            "customer.subscription.deleted" => self.on_subscription_updated(object, true).await?,
            "invoice.paid" => self.on_invoice(object, true).await?,
            "invoice.payment_failed" => self.on_invoice(object, false).await?,
            other => debug!(event = %event.id, kind = other, "Ignoring webhook event"),
        }

        self.mark_processed(&event).await?;
        info!(event = %event.id, kind = %event.kind, "Webhook processed");
        Ok(true)
    }

    async fn is_processed(&self, event_id: &str) -> Result<bool, BillingError> {
        let ids: Vec<String> = self
            .db
            .query("SELECT VALUE event_id FROM webhook_event WHERE event_id = $id")
            .bind(("id", event_id.to_owned()))
            .await?
            .take(0)?;
        Ok(!ids.is_empty())
    }

    async fn mark_processed(&self, event: &WebhookEvent) -> Result<(), BillingError> {
        let row = WebhookEventRow {
            event_id: event.id.clone(),
            event_type: event.kind.clone(),
            processed_at: time::now(),
        };
        self.db.query("CREATE webhook_event CONTENT $row").bind(("row", row)).await?.check()?;
        Ok(())
    }

    /// Finds the local subscription an object refers to: provider subscription id first,
    /// then the user recorded in metadata, then the customer id.
    async fn locate(
        &self,
        subscription_id: Option<&str>,
        user: Option<&str>,
        customer_id: Option<&str>,
    ) -> Result<Option<Subscription>, BillingError> {
        if let Some(id) = subscription_id
            && let Some(found) = self.find_subscription("subscription_id = $value", id).await?
        {
            return Ok(Some(found));
        }
        if let Some(user) = user
            && let Some(found) = self.subscription(user).await?
        {
            return Ok(Some(found));
        }
        if let Some(customer) = customer_id {
            return self.find_subscription("customer_id = $value", customer).await;
        }
        Ok(None)
    }

    async fn on_checkout_completed(&self, object: &Value) -> Result<(), BillingError> {
        let Some(owner) = text(object, "/metadata/user").or_else(|| text(object, "/client_reference_id"))
        else {
            warn!("Checkout completed without a user reference");
            return Ok(());
        };
        let Some(tier) = text(object, "/metadata/tier").and_then(|t| t.parse::<Tier>().ok()) else {
            warn!(owner, "Checkout completed without a valid tier");
            return Ok(());
        };

        let now = time::now();
        let existing = self.subscription(owner).await?;
        let before = effective_tier(existing.as_ref(), now, self.config.grace_days);

        let mut subscription = existing.unwrap_or_else(|| Subscription::new(owner, now));
        subscription.tier = tier;
        subscription.status = SubscriptionStatus::Active;
        subscription.interval =
            text(object, "/metadata/interval").and_then(|i| i.parse::<BillingInterval>().ok());
        subscription.customer_id = text(object, "/customer").map(str::to_owned).or(subscription.customer_id);
        subscription.subscription_id = text(object, "/subscription").map(str::to_owned);
        subscription.current_period_end = None;
        subscription.cancel_at_period_end = false;
        subscription.updated_at = now;

        self.save(&subscription).await?;
        self.notify_change(&subscription, before)
    }

    async fn on_subscription_updated(&self, object: &Value, deleted: bool) -> Result<(), BillingError> {
        let provider_id = text(object, "/id");
        let Some(mut subscription) = self
            .locate(provider_id, text(object, "/metadata/user"), text(object, "/customer"))
            .await?
        else {
            warn!(subscription = ?provider_id, "Subscription event for unknown subscription");
            return Ok(());
        };

        let now = time::now();
        let before = effective_tier(Some(&subscription), now, self.config.grace_days);

        let plan = text(object, "/items/data/0/price/id")
            .and_then(|price| plan_for_price(&self.config.prices, price));
        if let Some((tier, interval)) = plan {
            subscription.tier = tier;
            subscription.interval = Some(interval);
        } else if let Some(tier) = text(object, "/metadata/tier").and_then(|t| t.parse().ok()) {
            subscription.tier = tier;
        }

        subscription.status = if deleted {
            SubscriptionStatus::Canceled
        } else {
            text(object, "/status").map_or(subscription.status, SubscriptionStatus::from_provider)
        };
        subscription.subscription_id = provider_id.map(str::to_owned).or(subscription.subscription_id);
        subscription.current_period_end = number(object, "/current_period_end")
            .or_else(|| number(object, "/items/data/0/current_period_end"))
            .or(subscription.current_period_end);
        subscription.cancel_at_period_end = !deleted
            && object.pointer("/cancel_at_period_end").and_then(Value::as_bool).unwrap_or(false);
        subscription.updated_at = now;

        self.save(&subscription).await?;
        self.notify_change(&subscription, before)
    }

    async fn on_invoice(&self, object: &Value, paid: bool) -> Result<(), BillingError> {
        let Some(invoice_id) = text(object, "/id") else {
            warn!("Invoice event without id");
            return Ok(());
        };
        let provider_subscription = text(object, "/subscription")
            .or_else(|| text(object, "/parent/subscription_details/subscription"));
        let user = text(object, "/subscription_details/metadata/user")
            .or_else(|| text(object, "/parent/subscription_details/metadata/user"));

        let Some(mut subscription) =
            self.locate(provider_subscription, user, text(object, "/customer")).await?
        else {
            warn!(invoice = invoice_id, "Invoice for unknown subscription");
            return Ok(());
        };

        let now = time::now();
        let amount = if paid {
            number(object, "/amount_paid")
        } else {
            number(object, "/amount_due")
        };
        self.record_payment(
            &subscription.owner,
            invoice_id,
            amount.unwrap_or_default(),
            text(object, "/currency").unwrap_or("usd"),
            if paid { "paid" } else { "failed" },
            number(object, "/created").unwrap_or(now),
        )
        .await?;

        let before = effective_tier(Some(&subscription), now, self.config.grace_days);
        if paid {
            subscription.status = SubscriptionStatus::Active;
            if let Some(end) = number(object, "/lines/data/0/period/end") {
                subscription.current_period_end = Some(end);
            }
        } else {
            subscription.status = SubscriptionStatus::PastDue;
        }
        subscription.updated_at = now;

        self.save(&subscription).await?;
        self.notify_change(&subscription, before)
    }
}
