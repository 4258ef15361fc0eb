//! Minimal Stripe-compatible client: checkout sessions, cancellation and webhook signatures.

use crate::error::BillingError;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub(crate) struct StripeClient {
    http: Client,
    secret_key: String,
    api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
}

/// Parameters of a subscription checkout.
#[derive(Debug)]
pub(crate) struct CheckoutParams<'a> {
    pub user: &'a str,
    pub tier: &'a str,
    pub interval: &'a str,
    pub price: &'a str,
    pub customer: Option<&'a str>,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

impl StripeClient {
    pub(crate) fn new(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            secret_key: secret_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_owned(),
        }
    }

    pub(crate) async fn create_checkout_session(
        &self,
        params: &CheckoutParams<'_>,
    ) -> Result<CheckoutSession, BillingError> {
        let mut form = vec![
            ("mode", "subscription".to_owned()),
            ("line_items[0][price]", params.price.to_owned()),
            ("line_items[0][quantity]", "1".to_owned()),
            ("success_url", params.success_url.to_owned()),
            ("cancel_url", params.cancel_url.to_owned()),
            ("client_reference_id", params.user.to_owned()),
            ("metadata[user]", params.user.to_owned()),
            ("metadata[tier]", params.tier.to_owned()),
            ("metadata[interval]", params.interval.to_owned()),
            ("subscription_data[metadata][user]", params.user.to_owned()),
            ("subscription_data[metadata][tier]", params.tier.to_owned()),
        ];
        if let Some(customer) = params.customer {
            form.push(("customer", customer.to_owned()));
        }

        let session: CheckoutSession = self.post("/v1/checkout/sessions", &form).await?;
        debug!(session = %session.id, user = params.user, "Checkout session created");
        Ok(session)
    }

    pub(crate) async fn cancel_at_period_end(
        &self,
        subscription_id: &str,
    ) -> Result<(), BillingError> {
        let path = format!("/v1/subscriptions/{subscription_id}");
        let _: Value = self.post(&path, &[("cancel_at_period_end", "true".to_owned())]).await?;
        Ok(())
    }

    async fn post<T>(&self, path: &str, form: &[(&str, String)]) -> Result<T, BillingError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(format!("{}{path}", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ProviderError>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| format!("HTTP {status}"));
            warn!(%status, path, %message, "Payment provider rejected request");
            return Err(BillingError::Provider {
                message: message.into(),
                context: Some(path.to_owned().into()),
            });
        }
        serde_json::from_slice(&body).map_err(|err| BillingError::Provider {
            message: format!("unexpected response: {err}").into(),
            context: Some(path.to_owned().into()),
        })
    }
}

/// Verifies a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=...]`).
///
/// The expected signature is HMAC-SHA256 of `"{t}.{payload}"` keyed with the endpoint
/// secret; any matching `v1` entry is accepted. `t` must be within `tolerance` seconds of
/// `now`.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: u64,
    now: i64,
) -> Result<(), BillingError> {
    let invalid = |message: &'static str| BillingError::InvalidSignature {
        message: message.into(),
        context: None,
    };

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| invalid("missing timestamp"))?;
    if signatures.is_empty() {
        return Err(invalid("missing v1 signature"));
    }
    if now.abs_diff(timestamp) > tolerance {
        return Err(invalid("timestamp outside tolerance"));
    }

    let matches = signatures.into_iter().filter_map(|sig| hex::decode(sig).ok()).any(|expected| {
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    });

    if matches { Ok(()) } else { Err(invalid("no matching signature")) }
}

/// Builds a header value the way the provider does; used by tests and local tooling.
#[must_use]
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signature = HmacSha256::new_from_slice(secret.as_bytes()).map_or_else(
        |_| String::new(),
        |mut mac| {
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);
            hex::encode(mac.finalize().into_bytes())
        },
    );
    format!("t={timestamp},v1={signature}")
}

/// Envelope of a webhook event; `data.object` stays untyped since its shape depends
/// on `type`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WebhookData {
    pub object: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"invoice.paid"}"#;

    #[test]
    fn accepts_own_signature() {
        let header = sign_payload(PAYLOAD, SECRET, 1_000);
        assert!(verify_signature(PAYLOAD, &header, SECRET, 300, 1_100).is_ok());
    }

    #[test]
    fn accepts_any_matching_v1() {
        let good = sign_payload(PAYLOAD, SECRET, 1_000);
        let sig = good.split_once("v1=").unwrap().1;
        let header = format!("t=1000,v1={},v1={sig}", "00".repeat(32));
        assert!(verify_signature(PAYLOAD, &header, SECRET, 300, 1_000).is_ok());
    }

    #[test]
    fn rejects_tampering_and_stale_timestamps() {
        let header = sign_payload(PAYLOAD, SECRET, 1_000);
        assert!(verify_signature(b"{}", &header, SECRET, 300, 1_000).is_err());
        assert!(verify_signature(PAYLOAD, &header, "other", 300, 1_000).is_err());
        assert!(verify_signature(PAYLOAD, &header, SECRET, 300, 1_301).is_err());
        assert!(verify_signature(PAYLOAD, &header, SECRET, 300, 699).is_err());
    }

    #[test]
    fn rejects_malformed_headers() {
        for header in ["", "t=abc,v1=00", "v1=00", "t=1000", "t=1000,v1=zz"] {
            assert!(
                matches!(
                    verify_signature(PAYLOAD, header, SECRET, 300, 1_000),
                    Err(BillingError::InvalidSignature { .. })
                ),
                "{header}"
            );
        }
    }
}
