use axum::routing::post;
use axum::{Json, Router};
use cardly_billing::{
    Billing, BillingError, BillingInterval, MIGRATIONS, SubscriptionStatus, init, sign_payload,
};
use cardly_database::Database;
use cardly_domain::config::ApiConfig;
use cardly_domain::events::SubscriptionChanged;
use cardly_domain::tier::Tier;
use cardly_event_bus::EventBus;
use cardly_kernel::mail::Mailer;
use cardly_kernel::server::SliceContext;
use cardly_kernel::time;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

const WEBHOOK_SECRET: &str = "whsec_test";

async fn billing(name: &str, configure: impl FnOnce(&mut ApiConfig)) -> (Billing, EventBus) {
    let database = Database::builder()
        .url("mem://")
        .session("billing", name)
        .migrations(MIGRATIONS.iter().copied())
        .init()
        .await
        .unwrap();
    let mut config = ApiConfig::default();
    config.billing.webhook_secret = Some(WEBHOOK_SECRET.into());
    configure(&mut config);
    let events = EventBus::new();
    let billing =
        init(&SliceContext { config, database, events: events.clone(), mailer: Mailer::log() });
    (billing, events)
}

async fn deliver(billing: &Billing, event: &Value) -> Result<bool, BillingError> {
    let payload = serde_json::to_vec(event).unwrap();
    let header = sign_payload(&payload, WEBHOOK_SECRET, time::now());
    billing.handle_webhook(&payload, Some(&header)).await
}

fn checkout_completed(id: &str, user: &str, tier: &str) -> Value {
    json!({
        "id": id,
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_1",
            "customer": "cus_1",
            "subscription": "sub_1",
            "client_reference_id": user,
            "metadata": { "user": user, "tier": tier, "interval": "monthly" }
        }}
    })
}

#[tokio::test]
async fn users_without_subscription_are_free() {
    let (billing, _) = billing("free", |_| {}).await;
    assert_eq!(billing.effective_tier("nobody").await.unwrap(), Tier::Free);
    let view = billing.subscription_view("nobody").await.unwrap();
    assert_eq!(view.effective_tier, Tier::Free);
    assert!(view.status.is_none());
    assert_eq!(view.entitlements.max_cards, 1);
}

#[tokio::test]
async fn grant_changes_tier_and_publishes() {
    let (billing, events) = billing("grant", |_| {}).await;
    let mut rx = events.subscribe::<SubscriptionChanged>().unwrap();

    let view = billing.grant("u1", Tier::Premium, 30).await.unwrap();
    assert_eq!(view.effective_tier, Tier::Premium);
    assert_eq!(billing.effective_tier("u1").await.unwrap(), Tier::Premium);
    let event = rx.try_recv().unwrap();
    assert_eq!(*event, SubscriptionChanged { owner: "u1".into(), tier: Tier::Premium });

    billing.grant("u1", Tier::Free, 0).await.unwrap();
    assert_eq!(billing.effective_tier("u1").await.unwrap(), Tier::Free);
    assert_eq!(rx.try_recv().unwrap().tier, Tier::Free);

    let err = billing.grant("u1", Tier::Pro, 0).await.unwrap_err();
    assert!(matches!(err, BillingError::Validation { .. }));
}

#[tokio::test]
async fn webhook_lifecycle() {
    let (billing, events) = billing("webhook", |_| {}).await;
    let mut rx = events.subscribe::<SubscriptionChanged>().unwrap();

    assert!(deliver(&billing, &checkout_completed("evt_1", "u1", "PRO")).await.unwrap());
    assert_eq!(billing.effective_tier("u1").await.unwrap(), Tier::Pro);
    assert_eq!(rx.try_recv().unwrap().tier, Tier::Pro);

    // Redelivery is acknowledged without reprocessing.
    assert!(!deliver(&billing, &checkout_completed("evt_1", "u1", "PRO")).await.unwrap());

    let period_end = time::now() + 30 * time::DAY;
    let paid = json!({
        "id": "evt_2",
        "type": "invoice.paid",
        "data": { "object": {
            "id": "in_1", "customer": "cus_1", "subscription": "sub_1",
            "amount_paid": 900, "currency": "USD", "created": 1_700_000_000,
            "lines": { "data": [ { "period": { "end": period_end } } ] }
        }}
    });
    assert!(deliver(&billing, &paid).await.unwrap());
    let payments = billing.payments("u1").await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!((payments[0].amount, payments[0].currency.as_str()), (900, "usd"));
    let sub = billing.subscription("u1").await.unwrap().unwrap();
    assert_eq!(sub.current_period_end, Some(period_end));
    assert_eq!(sub.interval, Some(BillingInterval::Monthly));

    let failed = json!({
        "id": "evt_3",
        "type": "invoice.payment_failed",
        "data": { "object": {
            "id": "in_2", "customer": "cus_1", "subscription": "sub_1",
            "amount_due": 900, "currency": "usd", "created": 1_700_100_000
        }}
    });
    assert!(deliver(&billing, &failed).await.unwrap());
    let sub = billing.subscription("u1").await.unwrap().unwrap();
    assert_eq!(sub.status, SubscriptionStatus::PastDue);
    assert_eq!(billing.effective_tier("u1").await.unwrap(), Tier::Pro, "grace period");
    assert_eq!(billing.payments("u1").await.unwrap().len(), 2);

    let deleted = json!({
        "id": "evt_4",
        "type": "customer.subscription.deleted",
        "data": { "object": { "id": "sub_1", "customer": "cus_1", "status": "canceled" } }
    });
    assert!(deliver(&billing, &deleted).await.unwrap());
    assert_eq!(billing.effective_tier("u1").await.unwrap(), Tier::Free);
    assert_eq!(rx.try_recv().unwrap().tier, Tier::Free);
}

#[tokio::test]
async fn subscription_update_maps_prices_to_tiers() {
    let (billing, _) = billing("update", |config| {
        config.billing.prices.premium_yearly = Some("price_premium_y".into());
    })
    .await;
    deliver(&billing, &checkout_completed("evt_1", "u1", "PRO")).await.unwrap();

    let updated = json!({
        "id": "evt_2",
        "type": "customer.subscription.updated",
        "data": { "object": {
            "id": "sub_1", "customer": "cus_1", "status": "active",
            "cancel_at_period_end": true,
            "items": { "data": [ {
                "price": { "id": "price_premium_y" },
                "current_period_end": time::now() + 365 * time::DAY
            } ] }
        }}
    });
    deliver(&billing, &updated).await.unwrap();

    let view = billing.subscription_view("u1").await.unwrap();
    assert_eq!(view.effective_tier, Tier::Premium);
    assert_eq!(view.interval, Some(BillingInterval::Yearly));
    assert!(view.cancel_at_period_end);
}

#[tokio::test]
async fn unknown_events_are_acknowledged() {
    let (billing, _) = billing("unknown", |_| {}).await;
    let event = json!({ "id": "evt_9", "type": "customer.created", "data": { "object": {} } });
    assert!(deliver(&billing, &event).await.unwrap());
    assert!(!deliver(&billing, &event).await.unwrap());
}

#[tokio::test]
async fn bad_signatures_are_rejected() {
    let (billing, _) = billing("signature", |_| {}).await;
    let payload = serde_json::to_vec(&checkout_completed("evt_1", "u1", "PRO")).unwrap();

    let forged = sign_payload(&payload, "whsec_other", time::now());
    let err = billing.handle_webhook(&payload, Some(&forged)).await.unwrap_err();
    assert!(matches!(err, BillingError::InvalidSignature { .. }));

    let err = billing.handle_webhook(&payload, None).await.unwrap_err();
    assert!(matches!(err, BillingError::InvalidSignature { .. }));
    assert_eq!(billing.effective_tier("u1").await.unwrap(), Tier::Free);
}

#[tokio::test]
async fn checkout_requires_configuration_and_a_paid_tier() {
    let (billing, _) = billing("checkout-off", |_| {}).await;
    let err = billing.checkout("u1", Tier::Pro, BillingInterval::Monthly).await.unwrap_err();
    assert!(matches!(err, BillingError::NotConfigured { .. }));
    let err = billing.checkout("u1", Tier::Free, BillingInterval::Monthly).await.unwrap_err();
    assert!(matches!(err, BillingError::Validation { .. }));
}

async fn fake_provider() -> (String, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();
    let app = Router::new().route(
        "/v1/checkout/sessions",
        post(move |body: String| {
            let recorded = recorded.clone();
            async move {
                recorded.lock().unwrap().push(body);
                Json(json!({ "id": "cs_test_1", "url": "https://checkout.example/cs_test_1" }))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{address}"), seen)
}

#[tokio::test]
async fn checkout_creates_a_provider_session() {
    let (api_base, seen) = fake_provider().await;
    let (billing, _) = billing("checkout-on", |config| {
        config.billing.stripe_secret_key = Some("sk_test".into());
        config.billing.api_base = api_base;
        config.billing.prices.pro_monthly = Some("price_pro_m".into());
    })
    .await;

    let response = billing.checkout("u1", Tier::Pro, BillingInterval::Monthly).await.unwrap();
    assert_eq!(response.session_id, "cs_test_1");
    assert_eq!(response.url, "https://checkout.example/cs_test_1");

    let bodies = seen.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert!(bodies[0].contains("mode=subscription"));
    assert!(bodies[0].contains("metadata%5Buser%5D=u1"));
    assert!(bodies[0].contains("metadata%5Btier%5D=PRO"));
    assert!(bodies[0].contains("price_pro_m"));

    let err = billing.checkout("u1", Tier::Pro, BillingInterval::Yearly).await.unwrap_err();
    assert!(matches!(err, BillingError::NotConfigured { .. }));
}

#[tokio::test]
async fn cancel_marks_period_end() {
    let (billing, _) = billing("cancel", |_| {}).await;
    let err = billing.cancel("u1").await.unwrap_err();
    assert!(matches!(err, BillingError::NotFound { .. }));

    deliver(&billing, &checkout_completed("evt_1", "u1", "PREMIUM")).await.unwrap();
    let view = billing.cancel("u1").await.unwrap();
    assert!(view.cancel_at_period_end);
    assert_eq!(view.effective_tier, Tier::Premium);

    let err = billing.cancel("u1").await.unwrap_err();
    assert!(matches!(err, BillingError::Conflict { .. }));
}
