use cardly_analytics::{Analytics, AnalyticsError, EventKind, IngestEvent, MAX_BATCH, MIGRATIONS, init};
use cardly_billing::Billing;
use cardly_cards::{Cards, CreateCardRequest};
use cardly_database::Database;
use cardly_domain::config::ApiConfig;
use cardly_domain::events::{CardTapped, ContactCaptured};
use cardly_domain::tier::Tier;
use cardly_event_bus::EventBus;
use cardly_kernel::mail::Mailer;
use cardly_kernel::server::SliceContext;
use cardly_kernel::time;
use std::time::Duration;

struct Harness {
    analytics: Analytics,
    cards: Cards,
    billing: Billing,
    events: EventBus,
}

async fn harness(name: &str) -> Harness {
    let database = Database::builder()
        .url("mem://")
        .session("analytics", name)
        .migrations(
            cardly_settings::MIGRATIONS
                .iter()
                .chain(cardly_billing::MIGRATIONS)
                .chain(cardly_cards::MIGRATIONS)
                .chain(MIGRATIONS)
                .copied(),
        )
        .init()
        .await
        .unwrap();
    let events = EventBus::new();
    let ctx = SliceContext { config: ApiConfig::default(), database, events: events.clone(), mailer: Mailer::log() };
    let settings = cardly_settings::init(&ctx);
    let billing = cardly_billing::init(&ctx);
    let cards = cardly_cards::init(&ctx, billing.clone(), settings);
    let analytics = init(&ctx, cards.clone(), billing.clone());
    Harness { analytics, cards, billing, events }
}

async fn published_card(h: &Harness, owner: &str, slug: &str) -> String {
    let request = CreateCardRequest { slug: slug.into(), title: "Card".into(), headline: None, accent_color: None };
    let card = h.cards.create_card(owner, request).await.unwrap().card;
    h.cards.set_published(owner, &card.id, true).await.unwrap();
    card.id
}

fn event(slug: &str, kind: EventKind, occurred_at: Option<i64>) -> IngestEvent {
    IngestEvent { slug: slug.into(), kind, target: None, session: Some("s1".into()), occurred_at }
}

#[tokio::test]
async fn ingest_accepts_known_cards_and_recent_events() {
    let h = harness("ingest").await;
    let card = published_card(&h, "u1", "ingest").await;
    let now = time::now();

    let response = h
        .analytics
        .ingest(vec![
            event("ingest", EventKind::Share, None),
            event("ingest", EventKind::Vcard, Some(now - time::HOUR)),
            event("ingest", EventKind::View, Some(now + time::DAY)),
            event("ingest", EventKind::View, Some(now - 8 * time::DAY)),
            event("nobody", EventKind::View, None),
        ])
        .await
        .unwrap();
    assert_eq!((response.accepted, response.rejected), (3, 2));

    let summary = h.analytics.summary("u1", &card, Some(7)).await.unwrap();
    assert_eq!(summary.totals.share, 1);
    assert_eq!(summary.totals.vcard, 1);
    assert_eq!(summary.totals.view, 1, "future event clamped to now");
    assert_eq!(summary.unique_sessions, 1);
}

#[tokio::test]
async fn extreme_timestamps_are_rejected_not_stored() {
    let h = harness("extreme").await;
    let card = published_card(&h, "u1", "extreme").await;

    let response = h
        .analytics
        .ingest(vec![
            event("extreme", EventKind::View, Some(i64::MIN)),
            event("extreme", EventKind::Click, Some(i64::MIN + 1)),
            event("extreme", EventKind::Share, Some(i64::MAX)),
        ])
        .await
        .unwrap();
    assert_eq!((response.accepted, response.rejected), (1, 2));

    let summary = h.analytics.summary("u1", &card, Some(7)).await.unwrap();
    assert_eq!((summary.totals.view, summary.totals.click, summary.totals.share), (0, 0, 1));
}

#[tokio::test]
async fn oversized_batches_are_rejected() {
    let h = harness("batch").await;
    let events = (0..=MAX_BATCH).map(|_| event("x", EventKind::View, None)).collect();
    let err = h.analytics.ingest(events).await.unwrap_err();
    assert!(matches!(err, AnalyticsError::Validation { .. }));
}

#[tokio::test]
async fn summary_days_follow_the_plan() {
    let h = harness("days").await;
    let card = published_card(&h, "u1", "days").await;

    let summary = h.analytics.summary("u1", &card, Some(365)).await.unwrap();
    assert_eq!(summary.days, 7);
    assert_eq!(summary.series.len(), 7);
    assert_eq!(summary.series.last().unwrap().date, time::day_label(time::day_index(time::now())));

    h.billing.grant("u1", Tier::Pro, 30).await.unwrap();
    assert_eq!(h.analytics.summary("u1", &card, Some(365)).await.unwrap().days, 90);
    assert_eq!(h.analytics.summary("u1", &card, Some(0)).await.unwrap().days, 1);

    let err = h.analytics.summary("u2", &card, None).await.unwrap_err();
    assert!(matches!(err, AnalyticsError::NotFound { .. }));
}

#[tokio::test]
async fn bus_events_are_recorded() {
    let h = harness("listeners").await;
    let card = published_card(&h, "u1", "bus").await;
    let _listeners = h.analytics.listen().unwrap();

    h.cards.view_page("bus", Some("visitor".into())).await.unwrap();
    h.events
        .publish(CardTapped { card: card.clone(), owner: "u1".into(), tag: "04A22BC1".into(), occurred_at: time::now() })
        .unwrap();
    h.events
        .publish(ContactCaptured { card: card.clone(), owner: "u1".into(), contact: "c1".into(), occurred_at: time::now() })
        .unwrap();

    let mut recorded = false;
    for _ in 0..50 {
        let totals = h.analytics.summary("u1", &card, None).await.unwrap().totals;
        if totals.view == 1 && totals.tap == 1 && totals.contact == 1 {
            recorded = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(recorded, "listeners should record view, tap and contact events");
}
