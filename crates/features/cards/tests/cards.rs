use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use cardly_billing::Billing;
use cardly_cards::{
    AddComponentRequest, Cards, CardsError, CreateCardRequest, MIGRATIONS, UpdateCardRequest,
    UpdateComponentRequest, init, router,
};
use cardly_database::Database;
use cardly_domain::component::ComponentKind;
use cardly_domain::config::ApiConfig;
use cardly_domain::events::{CardViewed, LinkClicked};
use cardly_domain::registry::InitializedSlice;
use cardly_domain::tier::Tier;
use cardly_event_bus::EventBus;
use cardly_kernel::mail::Mailer;
use cardly_kernel::server::{ApiState, SliceContext};
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;

struct Harness {
    cards: Cards,
    billing: Billing,
    events: EventBus,
    ctx: SliceContext,
}

async fn harness(name: &str) -> Harness {
    let database = Database::builder()
        .url("mem://")
        .session("cards", name)
        .migrations(
            cardly_settings::MIGRATIONS
                .iter()
                .chain(cardly_billing::MIGRATIONS)
                .chain(MIGRATIONS)
                .copied(),
        )
        .init()
        .await
        .unwrap();
    let events = EventBus::new();
    let ctx = SliceContext {
        config: ApiConfig::default(),
        database,
        events: events.clone(),
        mailer: Mailer::log(),
    };
    let billing = cardly_billing::init(&ctx);
    let settings = cardly_settings::init(&ctx);
    let cards = init(&ctx, billing.clone(), settings);
    Harness { cards, billing, events, ctx }
}

fn new_card(slug: &str) -> CreateCardRequest {
    CreateCardRequest { slug: slug.into(), title: "Jane Doe".into(), headline: None, accent_color: None }
}

fn component(kind: ComponentKind, content: Value) -> AddComponentRequest {
    AddComponentRequest { kind, title: None, content }
}

async fn add(h: &Harness, owner: &str, card: &str, request: AddComponentRequest) -> Result<String, CardsError> {
    let added = h
        .cards
        .add_component(owner, card, request.kind, request.title.as_deref(), request.content)
        .await?;
    Ok(added.id)
}

#[tokio::test]
async fn create_card_starts_with_a_profile_component() {
    let h = harness("create").await;
    let detail = h.cards.create_card("u1", new_card(" Jane-Doe ")).await.unwrap();

    assert_eq!(detail.card.slug, "jane-doe");
    assert!(!detail.card.published);
    assert_eq!(detail.card.url, "http://localhost:8080/c/jane-doe");
    assert_eq!(detail.components.len(), 1);
    assert_eq!(detail.components[0].kind, ComponentKind::Profile);
    assert_eq!(detail.components[0].position, 0);
}

#[tokio::test]
async fn slugs_are_unique_and_validated() {
    let h = harness("slugs").await;
    h.billing.grant("u1", Tier::Pro, 30).await.unwrap();
    h.cards.create_card("u1", new_card("jane")).await.unwrap();

    let err = h.cards.create_card("u2", new_card("JANE")).await.unwrap_err();
    assert!(matches!(err, CardsError::Conflict { .. }));
    let err = h.cards.create_card("u1", new_card("a!")).await.unwrap_err();
    assert!(matches!(err, CardsError::Validation { .. }));
}

#[tokio::test]
async fn card_limit_follows_the_tier() {
    let h = harness("limit").await;
    h.cards.create_card("u1", new_card("first")).await.unwrap();
    let err = h.cards.create_card("u1", new_card("second")).await.unwrap_err();
    assert!(matches!(err, CardsError::Entitlement { .. }));

    h.billing.grant("u1", Tier::Pro, 30).await.unwrap();
    h.cards.create_card("u1", new_card("second")).await.unwrap();
    assert_eq!(h.cards.list_cards("u1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn cards_are_private_to_their_owner() {
    let h = harness("owner").await;
    let card = h.cards.create_card("u1", new_card("mine")).await.unwrap().card;

    let err = h.cards.get_card("u2", &card.id).await.unwrap_err();
    assert!(matches!(err, CardsError::NotFound { .. }));
    let err = h.cards.delete_card("u2", &card.id).await.unwrap_err();
    assert!(matches!(err, CardsError::NotFound { .. }));
    assert!(h.cards.list_cards("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_and_delete_card() {
    let h = harness("update").await;
    let card = h.cards.create_card("u1", new_card("before")).await.unwrap().card;

    let update = UpdateCardRequest {
        slug: Some("after".into()),
        headline: Some("Engineer".into()),
        accent_color: Some("#AABBCC".into()),
        ..UpdateCardRequest::default()
    };
    let updated = h.cards.update_card("u1", &card.id, update).await.unwrap();
    assert_eq!(updated.slug, "after");
    assert_eq!(updated.headline.as_deref(), Some("Engineer"));
    assert_eq!(updated.accent_color.as_deref(), Some("#aabbcc"));
    assert!(h.cards.find_by_slug("before").await.unwrap().is_none());

    h.cards.delete_card("u1", &card.id).await.unwrap();
    assert!(h.cards.find_by_slug("after").await.unwrap().is_none());
    assert!(h.cards.components(&card.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn component_kinds_and_counts_are_gated_by_tier() {
    let h = harness("gating").await;
    let card = h.cards.create_card("u1", new_card("gated")).await.unwrap().card;

    let err = add(&h, "u1", &card.id, component(ComponentKind::Video, json!({ "url": "https://v.example/1" })))
        .await
        .unwrap_err();
    assert!(matches!(err, CardsError::Entitlement { .. }));

    for i in 0..4 {
        add(&h, "u1", &card.id, component(ComponentKind::Text, json!({ "body": format!("t{i}") })))
            .await
            .unwrap();
    }
    let err = add(&h, "u1", &card.id, component(ComponentKind::Text, json!({ "body": "one more" })))
        .await
        .unwrap_err();
    assert!(matches!(err, CardsError::Entitlement { .. }));

    let catalog = h.cards.catalog("u1").await.unwrap();
    let video = catalog.iter().find(|e| e.kind == ComponentKind::Video).unwrap();
    assert!(!video.allowed);
    assert_eq!(video.min_tier, Tier::Pro);
}

#[tokio::test]
async fn component_content_is_validated() {
    let h = harness("content").await;
    let card = h.cards.create_card("u1", new_card("content")).await.unwrap().card;

    let err = add(&h, "u1", &card.id, component(ComponentKind::Links, json!({ "items": [{ "label": "x", "url": "ftp://x" }] })))
        .await
        .unwrap_err();
    assert!(matches!(err, CardsError::Validation { .. }));

    let id = add(&h, "u1", &card.id, component(ComponentKind::Text, json!({ "body": "hello" })))
        .await
        .unwrap();
    let request = UpdateComponentRequest { title: None, content: Some(json!({ "body": "" })), enabled: None };
    let err = h.cards.update_component("u1", &card.id, &id, request).await.unwrap_err();
    assert!(matches!(err, CardsError::Validation { .. }));
}

#[tokio::test]
async fn reorder_requires_a_permutation() {
    let h = harness("reorder").await;
    let detail = h.cards.create_card("u1", new_card("order")).await.unwrap();
    let card = detail.card.id;
    let profile = detail.components[0].id.clone();
    let text = add(&h, "u1", &card, component(ComponentKind::Text, json!({ "body": "a" }))).await.unwrap();
    let contact = add(&h, "u1", &card, component(ComponentKind::Contact, json!({ "email": "j@example.com" })))
        .await
        .unwrap();

    let ordered = h
        .cards
        .reorder_components("u1", &card, vec![contact.clone(), profile.clone(), text.clone()])
        .await
        .unwrap();
    let ids: Vec<&str> = ordered.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, [contact.as_str(), profile.as_str(), text.as_str()]);
    assert_eq!(ordered.iter().map(|c| c.position).collect::<Vec<_>>(), [0, 1, 2]);

    let err = h.cards.reorder_components("u1", &card, vec![contact.clone(), profile.clone()]).await.unwrap_err();
    assert!(matches!(err, CardsError::Validation { .. }));
    let err = h
        .cards
        .reorder_components("u1", &card, vec![contact.clone(), contact.clone(), text.clone()])
        .await
        .unwrap_err();
    assert!(matches!(err, CardsError::Validation { .. }));

    h.cards.remove_component("u1", &card, &profile).await.unwrap();
    let remaining = h.cards.components(&card).await.unwrap();
    assert_eq!(remaining.iter().map(|c| c.position).collect::<Vec<_>>(), [0, 1]);
    assert_eq!(remaining[0].id, contact);
}

#[tokio::test]
async fn unpublished_cards_are_not_public() {
    let h = harness("unpublished").await;
    let card = h.cards.create_card("u1", new_card("hidden")).await.unwrap().card;

    let err = h.cards.public_card("hidden").await.unwrap_err();
    assert!(matches!(err, CardsError::NotFound { .. }));

    h.cards.set_published("u1", &card.id, true).await.unwrap();
    let (_, public) = h.cards.public_card("hidden").await.unwrap();
    assert_eq!(public.title, "Jane Doe");
    assert!(public.branding);
}

#[tokio::test]
async fn public_view_hides_disabled_components_and_records_the_visit() {
    let h = harness("view").await;
    let mut views = h.events.subscribe::<CardViewed>().unwrap();
    let card = h.cards.create_card("u1", new_card("viewed")).await.unwrap().card;
    let text = add(&h, "u1", &card.id, component(ComponentKind::Text, json!({ "body": "secret note" })))
        .await
        .unwrap();
    let disable = UpdateComponentRequest { title: None, content: None, enabled: Some(false) };
    h.cards.update_component("u1", &card.id, &text, disable).await.unwrap();
    h.cards.set_published("u1", &card.id, true).await.unwrap();

    let html = h.cards.view_page("viewed", Some("s-1".into())).await.unwrap();
    assert!(html.contains("Jane Doe"));
    assert!(!html.contains("secret note"));

    let event = views.try_recv().unwrap();
    assert_eq!(event.card, card.id);
    assert_eq!(event.owner, "u1");
    assert_eq!(event.session.as_deref(), Some("s-1"));
}

#[tokio::test]
async fn outbound_links_must_be_on_the_card() {
    let h = harness("outbound").await;
    let mut clicks = h.events.subscribe::<LinkClicked>().unwrap();
    let card = h.cards.create_card("u1", new_card("links")).await.unwrap().card;
    let links = json!({ "items": [{ "label": "Site", "url": "https://jane.example" }] });
    add(&h, "u1", &card.id, component(ComponentKind::Links, links)).await.unwrap();
    h.cards.set_published("u1", &card.id, true).await.unwrap();

    let target = h.cards.follow_link("links", "https://jane.example", None).await.unwrap();
    assert_eq!(target, "https://jane.example");
    assert_eq!(clicks.try_recv().unwrap().target, "https://jane.example");

    let err = h.cards.follow_link("links", "https://evil.example", None).await.unwrap_err();
    assert!(matches!(err, CardsError::NotFound { .. }));
}

#[tokio::test]
async fn vcard_contains_contact_details() {
    let h = harness("vcard").await;
    let detail = h.cards.create_card("u1", new_card("vcard")).await.unwrap();
    let profile = detail.components[0].id.clone();
    let content = json!({ "name": "Jane Doe", "company": "Acme" });
    let request = UpdateComponentRequest { title: None, content: Some(content), enabled: None };
    h.cards.update_component("u1", &detail.card.id, &profile, request).await.unwrap();
    add(&h, "u1", &detail.card.id, component(ComponentKind::Contact, json!({ "email": "jane@example.com" })))
        .await
        .unwrap();
    h.cards.set_published("u1", &detail.card.id, true).await.unwrap();

    let vcard = h.cards.vcard("vcard").await.unwrap();
    assert!(vcard.starts_with("BEGIN:VCARD\r\n"));
    assert!(vcard.contains("FN:Jane Doe\r\n"));
    assert!(vcard.contains("ORG:Acme\r\n"));
    assert!(vcard.contains("EMAIL;TYPE=INTERNET:jane@example.com\r\n"));
}

#[tokio::test]
async fn downgrade_disables_what_the_tier_no_longer_covers() {
    let h = harness("enforce").await;
    h.billing.grant("u1", Tier::Premium, 30).await.unwrap();
    let older = h.cards.create_card("u1", new_card("older")).await.unwrap().card;
    // Timestamps have second resolution.
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    let newer = h.cards.create_card("u1", new_card("newer")).await.unwrap().card;
    let map = add(&h, "u1", &older.id, component(ComponentKind::Map, json!({ "address": "Main St 1" })))
        .await
        .unwrap();
    h.cards.set_published("u1", &older.id, true).await.unwrap();
    h.cards.set_published("u1", &newer.id, true).await.unwrap();

    let report = h.cards.enforce_entitlements("u1", Tier::Free).await.unwrap();
    assert_eq!(report.disabled_components, [map.clone()]);
    assert_eq!(report.unpublished_cards, [newer.id.clone()]);

    let components = h.cards.components(&older.id).await.unwrap();
    assert!(!components.iter().find(|c| c.id == map).unwrap().enabled);
    assert!(h.cards.find_by_slug("older").await.unwrap().unwrap().published);
    assert!(!h.cards.find_by_slug("newer").await.unwrap().unwrap().published);

    let again = h.cards.enforce_entitlements("u1", Tier::Free).await.unwrap();
    assert!(again.disabled_components.is_empty());
    assert!(again.unpublished_cards.is_empty());
}

#[tokio::test]
async fn subscription_changes_trigger_enforcement() {
    let h = harness("listener").await;
    h.billing.grant("u1", Tier::Pro, 30).await.unwrap();
    let card = h.cards.create_card("u1", new_card("listen")).await.unwrap().card;
    let video = add(&h, "u1", &card.id, component(ComponentKind::Video, json!({ "url": "https://v.example/1" })))
        .await
        .unwrap();
    let _listener = h.cards.listen().unwrap();

    h.billing.grant("u1", Tier::Free, 0).await.unwrap();

    let mut disabled = false;
    for _ in 0..50 {
        let components = h.cards.components(&card.id).await.unwrap();
        if components.iter().any(|c| c.id == video && !c.enabled) {
            disabled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(disabled, "video component should be disabled after the downgrade");
}

#[tokio::test]
async fn public_routes_serve_html_and_vcards() {
    let h = harness("http").await;
    let card = h.cards.create_card("u1", new_card("routes")).await.unwrap().card;
    h.cards.set_published("u1", &card.id, true).await.unwrap();

    let state = ApiState::builder()
        .config(h.ctx.config.clone())
        .db(h.ctx.database.clone())
        .events(h.events.clone())
        .register_slice(InitializedSlice::new(h.cards.clone()))
        .build()
        .unwrap();
    let (app, _) = router().split_for_parts();
    let app = app.with_state(state);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/c/routes").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("Jane Doe"));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/c/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("Card not found"));

    let response = app
        .oneshot(Request::builder().uri("/c/routes/vcard").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/vcard"));
}
