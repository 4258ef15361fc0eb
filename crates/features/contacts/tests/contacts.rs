use cardly_billing::Billing;
use cardly_cards::{Cards, CreateCardRequest};
use cardly_contacts::{
    CaptureRequest, ContactQuery, ContactSource, Contacts, ContactsError, MIGRATIONS, init,
};
use cardly_database::Database;
use cardly_domain::component::ComponentKind;
use cardly_domain::config::ApiConfig;
use cardly_domain::events::ContactCaptured;
use cardly_domain::tier::Tier;
use cardly_event_bus::EventBus;
use cardly_kernel::mail::{Mailer, MemoryTransport};
use cardly_kernel::server::SliceContext;
use serde_json::json;
use std::collections::BTreeMap;

struct Harness {
    contacts: Contacts,
    cards: Cards,
    billing: Billing,
    events: EventBus,
    outbox: MemoryTransport,
    owner: String,
}

async fn harness(name: &str) -> Harness {
    let database = Database::builder()
        .url("mem://")
        .session("contacts", name)
        .migrations(
            cardly_settings::MIGRATIONS
                .iter()
                .chain(cardly_billing::MIGRATIONS)
                .chain(cardly_identity::MIGRATIONS)
                .chain(cardly_cards::MIGRATIONS)
                .chain(MIGRATIONS)
                .copied(),
        )
        .init()
        .await
        .unwrap();
    let events = EventBus::new();
    let (mailer, outbox) = Mailer::memory();
    let ctx = SliceContext { config: ApiConfig::default(), database, events: events.clone(), mailer };
    let settings = cardly_settings::init(&ctx);
    let billing = cardly_billing::init(&ctx);
    let identity = cardly_identity::init(&ctx, settings.clone()).unwrap();
    let cards = cardly_cards::init(&ctx, billing.clone(), settings);
    let contacts = init(&ctx, cards.clone(), identity.clone());

    let owner = identity.register("owner@example.com", "correct1horse", "Owner").await.unwrap().user.id;
    Harness { contacts, cards, billing, events, outbox, owner }
}

/// A published card with a name/e-mail/message form.
async fn card_with_form(h: &Harness, slug: &str) -> String {
    h.billing.grant(&h.owner, Tier::Pro, 30).await.unwrap();
    let request = CreateCardRequest { slug: slug.into(), title: "Jane".into(), headline: None, accent_color: None };
    let card = h.cards.create_card(&h.owner, request).await.unwrap().card;
    let form = json!({ "fields": [
        { "name": "name", "label": "Name", "type": "text", "required": true },
        { "name": "email", "label": "E-mail", "type": "email", "required": true },
        { "name": "message", "label": "Message", "type": "textarea" }
    ]});
    h.cards.add_component(&h.owner, &card.id, ComponentKind::Form, None, form).await.unwrap();
    h.cards.set_published(&h.owner, &card.id, true).await.unwrap();
    card.id
}

fn submission(pairs: &[(&str, &str)]) -> CaptureRequest {
    let fields: BTreeMap<String, String> =
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    CaptureRequest { fields, website: None, source: None }
}

#[tokio::test]
async fn capture_stores_notifies_and_publishes() {
    let h = harness("capture").await;
    let card = card_with_form(&h, "jane").await;
    let mut captured = h.events.subscribe::<ContactCaptured>().unwrap();

    let contact = h
        .contacts
        .capture("jane", submission(&[("name", " Bob "), ("email", "bob@example.com"), ("message", "Hi")]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(contact.card, card);
    assert_eq!(contact.name.as_deref(), Some("Bob"));
    assert_eq!(contact.email.as_deref(), Some("bob@example.com"));
    assert_eq!(contact.source, ContactSource::Form);
    assert_eq!(contact.fields["message"], "Hi");
    assert!(!contact.read);

    let event = captured.try_recv().unwrap();
    assert_eq!((event.owner.as_str(), event.contact.as_str()), (h.owner.as_str(), contact.id.as_str()));

    let mail = h.outbox.outbox().pop().unwrap();
    assert_eq!(mail.to, "owner@example.com");
    assert!(mail.subject.contains("Jane"));
    assert!(mail.body.contains("Bob"));
}

#[tokio::test]
async fn submissions_must_match_the_form() {
    let h = harness("rules").await;
    card_with_form(&h, "rules").await;

    for bad in [
        submission(&[("name", "Bob")]),
        submission(&[("name", "Bob"), ("email", "not-an-email")]),
        submission(&[("name", "Bob"), ("email", "bob@example.com"), ("fax", "1")]),
    ] {
        let err = h.contacts.capture("rules", bad).await.unwrap_err();
        assert!(matches!(err, ContactsError::Validation { .. }));
    }
    assert!(h.contacts.list(&h.owner, &ContactQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn honeypot_submissions_are_dropped() {
    let h = harness("honeypot").await;
    card_with_form(&h, "trap").await;

    let mut request = submission(&[("name", "Bot"), ("email", "bot@example.com")]);
    request.website = Some("http://spam.example".into());
    assert!(h.contacts.capture("trap", request).await.unwrap().is_none());
    assert!(h.contacts.list(&h.owner, &ContactQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn cards_without_form_or_not_published_refuse_submissions() {
    let h = harness("refuse").await;
    let request = CreateCardRequest { slug: "plain".into(), title: "Plain".into(), headline: None, accent_color: None };
    let card = h.cards.create_card(&h.owner, request).await.unwrap().card;

    let err = h.contacts.capture("plain", submission(&[("name", "Bob")])).await.unwrap_err();
    assert!(matches!(err, ContactsError::NotFound { .. }));

    h.cards.set_published(&h.owner, &card.id, true).await.unwrap();
    let err = h.contacts.capture("plain", submission(&[("name", "Bob")])).await.unwrap_err();
    assert!(matches!(err, ContactsError::Conflict { .. }));

    let err = h.contacts.capture("missing", submission(&[])).await.unwrap_err();
    assert!(matches!(err, ContactsError::NotFound { .. }));
}

#[tokio::test]
async fn inbox_filters_marks_and_deletes() {
    let h = harness("inbox").await;
    let card = card_with_form(&h, "inbox").await;
    let first = h
        .contacts
        .capture("inbox", submission(&[("name", "A"), ("email", "a@example.com")]))
        .await
        .unwrap()
        .unwrap();
    let mut exchange = submission(&[("name", "B"), ("email", "b@example.com")]);
    exchange.source = Some(ContactSource::Exchange);
    h.contacts.capture("inbox", exchange).await.unwrap();

    let all = h.contacts.list(&h.owner, &ContactQuery::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().any(|c| c.source == ContactSource::Exchange));

    let marked = h.contacts.mark_read(&h.owner, &first.id, true).await.unwrap();
    assert!(marked.read);
    let unread = ContactQuery { card: Some(card), unread: true };
    let unread = h.contacts.list(&h.owner, &unread).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].name.as_deref(), Some("B"));

    let err = h.contacts.delete("someone-else", &first.id).await.unwrap_err();
    assert!(matches!(err, ContactsError::NotFound { .. }));
    h.contacts.delete(&h.owner, &first.id).await.unwrap();
    assert_eq!(h.contacts.list(&h.owner, &ContactQuery::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn export_writes_header_and_rows() {
    let h = harness("export").await;
    card_with_form(&h, "export").await;
    h.contacts
        .capture("export", submission(&[("name", "Bob"), ("email", "bob@example.com")]))
        .await
        .unwrap();

    let csv = h.contacts.export_csv(&h.owner, None).await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "name,email,phone,card,source,created_at,fields");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("Bob,bob@example.com,,export,form,"));
}
