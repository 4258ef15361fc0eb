use cardly_database::Database;
use cardly_domain::config::ApiConfig;
use cardly_domain::constants::SETTING_REGISTRATION_OPEN;
use cardly_event_bus::EventBus;
use cardly_kernel::mail::Mailer;
use cardly_kernel::server::SliceContext;
use cardly_settings::{MIGRATIONS, Settings, SettingsError, init};
use serde_json::json;

async fn settings(name: &str) -> Settings {
    let database = Database::builder()
        .url("mem://")
        .session("settings", name)
        .migrations(MIGRATIONS.iter().copied())
        .init()
        .await
        .unwrap();
    init(&SliceContext {
        config: ApiConfig::default(),
        database,
        events: EventBus::new(),
        mailer: Mailer::log(),
    })
}

#[tokio::test]
async fn put_get_and_overwrite() {
    let settings = settings("put").await;

    let stored = settings.put("site.name", json!("Cardly"), true, Some("admin-1")).await.unwrap();
    assert_eq!(stored.value, json!("Cardly"));
    assert_eq!(stored.updated_by.as_deref(), Some("admin-1"));

    settings.put("site.name", json!("Cards"), true, None).await.unwrap();
    let loaded = settings.get("site.name").await.unwrap().unwrap();
    assert_eq!(loaded.value, json!("Cards"));
    assert_eq!(settings.list().await.unwrap().len(), 1);
    assert_eq!(settings.get_string("site.name").await.as_deref(), Some("Cards"));
}

#[tokio::test]
async fn public_listing_only_contains_public_settings() {
    let settings = settings("public").await;
    settings.put("site.name", json!("Cardly"), true, None).await.unwrap();
    settings.put(SETTING_REGISTRATION_OPEN, json!(false), false, None).await.unwrap();

    let public = settings.public_settings().await.unwrap();
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].key, "site.name");
}

#[tokio::test]
async fn get_bool_falls_back_to_default() {
    let settings = settings("bool").await;
    assert!(settings.get_bool(SETTING_REGISTRATION_OPEN, true).await.unwrap());

    settings.put(SETTING_REGISTRATION_OPEN, json!(false), false, None).await.unwrap();
    assert!(!settings.get_bool(SETTING_REGISTRATION_OPEN, true).await.unwrap());

    settings.put(SETTING_REGISTRATION_OPEN, json!("nope"), false, None).await.unwrap();
    assert!(settings.get_bool(SETTING_REGISTRATION_OPEN, true).await.unwrap());
}

#[tokio::test]
async fn invalid_keys_and_oversized_values_are_rejected() {
    let settings = settings("invalid").await;
    let err = settings.put("Bad Key", json!(1), false, None).await.unwrap_err();
    assert!(matches!(err, SettingsError::Validation { .. }));

    let big = "x".repeat(9 * 1024);
    let err = settings.put("big", json!(big), false, None).await.unwrap_err();
    assert!(matches!(err, SettingsError::Validation { .. }));
}

#[tokio::test]
async fn deleting_missing_setting_is_not_found() {
    let settings = settings("delete").await;
    settings.put("site.name", json!("Cardly"), true, None).await.unwrap();
    settings.delete("site.name").await.unwrap();
    assert!(settings.get("site.name").await.unwrap().is_none());

    let err = settings.delete("site.name").await.unwrap_err();
    assert!(matches!(err, SettingsError::NotFound { .. }));
}
