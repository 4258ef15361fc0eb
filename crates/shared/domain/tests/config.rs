use cardly_domain::config::{
    ApiConfig, BillingConfig, DatabaseConfig, LoginConfig, ServerConfig, StorageConfig,
};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 8080);
    assert!(server.ssl.is_none());
    assert_eq!(server.max_upload_bytes, 10 * 1024 * 1024);

    let db = DatabaseConfig::default();
    assert_eq!(db.url, "mem://");
    assert_eq!(db.namespace, "cardly");
    assert!(db.credentials.is_none());

    let storage = StorageConfig::default();
    assert_eq!(storage.data_dir, std::path::PathBuf::from("data"));

    let login = LoginConfig::default();
    assert_eq!((login.max_failures, login.lockout_seconds), (5, 900));

    let billing = BillingConfig::default();
    assert!(billing.stripe_secret_key.is_none());
    assert_eq!(billing.grace_days, 3);
}

#[test]
fn api_config_deserializes_partial_sections() {
    let raw = json!({
        "server": { "address": "::", "port": 9000, "public_url": "https://cardly.test/" },
        "database": { "url": "mem://", "namespace": "n", "database": "d", "credentials": null },
        "storage": { "data_dir": "/tmp/data" },
        "security": {
            "jwt": { "secret": "s3cret", "ttl_seconds": 60 },
            "admin_emails": ["root@cardly.test"]
        },
        "billing": { "prices": { "pro_monthly": "price_pro_m" } }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.database.namespace, "n");
    assert_eq!(cfg.security.jwt.secret, "s3cret");
    assert_eq!(cfg.security.jwt.issuer, "cardly");
    assert_eq!(cfg.security.jwt.mfa_ttl_seconds, 300);
    assert_eq!(cfg.security.admin_emails, vec!["root@cardly.test".to_owned()]);
    assert_eq!(cfg.billing.prices.pro_monthly.as_deref(), Some("price_pro_m"));
    assert!(cfg.billing.prices.premium_yearly.is_none());
    assert_eq!(cfg.experiments.assignment_cache_capacity, 100_000);
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn public_links_join_without_double_slashes() {
    let mut cfg = ApiConfig::default();
    cfg.server.public_url = "https://cardly.test/".to_owned();

    assert_eq!(cfg.server.public_link("/c/jane"), "https://cardly.test/c/jane");
    assert_eq!(cfg.server.public_link("files/abc"), "https://cardly.test/files/abc");
}

#[test]
fn reserved_slugs_are_detected() {
    assert!(cardly_domain::constants::is_reserved_slug("api"));
    assert!(!cardly_domain::constants::is_reserved_slug("jane-doe"));
}
