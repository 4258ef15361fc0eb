use cardly::domain::config::ApiConfig;
use cardly::features::{identity::Identity, nfc::Nfc};
use cardly_server::Server;

#[tokio::test]
async fn build_wires_every_slice() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = ApiConfig::default();
    cfg.storage.data_dir = dir.path().join("files");
    cfg.database.namespace = "server-test".into();

    let server = Server::builder().config(cfg).port(0).build().await.unwrap();
    let state = server.state();
    assert!(state.try_get_slice::<Identity>().is_ok());
    assert!(state.try_get_slice::<Nfc>().is_ok());
    assert_eq!(state.slice_ids().count(), cardly::features::ENABLED.len());
    assert!(dir.path().join("files").is_dir());
}

#[tokio::test]
async fn missing_certificates_fail_fast() {
    let mut cfg = ApiConfig::default();
    cfg.server.ssl = Some(cardly::domain::config::SslConfig {
        cert: "/nonexistent/cert.pem".into(),
        key: "/nonexistent/key.pem".into(),
    });
    let err = Server::builder().config(cfg).build().await.unwrap_err();
    assert!(err.to_string().contains("SSL certificate not found"));
}
