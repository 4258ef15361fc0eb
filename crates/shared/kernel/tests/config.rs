use cardly_kernel::config::load_config;
use cardly_kernel::domain::config::ApiConfig;
use std::io::Write;

#[test]
fn file_values_override_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        "[server]\nport = 9090\npublic_url = \"https://cards.example\"\n\n[security.login]\nmax_failures = 3"
    )
    .unwrap();

    let config: ApiConfig = load_config(Some(file.path())).unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.public_url, "https://cards.example");
    assert_eq!(config.security.login.max_failures, 3);
    assert_eq!(config.security.login.lockout_seconds, 900);
    assert_eq!(config.database.url, "mem://");
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config: ApiConfig = load_config(Some(dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.server.port, 8080);
}

#[test]
fn malformed_file_is_an_error() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[server\nport = ").unwrap();
    assert!(load_config::<ApiConfig>(Some(file.path())).is_err());
}
