use cardly_database::Migration;

pub const MIGRATIONS: &[Migration] = &[
    Migration::new(
        "identity",
        "0001_user",
        "
        DEFINE TABLE IF NOT EXISTS user SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS uid ON user TYPE string;
        DEFINE FIELD IF NOT EXISTS email ON user TYPE string;
        DEFINE FIELD IF NOT EXISTS password_hash ON user TYPE string;
        DEFINE FIELD IF NOT EXISTS display_name ON user TYPE string;
        DEFINE FIELD IF NOT EXISTS role ON user TYPE string DEFAULT 'user';
        DEFINE FIELD IF NOT EXISTS email_verified ON user TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS totp_secret ON user TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS totp_pending ON user TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS created_at ON user TYPE int;
        DEFINE FIELD IF NOT EXISTS updated_at ON user TYPE int;
        DEFINE INDEX IF NOT EXISTS user_uid ON user FIELDS uid UNIQUE;
        DEFINE INDEX IF NOT EXISTS user_email ON user FIELDS email UNIQUE;
        ",
    ),
    Migration::new(
        "identity",
        "0002_user_token",
        "
        DEFINE TABLE IF NOT EXISTS user_token SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS token_hash ON user_token TYPE string;
        DEFINE FIELD IF NOT EXISTS owner ON user_token TYPE string;
        DEFINE FIELD IF NOT EXISTS purpose ON user_token TYPE string;
        DEFINE FIELD IF NOT EXISTS expires_at ON user_token TYPE int;
        DEFINE FIELD IF NOT EXISTS created_at ON user_token TYPE int;
        DEFINE INDEX IF NOT EXISTS user_token_hash ON user_token FIELDS token_hash UNIQUE;
        DEFINE INDEX IF NOT EXISTS user_token_owner ON user_token FIELDS owner, purpose;
        ",
    ),
];
