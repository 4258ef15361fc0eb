use cardly_database::Migration;

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "uploads",
    "0001_upload",
    "
    DEFINE TABLE IF NOT EXISTS upload SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS uid ON upload TYPE string;
    DEFINE FIELD IF NOT EXISTS owner ON upload TYPE string;
    DEFINE FIELD IF NOT EXISTS purpose ON upload TYPE string;
    DEFINE FIELD IF NOT EXISTS content_type ON upload TYPE string;
    DEFINE FIELD IF NOT EXISTS file_name ON upload TYPE string;
    DEFINE FIELD IF NOT EXISTS size ON upload TYPE int;
    DEFINE FIELD IF NOT EXISTS checksum ON upload TYPE string;
    DEFINE FIELD IF NOT EXISTS original_name ON upload TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS created_at ON upload TYPE int;
    DEFINE INDEX IF NOT EXISTS upload_uid ON upload FIELDS uid UNIQUE;
    DEFINE INDEX IF NOT EXISTS upload_owner ON upload FIELDS owner;
    ",
)];
