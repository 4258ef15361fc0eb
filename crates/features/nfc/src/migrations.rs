use cardly_database::Migration;

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "nfc",
    "0001_nfc_tag",
    "
    DEFINE TABLE IF NOT EXISTS nfc_tag SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS uid ON nfc_tag TYPE string;
    DEFINE FIELD IF NOT EXISTS owner ON nfc_tag TYPE string;
    DEFINE FIELD IF NOT EXISTS card ON nfc_tag TYPE string;
    DEFINE FIELD IF NOT EXISTS label ON nfc_tag TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS active ON nfc_tag TYPE bool DEFAULT true;
    DEFINE FIELD IF NOT EXISTS tap_count ON nfc_tag TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS last_tapped_at ON nfc_tag TYPE option<int>;
    DEFINE FIELD IF NOT EXISTS created_at ON nfc_tag TYPE int;
    DEFINE FIELD IF NOT EXISTS updated_at ON nfc_tag TYPE int;
    DEFINE INDEX IF NOT EXISTS nfc_tag_uid ON nfc_tag FIELDS uid UNIQUE;
    DEFINE INDEX IF NOT EXISTS nfc_tag_owner ON nfc_tag FIELDS owner;
    ",
)];
