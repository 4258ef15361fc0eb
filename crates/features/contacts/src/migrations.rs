use cardly_database::Migration;

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "contacts",
    "0001_contact",
    "
    DEFINE TABLE IF NOT EXISTS contact SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS uid ON contact TYPE string;
    DEFINE FIELD IF NOT EXISTS card ON contact TYPE string;
    DEFINE FIELD IF NOT EXISTS owner ON contact TYPE string;
    DEFINE FIELD IF NOT EXISTS name ON contact TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS email ON contact TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS phone ON contact TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS fields ON contact TYPE string;
    DEFINE FIELD IF NOT EXISTS source ON contact TYPE string;
    DEFINE FIELD IF NOT EXISTS is_read ON contact TYPE bool DEFAULT false;
    DEFINE FIELD IF NOT EXISTS created_at ON contact TYPE int;
    DEFINE INDEX IF NOT EXISTS contact_uid ON contact FIELDS uid UNIQUE;
    DEFINE INDEX IF NOT EXISTS contact_owner ON contact FIELDS owner, created_at;
    DEFINE INDEX IF NOT EXISTS contact_card ON contact FIELDS card;
    ",
)];
