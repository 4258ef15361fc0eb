use cardly_database::Migration;

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "analytics",
    "0001_card_event",
    "
    DEFINE TABLE IF NOT EXISTS card_event SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS card ON card_event TYPE string;
    DEFINE FIELD IF NOT EXISTS owner ON card_event TYPE string;
    DEFINE FIELD IF NOT EXISTS kind ON card_event TYPE string;
    DEFINE FIELD IF NOT EXISTS target ON card_event TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS session ON card_event TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS occurred_at ON card_event TYPE int;
    DEFINE INDEX IF NOT EXISTS card_event_card ON card_event FIELDS card, occurred_at;
    ",
)];
