use cardly_database::Migration;

pub const MIGRATIONS: &[Migration] = &[
    Migration::new(
        "cards",
        "0001_card",
        "
        DEFINE TABLE IF NOT EXISTS card SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS uid ON card TYPE string;
        DEFINE FIELD IF NOT EXISTS owner ON card TYPE string;
        DEFINE FIELD IF NOT EXISTS slug ON card TYPE string;
        DEFINE FIELD IF NOT EXISTS title ON card TYPE string;
        DEFINE FIELD IF NOT EXISTS headline ON card TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS accent_color ON card TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS published ON card TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS created_at ON card TYPE int;
        DEFINE FIELD IF NOT EXISTS updated_at ON card TYPE int;
        DEFINE INDEX IF NOT EXISTS card_uid ON card FIELDS uid UNIQUE;
        DEFINE INDEX IF NOT EXISTS card_slug ON card FIELDS slug UNIQUE;
        DEFINE INDEX IF NOT EXISTS card_owner ON card FIELDS owner;
        ",
    ),
    Migration::new(
        "cards",
        "0002_component",
        "
        DEFINE TABLE IF NOT EXISTS component SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS uid ON component TYPE string;
        DEFINE FIELD IF NOT EXISTS card ON component TYPE string;
        DEFINE FIELD IF NOT EXISTS kind ON component TYPE string;
        DEFINE FIELD IF NOT EXISTS position ON component TYPE int;
        DEFINE FIELD IF NOT EXISTS enabled ON component TYPE bool DEFAULT true;
        DEFINE FIELD IF NOT EXISTS title ON component TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS data ON component TYPE string;
        DEFINE FIELD IF NOT EXISTS created_at ON component TYPE int;
        DEFINE FIELD IF NOT EXISTS updated_at ON component TYPE int;
        DEFINE INDEX IF NOT EXISTS component_uid ON component FIELDS uid UNIQUE;
        DEFINE INDEX IF NOT EXISTS component_card ON component FIELDS card;
        ",
    ),
];
