use cardly_database::Migration;

pub const MIGRATIONS: &[Migration] = &[Migration::new(
    "settings",
    "0001_setting",
    "
    DEFINE TABLE IF NOT EXISTS setting SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS name ON setting TYPE string;
    DEFINE FIELD IF NOT EXISTS payload ON setting TYPE string;
    DEFINE FIELD IF NOT EXISTS public ON setting TYPE bool DEFAULT false;
    DEFINE FIELD IF NOT EXISTS updated_at ON setting TYPE int;
    DEFINE FIELD IF NOT EXISTS updated_by ON setting TYPE option<string>;
    DEFINE INDEX IF NOT EXISTS setting_name ON setting FIELDS name UNIQUE;
    ",
)];
