use cardly_database::Migration;

pub const MIGRATIONS: &[Migration] = &[
    Migration::new(
        "experiments",
        "0001_experiment",
        "
        DEFINE TABLE IF NOT EXISTS experiment SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS slug ON experiment TYPE string;
        DEFINE FIELD IF NOT EXISTS name ON experiment TYPE string;
        DEFINE FIELD IF NOT EXISTS status ON experiment TYPE string;
        DEFINE FIELD IF NOT EXISTS variants ON experiment TYPE string;
        DEFINE FIELD IF NOT EXISTS created_at ON experiment TYPE int;
        DEFINE FIELD IF NOT EXISTS updated_at ON experiment TYPE int;
        DEFINE INDEX IF NOT EXISTS experiment_slug ON experiment FIELDS slug UNIQUE;
        ",
    ),
    Migration::new(
        "experiments",
        "0002_assignment",
        "
        DEFINE TABLE IF NOT EXISTS assignment SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS experiment ON assignment TYPE string;
        DEFINE FIELD IF NOT EXISTS session ON assignment TYPE string;
        DEFINE FIELD IF NOT EXISTS variant ON assignment TYPE string;
        DEFINE FIELD IF NOT EXISTS created_at ON assignment TYPE int;
        DEFINE INDEX IF NOT EXISTS assignment_session ON assignment FIELDS experiment, session UNIQUE;

        DEFINE TABLE IF NOT EXISTS conversion SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS experiment ON conversion TYPE string;
        DEFINE FIELD IF NOT EXISTS session ON conversion TYPE string;
        DEFINE FIELD IF NOT EXISTS variant ON conversion TYPE string;
        DEFINE FIELD IF NOT EXISTS goal ON conversion TYPE string;
        DEFINE FIELD IF NOT EXISTS created_at ON conversion TYPE int;
        DEFINE INDEX IF NOT EXISTS conversion_goal ON conversion FIELDS experiment, session, goal UNIQUE;
        ",
    ),
];
