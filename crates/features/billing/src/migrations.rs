use cardly_database::Migration;

pub const MIGRATIONS: &[Migration] = &[
    Migration::new(
        "billing",
        "0001_subscription",
        "
        DEFINE TABLE IF NOT EXISTS subscription SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS owner ON subscription TYPE string;
        DEFINE FIELD IF NOT EXISTS tier ON subscription TYPE string;
        DEFINE FIELD IF NOT EXISTS status ON subscription TYPE string;
        DEFINE FIELD IF NOT EXISTS billing_interval ON subscription TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS customer_id ON subscription TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS subscription_id ON subscription TYPE option<string>;
        DEFINE FIELD IF NOT EXISTS current_period_end ON subscription TYPE option<int>;
        DEFINE FIELD IF NOT EXISTS cancel_at_period_end ON subscription TYPE bool DEFAULT false;
        DEFINE FIELD IF NOT EXISTS created_at ON subscription TYPE int;
        DEFINE FIELD IF NOT EXISTS updated_at ON subscription TYPE int;
        DEFINE INDEX IF NOT EXISTS subscription_owner ON subscription FIELDS owner UNIQUE;
        DEFINE INDEX IF NOT EXISTS subscription_provider ON subscription FIELDS subscription_id;
        DEFINE INDEX IF NOT EXISTS subscription_customer ON subscription FIELDS customer_id;
        ",
    ),
    Migration::new(
        "billing",
        "0002_payment",
        "
        DEFINE TABLE IF NOT EXISTS payment SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS uid ON payment TYPE string;
        DEFINE FIELD IF NOT EXISTS owner ON payment TYPE string;
        DEFINE FIELD IF NOT EXISTS invoice_id ON payment TYPE string;
        DEFINE FIELD IF NOT EXISTS amount ON payment TYPE int;
        DEFINE FIELD IF NOT EXISTS currency ON payment TYPE string;
        DEFINE FIELD IF NOT EXISTS status ON payment TYPE string;
        DEFINE FIELD IF NOT EXISTS created_at ON payment TYPE int;
        DEFINE INDEX IF NOT EXISTS payment_uid ON payment FIELDS uid UNIQUE;
        DEFINE INDEX IF NOT EXISTS payment_invoice ON payment FIELDS invoice_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS payment_owner ON payment FIELDS owner;
        ",
    ),
    Migration::new(
        "billing",
        "0003_webhook_event",
        "
        DEFINE TABLE IF NOT EXISTS webhook_event SCHEMAFULL;
        DEFINE FIELD IF NOT EXISTS event_id ON webhook_event TYPE string;
        DEFINE FIELD IF NOT EXISTS event_type ON webhook_event TYPE string;
        DEFINE FIELD IF NOT EXISTS processed_at ON webhook_event TYPE int;
        DEFINE INDEX IF NOT EXISTS webhook_event_id ON webhook_event FIELDS event_id UNIQUE;
        ",
    ),
];
