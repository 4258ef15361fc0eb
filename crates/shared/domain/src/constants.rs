//! `OpenAPI` tags, setting keys and other shared literals.

pub const APP_NAME: &str = "cardly";

// --- OpenAPI tags ---

pub const SYSTEM_TAG: &str = "System";
pub const AUTH_TAG: &str = "Auth";
pub const BILLING_TAG: &str = "Billing";
pub const CARDS_TAG: &str = "Cards";
pub const PUBLIC_TAG: &str = "Public";
pub const CONTACTS_TAG: &str = "Contacts";
pub const NFC_TAG_TAG: &str = "NFC";
pub const ANALYTICS_TAG: &str = "Analytics";
pub const EXPERIMENTS_TAG: &str = "Experiments";
pub const UPLOADS_TAG: &str = "Uploads";
pub const SETTINGS_TAG: &str = "Settings";

// --- Well-known settings ---

pub const SETTING_REGISTRATION_OPEN: &str = "registration.open";
pub const SETTING_SITE_NAME: &str = "site.name";

/// Slugs that collide with routes or would be confusing as public card addresses.
pub const RESERVED_SLUGS: &[&str] = &[
    "about", "admin", "api", "app", "assets", "billing", "c", "cardly", "dashboard", "docs",
    "edit", "files", "health", "help", "login", "logout", "new", "register", "settings", "signup",
    "static", "support", "t", "www",
];

/// Returns `true` when the slug is reserved.
#[must_use]
pub fn is_reserved_slug(slug: &str) -> bool {
    RESERVED_SLUGS.contains(&slug)
}
