//! Per-kind rules for component content. Content is always a JSON object.

use cardly_domain::component::ComponentKind;
use cardly_kernel::validation::{is_http_url, is_https_url, is_valid_email};
use serde_json::{Map, Value};

/// Serialized content above this size is rejected.
pub const MAX_CONTENT_BYTES: usize = 16 * 1024;
pub const MAX_LINK_ITEMS: usize = 30;
pub const MAX_GALLERY_IMAGES: usize = 24;
pub const MAX_FORM_FIELDS: usize = 20;
pub const MAX_BIO_CHARS: usize = 1_000;
pub const MAX_TEXT_CHARS: usize = 5_000;

const MAX_SHORT_CHARS: usize = 120;
const MAX_ADDRESS_CHARS: usize = 300;
const MAX_UPLOAD_ID_CHARS: usize = 64;

type Rule = Result<(), String>;

/// Input type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Email,
    Phone,
    Textarea,
}

impl FieldType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Textarea => "textarea",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "email" => Some(Self::Email),
            "phone" => Some(Self::Phone),
            "textarea" => Some(Self::Textarea),
            _ => None,
        }
    }
}

/// One field of a `form` component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
}

/// Validates `content` for `kind`. The error is a user-facing reason.
pub fn validate(kind: ComponentKind, content: &Value) -> Rule {
    let Value::Object(map) = content else {
        return Err("content must be a JSON object".into());
    };
    let size = serde_json::to_string(content).map_or(usize::MAX, |s| s.len());
    if size > MAX_CONTENT_BYTES {
        return Err(format!("content must be at most {MAX_CONTENT_BYTES} bytes"));
    }

    match kind {
        ComponentKind::Profile => {
            only_keys(map, &["name", "title", "company", "bio", "avatar"])?;
            for key in ["name", "title", "company"] {
                optional_text(map, key, MAX_SHORT_CHARS)?;
            }
            optional_text(map, "bio", MAX_BIO_CHARS)?;
            optional_text(map, "avatar", MAX_UPLOAD_ID_CHARS).map(|_| ())
        }
        ComponentKind::Contact => {
            only_keys(map, &["email", "phone", "website", "address"])?;
            if let Some(email) = optional_text(map, "email", MAX_SHORT_CHARS)? {
                check(is_valid_email(email), "contact email is not a valid address")?;
            }
            if let Some(phone) = optional_text(map, "phone", 40)? {
                check(is_phone(phone), "contact phone may only contain digits, spaces and + - ( )")?;
            }
            if let Some(website) = optional_text(map, "website", 2_048)? {
                check(is_http_url(website), "contact website must be an http(s) URL")?;
            }
            optional_text(map, "address", MAX_ADDRESS_CHARS).map(|_| ())
        }
        ComponentKind::Social => link_items(map, true),
        ComponentKind::Links => link_items(map, false),
        ComponentKind::Text => {
            only_keys(map, &["body"])?;
            required_text(map, "body", MAX_TEXT_CHARS).map(|_| ())
        }
        ComponentKind::Gallery => {
            only_keys(map, &["images"])?;
            let images = array(map, "images", MAX_GALLERY_IMAGES)?;
            for image in images {
                let id = image.as_str().unwrap_or_default();
                check(
                    !id.trim().is_empty() && id.chars().count() <= MAX_UPLOAD_ID_CHARS,
                    "gallery images must be upload ids",
                )?;
            }
            Ok(())
        }
        ComponentKind::Video => {
            only_keys(map, &["url"])?;
            let url = required_text(map, "url", 2_048)?;
            check(is_http_url(url), "video url must be an http(s) URL")
        }
        ComponentKind::Form => form(map).map(|_| ()),
        ComponentKind::Map => {
            only_keys(map, &["address", "lat", "lng"])?;
            let address = optional_text(map, "address", MAX_ADDRESS_CHARS)?;
            let lat = map.get("lat").map(Value::as_f64);
            let lng = map.get("lng").map(Value::as_f64);
            match (lat, lng) {
                (None, None) => check(address.is_some(), "map needs an address or lat/lng"),
                (Some(Some(lat)), Some(Some(lng))) => check(
                    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng),
                    "map coordinates are out of range",
                ),
                _ => Err("map lat and lng must both be numbers".into()),
            }
        }
        ComponentKind::Embed => {
            only_keys(map, &["url"])?;
            let url = required_text(map, "url", 2_048)?;
            check(is_https_url(url), "embed url must be an https URL")
        }
    }
}

/// Field definitions of a `form` component. Invalid content yields no fields.
#[must_use]
pub fn form_fields(content: &Value) -> Vec<FormField> {
    content.as_object().and_then(|map| form(map).ok()).unwrap_or_default()
}

/// `http(s)` links published by `links`, `social` and `video` content; the only targets
/// the outbound redirect will follow.
pub(crate) fn link_targets(kind: ComponentKind, content: &Value) -> Vec<String> {
    let urls: Vec<&str> = match kind {
        ComponentKind::Links | ComponentKind::Social => content
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("url").and_then(Value::as_str))
            .collect(),
        ComponentKind::Video => content.get("url").and_then(Value::as_str).into_iter().collect(),
        _ => Vec::new(),
    };
    urls.into_iter().filter(|url| is_http_url(url)).map(str::to_owned).collect()
}

fn form(map: &Map<String, Value>) -> Result<Vec<FormField>, String> {
    only_keys(map, &["fields"])?;
    let items = array(map, "fields", MAX_FORM_FIELDS)?;
    check(!items.is_empty(), "a form needs at least one field")?;

    let mut fields: Vec<FormField> = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(field) = item else {
            return Err("form fields must be objects".into());
        };
        only_keys(field, &["name", "label", "type", "required"])?;
        let name = required_text(field, "name", 32)?;
        check(
            name.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_'),
            "form field names use a-z, 0-9 and '_'",
        )?;
        if fields.iter().any(|f| f.name == name) {
            return Err(format!("duplicate form field '{name}'"));
        }
        let label = required_text(field, "label", MAX_SHORT_CHARS)?;
        let field_type = required_text(field, "type", 16)
            .ok()
            .and_then(FieldType::parse)
            .ok_or("form field type must be text, email, phone or textarea")?;
        let required = match field.get("required") {
            None => false,
            Some(Value::Bool(required)) => *required,
            Some(_) => return Err("form field 'required' must be a boolean".into()),
        };
        fields.push(FormField { name: name.to_owned(), label: label.to_owned(), field_type, required });
    }
    Ok(fields)
}

fn link_items(map: &Map<String, Value>, allow_mailto: bool) -> Rule {
    only_keys(map, &["items"])?;
    for item in array(map, "items", MAX_LINK_ITEMS)? {
        let Value::Object(link) = item else {
            return Err("link items must be objects".into());
        };
        only_keys(link, &["label", "url"])?;
        required_text(link, "label", 80)?;
        let url = required_text(link, "url", 2_048)?;
        let mailto = allow_mailto && url.strip_prefix("mailto:").is_some_and(is_valid_email);
        check(is_http_url(url) || mailto, "link urls must be http(s) URLs")?;
    }
    Ok(())
}

fn only_keys(map: &Map<String, Value>, allowed: &[&str]) -> Rule {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(format!("unknown content field '{key}'")),
        None => Ok(()),
    }
}

fn optional_text<'a>(map: &'a Map<String, Value>, key: &str, max: usize) -> Result<Option<&'a str>, String> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.chars().count() <= max => Ok(Some(text.as_str())),
        Some(Value::String(_)) => Err(format!("'{key}' must be at most {max} characters")),
        Some(_) => Err(format!("'{key}' must be a string")),
    }
}

fn required_text<'a>(map: &'a Map<String, Value>, key: &str, max: usize) -> Result<&'a str, String> {
    match optional_text(map, key, max)? {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(format!("'{key}' is required")),
    }
}

fn array<'a>(map: &'a Map<String, Value>, key: &str, max: usize) -> Result<&'a [Value], String> {
    match map.get(key) {
        None => Ok(&[]),
        Some(Value::Array(items)) if items.len() <= max => Ok(items.as_slice()),
        Some(Value::Array(_)) => Err(format!("'{key}' allows at most {max} entries")),
        Some(_) => Err(format!("'{key}' must be an array")),
    }
}

fn check(ok: bool, message: &str) -> Rule {
    if ok { Ok(()) } else { Err(message.to_owned()) }
}

fn is_phone(phone: &str) -> bool {
    phone.chars().any(|c| c.is_ascii_digit())
        && phone.chars().all(|c| c.is_ascii_digit() || " +-()".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_profile_is_valid() {
        assert!(validate(ComponentKind::Profile, &json!({})).is_ok());
        assert!(validate(ComponentKind::Profile, &json!([])).is_err());
        assert!(validate(ComponentKind::Profile, &json!({ "nick": "x" })).is_err());
        assert!(validate(ComponentKind::Profile, &json!({ "bio": "b".repeat(1_001) })).is_err());
    }

    #[test]
    fn contact_fields_are_checked() {
        let ok = json!({ "email": "ada@example.com", "phone": "+44 (20) 123-456", "website": "https://ada.dev" });
        assert!(validate(ComponentKind::Contact, &ok).is_ok());
        assert!(validate(ComponentKind::Contact, &json!({ "email": "nope" })).is_err());
        assert!(validate(ComponentKind::Contact, &json!({ "website": "ftp://x.io" })).is_err());
        assert!(validate(ComponentKind::Contact, &json!({ "phone": "call me" })).is_err());
    }

    #[test]
    fn social_allows_mailto_but_links_do_not() {
        let mailto = json!({ "items": [{ "label": "Mail", "url": "mailto:ada@example.com" }] });
        assert!(validate(ComponentKind::Social, &mailto).is_ok());
        assert!(validate(ComponentKind::Links, &mailto).is_err());

        let control = json!({ "items": [{ "label": "Bad", "url": "https://x.io/\u{1b}[0m" }] });
        assert!(validate(ComponentKind::Links, &control).is_err());
        assert!(link_targets(ComponentKind::Links, &control).is_empty(), "never redirected to");

        let many: Vec<Value> =
            (0..31).map(|i| json!({ "label": format!("L{i}"), "url": "https://x.io" })).collect();
        assert!(validate(ComponentKind::Links, &json!({ "items": many })).is_err());
    }

    #[test]
    fn text_requires_body() {
        assert!(validate(ComponentKind::Text, &json!({})).is_err());
        assert!(validate(ComponentKind::Text, &json!({ "body": "Hi" })).is_ok());
        assert!(validate(ComponentKind::Text, &json!({ "body": "x".repeat(5_001) })).is_err());
    }

    #[test]
    fn form_rules() {
        let form = json!({ "fields": [
            { "name": "name", "label": "Name", "type": "text", "required": true },
            { "name": "email", "label": "E-mail", "type": "email" }
        ]});
        assert!(validate(ComponentKind::Form, &form).is_ok());
        let fields = form_fields(&form);
        assert_eq!(fields.len(), 2);
        assert!(fields[0].required);
        assert_eq!(fields[1].field_type, FieldType::Email);
        assert!(!fields[1].required);

        assert!(validate(ComponentKind::Form, &json!({ "fields": [] })).is_err());
        let duplicate = json!({ "fields": [
            { "name": "a", "label": "A", "type": "text" },
            { "name": "a", "label": "B", "type": "text" }
        ]});
        assert!(validate(ComponentKind::Form, &duplicate).is_err());
        let bad_type = json!({ "fields": [{ "name": "a", "label": "A", "type": "date" }] });
        assert!(validate(ComponentKind::Form, &bad_type).is_err());
        let bad_name = json!({ "fields": [{ "name": "First Name", "label": "A", "type": "text" }] });
        assert!(validate(ComponentKind::Form, &bad_name).is_err());
    }

    #[test]
    fn map_and_embed_rules() {
        assert!(validate(ComponentKind::Map, &json!({ "address": "1 Main St" })).is_ok());
        assert!(validate(ComponentKind::Map, &json!({ "lat": 51.5, "lng": -0.12 })).is_ok());
        assert!(validate(ComponentKind::Map, &json!({ "lat": 51.5 })).is_err());
        assert!(validate(ComponentKind::Map, &json!({ "lat": 91.0, "lng": 0.0 })).is_err());
        assert!(validate(ComponentKind::Map, &json!({})).is_err());

        assert!(validate(ComponentKind::Embed, &json!({ "url": "https://x.io/e" })).is_ok());
        assert!(validate(ComponentKind::Embed, &json!({ "url": "http://x.io/e" })).is_err());
        assert!(validate(ComponentKind::Video, &json!({ "url": "http://x.io/v" })).is_ok());
    }

    #[test]
    fn oversized_content_is_rejected() {
        let images: Vec<String> = (0..24).map(|_| "i".repeat(64)).collect();
        assert!(validate(ComponentKind::Gallery, &json!({ "images": images })).is_ok());
        let huge = json!({ "body": "x".repeat(17 * 1024) });
        assert!(validate(ComponentKind::Text, &huge).is_err());
    }

    #[test]
    fn link_targets_only_collect_http_links() {
        let content = json!({ "items": [
            { "label": "Site", "url": "https://ada.dev" },
            { "label": "Mail", "url": "mailto:ada@example.com" }
        ]});
        assert_eq!(link_targets(ComponentKind::Social, &content), vec!["https://ada.dev"]);
        assert!(link_targets(ComponentKind::Text, &content).is_empty());
        let video = json!({ "url": "https://videos.example/v/1" });
        assert_eq!(link_targets(ComponentKind::Video, &video), vec!["https://videos.example/v/1"]);
    }
}
