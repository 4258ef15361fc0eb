//! Server-rendered public card pages.

use crate::content::{FieldType, form_fields};
use crate::error::CardsError;
use crate::model::{PublicCard, PublicComponent};
use askama::Template;
use cardly_domain::component::ComponentKind;
use cardly_kernel::validation::{is_http_url, percent_encode};
use serde_json::Value;

const DEFAULT_ACCENT: &str = "#2f6fed";

pub(crate) struct Link {
    pub label: String,
    pub href: String,
}

pub(crate) struct Field {
    pub name: String,
    pub label: String,
    pub input_type: &'static str,
    pub multiline: bool,
    pub required: bool,
}

/// Flattened view of one component; the template only checks which parts are set.
#[derive(Default)]
pub(crate) struct Block {
    pub kind: &'static str,
    pub title: String,
    pub lines: Vec<String>,
    pub links: Vec<Link>,
    pub images: Vec<String>,
    pub fields: Vec<Field>,
    pub embed: String,
}

#[derive(Template)]
#[template(path = "card.html")]
pub(crate) struct CardPage<'a> {
    pub card: &'a PublicCard,
    pub headline: &'a str,
    pub accent: &'a str,
    pub site_name: &'a str,
    pub blocks: Vec<Block>,
    pub vcard_url: String,
    pub contact_endpoint: String,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub(crate) struct NotFoundPage<'a> {
    pub site_name: &'a str,
}

fn text<'a>(content: &'a Value, key: &str) -> Option<&'a str> {
    content.get(key).and_then(Value::as_str).map(str::trim).filter(|v| !v.is_empty())
}

fn file_url(id: &str) -> String {
    format!("/files/{}", percent_encode(id))
}

fn outbound(slug: &str, url: &str) -> String {
    format!("/c/{slug}/out?url={}", percent_encode(url))
}

fn link_items(slug: &str, content: &Value) -> Vec<Link> {
    content
        .get("items")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let label = text(item, "label")?;
            let url = text(item, "url")?;
            let href = if is_http_url(url) { outbound(slug, url) } else { url.to_owned() };
            Some(Link { label: label.to_owned(), href })
        })
        .collect()
}

fn block(slug: &str, component: &PublicComponent) -> Block {
    let content = &component.content;
    let mut block = Block {
        kind: component.kind.as_str(),
        title: component.title.clone().unwrap_or_default(),
        ..Block::default()
    };

    match component.kind {
        ComponentKind::Profile => {
            block.images.extend(text(content, "avatar").map(file_url));
            let role = [text(content, "title"), text(content, "company")]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" · ");
            block.lines.extend(text(content, "name").map(str::to_owned));
            if !role.is_empty() {
                block.lines.push(role);
            }
            block.lines.extend(text(content, "bio").map(str::to_owned));
        }
        ComponentKind::Contact => {
            if let Some(email) = text(content, "email") {
                block.links.push(Link { label: email.to_owned(), href: format!("mailto:{email}") });
            }
            if let Some(phone) = text(content, "phone") {
                let dial: String = phone.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect();
                block.links.push(Link { label: phone.to_owned(), href: format!("tel:{dial}") });
            }
            if let Some(website) = text(content, "website") {
                block.links.push(Link { label: website.to_owned(), href: website.to_owned() });
            }
            block.lines.extend(text(content, "address").map(str::to_owned));
        }
        ComponentKind::Social | ComponentKind::Links => block.links = link_items(slug, content),
        ComponentKind::Text => {
            block.lines = text(content, "body")
                .unwrap_or_default()
                .split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_owned)
                .collect();
        }
        ComponentKind::Gallery => {
            block.images = content
                .get("images")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .map(file_url)
                .collect();
        }
        ComponentKind::Video => {
            if let Some(url) = text(content, "url") {
                block.links.push(Link { label: "Watch video".to_owned(), href: outbound(slug, url) });
            }
        }
        ComponentKind::Form => {
            block.fields = form_fields(content)
                .into_iter()
                .map(|field| Field {
                    input_type: match field.field_type {
                        FieldType::Email => "email",
                        FieldType::Phone => "tel",
                        FieldType::Text | FieldType::Textarea => "text",
                    },
                    multiline: field.field_type == FieldType::Textarea,
                    required: field.required,
                    name: field.name,
                    label: field.label,
                })
                .collect();
        }
        ComponentKind::Map => {
            let coordinates = content.get("lat").and_then(Value::as_f64).zip(content.get("lng").and_then(Value::as_f64));
            let href = match (coordinates, text(content, "address")) {
                (Some((lat, lng)), _) => {
                    format!("https://www.openstreetmap.org/?mlat={lat}&mlon={lng}#map=16/{lat}/{lng}")
                }
                (None, Some(address)) => {
                    format!("https://www.openstreetmap.org/search?query={}", percent_encode(address))
                }
                (None, None) => String::new(),
            };
            block.lines.extend(text(content, "address").map(str::to_owned));
            if !href.is_empty() {
                block.links.push(Link { label: "Open map".to_owned(), href });
            }
        }
        ComponentKind::Embed => block.embed = text(content, "url").unwrap_or_default().to_owned(),
    }
    block
}

/// Renders the public page of a published card.
pub(crate) fn card_page(card: &PublicCard, site_name: &str) -> Result<String, CardsError> {
    let page = CardPage {
        card,
        headline: card.headline.as_deref().unwrap_or_default(),
        accent: card.accent_color.as_deref().unwrap_or(DEFAULT_ACCENT),
        site_name,
        blocks: card.components.iter().map(|c| block(&card.slug, c)).collect(),
        vcard_url: format!("/c/{}/vcard", card.slug),
        contact_endpoint: format!("/api/public/cards/{}/contacts", card.slug),
    };
    Ok(page.render()?)
}

pub(crate) fn not_found_page(site_name: &str) -> Result<String, CardsError> {
    Ok(NotFoundPage { site_name }.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card(branding: bool, components: Vec<PublicComponent>) -> PublicCard {
        PublicCard {
            slug: "ada".into(),
            title: "Ada <Lovelace>".into(),
            headline: Some("Analyst".into()),
            accent_color: Some("#112233".into()),
            branding,
            components,
        }
    }

    fn component(kind: ComponentKind, content: Value) -> PublicComponent {
        PublicComponent { kind, title: None, content }
    }

    #[test]
    fn renders_escaped_page_with_tracked_links() {
        let html = card_page(
            &card(true, vec![
                component(ComponentKind::Links, json!({ "items": [{ "label": "Blog", "url": "https://ada.dev/a?b=c" }] })),
                component(ComponentKind::Text, json!({ "body": "<script>alert(1)</script>" })),
            ]),
            "Cardly",
        )
        .unwrap();

        assert!(html.contains("Ada &lt;Lovelace&gt;"));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("out?url=https%3A%2F%2Fada.dev%2Fa%3Fb%3Dc"));
        assert!(html.contains("#112233"));
        assert!(html.contains("Powered by"));
        assert!(html.contains("/c/ada/vcard"));
    }

    #[test]
    fn branding_can_be_removed() {
        let html = card_page(&card(false, Vec::new()), "Cardly").unwrap();
        assert!(!html.contains("Powered by"));
    }

    #[test]
    fn forms_render_fields_and_honeypot() {
        let form = json!({ "fields": [
            { "name": "email", "label": "E-mail", "type": "email", "required": true },
            { "name": "note", "label": "Note", "type": "textarea" }
        ]});
        let html = card_page(&card(true, vec![component(ComponentKind::Form, form)]), "Cardly").unwrap();
        assert!(html.contains(r#"type="email" name="email" required"#));
        assert!(html.contains(r#"<textarea name="note""#));
        assert!(html.contains(r#"name="website""#));
        assert!(html.contains("/api/public/cards/ada/contacts"));
    }

    #[test]
    fn not_found_page_renders() {
        assert!(not_found_page("Cardly").unwrap().contains("Card not found"));
    }
}
