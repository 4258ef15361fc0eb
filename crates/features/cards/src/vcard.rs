//! vCard 3.0 export of a card's profile and contact components.

use crate::model::PublicCard;
use cardly_domain::component::ComponentKind;
use serde_json::Value;

pub const CONTENT_TYPE: &str = "text/vcard; charset=utf-8";

/// Maximum octets per physical line before folding (RFC 2425 section 5.8.1).
const FOLD_AT: usize = 75;

/// Escapes text values (RFC 2426 section 4).
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(ch),
        }
    }
    out
}

/// URI values are emitted verbatim apart from line breaks, which would end the property.
fn uri(value: &str) -> String {
    value.chars().filter(|ch| !ch.is_control()).collect()
}

/// Appends `line` to `out`, folding it into CRLF + space continuations of at most
/// [`FOLD_AT`] octets without splitting a UTF-8 sequence.
fn push_folded(out: &mut String, line: &str) {
    let mut budget = FOLD_AT;
    let mut used = 0;
    for ch in line.chars() {
        if used + ch.len_utf8() > budget {
            out.push_str("\r\n ");
            // The leading space counts toward the continuation line.
            budget = FOLD_AT - 1;
            used = 0;
        }
        out.push(ch);
        used += ch.len_utf8();
    }
    out.push_str("\r\n");
}

fn field<'a>(content: &'a Value, key: &str) -> Option<&'a str> {
    content.get(key).and_then(Value::as_str).map(str::trim).filter(|v| !v.is_empty())
}

/// Builds the vCard; `link` is the public page, used when no website is given.
#[must_use]
pub fn build(card: &PublicCard, link: &str) -> String {
    let profile = card.components.iter().find(|c| c.kind == ComponentKind::Profile);
    let contact = card.components.iter().find(|c| c.kind == ComponentKind::Contact);
    let profile = |key: &str| profile.and_then(|c| field(&c.content, key));
    let contact = |key: &str| contact.and_then(|c| field(&c.content, key));

    let name = profile("name").unwrap_or(card.title.as_str());
    let mut lines = vec![
        "BEGIN:VCARD".to_owned(),
        "VERSION:3.0".to_owned(),
        format!("FN:{}", escape(name)),
        format!("N:{};;;;", escape(name)),
    ];
    if let Some(title) = profile("title") {
        lines.push(format!("TITLE:{}", escape(title)));
    }
    if let Some(company) = profile("company") {
        lines.push(format!("ORG:{}", escape(company)));
    }
    if let Some(email) = contact("email") {
        lines.push(format!("EMAIL;TYPE=INTERNET:{}", escape(email)));
    }
    if let Some(phone) = contact("phone") {
        lines.push(format!("TEL;TYPE=CELL:{}", escape(phone)));
    }
    if let Some(address) = contact("address") {
        lines.push(format!("ADR;TYPE=WORK:;;{};;;;", escape(address)));
    }
    lines.push(format!("URL:{}", uri(contact("website").unwrap_or(link))));
    if let Some(bio) = profile("bio").or(card.headline.as_deref()) {
        lines.push(format!("NOTE:{}", escape(bio)));
    }
    lines.push("END:VCARD".to_owned());

    let mut out = String::new();
    for line in &lines {
        push_folded(&mut out, line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PublicComponent;
    use serde_json::json;

    fn card(components: Vec<PublicComponent>) -> PublicCard {
        PublicCard {
            slug: "ada".into(),
            title: "Ada's card".into(),
            headline: Some("Analyst".into()),
            accent_color: None,
            branding: true,
            components,
        }
    }

    #[test]
    fn builds_escaped_vcard() {
        let vcard = build(
            &card(vec![
                PublicComponent {
                    kind: ComponentKind::Profile,
                    title: None,
                    content: json!({ "name": "Ada Lovelace", "title": "Countess, Analyst", "company": "Engines; Ltd", "bio": "Line one\nLine two" }),
                },
                PublicComponent {
                    kind: ComponentKind::Contact,
                    title: None,
                    content: json!({ "email": "ada@example.com", "phone": "+44 1", "website": "https://ada.dev" }),
                },
            ]),
            "https://cardly.test/c/ada",
        );

        assert!(vcard.starts_with("BEGIN:VCARD\r\nVERSION:3.0\r\nFN:Ada Lovelace\r\n"));
        assert!(vcard.contains("TITLE:Countess\\, Analyst\r\n"));
        assert!(vcard.contains("ORG:Engines\\; Ltd\r\n"));
        assert!(vcard.contains("EMAIL;TYPE=INTERNET:ada@example.com\r\n"));
        assert!(vcard.contains("TEL;TYPE=CELL:+44 1\r\n"));
        assert!(vcard.contains("URL:https://ada.dev\r\n"));
        assert!(vcard.contains("NOTE:Line one\\nLine two\r\n"));
        assert!(vcard.ends_with("END:VCARD\r\n"));
    }

    #[test]
    fn urls_are_not_text_escaped() {
        let vcard = build(
            &card(vec![PublicComponent {
                kind: ComponentKind::Contact,
                title: None,
                content: json!({ "website": "https://ada.dev/a,b;c?x=1,2" }),
            }]),
            "https://cardly.test/c/ada",
        );
        assert!(vcard.contains("URL:https://ada.dev/a,b;c?x=1,2\r\n"), "{vcard}");
    }

    #[test]
    fn long_lines_are_folded_at_75_octets() {
        let bio = "é".repeat(100);
        let vcard = build(
            &card(vec![PublicComponent {
                kind: ComponentKind::Profile,
                title: None,
                content: json!({ "name": "Ada", "bio": bio }),
            }]),
            "https://cardly.test/c/ada",
        );

        for line in vcard.split("\r\n") {
            assert!(line.len() <= FOLD_AT, "{} octets: {line}", line.len());
        }
        let unfolded = vcard.replace("\r\n ", "");
        assert!(unfolded.contains(&format!("NOTE:{}\r\n", "é".repeat(100))));
    }

    #[test]
    fn falls_back_to_card_title_and_link() {
        let vcard = build(&card(Vec::new()), "https://cardly.test/c/ada");
        assert!(vcard.contains("FN:Ada's card\r\n"));
        assert!(vcard.contains("URL:https://cardly.test/c/ada\r\n"));
        assert!(vcard.contains("NOTE:Analyst\r\n"));
        assert!(!vcard.contains("EMAIL"));
    }
}
