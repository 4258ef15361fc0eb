use crate::Contacts;
use crate::error::ContactsError;
use crate::model::{CaptureRequest, Contact, ContactQuery, ContactRow, ContactSource};
use cardly_cards::{Card, FieldType, FormField, form_fields};
use cardly_domain::component::ComponentKind;
use cardly_domain::events::ContactCaptured;
use cardly_kernel::mail::Email;
use cardly_kernel::validation::is_valid_email;
use cardly_kernel::{safe_nanoid, time};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const MAX_FIELD_CHARS: usize = 2_000;

pub(crate) const CONTACT_FIELDS: &str =
    "uid, card, owner, name, email, phone, fields, source, is_read, created_at";

impl ContactRow {
    pub(crate) fn into_contact(self) -> Result<Contact, ContactsError> {
        Ok(Contact {
            fields: serde_json::from_str(&self.fields)?,
            source: self.source.parse().unwrap_or_default(),
            id: self.uid,
            card: self.card,
            name: self.name,
            email: self.email,
            phone: self.phone,
            read: self.is_read,
            created_at: self.created_at,
        })
    }
}

/// Checks `submitted` against the form definition and returns the trimmed values.
pub(crate) fn check_submission(
    form: &[FormField],
    submitted: BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, ContactsError> {
    if let Some(unknown) = submitted.keys().find(|name| !form.iter().any(|f| &f.name == *name)) {
        return Err(ContactsError::validation(format!("unknown field '{unknown}'")));
    }

    let mut values = BTreeMap::new();
    for (name, value) in submitted {
        let value = value.trim();
        if value.chars().count() > MAX_FIELD_CHARS {
            return Err(ContactsError::validation(format!(
                "'{name}' must be at most {MAX_FIELD_CHARS} characters"
            )));
        }
        if !value.is_empty() {
            values.insert(name, value.to_owned());
        }
    }

    for field in form {
        match values.get(&field.name) {
            None if field.required => {
                return Err(ContactsError::validation(format!("'{}' is required", field.label)));
            }
            Some(value) if field.field_type == FieldType::Email && !is_valid_email(value) => {
                return Err(ContactsError::validation(format!(
                    "'{}' is not a valid e-mail address",
                    field.label
                )));
            }
            _ => {}
        }
    }
    Ok(values)
}

/// The `name` field, or else the first text field.
fn pick_name(form: &[FormField], values: &BTreeMap<String, String>) -> Option<String> {
    values.get("name").cloned().or_else(|| pick(form, values, FieldType::Text))
}

fn pick(form: &[FormField], values: &BTreeMap<String, String>, field_type: FieldType) -> Option<String> {
    form.iter()
        .filter(|f| f.field_type == field_type)
        .find_map(|f| values.get(&f.name).cloned())
}

impl Contacts {
    /// Stores a visitor submission for a published card with an enabled form.
    ///
    /// Returns `None` when the honeypot was filled in; the submission is dropped without
    /// telling the sender.
    pub async fn capture(&self, slug: &str, request: CaptureRequest) -> Result<Option<Contact>, ContactsError> {
        let card = self.cards.published_card(slug).await.map_err(ContactsError::from_lookup)?;
        let form = self.form_of(&card).await?;

        if request.website.as_deref().is_some_and(|v| !v.trim().is_empty()) {
            debug!(card = %card.id, "Honeypot filled, submission dropped");
            return Ok(None);
        }

        let values = check_submission(&form, request.fields)?;
        let row = ContactRow {
            uid: safe_nanoid!(),
            card: card.id.clone(),
            owner: card.owner.clone(),
            name: pick_name(&form, &values),
            email: pick(&form, &values, FieldType::Email),
            phone: pick(&form, &values, FieldType::Phone),
            fields: serde_json::to_string(&values)?,
            source: request.source.unwrap_or_default().to_string(),
            is_read: false,
            created_at: time::now(),
        };
        self.db.query("CREATE contact CONTENT $row").bind(("row", row.clone())).await?.check()?;
        info!(card = %card.id, contact = %row.uid, "Contact captured");

        if let Err(err) = self.events.publish(ContactCaptured {
            card: card.id.clone(),
            owner: card.owner.clone(),
            contact: row.uid.clone(),
            occurred_at: row.created_at,
        }) {
            warn!(error = %err, "Failed to publish ContactCaptured");
        }
        self.notify_owner(&card, &row).await;

        row.into_contact().map(Some)
    }

    /// Field definitions of the first visible form on the card.
    async fn form_of(&self, card: &Card) -> Result<Vec<FormField>, ContactsError> {
        self.cards
            .visible_components(card)
            .await?
            .into_iter()
            .find(|c| c.kind == ComponentKind::Form)
            .map(|c| form_fields(&c.content))
            .filter(|fields| !fields.is_empty())
            .ok_or_else(|| ContactsError::Conflict {
                message: "this card does not accept contact requests".into(),
                context: Some(card.slug.clone().into()),
            })
    }

    async fn notify_owner(&self, card: &Card, row: &ContactRow) {
        let owner = match self.identity.me(&card.owner).await {
            Ok(owner) => owner,
            Err(err) => {
                warn!(owner = %card.owner, error = %err, "Cannot notify owner of new contact");
                return;
            }
        };
        let who = row.name.as_deref().or(row.email.as_deref()).unwrap_or("A visitor");
        let body = format!(
            "{who} left their details on your card \"{}\".\n\nSee all contacts at {}",
            card.title,
            self.public.public_link("contacts"),
        );
        self.mailer.notify(&Email::new(owner.email, format!("New contact from {}", card.title), body));
    }

    /// Contacts of `owner`, newest first.
    pub async fn list(&self, owner: &str, query: &ContactQuery) -> Result<Vec<Contact>, ContactsError> {
        let mut filter = String::from("owner = $owner");
        if query.card.is_some() {
            filter.push_str(" AND card = $card");
        }
        if query.unread {
            filter.push_str(" AND is_read = false");
        }
        let rows: Vec<ContactRow> = self
            .db
            .query(format!("SELECT {CONTACT_FIELDS} FROM contact WHERE {filter} ORDER BY created_at DESC"))
            .bind(("owner", owner.to_owned()))
            .bind(("card", query.card.clone()))
            .await?
            .take(0)?;
        rows.into_iter().map(ContactRow::into_contact).collect()
    }

    pub async fn mark_read(&self, owner: &str, contact: &str, read: bool) -> Result<Contact, ContactsError> {
        let mut row = self.owned_row(owner, contact).await?;
        self.db
            .query("UPDATE contact SET is_read = $read WHERE uid = $uid")
            .bind(("read", read))
            .bind(("uid", row.uid.clone()))
            .await?
            .check()?;
        row.is_read = read;
        row.into_contact()
    }

    pub async fn delete(&self, owner: &str, contact: &str) -> Result<(), ContactsError> {
        let row = self.owned_row(owner, contact).await?;
        self.db.query("DELETE contact WHERE uid = $uid").bind(("uid", row.uid.clone())).await?.check()?;
        info!(contact = %row.uid, "Contact deleted");
        Ok(())
    }

    async fn owned_row(&self, owner: &str, contact: &str) -> Result<ContactRow, ContactsError> {
        let row: Option<ContactRow> = self
            .db
            .query(format!("SELECT {CONTACT_FIELDS} FROM contact WHERE uid = $uid AND owner = $owner LIMIT 1"))
            .bind(("uid", contact.to_owned()))
            .bind(("owner", owner.to_owned()))
            .await?
            .take(0)?;
        row.ok_or_else(|| ContactsError::not_found("contact"))
    }
}

/// Value of a stored field map as a flat string map, for export.
pub(crate) fn flatten_fields(fields: &Value) -> BTreeMap<String, String> {
    fields
        .as_object()
        .into_iter()
        .flatten()
        .map(|(k, v)| (k.clone(), v.as_str().map_or_else(|| v.to_string(), str::to_owned)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> Vec<FormField> {
        vec![
            FormField { name: "name".into(), label: "Name".into(), field_type: FieldType::Text, required: true },
            FormField { name: "mail".into(), label: "E-mail".into(), field_type: FieldType::Email, required: false },
            FormField { name: "tel".into(), label: "Phone".into(), field_type: FieldType::Phone, required: false },
        ]
    }

    fn submit(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
    }

    #[test]
    fn values_are_trimmed_and_blank_ones_dropped() {
        let values = check_submission(&form(), submit(&[("name", "  Ada "), ("tel", " ")])).unwrap();
        assert_eq!(values.get("name").map(String::as_str), Some("Ada"));
        assert!(!values.contains_key("tel"));
    }

    #[test]
    fn required_unknown_and_email_fields_are_checked() {
        assert!(check_submission(&form(), submit(&[("name", "   ")])).is_err());
        assert!(check_submission(&form(), submit(&[("name", "Ada"), ("extra", "x")])).is_err());
        assert!(check_submission(&form(), submit(&[("name", "Ada"), ("mail", "nope")])).is_err());
        assert!(check_submission(&form(), submit(&[("name", "Ada"), ("mail", "ada@example.com")])).is_ok());
    }

    #[test]
    fn long_values_are_rejected() {
        let long = "x".repeat(MAX_FIELD_CHARS + 1);
        assert!(check_submission(&form(), submit(&[("name", long.as_str())])).is_err());
    }

    #[test]
    fn name_email_and_phone_are_picked_by_type() {
        let values = submit(&[("name", "Ada"), ("mail", "ada@example.com"), ("tel", "+1 555")]);
        assert_eq!(pick_name(&form(), &values).as_deref(), Some("Ada"));
        assert_eq!(pick(&form(), &values, FieldType::Email).as_deref(), Some("ada@example.com"));
        assert_eq!(pick(&form(), &values, FieldType::Phone).as_deref(), Some("+1 555"));
    }
}
