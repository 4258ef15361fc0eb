use crate::Contacts;
use crate::error::ContactsError;
use crate::model::{Contact, ContactQuery};
use crate::service::flatten_fields;
use std::collections::HashMap;

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

const HEADER: [&str; 7] = ["name", "email", "phone", "card", "source", "created_at", "fields"];

impl Contacts {
    /// All contacts of `owner` (optionally one card) as CSV. The `card` column holds the
    /// card slug; `fields` is the submitted form as JSON.
    pub async fn export_csv(&self, owner: &str, card: Option<String>) -> Result<String, ContactsError> {
        let query = ContactQuery { card, unread: false };
        let contacts = self.list(owner, &query).await?;
        let slugs: HashMap<String, String> = self
            .cards
            .list_cards(owner)
            .await?
            .into_iter()
            .map(|card| (card.id, card.slug))
            .collect();
        write_csv(&contacts, &slugs)
    }
}

pub(crate) fn write_csv(contacts: &[Contact], slugs: &HashMap<String, String>) -> Result<String, ContactsError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for contact in contacts {
        let created_at = chrono::DateTime::from_timestamp(contact.created_at, 0)
            .map_or_else(|| contact.created_at.to_string(), |at| at.to_rfc3339());
        let fields = serde_json::to_string(&flatten_fields(&contact.fields))?;
        let source: &'static str = contact.source.into();
        writer.write_record([
            contact.name.as_deref().unwrap_or_default(),
            contact.email.as_deref().unwrap_or_default(),
            contact.phone.as_deref().unwrap_or_default(),
            slugs.get(&contact.card).map_or(contact.card.as_str(), String::as_str),
            source,
            created_at.as_str(),
            fields.as_str(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|err| ContactsError::Internal {
        message: err.error().to_string().into(),
        context: Some("Flushing CSV".into()),
    })?;
    String::from_utf8(bytes).map_err(|err| ContactsError::Internal {
        message: err.to_string().into(),
        context: Some("CSV output".into()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContactSource;
    use serde_json::json;

    #[test]
    fn rows_are_quoted_and_cards_resolved() {
        let contact = Contact {
            id: "c1".into(),
            card: "card-1".into(),
            name: Some("Doe, Jane".into()),
            email: Some("jane@example.com".into()),
            phone: None,
            fields: json!({ "name": "Doe, Jane", "note": "hi" }),
            source: ContactSource::Form,
            read: false,
            created_at: 0,
        };
        let slugs = HashMap::from([("card-1".to_owned(), "jane".to_owned())]);
        let csv = write_csv(&[contact], &slugs).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,email,phone,card,source,created_at,fields"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("\"Doe, Jane\",jane@example.com,,jane,form,1970-01-01T00:00:00+00:00,"));
        assert!(row.contains("\"{\"\"name\"\":\"\"Doe, Jane\"\",\"\"note\"\":\"\"hi\"\"}\""));
    }
}
