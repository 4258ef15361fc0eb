use crate::Nfc;
use crate::error::NfcError;
use crate::model::{NfcTag, RegisterTagRequest, TagRow, UpdateTagRequest};
use crate::tag_uid;
use cardly_cards::Card;
use cardly_domain::events::CardTapped;
use cardly_kernel::time;
use tracing::{debug, info, warn};

pub const MAX_LABEL_CHARS: usize = 80;

const TAG_FIELDS: &str =
    "uid, owner, card, label, active, tap_count, last_tapped_at, created_at, updated_at";

fn validate_uid(raw: &str) -> Result<String, NfcError> {
    tag_uid::normalize(raw).map_err(NfcError::validation)
}

fn validate_label(label: Option<&str>) -> Result<Option<String>, NfcError> {
    match label.map(str::trim).filter(|l| !l.is_empty()) {
        None => Ok(None),
        Some(l) if l.chars().count() <= MAX_LABEL_CHARS => Ok(Some(l.to_owned())),
        Some(_) => Err(NfcError::validation("label must be at most 80 characters")),
    }
}

impl Nfc {
    /// Links a tag to one of the owner's cards. An own tag is reassigned; a new one
    /// counts against the tier's tag limit.
    pub async fn register(&self, owner: &str, request: RegisterTagRequest) -> Result<NfcTag, NfcError> {
        let uid = validate_uid(&request.uid)?;
        let label = validate_label(request.label.as_deref())?;
        let card = self.owned_card(owner, &request.card).await?;
        let now = time::now();

        if let Some(mut existing) = self.find(&uid).await? {
            if existing.owner != owner {
                return Err(NfcError::Conflict {
                    message: "this tag is registered to another account".into(),
                    context: Some(uid.into()),
                });
            }
            existing.card = card.id;
            existing.label = label;
            existing.active = true;
            existing.updated_at = now;
            self.save(&existing).await?;
            info!(tag = %existing.uid, card = %existing.card, "NFC tag reassigned");
            return Ok(existing.into());
        }

        let entitlements = self.billing.entitlements(owner).await?;
        let count = self.list(owner).await?.len();
        if count >= usize::try_from(entitlements.max_nfc_tags).unwrap_or(usize::MAX) {
            return Err(NfcError::Entitlement {
                message: format!(
                    "the {} plan allows at most {} NFC tags",
                    entitlements.tier, entitlements.max_nfc_tags
                )
                .into(),
                context: None,
            });
        }

        let row = TagRow {
            uid,
            owner: owner.to_owned(),
            card: card.id,
            label,
            active: true,
            tap_count: 0,
            last_tapped_at: None,
            created_at: now,
            updated_at: now,
        };
        self.db.query("CREATE nfc_tag CONTENT $row").bind(("row", row.clone())).await?.check()?;
        info!(tag = %row.uid, card = %row.card, "NFC tag registered");
        Ok(row.into())
    }

    pub async fn list(&self, owner: &str) -> Result<Vec<NfcTag>, NfcError> {
        let rows: Vec<TagRow> = self
            .db
            .query(format!("SELECT {TAG_FIELDS} FROM nfc_tag WHERE owner = $owner ORDER BY created_at ASC"))
            .bind(("owner", owner.to_owned()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(NfcTag::from).collect())
    }

    pub async fn update(&self, owner: &str, uid: &str, request: UpdateTagRequest) -> Result<NfcTag, NfcError> {
        let mut row = self.owned_row(owner, uid).await?;
        if let Some(card) = request.card.as_deref() {
            row.card = self.owned_card(owner, card).await?.id;
        }
        if let Some(label) = request.label.as_deref() {
            row.label = validate_label(Some(label))?;
        }
        if let Some(active) = request.active {
            row.active = active;
        }
        row.updated_at = time::now();
        self.save(&row).await?;
        debug!(tag = %row.uid, "NFC tag updated");
        Ok(row.into())
    }

    pub async fn remove(&self, owner: &str, uid: &str) -> Result<(), NfcError> {
        let row = self.owned_row(owner, uid).await?;
        self.db.query("DELETE nfc_tag WHERE uid = $uid").bind(("uid", row.uid.clone())).await?.check()?;
        info!(tag = %row.uid, "NFC tag removed");
        Ok(())
    }

    /// Resolves a tap to the public card address. Unknown, inactive and unpublished
    /// targets are all missing.
    pub async fn tap(&self, raw_uid: &str) -> Result<String, NfcError> {
        let uid = tag_uid::normalize(raw_uid).map_err(|_| NfcError::not_found("tag"))?;
        let tag = self
            .find(&uid)
            .await?
            .filter(|tag| tag.active)
            .ok_or_else(|| NfcError::not_found("tag"))?;
        let card = self.owned_card(&tag.owner, &tag.card).await?;
        if !card.published {
            return Err(NfcError::not_found("card"));
        }

        let now = time::now();
        self.db
            .query("UPDATE nfc_tag SET tap_count += 1, last_tapped_at = $now WHERE uid = $uid")
            .bind(("now", now))
            .bind(("uid", tag.uid.clone()))
            .await?
            .check()?;
        if let Err(err) = self.events.publish(CardTapped {
            card: card.id,
            owner: tag.owner,
            tag: tag.uid,
            occurred_at: now,
        }) {
            warn!(error = %err, "Failed to publish CardTapped");
        }
        Ok(card.url)
    }

    async fn owned_card(&self, owner: &str, card: &str) -> Result<Card, NfcError> {
        self.cards.find_owned(owner, card).await.map_err(NfcError::from_lookup)
    }

    async fn find(&self, uid: &str) -> Result<Option<TagRow>, NfcError> {
        Ok(self
            .db
            .query(format!("SELECT {TAG_FIELDS} FROM nfc_tag WHERE uid = $uid LIMIT 1"))
            .bind(("uid", uid.to_owned()))
            .await?
            .take(0)?)
    }

    async fn owned_row(&self, owner: &str, raw_uid: &str) -> Result<TagRow, NfcError> {
        let uid = tag_uid::normalize(raw_uid).map_err(|_| NfcError::not_found("tag"))?;
        self.find(&uid)
            .await?
            .filter(|tag| tag.owner == owner)
            .ok_or_else(|| NfcError::not_found("tag"))
    }

    async fn save(&self, row: &TagRow) -> Result<(), NfcError> {
        self.db
            .query("UPDATE nfc_tag SET card = $card, label = $label, active = $active, updated_at = $now WHERE uid = $uid")
            .bind(("card", row.card.clone()))
            .bind(("label", row.label.clone()))
            .bind(("active", row.active))
            .bind(("now", row.updated_at))
            .bind(("uid", row.uid.clone()))
            .await?
            .check()?;
        Ok(())
    }
}
