use crate::Cards;
use crate::content;
use crate::error::CardsError;
use crate::model::{
    CardDetail, CardRow, CatalogEntry, Component, ComponentRow, CreateCardRequest,
    UpdateCardRequest, UpdateComponentRequest, Card, empty_object,
};
use cardly_domain::component::ComponentKind;
use cardly_domain::slug;
use cardly_domain::tier::{Entitlements, minimum_tier};
use cardly_kernel::{safe_nanoid, time};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info};

pub(crate) const CARD_FIELDS: &str =
    "uid, owner, slug, title, headline, accent_color, published, created_at, updated_at";
pub(crate) const COMPONENT_FIELDS: &str =
    "uid, card, kind, position, enabled, title, data, created_at, updated_at";

pub const MAX_TITLE_CHARS: usize = 80;
pub const MAX_HEADLINE_CHARS: usize = 160;

fn validate_title(title: &str) -> Result<String, CardsError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
        return Err(CardsError::validation("title must be 1 to 80 characters"));
    }
    Ok(title.to_owned())
}

/// `None` and blank input clear the value.
fn optional_text(value: Option<&str>, max: usize, what: &str) -> Result<Option<String>, CardsError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if v.chars().count() <= max => Ok(Some(v.to_owned())),
        Some(_) => Err(CardsError::validation(format!("{what} must be at most {max} characters"))),
    }
}

/// `#rrggbb`, stored lowercase.
fn validate_accent(color: Option<&str>) -> Result<Option<String>, CardsError> {
    let Some(color) = color.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].bytes().all(|b| b.is_ascii_hexdigit());
    if valid {
        Ok(Some(color.to_ascii_lowercase()))
    } else {
        Err(CardsError::validation("accent color must look like #rrggbb"))
    }
}

fn validate_slug(raw: &str) -> Result<String, CardsError> {
    let slug = slug::normalize(raw);
    slug::validate(&slug).map_err(CardsError::validation)?;
    Ok(slug)
}

fn validate_content(kind: ComponentKind, content: &Value) -> Result<(), CardsError> {
    content::validate(kind, content).map_err(|message| CardsError::Validation {
        message: message.into(),
        context: Some(kind.as_str().into()),
    })
}

impl CardRow {
    pub(crate) fn into_card(self, url: String) -> Card {
        Card {
            id: self.uid,
            owner: self.owner,
            slug: self.slug,
            title: self.title,
            headline: self.headline,
            accent_color: self.accent_color,
            published: self.published,
            url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl ComponentRow {
    pub(crate) fn into_component(self) -> Result<Component, CardsError> {
        let kind = self.kind.parse::<ComponentKind>().map_err(|message| CardsError::Internal {
            message: message.into(),
            context: Some(self.uid.clone().into()),
        })?;
        Ok(Component {
            content: serde_json::from_str(&self.data)?,
            id: self.uid,
            card: self.card,
            kind,
            position: u32::try_from(self.position).unwrap_or_default(),
            enabled: self.enabled,
            title: self.title,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl Cards {
    pub(crate) fn card(&self, row: CardRow) -> Card {
        let url = self.public.public_link(&format!("c/{}", row.slug));
        row.into_card(url)
    }

    pub(crate) async fn entitlements(&self, owner: &str) -> Result<Entitlements, CardsError> {
        Ok(self.billing.entitlements(owner).await?)
    }

    // --- Cards ---

    pub async fn create_card(&self, owner: &str, request: CreateCardRequest) -> Result<CardDetail, CardsError> {
        let slug = validate_slug(&request.slug)?;
        let title = validate_title(&request.title)?;
        let headline = optional_text(request.headline.as_deref(), MAX_HEADLINE_CHARS, "headline")?;
        let accent_color = validate_accent(request.accent_color.as_deref())?;

        let entitlements = self.entitlements(owner).await?;
        let existing = self.count("card", "owner", owner).await?;
        if existing >= i64::from(entitlements.max_cards) {
            return Err(CardsError::Entitlement {
                message: format!(
                    "the {} plan allows at most {} cards",
                    entitlements.tier, entitlements.max_cards
                )
                .into(),
                context: None,
            });
        }
        self.ensure_slug_free(&slug, None).await?;

        let now = time::now();
        let row = CardRow {
            uid: safe_nanoid!(),
            owner: owner.to_owned(),
            slug,
            title,
            headline,
            accent_color,
            published: false,
            created_at: now,
            updated_at: now,
        };
        let profile = ComponentRow {
            uid: safe_nanoid!(),
            card: row.uid.clone(),
            kind: ComponentKind::Profile.as_str().to_owned(),
            position: 0,
            enabled: true,
            title: None,
            data: empty_object().to_string(),
            created_at: now,
            updated_at: now,
        };
        self.db
            .query("BEGIN TRANSACTION; CREATE card CONTENT $card; CREATE component CONTENT $profile; COMMIT TRANSACTION;")
            .bind(("card", row.clone()))
            .bind(("profile", profile.clone()))
            .await?
            .check()?;
        info!(card = %row.uid, owner = %owner, slug = %row.slug, "Card created");

        Ok(CardDetail { card: self.card(row), components: vec![profile.into_component()?] })
    }

    pub async fn list_cards(&self, owner: &str) -> Result<Vec<Card>, CardsError> {
        let rows: Vec<CardRow> = self
            .db
            .query(format!("SELECT {CARD_FIELDS} FROM card WHERE owner = $owner ORDER BY created_at ASC"))
            .bind(("owner", owner.to_owned()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(|row| self.card(row)).collect())
    }

    pub async fn get_card(&self, owner: &str, card: &str) -> Result<CardDetail, CardsError> {
        let row = self.owned_row(owner, card).await?;
        let components = self.components(&row.uid).await?;
        Ok(CardDetail { card: self.card(row), components })
    }

    pub async fn update_card(
        &self,
        owner: &str,
        card: &str,
        request: UpdateCardRequest,
    ) -> Result<Card, CardsError> {
        let mut row = self.owned_row(owner, card).await?;

        if let Some(raw) = request.slug.as_deref() {
            let slug = validate_slug(raw)?;
            if slug != row.slug {
                self.ensure_slug_free(&slug, Some(&row.uid)).await?;
                row.slug = slug;
            }
        }
        if let Some(title) = request.title.as_deref() {
            row.title = validate_title(title)?;
        }
        if let Some(headline) = request.headline.as_deref() {
            row.headline = optional_text(Some(headline), MAX_HEADLINE_CHARS, "headline")?;
        }
        if let Some(color) = request.accent_color.as_deref() {
            row.accent_color = validate_accent(Some(color))?;
        }
        row.updated_at = time::now();

        self.save_card(&row).await?;
        debug!(card = %row.uid, "Card updated");
        Ok(self.card(row))
    }

    /// Deletes the card together with its components.
    pub async fn delete_card(&self, owner: &str, card: &str) -> Result<(), CardsError> {
        let row = self.owned_row(owner, card).await?;
        self.db
            .query("BEGIN TRANSACTION; DELETE component WHERE card = $card; DELETE card WHERE uid = $card; COMMIT TRANSACTION;")
            .bind(("card", row.uid.clone()))
            .await?
            .check()?;
        info!(card = %row.uid, owner = %owner, "Card deleted");
        Ok(())
    }

    pub async fn set_published(&self, owner: &str, card: &str, published: bool) -> Result<Card, CardsError> {
        let mut row = self.owned_row(owner, card).await?;
        row.published = published;
        row.updated_at = time::now();
        self.save_card(&row).await?;
        info!(card = %row.uid, published, "Card visibility changed");
        Ok(self.card(row))
    }

    /// The card if `owner` owns it. Foreign cards are reported as missing.
    pub async fn find_owned(&self, owner: &str, card: &str) -> Result<Card, CardsError> {
        let row = self.owned_row(owner, card).await?;
        Ok(self.card(row))
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Card>, CardsError> {
        let rows: Vec<CardRow> = self
            .db
            .query(format!("SELECT {CARD_FIELDS} FROM card WHERE slug = $slug LIMIT 1"))
            .bind(("slug", slug::normalize(slug)))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next().map(|row| self.card(row)))
    }

    pub(crate) async fn owned_row(&self, owner: &str, card: &str) -> Result<CardRow, CardsError> {
        let rows: Vec<CardRow> = self
            .db
            .query(format!("SELECT {CARD_FIELDS} FROM card WHERE uid = $uid AND owner = $owner LIMIT 1"))
            .bind(("uid", card.to_owned()))
            .bind(("owner", owner.to_owned()))
            .await?
            .take(0)?;
        rows.into_iter().next().ok_or_else(|| CardsError::not_found("card"))
    }

    pub(crate) async fn save_card(&self, row: &CardRow) -> Result<(), CardsError> {
        self.db
            .query("UPDATE card CONTENT $row WHERE uid = $uid")
            .bind(("row", row.clone()))
            .bind(("uid", row.uid.clone()))
            .await?
            .check()?;
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<&str>) -> Result<(), CardsError> {
        let taken: Vec<String> = self
            .db
            .query("SELECT VALUE uid FROM card WHERE slug = $slug")
            .bind(("slug", slug.to_owned()))
            .await?
            .take(0)?;
        if taken.iter().any(|uid| Some(uid.as_str()) != except) {
            return Err(CardsError::Conflict {
                message: format!("slug '{slug}' is already taken").into(),
                context: None,
            });
        }
        Ok(())
    }

    async fn count(&self, table: &'static str, field: &'static str, value: &str) -> Result<i64, CardsError> {
        let count: Option<i64> = self
            .db
            .query(format!("RETURN array::len(SELECT VALUE uid FROM {table} WHERE {field} = $value)"))
            .bind(("value", value.to_owned()))
            .await?
            .take(0)?;
        Ok(count.unwrap_or_default())
    }

    // --- Components ---

    /// Components of a card ordered by position.
    pub async fn components(&self, card: &str) -> Result<Vec<Component>, CardsError> {
        let rows: Vec<ComponentRow> = self
            .db
            .query(format!("SELECT {COMPONENT_FIELDS} FROM component WHERE card = $card ORDER BY position ASC"))
            .bind(("card", card.to_owned()))
            .await?
            .take(0)?;
        rows.into_iter().map(ComponentRow::into_component).collect()
    }

    /// Appends a component after checking the tier rules and the content.
    pub async fn add_component(
        &self,
        owner: &str,
        card: &str,
        kind: ComponentKind,
        title: Option<&str>,
        content: Value,
    ) -> Result<Component, CardsError> {
        let card = self.owned_row(owner, card).await?;
        let title = optional_text(title, MAX_TITLE_CHARS, "title")?;
        validate_content(kind, &content)?;

        let existing = self.components(&card.uid).await?;
        let entitlements = self.entitlements(owner).await?;
        entitlements.check_component(kind, u32::try_from(existing.len()).unwrap_or(u32::MAX))?;

        let now = time::now();
        let row = ComponentRow {
            uid: safe_nanoid!(),
            card: card.uid.clone(),
            kind: kind.as_str().to_owned(),
            position: i64::try_from(existing.len()).unwrap_or(i64::MAX),
            enabled: true,
            title,
            data: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.db.query("CREATE component CONTENT $row").bind(("row", row.clone())).await?.check()?;
        info!(card = %card.uid, component = %row.uid, kind = %kind, "Component added");
        row.into_component()
    }

    pub async fn update_component(
        &self,
        owner: &str,
        card: &str,
        component: &str,
        request: UpdateComponentRequest,
    ) -> Result<Component, CardsError> {
        let card = self.owned_row(owner, card).await?;
        let components = self.components(&card.uid).await?;
        let mut target = components
            .iter()
            .find(|c| c.id == component)
            .cloned()
            .ok_or_else(|| CardsError::not_found("component"))?;

        if let Some(title) = request.title.as_deref() {
            target.title = optional_text(Some(title), MAX_TITLE_CHARS, "title")?;
        }
        if let Some(content) = request.content {
            validate_content(target.kind, &content)?;
            target.content = content;
        }
        if request.enabled == Some(true) && !target.enabled {
            let entitlements = self.entitlements(owner).await?;
            let enabled = components.iter().filter(|c| c.enabled).count();
            entitlements.check_component(target.kind, u32::try_from(enabled).unwrap_or(u32::MAX))?;
        }
        if let Some(enabled) = request.enabled {
            target.enabled = enabled;
        }
        target.updated_at = time::now();

        self.db
            .query("UPDATE component SET title = $title, data = $data, enabled = $enabled, updated_at = $now WHERE uid = $uid")
            .bind(("title", target.title.clone()))
            .bind(("data", target.content.to_string()))
            .bind(("enabled", target.enabled))
            .bind(("now", target.updated_at))
            .bind(("uid", target.id.clone()))
            .await?
            .check()?;
        debug!(component = %target.id, "Component updated");
        Ok(target)
    }

    /// Removes a component and compacts the remaining positions.
    pub async fn remove_component(&self, owner: &str, card: &str, component: &str) -> Result<(), CardsError> {
        let card = self.owned_row(owner, card).await?;
        let components = self.components(&card.uid).await?;
        if !components.iter().any(|c| c.id == component) {
            return Err(CardsError::not_found("component"));
        }

        self.db
            .query("DELETE component WHERE uid = $uid")
            .bind(("uid", component.to_owned()))
            .await?
            .check()?;
        let order: Vec<String> =
            components.into_iter().map(|c| c.id).filter(|id| id != component).collect();
        self.write_positions(&card.uid, order).await?;
        info!(card = %card.uid, component = %component, "Component removed");
        Ok(())
    }

    /// Applies a new order. `order` must list every component of the card exactly once.
    pub async fn reorder_components(
        &self,
        owner: &str,
        card: &str,
        order: Vec<String>,
    ) -> Result<Vec<Component>, CardsError> {
        let card = self.owned_row(owner, card).await?;
        let current: HashSet<String> =
            self.components(&card.uid).await?.into_iter().map(|c| c.id).collect();
        let requested: HashSet<&String> = order.iter().collect();

        if order.len() != current.len()
            || requested.len() != order.len()
            || !order.iter().all(|id| current.contains(id))
        {
            return Err(CardsError::validation(
                "order must list every component of the card exactly once",
            ));
        }

        self.write_positions(&card.uid, order).await?;
        debug!(card = %card.uid, "Components reordered");
        self.components(&card.uid).await
    }

    /// Sets each component's position to its index in `order`.
    async fn write_positions(&self, card: &str, order: Vec<String>) -> Result<(), CardsError> {
        self.db
            .query(
                "BEGIN TRANSACTION;
                FOR $uid IN $order {
                    UPDATE component SET position = array::find_index($order, $uid), updated_at = $now
                        WHERE card = $card AND uid = $uid;
                };
                COMMIT TRANSACTION;",
            )
            .bind(("order", order))
            .bind(("card", card.to_owned()))
            .bind(("now", time::now()))
            .await?
            .check()?;
        Ok(())
    }

    /// Every component kind with its availability on the owner's tier.
    pub async fn catalog(&self, owner: &str) -> Result<Vec<CatalogEntry>, CardsError> {
        let entitlements = self.entitlements(owner).await?;
        Ok(ComponentKind::ALL
            .into_iter()
            .map(|kind| CatalogEntry { kind, allowed: entitlements.allows(kind), min_tier: minimum_tier(kind) })
            .collect())
    }
}
