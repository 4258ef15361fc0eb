use crate::Cards;
use crate::content::link_targets;
use crate::error::CardsError;
use crate::model::{Card, Component, PublicCard, PublicComponent};
use crate::{render, vcard};
use cardly_domain::constants::SETTING_SITE_NAME;
use cardly_domain::events::{CardViewed, LinkClicked};
use cardly_kernel::time;
use tracing::{debug, warn};

const DEFAULT_SITE_NAME: &str = "Cardly";

impl Cards {
    /// Components a visitor may see: enabled and allowed by the owner's current tier.
    pub async fn visible_components(&self, card: &Card) -> Result<Vec<Component>, CardsError> {
        let entitlements = self.entitlements(&card.owner).await?;
        Ok(self
            .components(&card.id)
            .await?
            .into_iter()
            .filter(|c| c.enabled && entitlements.allows(c.kind))
            .collect())
    }

    /// A published card by slug; unknown and unpublished slugs are both missing.
    pub async fn published_card(&self, slug: &str) -> Result<Card, CardsError> {
        self.find_by_slug(slug)
            .await?
            .filter(|card| card.published)
            .ok_or_else(|| CardsError::not_found("card"))
    }

    pub async fn public_card(&self, slug: &str) -> Result<(Card, PublicCard), CardsError> {
        let card = self.published_card(slug).await?;
        let entitlements = self.entitlements(&card.owner).await?;
        let components = self
            .visible_components(&card)
            .await?
            .into_iter()
            .map(|c| PublicComponent { kind: c.kind, title: c.title, content: c.content })
            .collect();
        let public = PublicCard {
            slug: card.slug.clone(),
            title: card.title.clone(),
            headline: card.headline.clone(),
            accent_color: card.accent_color.clone(),
            branding: !entitlements.remove_branding,
            components,
        };
        Ok((card, public))
    }

    /// Renders the public page and records the view.
    pub async fn view_page(&self, slug: &str, session: Option<String>) -> Result<String, CardsError> {
        let (card, public) = self.public_card(slug).await?;
        let html = render::card_page(&public, &self.site_name().await)?;
        self.publish(CardViewed {
            card: card.id,
            owner: card.owner,
            session,
            occurred_at: time::now(),
        });
        Ok(html)
    }

    pub async fn not_found_page(&self) -> Result<String, CardsError> {
        render::not_found_page(&self.site_name().await)
    }

    pub async fn vcard(&self, slug: &str) -> Result<String, CardsError> {
        let (card, public) = self.public_card(slug).await?;
        Ok(vcard::build(&public, &card.url))
    }

    /// Resolves an outbound link of a published card and records the click. Only URLs
    /// the card actually shows are followed.
    pub async fn follow_link(
        &self,
        slug: &str,
        url: &str,
        session: Option<String>,
    ) -> Result<String, CardsError> {
        let card = self.published_card(slug).await?;
        let known = self
            .visible_components(&card)
            .await?
            .iter()
            .flat_map(|c| link_targets(c.kind, &c.content))
            .any(|target| target == url);
        if !known {
            debug!(card = %card.id, "Outbound link is not on the card");
            return Err(CardsError::not_found("link"));
        }

        self.publish(LinkClicked {
            card: card.id,
            owner: card.owner,
            target: url.to_owned(),
            session,
            occurred_at: time::now(),
        });
        Ok(url.to_owned())
    }

    async fn site_name(&self) -> String {
        self.settings
            .get_string(SETTING_SITE_NAME)
            .await
            .unwrap_or_else(|| DEFAULT_SITE_NAME.to_owned())
    }

    fn publish<E: cardly_event_bus::Event>(&self, event: E) {
        if let Err(err) = self.events.publish(event) {
            warn!(error = %err, "Failed to publish card event");
        }
    }
}
