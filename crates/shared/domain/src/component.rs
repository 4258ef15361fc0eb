use bitflags::bitflags;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Typed content block that can be attached to a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Profile,
    Contact,
    Social,
    Links,
    Text,
    Gallery,
    Video,
    Form,
    Map,
    Embed,
}

impl ComponentKind {
    pub const ALL: [Self; 10] = [
        Self::Profile,
        Self::Contact,
        Self::Social,
        Self::Links,
        Self::Text,
        Self::Gallery,
        Self::Video,
        Self::Form,
        Self::Map,
        Self::Embed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Contact => "contact",
            Self::Social => "social",
            Self::Links => "links",
            Self::Text => "text",
            Self::Gallery => "gallery",
            Self::Video => "video",
            Self::Form => "form",
            Self::Map => "map",
            Self::Embed => "embed",
        }
    }

    /// The single-bit flag for this kind.
    #[must_use]
    pub const fn flag(self) -> ComponentSet {
        match self {
            Self::Profile => ComponentSet::PROFILE,
            Self::Contact => ComponentSet::CONTACT,
            Self::Social => ComponentSet::SOCIAL,
            Self::Links => ComponentSet::LINKS,
            Self::Text => ComponentSet::TEXT,
            Self::Gallery => ComponentSet::GALLERY,
            Self::Video => ComponentSet::VIDEO,
            Self::Form => ComponentSet::FORM,
            Self::Map => ComponentSet::MAP,
            Self::Embed => ComponentSet::EMBED,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown component kind '{s}'"))
    }
}

bitflags! {
    /// A set of component kinds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct ComponentSet: u16 {
        const PROFILE = 1 << 0;
        const CONTACT = 1 << 1;
        const SOCIAL = 1 << 2;
        const LINKS = 1 << 3;
        const TEXT = 1 << 4;
        const GALLERY = 1 << 5;
        const VIDEO = 1 << 6;
        const FORM = 1 << 7;
        const MAP = 1 << 8;
        const EMBED = 1 << 9;

        const BASIC = Self::PROFILE.bits()
            | Self::CONTACT.bits()
            | Self::SOCIAL.bits()
            | Self::LINKS.bits()
            | Self::TEXT.bits();
        const STANDARD = Self::BASIC.bits()
            | Self::GALLERY.bits()
            | Self::VIDEO.bits()
            | Self::FORM.bits();
        const ALL = Self::STANDARD.bits() | Self::MAP.bits() | Self::EMBED.bits();
    }
}

impl ComponentSet {
    #[must_use]
    pub const fn allows(self, kind: ComponentKind) -> bool {
        self.contains(kind.flag())
    }

    /// Kinds in the set, in catalog order.
    pub fn kinds(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL.into_iter().filter(move |kind| self.allows(*kind))
    }
}

impl FromIterator<ComponentKind> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, kind| set | kind.flag())
    }
}

impl Serialize for ComponentSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.kinds())
    }
}

impl<'de> Deserialize<'de> for ComponentSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        names
            .iter()
            .map(|name| name.parse::<ComponentKind>().map_err(D::Error::custom))
            .collect()
    }
}
