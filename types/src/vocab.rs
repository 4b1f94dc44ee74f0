//! Fixed vocabularies: place categories and review tags.
//!
//! Both are closed sets known at compile time. An unknown tag in a submission
//! is an input error; an unknown category reads as `other`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::VouchError;

/// Category of a place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Atm,
    Hospital,
    Pharmacy,
    Restaurant,
    Cafe,
    Service,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Atm,
        Category::Hospital,
        Category::Pharmacy,
        Category::Restaurant,
        Category::Cafe,
        Category::Service,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Atm => "atm",
            Self::Hospital => "hospital",
            Self::Pharmacy => "pharmacy",
            Self::Restaurant => "restaurant",
            Self::Cafe => "cafe",
            Self::Service => "service",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Atm => "ATM",
            Self::Hospital => "Hospital",
            Self::Pharmacy => "Pharmacy",
            Self::Restaurant => "Restaurant",
            Self::Cafe => "Cafe",
            Self::Service => "Service",
            Self::Other => "Other",
        }
    }

    /// Parse a category key. Unknown keys fall back to [`Category::Other`],
    /// matching how seeded data with unmapped categories is displayed.
    pub fn from_key(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == key)
            .unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display grouping of tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagGroup {
    Communication,
    Practical,
    Warnings,
}

/// A review tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    EnglishMenu,
    EnglishStaff,
    ForeignerFriendly,
    CardOk,
    FreeWifi,
    QuietWorkspace,
    Vegetarian,
    Halal,
    LateNight,
    CashOnly,
    KoreanOnly,
    LongWait,
    ForeignerMarkup,
}

/// (tag, key, label, group), in declaration order.
static TAG_TABLE: [(Tag, &str, &str, TagGroup); 13] = [
    (Tag::EnglishMenu, "english_menu", "English menu", TagGroup::Communication),
    (Tag::EnglishStaff, "english_staff", "English staff", TagGroup::Communication),
    (Tag::ForeignerFriendly, "foreigner_friendly", "Foreigner-friendly", TagGroup::Communication),
    (Tag::CardOk, "card_ok", "Card OK", TagGroup::Communication),
    (Tag::FreeWifi, "free_wifi", "Free WiFi", TagGroup::Practical),
    (Tag::QuietWorkspace, "quiet_workspace", "Quiet workspace", TagGroup::Practical),
    (Tag::Vegetarian, "vegetarian", "Vegetarian options", TagGroup::Practical),
    (Tag::Halal, "halal", "Halal", TagGroup::Practical),
    (Tag::LateNight, "late_night", "Late night", TagGroup::Practical),
    (Tag::CashOnly, "cash_only", "Cash only", TagGroup::Warnings),
    (Tag::KoreanOnly, "korean_only", "Korean only", TagGroup::Warnings),
    (Tag::LongWait, "long_wait", "Long wait", TagGroup::Warnings),
    (Tag::ForeignerMarkup, "foreigner_markup", "Foreigner markup", TagGroup::Warnings),
];

impl Tag {
    pub fn all() -> impl Iterator<Item = Tag> {
        TAG_TABLE.iter().map(|(tag, ..)| *tag)
    }

    fn row(&self) -> &'static (Tag, &'static str, &'static str, TagGroup) {
        &TAG_TABLE[*self as usize]
    }

    pub fn as_str(&self) -> &'static str {
        self.row().1
    }

    pub fn label(&self) -> &'static str {
        self.row().2
    }

    pub fn group(&self) -> TagGroup {
        self.row().3
    }

    pub fn parse(key: &str) -> Result<Self, VouchError> {
        TAG_TABLE
            .iter()
            .find(|(_, k, ..)| *k == key)
            .map(|(tag, ..)| *tag)
            .ok_or_else(|| VouchError::InvalidInput(format!("unknown tag: {key:?}")))
    }

    /// Parse a list of tag keys into a sorted, de-duplicated set.
    pub fn parse_set<S: AsRef<str>>(keys: &[S]) -> Result<Vec<Tag>, VouchError> {
        let mut tags = keys
            .iter()
            .map(|k| Tag::parse(k.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        tags.sort();
        tags.dedup();
        Ok(tags)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
