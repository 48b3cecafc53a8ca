//! Selectable cards.
//!
//! A [`Card`] is one option a user can pick on a step. The wizard engine
//! only looks at a card's `id` and `name`; the remaining fields are display
//! data owned by whoever produced the card.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of a card within the card catalog.
pub type CardId = u64;

/// Metadata key holding a subclass card's path id.
pub const META_SUBCLASS_PATH_ID: &str = "subclassPathId";
/// Metadata key holding a subclass card's level.
pub const META_LEVEL: &str = "level";
/// Metadata key holding the domains a card belongs to.
pub const META_DOMAIN_NAMES: &str = "domainNames";

/// The kind of game element a card describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardType {
    /// A character class.
    Class,
    /// A subclass card.
    Subclass,
    /// A heritage card.
    Heritage,
    /// A community card.
    Community,
    /// An ancestry card.
    Ancestry,
    /// A domain card.
    Domain,
}

impl CardType {
    /// Returns the display label for this card type.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Class => "Class",
            Self::Subclass => "Subclass",
            Self::Heritage => "Heritage",
            Self::Community => "Community",
            Self::Ancestry => "Ancestry",
            Self::Domain => "Domain",
        }
    }
}

/// A feature block printed on a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardFeature {
    /// Feature name.
    pub name: String,
    /// Rules text.
    pub description: String,
    /// Optional subtitle, e.g. "Hope Feature".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Cost tags shown next to the feature.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A selectable card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Catalog identifier.
    pub id: CardId,
    /// Display name, also used in the selection summary.
    pub name: String,
    /// Card body text.
    #[serde(default)]
    pub description: String,
    /// What kind of card this is.
    pub card_type: CardType,
    /// Optional subtitle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Header tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Feature blocks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<CardFeature>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Card {
    /// Creates a card with only an id, name and type.
    pub fn new(id: CardId, name: impl Into<String>, card_type: CardType) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            card_type,
            subtitle: None,
            tags: Vec::new(),
            features: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Gets metadata by key.
    pub fn get_metadata(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// Returns the subclass level recorded in metadata.
    pub fn subclass_level(&self) -> Option<SubclassLevel> {
        self.get_metadata(META_LEVEL)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Returns the subclass path id recorded in metadata.
    pub fn subclass_path_id(&self) -> Option<u64> {
        self.get_metadata(META_SUBCLASS_PATH_ID)
            .and_then(|v| v.as_u64())
    }

    /// Returns the domain names recorded in metadata.
    pub fn domain_names(&self) -> Vec<String> {
        self.get_metadata(META_DOMAIN_NAMES)
            .and_then(|v| v.as_array())
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| n.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} ({})", self.name, self.id, self.card_type.label())
    }
}

/// Level of a subclass card within its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubclassLevel {
    /// The entry card of a path.
    Foundation,
    /// The second card of a path.
    Specialization,
    /// The final card of a path.
    Mastery,
}

/// A subclass path: a foundation card and its optional upgrades.
#[derive(Debug, Clone, PartialEq)]
pub struct SubclassPath {
    /// The path id shared by the cards.
    pub path_id: u64,
    /// Display name, taken from the foundation card.
    pub path_name: String,
    /// Foundation card.
    pub foundation: Card,
    /// Specialization card, if published.
    pub specialization: Option<Card>,
    /// Mastery card, if published.
    pub mastery: Option<Card>,
}

impl SubclassPath {
    /// Groups subclass cards into paths.
    ///
    /// Paths keep the order in which their first card appears. Paths
    /// without a foundation card are dropped, as are cards with no path id
    /// or level.
    pub fn group(cards: &[Card]) -> Vec<SubclassPath> {
        #[derive(Default)]
        struct Slots {
            foundation: Option<Card>,
            specialization: Option<Card>,
            mastery: Option<Card>,
        }

        let mut order: Vec<u64> = Vec::new();
        let mut slots: HashMap<u64, Slots> = HashMap::new();

        for card in cards {
            let (Some(path_id), Some(level)) = (card.subclass_path_id(), card.subclass_level())
            else {
                continue;
            };

            let entry = slots.entry(path_id).or_insert_with(|| {
                order.push(path_id);
                Slots::default()
            });
            let slot = match level {
                SubclassLevel::Foundation => &mut entry.foundation,
                SubclassLevel::Specialization => &mut entry.specialization,
                SubclassLevel::Mastery => &mut entry.mastery,
            };
            *slot = Some(card.clone());
        }

        order
            .into_iter()
            .filter_map(|path_id| {
                let s = slots.remove(&path_id)?;
                let foundation = s.foundation?;
                Some(SubclassPath {
                    path_id,
                    path_name: foundation.name.clone(),
                    foundation,
                    specialization: s.specialization,
                    mastery: s.mastery,
                })
            })
            .collect()
    }

    /// Returns the card for a level.
    pub fn card_for_level(&self, level: SubclassLevel) -> Option<&Card> {
        match level {
            SubclassLevel::Foundation => Some(&self.foundation),
            SubclassLevel::Specialization => self.specialization.as_ref(),
            SubclassLevel::Mastery => self.mastery.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn subclass(id: CardId, name: &str, path: u64, level: &str) -> Card {
        Card::new(id, name, CardType::Subclass)
            .with_metadata(META_SUBCLASS_PATH_ID, json!(path))
            .with_metadata(META_LEVEL, json!(level))
    }

    #[test]
    fn test_card_display() {
        let card = Card::new(7, "Warrior", CardType::Class);
        assert_eq!(card.to_string(), "Warrior #7 (Class)");
    }

    #[test]
    fn test_card_serializes_camel_case_and_skips_empty() {
        let card = Card::new(1, "Bard", CardType::Class).with_description("Sings");
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["cardType"], "class");
        assert!(json.get("tags").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn test_card_deserializes_with_defaults() {
        let card: Card =
            serde_json::from_str(r#"{"id":3,"name":"Highborne","cardType":"community"}"#).unwrap();
        assert_eq!(card.card_type, CardType::Community);
        assert!(card.description.is_empty());
        assert!(card.features.is_empty());
    }

    #[test]
    fn test_metadata_accessors() {
        let card = subclass(10, "Troubadour", 4, "SPECIALIZATION")
            .with_metadata(META_DOMAIN_NAMES, json!(["Grace", "Codex"]));
        assert_eq!(card.subclass_path_id(), Some(4));
        assert_eq!(card.subclass_level(), Some(SubclassLevel::Specialization));
        assert_eq!(card.domain_names(), vec!["Grace", "Codex"]);

        let plain = Card::new(1, "Plain", CardType::Class);
        assert_eq!(plain.subclass_level(), None);
        assert!(plain.domain_names().is_empty());
    }

    #[test]
    fn test_group_subclass_paths() {
        let cards = vec![
            subclass(1, "Troubadour", 1, "FOUNDATION"),
            subclass(2, "Troubadour II", 1, "SPECIALIZATION"),
            subclass(3, "Wordsmith", 2, "FOUNDATION"),
            subclass(4, "Troubadour III", 1, "MASTERY"),
        ];
        let paths = SubclassPath::group(&cards);

        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].path_id, 1);
        assert_eq!(paths[0].path_name, "Troubadour");
        assert_eq!(paths[0].specialization.as_ref().unwrap().id, 2);
        assert_eq!(paths[0].mastery.as_ref().unwrap().id, 4);
        assert_eq!(paths[1].path_name, "Wordsmith");
        assert!(paths[1].mastery.is_none());
    }

    #[test]
    fn test_group_drops_paths_without_foundation() {
        let cards = vec![
            subclass(1, "Orphan", 9, "MASTERY"),
            Card::new(2, "No metadata", CardType::Subclass),
        ];
        assert!(SubclassPath::group(&cards).is_empty());
    }

    #[test]
    fn test_card_for_level() {
        let paths = SubclassPath::group(&[subclass(1, "Stalwart", 3, "FOUNDATION")]);
        let path = &paths[0];
        assert_eq!(path.card_for_level(SubclassLevel::Foundation).unwrap().id, 1);
        assert!(path.card_for_level(SubclassLevel::Mastery).is_none());
    }
}
