//! Mapping card catalog API payloads into [`Card`]s.
//!
//! The catalog API returns paginated JSON for classes and subclass cards.
//! A [`CardSource`](crate::CardSource) that talks to the API decodes the
//! page with [`decode_class_page`] or [`decode_subclass_page`].

use serde::Deserialize;

use crate::card::{META_DOMAIN_NAMES, META_LEVEL, META_SUBCLASS_PATH_ID};
use crate::{Card, CardFeature, CardId, CardType, Result, SubclassLevel};

/// One page of a paginated API response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Zero-based page number.
    #[serde(default)]
    pub page: u32,
    /// Page size.
    #[serde(default)]
    pub size: u32,
    /// Total number of items.
    #[serde(default)]
    pub total_elements: u64,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
}

/// A cost tag on a class feature.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassCostTag {
    /// Tag label.
    pub label: String,
    /// Tag value.
    #[serde(default)]
    pub value: i64,
}

/// A feature of a class.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFeatureResponse {
    /// Feature id.
    pub id: u64,
    /// Feature name.
    pub name: String,
    /// Rules text.
    pub description: String,
    /// Feature type.
    #[serde(default)]
    pub feature_type: String,
    /// Cost tags.
    #[serde(default)]
    pub cost_tags: Option<Vec<ClassCostTag>>,
}

/// A class as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassResponse {
    /// Class id.
    pub id: CardId,
    /// Class name.
    pub name: String,
    /// Class description.
    #[serde(default)]
    pub description: String,
    /// Starting evasion.
    #[serde(default)]
    pub starting_evasion: Option<i64>,
    /// Starting hit points.
    #[serde(default)]
    pub starting_hit_points: Option<i64>,
    /// Hope features.
    #[serde(default)]
    pub hope_features: Vec<ClassFeatureResponse>,
    /// Class features.
    #[serde(default)]
    pub class_features: Vec<ClassFeatureResponse>,
}

/// A cost tag on a subclass card or feature.
#[derive(Debug, Clone, Deserialize)]
pub struct SubclassCostTag {
    /// Tag id.
    pub id: u64,
    /// Tag label.
    pub label: String,
    /// Tag category.
    #[serde(default)]
    pub category: String,
}

/// A feature of a subclass card.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubclassFeatureResponse {
    /// Feature id.
    pub id: u64,
    /// Feature name.
    pub name: String,
    /// Rules text.
    pub description: String,
    /// Cost tags.
    #[serde(default)]
    pub cost_tags: Vec<SubclassCostTag>,
}

/// A subclass card as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubclassCardResponse {
    /// Card id.
    pub id: CardId,
    /// Card name.
    pub name: String,
    /// Features printed on the card.
    #[serde(default)]
    pub features: Vec<SubclassFeatureResponse>,
    /// The path this card belongs to.
    pub subclass_path_id: u64,
    /// Domains the subclass grants.
    #[serde(default)]
    pub domain_names: Option<Vec<String>>,
    /// Level within the path.
    pub level: SubclassLevel,
}

fn class_feature(feature: &ClassFeatureResponse, subtitle: &str) -> CardFeature {
    CardFeature {
        name: feature.name.clone(),
        description: feature.description.clone(),
        subtitle: Some(subtitle.to_string()),
        tags: feature
            .cost_tags
            .iter()
            .flatten()
            .map(|tag| tag.label.to_uppercase())
            .collect(),
    }
}

/// Maps a class payload to a card.
///
/// Tags are `Evasion: N` and `Hit Points: N` when present. Hope features
/// come before class features.
pub fn map_class(response: &ClassResponse) -> Card {
    let mut tags = Vec::new();
    if let Some(evasion) = response.starting_evasion {
        tags.push(format!("Evasion: {evasion}"));
    }
    if let Some(hit_points) = response.starting_hit_points {
        tags.push(format!("Hit Points: {hit_points}"));
    }

    let features = response
        .hope_features
        .iter()
        .map(|f| class_feature(f, "Hope Feature"))
        .chain(
            response
                .class_features
                .iter()
                .map(|f| class_feature(f, "Class Feature")),
        )
        .collect();

    Card {
        tags,
        features,
        ..Card::new(response.id, response.name.clone(), CardType::Class)
            .with_description(response.description.clone())
    }
}

/// Maps a subclass card payload to a card.
///
/// The subtitle lists the granted domains; path id, level and domains are
/// kept in metadata for path grouping and the selection summary.
pub fn map_subclass(response: &SubclassCardResponse) -> Card {
    let features = response
        .features
        .iter()
        .map(|f| CardFeature {
            name: f.name.clone(),
            description: f.description.clone(),
            subtitle: Some("Subclass Feature".to_string()),
            tags: f.cost_tags.iter().map(|t| t.label.to_uppercase()).collect(),
        })
        .collect();

    let domains = response.domain_names.clone().unwrap_or_default();
    let subtitle = (!domains.is_empty()).then(|| domains.join(" · "));

    let mut card = Card::new(response.id, response.name.clone(), CardType::Subclass)
        .with_metadata(META_SUBCLASS_PATH_ID, serde_json::json!(response.subclass_path_id))
        .with_metadata(META_LEVEL, serde_json::json!(response.level));
    if !domains.is_empty() {
        card = card.with_metadata(META_DOMAIN_NAMES, serde_json::json!(domains));
    }

    Card {
        subtitle,
        features,
        ..card
    }
}

/// Decodes a page of classes into cards.
///
/// # Errors
///
/// Returns [`WaymarkError::Serialization`](crate::WaymarkError::Serialization)
/// if the payload is not a valid page.
pub fn decode_class_page(json: &str) -> Result<Vec<Card>> {
    let page: Page<ClassResponse> = serde_json::from_str(json)?;
    Ok(page.content.iter().map(map_class).collect())
}

/// Decodes a page of subclass cards into cards.
///
/// # Errors
///
/// Returns [`WaymarkError::Serialization`](crate::WaymarkError::Serialization)
/// if the payload is not a valid page.
pub fn decode_subclass_page(json: &str) -> Result<Vec<Card>> {
    let page: Page<SubclassCardResponse> = serde_json::from_str(json)?;
    Ok(page.content.iter().map(map_subclass).collect())
}
