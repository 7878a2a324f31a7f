//! Core domain types shared across layers
//!
//! Wire shapes use camelCase field names; they are what the presentation
//! layer serializes and what the upstream provider is asked to produce.

use serde::{Deserialize, Serialize};

// ============================================================================
// Language
// ============================================================================

/// Narration language for generated stories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    English,
    Hindi,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
        }
    }
}

// ============================================================================
// Discovery Items
// ============================================================================

/// An inspiring individual surfaced by profile discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub title: String,
    pub description: String,
    pub region: String,
    pub era: String,
    /// Three key virtues the person embodies
    pub values: Vec<String>,
}

/// A scientific concept or discovery surfaced by concept discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptItem {
    pub name: String,
    pub field: String,
    pub era: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// A school of thought surfaced by philosophy discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhilosophyItem {
    pub name: String,
    pub origin: String,
    pub era: String,
    pub core_idea: String,
    pub tags: Vec<String>,
}

// ============================================================================
// Generated Entries
// ============================================================================

/// One language rendition of a biographical story
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryContent {
    pub title: String,
    pub introduction: String,
    pub main_body: String,
    pub value_reflection: String,
}

/// Geography sidebar attached to a story
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeographyInfo {
    pub country_name: String,
    pub fun_fact: String,
    pub map_prompt: String,
}

/// A complete dual-language story document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDocument {
    pub english: StoryContent,
    pub hindi: StoryContent,
    pub geography: GeographyInfo,
    pub illustration_prompt: String,
    /// Echo of the requested author styles
    pub english_style: String,
    pub hindi_style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_map_url: Option<String>,
}

/// A children's science entry for one concept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScienceEntry {
    pub title: String,
    pub concept_definition: String,
    pub human_story: String,
    pub experiment_or_activity: String,
    pub sources: Vec<String>,
    pub illustration_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<String>,
}

/// A children's philosophy entry for one school of thought
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhilosophyEntry {
    pub title: String,
    pub core_idea_explanation: String,
    pub historical_episode: String,
    pub modern_relevance: String,
    pub sources: Vec<String>,
    pub illustration_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<String>,
}

// ============================================================================
// Quota & Cache Records
// ============================================================================

/// Per-user daily usage counter as persisted in the backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRecord {
    pub user_id: String,
    pub daily_usage: u64,
    /// UTC calendar date of the last reset, ISO format (YYYY-MM-DD)
    pub last_reset: String,
}

/// Usage summary returned to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaStatus {
    pub usage: u64,
    pub limit: u64,
}

/// One cached response as persisted in the backing store
///
/// Entries are never mutated in place; regenerating the same key inserts
/// a superseding row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    /// sha256 over action + canonical payload + cache version
    pub hash: String,
    /// Action name the entry was produced for
    pub kind: String,
    /// Opaque JSON result, serialized
    pub content: String,
    pub inserted_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_serialization() {
        assert_eq!(
            serde_json::to_string(&Language::English).unwrap(),
            "\"English\""
        );
        assert_eq!(Language::Hindi.as_str(), "Hindi");
    }

    #[test]
    fn test_entry_wire_format_is_camel_case() {
        let entry = ScienceEntry {
            title: "Gravity".to_string(),
            concept_definition: "Things fall.".to_string(),
            human_story: "An apple.".to_string(),
            experiment_or_activity: "Drop a ball.".to_string(),
            sources: vec!["Britannica".to_string()],
            illustration_prompt: "An apple tree".to_string(),
            generated_image_url: None,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("conceptDefinition").is_some());
        assert!(json.get("humanStory").is_some());
        // None fields stay off the wire
        assert!(json.get("generatedImageUrl").is_none());
    }

    #[test]
    fn test_profile_round_trip() {
        let json = serde_json::json!({
            "name": "Marie Curie",
            "title": "Physicist and Chemist",
            "description": "Pioneer of radioactivity research.",
            "region": "Poland / France",
            "era": "Modern",
            "values": ["curiosity", "perseverance", "generosity"]
        });

        let profile: Profile = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(profile.name, "Marie Curie");
        assert_eq!(serde_json::to_value(&profile).unwrap(), json);
    }
}
