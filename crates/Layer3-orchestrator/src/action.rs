//! Inbound action dispatch types
//!
//! The single RPC endpoint carries `{action, payload}`. The action set is
//! finite and closed, so it is modeled as a tagged enum rather than
//! open-ended string dispatch; adding an action without a handler is a
//! compile error.

use lumina_foundation::{ConceptItem, Error, Language, PhilosophyItem, Profile, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One inbound request, dispatched on the `action` field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload")]
pub enum Action {
    #[serde(rename = "discoverProfiles")]
    DiscoverProfiles(DiscoverProfilesPayload),

    #[serde(rename = "generateStory")]
    GenerateStory(GenerateStoryPayload),

    #[serde(rename = "discoverConcepts")]
    DiscoverConcepts(DiscoverConceptsPayload),

    #[serde(rename = "generateScienceEntry")]
    GenerateScienceEntry(GenerateScienceEntryPayload),

    #[serde(rename = "discoverPhilosophies")]
    DiscoverPhilosophies(DiscoverPhilosophiesPayload),

    #[serde(rename = "generatePhilosophyEntry")]
    GeneratePhilosophyEntry(GeneratePhilosophyEntryPayload),

    #[serde(rename = "generateImage")]
    GenerateImage(GenerateImagePayload),

    #[serde(rename = "generateAudio")]
    GenerateAudio(GenerateAudioPayload),

    #[serde(rename = "getUserQuota")]
    GetUserQuota(GetUserQuotaPayload),
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverProfilesPayload {
    pub category: String,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateStoryPayload {
    pub profile: Profile,
    pub english_style_name: String,
    pub english_style_desc: String,
    pub hindi_style_name: String,
    pub hindi_style_desc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverConceptsPayload {
    pub field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateScienceEntryPayload {
    pub item: ConceptItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverPhilosophiesPayload {
    pub theme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePhilosophyEntryPayload {
    pub item: PhilosophyItem,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImagePayload {
    pub prompt: String,
    #[serde(default)]
    pub is_map: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAudioPayload {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserQuotaPayload {}

// ============================================================================
// Dispatch helpers
// ============================================================================

impl Action {
    /// Wire name of the action (also the cache `kind`)
    pub fn name(&self) -> &'static str {
        match self {
            Action::DiscoverProfiles(_) => "discoverProfiles",
            Action::GenerateStory(_) => "generateStory",
            Action::DiscoverConcepts(_) => "discoverConcepts",
            Action::GenerateScienceEntry(_) => "generateScienceEntry",
            Action::DiscoverPhilosophies(_) => "discoverPhilosophies",
            Action::GeneratePhilosophyEntry(_) => "generatePhilosophyEntry",
            Action::GenerateImage(_) => "generateImage",
            Action::GenerateAudio(_) => "generateAudio",
            Action::GetUserQuota(_) => "getUserQuota",
        }
    }

    /// Heavy generation actions count against the caller's daily quota and
    /// therefore require an authenticated identity. Discovery, media and
    /// quota reads never consume quota.
    pub fn consumes_quota(&self) -> bool {
        matches!(
            self,
            Action::GenerateStory(_)
                | Action::GenerateScienceEntry(_)
                | Action::GeneratePhilosophyEntry(_)
        )
    }
}

/// Parse an inbound `{action, payload}` value into an [`Action`].
///
/// An unknown action string maps to `InvalidAction`; a known action with a
/// malformed payload maps to `InvalidPayload`.
pub fn parse_action(value: Value) -> Result<Action> {
    serde_json::from_value(value).map_err(|e| {
        let message = e.to_string();
        if message.contains("unknown variant") {
            Error::InvalidAction(message)
        } else {
            Error::InvalidPayload(message)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_discovery_action() {
        let action = parse_action(json!({
            "action": "discoverConcepts",
            "payload": {"field": "physics"}
        }))
        .unwrap();

        assert_eq!(action.name(), "discoverConcepts");
        assert!(!action.consumes_quota());
        match action {
            Action::DiscoverConcepts(payload) => assert_eq!(payload.field, "physics"),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_parse_quota_consuming_action() {
        let action = parse_action(json!({
            "action": "generateScienceEntry",
            "payload": {
                "item": {
                    "name": "Gravity",
                    "field": "physics",
                    "era": "Early Modern",
                    "description": "Why things fall.",
                    "tags": ["foundational"]
                }
            }
        }))
        .unwrap();

        assert!(action.consumes_quota());
    }

    #[test]
    fn test_unknown_action_is_invalid_action() {
        let err = parse_action(json!({
            "action": "dropAllTables",
            "payload": {}
        }))
        .unwrap_err();

        assert!(matches!(err, Error::InvalidAction(_)));
    }

    #[test]
    fn test_malformed_payload_is_invalid_payload() {
        let err = parse_action(json!({
            "action": "discoverConcepts",
            "payload": {"wrong": true}
        }))
        .unwrap_err();

        assert!(matches!(err, Error::InvalidPayload(_)));
    }

    #[test]
    fn test_image_payload_defaults() {
        let action = parse_action(json!({
            "action": "generateImage",
            "payload": {"prompt": "a lighthouse"}
        }))
        .unwrap();

        match action {
            Action::GenerateImage(payload) => assert!(!payload.is_map),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_round_trip() {
        let original = json!({
            "action": "getUserQuota",
            "payload": {}
        });
        let action = parse_action(original.clone()).unwrap();
        assert_eq!(serde_json::to_value(&action).unwrap(), original);
    }
}
