//! Generation routines: prompts, result schemas and parsing
//!
//! The upstream provider is always asked for structured JSON against an
//! explicit schema; everything it returns is parsed into typed shapes
//! before it is filtered, cached or served.

use crate::action::GenerateStoryPayload;
use lumina_foundation::{
    ConceptItem, Error, GeographyInfo, Language, PhilosophyItem, Result, StoryContent,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Served when an image cannot be generated; the entry still renders.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://picsum.photos/800/600?grayscale&blur=2";

const ILLUSTRATION_STYLE_SUFFIX: &str =
    " -- warm colors, children's book illustration style, high quality, artistic, detailed";
const MAP_STYLE_SUFFIX: &str =
    " -- illustrated map style, colorful, educational, cute icons, parchment background";

/// Append the rendering style for the requested image kind
pub fn styled_image_prompt(prompt: &str, is_map: bool) -> String {
    let suffix = if is_map {
        MAP_STYLE_SUFFIX
    } else {
        ILLUSTRATION_STYLE_SUFFIX
    };
    format!("{}{}", prompt, suffix)
}

// ============================================================================
// Result Schemas (upstream structured-output contracts)
// ============================================================================

fn string_field() -> Value {
    json!({ "type": "STRING" })
}

fn string_array_field() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

pub fn profile_list_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": string_field(),
                "title": string_field(),
                "description": string_field(),
                "region": string_field(),
                "era": string_field(),
                "values": string_array_field(),
            },
            "required": ["name", "title", "description", "region", "era", "values"]
        }
    })
}

pub fn concept_list_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": string_field(),
                "field": string_field(),
                "era": string_field(),
                "description": string_field(),
                "tags": string_array_field(),
            },
            "required": ["name", "field", "era", "description", "tags"]
        }
    })
}

pub fn philosophy_list_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": string_field(),
                "origin": string_field(),
                "era": string_field(),
                "coreIdea": string_field(),
                "tags": string_array_field(),
            },
            "required": ["name", "origin", "era", "coreIdea", "tags"]
        }
    })
}

fn story_content_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": string_field(),
            "introduction": string_field(),
            "mainBody": string_field(),
            "valueReflection": string_field(),
        },
        "required": ["title", "introduction", "mainBody", "valueReflection"]
    })
}

pub fn story_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "english": story_content_schema(),
            "hindi": story_content_schema(),
            "illustrationPrompt": string_field(),
            "geography": {
                "type": "OBJECT",
                "properties": {
                    "countryName": string_field(),
                    "funFact": string_field(),
                    "mapPrompt": string_field(),
                },
                "required": ["countryName", "funFact", "mapPrompt"]
            }
        },
        "required": ["english", "hindi", "illustrationPrompt", "geography"]
    })
}

pub fn science_entry_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": string_field(),
            "conceptDefinition": string_field(),
            "humanStory": string_field(),
            "experimentOrActivity": string_field(),
            "sources": string_array_field(),
            "illustrationPrompt": string_field(),
        },
        "required": [
            "title", "conceptDefinition", "humanStory",
            "experimentOrActivity", "sources", "illustrationPrompt"
        ]
    })
}

pub fn philosophy_entry_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": string_field(),
            "coreIdeaExplanation": string_field(),
            "historicalEpisode": string_field(),
            "modernRelevance": string_field(),
            "sources": string_array_field(),
            "illustrationPrompt": string_field(),
        },
        "required": [
            "title", "coreIdeaExplanation", "historicalEpisode",
            "modernRelevance", "sources", "illustrationPrompt"
        ]
    })
}

// ============================================================================
// Prompts
// ============================================================================

pub fn discover_profiles_prompt(category: &str, language: Language, count: usize) -> String {
    format!(
        r#"Generate a list of {count} inspiring individuals in the category: "{category}".
Language: {language}.

Requirements:
1. Diversity is mandatory: mix genders, cultures and regions, drawing from at least 3 different continents.
2. Spread the figures across eras, from ancient to modern.
3. The "values" field lists 3 key virtues each person embodies."#,
        count = count,
        category = category,
        language = language.as_str(),
    )
}

pub fn discover_concepts_prompt(field: &str, count: usize) -> String {
    format!(
        r#"Suggest {count} scientific concepts or discoveries in the field: "{field}".

Requirements:
1. Include at least one discovery from non-Western science or technology.
2. Mix foundational discoveries with modern breakthroughs.
3. Focus on the story behind each concept and why it mattered for humanity, for an audience of children."#,
        count = count,
        field = field,
    )
}

pub fn discover_philosophies_prompt(theme: &str, count: usize) -> String {
    format!(
        r#"Suggest {count} philosophy topics regarding "{theme}".

Requirements:
1. Provide a mix of Eastern (Indian, Chinese, Japanese) and Western (Greek, European) schools of thought.
2. Do not limit the list to one region or one era.
3. The ideas must be useful, important and interesting for a younger audience."#,
        count = count,
        theme = theme,
    )
}

pub fn story_prompt(payload: &GenerateStoryPayload) -> String {
    let profile = &payload.profile;
    format!(
        r#"Write a biographical story for children about {name} ({title}) from {region} ({era}).

Produce TWO versions of the story.

1. English version:
   - Emulate the writing style of {english_style} ({english_desc}).
   - Use standard, grammatically correct English. No heavy dialect, phonetic spelling or slang.
   - Tone: inspiring, warm, educational. Length: roughly 850 words.

2. Hindi version:
   - Emulate the writing style of {hindi_style}. Characteristics: {hindi_desc}
   - Do NOT translate the English story; write an independent retelling in standard Hindi.
   - Length: roughly 850 words.

Structure for both: a captivating title, an introduction, a main story covering early life,
challenges, turning points and how they upheld values like {values}, and a closing value reflection.

Additionally provide:
- A prompt for a main illustration scene (artistic, detailed).
- A geography section with a fun fact about {region} and a map prompt."#,
        name = profile.name,
        title = profile.title,
        region = profile.region,
        era = profile.era,
        english_style = payload.english_style_name,
        english_desc = payload.english_style_desc,
        hindi_style = payload.hindi_style_name,
        hindi_desc = payload.hindi_style_desc,
        values = profile.values.join(", "),
    )
}

pub fn science_entry_prompt(item: &ConceptItem) -> String {
    format!(
        r#"Write a children's science entry about: {name}.
Field: {field}. Era: {era}. Description: {description}.
Audience: children 8-15. Tone: curious, factual. Length: roughly 900 words.

Constraints:
1. Write in standard English; no phonetic spelling, heavy dialect or accents.
2. Focus on the narrative of how it was discovered or developed and how it is useful for humanity.
3. Cite 2-3 reputable sources by name."#,
        name = item.name,
        field = item.field,
        era = item.era,
        description = item.description,
    )
}

pub fn philosophy_entry_prompt(item: &PhilosophyItem) -> String {
    format!(
        r#"Write a children's philosophy entry about: {name}.
Origin: {origin}. Era: {era}. Core idea: {core_idea}.
Length: roughly 800 words.

Introduce how {name} developed and its positive impact on the world, and simplify the
complex thought into an interesting lesson.

Constraints:
1. Write in standard English; no phonetic spelling, heavy dialect or accents.
2. Include one concrete historical episode showing the idea in action.
3. Cite 2-3 reputable sources by name."#,
        name = item.name,
        origin = item.origin,
        era = item.era,
        core_idea = item.core_idea,
    )
}

// ============================================================================
// Parsing
// ============================================================================

/// A story document as the provider returns it, before enrichment with
/// style echoes and media URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedStory {
    pub english: StoryContent,
    pub hindi: StoryContent,
    pub illustration_prompt: String,
    pub geography: GeographyInfo,
}

/// Parse a raw provider list result into per-item JSON values, validating
/// each item against the typed shape on the way through.
pub fn parse_item_list<T>(raw: Value) -> Result<Vec<Value>>
where
    T: DeserializeOwned + Serialize,
{
    let items: Vec<T> = serde_json::from_value(raw)
        .map_err(|e| Error::Upstream(format!("Malformed list result: {}", e)))?;

    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(Error::from))
        .collect()
}

/// Parse a raw provider object result into the typed entry shape
pub fn parse_entry<T>(raw: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(raw).map_err(|e| Error::Upstream(format!("Malformed entry result: {}", e)))
}
