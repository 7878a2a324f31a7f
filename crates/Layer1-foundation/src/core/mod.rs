//! Core domain types and collaborator traits

pub mod traits;
pub mod types;

pub use traits::{AuthProvider, BackingStore};
pub use types::{
    CacheRecord, ConceptItem, GeographyInfo, Language, PhilosophyEntry, PhilosophyItem, Profile,
    QuotaRecord, QuotaStatus, ScienceEntry, StoryContent, StoryDocument,
};
