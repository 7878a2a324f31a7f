//! Request orchestrator
//!
//! Composes auth, quota, cache, safety and the upstream provider to answer
//! one request end-to-end. Stages per request:
//!
//! Authenticating -> QuotaChecking -> CacheLookup ->
//! [Generating -> SafetyFiltering -> CacheStoring] ->
//! QuotaIncrementing -> Responding
//!
//! The orchestrator is stateless per invocation; the backing store is the
//! only shared mutable resource.

use crate::action::{
    Action, DiscoverConceptsPayload, DiscoverPhilosophiesPayload, DiscoverProfilesPayload,
    GenerateAudioPayload, GenerateImagePayload, GeneratePhilosophyEntryPayload,
    GenerateScienceEntryPayload, GenerateStoryPayload,
};
use crate::generation::{self, GeneratedStory, PLACEHOLDER_IMAGE_URL};
use lumina_core::{ContentCache, QuotaTracker, SafetyFilter};
use lumina_foundation::{
    AppConfig, AuthProvider, BackingStore, ConceptItem, Error, PhilosophyEntry, PhilosophyItem,
    Profile, QuotaStatus, Result, SafetyMode, ScienceEntry, StoryDocument,
};
use lumina_provider::{with_retry, GenerateRequest, GenerativeProvider, RetryConfig};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry point of the orchestration core
pub struct RequestOrchestrator {
    provider: Arc<dyn GenerativeProvider>,
    auth: Arc<dyn AuthProvider>,
    cache: ContentCache,
    quota: QuotaTracker,
    safety: SafetyFilter,
    config: AppConfig,
    retry: RetryConfig,
}

impl RequestOrchestrator {
    /// Build an orchestrator over its collaborators. All policy constants
    /// come in through `config`; nothing is read from ambient globals.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn BackingStore>,
        provider: Arc<dyn GenerativeProvider>,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        let cache = ContentCache::new(
            store.clone(),
            config.cache_version.clone(),
            config.discovery.clone(),
        );
        let quota = QuotaTracker::new(store, config.daily_quota_limit);
        let retry = RetryConfig::default().with_max_attempts(config.retry_max_attempts);

        Self {
            provider,
            auth,
            cache,
            quota,
            safety: SafetyFilter::new(),
            config,
            retry,
        }
    }

    /// Answer one request end-to-end
    pub async fn handle(&self, action: Action, credential: Option<&str>) -> Result<Value> {
        // Authenticating: a presented credential must resolve; anonymous
        // calls are allowed only for actions that do not consume quota.
        let user_id = match credential {
            Some(credential) => Some(self.auth.resolve_identity(credential).await?),
            None => None,
        };

        debug!(
            action = action.name(),
            authenticated = user_id.is_some(),
            "handling request"
        );

        match action {
            Action::DiscoverProfiles(payload) => self.discover_profiles(payload).await,
            Action::DiscoverConcepts(payload) => self.discover_concepts(payload).await,
            Action::DiscoverPhilosophies(payload) => self.discover_philosophies(payload).await,
            Action::GenerateStory(payload) => {
                let user = Self::require_user(&user_id)?;
                self.generate_story(payload, user).await
            }
            Action::GenerateScienceEntry(payload) => {
                let user = Self::require_user(&user_id)?;
                self.generate_science_entry(payload, user).await
            }
            Action::GeneratePhilosophyEntry(payload) => {
                let user = Self::require_user(&user_id)?;
                self.generate_philosophy_entry(payload, user).await
            }
            Action::GenerateImage(payload) => self.generate_image(payload).await,
            Action::GenerateAudio(payload) => self.generate_audio(payload).await,
            Action::GetUserQuota(_) => self.get_user_quota(user_id.as_deref()).await,
        }
    }

    fn require_user(user_id: &Option<String>) -> Result<&str> {
        user_id
            .as_deref()
            .ok_or_else(|| Error::Unauthorized("Please log in.".to_string()))
    }

    // ========================================================================
    // Entry actions (cacheable, quota-consuming)
    // ========================================================================

    /// Shared flow for entry actions: fresh quota window, cache lookup,
    /// quota checkpoint, generation, then detached persistence.
    async fn entry_action<F, Fut>(
        &self,
        action_name: &'static str,
        payload: Value,
        user: &str,
        generate: F,
    ) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        // QuotaChecking: the day window is freshened before any other
        // quota logic runs.
        self.quota.ensure_fresh_window(user).await?;

        // CacheLookup: a storage hiccup on read degrades to a miss.
        match self.cache.lookup(action_name, &payload).await {
            Ok(Some(hit)) => {
                // Cached content was filtered when first stored and costs
                // no upstream work, so it does not count against quota.
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => warn!(action = action_name, "cache lookup failed: {}", e),
        }

        // The enforcement checkpoint: after the cache check, before any
        // generation work.
        self.quota.check(user).await?;

        let content = generate().await?;

        // CacheStoring + QuotaIncrementing are fire-and-forget: a
        // persistence hiccup is logged and must never block or fail the
        // already-computed response. Persistence is therefore not
        // guaranteed before the caller observes the response.
        let cache = self.cache.clone();
        let quota = self.quota.clone();
        let user = user.to_string();
        let stored = content.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.store(action_name, &payload, &stored).await {
                warn!(action = action_name, "cache store failed: {}", e);
            }
            if let Err(e) = quota.increment(&user).await {
                warn!(action = action_name, "quota increment failed: {}", e);
            }
        });

        Ok(content)
    }

    async fn generate_story(&self, payload: GenerateStoryPayload, user: &str) -> Result<Value> {
        let payload_value = serde_json::to_value(&payload)?;

        self.entry_action("generateStory", payload_value, user, || async {
            let request = GenerateRequest::new(
                generation::story_prompt(&payload),
                generation::story_schema(),
            )
            .with_top_p(0.95)
            .with_top_k(40);

            let raw = with_retry(&self.retry, "generateStory", || {
                self.provider.generate(&request)
            })
            .await?;

            let story = self.screen_story(generation::parse_entry::<GeneratedStory>(raw)?)?;

            // Main illustration and geography map are fetched concurrently
            // and awaited together; each degrades to a placeholder on its
            // own, so one failing never fails the other or the story.
            let illustration_prompt =
                generation::styled_image_prompt(&story.illustration_prompt, false);
            let map_prompt = generation::styled_image_prompt(&story.geography.map_prompt, true);
            let (image_url, map_url) = tokio::join!(
                self.auxiliary_image(&illustration_prompt),
                self.auxiliary_image(&map_prompt),
            );

            let document = StoryDocument {
                english: story.english,
                hindi: story.hindi,
                geography: story.geography,
                illustration_prompt: story.illustration_prompt,
                english_style: payload.english_style_name.clone(),
                hindi_style: payload.hindi_style_name.clone(),
                generated_image_url: Some(image_url),
                generated_map_url: Some(map_url),
            };

            Ok(serde_json::to_value(document)?)
        })
        .await
    }

    async fn generate_science_entry(
        &self,
        payload: GenerateScienceEntryPayload,
        user: &str,
    ) -> Result<Value> {
        let payload_value = serde_json::to_value(&payload)?;

        self.entry_action("generateScienceEntry", payload_value, user, || async {
            let request = GenerateRequest::new(
                generation::science_entry_prompt(&payload.item),
                generation::science_entry_schema(),
            );

            let raw = with_retry(&self.retry, "generateScienceEntry", || {
                self.provider.generate(&request)
            })
            .await?;

            let mut entry = self.screen_science(generation::parse_entry::<ScienceEntry>(raw)?)?;

            let prompt = generation::styled_image_prompt(&entry.illustration_prompt, false);
            entry.generated_image_url = Some(self.auxiliary_image(&prompt).await);

            Ok(serde_json::to_value(entry)?)
        })
        .await
    }

    async fn generate_philosophy_entry(
        &self,
        payload: GeneratePhilosophyEntryPayload,
        user: &str,
    ) -> Result<Value> {
        let payload_value = serde_json::to_value(&payload)?;

        self.entry_action("generatePhilosophyEntry", payload_value, user, || async {
            let request = GenerateRequest::new(
                generation::philosophy_entry_prompt(&payload.item),
                generation::philosophy_entry_schema(),
            );

            let raw = with_retry(&self.retry, "generatePhilosophyEntry", || {
                self.provider.generate(&request)
            })
            .await?;

            let mut entry =
                self.screen_philosophy(generation::parse_entry::<PhilosophyEntry>(raw)?)?;

            let prompt = generation::styled_image_prompt(&entry.illustration_prompt, false);
            entry.generated_image_url = Some(self.auxiliary_image(&prompt).await);

            Ok(serde_json::to_value(entry)?)
        })
        .await
    }

    // ========================================================================
    // Discovery actions (mixed-list strategy, no quota)
    // ========================================================================

    async fn discover_profiles(&self, payload: DiscoverProfilesPayload) -> Result<Value> {
        let criterion = serde_json::to_value(&payload)?;

        let items = self
            .cache
            .lookup_or_mix("discoverProfiles", &criterion, |count| async move {
                let prompt = generation::discover_profiles_prompt(
                    &payload.category,
                    payload.language,
                    count,
                );
                let request = GenerateRequest::new(prompt, generation::profile_list_schema());
                let raw = with_retry(&self.retry, "discoverProfiles", || {
                    self.provider.generate(&request)
                })
                .await?;
                self.screen_items(generation::parse_item_list::<Profile>(raw)?)
            })
            .await?;

        Ok(Value::Array(items))
    }

    async fn discover_concepts(&self, payload: DiscoverConceptsPayload) -> Result<Value> {
        let criterion = serde_json::to_value(&payload)?;

        let items = self
            .cache
            .lookup_or_mix("discoverConcepts", &criterion, |count| async move {
                let prompt = generation::discover_concepts_prompt(&payload.field, count);
                let request = GenerateRequest::new(prompt, generation::concept_list_schema());
                let raw = with_retry(&self.retry, "discoverConcepts", || {
                    self.provider.generate(&request)
                })
                .await?;
                self.screen_items(generation::parse_item_list::<ConceptItem>(raw)?)
            })
            .await?;

        Ok(Value::Array(items))
    }

    async fn discover_philosophies(&self, payload: DiscoverPhilosophiesPayload) -> Result<Value> {
        let criterion = serde_json::to_value(&payload)?;

        let items = self
            .cache
            .lookup_or_mix("discoverPhilosophies", &criterion, |count| async move {
                let prompt = generation::discover_philosophies_prompt(&payload.theme, count);
                let request = GenerateRequest::new(prompt, generation::philosophy_list_schema());
                let raw = with_retry(&self.retry, "discoverPhilosophies", || {
                    self.provider.generate(&request)
                })
                .await?;
                self.screen_items(generation::parse_item_list::<PhilosophyItem>(raw)?)
            })
            .await?;

        Ok(Value::Array(items))
    }

    // ========================================================================
    // Media actions (no quota, degrade instead of failing)
    // ========================================================================

    async fn generate_image(&self, payload: GenerateImagePayload) -> Result<Value> {
        if !self.safety.text_is_safe(&payload.prompt) {
            return Ok(Value::String(PLACEHOLDER_IMAGE_URL.to_string()));
        }

        let prompt = generation::styled_image_prompt(&payload.prompt, payload.is_map);
        let url = match with_retry(&self.retry, "generateImage", || {
            self.provider.generate_image(&prompt)
        })
        .await
        {
            Ok(url) => url,
            Err(e) => {
                warn!("image generation failed, serving placeholder: {}", e);
                PLACEHOLDER_IMAGE_URL.to_string()
            }
        };

        Ok(Value::String(url))
    }

    async fn generate_audio(&self, payload: GenerateAudioPayload) -> Result<Value> {
        if !self.safety.text_is_safe(&payload.text) {
            return Ok(Value::Null);
        }

        match with_retry(&self.retry, "generateAudio", || {
            self.provider.generate_audio(&payload.text)
        })
        .await
        {
            Ok(data) => Ok(Value::String(data)),
            Err(e) => {
                warn!("audio generation failed: {}", e);
                Ok(Value::Null)
            }
        }
    }

    /// Fetch one auxiliary image with a zero retry budget; any failure
    /// degrades to the placeholder.
    async fn auxiliary_image(&self, prompt: &str) -> String {
        if !self.safety.text_is_safe(prompt) {
            return PLACEHOLDER_IMAGE_URL.to_string();
        }

        match with_retry(&RetryConfig::no_retry(), "auxiliaryImage", || {
            self.provider.generate_image(prompt)
        })
        .await
        {
            Ok(url) => url,
            Err(e) => {
                warn!("auxiliary image generation failed: {}", e);
                PLACEHOLDER_IMAGE_URL.to_string()
            }
        }
    }

    // ========================================================================
    // Quota read
    // ========================================================================

    async fn get_user_quota(&self, user_id: Option<&str>) -> Result<Value> {
        let status = match user_id {
            Some(user) => self.quota.read(user).await?,
            None => QuotaStatus {
                usage: 0,
                limit: self.quota.limit(),
            },
        };
        Ok(serde_json::to_value(status)?)
    }

    // ========================================================================
    // Safety screening
    // ========================================================================

    fn screen_items(&self, items: Vec<Value>) -> Result<Vec<Value>> {
        match self.config.safety_mode {
            SafetyMode::Reject => {
                if items.iter().any(|item| !self.safety.is_safe(item)) {
                    return Err(Error::SafetyViolation("discovery list".to_string()));
                }
                Ok(items)
            }
            SafetyMode::Sanitize => {
                let before = items.len();
                let safe: Vec<Value> = items
                    .into_iter()
                    .filter(|item| self.safety.is_safe(item))
                    .collect();
                if safe.len() < before {
                    warn!(dropped = before - safe.len(), "dropped unsafe discovery items");
                }
                Ok(safe)
            }
        }
    }

    fn screen_story(&self, story: GeneratedStory) -> Result<GeneratedStory> {
        if self.safety.is_safe(&serde_json::to_value(&story)?) {
            return Ok(story);
        }

        match self.config.safety_mode {
            SafetyMode::Reject => Err(Error::SafetyViolation("generated story".to_string())),
            SafetyMode::Sanitize => {
                warn!("sanitizing generated story");
                let mut story = story;
                for content in [&mut story.english, &mut story.hindi] {
                    content.title = self.safety.sanitize(&content.title);
                    content.introduction = self.safety.sanitize(&content.introduction);
                    content.main_body = self.safety.sanitize(&content.main_body);
                    content.value_reflection = self.safety.sanitize(&content.value_reflection);
                }
                story.geography.fun_fact = self.safety.sanitize(&story.geography.fun_fact);
                Ok(story)
            }
        }
    }

    fn screen_science(&self, entry: ScienceEntry) -> Result<ScienceEntry> {
        if self.safety.is_safe(&serde_json::to_value(&entry)?) {
            return Ok(entry);
        }

        match self.config.safety_mode {
            SafetyMode::Reject => Err(Error::SafetyViolation("science entry".to_string())),
            SafetyMode::Sanitize => {
                warn!("sanitizing science entry");
                let mut entry = entry;
                entry.title = self.safety.sanitize(&entry.title);
                entry.concept_definition = self.safety.sanitize(&entry.concept_definition);
                entry.human_story = self.safety.sanitize(&entry.human_story);
                entry.experiment_or_activity = self.safety.sanitize(&entry.experiment_or_activity);
                Ok(entry)
            }
        }
    }

    fn screen_philosophy(&self, entry: PhilosophyEntry) -> Result<PhilosophyEntry> {
        if self.safety.is_safe(&serde_json::to_value(&entry)?) {
            return Ok(entry);
        }

        match self.config.safety_mode {
            SafetyMode::Reject => Err(Error::SafetyViolation("philosophy entry".to_string())),
            SafetyMode::Sanitize => {
                warn!("sanitizing philosophy entry");
                let mut entry = entry;
                entry.title = self.safety.sanitize(&entry.title);
                entry.core_idea_explanation = self.safety.sanitize(&entry.core_idea_explanation);
                entry.historical_episode = self.safety.sanitize(&entry.historical_episode);
                entry.modern_relevance = self.safety.sanitize(&entry.modern_relevance);
                Ok(entry)
            }
        }
    }
}
