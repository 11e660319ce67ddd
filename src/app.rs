//! Application wiring for the client.
//!
//! `App` owns the configuration, session, API client, and one cache per
//! dataset, and implements the read-through flow every command uses: serve
//! a fresh cache hit, otherwise fetch and cache, and when the fetch fails
//! fall back to the last-known (stale) data before giving up.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use futures::stream::{self, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::auth::{Session, SessionData};
use crate::cache::SwrCache;
use crate::config::Config;
use crate::models::{
    Exercise, ExerciseCategory, ExerciseGroup, ImbalanceImage, Note, TrainingDayAssignment,
    WorkoutCompletion,
};
use crate::store::{FileStore, KeyValueStore};

// ============================================================================
// Constants
// ============================================================================

/// Freshness window for catalog data (groups, exercise lists).
/// The program catalog only changes when it is re-published.
const CATALOG_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Freshness window for per-user data (training days, completions, notes,
/// imbalance images), which reflects the user's own recent writes.
const USER_DATA_TTL: Duration = Duration::from_secs(5 * 60);

/// Maximum concurrent catalog requests during a refresh.
const MAX_CONCURRENT_REQUESTS: usize = 4;

// Storage keys, one per logical dataset.
const GROUPS_CACHE_KEY: &str = "fit-groups";
const EXERCISES_CACHE_PREFIX: &str = "fit-exercises";
const TRAINING_DAYS_CACHE_KEY: &str = "training-days-cache";
const COMPLETIONS_CACHE_KEY: &str = "fit-completions";
const NOTES_CACHE_KEY: &str = "fit-notes";
const IMBALANCE_CACHE_KEY: &str = "fit-imbalance";

// ============================================================================
// Load Results
// ============================================================================

/// Where a loaded dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    /// Fetched live from the service and cached.
    Fresh,
    /// Served from an unexpired cache entry without touching the network.
    Cached,
    /// The live fetch failed; served from an expired cache entry.
    Stale,
}

/// A dataset plus where it came from, so callers can flag degraded data.
pub struct Loaded<T> {
    pub data: T,
    pub origin: DataOrigin,
}

/// The read-through flow: serve a fresh cache hit, otherwise fetch and
/// cache; when the fetch fails, fall back to the stale entry before
/// propagating the error for user-facing display.
async fn load_through<T, Fut>(
    cache: &SwrCache<T>,
    scope: Option<&str>,
    what: &str,
    fetch: Fut,
) -> Result<Loaded<T>>
where
    T: Serialize + DeserializeOwned,
    Fut: Future<Output = Result<T>>,
{
    if let Some(data) = cache.get(scope) {
        debug!(dataset = what, "Cache hit");
        return Ok(Loaded {
            data,
            origin: DataOrigin::Cached,
        });
    }

    match fetch.await {
        Ok(data) => {
            cache.set(&data, scope);
            Ok(Loaded {
                data,
                origin: DataOrigin::Fresh,
            })
        }
        Err(e) => {
            warn!(dataset = what, error = %e, "Fetch failed, falling back to stale cache");
            match cache.get_stale_or_null(scope) {
                Some(data) => {
                    info!(dataset = what, age = ?cache.age_display(scope), "Serving stale cached data");
                    Ok(Loaded {
                        data,
                        origin: DataOrigin::Stale,
                    })
                }
                None => Err(e).with_context(|| format!("Failed to load {}", what)),
            }
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub session: Session,
    pub api: ApiClient,
    store: Arc<dyn KeyValueStore>,

    groups_cache: SwrCache<Vec<ExerciseGroup>>,
    training_days_cache: SwrCache<Vec<TrainingDayAssignment>>,
    completions_cache: SwrCache<Vec<WorkoutCompletion>>,
    notes_cache: SwrCache<Vec<Note>>,
    imbalance_cache: SwrCache<Vec<ImbalanceImage>>,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let cache_dir = config
            .cache_dir()
            .unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");

        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&cache_dir)?);

        // Load session from disk if it exists
        let mut session = Session::new(cache_dir);
        match session.load() {
            Ok(loaded) => debug!(loaded, "Session load attempted"),
            Err(e) => debug!(error = %e, "Failed to load session"),
        }

        // Environment overrides for development and scripting
        if let (Ok(user), Ok(token)) =
            (std::env::var("FITCACHE_USER"), std::env::var("FITCACHE_TOKEN"))
        {
            session.update(SessionData::new(user, token));
        }

        let service_url = std::env::var("FITCACHE_SERVICE_URL")
            .unwrap_or_else(|_| config.service_url().to_string());

        let mut api = ApiClient::new(service_url)?;
        if let Some(ref data) = session.data {
            if !data.is_expired() {
                api.set_token(data.token.clone());
            }
        }

        Ok(Self {
            groups_cache: SwrCache::new(store.clone(), GROUPS_CACHE_KEY, CATALOG_TTL),
            training_days_cache: SwrCache::new(
                store.clone(),
                TRAINING_DAYS_CACHE_KEY,
                USER_DATA_TTL,
            ),
            completions_cache: SwrCache::new(store.clone(), COMPLETIONS_CACHE_KEY, USER_DATA_TTL),
            notes_cache: SwrCache::new(store.clone(), NOTES_CACHE_KEY, USER_DATA_TTL),
            imbalance_cache: SwrCache::new(store.clone(), IMBALANCE_CACHE_KEY, USER_DATA_TTL),
            config,
            session,
            api,
            store,
        })
    }

    /// Per-category exercise cache. Caches are cheap handles over the
    /// shared store, so these are built on demand.
    fn exercises_cache(&self, category: ExerciseCategory) -> SwrCache<Vec<Exercise>> {
        SwrCache::new(
            self.store.clone(),
            format!("{}-{}", EXERCISES_CACHE_PREFIX, category.as_str()),
            CATALOG_TTL,
        )
    }

    /// Per-group exercise cache, keyed by group id.
    fn group_exercises_cache(&self, group_id: i64) -> SwrCache<Vec<Exercise>> {
        SwrCache::new(
            self.store.clone(),
            format!("{}-group-{}", EXERCISES_CACHE_PREFIX, group_id),
            CATALOG_TTL,
        )
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Store a service-issued token and user id as the active session.
    pub fn login(&mut self, user_id: &str, token: &str) -> Result<()> {
        self.session
            .update(SessionData::new(user_id.to_string(), token.to_string()));
        self.session.save().context("Failed to save session")?;
        self.api.set_token(token.to_string());

        self.config.last_user = Some(user_id.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        info!(user = user_id, "Signed in");
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.session.clear().context("Failed to clear session")
    }

    /// Per-user commands need a signed-in user for scoping and API paths.
    fn require_user(&self) -> Result<String> {
        self.session.user_id().map(str::to_string).context(
            "Not signed in - run `fitcache login <user-id> <token>` or set FITCACHE_USER/FITCACHE_TOKEN",
        )
    }

    // =========================================================================
    // Read-through loaders
    // =========================================================================

    pub async fn load_groups(&self) -> Result<Loaded<Vec<ExerciseGroup>>> {
        load_through(
            &self.groups_cache,
            None,
            "exercise groups",
            self.api.fetch_groups(),
        )
        .await
    }

    pub async fn load_exercises(
        &self,
        category: ExerciseCategory,
    ) -> Result<Loaded<Vec<Exercise>>> {
        let cache = self.exercises_cache(category);
        load_through(&cache, None, "exercises", self.api.fetch_exercises(category)).await
    }

    pub async fn load_group_exercises(&self, group_id: i64) -> Result<Loaded<Vec<Exercise>>> {
        let cache = self.group_exercises_cache(group_id);
        load_through(
            &cache,
            None,
            "group exercises",
            self.api.fetch_group_exercises(group_id),
        )
        .await
    }

    pub async fn load_training_days(&self) -> Result<Loaded<Vec<TrainingDayAssignment>>> {
        let user = self.require_user()?;
        load_through(
            &self.training_days_cache,
            Some(&user),
            "training days",
            self.api.fetch_training_days(&user),
        )
        .await
    }

    pub async fn load_completions(&self) -> Result<Loaded<Vec<WorkoutCompletion>>> {
        let user = self.require_user()?;
        load_through(
            &self.completions_cache,
            Some(&user),
            "completions",
            self.api.fetch_completions(&user),
        )
        .await
    }

    pub async fn load_notes(&self) -> Result<Loaded<Vec<Note>>> {
        let user = self.require_user()?;
        load_through(
            &self.notes_cache,
            Some(&user),
            "notes",
            self.api.fetch_notes(&user),
        )
        .await
    }

    pub async fn load_imbalance_images(&self) -> Result<Loaded<Vec<ImbalanceImage>>> {
        let user = self.require_user()?;
        load_through(
            &self.imbalance_cache,
            Some(&user),
            "imbalance images",
            self.api.fetch_imbalance_images(&user),
        )
        .await
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Record today's workout as completed, then drop the cached log so the
    /// next read refetches.
    pub async fn complete_today(&self, day_number: u8) -> Result<WorkoutCompletion> {
        let user = self.require_user()?;
        let today = Local::now().date_naive();
        let completion = self.api.record_completion(&user, day_number, today).await?;
        self.completions_cache.clear();
        Ok(completion)
    }

    pub async fn add_note(&self, body: &str) -> Result<Note> {
        let user = self.require_user()?;
        let note = self.api.save_note(&user, body).await?;
        self.notes_cache.clear();
        Ok(note)
    }

    pub async fn delete_note(&self, note_id: i64) -> Result<()> {
        let user = self.require_user()?;
        self.api.delete_note(&user, note_id).await?;
        self.notes_cache.clear();
        Ok(())
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Re-fetch the catalog (and the signed-in user's data) regardless of
    /// cache freshness, overwriting caches on success. Individual failures
    /// are logged and skipped so one bad endpoint does not abort the rest.
    pub async fn refresh_all(&self) -> Result<()> {
        info!("Refreshing catalog data");

        match self.api.fetch_groups().await {
            Ok(groups) => {
                info!(count = groups.len(), "Exercise groups refreshed");
                self.groups_cache.set(&groups, None);
            }
            Err(e) => warn!(error = %e, "Failed to refresh exercise groups"),
        }

        let results: Vec<(ExerciseCategory, Result<Vec<Exercise>>)> =
            stream::iter(ExerciseCategory::ALL)
                .map(|category| async move {
                    (category, self.api.fetch_exercises(category).await)
                })
                .buffer_unordered(MAX_CONCURRENT_REQUESTS)
                .collect()
                .await;

        for (category, result) in results {
            match result {
                Ok(exercises) => {
                    info!(
                        category = category.as_str(),
                        count = exercises.len(),
                        "Exercises refreshed"
                    );
                    self.exercises_cache(category).set(&exercises, None);
                }
                Err(e) => {
                    warn!(category = category.as_str(), error = %e, "Failed to refresh exercises")
                }
            }
        }

        if let Ok(user) = self.require_user() {
            info!(user = %user, "Refreshing user data");

            let (days, completions, notes, images) = tokio::join!(
                self.api.fetch_training_days(&user),
                self.api.fetch_completions(&user),
                self.api.fetch_notes(&user),
                self.api.fetch_imbalance_images(&user),
            );

            match days {
                Ok(data) => self.training_days_cache.set(&data, Some(&user)),
                Err(e) => warn!(error = %e, "Failed to refresh training days"),
            }
            match completions {
                Ok(data) => self.completions_cache.set(&data, Some(&user)),
                Err(e) => warn!(error = %e, "Failed to refresh completions"),
            }
            match notes {
                Ok(data) => self.notes_cache.set(&data, Some(&user)),
                Err(e) => warn!(error = %e, "Failed to refresh notes"),
            }
            match images {
                Ok(data) => self.imbalance_cache.set(&data, Some(&user)),
                Err(e) => warn!(error = %e, "Failed to refresh imbalance images"),
            }
        }

        info!("Refresh complete");
        Ok(())
    }

    /// The "clear cache and reload" affordance: drop every dataset cache so
    /// the next loads go to the service.
    pub fn clear_caches(&self) {
        // Per-group listings are keyed by group id; derive the ids from the
        // cached group list before it is dropped.
        if let Some(groups) = self.groups_cache.get_stale_or_null(None) {
            for group in &groups {
                self.group_exercises_cache(group.id).clear();
            }
        }

        self.groups_cache.clear();
        for category in ExerciseCategory::ALL {
            self.exercises_cache(category).clear();
        }
        self.training_days_cache.clear();
        self.completions_cache.clear();
        self.notes_cache.clear();
        self.imbalance_cache.clear();
        info!("All caches cleared");
    }

    /// Cache age of the groups dataset for status display.
    pub fn groups_cache_age(&self) -> Option<String> {
        self.groups_cache.age_display(None)
    }
}

// ============================================================================
// Tests
// ============================================================================
