//! HTTP client for the fitness data service.
//!
//! This module provides the `ApiClient` struct for talking to the hosted
//! service's REST endpoints: the exercise catalog, per-user schedule and
//! completion data, notes, and imbalance imagery.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::models::{
    Exercise, ExerciseCategory, ExerciseGroup, ImbalanceImage, Note, TrainingDayAssignment,
    WorkoutCompletion,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
/// 3 retries with exponential backoff usually succeeds without excessive delay.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the fitness data service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if a response is successful, returning an error with the body
    /// if not. Returns Ok(Some(response)) for success, Ok(None) for rate
    /// limit (should retry), or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Check if a response is successful, returning an error with the body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .send()
                .await
                .with_context(|| format!("Failed to send GET request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .text()
                        .await
                        .with_context(|| format!("Failed to read response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    /// Fetch a list endpoint, tolerating both bare-array and wrapped shapes.
    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let text = self.get_text(path).await?;
        parse_list(&text).with_context(|| format!("Failed to parse response from {}", path))
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .post(&url)
                .headers(self.auth_headers()?)
                .json(body)
                .send()
                .await
                .with_context(|| format!("Failed to send POST request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse JSON response from {}", url));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        let response = self
            .client
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .with_context(|| format!("Failed to send DELETE request to {}", url))?;

        Self::check_response(response).await?;
        Ok(())
    }

    // ===== Catalog reads (cache-fronted) =====

    /// Fetch all exercise groups
    pub async fn fetch_groups(&self) -> Result<Vec<ExerciseGroup>> {
        self.get_list("groups").await
    }

    /// Fetch the exercises for one category
    pub async fn fetch_exercises(&self, category: ExerciseCategory) -> Result<Vec<Exercise>> {
        self.get_list(&format!("exercises?category={}", category.as_str()))
            .await
    }

    /// Fetch the exercises belonging to a specific group
    pub async fn fetch_group_exercises(&self, group_id: i64) -> Result<Vec<Exercise>> {
        self.get_list(&format!("groups/{}/exercises", group_id)).await
    }

    // ===== Per-user reads (cache-fronted) =====

    /// Fetch the user's training-day assignments
    pub async fn fetch_training_days(&self, user_id: &str) -> Result<Vec<TrainingDayAssignment>> {
        self.get_list(&format!("users/{}/training-days", user_id))
            .await
    }

    /// Fetch the user's workout completion log
    pub async fn fetch_completions(&self, user_id: &str) -> Result<Vec<WorkoutCompletion>> {
        self.get_list(&format!("users/{}/completions", user_id)).await
    }

    /// Fetch the user's notes
    pub async fn fetch_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        self.get_list(&format!("users/{}/notes", user_id)).await
    }

    /// Fetch the user's imbalance image references
    pub async fn fetch_imbalance_images(&self, user_id: &str) -> Result<Vec<ImbalanceImage>> {
        self.get_list(&format!("users/{}/imbalance-images", user_id))
            .await
    }

    // ===== Mutations (never cache-fronted) =====

    /// Record a workout completion for one date
    pub async fn record_completion(
        &self,
        user_id: &str,
        day_number: u8,
        date: NaiveDate,
    ) -> Result<WorkoutCompletion> {
        let body = serde_json::json!({
            "dayNumber": day_number,
            "date": date,
            "completed": true,
        });
        self.post(&format!("users/{}/completions", user_id), &body)
            .await
    }

    /// Save a new note
    pub async fn save_note(&self, user_id: &str, body: &str) -> Result<Note> {
        let payload = serde_json::json!({ "body": body });
        self.post(&format!("users/{}/notes", user_id), &payload).await
    }

    /// Delete a note
    pub async fn delete_note(&self, user_id: &str, note_id: i64) -> Result<()> {
        self.delete(&format!("users/{}/notes/{}", user_id, note_id))
            .await
    }
}

/// Parse a response that is either a bare JSON array or wrapped in a
/// `data` field.
fn parse_list<T: DeserializeOwned>(text: &str) -> std::result::Result<Vec<T>, serde_json::Error> {
    match serde_json::from_str::<Vec<T>>(text) {
        Ok(items) => Ok(items),
        Err(direct_err) => {
            #[derive(Deserialize)]
            struct Wrapper<T> {
                data: Vec<T>,
            }

            match serde_json::from_str::<Wrapper<T>>(text) {
                Ok(wrapper) => Ok(wrapper.data),
                Err(_) => Err(direct_err),
            }
        }
    }
}
