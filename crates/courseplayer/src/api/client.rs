//! HTTP client for the learning backend.
//!
//! Every request is authenticated with the learner's bearer token and tagged
//! with a correlation id for log tracing. A rejected token (401) clears the
//! credential so the UI can send the learner back through sign-in.

use super::cache::{CacheStats, CurriculumCache};
use super::credentials::{CredentialFingerprint, CredentialProvider};
use super::wire::{self, Envelope, MarkCompleteRequest};
use super::LearningBackend;
use crate::config::{ApiConfig, TrackerConfig};
use crate::error::PlayerError;
use crate::types::{CourseId, Curriculum, EnrolledCourse, Enrollment, EnrollmentId, LessonId};
use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, RequestBuilder};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// Client for the learning backend's REST API.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
    curricula: CurriculumCache,
}

impl HttpBackend {
    /// Creates a client from the API and player configuration.
    pub fn new(
        api: &ApiConfig,
        player: &TrackerConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, PlayerError> {
        let client = Client::builder()
            .user_agent(&api.user_agent)
            .connect_timeout(api.connect_timeout())
            .timeout(api.request_timeout())
            .build()
            .map_err(|e| PlayerError::Config {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Self::with_client(
            client,
            api.resolved_base_url(),
            player.curriculum_cache_ttl(),
            credentials,
        )
    }

    /// Creates a client around an existing `reqwest::Client`.
    pub fn with_client(
        client: Client,
        base_url: &str,
        cache_ttl: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, PlayerError> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(PlayerError::Config {
                message: format!("backend URL {base_url} cannot be used as a base"),
            });
        }

        Ok(Self {
            client,
            base_url,
            credentials,
            curricula: CurriculumCache::new(cache_ttl),
        })
    }

    /// Builds `{base}/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends an authenticated request and decodes the response envelope.
    async fn send(
        &self,
        request: RequestBuilder,
        operation: &'static str,
    ) -> Result<Envelope, PlayerError> {
        let correlation_id = generate_correlation_id();
        let token = self.credentials.bearer_token().ok_or_else(|| {
            warn!(
                correlation_id = %correlation_id,
                operation,
                "No bearer token available"
            );
            PlayerError::MissingCredential
        })?;

        let start = Instant::now();
        debug!(
            correlation_id = %correlation_id,
            operation,
            credential = %CredentialFingerprint::of(&token),
            "Sending backend request"
        );

        let response = request
            .bearer_auth(&token)
            .header("X-Correlation-Id", &correlation_id)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    correlation_id = %correlation_id,
                    operation,
                    error = %e,
                    "Backend request failed"
                );
                PlayerError::from(e)
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = PlayerError::from_status(status, wire::error_message(&body));
            if err.needs_reauth() {
                self.credentials.invalidate();
            }
            warn!(
                correlation_id = %correlation_id,
                operation,
                status = status.as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                error = %err,
                "Backend rejected request"
            );
            return Err(err);
        }

        let envelope: Envelope = serde_json::from_str(&body)?;
        info!(
            correlation_id = %correlation_id,
            operation,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Backend request completed"
        );
        Ok(envelope)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.curricula.stats()
    }
}

#[async_trait]
impl LearningBackend for HttpBackend {
    async fn fetch_curriculum(&self, course_id: &CourseId) -> Result<Curriculum, PlayerError> {
        if let Some(cached) = self.curricula.get(course_id) {
            debug!(course_id = %course_id, "Returning cached curriculum");
            return Ok(cached);
        }

        let url = self.endpoint(&["courses", course_id.as_str(), "curriculum"]);
        let mut curriculum = self
            .send(self.client.get(url), "fetch_curriculum")
            .await?
            .into_curriculum()?;

        if curriculum.course_id.is_empty() {
            curriculum.course_id = course_id.clone();
        } else if &curriculum.course_id != course_id {
            return Err(PlayerError::UnexpectedResponse {
                message: format!(
                    "requested curriculum for {course_id}, got {}",
                    curriculum.course_id
                ),
            });
        }

        self.curricula.insert(curriculum.clone());
        Ok(curriculum)
    }

    async fn fetch_enrollment(&self, enrollment_id: &EnrollmentId) -> Result<Enrollment, PlayerError> {
        let url = self.endpoint(&["enrollments", enrollment_id.as_str()]);
        self.send(self.client.get(url), "fetch_enrollment")
            .await?
            .into_enrollment()
    }

    async fn record_completion(
        &self,
        enrollment_id: &EnrollmentId,
        lesson_id: &LessonId,
    ) -> Result<Enrollment, PlayerError> {
        let url = self.endpoint(&["progress", "mark-complete"]);
        let body = MarkCompleteRequest {
            enrollment_id: enrollment_id.as_str(),
            lesson_id: lesson_id.as_str(),
        };
        self.send(self.client.post(url).json(&body), "record_completion")
            .await?
            .into_enrollment()
    }

    async fn list_enrollments(&self) -> Result<Vec<EnrolledCourse>, PlayerError> {
        let url = self.endpoint(&["enrollments", "my-courses"]);
        self.send(self.client.get(url), "list_enrollments")
            .await?
            .into_enrollments()
    }
}

/// Generates a unique correlation ID for request tracing.
fn generate_correlation_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
