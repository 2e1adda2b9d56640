/// Learning backend access
///
/// The backend owns curricula and enrollments; the player only reads them
/// and asks the backend to record completions.
mod cache;
mod client;
mod credentials;
mod wire;

pub use cache::{CacheStats, CurriculumCache};
pub use client::HttpBackend;
pub use credentials::{CredentialFingerprint, CredentialProvider, TokenStore};

use crate::error::PlayerError;
use crate::types::{CourseId, Curriculum, EnrolledCourse, Enrollment, EnrollmentId, LessonId};
use async_trait::async_trait;

/// Request/response contract the player needs from the learning backend.
#[async_trait]
pub trait LearningBackend: Send + Sync {
    /// Fetches the ordered module/lesson tree of a course.
    async fn fetch_curriculum(&self, course_id: &CourseId) -> Result<Curriculum, PlayerError>;

    /// Fetches the learner's enrollment record.
    async fn fetch_enrollment(&self, enrollment_id: &EnrollmentId) -> Result<Enrollment, PlayerError>;

    /// Durably records a lesson completion and returns the updated enrollment.
    async fn record_completion(
        &self,
        enrollment_id: &EnrollmentId,
        lesson_id: &LessonId,
    ) -> Result<Enrollment, PlayerError>;

    /// Lists every course the learner is enrolled in.
    async fn list_enrollments(&self) -> Result<Vec<EnrolledCourse>, PlayerError>;
}
