/// The learner's enrolled-course library ("My Learning")
use crate::api::LearningBackend;
use crate::error::PlayerError;
use crate::types::{EnrolledCourse, EnrollmentStatus};
use std::sync::Arc;
use tracing::{error, info};

/// Which enrollments to show
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LibraryFilter {
    #[default]
    All,
    /// Active and not yet at 100%
    InProgress,
    /// Marked completed, or at 100%
    Completed,
}

impl LibraryFilter {
    pub fn matches(&self, course: &EnrolledCourse) -> bool {
        let enrollment = &course.enrollment;
        match self {
            LibraryFilter::All => true,
            LibraryFilter::InProgress => {
                enrollment.status == EnrollmentStatus::Active && enrollment.progress_percent < 100
            }
            LibraryFilter::Completed => {
                enrollment.status == EnrollmentStatus::Completed
                    || enrollment.progress_percent >= 100
            }
        }
    }
}

/// Lists the courses a learner is enrolled in.
pub struct Library<B> {
    backend: Arc<B>,
}

impl<B: LearningBackend> Library<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Fetches the learner's enrollments that match `filter`, in backend order.
    pub async fn courses(&self, filter: LibraryFilter) -> Result<Vec<EnrolledCourse>, PlayerError> {
        let courses = self.backend.list_enrollments().await.inspect_err(|e| {
            error!(error = %e, "Failed to load enrolled courses");
        })?;

        info!(total = courses.len(), ?filter, "Loaded enrolled courses");
        Ok(courses.into_iter().filter(|c| filter.matches(c)).collect())
    }
}
