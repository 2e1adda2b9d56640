//! JSON envelopes used by the learning backend.

use crate::error::PlayerError;
use crate::types::{Curriculum, EnrolledCourse, Enrollment};
use serde::{Deserialize, Serialize};

/// Every backend response is wrapped as `{ "success": bool, ... }`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub success: bool,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub curriculum: Option<Curriculum>,

    #[serde(default)]
    pub enrollment: Option<Enrollment>,

    #[serde(default)]
    pub enrollments: Option<Vec<EnrolledCourse>>,
}

impl Envelope {
    fn ensure_success(&self) -> Result<(), PlayerError> {
        if self.success {
            return Ok(());
        }
        Err(PlayerError::UnexpectedResponse {
            message: self
                .message
                .clone()
                .unwrap_or_else(|| "backend reported failure".to_string()),
        })
    }

    pub fn into_curriculum(self) -> Result<Curriculum, PlayerError> {
        self.ensure_success()?;
        self.curriculum.ok_or_else(|| missing("curriculum"))
    }

    pub fn into_enrollment(self) -> Result<Enrollment, PlayerError> {
        self.ensure_success()?;
        self.enrollment.ok_or_else(|| missing("enrollment"))
    }

    pub fn into_enrollments(self) -> Result<Vec<EnrolledCourse>, PlayerError> {
        self.ensure_success()?;
        self.enrollments.ok_or_else(|| missing("enrollments"))
    }
}

fn missing(field: &str) -> PlayerError {
    PlayerError::UnexpectedResponse {
        message: format!("response is missing `{field}`"),
    }
}

/// Body of `POST /progress/mark-complete`.
#[derive(Debug, Serialize)]
pub(crate) struct MarkCompleteRequest<'a> {
    #[serde(rename = "enrollmentId")]
    pub enrollment_id: &'a str,

    #[serde(rename = "videoId")]
    pub lesson_id: &'a str,
}

/// Pulls a human-readable message out of an error body, if there is one.
pub(crate) fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(alias = "error")]
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.chars().take(200).collect())
}
