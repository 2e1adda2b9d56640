/// Types for curriculum and enrollment data
///
/// Field names follow the learning backend's JSON, which still calls lessons
/// "videos".
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::duration::LessonDuration;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Identifies a course in the catalog.
    CourseId
);
opaque_id!(
    /// Identifies a module, unique within a curriculum.
    ModuleId
);
opaque_id!(
    /// Identifies a lesson, unique within a curriculum.
    LessonId
);
opaque_id!(
    /// Identifies one learner's enrollment in one course.
    EnrollmentId
);

/// A single playable unit within a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(rename = "videoId")]
    pub lesson_id: LessonId,

    pub title: String,

    /// Playable URL or embed reference
    #[serde(rename = "url", default, deserialize_with = "null_as_default")]
    pub media_reference: String,

    /// Free-text duration as entered by course authors ("5:30", "Self-paced")
    #[serde(rename = "duration", default, deserialize_with = "null_as_default")]
    pub duration_label: String,

    #[serde(rename = "isFree", default, deserialize_with = "null_as_default")]
    pub is_free_preview: bool,
}

impl Lesson {
    /// Parses the duration label, if it is a clock-style duration.
    pub fn duration(&self) -> Option<LessonDuration> {
        LessonDuration::parse(&self.duration_label)
    }
}

/// An ordered group of lessons within a curriculum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(rename = "moduleId")]
    pub module_id: ModuleId,

    pub title: String,

    #[serde(rename = "videos", default, deserialize_with = "null_as_default")]
    pub lessons: Vec<Lesson>,
}

/// The ordered module/lesson tree for one course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    /// Some backend versions omit this; the client fills it from the request.
    #[serde(rename = "courseId", default, deserialize_with = "null_as_default")]
    pub course_id: CourseId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub modules: Vec<Module>,
}

impl Curriculum {
    /// Total number of lessons across all modules.
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }
}

/// Lifecycle flag of an enrollment. Opaque to the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Completed,
    #[serde(other)]
    Other,
}

/// The record linking one learner to one course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EnrollmentRecord")]
pub struct Enrollment {
    #[serde(rename = "enrollmentId")]
    pub enrollment_id: EnrollmentId,

    #[serde(rename = "courseId")]
    pub course_id: Option<CourseId>,

    #[serde(rename = "completedVideos")]
    pub completed_lessons: BTreeSet<LessonId>,

    #[serde(rename = "lastWatchedVideo")]
    pub last_watched_lesson: Option<LessonId>,

    /// Server-computed; the player recomputes its own display value
    #[serde(rename = "progress")]
    pub progress_percent: u8,

    pub status: EnrollmentStatus,
}

/// Enrollment as the backend sends it. `enrollmentId` is authoritative;
/// documents that only carry the database `_id` fall back to it.
#[derive(Deserialize)]
struct EnrollmentRecord {
    #[serde(rename = "enrollmentId", default)]
    enrollment_id: Option<EnrollmentId>,

    #[serde(rename = "_id", default)]
    document_id: Option<EnrollmentId>,

    #[serde(rename = "courseId", default)]
    course_id: Option<CourseId>,

    #[serde(rename = "completedVideos", default, deserialize_with = "null_as_default")]
    completed_lessons: BTreeSet<LessonId>,

    #[serde(rename = "lastWatchedVideo", default)]
    last_watched_lesson: Option<LessonId>,

    #[serde(rename = "progress", default, deserialize_with = "deserialize_percent")]
    progress_percent: u8,

    #[serde(default, deserialize_with = "null_as_default")]
    status: EnrollmentStatus,
}

impl TryFrom<EnrollmentRecord> for Enrollment {
    type Error = String;

    fn try_from(record: EnrollmentRecord) -> Result<Self, Self::Error> {
        let enrollment_id = record
            .enrollment_id
            .or(record.document_id)
            .ok_or_else(|| "enrollment has neither enrollmentId nor _id".to_string())?;

        Ok(Self {
            enrollment_id,
            course_id: record.course_id,
            completed_lessons: record.completed_lessons,
            last_watched_lesson: record.last_watched_lesson,
            progress_percent: record.progress_percent,
            status: record.status,
        })
    }
}

impl Enrollment {
    pub fn is_completed(&self, lesson_id: &LessonId) -> bool {
        self.completed_lessons.contains(lesson_id)
    }
}

/// Course details embedded in a "my courses" listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseSummary {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub instructor: Option<String>,

    #[serde(rename = "totalVideos", default, deserialize_with = "null_as_default")]
    pub total_lessons: usize,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub level: Option<String>,
}

/// One entry of the learner's enrolled-course listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolledCourse {
    #[serde(flatten)]
    pub enrollment: Enrollment,

    #[serde(rename = "enrolledAt", default)]
    pub enrolled_at: Option<DateTime<Utc>>,

    /// `null` when the course has since been removed from the catalog
    #[serde(default, deserialize_with = "null_as_default")]
    pub course: CourseSummary,
}

impl EnrolledCourse {
    pub fn title(&self) -> &str {
        self.course.title.as_deref().unwrap_or("Untitled Course")
    }

    pub fn instructor(&self) -> &str {
        self.course.instructor.as_deref().unwrap_or("Unknown")
    }

    pub fn certificate_eligible(&self) -> bool {
        self.enrollment.progress_percent >= 100
    }
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts integer or fractional percentages and clamps them to 0..=100.
fn deserialize_percent<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0);
    if !value.is_finite() {
        return Ok(0);
    }
    Ok(value.round().clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curriculum_decodes_backend_names() {
        let json = r#"{
            "courseId": "c1",
            "modules": [
                {"moduleId": "m1", "title": "Intro", "videos": [
                    {"videoId": "a", "title": "Welcome", "url": "https://v/a", "duration": "5:30", "isFree": true},
                    {"videoId": "b", "title": "Setup", "url": "https://v/b", "duration": "Self-paced"}
                ]},
                {"moduleId": "m2", "title": "Empty"}
            ]
        }"#;

        let curriculum: Curriculum = serde_json::from_str(json).unwrap();
        assert_eq!(curriculum.course_id, CourseId::from("c1"));
        assert_eq!(curriculum.lesson_count(), 2);
        assert!(curriculum.modules[0].lessons[0].is_free_preview);
        assert!(!curriculum.modules[0].lessons[1].is_free_preview);
        assert!(curriculum.modules[1].lessons.is_empty());
        assert!(curriculum.modules[0].lessons[1].duration().is_none());
    }

    #[test]
    fn test_enrollment_decodes_and_dedupes() {
        let json = r#"{
            "_id": "e1",
            "courseId": "c1",
            "completedVideos": ["a", "b", "a"],
            "lastWatchedVideo": null,
            "progress": 66.6,
            "status": "active"
        }"#;

        let enrollment: Enrollment = serde_json::from_str(json).unwrap();
        assert_eq!(enrollment.enrollment_id, EnrollmentId::from("e1"));
        assert_eq!(enrollment.completed_lessons.len(), 2);
        assert_eq!(enrollment.progress_percent, 67);
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        assert!(enrollment.last_watched_lesson.is_none());
    }

    #[test]
    fn test_unknown_status_is_other() {
        let json = r#"{"enrollmentId": "e1", "status": "suspended"}"#;
        let enrollment: Enrollment = serde_json::from_str(json).unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Other);
        assert_eq!(enrollment.progress_percent, 0);
    }

    #[test]
    fn test_enrolled_course_defaults() {
        let json = r#"{
            "enrollmentId": "e1",
            "courseId": "c1",
            "progress": 100,
            "status": "completed",
            "enrolledAt": "2025-01-15T10:00:00Z"
        }"#;

        let entry: EnrolledCourse = serde_json::from_str(json).unwrap();
        assert_eq!(entry.title(), "Untitled Course");
        assert_eq!(entry.instructor(), "Unknown");
        assert!(entry.certificate_eligible());
        assert!(entry.enrolled_at.is_some());
    }

    #[test]
    fn test_enrollment_id_wins_over_document_id() {
        let json = r#"{"_id": "665f1c", "enrollmentId": "e1", "courseId": "c1", "progress": 0}"#;
        let enrollment: Enrollment = serde_json::from_str(json).unwrap();
        assert_eq!(enrollment.enrollment_id, EnrollmentId::from("e1"));

        let json = r#"{"enrollmentId": "e1", "_id": "665f1c"}"#;
        let enrollment: Enrollment = serde_json::from_str(json).unwrap();
        assert_eq!(enrollment.enrollment_id, EnrollmentId::from("e1"));
    }

    #[test]
    fn test_enrollment_without_any_id_is_rejected() {
        let json = r#"{"courseId": "c1", "completedVideos": []}"#;
        assert!(serde_json::from_str::<Enrollment>(json).is_err());
    }

    #[test]
    fn test_listing_tolerates_null_fields() {
        let json = r#"[
            {"enrollmentId": "e1", "courseId": "c1", "progress": 10, "status": "active", "course": null},
            {"_id": "e2", "courseId": "c2", "completedVideos": null, "status": null,
             "course": {"title": "Rust", "instructor": null, "totalVideos": null}}
        ]"#;

        let listing: Vec<EnrolledCourse> = serde_json::from_str(json).unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].title(), "Untitled Course");
        assert_eq!(listing[0].instructor(), "Unknown");
        assert_eq!(listing[1].enrollment.enrollment_id, EnrollmentId::from("e2"));
        assert_eq!(listing[1].title(), "Rust");
        assert_eq!(listing[1].course.total_lessons, 0);
        assert!(listing[1].enrollment.completed_lessons.is_empty());
        assert_eq!(listing[1].enrollment.status, EnrollmentStatus::Active);
    }

    #[test]
    fn test_lesson_null_strings_default() {
        let json = r#"{"videoId": "a", "title": "Intro", "url": null, "duration": null, "isFree": null}"#;
        let lesson: Lesson = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.media_reference, "");
        assert_eq!(lesson.duration_label, "");
        assert!(!lesson.is_free_preview);
        assert!(lesson.duration().is_none());
    }
}
