//! Test fixtures and a scripted backend.

use crate::api::LearningBackend;
use crate::error::PlayerError;
use crate::player::PlaybackSequence;
use crate::types::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};

pub const COURSE_ID: &str = "course-1";
pub const ENROLLMENT_ID: &str = "enroll-1";

/// Builds a curriculum with one module per slice of lesson ids.
pub fn curriculum(modules: &[&[&str]]) -> Curriculum {
    Curriculum {
        course_id: CourseId::from(COURSE_ID),
        modules: modules
            .iter()
            .enumerate()
            .map(|(i, lessons)| Module {
                module_id: ModuleId::new(format!("m{}", i + 1)),
                title: format!("Module {}", i + 1),
                lessons: lessons
                    .iter()
                    .map(|id| Lesson {
                        lesson_id: LessonId::from(*id),
                        title: format!("Lesson {id}"),
                        media_reference: format!("https://video.example/{id}"),
                        duration_label: "5:00".to_string(),
                        is_free_preview: false,
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn enrollment(completed: &[&str], last_watched: Option<&str>) -> Enrollment {
    Enrollment {
        enrollment_id: EnrollmentId::from(ENROLLMENT_ID),
        course_id: Some(CourseId::from(COURSE_ID)),
        completed_lessons: completed.iter().map(|id| LessonId::from(*id)).collect(),
        last_watched_lesson: last_watched.map(LessonId::from),
        progress_percent: 0,
        status: EnrollmentStatus::Active,
    }
}

/// Holds calls at a suspension point until released.
#[derive(Default)]
struct Gate {
    semaphore: Mutex<Option<Arc<Semaphore>>>,
    reached: Notify,
}

impl Gate {
    fn hold(&self) {
        *self.semaphore.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    fn release(&self) {
        if let Some(semaphore) = self.semaphore.lock().unwrap().take() {
            semaphore.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    async fn pass(&self) {
        self.reached.notify_one();
        let semaphore = self.semaphore.lock().unwrap().clone();
        if let Some(semaphore) = semaphore {
            let _permit = semaphore.acquire().await;
        }
    }
}

/// In-memory backend. Completions update a server-side enrollment copy the
/// way the real backend does.
pub struct MockBackend {
    curriculum: Mutex<Curriculum>,
    enrollment: Mutex<Enrollment>,
    enrolled_courses: Mutex<Vec<EnrolledCourse>>,
    server_progress: Mutex<Option<u8>>,
    curriculum_error: Mutex<Option<PlayerError>>,
    enrollment_error: Mutex<Option<PlayerError>>,
    completion_error: Mutex<Option<PlayerError>>,
    listing_error: Mutex<Option<PlayerError>>,
    completion_calls: AtomicUsize,
    completion_gate: Gate,
    enrollment_gate: Gate,
}

impl MockBackend {
    pub fn new(curriculum: Curriculum, enrollment: Enrollment) -> Self {
        Self {
            curriculum: Mutex::new(curriculum),
            enrollment: Mutex::new(enrollment),
            enrolled_courses: Mutex::new(Vec::new()),
            server_progress: Mutex::new(None),
            curriculum_error: Mutex::new(None),
            enrollment_error: Mutex::new(None),
            completion_error: Mutex::new(None),
            listing_error: Mutex::new(None),
            completion_calls: AtomicUsize::new(0),
            completion_gate: Gate::default(),
            enrollment_gate: Gate::default(),
        }
    }

    pub fn set_curriculum(&self, curriculum: Curriculum) {
        *self.curriculum.lock().unwrap() = curriculum;
    }

    pub fn set_enrollment(&self, enrollment: Enrollment) {
        *self.enrollment.lock().unwrap() = enrollment;
    }

    pub fn set_enrolled_courses(&self, courses: Vec<EnrolledCourse>) {
        *self.enrolled_courses.lock().unwrap() = courses;
    }

    /// Fixes the progress value the server reports after a completion.
    pub fn set_server_progress(&self, progress: u8) {
        *self.server_progress.lock().unwrap() = Some(progress);
    }

    pub fn fail_curriculum(&self, err: PlayerError) {
        *self.curriculum_error.lock().unwrap() = Some(err);
    }

    pub fn fail_enrollment(&self, err: PlayerError) {
        *self.enrollment_error.lock().unwrap() = Some(err);
    }

    pub fn fail_completion(&self, err: PlayerError) {
        *self.completion_error.lock().unwrap() = Some(err);
    }

    pub fn fail_listing(&self, err: PlayerError) {
        *self.listing_error.lock().unwrap() = Some(err);
    }

    pub fn clear_failures(&self) {
        for slot in [
            &self.curriculum_error,
            &self.enrollment_error,
            &self.completion_error,
            &self.listing_error,
        ] {
            *slot.lock().unwrap() = None;
        }
    }

    pub fn completion_calls(&self) -> usize {
        self.completion_calls.load(Ordering::SeqCst)
    }

    /// Makes completion requests block until `release_completions`.
    pub fn hold_completions(&self) {
        self.completion_gate.hold();
    }

    pub fn release_completions(&self) {
        self.completion_gate.release();
    }

    /// Resolves once a completion request has reached the backend.
    pub async fn wait_for_completion_call(&self) {
        self.completion_gate.reached.notified().await;
    }

    /// Makes enrollment fetches block until `release_enrollment_fetches`.
    pub fn hold_enrollment_fetches(&self) {
        self.enrollment_gate.hold();
    }

    pub fn release_enrollment_fetches(&self) {
        self.enrollment_gate.release();
    }

    pub async fn wait_for_enrollment_fetch(&self) {
        self.enrollment_gate.reached.notified().await;
    }
}

#[async_trait]
impl LearningBackend for MockBackend {
    async fn fetch_curriculum(&self, _course_id: &CourseId) -> Result<Curriculum, PlayerError> {
        if let Some(err) = self.curriculum_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.curriculum.lock().unwrap().clone())
    }

    async fn fetch_enrollment(&self, _enrollment_id: &EnrollmentId) -> Result<Enrollment, PlayerError> {
        self.enrollment_gate.pass().await;
        if let Some(err) = self.enrollment_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.enrollment.lock().unwrap().clone())
    }

    async fn record_completion(
        &self,
        _enrollment_id: &EnrollmentId,
        lesson_id: &LessonId,
    ) -> Result<Enrollment, PlayerError> {
        self.completion_calls.fetch_add(1, Ordering::SeqCst);
        self.completion_gate.pass().await;

        if let Some(err) = self.completion_error.lock().unwrap().clone() {
            return Err(err);
        }

        let sequence = PlaybackSequence::flatten(&self.curriculum.lock().unwrap());
        let mut enrollment = self.enrollment.lock().unwrap();
        enrollment.completed_lessons.insert(lesson_id.clone());
        enrollment.last_watched_lesson = Some(lesson_id.clone());
        let computed = sequence.progress_percent(&enrollment);
        enrollment.progress_percent = self.server_progress.lock().unwrap().unwrap_or(computed);
        Ok(enrollment.clone())
    }

    async fn list_enrollments(&self) -> Result<Vec<EnrolledCourse>, PlayerError> {
        if let Some(err) = self.listing_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.enrolled_courses.lock().unwrap().clone())
    }
}
