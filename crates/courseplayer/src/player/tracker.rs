//! Enrollment progress tracking for one course-playing session.
//!
//! The tracker owns the playback position and the last enrollment record the
//! backend confirmed. Completion state is never changed locally: a completed
//! lesson only shows up once the backend returns the updated enrollment.
//!
//! All operations take `&self` so the tracker can be shared with UI
//! callbacks. State sits behind a mutex that is never held across an await.
//! Each `load`/`reset` starts a new session epoch; responses that come back
//! for an older epoch are dropped.

use super::sequence::PlaybackSequence;
use super::view::{LessonView, PlayerSnapshot, PlayerView};
use crate::api::LearningBackend;
use crate::config::TrackerConfig;
use crate::error::PlayerError;
use crate::types::{CourseId, Curriculum, Enrollment, EnrollmentId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Lifecycle phase of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    /// Curriculum and enrollment requests are pending
    Loading,
    Loaded,
    /// The final lesson has been completed this session
    Completed,
}

/// Result of [`ProgressTracker::mark_current_lesson_complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum CompletionOutcome {
    /// The lesson was already complete; no request was sent
    AlreadyComplete,
    /// Completion recorded and playback moved on to `index`
    Advanced { index: usize },
    /// Completion recorded; the learner navigated elsewhere during the delay
    Stayed { index: usize },
    /// The final lesson was completed
    CourseCompleted,
    /// The session was reset or replaced before the response arrived
    Discarded,
}

struct Session {
    curriculum: Curriculum,
    enrollment: Enrollment,
    sequence: PlaybackSequence,
    /// `None` exactly when the sequence is empty
    current: Option<usize>,
    course_completed: bool,
}

impl Session {
    fn new(curriculum: Curriculum, enrollment: Enrollment) -> Self {
        let sequence = PlaybackSequence::flatten(&curriculum);
        let current = sequence.resume_index(&enrollment);
        Self {
            curriculum,
            enrollment,
            sequence,
            current,
            course_completed: false,
        }
    }

    fn select(&mut self, index: usize) -> Result<(), PlayerError> {
        if index >= self.sequence.len() {
            return Err(PlayerError::OutOfRange {
                index,
                len: self.sequence.len(),
            });
        }
        self.current = Some(index);
        Ok(())
    }
}

enum State {
    Uninitialized,
    Loading {
        course_id: CourseId,
        enrollment_id: EnrollmentId,
    },
    Ready(Session),
}

struct Inner {
    epoch: u64,
    state: State,
    /// Epoch of the session with a completion request in flight
    completing: Option<u64>,
}

impl Inner {
    fn session(&self) -> Result<&Session, PlayerError> {
        match &self.state {
            State::Ready(session) => Ok(session),
            _ => Err(PlayerError::NotLoaded),
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session, PlayerError> {
        match &mut self.state {
            State::Ready(session) => Ok(session),
            _ => Err(PlayerError::NotLoaded),
        }
    }

    /// Moves to a fresh session epoch.
    fn begin(&mut self, state: State) -> u64 {
        self.epoch += 1;
        self.state = state;
        self.completing = None;
        self.epoch
    }

    fn completion_in_flight(&self) -> bool {
        self.completing == Some(self.epoch)
    }
}

/// Tracks playback position and completion progress for one enrollment.
pub struct ProgressTracker<B> {
    backend: Arc<B>,
    auto_advance_delay: Duration,
    inner: Mutex<Inner>,
}

impl<B> ProgressTracker<B> {
    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        match &self.inner().state {
            State::Uninitialized => Phase::Uninitialized,
            State::Loading { .. } => Phase::Loading,
            State::Ready(session) if session.course_completed => Phase::Completed,
            State::Ready(_) => Phase::Loaded,
        }
    }

    /// Index of the lesson being displayed, if any.
    pub fn current_index(&self) -> Option<usize> {
        self.inner().session().ok().and_then(|s| s.current)
    }

    /// Number of lessons in the playback sequence (0 before loading).
    pub fn lesson_count(&self) -> usize {
        self.inner().session().map(|s| s.sequence.len()).unwrap_or(0)
    }

    /// Last enrollment record confirmed by the backend.
    pub fn enrollment(&self) -> Option<Enrollment> {
        self.inner().session().ok().map(|s| s.enrollment.clone())
    }

    /// True while a completion request is pending; the UI disables the
    /// "mark complete" control meanwhile.
    pub fn completion_in_flight(&self) -> bool {
        self.inner().completion_in_flight()
    }

    /// Display percentage: `round(100 * completed / total)`, 0 when empty.
    pub fn progress_percent(&self) -> u8 {
        self.inner()
            .session()
            .map(|s| s.sequence.progress_percent(&s.enrollment))
            .unwrap_or(0)
    }

    /// Shows the lesson at `index`.
    ///
    /// Navigation is not persisted to the backend. Out-of-range indices are
    /// rejected and leave the position unchanged.
    pub fn select_lesson(&self, index: usize) -> Result<(), PlayerError> {
        let mut inner = self.inner();
        let session = inner.session_mut()?;
        session.select(index).inspect_err(|e| {
            error!(error = %e, "Rejected lesson selection");
        })?;
        debug!(index, "Selected lesson");
        Ok(())
    }

    /// Steps back one lesson. Returns false when already at the first lesson.
    pub fn previous(&self) -> Result<bool, PlayerError> {
        let mut inner = self.inner();
        let session = inner.session_mut()?;
        match session.current.and_then(|index| index.checked_sub(1)) {
            Some(target) => session.select(target).map(|_| true),
            None => Ok(false),
        }
    }

    /// Steps forward one lesson. Returns false when already at the last lesson.
    pub fn next(&self) -> Result<bool, PlayerError> {
        let mut inner = self.inner();
        let session = inner.session_mut()?;
        let target = session
            .current
            .map(|index| index + 1)
            .filter(|&target| target < session.sequence.len());
        match target {
            Some(target) => session.select(target).map(|_| true),
            None => Ok(false),
        }
    }

    /// Drops the current session. Pending responses are discarded on arrival.
    pub fn reset(&self) {
        let epoch = self.inner().begin(State::Uninitialized);
        debug!(epoch, "Tracker reset");
    }

    /// Render-ready state of the player.
    pub fn view(&self) -> PlayerView {
        let inner = self.inner();
        let in_flight = inner.completion_in_flight();
        match &inner.state {
            State::Uninitialized => PlayerView::Uninitialized,
            State::Loading { .. } => PlayerView::Loading,
            State::Ready(session) => session
                .current
                .and_then(|index| {
                    PlayerSnapshot::build(
                        &session.curriculum,
                        &session.sequence,
                        &session.enrollment,
                        index,
                        in_flight,
                        session.course_completed,
                    )
                })
                .map(PlayerView::Ready)
                .unwrap_or_else(|| PlayerView::Empty {
                    course_id: session.curriculum.course_id.clone(),
                }),
        }
    }

    /// The lesson being displayed, if any.
    pub fn current_lesson(&self) -> Option<LessonView> {
        let inner = self.inner();
        let session = inner.session().ok()?;
        let index = session.current?;
        session
            .sequence
            .get(index)
            .map(|entry| LessonView::new(index, entry))
    }
}

impl<B: LearningBackend> ProgressTracker<B> {
    pub fn new(backend: Arc<B>, config: &TrackerConfig) -> Self {
        Self::with_delay(backend, config.auto_advance_delay())
    }

    /// Creates a tracker with an explicit auto-advance delay.
    pub fn with_delay(backend: Arc<B>, auto_advance_delay: Duration) -> Self {
        Self {
            backend,
            auto_advance_delay,
            inner: Mutex::new(Inner {
                epoch: 0,
                state: State::Uninitialized,
                completing: None,
            }),
        }
    }

    /// Loads a course's curriculum and the learner's enrollment.
    ///
    /// Both requests run concurrently and the load fails as a unit: on any
    /// error the tracker ends up `Uninitialized`. An empty curriculum is a
    /// valid load that renders as [`PlayerView::Empty`].
    pub async fn load(
        &self,
        course_id: CourseId,
        enrollment_id: EnrollmentId,
    ) -> Result<(), PlayerError> {
        let epoch = self.inner().begin(State::Loading {
            course_id: course_id.clone(),
            enrollment_id: enrollment_id.clone(),
        });

        info!(
            course_id = %course_id,
            enrollment_id = %enrollment_id,
            epoch,
            "Loading course and enrollment"
        );
        let start = Instant::now();

        let result = futures::try_join!(
            self.backend.fetch_curriculum(&course_id),
            self.backend.fetch_enrollment(&enrollment_id),
        )
        .and_then(|(curriculum, enrollment)| {
            check_loaded(&course_id, &enrollment_id, &curriculum, &enrollment)?;
            Ok(Session::new(curriculum, enrollment))
        });

        let mut inner = self.inner();
        if inner.epoch != epoch {
            debug!(course_id = %course_id, epoch, "Discarding load for a replaced session");
            return Ok(());
        }

        match result {
            Ok(session) => {
                info!(
                    course_id = %course_id,
                    lessons = session.sequence.len(),
                    completed = session.sequence.completed_count(&session.enrollment),
                    current = ?session.current,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Course loaded"
                );
                inner.state = State::Ready(session);
                Ok(())
            }
            Err(e) => {
                error!(
                    course_id = %course_id,
                    enrollment_id = %enrollment_id,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Failed to load course"
                );
                inner.state = State::Uninitialized;
                Err(e)
            }
        }
    }

    /// Records the displayed lesson as complete.
    ///
    /// Already-complete lessons are a no-op. Otherwise the backend records the
    /// completion and its returned enrollment replaces the local copy. Unless
    /// this was the final lesson, playback then advances after the configured
    /// delay, provided the learner is still on the completed lesson. On
    /// failure nothing changes locally.
    pub async fn mark_current_lesson_complete(&self) -> Result<CompletionOutcome, PlayerError> {
        let (epoch, index, enrollment_id, lesson_id) = {
            let mut inner = self.inner();
            if inner.completion_in_flight() {
                return Err(PlayerError::CompletionInFlight);
            }

            let epoch = inner.epoch;
            let session = inner.session()?;
            let index = session.current.ok_or(PlayerError::EmptyCurriculum)?;
            let lesson_id = session
                .sequence
                .get(index)
                .map(|entry| entry.lesson.lesson_id.clone())
                .ok_or(PlayerError::OutOfRange {
                    index,
                    len: session.sequence.len(),
                })?;

            if session.enrollment.is_completed(&lesson_id) {
                debug!(lesson_id = %lesson_id, "Lesson already complete");
                return Ok(CompletionOutcome::AlreadyComplete);
            }

            let enrollment_id = session.enrollment.enrollment_id.clone();
            inner.completing = Some(epoch);
            (epoch, index, enrollment_id, lesson_id)
        };

        let guard = InFlight {
            inner: &self.inner,
            epoch,
        };

        info!(
            enrollment_id = %enrollment_id,
            lesson_id = %lesson_id,
            "Recording lesson completion"
        );
        let result = self.backend.record_completion(&enrollment_id, &lesson_id).await;

        let next_index = {
            let mut inner = self.inner();
            if inner.epoch != epoch {
                debug!(lesson_id = %lesson_id, "Discarding completion for a replaced session");
                return Ok(CompletionOutcome::Discarded);
            }

            let enrollment = result
                .and_then(|enrollment| {
                    if enrollment.enrollment_id != enrollment_id {
                        return Err(PlayerError::UnexpectedResponse {
                            message: format!(
                                "completion for {enrollment_id} answered with {}",
                                enrollment.enrollment_id
                            ),
                        });
                    }
                    Ok(enrollment)
                })
                .inspect_err(|e| {
                    warn!(
                        enrollment_id = %enrollment_id,
                        lesson_id = %lesson_id,
                        error = %e,
                        "Failed to record lesson completion"
                    );
                })?;

            let session = inner.session_mut()?;
            session.enrollment = enrollment;
            info!(
                lesson_id = %lesson_id,
                progress = session.sequence.progress_percent(&session.enrollment),
                "Lesson completion recorded"
            );

            if session.sequence.last_index() == Some(index) {
                session.course_completed = true;
                info!(enrollment_id = %enrollment_id, "Course completed");
                return Ok(CompletionOutcome::CourseCompleted);
            }
            index + 1
        };
        drop(guard);

        if !self.auto_advance_delay.is_zero() {
            tokio::time::sleep(self.auto_advance_delay).await;
        }

        let mut inner = self.inner();
        if inner.epoch != epoch {
            return Ok(CompletionOutcome::Discarded);
        }
        let session = inner.session_mut()?;
        let current = session.current;
        match current {
            Some(current) if current == index => {
                session.select(next_index)?;
                debug!(index = next_index, "Auto-advanced to next lesson");
                Ok(CompletionOutcome::Advanced { index: next_index })
            }
            current => Ok(CompletionOutcome::Stayed {
                index: current.unwrap_or(index),
            }),
        }
    }
}

/// Clears the in-flight marker when a completion request settles.
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    epoch: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.completing == Some(self.epoch) {
            inner.completing = None;
        }
    }
}

fn check_loaded(
    course_id: &CourseId,
    enrollment_id: &EnrollmentId,
    curriculum: &Curriculum,
    enrollment: &Enrollment,
) -> Result<(), PlayerError> {
    if &enrollment.enrollment_id != enrollment_id {
        return Err(PlayerError::UnexpectedResponse {
            message: format!(
                "requested enrollment {enrollment_id}, got {}",
                enrollment.enrollment_id
            ),
        });
    }
    match &enrollment.course_id {
        Some(enrolled) if enrolled != course_id => Err(PlayerError::Forbidden {
            message: format!("enrollment {enrollment_id} is for course {enrolled}, not {course_id}"),
        }),
        _ if &curriculum.course_id != course_id => Err(PlayerError::UnexpectedResponse {
            message: format!("requested curriculum {course_id}, got {}", curriculum.course_id),
        }),
        _ => Ok(()),
    }
}
