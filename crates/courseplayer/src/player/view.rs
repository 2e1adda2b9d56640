/// Render-ready player state
///
/// Snapshots are plain data: the UI layer draws the lesson list, the
/// playback surface, and the navigation/progress controls from them.
use super::sequence::{percent, PlaybackSequence, SequencedLesson};
use crate::duration::AggregateDuration;
use crate::types::{CourseId, Curriculum, Enrollment, Lesson, ModuleId};
use serde::Serialize;

/// What the player should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlayerView {
    Uninitialized,
    /// Loading indicator
    Loading,
    /// The course has no lessons
    Empty { course_id: CourseId },
    Ready(PlayerSnapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub course_id: CourseId,
    pub current: LessonView,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    /// Disables the "mark complete" control
    pub completion_in_flight: bool,
    pub course_completed: bool,
    pub progress: ProgressSummary,
    pub outline: Vec<ModuleOutline>,
}

/// The lesson on the playback surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonView {
    pub index: usize,
    pub lesson: Lesson,
    pub module_title: String,
}

impl LessonView {
    pub(crate) fn new(index: usize, entry: &SequencedLesson) -> Self {
        Self {
            index,
            lesson: entry.lesson.clone(),
            module_title: entry.module_title.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

/// Sidebar entry for one module
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleOutline {
    /// 1-based, for "Module N" labels
    pub number: usize,
    pub module_id: ModuleId,
    pub title: String,
    pub completed: usize,
    pub total: usize,
    pub duration: AggregateDuration,
    pub lessons: Vec<LessonRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonRow {
    /// Position in the playback sequence; pass to `select_lesson`
    pub index: usize,
    pub title: String,
    pub duration_label: String,
    pub is_free_preview: bool,
    pub status: LessonStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    /// Currently playing; wins over `Completed`
    Active,
    Completed,
    Pending,
}

impl PlayerSnapshot {
    pub(crate) fn build(
        curriculum: &Curriculum,
        sequence: &PlaybackSequence,
        enrollment: &Enrollment,
        current_index: usize,
        completion_in_flight: bool,
        course_completed: bool,
    ) -> Option<Self> {
        let mut global_index = 0;
        let outline = curriculum
            .modules
            .iter()
            .enumerate()
            .map(|(module_index, module)| {
                let lessons: Vec<LessonRow> = module
                    .lessons
                    .iter()
                    .map(|lesson| {
                        let index = global_index;
                        global_index += 1;
                        let status = if index == current_index {
                            LessonStatus::Active
                        } else if enrollment.is_completed(&lesson.lesson_id) {
                            LessonStatus::Completed
                        } else {
                            LessonStatus::Pending
                        };
                        LessonRow {
                            index,
                            title: lesson.title.clone(),
                            duration_label: lesson.duration_label.clone(),
                            is_free_preview: lesson.is_free_preview,
                            status,
                        }
                    })
                    .collect();

                ModuleOutline {
                    number: module_index + 1,
                    module_id: module.module_id.clone(),
                    title: module.title.clone(),
                    completed: module
                        .lessons
                        .iter()
                        .filter(|l| enrollment.is_completed(&l.lesson_id))
                        .count(),
                    total: module.lessons.len(),
                    duration: AggregateDuration::from_labels(
                        module.lessons.iter().map(|l| l.duration_label.as_str()),
                    ),
                    lessons,
                }
            })
            .collect();

        let completed = sequence.completed_count(enrollment);
        let total = sequence.len();
        let current = sequence
            .get(current_index)
            .map(|entry| LessonView::new(current_index, entry))?;

        Some(Self {
            course_id: curriculum.course_id.clone(),
            current,
            can_go_previous: current_index > 0,
            can_go_next: current_index + 1 < total,
            completion_in_flight,
            course_completed,
            progress: ProgressSummary {
                completed,
                total,
                percent: percent(completed, total),
            },
            outline,
        })
    }
}
