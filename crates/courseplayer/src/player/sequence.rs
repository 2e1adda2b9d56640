/// Flattened playback order of a curriculum
use crate::types::{Curriculum, Enrollment, Lesson, LessonId};

/// A lesson positioned in the global playback order.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedLesson {
    pub lesson: Lesson,
    pub module_index: usize,
    pub module_title: String,
}

/// Lessons in `(module order, lesson order)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSequence {
    lessons: Vec<SequencedLesson>,
}

impl PlaybackSequence {
    /// Concatenates each module's lessons in document order.
    pub fn flatten(curriculum: &Curriculum) -> Self {
        let lessons = curriculum
            .modules
            .iter()
            .enumerate()
            .flat_map(|(module_index, module)| {
                module.lessons.iter().map(move |lesson| SequencedLesson {
                    lesson: lesson.clone(),
                    module_index,
                    module_title: module.title.clone(),
                })
            })
            .collect();

        Self { lessons }
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SequencedLesson> {
        self.lessons.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequencedLesson> {
        self.lessons.iter()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.lessons.len().checked_sub(1)
    }

    pub fn position_of(&self, lesson_id: &LessonId) -> Option<usize> {
        self.lessons
            .iter()
            .position(|entry| &entry.lesson.lesson_id == lesson_id)
    }

    /// Where a returning learner starts.
    ///
    /// Last-watched lesson if still present, else the first incomplete
    /// lesson, else the first lesson. `None` only for an empty sequence.
    pub fn resume_index(&self, enrollment: &Enrollment) -> Option<usize> {
        if self.is_empty() {
            return None;
        }

        let last_watched = enrollment
            .last_watched_lesson
            .as_ref()
            .and_then(|id| self.position_of(id));

        let first_incomplete = || {
            self.lessons
                .iter()
                .position(|entry| !enrollment.is_completed(&entry.lesson.lesson_id))
        };

        Some(last_watched.or_else(first_incomplete).unwrap_or(0))
    }

    /// Completed lessons that are still part of this sequence.
    ///
    /// Ids of lessons removed from the curriculum are not counted.
    pub fn completed_count(&self, enrollment: &Enrollment) -> usize {
        self.lessons
            .iter()
            .filter(|entry| enrollment.is_completed(&entry.lesson.lesson_id))
            .count()
    }

    /// `round(100 * completed / total)`, or 0 for an empty sequence.
    pub fn progress_percent(&self, enrollment: &Enrollment) -> u8 {
        percent(self.completed_count(enrollment), self.len())
    }
}

/// Integer percentage rounding half up.
pub(crate) fn percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = part.min(total) as u64;
    let total = total as u64;
    ((200 * part + total) / (2 * total)) as u8
}
