/// Course player state
mod sequence;
mod tracker;
mod view;

pub use sequence::{PlaybackSequence, SequencedLesson};
pub use tracker::{CompletionOutcome, Phase, ProgressTracker};
pub use view::{
    LessonRow, LessonStatus, LessonView, ModuleOutline, PlayerSnapshot, PlayerView,
    ProgressSummary,
};
