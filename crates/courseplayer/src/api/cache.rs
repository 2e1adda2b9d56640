//! TTL-based caching for curricula.
//!
//! Curricula are edited out-of-band and never change during a playback
//! session, so they can be reused across loads. Enrollments are never cached.

use crate::types::{CourseId, Curriculum};
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// A cached curriculum with metadata.
#[derive(Clone)]
struct CachedCurriculum {
    curriculum: Curriculum,
    cached_at: Instant,
}

/// Thread-safe curriculum cache keyed by course.
pub struct CurriculumCache {
    entries: DashMap<CourseId, CachedCurriculum>,
    ttl: Duration,
}

impl CurriculumCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Returns the curriculum for `course_id` unless its entry is older than
    /// the TTL. Stale entries are evicted on the way out.
    pub fn get(&self, course_id: &CourseId) -> Option<Curriculum> {
        let fresh = self
            .entries
            .get(course_id)
            .filter(|entry| entry.cached_at.elapsed() < self.ttl)
            .map(|entry| entry.curriculum.clone());

        if fresh.is_none() {
            self.entries
                .remove_if(course_id, |_, entry| entry.cached_at.elapsed() >= self.ttl);
        }
        fresh
    }

    pub fn insert(&self, curriculum: Curriculum) {
        self.entries.insert(
            curriculum.course_id.clone(),
            CachedCurriculum {
                curriculum,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn stats(&self) -> CacheStats {
        let total_entries = self.entries.len();
        let expired_entries = self
            .entries
            .iter()
            .filter(|entry| entry.cached_at.elapsed() >= self.ttl)
            .count();

        CacheStats {
            total_entries,
            expired_entries,
            active_entries: total_entries.saturating_sub(expired_entries),
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}
