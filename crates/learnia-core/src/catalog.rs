//! Read-only catalog contract and an in-memory double for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::Result;
use crate::model::course::{Category, Course};
use crate::model::filters::SearchFilters;

#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Nearest-neighbour search over course embeddings. Implementations
    /// request `limit × 20` candidates by similarity, apply `filters`
    /// client-side on that candidate set, and return at most `limit` courses
    /// in descending similarity order. Because filtering happens after
    /// retrieval, fewer than `limit` results may come back even when more
    /// matches exist in the full catalog.
    async fn search(
        &self,
        embedding: &[f32],
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<Course>>;

    /// Look up a course by its native id when the id parses as one, else by
    /// the legacy alias. Returns `None` when absent. The returned course
    /// carries ingestion metadata not present in other reads.
    async fn course_by_id(&self, course_id: &str) -> Result<Option<Course>>;

    /// All categories with their course counts, missing category coerced to
    /// "General", sorted by count descending.
    async fn categories(&self) -> Result<Vec<Category>>;

    /// Up to `limit` courses sorted by students_count, then rating, both
    /// descending.
    async fn trending(&self, limit: i64) -> Result<Vec<Course>>;
}

/// In-memory catalog for tests: courses with fixed embeddings, scored by
/// dot product (embeddings are unit-norm, so this is cosine similarity).
#[derive(Default)]
pub struct InMemoryCatalog {
    entries: Mutex<Vec<(Course, Vec<f32>)>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, course: Course, embedding: Vec<f32>) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((course, embedding));
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn search(
        &self,
        embedding: &[f32],
        limit: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<Course>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let mut candidates: Vec<Course> = entries
            .iter()
            .map(|(course, stored)| {
                let score = stored
                    .iter()
                    .zip(embedding)
                    .map(|(a, b)| f64::from(*a) * f64::from(*b))
                    .sum::<f64>();
                let mut hit = course.clone();
                hit.score = Some(score);
                hit
            })
            .collect();
        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(limit.saturating_mul(20));

        Ok(candidates
            .into_iter()
            .filter(|course| filters.matches(course))
            .take(limit)
            .collect())
    }

    async fn course_by_id(&self, course_id: &str) -> Result<Option<Course>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .iter()
            .find(|(course, _)| course.course_id == course_id)
            .map(|(course, _)| course.clone()))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut counts: HashMap<String, i64> = HashMap::new();
        for (course, _) in entries.iter() {
            let name = course
                .category
                .clone()
                .unwrap_or_else(|| "General".to_string());
            *counts.entry(name).or_insert(0) += 1;
        }
        let mut categories: Vec<Category> = counts
            .into_iter()
            .map(|(name, count)| Category { name, count })
            .collect();
        categories.sort_by(|a, b| b.count.cmp(&a.count).then(a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn trending(&self, limit: i64) -> Result<Vec<Course>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut courses: Vec<Course> = entries.iter().map(|(c, _)| c.clone()).collect();
        courses.sort_by(|a, b| {
            b.students_count
                .unwrap_or(0)
                .cmp(&a.students_count.unwrap_or(0))
                .then(
                    b.rating
                        .unwrap_or(0.0)
                        .partial_cmp(&a.rating.unwrap_or(0.0))
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });
        courses.truncate(usize::try_from(limit.max(0)).unwrap_or(0));
        Ok(courses)
    }
}
