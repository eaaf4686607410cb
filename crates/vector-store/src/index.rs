use crate::codec::VectorCodec;
use crate::error::{Result, VectorStoreError};
use crate::metric::Metric;
use chrono::{DateTime, Utc};
use converse_protocol::Deadline;

/// One indexed turn embedding plus the metadata search needs for exclusion
/// and tie-breaking.
#[derive(Debug, Clone)]
pub struct VectorEntry {
    pub turn_id: i64,
    pub topic_id: i64,
    pub created_at: DateTime<Utc>,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub exclude_topic_id: Option<i64>,
    pub exclude_turn_id: Option<i64>,
    pub limit: usize,
    /// Candidates farther than this distance are dropped before ranking.
    pub max_distance: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelatedHit {
    pub turn_id: i64,
    pub topic_id: i64,
    pub created_at: DateTime<Utc>,
    pub score: f32,
}

/// Nearest-neighbor backend behind the related-turn search. The contract is
/// top-K by distance; exact and approximate implementations both qualify.
pub trait NearestNeighbors: Send + Sync {
    fn add(&mut self, entry: VectorEntry) -> Result<()>;

    fn remove(&mut self, turn_ids: &[i64]);

    fn search(
        &self,
        query: &[f32],
        options: &SearchOptions,
        deadline: Deadline,
    ) -> Result<Vec<RelatedHit>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exact linear-scan backend. O(n) per query, which is fine for moderate
/// corpora and gives the reference ranking approximate backends are judged
/// against.
pub struct ExactScanIndex {
    metric: Metric,
    dimension: usize,
    entries: Vec<VectorEntry>,
}

impl ExactScanIndex {
    pub fn new(metric: Metric, dimension: usize) -> Self {
        Self {
            metric,
            dimension,
            entries: Vec::new(),
        }
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl NearestNeighbors for ExactScanIndex {
    fn add(&mut self, entry: VectorEntry) -> Result<()> {
        self.check_dimension(&entry.vector)?;
        self.entries.push(entry);
        Ok(())
    }

    fn remove(&mut self, turn_ids: &[i64]) {
        self.entries.retain(|e| !turn_ids.contains(&e.turn_id));
    }

    fn search(
        &self,
        query: &[f32],
        options: &SearchOptions,
        deadline: Deadline,
    ) -> Result<Vec<RelatedHit>> {
        self.check_dimension(query)?;

        let mut hits = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            // Deadline check amortized over the scan loop.
            if i % 1024 == 0 && deadline.expired() {
                return Err(VectorStoreError::Timeout);
            }
            if options.exclude_topic_id == Some(entry.topic_id) {
                continue;
            }
            if options.exclude_turn_id == Some(entry.turn_id) {
                continue;
            }
            // Zero vector is the "no embedding" sentinel; never a candidate.
            if VectorCodec::is_null_sentinel(&entry.vector) {
                continue;
            }

            let score = self.metric.score(query, &entry.vector);
            if let Some(ceiling) = options.max_distance {
                if self.metric.distance_of_score(score) >= ceiling {
                    continue;
                }
            }
            hits.push(RelatedHit {
                turn_id: entry.turn_id,
                topic_id: entry.topic_id,
                created_at: entry.created_at,
                score,
            });
        }

        // Decreasing similarity; ties broken most recent first.
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        hits.truncate(options.limit);
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
