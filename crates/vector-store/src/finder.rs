use crate::codec::{VectorCodec, DEFAULT_DIMENSION};
use crate::error::{Result, VectorStoreError};
use crate::index::{ExactScanIndex, NearestNeighbors, RelatedHit, SearchOptions, VectorEntry};
use crate::metric::Metric;
use chrono::{DateTime, Utc};
use converse_protocol::{Deadline, Tenant};
use std::collections::HashMap;
use std::sync::RwLock;

/// Fixed search configuration. The metric must match whatever produced the
/// stored embeddings.
#[derive(Debug, Clone, Copy)]
pub struct FinderConfig {
    pub metric: Metric,
    pub dimension: usize,
    /// Candidates at or beyond this distance are dropped. The original
    /// deployments used 0.95.
    pub distance_ceiling: Option<f32>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Cosine,
            dimension: DEFAULT_DIMENSION,
            distance_ceiling: Some(0.95),
        }
    }
}

/// Constructs the NN backend for a tenant partition. Swap this to plug in an
/// approximate index.
pub type BackendFactory = fn(&FinderConfig) -> Box<dyn NearestNeighbors>;

fn exact_scan_backend(config: &FinderConfig) -> Box<dyn NearestNeighbors> {
    Box::new(ExactScanIndex::new(config.metric, config.dimension))
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub exclude_topic_id: Option<i64>,
    pub exclude_turn_id: Option<i64>,
    pub limit: usize,
}

/// Cross-topic related-turn retrieval, partitioned per tenant schema like
/// every other core surface.
pub struct RelatedTurnFinder {
    config: FinderConfig,
    codec: VectorCodec,
    backend: BackendFactory,
    tenants: RwLock<HashMap<String, Box<dyn NearestNeighbors>>>,
}

impl RelatedTurnFinder {
    pub fn new(config: FinderConfig) -> Self {
        Self::with_backend(config, exact_scan_backend)
    }

    pub fn with_backend(config: FinderConfig, backend: BackendFactory) -> Self {
        Self {
            config,
            codec: VectorCodec::new(config.dimension),
            backend,
            tenants: RwLock::new(HashMap::new()),
        }
    }

    pub fn codec(&self) -> VectorCodec {
        self.codec
    }

    /// Adds a stored turn's embedding to the tenant's index. The all-zero
    /// sentinel is indexed too but never surfaces as a candidate.
    pub fn index_turn(
        &self,
        tenant: &Tenant,
        turn_id: i64,
        topic_id: i64,
        created_at: DateTime<Utc>,
        vector: &[f32],
    ) -> Result<()> {
        let mut tenants = self
            .tenants
            .write()
            .map_err(|_| VectorStoreError::Other("finder lock poisoned".to_string()))?;
        let index = tenants
            .entry(tenant.schema().to_string())
            .or_insert_with(|| (self.backend)(&self.config));
        index.add(VectorEntry {
            turn_id,
            topic_id,
            created_at,
            vector: vector.to_vec(),
        })
    }

    /// Drops turns from the tenant's index, e.g. after a topic cascade delete.
    pub fn forget_turns(&self, tenant: &Tenant, turn_ids: &[i64]) -> Result<()> {
        let mut tenants = self
            .tenants
            .write()
            .map_err(|_| VectorStoreError::Other("finder lock poisoned".to_string()))?;
        if let Some(index) = tenants.get_mut(tenant.schema()) {
            index.remove(turn_ids);
        }
        Ok(())
    }

    /// Top-K neighbors of `source` across the tenant's topics, sorted by
    /// decreasing similarity with recency breaking ties. The source vector is
    /// normalized to the configured dimension before querying.
    pub fn find_related(
        &self,
        tenant: &Tenant,
        source: &[f32],
        options: &FindOptions,
        deadline: Deadline,
    ) -> Result<Vec<RelatedHit>> {
        if deadline.expired() {
            return Err(VectorStoreError::Timeout);
        }

        let query = self.codec.normalize(Some(source));
        let tenants = self
            .tenants
            .read()
            .map_err(|_| VectorStoreError::Other("finder lock poisoned".to_string()))?;
        let Some(index) = tenants.get(tenant.schema()) else {
            return Ok(Vec::new());
        };

        let search = SearchOptions {
            exclude_topic_id: options.exclude_topic_id,
            exclude_turn_id: options.exclude_turn_id,
            limit: options.limit,
            max_distance: self.config.distance_ceiling,
        };
        let hits = index.search(&query, &search, deadline)?;
        log::debug!(
            "found {} related turns for tenant '{}' (limit {})",
            hits.len(),
            tenant.schema(),
            options.limit
        );
        Ok(hits)
    }
}
