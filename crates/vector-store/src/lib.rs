//! # Converse Vector Store
//!
//! Embedding normalization and cross-topic related-turn retrieval.
//!
//! Vectors arrive from an opaque embedding function, are normalized to a
//! fixed dimension by [`VectorCodec`], and are indexed per tenant behind the
//! [`NearestNeighbors`] trait. The shipped backend is an exact linear scan;
//! the search contract is top-K by distance, so approximate backends can be
//! plugged in without touching callers.

mod codec;
mod error;
mod finder;
mod index;
mod metric;

pub use codec::{VectorCodec, DEFAULT_DIMENSION};
pub use error::{Result, VectorStoreError};
pub use finder::{BackendFactory, FindOptions, FinderConfig, RelatedTurnFinder};
pub use index::{ExactScanIndex, NearestNeighbors, RelatedHit, SearchOptions, VectorEntry};
pub use metric::{cosine_similarity, l2_distance, Metric};
