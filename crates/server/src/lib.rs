//! # Converse Server
//!
//! REST facade over the conversation core: topic namespace CRUD with
//! cascading rename/delete, server-side turn sequencing, and related-turn
//! retrieval. Participant/group management, auth, and tenant resolution are
//! collaborators outside this crate; the tenant schema arrives as an opaque
//! request header.

pub mod coordinator;
mod http_api;
pub mod routes;

pub use coordinator::{Coordinator, CoordinatorError, CreateTurnRequest, RelatedTurnDetail};
pub use routes::{router, AppState, TENANT_HEADER};

use anyhow::Result;
use converse_vector_store::FinderConfig;
use std::sync::Arc;
use std::time::Duration;

/// Binds the listener and serves the API until the process exits.
pub async fn serve(
    bind: &str,
    finder_config: FinderConfig,
    request_timeout: Duration,
) -> Result<()> {
    let state = Arc::new(AppState {
        coordinator: Coordinator::new(finder_config, request_timeout),
    });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    let local_addr = listener.local_addr()?;
    log::info!("serving conversation API on http://{local_addr}");
    log::info!(
        "vector search: {:?} metric, dimension {}",
        finder_config.metric,
        finder_config.dimension
    );
    axum::serve(listener, app).await?;
    Ok(())
}
