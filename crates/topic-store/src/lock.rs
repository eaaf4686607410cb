use converse_protocol::Tenant;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

static GROUP_LOCK_WAIT_MS_LAST: AtomicU64 = AtomicU64::new(0);
static GROUP_LOCK_WAIT_MS_MAX: AtomicU64 = AtomicU64::new(0);

pub fn group_lock_wait_ms_last() -> u64 {
    GROUP_LOCK_WAIT_MS_LAST.load(Ordering::Relaxed)
}

pub fn group_lock_wait_ms_max() -> u64 {
    GROUP_LOCK_WAIT_MS_MAX.load(Ordering::Relaxed)
}

fn update_wait_ms(wait_ms: u64) {
    GROUP_LOCK_WAIT_MS_LAST.store(wait_ms, Ordering::Relaxed);
    let mut current = GROUP_LOCK_WAIT_MS_MAX.load(Ordering::Relaxed);
    while wait_ms > current {
        match GROUP_LOCK_WAIT_MS_MAX.compare_exchange(
            current,
            wait_ms,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(next) => current = next,
        }
    }
}

/// Advisory write locks keyed by `(tenant, group)`. Subtree rename/delete and
/// sibling-index allocation hold the group's lock for their whole critical
/// section so overlapping cascades cannot interleave into a half-updated
/// namespace.
#[derive(Default)]
pub(crate) struct GroupLockRegistry {
    locks: Mutex<HashMap<(String, i64), Arc<AsyncMutex<()>>>>,
}

impl GroupLockRegistry {
    pub(crate) async fn acquire(&self, tenant: &Tenant, group_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry((tenant.schema().to_string(), group_id))
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let start = Instant::now();
        let guard = lock.lock_owned().await;
        update_wait_ms(start.elapsed().as_millis() as u64);
        guard
    }
}
