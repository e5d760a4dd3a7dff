use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

static WORK_DIR_LOCKS: LazyLock<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Exclusive hold on a working directory for the lifetime of the guard.
///
/// Runs in this process that target the same directory wait for each other,
/// so one run's reset never wipes another run's output mid-write.
pub struct WorkDirGuard {
    _guard: OwnedMutexGuard<()>,
}

pub async fn lock_work_dir(dir: &Path) -> WorkDirGuard {
    let key = lock_key(dir);
    let lock = {
        let mut locks = WORK_DIR_LOCKS
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Drop entries that only the map still references.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(key.clone()).or_default())
    };

    debug!(dir = %key.display(), "waiting for working directory");
    WorkDirGuard {
        _guard: lock.lock_owned().await,
    }
}

/// Absolute form of `dir` with `.` and `..` folded away lexically.
fn lock_key(dir: &Path) -> PathBuf {
    let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    let mut key = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                key.pop();
            }
            other => key.push(other),
        }
    }
    key
}
