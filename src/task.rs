//! Worker pool used by the broadphases for parallel dispatch.
//!
//! The dispatch pattern is submit-many then barrier-join: a caller hands a
//! batch of independent items to [`TaskPool::for_each`] and the call returns
//! only after every item has been processed. Tasks never submit further
//! tasks.

use rayon::prelude::*;

/// A fixed set of worker threads, constructed once and shared by the
/// collision systems of a world through `Arc<TaskPool>`.
pub struct TaskPool {
    pool: rayon::ThreadPool,
}

impl TaskPool {
    /// Create a pool with `threads` workers. `0` picks one worker per
    /// logical CPU.
    pub fn new(threads: usize) -> Result<Self, crate::CollisionError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("rein-collision-{i}"))
            .build()?;
        tracing::debug!(workers = pool.current_num_threads(), "collision task pool started");
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `task` once per item and block until all of them have finished.
    pub fn for_each<T, F>(&self, items: &[T], task: F)
    where
        T: Sync,
        F: Fn(&T) + Sync + Send,
    {
        self.pool.install(|| items.par_iter().for_each(|item| task(item)));
    }

    /// Like [`for_each`](Self::for_each) but each task gets exclusive access
    /// to its item.
    pub fn for_each_mut<T, F>(&self, items: &mut [T], task: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync + Send,
    {
        self.pool
            .install(|| items.par_iter_mut().for_each(|item| task(item)));
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        tracing::debug!("collision task pool shut down");
    }
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("threads", &self.threads())
            .finish()
    }
}
