//! Reusable resources shared between worker threads.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::Result;

type Creator<T> = Box<dyn Fn() -> Result<T> + Send + Sync>;

/// Pool of idle resources handed out one at a time.
///
/// A resource is created by the pool's creator only when no idle one is
/// available. The lock guards the idle list alone; creation and any work on an
/// acquired resource happen outside of it.
pub struct ResourcePool<T> {
    creator: Creator<T>,
    idle: Mutex<VecDeque<T>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T: Send> ResourcePool<T> {
    /// Creates an empty pool keeping at most `capacity` idle resources.
    pub fn new(creator: impl Fn() -> Result<T> + Send + Sync + 'static, capacity: usize) -> Self {
        Self {
            creator: Box::new(creator),
            idle: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Pool keeping one idle resource per logical CPU.
    pub fn with_default_capacity(creator: impl Fn() -> Result<T> + Send + Sync + 'static) -> Self {
        Self::new(creator, num_cpus::get())
    }

    /// Takes an idle resource, or creates one if none is idle.
    pub fn acquire(&self) -> Result<Pooled<'_, T>> {
        let reused = self.idle.lock().pop_front();
        let resource = match reused {
            Some(resource) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                resource
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                log::debug!("resource pool empty, creating a new resource");
                (self.creator)()?
            }
        };
        Ok(Pooled {
            pool: self,
            resource: Some(resource),
        })
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of acquisitions served from the idle list and by the creator.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }

    fn give_back(&self, resource: T) {
        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push_back(resource);
            return;
        }
        drop(idle);
        log::trace!("resource pool full, dropping returned resource");
        drop(resource);
    }
}

impl<T> std::fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("idle", &self.idle.lock().len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// A resource on loan from a [`ResourcePool`]; returned when dropped.
pub struct Pooled<'a, T: Send> {
    pool: &'a ResourcePool<T>,
    resource: Option<T>,
}

impl<T: Send> Pooled<'_, T> {
    /// Drops the resource instead of returning it, e.g. after it failed.
    pub fn discard(mut self) {
        self.resource = None;
    }
}

impl<T: Send> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.resource {
            Some(resource) => resource,
            None => unreachable!("pooled resource is only taken on drop"),
        }
    }
}

impl<T: Send> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.resource {
            Some(resource) => resource,
            None => unreachable!("pooled resource is only taken on drop"),
        }
    }
}

impl<T: Send> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.give_back(resource);
        }
    }
}
