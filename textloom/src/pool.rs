// Copyright 2026 the Textloom Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded pool of thread-confined layout processors.
//!
//! Off-thread asynchronous layout borrows a processor instance, computes
//! without touching the shared caches, and returns the instance on drop.
//! When every pooled instance is out, an extra transient instance is
//! allocated on demand and discarded on release rather than growing the
//! pool.

use core::ops::{Deref, DerefMut};

use parking_lot::Mutex;

use crate::shape::LayoutProcessor;

/// Default number of preallocated processor instances.
pub const DEFAULT_POOL_CAPACITY: usize = 3;

type Factory = Box<dyn Fn() -> Box<dyn LayoutProcessor> + Send + Sync>;

pub struct ProcessorPool {
    slots: Mutex<Vec<Box<dyn LayoutProcessor>>>,
    capacity: usize,
    factory: Factory,
}

impl ProcessorPool {
    pub fn new(
        capacity: usize,
        factory: impl Fn() -> Box<dyn LayoutProcessor> + Send + Sync + 'static,
    ) -> Self {
        let slots = (0..capacity).map(|_| factory()).collect();
        Self {
            slots: Mutex::new(slots),
            capacity,
            factory: Box::new(factory),
        }
    }

    /// Borrows a processor, allocating a transient one when the pool is
    /// exhausted. Never blocks.
    pub fn acquire(&self) -> PooledProcessor<'_> {
        let pooled = self.slots.lock().pop();
        let processor = pooled.unwrap_or_else(|| (self.factory)());
        PooledProcessor {
            pool: self,
            processor: Some(processor),
        }
    }

    /// Number of idle pooled instances.
    pub fn available(&self) -> usize {
        self.slots.lock().len()
    }

    fn release(&self, processor: Box<dyn LayoutProcessor>) {
        let mut slots = self.slots.lock();
        if slots.len() < self.capacity {
            slots.push(processor);
        }
        // A transient overflow instance is dropped here.
    }
}

impl core::fmt::Debug for ProcessorPool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProcessorPool")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .finish()
    }
}

/// A borrowed processor; returns to the pool on drop.
pub struct PooledProcessor<'a> {
    pool: &'a ProcessorPool,
    processor: Option<Box<dyn LayoutProcessor>>,
}

impl Deref for PooledProcessor<'_> {
    type Target = dyn LayoutProcessor;

    fn deref(&self) -> &Self::Target {
        self.processor.as_deref().expect("processor present until drop")
    }
}

impl DerefMut for PooledProcessor<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.processor.as_deref_mut().expect("processor present until drop")
    }
}

impl Drop for PooledProcessor<'_> {
    fn drop(&mut self) {
        if let Some(processor) = self.processor.take() {
            self.pool.release(processor);
        }
    }
}

impl core::fmt::Debug for PooledProcessor<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PooledProcessor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::UniformBreaks;
    use crate::shape::CharWalkProcessor;
    use std::sync::Arc;

    fn pool(capacity: usize) -> ProcessorPool {
        ProcessorPool::new(capacity, || {
            Box::new(CharWalkProcessor::new(Arc::new(UniformBreaks)))
        })
    }

    #[test]
    fn acquire_and_release_cycle() {
        let pool = pool(2);
        assert_eq!(pool.available(), 2);
        {
            let _a = pool.acquire();
            let _b = pool.acquire();
            assert_eq!(pool.available(), 0);
        }
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn exhaustion_allocates_a_transient_instance() {
        let pool = pool(1);
        let _a = pool.acquire();
        // Pool is empty; this acquire still succeeds.
        let _b = pool.acquire();
        assert_eq!(pool.available(), 0);
        drop(_a);
        drop(_b);
        // The transient instance was discarded, not kept.
        assert_eq!(pool.available(), 1);
    }
}
