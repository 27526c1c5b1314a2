//! `TrackingSource`: a memory source wrapper that records every request.
//!
//! Counters are relaxed atomics in the style of an allocator metrics block;
//! the ordered event log sits behind a `Mutex` so the wrapper stays `Sync`
//! whenever the inner source is.

use core::alloc::Layout;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::allocator::{AllocError, MemorySource};

/// One call observed by a [`TrackingSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// A successful allocation.
    Allocate {
        /// Address handed out.
        addr: usize,
        /// Layout requested.
        layout: Layout,
    },
    /// An allocation the inner source refused.
    Refused {
        /// Layout requested.
        layout: Layout,
    },
    /// A deallocation.
    Deallocate {
        /// Address returned.
        addr: usize,
        /// Layout supplied with it.
        layout: Layout,
    },
}

/// Snapshot of the counters kept by a [`TrackingSource`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceMetrics {
    /// Successful allocations.
    pub allocated_count: usize,
    /// Bytes handed out by successful allocations.
    pub allocated_bytes: usize,
    /// Deallocations.
    pub deallocated_count: usize,
    /// Bytes returned by deallocations.
    pub deallocated_bytes: usize,
    /// Allocations the inner source refused.
    pub refused_count: usize,
}

impl SourceMetrics {
    /// Bytes currently outstanding.
    pub fn live_bytes(&self) -> usize {
        self.allocated_bytes.saturating_sub(self.deallocated_bytes)
    }

    /// Allocations currently outstanding.
    pub fn live_count(&self) -> usize {
        self.allocated_count.saturating_sub(self.deallocated_count)
    }
}

/// Wraps a memory source and records every allocation and deallocation.
#[derive(Debug, Default)]
pub struct TrackingSource<S> {
    inner: S,
    allocated_count: AtomicUsize,
    allocated_bytes: AtomicUsize,
    deallocated_count: AtomicUsize,
    deallocated_bytes: AtomicUsize,
    refused_count: AtomicUsize,
    events: Mutex<Vec<SourceEvent>>,
}

impl<S> TrackingSource<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            allocated_count: AtomicUsize::new(0),
            allocated_bytes: AtomicUsize::new(0),
            deallocated_count: AtomicUsize::new(0),
            deallocated_bytes: AtomicUsize::new(0),
            refused_count: AtomicUsize::new(0),
            events: Mutex::new(Vec::new()),
        }
    }

    /// The wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Current counter values.
    pub fn metrics(&self) -> SourceMetrics {
        SourceMetrics {
            allocated_count: self.allocated_count.load(Ordering::Relaxed),
            allocated_bytes: self.allocated_bytes.load(Ordering::Relaxed),
            deallocated_count: self.deallocated_count.load(Ordering::Relaxed),
            deallocated_bytes: self.deallocated_bytes.load(Ordering::Relaxed),
            refused_count: self.refused_count.load(Ordering::Relaxed),
        }
    }

    /// Every call observed so far, oldest first.
    pub fn events(&self) -> Vec<SourceEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, event: SourceEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event);
    }
}

impl<S: MemorySource> MemorySource for TrackingSource<S> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        match self.inner.allocate(layout) {
            Ok(ptr) => {
                self.allocated_count.fetch_add(1, Ordering::Relaxed);
                self.allocated_bytes.fetch_add(layout.size(), Ordering::Relaxed);
                self.record(SourceEvent::Allocate {
                    addr: ptr.as_ptr() as usize,
                    layout,
                });
                Ok(ptr)
            }
            Err(err) => {
                self.refused_count.fetch_add(1, Ordering::Relaxed);
                self.record(SourceEvent::Refused { layout });
                Err(err)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.deallocated_count.fetch_add(1, Ordering::Relaxed);
        self.deallocated_bytes.fetch_add(layout.size(), Ordering::Relaxed);
        self.record(SourceEvent::Deallocate {
            addr: ptr.as_ptr() as usize,
            layout,
        });
        self.inner.deallocate(ptr, layout);
    }
}
