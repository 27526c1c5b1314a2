//! Memory sources: where a packed region's single allocation comes from.

pub mod allocator;
pub mod heap;
pub mod page;
pub mod tracking;

pub use allocator::{AllocError, MemorySource};
pub use heap::SystemSource;
pub use page::{align_up, PageSource, PAGE_SIZE};
pub use tracking::{SourceEvent, SourceMetrics, TrackingSource};
