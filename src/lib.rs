//! xmldom - XML DOM trees exposed as garbage-collected objects
//!
//! Layers:
//! - dom: arena-backed native XML trees built with quick-xml
//! - host: managed heap, classes/prototypes, values, finalization
//! - bridge: identity-preserving wrappers whose count owns each native tree
//! - context: one heap plus its trees, the public entry point
//!
//! ```
//! use xmldom::{Context, Value};
//!
//! let mut cx = Context::new();
//! let doc = cx.parse_from_string("<a b=\"c\"/>", "text/xml")?;
//! let a = cx.get(doc, "firstChild")?.as_object().unwrap();
//! assert_eq!(cx.call_method(a, "getAttribute", &[Value::from("b")])?, Value::from("c"));
//! # Ok::<(), xmldom::Error>(())
//! ```

pub mod bridge;
pub mod context;
pub mod dom;
pub mod error;
pub mod host;

pub use bridge::{DomParser, NODE_TYPE_CONSTANTS};
pub use context::{Context, ContextConfig, Private};
pub use dom::{NodeKind, NodeRef, TreeId};
pub use error::{Error, Result};
pub use host::{ObjectId, Value};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK: AtomicUsize = AtomicUsize::new(0);

    /// Counts live heap bytes on top of the real allocator
    pub struct CountingAllocator;

    #[cfg(feature = "mimalloc")]
    static INNER: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static INNER: std::alloc::System = std::alloc::System;

    fn record_peak(current: usize) {
        let mut peak = PEAK.load(Ordering::Relaxed);
        while current > peak {
            match PEAK.compare_exchange_weak(peak, current, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    unsafe impl GlobalAlloc for CountingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = INNER.alloc(layout);
            if !ptr.is_null() {
                record_peak(ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size());
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            INNER.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::CountingAllocator = tracking::CountingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Process-wide allocation statistics.
///
/// Every function returns 0 unless the `memory_tracking` feature is enabled.
pub mod memory {
    #[cfg(feature = "memory_tracking")]
    use std::sync::atomic::Ordering;

    #[cfg(feature = "memory_tracking")]
    use super::tracking::{ALLOCATED, PEAK};

    /// Bytes currently allocated
    #[cfg(feature = "memory_tracking")]
    pub fn allocated() -> usize {
        ALLOCATED.load(Ordering::SeqCst)
    }

    /// Highest value [`allocated`] has reached since the last reset
    #[cfg(feature = "memory_tracking")]
    pub fn peak() -> usize {
        PEAK.load(Ordering::SeqCst)
    }

    /// Restart peak tracking from the current level.
    ///
    /// Returns `(current, previous_peak)`.
    #[cfg(feature = "memory_tracking")]
    pub fn reset_peak() -> (usize, usize) {
        let current = ALLOCATED.load(Ordering::SeqCst);
        let peak = PEAK.swap(current, Ordering::SeqCst);
        (current, peak)
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn allocated() -> usize {
        0
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn peak() -> usize {
        0
    }

    #[cfg(not(feature = "memory_tracking"))]
    pub fn reset_peak() -> (usize, usize) {
        (0, 0)
    }

}
