//! Generational slab arena with intrusive doubly-linked lists.
//!
//! Both the star population and the derived radiation-source list are
//! ordered, doubly-linked collections with O(1) unlinking. Instead of
//! raw neighbour pointers, nodes live in a slab and refer to each other
//! by [`NodeHandle`]. The arena owns every node; handles never do.
//!
//! # Architecture
//!
//! ```text
//! LinkedArena<T>
//! ├── Slot[] (value + prev/next handles + generation)
//! ├── free list (vacated slot indices, reused LIFO)
//! └── head / tail handles
//! ```
//!
//! A slot's generation is bumped whenever its value is removed, so a
//! handle to a removed node is detected as stale in O(1) even after the
//! slot has been reused.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod handle;
pub mod list;

pub use error::ArenaError;
pub use handle::NodeHandle;
pub use list::{Iter, LinkedArena};
