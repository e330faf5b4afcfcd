//! Transfer buffer for moving star records between processes.
//!
//! A [`StarBuffer`] is a fixed-shape aggregate holding every scalar field
//! of a [`Star`](starlist_core::Star) plus the accretion history padded
//! with zeros to [`MAX_ACCRETIONS`](starlist_core::MAX_ACCRETIONS) entries.
//! The [`wire`] module gives it a bit-exact little-endian byte form.
//!
//! Decoding never restores list membership or the mirror back-reference:
//! a decoded star is always a ghost until something re-embeds it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod error;
pub mod wire;

pub use buffer::{encode_all, encode_into, from_buffer, from_buffer_at, to_buffer, StarBuffer};
pub use error::CodecError;
pub use wire::{decode_batch, encode_batch, read_buffer, write_buffer, STAR_BUFFER_BYTES};
