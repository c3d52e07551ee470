//! ludex: an embedded, file-backed store for a catalog of tagged,
//! cross-referenced board-game documents.
//!
//! Build-time data flows one way: parsed records append into fixed-width
//! tables (`storage`), their ids feed an in-memory multi-way tree (`index`)
//! that is dumped to a flat file for direct-from-disk lookup, and tokenized
//! text (`analysis`) plus relation pairs feed hash-bucketed inverted indexes.
//! The `catalog` module wires one such group per document type and answers
//! exact-key and posting-list queries.

pub mod analysis;
pub mod catalog;
pub mod codec;
pub mod core;
pub mod index;
pub mod storage;
