//! Tree-structured container resolvers.
//!
//! Both dialects share the traversal engine in [`crate::tree`] and differ
//! only in their header decoder, relevance table and leaf semantics.

pub mod mkv;
pub mod mp4;
