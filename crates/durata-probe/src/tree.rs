//! Generic traversal of length-prefixed element trees.
//!
//! Both container dialects (ISO boxes and EBML elements) are nested trees of
//! typed, length-prefixed elements. One walker serves both: it is
//! parameterized by a header decoder and a relevance table mapping element
//! identifiers to an [`Action`]. Resolvers supply only the leaf semantics.

use std::io::{Read, Seek};

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

/// Half-open range `[start, end)` of absolute stream offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// What the walker should do with an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Recurse into the element's content with the same relevance table.
    Enter,
    /// Hand the element to the leaf callback.
    Leaf,
    /// Seek past the content without reading it.
    Skip,
}

/// One decoded element header: identifier plus content range.
///
/// The content range begins immediately after the header and is always a
/// subset of the enclosing range once validated by the walker.
#[derive(Debug, Clone, Copy)]
pub struct Element<Id> {
    pub id: Id,
    pub content: ByteRange,
}

/// Dialect-specific element header decoder.
///
/// `decode` is called with the cursor at the first byte of a header and the
/// enclosing range, which it needs to resolve extends-to-end size sentinels.
/// On success the cursor rests at the first content byte.
pub trait HeaderDecoder {
    type Id: Copy;

    fn decode<R: Read + Seek>(
        &self,
        cursor: &mut ByteCursor<R>,
        enclosing: ByteRange,
    ) -> Result<Element<Self::Id>>;
}

/// Bounded depth-first scan of `range`, yielding the first usable leaf value.
///
/// Elements classified [`Action::Enter`] are recursed into and short-circuit
/// the sibling scan if the recursion finds a value. [`Action::Leaf`] elements
/// are handed to `on_leaf`; a `Some` return short-circuits, a `None` return
/// resumes the sibling scan at the element's content end regardless of where
/// the callback left the cursor. Everything else is skipped in O(1).
///
/// A child whose declared content crosses `range.end` fails
/// [`Error::InvalidContainerSize`]; corrupt sizes are never clamped.
pub fn walk<R, D, T>(
    cursor: &mut ByteCursor<R>,
    range: ByteRange,
    decoder: &D,
    classify: &dyn Fn(D::Id) -> Action,
    on_leaf: &mut dyn FnMut(&mut ByteCursor<R>, &Element<D::Id>) -> Result<Option<T>>,
) -> Result<Option<T>>
where
    R: Read + Seek,
    D: HeaderDecoder,
{
    while cursor.position() < range.end {
        let elem = decoder.decode(cursor, range)?;
        if elem.content.start > range.end || elem.content.end > range.end {
            return Err(Error::InvalidContainerSize {
                child_end: elem.content.end.max(elem.content.start),
                parent_end: range.end,
            });
        }
        let content_end = elem.content.end;

        match classify(elem.id) {
            Action::Enter => {
                if let Some(value) = walk(cursor, elem.content, decoder, classify, on_leaf)? {
                    return Ok(Some(value));
                }
                cursor.seek_to(content_end)?;
            }
            Action::Leaf => {
                if let Some(value) = on_leaf(cursor, &elem)? {
                    return Ok(Some(value));
                }
                cursor.seek_to(content_end)?;
            }
            Action::Skip => cursor.seek_to(content_end)?,
        }
    }
    Ok(None)
}
