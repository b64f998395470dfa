//! Coordinate primitives shared by the feature model.
//!
//! All coordinates are 1-based and inclusive. A [`Span`] always satisfies
//! `x1 <= x2`; strand is carried separately and never encoded by coordinate
//! order.
use std::fmt::Display;

use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::typedef::Coord;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    pub x1: Coord,
    pub x2: Coord,
}

impl Span {
    /// Creates a span, swapping the ends when they arrive reversed.
    pub fn new(
        a: Coord,
        b: Coord,
    ) -> Self {
        if a <= b {
            Self { x1: a, x2: b }
        }
        else {
            Self { x1: b, x2: a }
        }
    }

    /// Saturates for the span covering the whole coordinate range.
    pub fn len(&self) -> Coord { (self.x2 - self.x1).saturating_add(1) }

    /// Spans are never empty; provided for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool { false }

    pub fn contains(
        &self,
        pos: Coord,
    ) -> bool {
        self.x1 <= pos && pos <= self.x2
    }

    pub fn contains_span(
        &self,
        other: &Span,
    ) -> bool {
        self.x1 <= other.x1 && other.x2 <= self.x2
    }

    pub fn overlaps(
        &self,
        other: &Span,
    ) -> bool {
        self.x1 <= other.x2 && other.x1 <= self.x2
    }

    /// Overlapping part of two spans.
    pub fn intersect(
        &self,
        other: &Span,
    ) -> Option<Span> {
        if self.overlaps(other) {
            Some(Span {
                x1: self.x1.max(other.x1),
                x2: self.x2.min(other.x2),
            })
        }
        else {
            None
        }
    }

    /// Smallest span covering both.
    pub fn union(
        &self,
        other: &Span,
    ) -> Span {
        Span {
            x1: self.x1.min(other.x1),
            x2: self.x2.max(other.x2),
        }
    }
}

impl Display for Span {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}-{}", self.x1, self.x2)
    }
}

/// Four-coordinate mapping between a span of a parent coordinate system and
/// the corresponding span of a child coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpanMapping {
    pub parent: Option<Span>,
    pub child:  Option<Span>,
}

impl SpanMapping {
    pub fn new(
        parent: Span,
        child: Span,
    ) -> Self {
        Self {
            parent: Some(parent),
            child:  Some(child),
        }
    }

    /// Identity mapping of `span` onto itself.
    pub fn identity(span: Span) -> Self { Self::new(span, span) }

    pub fn is_set(&self) -> bool {
        self.parent.is_some() && self.child.is_some()
    }

    /// Maps a child coordinate into the parent system.
    pub fn child_to_parent(
        &self,
        pos: Coord,
    ) -> Option<Coord> {
        let (parent, child) = (self.parent?, self.child?);
        if !child.contains(pos) {
            return None;
        }
        Some(parent.x1 + (pos - child.x1))
    }
}
