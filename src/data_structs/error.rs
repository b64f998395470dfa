use thiserror::Error;

use crate::data_structs::enums::StructType;
use crate::quark::Quark;

/// Violations of the hierarchy invariants. These indicate a bug in the
/// caller, never bad input data, and abort the operation that hit them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StructureError {
    #[error("a {child} cannot be placed under a {parent}")]
    WrongChildType {
        parent: StructType,
        child:  StructType,
    },

    #[error("{0} has a null unique id")]
    NullId(StructType),

    #[error("{parent} already has a child with id '{child}'")]
    DuplicateChild { parent: Quark, child: Quark },

    #[error("node handle does not resolve (already freed or from another arena)")]
    MissingNode,

    #[error("expected a {expected}, found a {found}")]
    TypeMismatch {
        expected: StructType,
        found:    StructType,
    },

    #[error("cannot merge sequence '{new}' into context of '{current}'")]
    SequenceMismatch { current: Quark, new: Quark },

    #[error("feature '{0}' has not been populated")]
    InvalidFeature(Quark),
}
