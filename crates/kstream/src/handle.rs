//! Provenance metadata attached to every non-scalar value.

use crate::{
    arena::{HandleId, StreamId},
    types::TypeTag,
};

/// Where a value came from and how to interpret it.
///
/// `parent` is a non-owning link to the enclosing structure's handle. It is
/// only ever resolved through the session's handle arena for root and depth
/// queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle {
    pub stream: StreamId,
    /// Stream position when the value was created.
    pub pos: u64,
    pub tag: TypeTag,
    /// Size in bytes of one element, for arrays. Zero otherwise.
    pub element_size: usize,
    pub parent: Option<HandleId>,
}

/// Values that carry a [Handle].
pub trait HasHandle {
    fn handle(&self) -> HandleId;
}

impl HasHandle for HandleId {
    fn handle(&self) -> HandleId {
        *self
    }
}
