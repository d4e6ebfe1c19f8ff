use thiserror::Error;

/// A caller-facing precondition was violated. The engine state is unchanged:
/// the offending edit is rejected before anything is journalled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionViolation {
    /// A node with this key already exists at the target level.
    #[error("node `{0}` already exists")]
    DuplicateNode(String),
    /// No node with this key exists at the target level.
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    /// An edge for this ordered key pair already exists. Parallel edges are
    /// rejected; at most one edge per ordered pair per graph.
    #[error("edge `{0}` already exists")]
    DuplicateEdge(String),
    /// No edge for this ordered key pair exists.
    #[error("unknown edge `{0}`")]
    UnknownEdge(String),
    /// The node still has incident edges; remove them first.
    #[error("node `{0}` still has incident edges")]
    NodeHasEdges(String),
    /// The requested level index exceeds the hierarchy height.
    #[error("level {0} out of range (height {1})")]
    LevelOutOfRange(usize, usize),
}

/// An internal invariant of the engine was found broken mid-propagation.
/// This is an implementation bug, surfaced distinctly from bad input. The
/// level it was discovered at is poisoned and must be rebuilt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A live node at the lower level is covered by no component set.
    #[error("node `{0}` is not covered by any component set")]
    UncoveredNode(String),
    /// A superedge with an empty decontraction was still listed.
    #[error("superedge `{0}` has an empty decontraction")]
    EmptySuperedge(String),
    /// A component set has no materialised supernode.
    #[error("component set {0} has no supernode")]
    MissingSupernode(u64),
    /// The reverse index of the component table disagrees with its sets.
    #[error("component table index is corrupt at node `{0}`")]
    CorruptIndex(String),
    /// A removed lower node still sat in a non-singleton grouping; edge
    /// removals must precede the node removal and strip its connectivity.
    #[error("removed node `{0}` was still grouped")]
    RemovedNodeStillGrouped(String),
    /// The level was poisoned by an earlier failed update.
    #[error("level {0} needs a rebuild after a failed update")]
    NeedsRebuild(usize),
}

/// The scheme sequence was composed incorrectly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSchemeComposition {
    /// The scheme instance is already bound to a hierarchy.
    #[error("scheme `{0}` is already bound to a hierarchy")]
    AlreadyBound(String),
}

/// Umbrella error for the façade surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MlgError {
    #[allow(missing_docs)]
    #[error(transparent)]
    Precondition(#[from] PreconditionViolation),
    #[allow(missing_docs)]
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[allow(missing_docs)]
    #[error(transparent)]
    Composition(#[from] InvalidSchemeComposition),
}
