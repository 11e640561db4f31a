//! Science-program document model.
//!
//! A program is a tree of nodes (schedulable blocks, OR/AND logic folders,
//! observations, and inheritable components) owned by an arena, plus a
//! document-wide table of reference definitions.

pub mod macros;
pub mod node;
pub mod tree;

pub use node::{
    Instrument, InstrumentComponent, MsbAttrs, Node, NodeId, NodeKind, ObsActionKind, Priority,
    SchedulingWindowComponent, SequenceKind, SiteQualityComponent, TargetComponent, REMOVED,
};
pub use tree::ScienceProgram;
