//! Core model of the observatory's Minimum Schedulable Blocks (MSBs).
//!
//! A science program is a hierarchical document of OR/AND logic folders and
//! schedulable blocks; each block carries inheritable components (target,
//! site quality, scheduling window, instrument) and observations. This
//! crate provides the in-memory tree with reference-based aliasing, the
//! content checksum that identifies a block to external systems, the
//! inheritance-walk summarizer used for matching blocks against observing
//! conditions, and the lifecycle operations applied as observations
//! complete (decrement, OR-group rewriting, cascading removal).
//!
//! Persistence, RPC transport and the surrounding scheduler live elsewhere;
//! callers are responsible for serializing access to a given program
//! instance.

pub mod checksum;
pub mod error;
pub mod lifecycle;
pub mod parsing;
pub mod program;
pub mod summary;

pub use checksum::{AND_MARKER, OR_MARKER};
pub use error::{MsbError, MsbResult};
pub use program::{
    Instrument, MsbAttrs, NodeId, NodeKind, ObsActionKind, Priority, ScienceProgram,
    SequenceKind, REMOVED,
};
pub use summary::{MsbSummary, ObsSummary, SchedulingWindow, SiteQuality};
