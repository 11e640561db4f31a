//! Node kinds and per-kind payloads for the science-program document tree.
//!
//! The set of node kinds is closed: every element a science program can
//! contain is one of the variants of [`NodeKind`], and dispatch on kind is
//! a plain `match`. Component payloads hold the raw values read from the
//! document; interpretation (frame resolution, waveband extraction) happens
//! in the summarizer.

use chrono::{DateTime, Utc};

crate::define_id_type!(usize, NodeId);

/// Sentinel remaining-count meaning "permanently ineligible".
///
/// A block reaches this value only through explicit removal (direct set or
/// OR-group exhaustion), never through an ordinary decrement.
pub const REMOVED: i64 = -999;

/// Internal scheduling priority of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Priority {
    TargetOfOpportunity,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn code(&self) -> u8 {
        match self {
            Priority::TargetOfOpportunity => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Priority::TargetOfOpportunity),
            1 => Some(Priority::High),
            2 => Some(Priority::Medium),
            3 => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::TargetOfOpportunity => "ToO",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::High
    }
}

/// Attributes carried on the wrapper element of a schedulable block.
///
/// `remaining` and the cached checksum are transient execution state and
/// are never part of the block's content identity.
#[derive(Debug, Clone, Default)]
pub struct MsbAttrs {
    pub remaining: i64,
    pub title: Option<String>,
    pub priority: Priority,
    pub estimated_seconds: f64,
    pub suspend_label: Option<String>,
    pub(crate) checksum: Option<String>,
}

impl MsbAttrs {
    pub fn new(remaining: i64) -> Self {
        MsbAttrs {
            remaining,
            ..Default::default()
        }
    }

    pub fn with_title(remaining: i64, title: &str) -> Self {
        MsbAttrs {
            remaining,
            title: Some(title.to_string()),
            ..Default::default()
        }
    }
}

/// Supported instruments. The set is fixed; there is no plugin mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Instrument {
    Cgs4,
    Ufti,
    Ircam,
    Michelle,
    Scuba,
}

impl Instrument {
    pub fn as_str(&self) -> &'static str {
        match self {
            Instrument::Cgs4 => "CGS4",
            Instrument::Ufti => "UFTI",
            Instrument::Ircam => "IRCAM",
            Instrument::Michelle => "Michelle",
            Instrument::Scuba => "SCUBA",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "CGS4" => Some(Instrument::Cgs4),
            "UFTI" => Some(Instrument::Ufti),
            "IRCAM" | "IRCAM3" => Some(Instrument::Ircam),
            "MICHELLE" => Some(Instrument::Michelle),
            "SCUBA" => Some(Instrument::Scuba),
            _ => None,
        }
    }

    /// Telescope hosting this instrument.
    pub fn telescope(&self) -> &'static str {
        match self {
            Instrument::Cgs4 | Instrument::Ufti | Instrument::Ircam | Instrument::Michelle => {
                "UKIRT"
            }
            Instrument::Scuba => "JCMT",
        }
    }
}

/// Iterator-sequence containers found inside an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Folder,
    Repeat,
    Offset,
    Pol,
}

impl SequenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceKind::Folder => "folder",
            SequenceKind::Repeat => "repeat",
            SequenceKind::Offset => "offset",
            SequenceKind::Pol => "pol",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "folder" => Some(SequenceKind::Folder),
            "repeat" => Some(SequenceKind::Repeat),
            "offset" => Some(SequenceKind::Offset),
            "pol" => Some(SequenceKind::Pol),
            _ => None,
        }
    }
}

/// Observation actions. Everything except `Observe` is a calibration-type
/// action that does not require a real target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsActionKind {
    Observe,
    Pointing,
    Photometry,
    Bias,
    Dark,
    Focus,
    Skydip,
    Noise,
}

impl ObsActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObsActionKind::Observe => "Observe",
            ObsActionKind::Pointing => "Pointing",
            ObsActionKind::Photometry => "Photometry",
            ObsActionKind::Bias => "Bias",
            ObsActionKind::Dark => "Dark",
            ObsActionKind::Focus => "Focus",
            ObsActionKind::Skydip => "Skydip",
            ObsActionKind::Noise => "Noise",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "observe" => Some(ObsActionKind::Observe),
            "pointing" => Some(ObsActionKind::Pointing),
            "photometry" => Some(ObsActionKind::Photometry),
            "bias" => Some(ObsActionKind::Bias),
            "dark" => Some(ObsActionKind::Dark),
            "focus" => Some(ObsActionKind::Focus),
            "skydip" => Some(ObsActionKind::Skydip),
            "noise" => Some(ObsActionKind::Noise),
            _ => None,
        }
    }

    pub fn is_calibration(&self) -> bool {
        !matches!(self, ObsActionKind::Observe)
    }
}

/// Raw target component as read from the document. Frame interpretation is
/// deferred to summarization so that a bad frame tag aborts the walk that
/// touches it, not the load.
#[derive(Debug, Clone)]
pub struct TargetComponent {
    pub name: String,
    pub frame: Option<String>,
    pub axis1: f64,
    pub axis2: f64,
}

/// Raw site-quality constraints. Absent bounds mean "don't care".
#[derive(Debug, Clone, Default)]
pub struct SiteQualityComponent {
    pub tau_min: Option<f64>,
    pub tau_max: Option<f64>,
    pub seeing_min: Option<f64>,
    pub seeing_max: Option<f64>,
    pub cloud: Option<i32>,
    pub moon: Option<i32>,
}

/// Raw scheduling-window constraints.
#[derive(Debug, Clone, Default)]
pub struct SchedulingWindowComponent {
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

/// Raw instrument component. Waveband is specified either by filter name or
/// by central wavelength in microns, never both.
#[derive(Debug, Clone)]
pub struct InstrumentComponent {
    pub instrument: Instrument,
    pub filter: Option<String>,
    pub central_wavelength: Option<f64>,
    pub disperser: Option<String>,
    pub polariser: Option<String>,
    pub camera: Option<String>,
}

impl InstrumentComponent {
    pub fn new(instrument: Instrument) -> Self {
        InstrumentComponent {
            instrument,
            filter: None,
            central_wavelength: None,
            disperser: None,
            polariser: None,
            camera: None,
        }
    }
}

/// Kind (plus per-kind payload) of a document-tree node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root.
    Program,
    /// Schedulable block wrapper.
    Msb(MsbAttrs),
    /// OR alternation; `number_of_items` counts the alternatives still open.
    OrFolder { number_of_items: u32 },
    /// AND grouping.
    AndFolder,
    /// Leaf observation; summarization finalizes one summary per such node.
    Observation,
    Target(TargetComponent),
    SiteQuality(SiteQualityComponent),
    SchedulingWindow(SchedulingWindowComponent),
    Instrument(InstrumentComponent),
    Sequence(SequenceKind),
    ObsAction(ObsActionKind),
}

impl NodeKind {
    /// Stable tag used in the checksum serialization and in diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Program => "scienceProgram",
            NodeKind::Msb(_) => "msb",
            NodeKind::OrFolder { .. } => "orFolder",
            NodeKind::AndFolder => "andFolder",
            NodeKind::Observation => "observation",
            NodeKind::Target(_) => "target",
            NodeKind::SiteQuality(_) => "siteQuality",
            NodeKind::SchedulingWindow(_) => "schedulingWindow",
            NodeKind::Instrument(_) => "instrument",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::ObsAction(_) => "obsAction",
        }
    }

    pub fn is_msb(&self) -> bool {
        matches!(self, NodeKind::Msb(_))
    }
}

/// A single node: kind, optional reference id, and ordered children.
///
/// A node carrying a reference id is a stand-in for a definition registered
/// in the program-wide definition table; traversal code must go through
/// [`crate::program::ScienceProgram::resolve`] before reading its payload.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub ref_id: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Node {
            kind,
            ref_id: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}
