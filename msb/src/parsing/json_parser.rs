use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

use crate::error::MsbError;
use crate::program::{
    Instrument, InstrumentComponent, MsbAttrs, NodeId, NodeKind, ObsActionKind, Priority,
    SchedulingWindowComponent, ScienceProgram, SequenceKind, SiteQualityComponent,
    TargetComponent,
};

/// Raw JSON structure for a single document node.
///
/// All kind-specific attributes are optional at this level; the conversion
/// step reads the ones relevant to the declared kind and ignores the rest.
#[derive(Debug, Deserialize)]
struct RawNode {
    kind: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    idref: Option<String>,

    // Schedulable-block attributes
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    remaining: Option<i64>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(rename = "estimatedSeconds", default)]
    estimated_seconds: Option<f64>,

    // OR-folder attribute
    #[serde(rename = "numberOfItems", default)]
    number_of_items: Option<u32>,

    // Target attributes
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    frame: Option<String>,
    #[serde(default)]
    axis1: Option<f64>,
    #[serde(default)]
    axis2: Option<f64>,

    // Site-quality attributes
    #[serde(rename = "tauMin", default)]
    tau_min: Option<f64>,
    #[serde(rename = "tauMax", default)]
    tau_max: Option<f64>,
    #[serde(rename = "seeingMin", default)]
    seeing_min: Option<f64>,
    #[serde(rename = "seeingMax", default)]
    seeing_max: Option<f64>,
    #[serde(default)]
    cloud: Option<i32>,
    #[serde(default)]
    moon: Option<i32>,

    // Scheduling-window attributes
    #[serde(default)]
    earliest: Option<DateTime<Utc>>,
    #[serde(default)]
    latest: Option<DateTime<Utc>>,

    // Instrument attributes
    #[serde(default)]
    instrument: Option<String>,
    #[serde(default)]
    filter: Option<String>,
    #[serde(rename = "centralWavelength", default)]
    central_wavelength: Option<f64>,
    #[serde(default)]
    disperser: Option<String>,
    #[serde(default)]
    polariser: Option<String>,
    #[serde(default)]
    camera: Option<String>,

    // Sequence / action attributes
    #[serde(rename = "sequenceType", default)]
    sequence_type: Option<String>,
    #[serde(default)]
    action: Option<String>,

    #[serde(default)]
    children: Vec<RawNode>,
}

/// Raw JSON structure for the document root.
#[derive(Debug, Deserialize)]
struct RawProgram {
    #[serde(rename = "projectId", default)]
    project_id: Option<String>,
    #[serde(rename = "scienceProgram")]
    program: RawNode,
}

fn parse_priority(raw: &Option<String>) -> Priority {
    let Some(value) = raw else {
        return Priority::default();
    };
    match value.to_ascii_lowercase().as_str() {
        "too" | "targetofopportunity" => Priority::TargetOfOpportunity,
        "high" => Priority::High,
        "medium" => Priority::Medium,
        "low" => Priority::Low,
        other => {
            log::warn!("unknown priority '{}', defaulting to high", other);
            Priority::default()
        }
    }
}

fn node_kind(raw: &RawNode) -> Result<NodeKind> {
    let kind = match raw.kind.as_str() {
        "scienceProgram" => NodeKind::Program,
        "msb" => {
            let mut attrs = MsbAttrs::new(raw.remaining.unwrap_or(1));
            attrs.title = raw.title.clone();
            attrs.priority = parse_priority(&raw.priority);
            attrs.estimated_seconds = raw.estimated_seconds.unwrap_or(0.0);
            NodeKind::Msb(attrs)
        }
        "orFolder" => NodeKind::OrFolder {
            number_of_items: raw
                .number_of_items
                .unwrap_or(raw.children.len() as u32),
        },
        "andFolder" => NodeKind::AndFolder,
        "observation" => NodeKind::Observation,
        "target" => NodeKind::Target(TargetComponent {
            name: raw.name.clone().unwrap_or_default(),
            frame: raw.frame.clone(),
            axis1: raw.axis1.unwrap_or(0.0),
            axis2: raw.axis2.unwrap_or(0.0),
        }),
        "siteQuality" => NodeKind::SiteQuality(SiteQualityComponent {
            tau_min: raw.tau_min,
            tau_max: raw.tau_max,
            seeing_min: raw.seeing_min,
            seeing_max: raw.seeing_max,
            cloud: raw.cloud,
            moon: raw.moon,
        }),
        "schedulingWindow" => NodeKind::SchedulingWindow(SchedulingWindowComponent {
            earliest: raw.earliest,
            latest: raw.latest,
        }),
        "instrument" => {
            let name = raw
                .instrument
                .as_deref()
                .context("instrument node without an instrument name")?;
            let Some(instrument) = Instrument::parse(name) else {
                bail!("unknown instrument: {}", name);
            };
            NodeKind::Instrument(InstrumentComponent {
                instrument,
                filter: raw.filter.clone(),
                central_wavelength: raw.central_wavelength,
                disperser: raw.disperser.clone(),
                polariser: raw.polariser.clone(),
                camera: raw.camera.clone(),
            })
        }
        "sequence" => {
            let name = raw.sequence_type.as_deref().unwrap_or("folder");
            let Some(kind) = SequenceKind::parse(name) else {
                bail!("unknown sequence type: {}", name);
            };
            NodeKind::Sequence(kind)
        }
        "obsAction" => {
            let name = raw
                .action
                .as_deref()
                .context("obsAction node without an action name")?;
            let Some(action) = ObsActionKind::parse(name) else {
                bail!("unknown observation action: {}", name);
            };
            NodeKind::ObsAction(action)
        }
        other => return Err(MsbError::UnknownNodeKind(other.to_string()).into()),
    };
    Ok(kind)
}

fn build_node(prog: &mut ScienceProgram, parent: NodeId, raw: &RawNode) -> Result<()> {
    let kind = node_kind(raw)?;
    let id = prog.add_child(parent, kind);
    if let Some(definition) = &raw.id {
        prog.define(definition, id);
    }
    if let Some(reference) = &raw.idref {
        prog.set_reference(id, reference);
    }
    for child in &raw.children {
        build_node(prog, id, child)?;
    }
    Ok(())
}

/// Parses a science-program document from a JSON string.
pub fn parse_program_json_str(json: &str) -> Result<ScienceProgram> {
    let mut deserializer = serde_json::Deserializer::from_str(json);
    let raw: RawProgram = serde_path_to_error::deserialize(&mut deserializer)
        .context("Failed to deserialize science program JSON")?;

    if raw.program.kind != "scienceProgram" {
        bail!(
            "document root must be a scienceProgram, found '{}'",
            raw.program.kind
        );
    }

    let mut prog = ScienceProgram::new();
    if let Some(project_id) = &raw.project_id {
        prog.set_project_id(project_id);
    }
    let root = prog.root();
    for child in &raw.program.children {
        build_node(&mut prog, root, child)?;
    }
    log::debug!(
        "loaded science program with {} schedulable block(s)",
        prog.msbs().len()
    );
    Ok(prog)
}

/// Parses a science-program document from a JSON file.
pub fn parse_program_json(path: &Path) -> Result<ScienceProgram> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read science program file: {}", path.display()))?;
    parse_program_json_str(&content)
}
