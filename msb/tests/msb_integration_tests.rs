//! Integration tests exercising the block lifecycle end to end through the
//! public API, from a parsed document to OR-group rewriting.

use omp_msb::parsing::parse_program_json_str;
use omp_msb::program::{NodeKind, ScienceProgram, TargetComponent};
use omp_msb::{MsbError, NodeId, OR_MARKER, REMOVED};

/// One OR folder with two alternatives, CGS4/FS1 and UFTI/FS2.
const OR_ALTERNATION: &str = r#"{
    "projectId": "M02BU53",
    "scienceProgram": {
        "kind": "scienceProgram",
        "children": [
            {
                "kind": "orFolder",
                "numberOfItems": 1,
                "children": [
                    {
                        "kind": "msb",
                        "title": "MSB-A",
                        "remaining": 1,
                        "children": [
                            { "kind": "target", "name": "FS1", "frame": "J2000", "axis1": 8.2, "axis2": -10.5 },
                            { "kind": "instrument", "instrument": "CGS4", "centralWavelength": 2.2, "disperser": "40lpmm" },
                            {
                                "kind": "observation",
                                "children": [ { "kind": "obsAction", "action": "observe" } ]
                            }
                        ]
                    },
                    {
                        "kind": "msb",
                        "title": "MSB-B",
                        "remaining": 1,
                        "children": [
                            { "kind": "target", "name": "FS2", "frame": "J2000", "axis1": 112.0, "axis2": 30.1 },
                            { "kind": "instrument", "instrument": "UFTI", "filter": "K98" },
                            {
                                "kind": "observation",
                                "children": [ { "kind": "obsAction", "action": "observe" } ]
                            }
                        ]
                    }
                ]
            }
        ]
    }
}"#;

fn load_alternation() -> (ScienceProgram, NodeId, NodeId, NodeId) {
    let prog = parse_program_json_str(OR_ALTERNATION).expect("fixture should parse");
    let root = prog.root();
    let or = prog.children(root)[0];
    let msbs = prog.msbs();
    assert_eq!(msbs.len(), 2);
    (prog, or, msbs[0], msbs[1])
}

#[test]
fn test_or_scenario_end_to_end() {
    let (mut prog, or, a, b) = load_alternation();

    // Two distinct identities, both carrying the OR marker.
    let sum_a = prog.checksum(a).unwrap();
    let sum_b = prog.checksum(b).unwrap();
    assert_ne!(sum_a, sum_b);
    assert!(sum_a.ends_with(OR_MARKER));
    assert!(sum_b.ends_with(OR_MARKER));

    prog.record_observation(a);

    // A is now the sibling following the exhausted OR folder.
    let root = prog.root();
    assert_eq!(prog.children(root), &[or, a]);
    match prog.node(or).kind {
        NodeKind::OrFolder { number_of_items } => assert_eq!(number_of_items, 0),
        _ => unreachable!(),
    }
    assert_eq!(prog.remaining(a), Some(0));
    assert_eq!(prog.remaining(b), Some(REMOVED));

    // B's content and nesting are untouched, so its recomputed checksum is
    // unchanged, OR marker included.
    assert_eq!(prog.checksum(b).unwrap(), sum_b);

    // A left the alternation, so its identity loses the marker.
    let moved = prog.checksum(a).unwrap();
    assert_ne!(moved, sum_a);
    assert!(!moved.ends_with(OR_MARKER));
    assert_eq!(format!("{}{}", moved, OR_MARKER), sum_a);
}

#[test]
fn test_find_msb_by_checksum() {
    let (mut prog, _or, a, b) = load_alternation();
    let sum_b = prog.checksum(b).unwrap();
    assert_eq!(prog.find_msb(&sum_b).unwrap(), Some(b));
    let sum_a = prog.checksum(a).unwrap();
    assert_eq!(prog.find_msb(&sum_a).unwrap(), Some(a));
    assert_eq!(prog.find_msb("0000").unwrap(), None);
}

#[test]
fn test_summaries_from_parsed_document() {
    let (mut prog, _or, a, _b) = load_alternation();
    let summary = prog.summarize(a).unwrap();

    assert_eq!(summary.title, "MSB-A");
    assert_eq!(summary.project_id.as_deref(), Some("M02BU53"));
    assert_eq!(summary.telescope, "UKIRT");
    assert_eq!(summary.instrument, "CGS4");
    assert_eq!(summary.target, "FS1");
    assert_eq!(summary.waveband, "2.2");
    assert_eq!(summary.disperser, "40lpmm");
    assert_eq!(summary.remaining, 1);
    assert_eq!(summary.checksum, prog.checksum(a).unwrap());
    assert_eq!(summary.observations.len(), 1);
}

#[test]
fn test_summary_survives_lifecycle_but_reflects_counts() {
    let (mut prog, _or, a, _b) = load_alternation();
    let before = prog.summarize(a).unwrap();
    prog.record_observation(a);
    let after = prog.summarize(a).unwrap();

    assert_eq!(after.remaining, 0);
    assert_eq!(after.target, before.target);
    assert_eq!(after.instrument, before.instrument);
    // Identity changed only through the logic-membership suffix.
    assert_ne!(after.checksum, before.checksum);
    assert_eq!(format!("{}{}", after.checksum, OR_MARKER), before.checksum);
}

#[test]
fn test_failed_block_reports_error_not_partial_summary() {
    let json = r#"{
        "scienceProgram": {
            "kind": "scienceProgram",
            "children": [
                {
                    "kind": "msb",
                    "remaining": 1,
                    "children": [
                        { "kind": "target", "name": "FS1" },
                        {
                            "kind": "observation",
                            "children": [ { "kind": "obsAction", "action": "observe" } ]
                        },
                        { "kind": "observation", "children": [] }
                    ]
                }
            ]
        }
    }"#;
    let mut prog = parse_program_json_str(json).expect("should parse");
    let msb = prog.msbs()[0];
    assert!(matches!(
        prog.obs_summaries(msb).unwrap_err(),
        MsbError::MissingObserve
    ));
    assert!(matches!(
        prog.summarize(msb).unwrap_err(),
        MsbError::MissingObserve
    ));
}

#[test]
fn test_content_edit_changes_checksum() {
    let (mut prog, _or, a, _b) = load_alternation();
    let before = prog.checksum(a).unwrap();

    // Locate A's target node and rename the star.
    let target = prog.children(a)[0];
    prog.replace_kind(
        target,
        NodeKind::Target(TargetComponent {
            name: "FS99".to_string(),
            frame: Some("J2000".to_string()),
            axis1: 8.2,
            axis2: -10.5,
        }),
    );

    let after = prog.checksum(a).unwrap();
    assert_ne!(before, after);
    assert!(after.ends_with(OR_MARKER));
}

#[test]
fn test_definition_table_read_only_through_lifecycle() {
    let json = r#"{
        "scienceProgram": {
            "kind": "scienceProgram",
            "children": [
                {
                    "kind": "orFolder",
                    "numberOfItems": 2,
                    "children": [
                        {
                            "kind": "msb",
                            "remaining": 1,
                            "children": [
                                { "kind": "target", "id": "T1", "name": "FS1", "frame": "J2000", "axis1": 1.0, "axis2": 2.0 },
                                { "kind": "instrument", "instrument": "UFTI", "filter": "K98" },
                                { "kind": "observation", "children": [ { "kind": "obsAction", "action": "observe" } ] }
                            ]
                        },
                        {
                            "kind": "msb",
                            "remaining": 1,
                            "children": [
                                { "kind": "target", "idref": "T1" },
                                { "kind": "instrument", "instrument": "UFTI", "filter": "K98" },
                                { "kind": "observation", "children": [ { "kind": "obsAction", "action": "observe" } ] }
                            ]
                        }
                    ]
                }
            ]
        }
    }"#;
    let mut prog = parse_program_json_str(json).expect("should parse");
    let msbs = prog.msbs();
    let (a, b) = (msbs[0], msbs[1]);

    // B shares A's target by reference.
    assert_eq!(prog.obs_summaries(b).unwrap()[0].target, "FS1");

    // Relocating A must not repoint or break the shared definition.
    prog.record_observation(a);
    assert_eq!(prog.obs_summaries(b).unwrap()[0].target, "FS1");
}
