//! Content checksum for schedulable blocks.
//!
//! The checksum is the identity by which external systems (scheduler, data
//! acceptance) address a block, so it must be stable across recomputation
//! and must ignore transient execution state. Input to the hash is a
//! deterministic serialization of the block's direct children with every
//! reference expanded; the wrapper element's own attributes (title,
//! remaining count, suspension label) are excluded. Membership in OR/AND
//! logic folders is encoded as a suffix appended after the hex digest.

use md5::{Digest, Md5};

use crate::error::{MsbError, MsbResult};
use crate::program::{NodeId, NodeKind, ScienceProgram};

/// Suffix marker for a block nested inside an OR folder.
pub const OR_MARKER: char = 'O';
/// Suffix marker for a block nested inside an AND folder.
pub const AND_MARKER: char = 'A';

fn opt_str(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

fn opt_num<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

impl ScienceProgram {
    /// Returns the block's checksum, computing and caching it if absent.
    ///
    /// Lifecycle transitions that only touch `remaining` leave the cache in
    /// place; structural mutation clears it.
    pub fn checksum(&mut self, msb: NodeId) -> MsbResult<String> {
        if let Some(cached) = self.msb_attrs(msb).and_then(|a| a.checksum.clone()) {
            return Ok(cached);
        }
        let computed = self.compute_checksum(msb)?;
        if let Some(attrs) = self.msb_attrs_mut(msb) {
            attrs.checksum = Some(computed.clone());
        }
        Ok(computed)
    }

    /// Cached checksum, if one has been computed or injected.
    pub fn cached_checksum(&self, msb: NodeId) -> Option<&str> {
        self.msb_attrs(msb).and_then(|a| a.checksum.as_deref())
    }

    /// Injects a previously persisted checksum so that the identity
    /// round-trips without recomputation.
    pub fn set_checksum(&mut self, msb: NodeId, checksum: &str) {
        if let Some(attrs) = self.msb_attrs_mut(msb) {
            attrs.checksum = Some(checksum.to_string());
        } else {
            log::warn!("set_checksum: node {} is not a schedulable block", msb);
        }
    }

    /// Clears the cached checksum of a single block.
    pub(crate) fn clear_cached_checksum(&mut self, msb: NodeId) {
        if let Some(attrs) = self.msb_attrs_mut(msb) {
            attrs.checksum = None;
        }
    }

    /// Clears cached checksums for every block inside the subtree at `id`.
    pub(crate) fn invalidate_checksums_under(&mut self, id: NodeId) {
        for msb in self.msbs_under(id) {
            self.clear_cached_checksum(msb);
        }
    }

    fn compute_checksum(&self, msb: NodeId) -> MsbResult<String> {
        if !self.node(msb).kind.is_msb() {
            return Err(MsbError::NotAnMsb(msb));
        }

        // Serialize the children, not the wrapper: the wrapper carries the
        // transient and identity attributes that must stay out of the hash.
        let mut buf = String::new();
        for &child in self.node(msb).children() {
            self.write_resolved(child, &mut buf)?;
        }

        let mut hasher = Md5::new();
        hasher.update(buf.as_bytes());
        let mut checksum = hex::encode(hasher.finalize());

        if self.has_ancestor(msb, |k| matches!(k, NodeKind::OrFolder { .. })) {
            checksum.push(OR_MARKER);
        }
        if self.has_ancestor(msb, |k| matches!(k, NodeKind::AndFolder)) {
            checksum.push(AND_MARKER);
        }
        log::debug!("checksum for block {}: {}", msb, checksum);
        Ok(checksum)
    }

    /// Writes a deterministic serialization of the subtree at `id` with
    /// references expanded through the definition table.
    fn write_resolved(&self, id: NodeId, out: &mut String) -> MsbResult<()> {
        let id = self.resolve(id)?;
        let node = self.node(id);
        out.push('(');
        out.push_str(node.kind.tag());
        match &node.kind {
            NodeKind::Target(t) => {
                out.push_str(&format!(
                    " name={} frame={} axis1={} axis2={}",
                    t.name,
                    opt_str(&t.frame),
                    t.axis1,
                    t.axis2
                ));
            }
            NodeKind::SiteQuality(q) => {
                out.push_str(&format!(
                    " tau={}..{} seeing={}..{} cloud={} moon={}",
                    opt_num(&q.tau_min),
                    opt_num(&q.tau_max),
                    opt_num(&q.seeing_min),
                    opt_num(&q.seeing_max),
                    opt_num(&q.cloud),
                    opt_num(&q.moon)
                ));
            }
            NodeKind::SchedulingWindow(w) => {
                out.push_str(&format!(
                    " earliest={} latest={}",
                    opt_num(&w.earliest.map(|t| t.to_rfc3339())),
                    opt_num(&w.latest.map(|t| t.to_rfc3339()))
                ));
            }
            NodeKind::Instrument(i) => {
                out.push_str(&format!(
                    " instrument={} filter={} wavelength={} disperser={} polariser={} camera={}",
                    i.instrument.as_str(),
                    opt_str(&i.filter),
                    opt_num(&i.central_wavelength),
                    opt_str(&i.disperser),
                    opt_str(&i.polariser),
                    opt_str(&i.camera)
                ));
            }
            NodeKind::Sequence(s) => {
                out.push_str(&format!(" type={}", s.as_str()));
            }
            NodeKind::ObsAction(a) => {
                out.push_str(&format!(" action={}", a.as_str()));
            }
            // Wrapper and grouping elements contribute structure only;
            // their count attributes are transient.
            NodeKind::Program
            | NodeKind::Msb(_)
            | NodeKind::OrFolder { .. }
            | NodeKind::AndFolder
            | NodeKind::Observation => {}
        }
        for &child in node.children() {
            self.write_resolved(child, out)?;
        }
        out.push(')');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{MsbAttrs, TargetComponent};
    use proptest::prelude::*;

    fn target(name: &str) -> NodeKind {
        NodeKind::Target(TargetComponent {
            name: name.to_string(),
            frame: Some("J2000".to_string()),
            axis1: 12.5,
            axis2: -0.25,
        })
    }

    fn program_with_block(target_name: &str) -> (ScienceProgram, NodeId) {
        let mut prog = ScienceProgram::new();
        let root = prog.root();
        let msb = prog.add_child(root, NodeKind::Msb(MsbAttrs::new(2)));
        prog.add_child(msb, target(target_name));
        (prog, msb)
    }

    #[test]
    fn test_checksum_stable_across_recomputation() {
        let (mut prog, msb) = program_with_block("FS1");
        let first = prog.checksum(msb).unwrap();
        prog.clear_cached_checksum(msb);
        let second = prog.checksum(msb).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_checksum_changes_with_content() {
        let (mut prog_a, msb_a) = program_with_block("FS1");
        let (mut prog_b, msb_b) = program_with_block("FS2");
        assert_ne!(
            prog_a.checksum(msb_a).unwrap(),
            prog_b.checksum(msb_b).unwrap()
        );
    }

    #[test]
    fn test_checksum_ignores_remaining() {
        let (mut prog, msb) = program_with_block("FS1");
        let before = prog.checksum(msb).unwrap();

        prog.decrement_remaining(msb, -1);
        prog.mark_fully_observed(msb);

        // Recompute from scratch: the hash input must not contain counts.
        prog.clear_cached_checksum(msb);
        assert_eq!(prog.checksum(msb).unwrap(), before);
    }

    #[test]
    fn test_checksum_ignores_suspension() {
        let (mut prog, msb) = program_with_block("FS1");
        let before = prog.checksum(msb).unwrap();
        prog.suspend(msb, "obs_3");
        prog.clear_cached_checksum(msb);
        assert_eq!(prog.checksum(msb).unwrap(), before);
    }

    #[test]
    fn test_or_membership_marker() {
        let (mut plain, plain_msb) = program_with_block("FS1");
        let plain_sum = plain.checksum(plain_msb).unwrap();

        let mut nested = ScienceProgram::new();
        let root = nested.root();
        let or = nested.add_child(root, NodeKind::OrFolder { number_of_items: 1 });
        let msb = nested.add_child(or, NodeKind::Msb(MsbAttrs::new(2)));
        nested.add_child(msb, target("FS1"));
        let nested_sum = nested.checksum(msb).unwrap();

        assert_ne!(plain_sum, nested_sum);
        assert!(nested_sum.ends_with(OR_MARKER));
        assert_eq!(nested_sum.trim_end_matches(OR_MARKER), plain_sum);
    }

    #[test]
    fn test_or_and_markers_both_apply() {
        let mut prog = ScienceProgram::new();
        let root = prog.root();
        let or = prog.add_child(root, NodeKind::OrFolder { number_of_items: 1 });
        let and = prog.add_child(or, NodeKind::AndFolder);
        let msb = prog.add_child(and, NodeKind::Msb(MsbAttrs::new(1)));
        prog.add_child(msb, target("FS1"));

        let sum = prog.checksum(msb).unwrap();
        assert!(sum.ends_with("OA"));
    }

    #[test]
    fn test_reference_expansion_matches_inline_content() {
        // A block referencing a target definition hashes the same as a
        // block containing the equivalent target inline.
        let (mut inline, inline_msb) = program_with_block("FS1");
        let inline_sum = inline.checksum(inline_msb).unwrap();

        let mut byref = ScienceProgram::new();
        let root = byref.root();
        let def = byref.add_child(root, target("FS1"));
        byref.detach(def); // definition lives outside any block here
        byref.define("T1", def);
        let msb = byref.add_child(root, NodeKind::Msb(MsbAttrs::new(2)));
        let reference = byref.add_child(msb, target("unused"));
        byref.set_reference(reference, "T1");

        assert_eq!(byref.checksum(msb).unwrap(), inline_sum);
    }

    #[test]
    fn test_set_checksum_round_trips() {
        let (mut prog, msb) = program_with_block("FS1");
        prog.set_checksum(msb, "feedc0de");
        assert_eq!(prog.cached_checksum(msb), Some("feedc0de"));
        assert_eq!(prog.checksum(msb).unwrap(), "feedc0de");
    }

    proptest! {
        /// Remaining-only transitions never perturb the recomputed checksum.
        #[test]
        fn prop_checksum_independent_of_count_transitions(deltas in proptest::collection::vec(-5i64..0, 1..12)) {
            let (mut prog, msb) = program_with_block("FS1");
            let before = prog.checksum(msb).unwrap();
            for delta in deltas {
                prog.decrement_remaining(msb, delta);
            }
            prog.clear_cached_checksum(msb);
            prop_assert_eq!(prog.checksum(msb).unwrap(), before);
        }
    }
}
