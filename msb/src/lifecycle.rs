//! Lifecycle state machine for schedulable blocks.
//!
//! A block's state is tracked through its `remaining` count: eligible
//! (`> 0`), exhausted (`== 0`), or removed (the [`REMOVED`] sentinel,
//! reachable only by explicit removal). Transitions are pure state
//! mutations guarded by clamping; they never raise. Validation against an
//! external authority belongs to the surrounding database layer.

use crate::program::{NodeId, NodeKind, ScienceProgram, REMOVED};

impl ScienceProgram {
    /// Current remaining count of a block.
    pub fn remaining(&self, msb: NodeId) -> Option<i64> {
        self.msb_attrs(msb).map(|a| a.remaining)
    }

    /// Adjusts the remaining count by `delta` (negative for a decrement).
    ///
    /// Clamps at zero. If the current value or `delta` is the [`REMOVED`]
    /// sentinel the sentinel is kept verbatim; no arithmetic is ever
    /// performed on it.
    pub fn decrement_remaining(&mut self, msb: NodeId, delta: i64) {
        let Some(attrs) = self.msb_attrs_mut(msb) else {
            log::warn!("decrement_remaining: node {} is not a schedulable block", msb);
            return;
        };
        if attrs.remaining == REMOVED || delta == REMOVED {
            attrs.remaining = REMOVED;
            return;
        }
        let next = attrs.remaining + delta;
        if next < 0 {
            log::debug!(
                "remaining for block {} clamped to 0 (was {}, delta {})",
                msb,
                attrs.remaining,
                delta
            );
        }
        attrs.remaining = next.max(0);
    }

    /// Directly sets the remaining count (undo / administrative override).
    ///
    /// Accepts any non-negative value or the [`REMOVED`] sentinel; other
    /// negative values are clamped to zero.
    pub fn set_remaining(&mut self, msb: NodeId, value: i64) {
        let Some(attrs) = self.msb_attrs_mut(msb) else {
            log::warn!("set_remaining: node {} is not a schedulable block", msb);
            return;
        };
        if value == REMOVED {
            attrs.remaining = REMOVED;
        } else {
            if value < 0 {
                log::warn!("set_remaining: clamping negative value {} to 0", value);
            }
            attrs.remaining = value.max(0);
        }
    }

    /// Retires a block without an observation, e.g. when an external policy
    /// (noise limit reached) decides no further visits are useful.
    pub fn mark_fully_observed(&mut self, msb: NodeId) {
        self.set_remaining(msb, REMOVED);
    }

    /// Records that execution of this block was suspended at `label`.
    ///
    /// The label is transient execution state: it survives on the wrapper
    /// for the benefit of the surrounding database layer but never enters
    /// the checksum.
    pub fn suspend(&mut self, msb: NodeId, label: &str) {
        let Some(attrs) = self.msb_attrs_mut(msb) else {
            log::warn!("suspend: node {} is not a schedulable block", msb);
            return;
        };
        attrs.suspend_label = Some(label.to_string());
    }

    /// Clears a suspension label.
    pub fn resume(&mut self, msb: NodeId) {
        if let Some(attrs) = self.msb_attrs_mut(msb) {
            attrs.suspend_label = None;
        }
    }

    pub fn suspend_label(&self, msb: NodeId) -> Option<&str> {
        self.msb_attrs(msb).and_then(|a| a.suspend_label.as_deref())
    }

    /// Marks one observation of the block as done and rewrites the logic
    /// tree accordingly.
    ///
    /// Decrements `remaining` by one, then, if the block sits inside an OR
    /// folder: the OR folder's direct child on the path to the block (the
    /// enclosing AND folder when one is present, so that inherited
    /// components travel with the block) is relocated to be the sibling
    /// immediately following the OR folder, the folder's alternative count
    /// drops by one (clamped at zero), and once no alternatives are left
    /// every block still nested under the folder is forced to [`REMOVED`].
    ///
    /// Known limitation: relocation assumes an OR folder contains only
    /// blocks and AND folders of blocks; other content inside an OR folder
    /// is not repositioned.
    pub fn record_observation(&mut self, msb: NodeId) {
        self.decrement_remaining(msb, -1);

        let Some(or_id) = self.find_ancestor(msb, |k| matches!(k, NodeKind::OrFolder { .. }))
        else {
            return;
        };
        let Some(unit) = self.or_child_on_path(or_id, msb) else {
            return;
        };

        // The observed unit becomes permanent: no longer selectable through
        // the alternation, but still a visible entry in the document.
        self.detach(unit);
        self.insert_after(or_id, unit);
        // Logic membership changed for everything that moved.
        self.invalidate_checksums_under(unit);

        let exhausted = {
            let node = self.node_mut(or_id);
            match &mut node.kind {
                NodeKind::OrFolder { number_of_items } => {
                    if *number_of_items == 0 {
                        log::debug!("OR folder {} counter already at 0", or_id);
                    }
                    *number_of_items = number_of_items.saturating_sub(1);
                    *number_of_items == 0
                }
                _ => false,
            }
        };

        if exhausted {
            // Siblings not chosen are no longer selectable.
            for survivor in self.msbs_under(or_id) {
                log::debug!(
                    "OR folder {} exhausted; removing block {}",
                    or_id,
                    survivor
                );
                self.set_remaining(survivor, REMOVED);
            }
        }
    }

    /// The direct child of `or_id` on the ancestor path from `msb`.
    fn or_child_on_path(&self, or_id: NodeId, msb: NodeId) -> Option<NodeId> {
        let mut current = msb;
        loop {
            let parent = self.parent(current)?;
            if parent == or_id {
                return Some(current);
            }
            current = parent;
        }
    }
}
