//! Inheritance walk over a schedulable block.
//!
//! Children are visited depth-first in document order with a mutable
//! inherited-state record: a component sets state for every later sibling
//! and every descendant until overridden. Entering an observation opens a
//! scoped copy of the state, so overrides inside one observation do not
//! leak into the next.

use crate::error::{MsbError, MsbResult};
use crate::program::{NodeId, NodeKind, ObsActionKind, ScienceProgram, SequenceKind};
use crate::summary::{
    join_distinct, resolve_target, summarize_instrument, InstrumentSummary, MsbSummary,
    ObsSummary, ResolvedTarget, SchedulingWindow, SiteQuality, CALIBRATION, NONE_STRING,
};

/// Component state carried forward through the walk.
#[derive(Debug, Clone, Default)]
struct Inherited {
    target: Option<ResolvedTarget>,
    instrument: Option<InstrumentSummary>,
    site_quality: Option<SiteQuality>,
    window: Option<SchedulingWindow>,
}

impl ScienceProgram {
    /// One summary per observation in the block, in document order.
    ///
    /// Fatal on any structural problem in the subtree; no partial list is
    /// returned.
    pub fn obs_summaries(&self, msb: NodeId) -> MsbResult<Vec<ObsSummary>> {
        Ok(self.walk_block(msb)?.0)
    }

    /// Telescope serving this block, inferred from its observations.
    ///
    /// All observations must resolve to the same telescope; a mixed block
    /// is structurally invalid.
    pub fn telescope(&self, msb: NodeId) -> MsbResult<String> {
        let observations = self.obs_summaries(msb)?;
        telescope_of(&observations)
    }

    /// Builds the merged, queryable summary of the block.
    pub fn summarize(&mut self, msb: NodeId) -> MsbResult<MsbSummary> {
        let attrs = self
            .msb_attrs(msb)
            .ok_or(MsbError::NotAnMsb(msb))?
            .clone();
        let (observations, state) = self.walk_block(msb)?;
        let telescope = telescope_of(&observations)?;
        let checksum = self.checksum(msb)?;

        let mut obstypes: Vec<String> = Vec::new();
        for obs in &observations {
            for name in &obs.obstypes {
                if !obstypes.contains(name) {
                    obstypes.push(name.clone());
                }
            }
        }

        Ok(MsbSummary {
            checksum,
            project_id: self.project_id().map(str::to_string),
            title: attrs.title.unwrap_or_else(|| NONE_STRING.to_string()),
            priority: attrs.priority,
            remaining: attrs.remaining,
            estimated_seconds: attrs.estimated_seconds,
            telescope,
            instrument: join_distinct(observations.iter().map(|o| o.instrument.as_deref())),
            target: join_distinct(observations.iter().map(|o| Some(o.target.as_str()))),
            coordstype: join_distinct(observations.iter().map(|o| Some(o.coordstype.as_str()))),
            waveband: join_distinct(observations.iter().map(|o| o.waveband.as_deref())),
            disperser: join_distinct(observations.iter().map(|o| o.disperser.as_deref())),
            pol: observations.iter().any(|o| o.pol),
            mode: join_distinct(observations.iter().map(|o| o.mode.as_deref())),
            obstypes,
            site_quality: state.site_quality.unwrap_or_default(),
            scheduling_window: state.window.unwrap_or_default(),
            observations,
        })
    }

    fn walk_block(&self, msb: NodeId) -> MsbResult<(Vec<ObsSummary>, Inherited)> {
        if !self.node(msb).kind.is_msb() {
            return Err(MsbError::NotAnMsb(msb));
        }
        let mut state = Inherited::default();
        let mut out = Vec::new();
        for &child in self.node(msb).children() {
            self.walk_node(child, &mut state, &mut out)?;
        }
        Ok((out, state))
    }

    fn walk_node(
        &self,
        id: NodeId,
        state: &mut Inherited,
        out: &mut Vec<ObsSummary>,
    ) -> MsbResult<()> {
        let id = self.resolve(id)?;
        match &self.node(id).kind {
            NodeKind::Target(t) => state.target = Some(resolve_target(t)?),
            NodeKind::Instrument(i) => state.instrument = Some(summarize_instrument(i)),
            NodeKind::SiteQuality(q) => state.site_quality = Some(q.to_quality()),
            NodeKind::SchedulingWindow(w) => state.window = Some(w.to_window()),
            NodeKind::Observation => {
                let mut scoped = state.clone();
                let mut obstypes = Vec::new();
                let mut pol_iterator = false;
                for &child in self.node(id).children() {
                    self.walk_observation(child, &mut scoped, &mut obstypes, &mut pol_iterator)?;
                }
                out.push(finalize_observation(scoped, obstypes, pol_iterator)?);
            }
            _ => {
                for &child in self.node(id).children() {
                    self.walk_node(child, state, out)?;
                }
            }
        }
        Ok(())
    }

    fn walk_observation(
        &self,
        id: NodeId,
        state: &mut Inherited,
        obstypes: &mut Vec<String>,
        pol_iterator: &mut bool,
    ) -> MsbResult<()> {
        let id = self.resolve(id)?;
        match &self.node(id).kind {
            NodeKind::Target(t) => state.target = Some(resolve_target(t)?),
            NodeKind::Instrument(i) => state.instrument = Some(summarize_instrument(i)),
            NodeKind::SiteQuality(q) => state.site_quality = Some(q.to_quality()),
            NodeKind::SchedulingWindow(w) => state.window = Some(w.to_window()),
            NodeKind::ObsAction(action) => obstypes.push(action.as_str().to_string()),
            NodeKind::Sequence(kind) => {
                // A polarization iterator flags the summary at any depth;
                // the discovered action names flatten into the parent list.
                if *kind == SequenceKind::Pol {
                    *pol_iterator = true;
                }
                for &child in self.node(id).children() {
                    self.walk_observation(child, state, obstypes, pol_iterator)?;
                }
            }
            _ => {
                for &child in self.node(id).children() {
                    self.walk_observation(child, state, obstypes, pol_iterator)?;
                }
            }
        }
        Ok(())
    }
}

fn finalize_observation(
    state: Inherited,
    obstypes: Vec<String>,
    pol_iterator: bool,
) -> MsbResult<ObsSummary> {
    if obstypes.is_empty() {
        return Err(MsbError::MissingObserve);
    }

    let mut distinct: Vec<String> = Vec::new();
    for name in obstypes {
        if !distinct.contains(&name) {
            distinct.push(name);
        }
    }

    let has_science = distinct
        .iter()
        .any(|name| name == ObsActionKind::Observe.as_str());

    // Calibration-only observations (or observations that never inherited a
    // target) get a synthetic target named after their actions.
    let (target, coordstype) = match (&state.target, has_science) {
        (Some(t), true) => (t.name.clone(), t.coordstype.to_string()),
        _ => (distinct.join("/"), CALIBRATION.to_string()),
    };

    let (telescope, instrument, waveband, disperser, instrument_pol, mode) = match &state.instrument
    {
        Some(i) => (
            Some(i.telescope().to_string()),
            Some(i.instrument.as_str().to_string()),
            i.waveband.clone(),
            i.disperser.clone(),
            i.pol,
            Some(i.mode.to_string()),
        ),
        None => (None, None, None, None, false, None),
    };

    Ok(ObsSummary {
        telescope,
        instrument,
        target,
        coordstype,
        waveband,
        disperser,
        pol: instrument_pol || pol_iterator,
        mode,
        obstypes: distinct,
    })
}

fn telescope_of(observations: &[ObsSummary]) -> MsbResult<String> {
    let mut found: Option<&str> = None;
    for obs in observations {
        let Some(telescope) = obs.telescope.as_deref() else {
            continue;
        };
        match found {
            None => found = Some(telescope),
            Some(existing) if existing != telescope => {
                return Err(MsbError::TelescopeMismatch(
                    existing.to_string(),
                    telescope.to_string(),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(found.unwrap_or(NONE_STRING).to_string())
}
