//! Monte Carlo simulation of the quoting process
//!
//! A trial walks the routing tree of one assembly the way an estimator
//! would: interpret every drawing, key the work-center times of every node,
//! then compile (and, for the manual process, re-key) the quote. Every manual
//! step is a queue of interactions; an error that slips through adds a
//! rework interaction to the back of the queue.

use std::collections::VecDeque;
use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::CostResult;
use crate::core::graph::BomGraph;
use crate::core::tree::{build_routing_tree_with_limits, RoutingNode, TreeLimits};
use crate::sim::model::{Gaussian, QuoteModel, MAX_INTERACTIONS};
use crate::sim::random::{RandomSource, RngSource};

const PLANNED_CAP: f64 = MAX_INTERACTIONS * 10.0;

/// Stage of the quoting process an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    CadInterpretation,
    WorkCenterEntry,
    Compilation,
    Transcription,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::CadInterpretation => "cad_interpretation",
            Phase::WorkCenterEntry => "work_center_entry",
            Phase::Compilation => "compilation",
            Phase::Transcription => "transcription",
        };
        write!(f, "{}", s)
    }
}

/// A mistake made during one simulated quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotingError {
    pub phase: Phase,
    pub item_no: String,
    /// Position of the failing interaction within its step, from 1
    pub sequence: u32,
    pub detected: bool,
    pub description: String,
}

/// Outcome of one trial for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub item_no: String,
    pub item_desc: String,
    pub total_time_sec: f64,
    pub manual_entries: u32,
    pub error_count: usize,
    pub errors: Vec<QuotingError>,
}

/// All trials for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRun {
    pub item_no: String,
    pub description: String,
    pub trials: Vec<TrialResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interaction {
    Planned,
    Rework,
}

#[derive(Debug, Default)]
struct Tally {
    time_sec: f64,
    entries: u32,
    errors: Vec<QuotingError>,
}

/// Runs trials of one quoting model
#[derive(Debug, Clone)]
pub struct Simulator {
    model: QuoteModel,
    limits: TreeLimits,
}

impl Simulator {
    /// Validate the model and build a simulator with default tree limits
    pub fn new(model: QuoteModel) -> CostResult<Self> {
        model.validate()?;
        Ok(Self {
            model,
            limits: TreeLimits::default(),
        })
    }

    pub fn with_limits(mut self, limits: TreeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn model(&self) -> &QuoteModel {
        &self.model
    }

    /// Run `trials` independent trials for one item
    ///
    /// Parts and assemblies without a costable BOM have nothing to quote and
    /// yield an empty list.
    pub fn simulate_quote<R: RandomSource + ?Sized>(
        &self,
        graph: &BomGraph,
        item_no: &str,
        trials: usize,
        source: &mut R,
    ) -> CostResult<Vec<TrialResult>> {
        let item = graph.require_item(item_no)?;
        if !item.is_assembly() || graph.costable_bom_for(item_no).is_none() {
            debug!(item = item_no, "nothing to quote");
            return Ok(Vec::new());
        }

        let tree = build_routing_tree_with_limits(graph, item_no, self.limits)?;
        let nodes = tree.nodes();

        let results = (0..trials)
            .map(|_| {
                let tally = self.run_trial(&tree.item_no, &nodes, source);
                TrialResult {
                    item_no: item.item_no.clone(),
                    item_desc: item.description.clone(),
                    total_time_sec: tally.time_sec,
                    manual_entries: tally.entries,
                    error_count: tally.errors.len(),
                    errors: tally.errors,
                }
            })
            .collect();
        Ok(results)
    }

    /// Simulate many items in parallel
    ///
    /// Item `i` draws from its own stream seeded with `seed + i`, so a fixed
    /// seed gives the same results however the work is scheduled.
    pub fn simulate_items(
        &self,
        graph: &BomGraph,
        item_nos: &[String],
        trials: usize,
        seed: u64,
    ) -> CostResult<Vec<ItemRun>> {
        let runs = item_nos
            .par_iter()
            .enumerate()
            .map(|(position, item_no)| {
                let mut source = RngSource::seeded(seed.wrapping_add(position as u64));
                let item = graph.require_item(item_no)?;
                let trials = self.simulate_quote(graph, item_no, trials, &mut source)?;
                Ok(ItemRun {
                    item_no: item.item_no.clone(),
                    description: item.description.clone(),
                    trials,
                })
            })
            .collect::<CostResult<Vec<_>>>()?;

        info!(
            model = %self.model.name,
            items = runs.len(),
            trials,
            "simulation complete"
        );
        Ok(runs)
    }

    fn run_trial<R: RandomSource + ?Sized>(
        &self,
        root: &str,
        nodes: &[&RoutingNode],
        source: &mut R,
    ) -> Tally {
        let mut tally = Tally::default();
        let model = &self.model;

        for node in nodes {
            let planned = planned_count(model.cad.interactions, source);
            self.run_step(
                Phase::CadInterpretation,
                &node.item_no,
                None,
                planned,
                model.cad.minutes_per_interaction,
                &mut tally,
                source,
            );
        }

        for node in nodes {
            for (wc, _) in node.used_work_centers() {
                let planned = planned_count(model.work_center_entry.interactions, source);
                self.run_step(
                    Phase::WorkCenterEntry,
                    &node.item_no,
                    Some(wc),
                    planned,
                    model.work_center_entry.minutes_per_interaction,
                    &mut tally,
                    source,
                );
            }
        }

        let compilation = &model.compilation;
        tally.time_sec += sample_minutes(compilation.minutes, source) * 60.0;
        tally.entries = tally.entries.saturating_add(compilation.entries);
        let p = source.uniform(model.errors.min_probability, model.errors.max_probability);
        if source.chance(p) {
            let detected = source.chance(model.errors.detection_probability);
            tally.errors.push(QuotingError {
                phase: Phase::Compilation,
                item_no: root.to_string(),
                sequence: 1,
                detected,
                description: "error while compiling the quote".to_string(),
            });
        }

        if let Some(transcription) = compilation.transcription {
            self.run_step(
                Phase::Transcription,
                root,
                None,
                nodes.len() as u32,
                transcription,
                &mut tally,
                source,
            );
        }

        tally
    }

    /// One manual step with rework feedback
    #[allow(clippy::too_many_arguments)]
    fn run_step<R: RandomSource + ?Sized>(
        &self,
        phase: Phase,
        item_no: &str,
        work_center: Option<&str>,
        planned: u32,
        minutes: Gaussian,
        tally: &mut Tally,
        source: &mut R,
    ) {
        let errors = &self.model.errors;
        let mut queue: VecDeque<Interaction> = (0..planned).map(|_| Interaction::Planned).collect();
        let mut rework = 0u32;
        let mut sequence = 0u32;

        while let Some(interaction) = queue.pop_front() {
            sequence += 1;
            tally.time_sec += sample_minutes(minutes, source) * 60.0;
            tally.entries = tally.entries.saturating_add(1);

            let p = source.uniform(errors.min_probability, errors.max_probability);
            if !source.chance(p) {
                continue;
            }

            let detected = source.chance(errors.detection_probability);
            let kind = match interaction {
                Interaction::Planned => "entry",
                Interaction::Rework => "rework entry",
            };
            let description = match work_center {
                Some(wc) => format!("error in {kind} {sequence} for {item_no} at {wc}"),
                None => format!("error in {kind} {sequence} for {item_no}"),
            };
            tally.errors.push(QuotingError {
                phase,
                item_no: item_no.to_string(),
                sequence,
                detected,
                description,
            });

            if detected {
                continue;
            }
            if rework < errors.max_rework_per_step {
                rework += 1;
                queue.push_back(Interaction::Rework);
            } else if rework == errors.max_rework_per_step {
                // count past the ceiling so the warning fires once per step
                rework += 1;
                warn!(
                    %phase,
                    item = item_no,
                    ceiling = errors.max_rework_per_step,
                    "rework ceiling reached, dropping further rework"
                );
            }
        }
    }
}

/// Convenience wrapper: validate `model` and run one item
pub fn simulate_quote<R: RandomSource + ?Sized>(
    graph: &BomGraph,
    item_no: &str,
    trials: usize,
    model: &QuoteModel,
    source: &mut R,
) -> CostResult<Vec<TrialResult>> {
    Simulator::new(model.clone())?.simulate_quote(graph, item_no, trials, source)
}

/// Draws past the tail are capped so one step stays bounded
fn planned_count<R: RandomSource + ?Sized>(dist: Gaussian, source: &mut R) -> u32 {
    source
        .normal(dist.mean, dist.std_dev)
        .round()
        .clamp(0.0, PLANNED_CAP) as u32
}

fn sample_minutes<R: RandomSource + ?Sized>(dist: Gaussian, source: &mut R) -> f64 {
    source.normal(dist.mean, dist.std_dev).max(0.0)
}
