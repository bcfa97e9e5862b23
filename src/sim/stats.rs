//! Summary statistics over simulation trials

use serde::{Deserialize, Serialize};

use crate::core::error::{CostError, CostResult};
use crate::sim::quote::{ItemRun, TrialResult};

/// Aggregate of a set of trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    pub trials: usize,
    pub avg_time_sec: f64,
    pub avg_entries: f64,
    pub avg_errors: f64,
    pub std_dev_time_sec: f64,
    pub min_time_sec: f64,
    pub max_time_sec: f64,
    pub p95_time_sec: f64,
}

/// Per-item summary line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item_no: String,
    pub description: String,
    #[serde(flatten)]
    pub summary: TrialSummary,
}

/// Summary across every simulated item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallSummary {
    /// Items that produced at least one trial
    pub items: usize,
    /// Pooled over all trials of all items
    pub pooled: TrialSummary,
    /// Unweighted means of the per-item averages
    pub mean_item_avg_time_sec: f64,
    pub mean_item_avg_entries: f64,
    pub mean_item_avg_errors: f64,
}

/// Summarize a set of trials; empty input is `NoData`
pub fn summarize(trials: &[TrialResult]) -> CostResult<TrialSummary> {
    summarize_iter(trials.iter())
}

fn summarize_iter<'a>(trials: impl Iterator<Item = &'a TrialResult>) -> CostResult<TrialSummary> {
    let mut times = Vec::new();
    let mut entries = 0.0;
    let mut errors = 0.0;
    for t in trials {
        times.push(t.total_time_sec);
        entries += f64::from(t.manual_entries);
        errors += t.error_count as f64;
    }
    if times.is_empty() {
        return Err(CostError::NoData);
    }

    times.sort_by(|a, b| a.total_cmp(b));
    let n = times.len() as f64;
    let mean = times.iter().sum::<f64>() / n;
    let variance = times.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

    let min = times.first().copied().unwrap_or(0.0);
    let max = times.last().copied().unwrap_or(0.0);
    let p95_idx = ((n * 0.95).ceil() as usize).saturating_sub(1);
    let p95 = times.get(p95_idx).copied().unwrap_or(max);

    Ok(TrialSummary {
        trials: times.len(),
        avg_time_sec: mean,
        avg_entries: entries / n,
        avg_errors: errors / n,
        std_dev_time_sec: variance.sqrt(),
        min_time_sec: min,
        max_time_sec: max,
        p95_time_sec: p95,
    })
}

/// One summary per item run; runs without trials are left out
pub fn summarize_items(runs: &[ItemRun]) -> Vec<ItemSummary> {
    runs.iter()
        .filter_map(|run| {
            summarize(&run.trials).ok().map(|summary| ItemSummary {
                item_no: run.item_no.clone(),
                description: run.description.clone(),
                summary,
            })
        })
        .collect()
}

/// Pooled and per-item-mean figures across all runs
pub fn summarize_overall(runs: &[ItemRun]) -> CostResult<OverallSummary> {
    let pooled = summarize_iter(runs.iter().flat_map(|r| r.trials.iter()))?;
    let per_item = summarize_items(runs);
    let k = per_item.len() as f64;
    let mean_of = |f: fn(&TrialSummary) -> f64| per_item.iter().map(|i| f(&i.summary)).sum::<f64>() / k;

    Ok(OverallSummary {
        items: per_item.len(),
        mean_item_avg_time_sec: mean_of(|s| s.avg_time_sec),
        mean_item_avg_entries: mean_of(|s| s.avg_entries),
        mean_item_avg_errors: mean_of(|s| s.avg_errors),
        pooled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(time: f64, entries: u32, errors: usize) -> TrialResult {
        TrialResult {
            item_no: "A1".into(),
            item_desc: "Assembly".into(),
            total_time_sec: time,
            manual_entries: entries,
            error_count: errors,
            errors: Vec::new(),
        }
    }

    fn run(item_no: &str, trials: Vec<TrialResult>) -> ItemRun {
        ItemRun {
            item_no: item_no.into(),
            description: format!("{item_no} description"),
            trials,
        }
    }

    #[test]
    fn test_summarize_empty_is_no_data() {
        assert_eq!(summarize(&[]).unwrap_err(), CostError::NoData);
        assert_eq!(summarize_overall(&[]).unwrap_err(), CostError::NoData);
        assert_eq!(
            summarize_overall(&[run("A1", vec![])]).unwrap_err(),
            CostError::NoData
        );
    }

    #[test]
    fn test_summarize_values() {
        let trials = vec![trial(100.0, 10, 0), trial(300.0, 30, 2), trial(200.0, 20, 1)];
        let s = summarize(&trials).unwrap();
        assert_eq!(s.trials, 3);
        assert_eq!(s.avg_time_sec, 200.0);
        assert_eq!(s.avg_entries, 20.0);
        assert_eq!(s.avg_errors, 1.0);
        assert_eq!(s.min_time_sec, 100.0);
        assert_eq!(s.max_time_sec, 300.0);
        assert_eq!(s.p95_time_sec, 300.0);
        assert!((s.std_dev_time_sec - (20000.0_f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_p95_nearest_rank() {
        let trials: Vec<TrialResult> = (1..=100).map(|i| trial(i as f64, 1, 0)).collect();
        assert_eq!(summarize(&trials).unwrap().p95_time_sec, 95.0);

        let single = summarize(&[trial(42.0, 1, 0)]).unwrap();
        assert_eq!(single.p95_time_sec, 42.0);
        assert_eq!(single.std_dev_time_sec, 0.0);
    }

    #[test]
    fn test_items_and_overall() {
        let runs = vec![
            run("A1", vec![trial(100.0, 10, 0), trial(100.0, 10, 0)]),
            run("P1", vec![]),
            run("A2", vec![trial(400.0, 40, 4)]),
        ];

        let items = summarize_items(&runs);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_no, "A1");
        assert_eq!(items[1].summary.avg_time_sec, 400.0);

        let overall = summarize_overall(&runs).unwrap();
        assert_eq!(overall.items, 2);
        assert_eq!(overall.pooled.trials, 3);
        assert_eq!(overall.pooled.avg_time_sec, 200.0);
        // mean of item means weighs each item once
        assert_eq!(overall.mean_item_avg_time_sec, 250.0);
        assert_eq!(overall.mean_item_avg_errors, 2.0);
    }

    #[test]
    fn test_item_summary_serializes_flat() {
        let items = summarize_items(&[run("A1", vec![trial(10.0, 1, 0)])]);
        let json = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(json["item_no"], "A1");
        assert_eq!(json["avg_time_sec"], 10.0);
    }
}
