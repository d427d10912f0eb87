//! Lowest-metric rankings and summaries
//!
//! The simplest view on a scheme: which districts have the lowest coverage
//! (or participation), and what the distribution looks like overall.

use civicscope_stats::{descriptive::DescriptiveStats, percentiles::Percentiles};
use serde::Serialize;

/// A district's position in an ascending ranking (1-based).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDistrict {
    pub rank: usize,
    pub district: String,
    pub value: f64,
}

/// Returns up to `limit` districts with the lowest values, lowest first.
///
/// Ties are broken by district name so rankings are stable across runs.
///
/// # Examples
///
/// ```
/// use civicscope_analysis::ranking::rank_lowest;
///
/// let points = [
///     ("MYSURU".to_owned(), 0.21),
///     ("UDUPI".to_owned(), 0.08),
///     ("KODAGU".to_owned(), 0.15),
/// ];
/// let lowest = rank_lowest(&points, 2);
/// assert_eq!(lowest[0].district, "UDUPI");
/// assert_eq!(lowest[1].district, "KODAGU");
/// assert_eq!(lowest.len(), 2);
/// ```
#[must_use]
pub fn rank_lowest(points: &[(String, f64)], limit: usize) -> Vec<RankedDistrict> {
    let mut sorted = points.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    sorted
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (district, value))| RankedDistrict {
            rank: i + 1,
            district: district.clone(),
            value: *value,
        })
        .collect()
}

/// Distribution summary of one metric across districts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub districts: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
}

impl MetricSummary {
    /// Summarizes the values of `points`; `None` when there are none.
    #[must_use]
    pub fn from_points(points: &[(String, f64)]) -> Option<Self> {
        let mut values = points.iter().map(|(_, v)| *v).collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        let stats = DescriptiveStats::from_sorted(&values)?;
        let quartiles = Percentiles::from_sorted(&values, &[25.0, 75.0]);
        Some(Self {
            districts: stats.count,
            mean: stats.mean,
            median: stats.median,
            std_dev: stats.std_dev,
            min: stats.min,
            max: stats.max,
            p25: quartiles.get(25.0).unwrap_or(f64::NAN),
            p75: quartiles.get(75.0).unwrap_or(f64::NAN),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(values: &[(&str, f64)]) -> Vec<(String, f64)> {
        values.iter().map(|(d, v)| ((*d).to_owned(), *v)).collect()
    }

    #[test]
    fn test_limit_larger_than_input() {
        let ranked = rank_lowest(&points(&[("A", 0.3), ("B", 0.1)]), 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].district, "B");
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn test_ties_by_name() {
        let ranked = rank_lowest(&points(&[("C", 0.1), ("A", 0.1), ("B", 0.0)]), 3);
        let order = ranked.iter().map(|r| r.district.as_str()).collect::<Vec<_>>();
        assert_eq!(order, ["B", "A", "C"]);
    }

    #[test]
    fn test_zero_limit() {
        assert!(rank_lowest(&points(&[("A", 0.3)]), 0).is_empty());
    }

    #[test]
    fn test_summary() {
        let summary =
            MetricSummary::from_points(&points(&[("A", 0.1), ("B", 0.2), ("C", 0.3), ("D", 0.4)]))
                .unwrap();
        assert_eq!(summary.districts, 4);
        assert!((summary.mean - 0.25).abs() < 1e-12);
        assert!((summary.median - 0.25).abs() < 1e-12);
        assert!((summary.p25 - 0.175).abs() < 1e-12);
        assert_eq!(summary.min, 0.1);
        assert_eq!(summary.max, 0.4);
    }

    #[test]
    fn test_summary_of_nothing() {
        assert!(MetricSummary::from_points(&[]).is_none());
    }
}
