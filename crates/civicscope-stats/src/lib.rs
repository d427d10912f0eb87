//! Statistical utilities for the civicscope workspace.
//!
//! This crate provides the numeric building blocks used by the analysis layer:
//!
//! - **Descriptive statistics**: mean, median, population variance and standard deviation
//! - **Percentiles**: linear-interpolated percentiles for quantile summaries and thresholds
//! - **Isolation forest**: a seeded, single-feature isolation forest for outlier scoring
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentile computation and storage
//! - [`isolation_forest`]: Unsupervised anomaly scoring over a single feature
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use civicscope_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Computing percentiles
//!
//! ```
//! use civicscope_stats::percentiles::Percentiles;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let percentiles = Percentiles::new(&values, &[25.0, 50.0, 75.0]);
//! assert_eq!(percentiles.get(50.0), Some(3.0));
//! ```
//!
//! ## Scoring outliers
//!
//! ```
//! use civicscope_stats::isolation_forest::{IsolationForest, IsolationForestParams};
//!
//! let values = [0.31, 0.29, 0.30, 0.32, 0.28, 0.02];
//! let forest = IsolationForest::fit(&values, &IsolationForestParams::default(), 42).unwrap();
//! let scores = forest.scores(&values);
//! assert!(scores[5] > scores[0]);
//! ```

pub mod descriptive;
pub mod isolation_forest;
pub mod percentiles;
