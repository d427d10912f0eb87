//! Joining normalized tables and deriving ratios
//!
//! The typical use is coverage: beneficiaries from a scheme table divided by
//! population from a census table, per district. The ratio is only defined
//! where the denominator is a positive finite number; other rows are excluded
//! and listed in [`JoinedTable::excluded`] rather than carried as `inf` or
//! `NaN`.

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    EmptyJoinError, JoinError, SchemaError,
    normalize::{NormalizedTable, canonical_column_name},
};

/// A joined district with the derived ratio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioRecord {
    pub district: String,
    pub numerator: f64,
    pub denominator: f64,
    pub ratio: f64,
}

/// Result of [`join_and_derive_ratio`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedTable {
    pub key_column: String,
    pub numerator_column: String,
    pub denominator_column: String,
    /// Joined districts with a defined ratio, in left-table order.
    pub records: Vec<RatioRecord>,
    /// Joined districts whose denominator was zero, negative or non-finite.
    pub excluded: Vec<String>,
}

impl JoinedTable {
    /// `(district, ratio)` pairs, in record order.
    #[must_use]
    pub fn ratio_points(&self) -> Vec<(String, f64)> {
        self.records
            .iter()
            .map(|r| (r.district.clone(), r.ratio))
            .collect()
    }
}

/// Inner-joins `left` and `right` on `key` and computes `numerator / denominator`.
///
/// `numerator` is read from `left`, `denominator` from `right`.
///
/// # Errors
///
/// * [`JoinError::Schema`] - a table is not keyed by `key`, or lacks its column
/// * [`JoinError::EmptyJoin`] - no district appears in both tables
///
/// # Examples
///
/// ```
/// use civicscope_data::{
///     join::join_and_derive_ratio,
///     normalize::{NormalizeSpec, normalize},
///     table::RawTable,
/// };
///
/// let population = RawTable::new(["district", "population"], [["A", "100"], ["B", "0"]]);
/// let beneficiaries = RawTable::new(["district", "beneficiaries"], [["A", "25"], ["B", "3"]]);
/// let population = normalize(&population, &NormalizeSpec::new("district", ["population"]))?;
/// let beneficiaries =
///     normalize(&beneficiaries, &NormalizeSpec::new("district", ["beneficiaries"]))?;
///
/// let joined =
///     join_and_derive_ratio(&beneficiaries, &population, "district", "beneficiaries", "population")?;
/// assert_eq!(joined.records.len(), 1);
/// assert_eq!(joined.records[0].ratio, 0.25);
/// assert_eq!(joined.excluded, ["B"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn join_and_derive_ratio(
    left: &NormalizedTable,
    right: &NormalizedTable,
    key: &str,
    numerator: &str,
    denominator: &str,
) -> Result<JoinedTable, JoinError> {
    let key = canonical_column_name(key);
    for table in [left, right] {
        if table.key_column() != key {
            return Err(missing_column(table, &key).into());
        }
    }
    let numerator_index = left
        .column_index(numerator)
        .ok_or_else(|| missing_column(left, &canonical_column_name(numerator)))?;
    let denominator_index = right
        .column_index(denominator)
        .ok_or_else(|| missing_column(right, &canonical_column_name(denominator)))?;

    let right_values = right
        .records()
        .iter()
        .map(|r| (r.district.as_str(), r.values[denominator_index]))
        .collect::<HashMap<_, _>>();

    let mut matched = 0;
    let mut records = vec![];
    let mut excluded = vec![];
    for record in left.records() {
        let Some(&denominator) = right_values.get(record.district.as_str()) else {
            continue;
        };
        matched += 1;
        let numerator = record.values[numerator_index];
        let Some(ratio) = derive_ratio(numerator, denominator) else {
            tracing::debug!(
                district = %record.district,
                denominator,
                "excluding district with undefined ratio"
            );
            excluded.push(record.district.clone());
            continue;
        };
        records.push(RatioRecord {
            district: record.district.clone(),
            numerator,
            denominator,
            ratio,
        });
    }

    if matched == 0 {
        return Err(EmptyJoinError {
            key,
            left_rows: left.len(),
            right_rows: right.len(),
        }
        .into());
    }

    Ok(JoinedTable {
        key_column: key,
        numerator_column: left.columns()[numerator_index].clone(),
        denominator_column: right.columns()[denominator_index].clone(),
        records,
        excluded,
    })
}

/// `numerator / denominator` when the denominator is positive and the result finite.
///
/// # Examples
///
/// ```
/// use civicscope_data::join::derive_ratio;
///
/// assert_eq!(derive_ratio(10.0, 100.0), Some(0.1));
/// assert_eq!(derive_ratio(10.0, 0.0), None);
/// assert_eq!(derive_ratio(10.0, -5.0), None);
/// ```
#[must_use]
pub fn derive_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 && denominator.is_finite() {
        Some(numerator / denominator).filter(|r| r.is_finite())
    } else {
        None
    }
}

fn missing_column(table: &NormalizedTable, column: &str) -> SchemaError {
    SchemaError::MissingColumn {
        column: column.to_owned(),
        available: std::iter::once(table.key_column())
            .chain(table.columns().iter().map(String::as_str))
            .map(str::to_owned)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        normalize::{NormalizeSpec, normalize},
        table::RawTable,
    };

    fn population(rows: &[(&str, &str)]) -> NormalizedTable {
        let raw = RawTable::new(
            ["district", "population"],
            rows.iter().map(|(d, p)| [*d, *p]),
        );
        normalize(&raw, &NormalizeSpec::new("district", ["population"])).unwrap()
    }

    fn beneficiaries(rows: &[(&str, &str)]) -> NormalizedTable {
        let raw = RawTable::new(
            ["district", "beneficiaries"],
            rows.iter().map(|(d, b)| [*d, *b]),
        );
        normalize(&raw, &NormalizeSpec::new("district", ["beneficiaries"])).unwrap()
    }

    fn join(left: &NormalizedTable, right: &NormalizedTable) -> Result<JoinedTable, JoinError> {
        join_and_derive_ratio(left, right, "district", "beneficiaries", "population")
    }

    #[test]
    fn test_coverage_of_shared_districts() {
        let pop = population(&[("A", "100"), ("B", "200"), ("C", "300")]);
        let ben = beneficiaries(&[("A", "10"), ("B", "40")]);
        let joined = join(&ben, &pop).unwrap();
        let ratios = joined.ratio_points();
        assert_eq!(
            ratios,
            vec![("A".to_owned(), 0.10), ("B".to_owned(), 0.20)]
        );
        assert!(joined.records.iter().all(|r| r.district != "C"));
        assert!(joined.excluded.is_empty());
    }

    #[test]
    fn test_disjoint_keys_are_an_error() {
        let pop = population(&[("A", "100")]);
        let ben = beneficiaries(&[("Z", "10")]);
        let err = join(&ben, &pop).unwrap_err();
        assert_eq!(
            err,
            JoinError::EmptyJoin(EmptyJoinError {
                key: "district".to_owned(),
                left_rows: 1,
                right_rows: 1,
            })
        );
    }

    #[test]
    fn test_zero_population_is_excluded_not_infinite() {
        let pop = population(&[("A", "0"), ("B", "50")]);
        let ben = beneficiaries(&[("A", "10"), ("B", "5")]);
        let joined = join(&ben, &pop).unwrap();
        assert_eq!(joined.records.len(), 1);
        assert_eq!(joined.excluded, ["A"]);
        assert!(joined.records.iter().all(|r| r.ratio.is_finite()));
    }

    #[test]
    fn test_all_excluded_is_valid_empty_result() {
        let pop = population(&[("A", "0")]);
        let ben = beneficiaries(&[("A", "10")]);
        let joined = join(&ben, &pop).unwrap();
        assert!(joined.records.is_empty());
        assert_eq!(joined.excluded, ["A"]);
    }

    #[test]
    fn test_zero_beneficiaries_give_zero_ratio() {
        let pop = population(&[("A", "10")]);
        let ben = beneficiaries(&[("A", "0")]);
        let joined = join(&ben, &pop).unwrap();
        assert_eq!(joined.records[0].ratio, 0.0);
    }

    #[test]
    fn test_left_order_is_preserved() {
        let pop = population(&[("A", "10"), ("B", "10"), ("C", "10")]);
        let ben = beneficiaries(&[("C", "1"), ("A", "2")]);
        let joined = join(&ben, &pop).unwrap();
        let order = joined
            .records
            .iter()
            .map(|r| r.district.as_str())
            .collect::<Vec<_>>();
        assert_eq!(order, ["C", "A"]);
    }

    #[test]
    fn test_missing_numerator_column() {
        let pop = population(&[("A", "10")]);
        let ben = beneficiaries(&[("A", "1")]);
        let err = join_and_derive_ratio(&ben, &pop, "district", "households", "population")
            .unwrap_err();
        assert!(matches!(
            err,
            JoinError::Schema(SchemaError::MissingColumn { column, .. }) if column == "households"
        ));
    }

    #[test]
    fn test_key_mismatch_is_schema_error() {
        let pop = population(&[("A", "10")]);
        let ben = beneficiaries(&[("A", "1")]);
        let err =
            join_and_derive_ratio(&ben, &pop, "taluk", "beneficiaries", "population").unwrap_err();
        assert!(matches!(err, JoinError::Schema(_)));
    }
}
