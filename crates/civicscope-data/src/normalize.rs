//! Dataset normalization
//!
//! Turns a [`RawTable`] into a [`NormalizedTable`]: one record per district,
//! keyed by a canonical district name, holding the designated numeric columns
//! as `f64`.
//!
//! # Steps
//!
//! 1. Canonicalize column names ([`canonical_column_name`]) and apply renames
//! 2. Drop the summary row (e.g. `TOTAL`), matched case-insensitively
//! 3. Upper-case the key ([`canonical_key`]) and resolve aliases
//! 4. Parse numeric columns ([`parse_numeric`]); rows with a missing or
//!    malformed value are dropped, never zero-filled
//!
//! A missing required column and a duplicated district are reported as
//! [`SchemaError`]; an empty result is a valid table.
//!
//! Normalization is idempotent: rendering the output back with
//! [`NormalizedTable::to_raw_table`] and normalizing it with the same spec
//! yields an equal table.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::{SchemaError, alias::AliasTable, table::RawTable};

/// What to extract from a raw table and how to canonicalize it.
#[derive(Debug, Clone, Default)]
pub struct NormalizeSpec {
    /// Canonical name of the district key column.
    pub key_column: String,
    /// Canonical names of the numeric columns every record must carry.
    pub numeric_columns: Vec<String>,
    /// Column renames applied after canonicalization, as `(from, to)` pairs.
    pub renames: Vec<(String, String)>,
    /// District spelling variants to rewrite.
    pub aliases: AliasTable,
    /// Key of a summary row to remove, if the source has one.
    pub summary_row_label: Option<String>,
}

impl NormalizeSpec {
    /// Creates a spec with no renames, no aliases and no summary row.
    ///
    /// Column names are canonicalized, so `"Population"` and `"population"`
    /// are equivalent.
    #[must_use]
    pub fn new<I, S>(key_column: &str, numeric_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            key_column: canonical_column_name(key_column),
            numeric_columns: numeric_columns
                .into_iter()
                .map(|c| canonical_column_name(c.as_ref()))
                .collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_rename(mut self, from: &str, to: &str) -> Self {
        self.renames
            .push((canonical_column_name(from), canonical_column_name(to)));
        self
    }

    #[must_use]
    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    #[must_use]
    pub fn with_summary_row(mut self, label: &str) -> Self {
        self.summary_row_label = Some(label.to_owned());
        self
    }
}

/// One district and its numeric values, aligned with the table's columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictRecord {
    pub district: String,
    pub values: Vec<f64>,
}

/// A normalized district table with unique keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedTable {
    key_column: String,
    columns: Vec<String>,
    records: Vec<DistrictRecord>,
}

impl NormalizedTable {
    #[must_use]
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Numeric column names, in the order values are stored in each record.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Records in source row order.
    #[must_use]
    pub fn records(&self) -> &[DistrictRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        let column = canonical_column_name(column);
        self.columns.iter().position(|c| *c == column)
    }

    /// Looks up a district by canonical name.
    #[must_use]
    pub fn get(&self, district: &str) -> Option<&DistrictRecord> {
        self.records.iter().find(|r| r.district == district)
    }

    /// Value of `column` for `district`, if both exist.
    #[must_use]
    pub fn value(&self, district: &str, column: &str) -> Option<f64> {
        let index = self.column_index(column)?;
        self.get(district).map(|r| r.values[index])
    }

    /// `(district, value)` pairs of one column, in record order.
    ///
    /// Returns `None` if the table has no such column.
    #[must_use]
    pub fn column_points(&self, column: &str) -> Option<Vec<(String, f64)>> {
        let index = self.column_index(column)?;
        Some(
            self.records
                .iter()
                .map(|r| (r.district.clone(), r.values[index]))
                .collect(),
        )
    }

    /// District names, in record order.
    pub fn districts(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(|r| r.district.as_str())
    }

    /// Renders the table back into raw form.
    #[must_use]
    pub fn to_raw_table(&self) -> RawTable {
        RawTable::new(
            std::iter::once(self.key_column.clone()).chain(self.columns.iter().cloned()),
            self.records.iter().map(|r| {
                std::iter::once(r.district.clone())
                    .chain(r.values.iter().map(f64::to_string))
                    .collect::<Vec<_>>()
            }),
        )
    }
}

/// Normalizes `raw` according to `spec`.
///
/// # Errors
///
/// * [`SchemaError::MissingColumn`] - the key or a numeric column is absent
/// * [`SchemaError::DuplicateKey`] - two kept rows resolve to the same district
///
/// # Examples
///
/// ```
/// use civicscope_data::{normalize::{NormalizeSpec, normalize}, table::RawTable};
///
/// let raw = RawTable::new(
///     ["District Name", "Total Individuals Worked"],
///     [["Kodagu", "5120"], ["Raichur", "n/a"], ["TOTAL", "5120"]],
/// );
/// let spec = NormalizeSpec::new("district", ["beneficiaries"])
///     .with_rename("district_name", "district")
///     .with_rename("total_individuals_worked", "beneficiaries")
///     .with_summary_row("Total");
///
/// let table = normalize(&raw, &spec)?;
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.value("KODAGU", "beneficiaries"), Some(5120.0));
/// # Ok::<(), civicscope_data::SchemaError>(())
/// ```
pub fn normalize(raw: &RawTable, spec: &NormalizeSpec) -> Result<NormalizedTable, SchemaError> {
    let renames = spec
        .renames
        .iter()
        .map(|(from, to)| (from.as_str(), to.as_str()))
        .collect::<HashMap<_, _>>();
    let headers = raw
        .headers
        .iter()
        .map(|h| {
            let name = canonical_column_name(h);
            match renames.get(name.as_str()) {
                Some(to) => (*to).to_owned(),
                None => name,
            }
        })
        .collect::<Vec<_>>();

    let find_column = |column: &str| {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| SchemaError::MissingColumn {
                column: column.to_owned(),
                available: headers.clone(),
            })
    };
    let key_index = find_column(&spec.key_column)?;
    let value_indices = spec
        .numeric_columns
        .iter()
        .map(|c| find_column(c))
        .collect::<Result<Vec<_>, _>>()?;

    let summary_key = spec.summary_row_label.as_deref().map(canonical_key);
    let mut seen = BTreeSet::new();
    let mut records = Vec::with_capacity(raw.len());
    for (row_index, row) in raw.rows.iter().enumerate() {
        let cell = |index: usize| row.get(index).map_or("", String::as_str);

        let key = canonical_key(cell(key_index));
        if key.is_empty() {
            tracing::debug!(row = row_index, "dropping row without a district");
            continue;
        }
        if summary_key.as_ref() == Some(&key) {
            tracing::debug!(row = row_index, district = %key, "dropping summary row");
            continue;
        }
        let district = spec.aliases.resolve(&key);

        let values = value_indices
            .iter()
            .map(|&index| parse_numeric(cell(index)))
            .collect::<Option<Vec<_>>>();
        let Some(values) = values else {
            tracing::debug!(
                row = row_index,
                district = %district,
                "dropping row with missing or non-numeric values"
            );
            continue;
        };

        if !seen.insert(district.clone()) {
            return Err(SchemaError::DuplicateKey { district });
        }
        records.push(DistrictRecord { district, values });
    }

    tracing::debug!(
        kept = records.len(),
        dropped = raw.len() - records.len(),
        "normalized table"
    );

    Ok(NormalizedTable {
        key_column: spec.key_column.clone(),
        columns: spec.numeric_columns.clone(),
        records,
    })
}

/// Canonical token form of a column header.
///
/// Trims, lower-cases, removes `.`, joins whitespace-separated words with `_`
/// and trims surrounding underscores.
///
/// # Examples
///
/// ```
/// use civicscope_data::normalize::canonical_column_name;
///
/// assert_eq!(canonical_column_name("  Number of Beneficiaries "), "number_of_beneficiaries");
/// assert_eq!(canonical_column_name("District Name."), "district_name");
/// assert_eq!(
///     canonical_column_name("2022-23 - Post-Matric Scholarships"),
///     "2022-23_-_post-matric_scholarships"
/// );
/// ```
#[must_use]
pub fn canonical_column_name(name: &str) -> String {
    name.to_lowercase()
        .replace('.', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .trim_matches('_')
        .to_owned()
}

/// Canonical form of a district key: trimmed, upper-cased, single-spaced.
///
/// # Examples
///
/// ```
/// use civicscope_data::normalize::canonical_key;
///
/// assert_eq!(canonical_key(" Bengaluru   Urban "), "BENGALURU URBAN");
/// ```
#[must_use]
pub fn canonical_key(key: &str) -> String {
    key.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a numeric cell.
///
/// Empty, malformed and non-finite cells are `None`. Zero is a value.
///
/// # Examples
///
/// ```
/// use civicscope_data::normalize::parse_numeric;
///
/// assert_eq!(parse_numeric(" 42 "), Some(42.0));
/// assert_eq!(parse_numeric("0"), Some(0.0));
/// assert_eq!(parse_numeric(""), None);
/// assert_eq!(parse_numeric("NA"), None);
/// assert_eq!(parse_numeric("inf"), None);
/// ```
#[must_use]
pub fn parse_numeric(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
