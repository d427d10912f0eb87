//! District dataset ingestion: raw tables, canonicalization and joins
//!
//! This crate turns loosely formatted district tables (as exported by state
//! open-data portals) into keyed numeric tables that can be joined and
//! compared.
//!
//! # Pipeline
//!
//! 1. **Raw Table** ([`table::RawTable`]): header row plus string cells
//! 2. **Normalize** ([`normalize::normalize`]): canonical column names, summary
//!    row removal, upper-cased and alias-resolved district keys, numeric parsing
//! 3. **Join** ([`join::join_and_derive_ratio`]): inner join of two normalized
//!    tables and derivation of a ratio such as beneficiaries per capita
//!
//! # Examples
//!
//! ```
//! use civicscope_data::{
//!     alias::AliasTable,
//!     join::join_and_derive_ratio,
//!     normalize::{NormalizeSpec, normalize},
//!     table::RawTable,
//! };
//!
//! let kisan = RawTable::new(
//!     ["District", "Number of Beneficiaries"],
//!     [["Mysore", "120"], ["Udupi", "60"], ["Total", "180"]],
//! );
//! let population = RawTable::new(
//!     ["District", "Population"],
//!     [["MYSURU", "1000"], ["UDUPI", "600"]],
//! );
//!
//! let kisan = normalize(
//!     &kisan,
//!     &NormalizeSpec::new("district", ["number_of_beneficiaries"])
//!         .with_aliases(AliasTable::karnataka())
//!         .with_summary_row("TOTAL"),
//! )?;
//! let population = normalize(&population, &NormalizeSpec::new("district", ["population"]))?;
//!
//! let joined = join_and_derive_ratio(
//!     &kisan,
//!     &population,
//!     "district",
//!     "number_of_beneficiaries",
//!     "population",
//! )?;
//! assert_eq!(joined.records.len(), 2);
//! assert_eq!(joined.records[0].district, "MYSURU");
//! assert_eq!(joined.records[0].ratio, 0.12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod alias;
pub mod join;
pub mod normalize;
pub mod table;

/// A required part of a table's schema is absent or violated.
///
/// This is never recoverable by the normalizer itself: the caller has loaded
/// a file with a different layout than expected, or the alias table merges
/// two source rows into one district.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SchemaError {
    #[display("required column '{column}' not found (available: {})", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
    #[display("district '{district}' appears more than once after alias resolution")]
    DuplicateKey { district: String },
}

/// An inner join matched no districts at all.
///
/// Distinct from a join that matched districts whose ratio turned out to be
/// undefined: an empty join almost always means the two sources spell
/// district names differently.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display(
    "join on '{key}' matched no districts ({left_rows} rows left, {right_rows} rows right); district names do not match"
)]
pub struct EmptyJoinError {
    pub key: String,
    pub left_rows: usize,
    pub right_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum JoinError {
    #[display("schema mismatch: {_0}")]
    Schema(SchemaError),
    #[display("{_0}")]
    EmptyJoin(EmptyJoinError),
}
