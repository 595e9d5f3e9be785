//! SQLite catalog for comic libraries.
//!
//! The catalog records what a scan has found so far: libraries (a root
//! directory), the series directly beneath each root, and the issues
//! (archives or image folders) inside each series. The filesystem is the
//! source of truth; every row is keyed by its absolute path, so rescanning
//! an unchanged library finds every row again instead of duplicating it.
//!
//! Alongside the catalog proper lives a small key/value `config` table,
//! used for the persisted scan flag.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::models::{Issue, IssueFormat, Library, NewIssue, ScanState, Series, SeriesSummary};
pub use crate::repo::{Counts, Repository};
