//! Canonical report model and payload normalization for the Data QA
//! dashboard.
//!
//! The backend has emitted at least five materially different JSON shapes
//! for "the results of a run" over the repository's history. This crate
//! collapses the ingestion logic that every screen used to re-implement
//! into one reusable core:
//! - [`shape`]: the canonical payload classifier, one precedence order
//! - [`group`]: deterministic per-mapping grouping of flat test rows
//! - [`summary`]: status tallying and the summary reconciliation policy
//! - [`normalize`]: raw payload of unknown shape → canonical [`Report`]
//! - [`history`]: stored history records → normalizer input
//! - [`submission`]: accepted AI suggestions → backend submission fields
//! - [`session`]: explicit session context and the session cache boundary
//!
//! Every transformation is pure, synchronous, and total over garbage input:
//! malformed rows are coerced and surfaced as report warnings rather than
//! dropped, and a corrupt history record never takes down its neighbors.

#![forbid(unsafe_code)]
#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::cast_possible_wrap
)]

pub mod error;
pub mod group;
pub mod history;
pub mod model;
pub mod normalize;
mod raw;
pub mod session;
pub mod shape;
pub mod submission;
pub mod summary;

pub use error::{Error, Result};
pub use model::{Report, ReportMode};
pub use normalize::{NormalizeOptions, normalize, normalize_with};
pub use session::SessionContext;
