//! # Analysis Module
//!
//! Everything between a parsed event stream and the feature table.
//!
//! ## Submodules
//!
//! - `zones` - Zone classification of pitch coordinates
//! - `predicates` - Typed event predicates and the conjunctive filter
//! - `possession` - Possession segmentation
//! - `windows` - Match clock and elapsed-time windows
//! - `features` - Feature registry, one submodule per category
//! - `bypass` - Possession-level bypass labels
//! - `composite` - Normalization, composite indices, risk flags
//! - `pipeline` - Aggregation keys and the batch extraction run
//! - `stream` - Incremental extraction for live matches

pub mod bypass;
pub mod composite;
pub mod features;
pub mod pipeline;
pub mod possession;
pub mod predicates;
pub mod stream;
pub mod windows;
pub mod zones;
