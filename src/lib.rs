#![warn(missing_docs)]
//! Collect the results of combinatorial optimization solvers from their logs.
//!
//! Solver runs are expected in a directory tree of the form
//! `<root>/<method>/<group>[/...]/<instance>`, where every file is the log of
//! one run and a `call.txt` somewhere on the path of a method holds the
//! command line used to produce it. Three log dialects are understood: the
//! restart based divide-and-conquer/beam/GRASP/search family (`# RST` and
//! `# CPU_TIME` lines), POPSTAR (`cputime`, `bestsol`) and CMCS (`Time:`,
//! `Solution found:`). The dialect of a method is derived from its name.
//!
//! The logs are collected into a [`datastructures::ResultTree`], which
//! serializes to the json interchange format consumed by the plotting and
//! tabulation scripts. The [`normalizer`] turns a tree into relative errors
//! against the best cost known for each instance.
//!
//! Example
//! ```rust
//! use solver_results::datastructures::Config;
//! use solver_results::{normalizer, tree_builder};
//! # use std::path::Path;
//! # use anyhow::Result;
//!
//! fn example() -> Result<()> {
//!     let config = Config::default(); // compacts restarts, reads call.txt
//!     let output = tree_builder::build(Path::new("results"), &config)?;
//!     for diagnostic in &output.diagnostics {
//!         println!("{diagnostic}");
//!     }
//!
//!     // the tree implements serde::{Serialize, Deserialize}
//!     println!("{}", serde_json::to_string_pretty(&output.tree)?);
//!
//!     let normalization = normalizer::normalize(&output.tree)?;
//!     for summary in normalizer::summarize(&normalization.rel_errors)? {
//!         println!("{summary}");
//!     }
//!     Ok(())
//! }
//! ```

/// Data structures shared by all stages, including the json interchange
/// format and the configuration.
pub mod datastructures;

/// Recognition of solver log dialects and extraction of raw records.
pub mod dialect;

/// Fatal errors and non-fatal diagnostics.
pub mod error;

/// Normalization of a result tree against the best known costs.
pub mod normalizer;

/// Compaction of restart records into tree entries.
pub mod reducer;

/// Construction of a result tree from a directory of solver logs.
pub mod tree_builder;
