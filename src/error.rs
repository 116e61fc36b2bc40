use core::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::dialect::ParseFailure;

/// Conditions that abort the whole pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A log of a dialect whose failures are fatal could not be parsed
    #[error("Parse error on: {}", .path.display())]
    HardParseFailure {
        /// Offending log file
        path: PathBuf,
        /// What was wrong with it
        #[source]
        source: ParseFailure,
    },

    /// A relative error below 1.0, i.e. the minimum known cost table was
    /// not built from every method
    #[error(
        "Relative error {rel_error} < 1.0 for {method} on {group}/{instance} \
         (best cost {best_cost}, minimum known {min_known})"
    )]
    InvariantViolation {
        /// Method of the row
        method: String,
        /// Problem group of the row
        group: String,
        /// Instance of the row
        instance: String,
        /// Best cost of the method on the instance
        best_cost: f64,
        /// Minimum cost over all methods
        min_known: f64,
        /// `best_cost / min_known`
        rel_error: f64,
    },

    /// An entry without a minimum known cost for its instance
    #[error("No minimum known cost for {group}/{instance}")]
    MissingMinimum {
        /// Problem group
        group: String,
        /// Instance
        instance: String,
    },

    /// Relative errors are undefined for non-positive minima
    #[error(
        "Minimum known cost {min_known} of {group}/{instance} is not positive"
    )]
    NonPositiveMinimum {
        /// Problem group
        group: String,
        /// Instance
        instance: String,
        /// The offending minimum
        min_known: f64,
    },
}

/// Non-fatal conditions collected while building a result tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Something in the directory layout that was not a run log
    StructuralSkip {
        /// Skipped path
        path: PathBuf,
        /// Why it was skipped
        reason: String,
    },
    /// A record of a dialect with non-fatal failures that was dropped
    SoftParseFailure {
        /// Dropped log file
        path: PathBuf,
        /// Description of the failure
        reason: String,
    },
    /// A method lacks instances other methods have in the same group
    IncompleteCoverage {
        /// Incomplete method
        method: String,
        /// Problem group
        group: String,
        /// Number of instances the method has
        found: usize,
        /// Number of instances known for the group
        expected: usize,
        /// Instances the method lacks
        missing: Vec<String>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::StructuralSkip { path, reason } => {
                write!(f, "Skipping {}: {reason}", path.display())
            }
            Diagnostic::SoftParseFailure { path, reason } => {
                write!(f, "Parse error on: {} ({reason})", path.display())
            }
            Diagnostic::IncompleteCoverage {
                method,
                group,
                found,
                expected,
                ..
            } => write!(f, "{method} incomplete for {group}: {found}/{expected}"),
        }
    }
}
