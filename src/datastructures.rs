use core::fmt;
use std::{collections::BTreeMap, fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use serde::{Deserialize, Serialize};

/// Name of a method directory, e.g. `dc-best8_100`.
pub type Method = String;

/// Key of a problem group below a method, e.g. `problems_kg_custom`.
pub type ProblemGroup = String;

/// Key of a single problem instance (the run log file name).
pub type Instance = String;

/// A single `(cost, time)` record.
///
/// Serialized as the two element array `[cost, time]`. The cost is only
/// allowed to be `+inf` while restarts are being compacted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Observation {
    pub cost: f64,
    pub time: f64,
}

impl Observation {
    pub fn new(cost: f64, time: f64) -> Self {
        Self { cost, time }
    }
}

impl From<(f64, f64)> for Observation {
    fn from((cost, time): (f64, f64)) -> Self {
        Self::new(cost, time)
    }
}

impl From<Observation> for (f64, f64) {
    fn from(observation: Observation) -> Self {
        (observation.cost, observation.time)
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.cost, self.time)
    }
}

/// Results of one method: the invocation used and the per instance entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodResults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,
    pub vals: BTreeMap<ProblemGroup, BTreeMap<Instance, Vec<Observation>>>,
}

impl MethodResults {
    pub fn num_instances(&self) -> usize {
        self.vals.values().map(BTreeMap::len).sum()
    }
}

/// The canonical interchange structure, keyed by method name.
pub type ResultTree = BTreeMap<Method, MethodResults>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_compact_restarts")]
    pub compact_restarts: bool,
    #[serde(default = "default_call_file")]
    pub call_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compact_restarts: default_compact_restarts(),
            call_file: default_call_file(),
        }
    }
}

impl Config {
    pub fn from_cli(args: &Args) -> Result<Config> {
        let mut config = match &args.config {
            Some(config_path) => {
                let config_str = fs::read_to_string(config_path)
                    .with_context(|| {
                        format!("Failed to read config {config_path:?}")
                    })?;
                serde_json::from_str(&config_str)?
            }
            None => Config::default(),
        };
        if args.no_compact {
            config.compact_restarts = false;
        }
        if let Some(call_file) = &args.call_file {
            config.call_file = call_file.clone();
        }
        if config.call_file.is_empty() {
            anyhow::bail!("The call file name must not be empty");
        }
        Ok(config)
    }
}

fn default_compact_restarts() -> bool {
    true
}

fn default_call_file() -> String {
    "call.txt".to_string()
}

#[derive(Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Root folder of the solver output (<method>/<group>/<instance>)
    pub input_folder: PathBuf,
    /// Path of the json file to write
    pub output_json: PathBuf,
    /// Path to an optional json config
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Keep every restart as its own entry instead of compacting them
    #[arg(long)]
    pub no_compact: bool,
    /// Name of the file holding the solver invocation of a method
    #[arg(long, value_name = "NAME")]
    pub call_file: Option<String>,
    #[command(flatten)]
    pub verbosity: Verbosity,
}

/// Result of one normalization row, see [`crate::normalizer`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RelativeError {
    pub method: Method,
    pub group: ProblemGroup,
    pub instance: Instance,
    pub best_cost: f64,
    pub rel_error: f64,
    pub total_time: f64,
}

/// Size class of an instance: the second `_`-separated field of its name, up
/// to the first `-` (`kg_250a-1.txt` belongs to `250a`). Names without a `_`
/// form a class of their own.
pub fn instance_family(instance: &str) -> String {
    match instance.split('_').nth(1) {
        Some(field) => field.split('-').next().unwrap_or(field).to_string(),
        None => instance.to_string(),
    }
}

/// Outer average of the relative errors of one method over the instances of
/// one family within a group.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GroupSummary {
    pub method: Method,
    pub group: ProblemGroup,
    pub instance_family: String,
    pub mean_rel_error: f64,
    pub mean_time: f64,
    pub num_instances: u32,
}

impl fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} ({}): rel. error {:.6}, time {:.2} ({} instances)",
            self.method,
            self.group,
            self.instance_family,
            self.mean_rel_error,
            self.mean_time,
            self.num_instances
        )
    }
}

/// A method name split into its family and its numeric budget suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodName {
    pub family: String,
    pub budget: Option<f64>,
}

impl MethodName {
    pub fn parse(method: &str) -> Self {
        match method.rsplit_once('_') {
            Some((family, suffix)) => match suffix.parse::<f64>() {
                Ok(budget) if budget.is_finite() => Self {
                    family: family.to_string(),
                    budget: Some(budget),
                },
                _ => Self {
                    family: method.to_string(),
                    budget: None,
                },
            },
            None => Self {
                family: method.to_string(),
                budget: None,
            },
        }
    }
}

/// One point of a [`BudgetSeries`].
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BudgetPoint {
    pub budget: f64,
    pub mean_rel_error: f64,
    pub mean_time: f64,
}

/// Summaries of a method family on one instance family of a group, ordered
/// by budget.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BudgetSeries {
    pub family: String,
    pub group: ProblemGroup,
    pub instance_family: String,
    pub points: Vec<BudgetPoint>,
}
