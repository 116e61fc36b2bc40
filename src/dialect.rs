use core::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::datastructures::Observation;

static RESTART_CPU_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"# CPU_TIME:?\s+(\S+)").expect("valid regex"));
static RESTART_RST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"# RST:?\s+(\S+)\s+(\S+)\s+(\S+)").expect("valid regex"));
static POPSTAR_CPU_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"cputime (\S+)").expect("valid regex"));
static POPSTAR_BEST_SOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"bestsol (\S+)").expect("valid regex"));
static CMCS_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Time: (\S+)").expect("valid regex"));
static CMCS_SOLUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Solution found: (\S+)").expect("valid regex"));

/// Log formats of the supported solver families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Divide-and-conquer, beam, GRASP and search variants printing one
    /// `# RST` line per restart and a total `# CPU_TIME`.
    Restart,
    /// POPSTAR facility location solver (`cputime`, `bestsol`).
    Popstar,
    /// CMCS reference solver (`Time:`, `Solution found:`).
    Cmcs,
}

/// Raw records of one log, before restarts are reduced.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRun {
    Restarts {
        restarts: Vec<Observation>,
        cpu_time: f64,
    },
    Single(Observation),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseFailure {
    #[error("marker `{marker}` not found")]
    MissingMarker { marker: &'static str },
    #[error("malformed value `{token}` for marker `{marker}`")]
    MalformedNumber { marker: &'static str, token: String },
}

impl Dialect {
    /// Resolves the dialect from a method name.
    ///
    /// Names are matched by case-sensitive substring in fixed precedence:
    /// `dc`, `grasp` or `search` first, then `popstar`, then `cmcs`.
    pub fn from_method(method: &str) -> Option<Dialect> {
        if ["dc", "grasp", "search"].iter().any(|s| method.contains(s)) {
            Some(Dialect::Restart)
        } else if method.contains("popstar") {
            Some(Dialect::Popstar)
        } else if method.contains("cmcs") {
            Some(Dialect::Cmcs)
        } else {
            None
        }
    }

    /// Whether a failed parse must abort the whole run.
    pub fn failure_is_fatal(&self) -> bool {
        match self {
            Dialect::Restart | Dialect::Popstar => true,
            Dialect::Cmcs => false,
        }
    }

    pub fn parse(&self, text: &str) -> Result<RawRun, ParseFailure> {
        match self {
            Dialect::Restart => {
                let restarts = RESTART_RST
                    .captures_iter(text)
                    .map(|caps| {
                        let cost = parse_value("# RST", &caps[2])?;
                        let time = parse_time("# RST", &caps[3])?;
                        Ok(Observation::new(-cost, time))
                    })
                    .collect::<Result<Vec<_>, ParseFailure>>()?;
                let cpu_time =
                    first_time(&RESTART_CPU_TIME, "# CPU_TIME", text)?;
                Ok(RawRun::Restarts { restarts, cpu_time })
            }
            Dialect::Popstar => {
                let time = first_time(&POPSTAR_CPU_TIME, "cputime", text)?;
                let cost = first_value(&POPSTAR_BEST_SOL, "bestsol", text)?;
                Ok(RawRun::Single(Observation::new(cost, time)))
            }
            Dialect::Cmcs => {
                let time = first_time(&CMCS_TIME, "Time:", text)?;
                let cost =
                    first_value(&CMCS_SOLUTION, "Solution found:", text)?;
                Ok(RawRun::Single(Observation::new(cost, time)))
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Restart => "restart",
            Dialect::Popstar => "popstar",
            Dialect::Cmcs => "cmcs",
        };
        write!(f, "{name}")
    }
}

fn first_value(
    re: &Regex,
    marker: &'static str,
    text: &str,
) -> Result<f64, ParseFailure> {
    let caps = re
        .captures(text)
        .ok_or(ParseFailure::MissingMarker { marker })?;
    parse_value(marker, &caps[1])
}

fn first_time(
    re: &Regex,
    marker: &'static str,
    text: &str,
) -> Result<f64, ParseFailure> {
    let caps = re
        .captures(text)
        .ok_or(ParseFailure::MissingMarker { marker })?;
    parse_time(marker, &caps[1])
}

fn parse_value(marker: &'static str, token: &str) -> Result<f64, ParseFailure> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ParseFailure::MalformedNumber {
            marker,
            token: token.to_string(),
        }),
    }
}

fn parse_time(marker: &'static str, token: &str) -> Result<f64, ParseFailure> {
    match parse_value(marker, token)? {
        time if time >= 0.0 => Ok(time),
        _ => Err(ParseFailure::MalformedNumber {
            marker,
            token: token.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests;
