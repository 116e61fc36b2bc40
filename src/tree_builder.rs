use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, error, info, warn};

use crate::datastructures::*;
use crate::dialect::Dialect;
use crate::error::{Diagnostic, PipelineError};
use crate::reducer;

/// A result tree together with everything that was skipped on the way.
#[derive(Debug)]
pub struct BuildOutput {
    pub tree: ResultTree,
    pub diagnostics: Vec<Diagnostic>,
}

/// Position of a terminal directory below the root.
#[derive(Debug, Clone, PartialEq)]
struct RunLocation {
    method: Method,
    group: ProblemGroup,
}

impl RunLocation {
    /// `segments` are the directory names below the root. The first one is
    /// the method, the remaining ones joined by `/` form the group.
    fn from_segments(segments: &[String]) -> Option<Self> {
        match segments {
            [method, group @ ..] if !group.is_empty() => Some(Self {
                method: method.clone(),
                group: group.join("/"),
            }),
            _ => None,
        }
    }
}

struct TreeBuilder<'a> {
    config: &'a Config,
    tree: ResultTree,
    diagnostics: Vec<Diagnostic>,
    unknown_methods: BTreeSet<Method>,
}

/// Walks `root` and parses every run log into a [`ResultTree`].
///
/// Fails on the first log whose dialect treats parse errors as fatal, all
/// other problems end up in [`BuildOutput::diagnostics`].
pub fn build(root: &Path, config: &Config) -> Result<BuildOutput> {
    info!("Reading solver output from {}", root.display());
    let mut builder = TreeBuilder {
        config,
        tree: ResultTree::new(),
        diagnostics: Vec::new(),
        unknown_methods: BTreeSet::new(),
    };
    builder.visit(root, &mut Vec::new(), None)?;
    let TreeBuilder {
        tree,
        mut diagnostics,
        ..
    } = builder;
    for diagnostic in coverage_diagnostics(&tree) {
        warn!("{diagnostic}");
        diagnostics.push(diagnostic);
    }
    info!(
        "Parsed {} methods with {} entries ({} diagnostics)",
        tree.len(),
        tree.values().map(MethodResults::num_instances).sum::<usize>(),
        diagnostics.len()
    );
    Ok(BuildOutput { tree, diagnostics })
}

impl TreeBuilder<'_> {
    fn visit(
        &mut self,
        dir: &Path,
        segments: &mut Vec<String>,
        inherited_call: Option<&str>,
    ) -> Result<()> {
        let (subdirs, files) = list_dir(dir)?;
        let call_file = files
            .iter()
            .find(|f| is_named(f, &self.config.call_file));
        let call = match call_file {
            Some(call_path) => Some(
                fs::read_to_string(call_path).with_context(|| {
                    format!("Failed to read {}", call_path.display())
                })?,
            ),
            None => inherited_call.map(str::to_string),
        };

        if !subdirs.is_empty() {
            for subdir in subdirs {
                segments.push(file_name(&subdir));
                self.visit(&subdir, segments, call.as_deref())?;
                segments.pop();
            }
            return Ok(());
        }

        match RunLocation::from_segments(segments) {
            Some(location) => {
                self.visit_terminal(dir, location, &files, call.as_deref())
            }
            None => {
                record(
                    &mut self.diagnostics,
                    Diagnostic::StructuralSkip {
                        path: dir.to_path_buf(),
                        reason: "directory is too shallow for <method>/<group>"
                            .to_string(),
                    },
                );
                Ok(())
            }
        }
    }

    fn visit_terminal(
        &mut self,
        dir: &Path,
        location: RunLocation,
        files: &[PathBuf],
        call: Option<&str>,
    ) -> Result<()> {
        let Some(dialect) = Dialect::from_method(&location.method) else {
            if self.unknown_methods.insert(location.method.clone()) {
                record(
                    &mut self.diagnostics,
                    Diagnostic::StructuralSkip {
                        path: dir.to_path_buf(),
                        reason: format!(
                            "no log dialect for method {}",
                            location.method
                        ),
                    },
                );
            }
            return Ok(());
        };
        debug!(
            "Parsing {} as {dialect} logs of {}",
            dir.display(),
            location.method
        );

        let results = self
            .tree
            .entry(location.method.clone())
            .or_insert_with(MethodResults::default);
        if results.call.is_none() {
            results.call = call.map(str::to_string);
        }
        let instances = results.vals.entry(location.group).or_default();

        for path in files
            .iter()
            .filter(|f| !is_named(f, &self.config.call_file))
        {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let text = String::from_utf8_lossy(&bytes);
            match dialect.parse(&text) {
                Ok(run) => {
                    match reducer::reduce(run, self.config.compact_restarts) {
                        Some(entry) => {
                            instances.insert(file_name(path), entry);
                        }
                        None => record(
                            &mut self.diagnostics,
                            Diagnostic::SoftParseFailure {
                                path: path.clone(),
                                reason: "log has no restart records".to_string(),
                            },
                        ),
                    }
                }
                Err(failure) if dialect.failure_is_fatal() => {
                    error!("Parse error on: {} ({failure})", path.display());
                    return Err(PipelineError::HardParseFailure {
                        path: path.clone(),
                        source: failure,
                    }
                    .into());
                }
                Err(failure) => record(
                    &mut self.diagnostics,
                    Diagnostic::SoftParseFailure {
                        path: path.clone(),
                        reason: failure.to_string(),
                    },
                ),
            }
        }
        Ok(())
    }
}

/// Warns about methods lacking instances other methods have in a group.
/// A method without any run in a group counts as having none of them.
pub fn coverage_diagnostics(tree: &ResultTree) -> Vec<Diagnostic> {
    let mut known: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for results in tree.values() {
        for (group, instances) in &results.vals {
            known
                .entry(group.as_str())
                .or_default()
                .extend(instances.keys().map(String::as_str));
        }
    }
    tree.iter()
        .flat_map(|(method, results)| {
            known.iter().filter_map(move |(&group, expected)| {
                let instances = results.vals.get(group);
                let has =
                    |i: &str| instances.map_or(false, |m| m.contains_key(i));
                let missing = expected
                    .iter()
                    .filter(|i| !has(**i))
                    .map(|i| i.to_string())
                    .collect_vec();
                (!missing.is_empty()).then(|| Diagnostic::IncompleteCoverage {
                    method: method.clone(),
                    group: group.to_string(),
                    found: instances.map_or(0, BTreeMap::len),
                    expected: expected.len(),
                    missing,
                })
            })
        })
        .collect()
}

fn record(diagnostics: &mut Vec<Diagnostic>, diagnostic: Diagnostic) {
    warn!("{diagnostic}");
    diagnostics.push(diagnostic);
}

/// Sorted subdirectories and files of `dir`. Symlinked directories are not
/// followed, symlinked files are read like regular ones.
fn list_dir(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_file()
            || (file_type.is_symlink() && path.is_file())
        {
            files.push(path);
        } else {
            debug!("Not following {}", path.display());
        }
    }
    subdirs.sort();
    files.sort();
    Ok((subdirs, files))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_named(path: &Path, name: &str) -> bool {
    path.file_name().map_or(false, |n| n == name)
}

#[cfg(test)]
mod tests;
