use std::collections::BTreeMap;

use anyhow::Result;
use itertools::{izip, Itertools};
use log::{debug, warn};
use polars::prelude::*;

use crate::datastructures::*;
use crate::error::PipelineError;
use crate::reducer;

/// Minimum cost over all methods per `(problem group, instance)`.
pub type MinKnownTable = BTreeMap<(ProblemGroup, Instance), f64>;

/// One row per `(method, problem group, instance)`.
pub type RelativeErrorTable = Vec<RelativeError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    pub min_known: MinKnownTable,
    pub rel_errors: RelativeErrorTable,
}

/// Normalizes every entry of `tree` against the best cost known for its
/// instance.
///
/// The minimum known costs are computed from all methods first and are
/// only read afterwards.
pub fn normalize(tree: &ResultTree) -> Result<Normalization> {
    let min_known = min_known_costs(tree)?;
    let rel_errors = relative_errors(tree, &min_known)?;
    Ok(Normalization {
        min_known,
        rel_errors,
    })
}

/// Builds the minimum known cost of every instance in `tree`.
pub fn min_known_costs(tree: &ResultTree) -> Result<MinKnownTable> {
    let entries = best_per_entry(tree)?;
    if entries.height() == 0 {
        return Ok(MinKnownTable::new());
    }
    let min_known_df = entries
        .lazy()
        .groupby_stable([col("group"), col("instance")])
        .agg([col("best_cost").min().alias("min_known")])
        .collect()?;
    let groups = min_known_df.column("group")?.utf8()?.into_no_null_iter();
    let instances = min_known_df.column("instance")?.utf8()?.into_no_null_iter();
    let minima = min_known_df.column("min_known")?.f64()?.into_no_null_iter();
    let min_known: MinKnownTable = izip!(groups, instances, minima)
        .map(|(g, i, m)| ((g.to_string(), i.to_string()), m))
        .collect();
    debug!("Minimum known values: {min_known:?}");
    Ok(min_known)
}

/// Divides the best cost of every entry by its minimum known cost.
///
/// Fails if `min_known` does not cover an entry of `tree` or if any
/// relative error drops below 1.0, both mean that `min_known` was not
/// built from all of `tree`.
pub fn relative_errors(
    tree: &ResultTree,
    min_known: &MinKnownTable,
) -> Result<RelativeErrorTable> {
    let entries = best_per_entry(tree)?;
    if entries.height() == 0 {
        return Ok(RelativeErrorTable::new());
    }
    for ((group, instance), &min) in min_known {
        if min <= 0.0 {
            return Err(PipelineError::NonPositiveMinimum {
                group: group.clone(),
                instance: instance.clone(),
                min_known: min,
            }
            .into());
        }
    }
    let min_known_df = df! {
        "group" => min_known.keys().map(|(g, _)| g.as_str()).collect_vec(),
        "instance" => min_known.keys().map(|(_, i)| i.as_str()).collect_vec(),
        "min_known" => min_known.values().copied().collect_vec(),
    }?;
    let keys = [col("group"), col("instance")];
    let rel_df = entries
        .lazy()
        .join(min_known_df.lazy(), keys.clone(), keys, JoinType::Left)
        .with_column((col("best_cost") / col("min_known")).alias("rel_error"))
        .sort_by_exprs(
            [col("method"), col("group"), col("instance")],
            vec![false; 3],
            false,
        )
        .collect()?;

    let methods = rel_df.column("method")?.utf8()?.into_no_null_iter();
    let groups = rel_df.column("group")?.utf8()?.into_no_null_iter();
    let instances = rel_df.column("instance")?.utf8()?.into_no_null_iter();
    let best_costs = rel_df.column("best_cost")?.f64()?.into_no_null_iter();
    let total_times = rel_df.column("total_time")?.f64()?.into_no_null_iter();
    let minima = rel_df.column("min_known")?.f64()?.into_iter();
    let ratios = rel_df.column("rel_error")?.f64()?.into_iter();
    izip!(
        methods,
        groups,
        instances,
        best_costs,
        total_times,
        minima.zip(ratios)
    )
    .map(|(method, group, instance, best_cost, total_time, (min, ratio))| {
        checked_relative_error(
            RelativeError {
                method: method.to_string(),
                group: group.to_string(),
                instance: instance.to_string(),
                best_cost,
                rel_error: ratio.unwrap_or(f64::NAN),
                total_time,
            },
            min,
        )
    })
    .collect()
}

fn checked_relative_error(
    row: RelativeError,
    min_known: Option<f64>,
) -> Result<RelativeError> {
    let Some(min_known) = min_known else {
        return Err(PipelineError::MissingMinimum {
            group: row.group,
            instance: row.instance,
        }
        .into());
    };
    if row.rel_error < 1.0 {
        return Err(PipelineError::InvariantViolation {
            method: row.method,
            group: row.group,
            instance: row.instance,
            best_cost: row.best_cost,
            min_known,
            rel_error: row.rel_error,
        }
        .into());
    }
    Ok(row)
}

/// Averages relative error and time over the instances of each
/// `(method, problem group, instance family)`, see [`instance_family`].
pub fn summarize(rel_errors: &[RelativeError]) -> Result<Vec<GroupSummary>> {
    if rel_errors.is_empty() {
        return Ok(Vec::new());
    }
    let df = df! {
        "method" => rel_errors.iter().map(|r| r.method.as_str()).collect_vec(),
        "group" => rel_errors.iter().map(|r| r.group.as_str()).collect_vec(),
        "instance_family" => rel_errors
            .iter()
            .map(|r| instance_family(&r.instance))
            .collect_vec(),
        "instance" => rel_errors.iter().map(|r| r.instance.as_str()).collect_vec(),
        "rel_error" => rel_errors.iter().map(|r| r.rel_error).collect_vec(),
        "total_time" => rel_errors.iter().map(|r| r.total_time).collect_vec(),
    }?;
    let keys = [col("method"), col("group"), col("instance_family")];
    let summary_df = df
        .lazy()
        .groupby_stable(keys.clone())
        .agg([
            col("rel_error").mean().alias("mean_rel_error"),
            col("total_time").mean().alias("mean_time"),
            col("instance").count().alias("num_instances"),
        ])
        .sort_by_exprs(keys, vec![false; 3], false)
        .collect()?;
    let methods = summary_df.column("method")?.utf8()?.into_no_null_iter();
    let groups = summary_df.column("group")?.utf8()?.into_no_null_iter();
    let families = summary_df
        .column("instance_family")?
        .utf8()?
        .into_no_null_iter();
    let mean_rel_errors = summary_df
        .column("mean_rel_error")?
        .f64()?
        .into_no_null_iter();
    let mean_times = summary_df.column("mean_time")?.f64()?.into_no_null_iter();
    let counts = summary_df
        .column("num_instances")?
        .cast(&DataType::UInt32)?;
    Ok(izip!(
        methods,
        groups,
        families,
        mean_rel_errors,
        mean_times,
        counts.u32()?.into_no_null_iter()
    )
    .map(
        |(method, group, family, mean_rel_error, mean_time, num_instances)| {
            GroupSummary {
                method: method.to_string(),
                group: group.to_string(),
                instance_family: family.to_string(),
                mean_rel_error,
                mean_time,
                num_instances,
            }
        },
    )
    .collect())
}

/// Collects the summaries of methods sharing a family into series ordered
/// by their budget, one per group and instance family. Methods without a
/// budget suffix are left out.
pub fn budget_series(summaries: &[GroupSummary]) -> Vec<BudgetSeries> {
    let mut series: BTreeMap<(String, ProblemGroup, String), Vec<BudgetPoint>> =
        BTreeMap::new();
    for summary in summaries {
        let MethodName { family, budget } = MethodName::parse(&summary.method);
        if let Some(budget) = budget {
            series
                .entry((
                    family,
                    summary.group.clone(),
                    summary.instance_family.clone(),
                ))
                .or_default()
                .push(BudgetPoint {
                    budget,
                    mean_rel_error: summary.mean_rel_error,
                    mean_time: summary.mean_time,
                });
        }
    }
    series
        .into_iter()
        .map(|((family, group, instance_family), mut points)| {
            points.sort_by(|a, b| a.budget.total_cmp(&b.budget));
            BudgetSeries {
                family,
                group,
                instance_family,
                points,
            }
        })
        .collect()
}

/// One row per tree entry with its best cost and total time.
fn best_per_entry(tree: &ResultTree) -> Result<DataFrame> {
    let mut methods = Vec::new();
    let mut groups = Vec::new();
    let mut instances = Vec::new();
    let mut best_costs = Vec::new();
    let mut total_times = Vec::new();
    for (method, results) in tree {
        for (group, entries) in &results.vals {
            for (instance, entry) in entries {
                let Some(compacted) = reducer::compact(entry) else {
                    warn!("Skipping empty entry {method}: {group}/{instance}");
                    continue;
                };
                methods.push(method.as_str());
                groups.push(group.as_str());
                instances.push(instance.as_str());
                best_costs.push(compacted.cost);
                total_times.push(compacted.time);
            }
        }
    }
    Ok(df! {
        "method" => methods,
        "group" => groups,
        "instance" => instances,
        "best_cost" => best_costs,
        "total_time" => total_times,
    }?)
}
