use std::{fs, path::Path};

use super::{build, coverage_diagnostics, RunLocation};
use crate::{datastructures::*, error::Diagnostic, error::PipelineError};

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_run_location() {
    let segments = ["dc-best8_100", "problems_kg", "250a"].map(String::from);
    assert_eq!(
        RunLocation::from_segments(&segments),
        Some(RunLocation {
            method: "dc-best8_100".into(),
            group: "problems_kg/250a".into(),
        })
    );
    assert_eq!(RunLocation::from_segments(&segments[..1]), None);
    assert_eq!(RunLocation::from_segments(&[]), None);
}

#[test]
fn test_restart_scenario() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "dc-best8_100/call.txt", "./dc2 -b 8 -k 100");
    write(
        root.path(),
        "dc-best8_100/problems/p1.txt",
        "# RST 0 -10 2\n# RST 1 -8 3\n# CPU_TIME 6.5\n",
    );
    let output = build(root.path(), &Config::default()).unwrap();
    let results = &output.tree["dc-best8_100"];
    assert_eq!(results.call.as_deref(), Some("./dc2 -b 8 -k 100"));
    assert_eq!(
        results.vals["problems"]["p1.txt"],
        vec![Observation::new(8.0, 6.5)]
    );
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_restarts_kept_without_compaction() {
    let root = tempfile::tempdir().unwrap();
    write(
        root.path(),
        "search-rand_8/problems/p1.txt",
        "# RST 0 -10 2\n# RST 1 -8 3\n# CPU_TIME 6.5\n",
    );
    let config = Config {
        compact_restarts: false,
        ..Config::default()
    };
    let output = build(root.path(), &config).unwrap();
    assert_eq!(
        output.tree["search-rand_8"].vals["problems"]["p1.txt"],
        vec![Observation::new(10.0, 3.5), Observation::new(8.0, 3.0)]
    );
    assert_eq!(output.tree["search-rand_8"].call, None);
}

#[test]
fn test_nested_group_and_inherited_call() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "popstar-S_1/call.txt", "popstar -S");
    write(root.path(), "popstar-S_1/kg/250a/p1.txt", "cputime 2\nbestsol 7\n");
    write(root.path(), "popstar-S_1/kg/250b/p1.txt", "cputime 3\nbestsol 9\n");
    let output = build(root.path(), &Config::default()).unwrap();
    let results = &output.tree["popstar-S_1"];
    assert_eq!(results.call.as_deref(), Some("popstar -S"));
    assert_eq!(
        results.vals.keys().collect::<Vec<_>>(),
        vec!["kg/250a", "kg/250b"]
    );
    assert_eq!(results.vals["kg/250b"]["p1.txt"], vec![Observation::new(9.0, 3.0)]);
}

#[test]
fn test_structural_skips() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "stray.txt", "not a run");
    write(root.path(), "dc-shallow/p1.txt", "# CPU_TIME 1\n");
    write(root.path(), "ds-standard/problems/p1.txt", "whatever");
    let output = build(root.path(), &Config::default()).unwrap();
    assert!(output.tree.is_empty());
    assert_eq!(output.diagnostics.len(), 2);
    assert!(output
        .diagnostics
        .iter()
        .all(|d| matches!(d, Diagnostic::StructuralSkip { .. })));
}

#[test]
fn test_popstar_failure_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "popstar-L_1/problems/p1.txt", "cputime 2\n");
    let err = build(root.path(), &Config::default()).unwrap_err();
    match err.downcast_ref::<PipelineError>() {
        Some(PipelineError::HardParseFailure { path, .. }) => {
            assert!(path.ends_with("popstar-L_1/problems/p1.txt"))
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_cmcs_failure_drops_record() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "cmcs-3comp/problems/p1.txt", "Time: 1.5\n");
    write(
        root.path(),
        "cmcs-3comp/problems/p2.txt",
        "Solution found: 42\nTime: 1.5\n",
    );
    let output = build(root.path(), &Config::default()).unwrap();
    let instances = &output.tree["cmcs-3comp"].vals["problems"];
    assert!(!instances.contains_key("p1.txt"));
    assert_eq!(instances["p2.txt"], vec![Observation::new(42.0, 1.5)]);
    assert!(matches!(
        output.diagnostics.as_slice(),
        [Diagnostic::SoftParseFailure { .. }]
    ));
}

#[test]
fn test_restart_log_without_restarts_is_dropped() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "dc-x_1/problems/p1.txt", "# CPU_TIME 2\n");
    let output = build(root.path(), &Config::default()).unwrap();
    assert!(output.tree["dc-x_1"].vals["problems"].is_empty());
    assert!(matches!(
        output.diagnostics.as_slice(),
        [Diagnostic::SoftParseFailure { .. }]
    ));
}

#[test]
fn test_coverage_diagnostics() {
    let mut tree = ResultTree::new();
    for (method, instances) in
        [("dc-a_1", vec!["p1", "p2"]), ("cmcs-b", vec!["p2", "p3"])]
    {
        let results = tree.entry(method.to_string()).or_default();
        for instance in instances {
            results
                .vals
                .entry("problems".to_string())
                .or_default()
                .insert(instance.to_string(), vec![Observation::new(1.0, 1.0)]);
        }
    }
    assert_eq!(
        coverage_diagnostics(&tree),
        vec![
            Diagnostic::IncompleteCoverage {
                method: "cmcs-b".into(),
                group: "problems".into(),
                found: 2,
                expected: 3,
                missing: vec!["p1".into()],
            },
            Diagnostic::IncompleteCoverage {
                method: "dc-a_1".into(),
                group: "problems".into(),
                found: 2,
                expected: 3,
                missing: vec!["p3".into()],
            },
        ]
    );
}

#[test]
fn test_missing_group_is_incomplete() {
    let root = tempfile::tempdir().unwrap();
    for relative in [
        "dc-a_1/kg/p1.txt",
        "dc-a_1/kmedian/p1.txt",
        "dc-b_1/kg/p1.txt",
    ] {
        write(root.path(), relative, "# RST 0 -3 1\n# CPU_TIME 1\n");
    }
    let output = build(root.path(), &Config::default()).unwrap();
    assert_eq!(
        output.diagnostics,
        vec![Diagnostic::IncompleteCoverage {
            method: "dc-b_1".into(),
            group: "kmedian".into(),
            found: 0,
            expected: 1,
            missing: vec!["p1.txt".into()],
        }]
    );
    assert!(!output.tree["dc-b_1"].vals.contains_key("kmedian"));
}

#[cfg(unix)]
#[test]
fn test_symlinked_directories_are_not_followed() {
    let root = tempfile::tempdir().unwrap();
    write(
        root.path(),
        "dc-a_1/problems/p1.txt",
        "# RST 0 -3 1\n# CPU_TIME 1\n",
    );
    write(
        root.path(),
        "dc-a_1/linked/p2.txt",
        "# RST 0 -4 1\n# CPU_TIME 1\n",
    );
    let group = root.path().join("dc-a_1/problems");
    std::os::unix::fs::symlink("..", group.join("loop")).unwrap();
    std::os::unix::fs::symlink(
        root.path().join("dc-a_1/linked/p2.txt"),
        group.join("p2.txt"),
    )
    .unwrap();

    let output = build(root.path(), &Config::default()).unwrap();
    let problems = &output.tree["dc-a_1"].vals["problems"];
    assert_eq!(
        problems.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["p1.txt", "p2.txt"]
    );
    assert_eq!(problems["p2.txt"], vec![Observation::new(4.0, 1.0)]);
    assert_eq!(output.tree["dc-a_1"].vals.len(), 2);
}
