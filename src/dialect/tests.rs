use super::{Dialect, ParseFailure, RawRun};
use crate::datastructures::Observation;

const RESTART_LOG: &str = "\
# Solving problems_kg_custom/kg_250a-1.txt
# RST 0 -10 2
# RST: 1 -8 3
# CPU_TIME: 6.5
";

#[test]
fn test_dialect_precedence() {
    assert_eq!(Dialect::from_method("dc-best8_100"), Some(Dialect::Restart));
    assert_eq!(Dialect::from_method("search-grasp10_8"), Some(Dialect::Restart));
    assert_eq!(Dialect::from_method("grasp40"), Some(Dialect::Restart));
    assert_eq!(Dialect::from_method("popstar-S_1"), Some(Dialect::Popstar));
    assert_eq!(Dialect::from_method("cmcs-3comp"), Some(Dialect::Cmcs));
    assert_eq!(Dialect::from_method("grasp-cmcs"), Some(Dialect::Restart));
    assert_eq!(Dialect::from_method("popstar-cmcs"), Some(Dialect::Popstar));
    assert_eq!(Dialect::from_method("ds-standard"), None);
    assert_eq!(Dialect::from_method("DC-upper"), None);
}

#[test]
fn test_restart_log() {
    assert_eq!(
        Dialect::Restart.parse(RESTART_LOG).unwrap(),
        RawRun::Restarts {
            restarts: vec![
                Observation::new(10.0, 2.0),
                Observation::new(8.0, 3.0)
            ],
            cpu_time: 6.5,
        }
    );
}

#[test]
fn test_restart_log_without_restarts() {
    assert_eq!(
        Dialect::Restart.parse("# CPU_TIME 1.25\n").unwrap(),
        RawRun::Restarts {
            restarts: vec![],
            cpu_time: 1.25,
        }
    );
}

#[test]
fn test_restart_log_missing_cpu_time() {
    assert_eq!(
        Dialect::Restart.parse("# RST 0 -10 2\n"),
        Err(ParseFailure::MissingMarker {
            marker: "# CPU_TIME"
        })
    );
}

#[test]
fn test_restart_log_malformed_cost() {
    let err = Dialect::Restart
        .parse("# RST 0 -1O 2\n# CPU_TIME 3\n")
        .unwrap_err();
    assert_eq!(
        err,
        ParseFailure::MalformedNumber {
            marker: "# RST",
            token: "-1O".into()
        }
    );
}

#[test]
fn test_popstar_log() {
    let log = "iteration 4\nbestsol 1234.5\ncputime 12.25\n";
    assert_eq!(
        Dialect::Popstar.parse(log).unwrap(),
        RawRun::Single(Observation::new(1234.5, 12.25))
    );
}

#[test]
fn test_popstar_log_missing_bestsol() {
    assert_eq!(
        Dialect::Popstar.parse("cputime 12.25\n"),
        Err(ParseFailure::MissingMarker { marker: "bestsol" })
    );
}

#[test]
fn test_cmcs_log() {
    let log = "Instance loaded\nSolution found: 2048\nTime: 0.75\n";
    assert_eq!(
        Dialect::Cmcs.parse(log).unwrap(),
        RawRun::Single(Observation::new(2048.0, 0.75))
    );
}

#[test]
fn test_negative_time_is_malformed() {
    assert_eq!(
        Dialect::Cmcs.parse("Solution found: 10\nTime: -1\n"),
        Err(ParseFailure::MalformedNumber {
            marker: "Time:",
            token: "-1".into()
        })
    );
}

#[test]
fn test_failure_fatality() {
    assert!(Dialect::Restart.failure_is_fatal());
    assert!(Dialect::Popstar.failure_is_fatal());
    assert!(!Dialect::Cmcs.failure_is_fatal());
}
