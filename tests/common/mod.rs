#![allow(dead_code)]
use solver_results::{
    datastructures::*,
    tree_builder::{self, BuildOutput},
};
use std::path::PathBuf;

pub fn fixture_root() -> PathBuf {
    PathBuf::from("data/test/results")
}

pub fn broken_fixture_root() -> PathBuf {
    PathBuf::from("data/test/broken")
}

pub fn build_fixture() -> BuildOutput {
    tree_builder::build(&fixture_root(), &Config::default()).unwrap()
}

pub fn key(group: &str, instance: &str) -> (String, String) {
    (group.to_string(), instance.to_string())
}
