//! Shared helpers for the integration suites.

#![allow(dead_code)]

pub mod executor;

use pinegen::{PinegenError, StrategyCode};
use std::path::PathBuf;

/// Load a script from the test_scripts directory.
pub fn load_script(filename: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_scripts")
        .join(filename);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Compile a source string, panicking with the rendered error on failure.
pub fn compile(source: &str) -> StrategyCode {
    pinegen::compile(source).unwrap_or_else(|e| match e {
        PinegenError::Parse(errors) => panic!("parse failed:\n{}", errors),
        PinegenError::Codegen(err) => panic!("codegen failed: {}", err),
    })
}

/// The emitted body of a source string.
pub fn body(source: &str) -> String {
    compile(source).function_body
}

/// Every series storage name declared in the preamble, in order.
pub fn declared_series(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| {
            line.trim()
                .strip_prefix("var ")?
                .strip_suffix(" *series.Series")
                .map(str::to_string)
        })
        .collect()
}

/// Assert the storage lifecycle of one series: a single declaration,
/// allocation and cursor advance, and at least one write.
pub fn assert_series_lifecycle(body: &str, storage: &str) {
    assert_eq!(
        body.matches(&format!("var {storage} *series.Series\n")).count(),
        1,
        "declaration of {storage}"
    );
    assert_eq!(
        body.matches(&format!("\t{storage} = series.NewSeries(barCount)\n")).count(),
        1,
        "allocation of {storage}"
    );
    assert_eq!(
        body.matches(&format!("\t{storage}.Next()\n")).count(),
        1,
        "advance of {storage}"
    );
    assert!(
        body.contains(&format!("{storage}.Set(")),
        "{storage} is never written"
    );
}

/// Position of `needle` in `haystack`, panicking when absent.
pub fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("missing `{needle}` in:\n{haystack}"))
}
