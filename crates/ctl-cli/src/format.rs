// SPDX-License-Identifier: MIT OR Apache-2.0
//! Output formatting for the `ctl` CLI.

use ctl_config::ConfigWarning;
use ctl_core::TestCase;
use ctl_error::{CtlError, CtlErrorDto};
use ctl_loader::{CapabilityCoverage, CoverageEntry, TestStatistics};
use ctl_transform::GenerationSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Supported output formats for CLI display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable multi-line text.
    #[default]
    Text,
    /// Compact JSON (single line).
    Json,
    /// Pretty-printed JSON.
    JsonPretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::JsonPretty => "json-pretty",
        };
        f.write_str(s)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-pretty" | "json_pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Renders command results for the terminal.
#[derive(Debug, Clone)]
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Create a new formatter with the given output format.
    #[must_use]
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn json<T: Serialize + ?Sized>(&self, value: &T) -> Option<String> {
        match self.format {
            OutputFormat::Json => Some(serde_json::to_string(value).unwrap_or_default()),
            OutputFormat::JsonPretty => {
                Some(serde_json::to_string_pretty(value).unwrap_or_default())
            }
            OutputFormat::Text => None,
        }
    }

    /// One line per test in text mode; the records themselves as JSON.
    #[must_use]
    pub fn format_tests(&self, tests: &[TestCase]) -> String {
        if let Some(json) = self.json(tests) {
            return json;
        }
        let mut lines: Vec<String> = tests.iter().map(test_line).collect();
        lines.push(format!("{} test(s)", tests.len()));
        lines.join("\n")
    }

    /// Statistics and capability coverage.
    #[must_use]
    pub fn format_statistics(&self, stats: &TestStatistics, coverage: &CapabilityCoverage) -> String {
        if let Some(json) = self.json(&serde_json::json!({
            "statistics": stats,
            "coverage": coverage,
        })) {
            return json;
        }
        format_statistics_text(stats, coverage)
    }

    /// Outcome of a generation run.
    #[must_use]
    pub fn format_generation(&self, summary: &GenerationSummary) -> String {
        if let Some(json) = self.json(summary) {
            return json;
        }
        let mut lines: Vec<String> = summary
            .files
            .iter()
            .map(|f| {
                format!(
                    "{} -> {} ({} source, {} flat)",
                    f.source.display(),
                    f.output.display(),
                    f.source_tests,
                    f.flat_tests
                )
            })
            .collect();
        lines.push(format!(
            "generated {} flat test(s) from {} source test(s) in {} file(s)",
            summary.flat_tests(),
            summary.source_tests(),
            summary.files.len()
        ));
        if summary.filtered() > 0 {
            lines.push(format!("{} filtered by function options", summary.filtered()));
        }
        lines.join("\n")
    }

    /// Configuration warnings, or a clean bill of health.
    #[must_use]
    pub fn format_warnings(&self, warnings: &[ConfigWarning]) -> String {
        let messages: Vec<String> = warnings.iter().map(ToString::to_string).collect();
        if let Some(json) = self.json(&serde_json::json!({"warnings": messages})) {
            return json;
        }
        if messages.is_empty() {
            return "configuration ok".into();
        }
        messages
            .iter()
            .map(|m| format!("warning: {m}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render a failure: `Error: [CODE] message` as text, or the error's
    /// code, category and message as JSON.
    #[must_use]
    pub fn format_error(&self, err: &CtlError) -> String {
        let dto = CtlErrorDto::from(err);
        self.json(&serde_json::json!({ "error": dto }))
            .unwrap_or_else(|| format!("Error: {err}"))
    }
}

// ── Text helpers ──────────────────────────────────────────────────────

fn test_line(test: &TestCase) -> String {
    let target = match test.validation() {
        Some(v) => v.to_string(),
        None => test
            .touched_functions()
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(","),
    };
    match test.level {
        Some(level) => format!("{:<40} {target} (level {level})", test.name),
        None => format!("{:<40} {target}", test.name),
    }
}

fn counts(title: &str, map: &BTreeMap<String, usize>, lines: &mut Vec<String>) {
    if map.is_empty() {
        return;
    }
    lines.push(format!("{title}:"));
    for (name, n) in map {
        lines.push(format!("  {name:<28} {n}"));
    }
}

fn coverage(title: &str, map: &BTreeMap<String, CoverageEntry>, lines: &mut Vec<String>) {
    if map.is_empty() {
        return;
    }
    lines.push(format!("{title}:"));
    for (name, e) in map {
        lines.push(format!("  {name:<28} {}/{}", e.compatible, e.available));
    }
}

fn format_statistics_text(stats: &TestStatistics, cov: &CapabilityCoverage) -> String {
    let mut lines = vec![
        format!("{:<12} {}", "tests", stats.total_tests),
        format!("{:<12} {}", "assertions", stats.total_assertions),
        format!(
            "{:<12} {} tests, {} assertions",
            "compatible", stats.compatible_tests, stats.compatible_assertions
        ),
    ];
    if !stats.by_level.is_empty() {
        lines.push("by level:".into());
        for (level, n) in &stats.by_level {
            lines.push(format!("  {level:<28} {n}"));
        }
    }
    counts("by function", &stats.by_function, &mut lines);
    counts("by feature", &stats.by_feature, &mut lines);
    if stats.tests_with_conflicts > 0 {
        lines.push(format!("tests with conflicts: {}", stats.tests_with_conflicts));
        for (kind, names) in &stats.conflicting {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            lines.push(format!("  {kind:<28} {}", names.join(", ")));
        }
    }
    coverage("function coverage", &cov.functions, &mut lines);
    coverage("feature coverage", &cov.features, &mut lines);
    lines.join("\n")
}
