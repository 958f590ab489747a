//! Fix guidance derived from a persisted report. No network or DB access.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::compare::unwrap_envelope;
use crate::model::{ComparisonOutcome, ComparisonReport, HttpMethod};
use crate::normalize::{normalize, IgnoreFieldSet};

const LISTED_FIELDS: usize = 5;
const SAMPLE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub total: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub issues: Vec<Issue>,
}

impl Analysis {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub endpoint: String,
    pub method: HttpMethod,
    pub local_status: u16,
    pub reference_status: u16,
    pub missing_fields: Vec<String>,
    pub extra_fields: Vec<String>,
    pub has_value_differences: bool,
    pub suggestions: Vec<String>,
}

/// Turn every non-matching outcome into an [`Issue`], in report order.
pub fn analyze(report: &ComparisonReport) -> Analysis {
    let issues = report
        .results
        .iter()
        .filter(|o| !o.overall_match)
        .map(issue_for)
        .collect();

    Analysis {
        total: report.summary.total,
        matches: report.summary.matches,
        mismatches: report.summary.mismatches,
        issues,
    }
}

fn issue_for(outcome: &ComparisonOutcome) -> Issue {
    let missing_fields = to_vec(outcome.missing_fields.as_ref());
    let extra_fields = to_vec(outcome.extra_fields.as_ref());
    let has_value_differences = outcome.has_value_differences();

    let mut suggestions = Vec::new();
    if !missing_fields.is_empty() {
        suggestions.push(format!(
            "Add missing fields to response: {}",
            missing_fields.join(", ")
        ));
    }
    if !extra_fields.is_empty() {
        suggestions.push(format!(
            "Remove or hide extra fields: {}",
            extra_fields.join(", ")
        ));
    }
    if has_value_differences {
        suggestions.push("Check field types and values against the reference format".to_string());
    }
    if !outcome.status_match {
        suggestions.push(format!(
            "Align the status code: local returned {}, reference returned {}",
            outcome.local_status, outcome.reference_status
        ));
    }

    Issue {
        endpoint: outcome.endpoint.clone(),
        method: outcome.method,
        local_status: outcome.local_status,
        reference_status: outcome.reference_status,
        missing_fields,
        extra_fields,
        has_value_differences,
        suggestions,
    }
}

fn to_vec(set: Option<&BTreeSet<String>>) -> Vec<String> {
    set.map(|s| s.iter().cloned().collect()).unwrap_or_default()
}

// ── Text renderers ──────────────────────────────────────────────────

/// Console summary of an analysis.
pub fn render_analysis(analysis: &Analysis) -> String {
    let mut out = String::new();
    let rule = "=".repeat(70);
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "API COMPARISON ANALYSIS");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total tests: {}", analysis.total);
    let _ = writeln!(out, "Matches:     {}", analysis.matches);
    let _ = writeln!(out, "Mismatches:  {}", analysis.mismatches);
    let _ = writeln!(out, "{rule}");

    if !analysis.has_issues() {
        let _ = writeln!(out, "No issues found: every endpoint matches the reference.");
        return out;
    }

    let _ = writeln!(out, "{} endpoints with differences:", analysis.issues.len());
    for (i, issue) in analysis.issues.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {} {}", i + 1, issue.method, issue.endpoint);
        let _ = writeln!(
            out,
            "   status: local={}, reference={}",
            issue.local_status, issue.reference_status
        );
        write_field_list(&mut out, "missing fields", &issue.missing_fields);
        write_field_list(&mut out, "extra fields", &issue.extra_fields);
        if issue.has_value_differences {
            let _ = writeln!(out, "   value differences: yes");
        }
        if !issue.suggestions.is_empty() {
            let _ = writeln!(out, "   suggestions:");
            for s in &issue.suggestions {
                let _ = writeln!(out, "     - {s}");
            }
        }
    }
    out
}

fn write_field_list(out: &mut String, label: &str, fields: &[String]) {
    if fields.is_empty() {
        return;
    }
    let shown: Vec<&str> = fields.iter().take(LISTED_FIELDS).map(String::as_str).collect();
    let _ = writeln!(out, "   {label}: {}", shown.join(", "));
    if fields.len() > LISTED_FIELDS {
        let _ = writeln!(out, "     ... and {} more", fields.len() - LISTED_FIELDS);
    }
}

/// Per-issue fix request document. `None` when there is nothing to fix.
pub fn render_fix_request(analysis: &Analysis, report_name: &str) -> Option<String> {
    if !analysis.has_issues() {
        return None;
    }

    let mut out = String::from(
        "# API Fix Request\n\n\
         The following endpoints need changes to match the reference API responses.\n\n",
    );

    for issue in &analysis.issues {
        let _ = writeln!(out, "## {} {}\n", issue.method, issue.endpoint);
        let _ = writeln!(
            out,
            "Status: local={}, reference={}\n",
            issue.local_status, issue.reference_status
        );
        if !issue.missing_fields.is_empty() {
            out.push_str("### Missing Fields\n\nPresent in the reference API, absent locally:\n\n");
            for f in &issue.missing_fields {
                let _ = writeln!(out, "- `{f}`");
            }
            out.push_str("\n**Action:** add these fields to the response.\n\n");
        }
        if !issue.extra_fields.is_empty() {
            out.push_str("### Extra Fields\n\nPresent locally, absent in the reference API:\n\n");
            for f in &issue.extra_fields {
                let _ = writeln!(out, "- `{f}`");
            }
            out.push_str("\n**Action:** remove these fields or hide them.\n\n");
        }
        if issue.has_value_differences {
            let _ = writeln!(
                out,
                "### Value Differences\n\nField values or types differ. \
                 See `{report_name}` for the full change list.\n"
            );
        }
        if !issue.suggestions.is_empty() {
            out.push_str("### Suggestions\n\n");
            for s in &issue.suggestions {
                let _ = writeln!(out, "- {s}");
            }
            out.push('\n');
        }
        out.push_str("---\n\n");
    }
    Some(out)
}

/// Detailed prompt with the value diff and truncated normalized samples.
/// `None` when no compared endpoint mismatched.
pub fn render_fix_prompt(report: &ComparisonReport, ignore: &IgnoreFieldSet) -> Option<String> {
    let failing: Vec<&ComparisonOutcome> = report
        .results
        .iter()
        .filter(|o| !o.overall_match && o.body_compared())
        .collect();
    if failing.is_empty() {
        return None;
    }

    let mut out = String::new();
    let _ = writeln!(out, "# API Comparison Differences - Fix Request\n");
    let _ = writeln!(
        out,
        "The endpoints below respond differently from the reference API.\n"
    );
    let _ = writeln!(out, "## Differences Found: {}\n", failing.len());

    for o in failing {
        let _ = writeln!(out, "### Endpoint: {} {}\n", o.method, o.endpoint);
        let _ = writeln!(
            out,
            "**Status Codes:**\n- Local: {}\n- Reference: {}\n",
            o.local_status, o.reference_status
        );
        if let Some(missing) = o.missing_fields.as_ref().filter(|s| !s.is_empty()) {
            out.push_str("**Missing Fields in Local API:**\n");
            for f in missing {
                let _ = writeln!(out, "  - {f}");
            }
            out.push('\n');
        }
        if let Some(extra) = o.extra_fields.as_ref().filter(|s| !s.is_empty()) {
            out.push_str("**Extra Fields in Local API:**\n");
            for f in extra {
                let _ = writeln!(out, "  - {f}");
            }
            out.push('\n');
        }
        if let Some(delta) = o.body_diff.as_ref().filter(|d| !d.is_empty()) {
            let text = serde_json::to_string_pretty(delta).unwrap_or_default();
            let _ = writeln!(out, "**Value Differences:**\n```json\n{text}\n```\n");
        }
        let _ = writeln!(
            out,
            "**Reference Response Sample:**\n```json\n{}\n```\n",
            sample(o.reference_body.as_ref(), ignore)
        );
        let _ = writeln!(
            out,
            "**Local Response Sample:**\n```json\n{}\n```\n",
            sample(o.local_body.as_ref(), ignore)
        );
        out.push_str("---\n\n");
    }

    out.push_str(
        "## Action Required\n\n\
         1. Review each difference\n\
         2. Update the endpoint to match the reference response structure\n\
         3. Make sure every field is present with the correct type\n\
         4. Check that nested objects match the reference format\n",
    );
    Some(out)
}

fn sample(body: Option<&Value>, ignore: &IgnoreFieldSet) -> String {
    let normalized = match body {
        Some(b) => normalize(unwrap_envelope(b), ignore),
        None => Value::Object(Default::default()),
    };
    let text = serde_json::to_string_pretty(&normalized).unwrap_or_default();
    truncate_chars(&text, SAMPLE_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
