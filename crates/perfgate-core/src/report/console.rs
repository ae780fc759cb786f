use crate::baseline::BaselineDiff;
use crate::model::{Classification, MetricSample};
use crate::report::ValidationReport;
use std::fmt::Write as _;

const RULE: &str = "----------------------------------------";

/// Plain-text summary. Depends only on the report's contents, so rendering
/// the same report twice yields the same string.
pub fn render_text(report: &ValidationReport) -> String {
    let t = report.totals();
    let mut out = String::new();

    let _ = writeln!(out, "Performance validation: {}", report.store());
    let _ = writeln!(out, "Generated: {}", report.timestamp());
    out.push_str(RULE);
    out.push('\n');
    let _ = writeln!(out, "Total tests:   {}", report.total_tests());
    let _ = writeln!(out, "Passed:        {}", t.passed);
    let _ = writeln!(out, "Failed:        {}", t.failed);
    let _ = writeln!(out, "Warnings:      {}", t.warnings);
    let _ = writeln!(out, "Critical:      {}", t.critical);
    let _ = writeln!(out, "Success rate:  {}%", report.success_rate());
    let _ = writeln!(out, "Grade:         {}", report.grade());

    section(&mut out, "Critical", "💥", report, Classification::Critical);
    section(&mut out, "Failed", "❌", report, Classification::Failed);
    section(&mut out, "Warnings", "⚠️ ", report, Classification::Warning);

    let info: Vec<&MetricSample> = report.samples().iter().filter(|s| s.informational).collect();
    if !info.is_empty() {
        out.push_str("\nNot applicable:\n");
        for s in info {
            let _ = writeln!(out, "  ℹ️  {}", s.message);
        }
    }

    if report.is_cancelled() {
        let _ = writeln!(
            out,
            "\nCancelled, not run: {}",
            report.skipped().join(", ")
        );
    }

    out.push_str(RULE);
    out.push('\n');
    let status = if report.is_healthy() {
        "HEALTHY"
    } else {
        "UNHEALTHY"
    };
    let _ = writeln!(out, "Status: {}", status);
    out
}

fn section(
    out: &mut String,
    title: &str,
    icon: &str,
    report: &ValidationReport,
    class: Classification,
) {
    let rows: Vec<&MetricSample> = report
        .samples()
        .iter()
        .filter(|s| s.classification == class)
        .collect();
    if rows.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{}:", title);
    for s in rows {
        let _ = writeln!(out, "  {} {}", icon, s.message);
    }
}

pub fn render_baseline(diff: &BaselineDiff) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Baseline comparison (from {}):", diff.baseline_timestamp);
    if diff.is_empty() {
        out.push_str("  no changes\n");
        return out;
    }
    for c in &diff.regressions {
        let _ = writeln!(out, "  ▼ {:<30} {} -> {}", c.name, c.before, c.after);
    }
    for c in &diff.improvements {
        let _ = writeln!(out, "  ▲ {:<30} {} -> {}", c.name, c.before, c.after);
    }
    for n in &diff.new_probes {
        let _ = writeln!(out, "  + {}", n);
    }
    for n in &diff.missing_probes {
        let _ = writeln!(out, "  - {}", n);
    }
    out
}
