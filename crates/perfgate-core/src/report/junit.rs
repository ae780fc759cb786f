use crate::model::Classification;
use crate::report::ValidationReport;
use std::path::Path;

pub fn render_junit(report: &ValidationReport) -> String {
    let t = report.totals();
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<testsuite name="{}" tests="{}" failures="{}" errors="{}" skipped="{}" timestamp="{}">"#,
        escape(&format!("perfgate.{}", report.store())),
        report.total_tests(),
        t.failed - t.critical,
        t.critical,
        t.warnings,
        escape(report.timestamp())
    ));
    xml.push('\n');

    for s in report.samples() {
        xml.push_str(&format!(
            r#"  <testcase name="{}" time="{:.3}">"#,
            escape(&s.name),
            s.duration_ms as f64 / 1000.0
        ));
        match s.classification {
            Classification::Passed => {}
            Classification::Warning => {
                xml.push_str(&format!(r#"<skipped message="{}"/>"#, escape(&s.message)))
            }
            Classification::Failed => {
                xml.push_str(&format!(r#"<failure message="{}"/>"#, escape(&s.message)))
            }
            Classification::Critical => {
                xml.push_str(&format!(r#"<error message="{}"/>"#, escape(&s.message)))
            }
        }
        xml.push_str("</testcase>\n");
    }

    xml.push_str("</testsuite>\n");
    xml
}

pub fn write_junit(report: &ValidationReport, out: &Path) -> anyhow::Result<()> {
    std::fs::write(out, render_junit(report))?;
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample;

    #[test]
    fn maps_classifications_to_junit_elements() {
        let mut r = ValidationReport::with_timestamp("staging", "2026-01-01T00:00:00Z");
        r.add(sample("a", Classification::Passed));
        r.add(sample("b", Classification::Warning));
        r.add(sample("c", Classification::Failed));
        r.add(sample("d", Classification::Critical));

        let xml = render_junit(&r);
        assert!(xml.contains(r#"tests="4" failures="1" errors="1" skipped="1""#));
        assert!(xml.contains(r#"<testcase name="a" time="0.001"></testcase>"#));
        assert!(xml.contains(r#"<skipped message="b: message"/>"#));
        assert!(xml.contains(r#"<failure message="c: message"/>"#));
        assert!(xml.contains(r#"<error message="d: message"/>"#));
    }

    #[test]
    fn escapes_messages() {
        let mut r = ValidationReport::with_timestamp("s", "t");
        let mut s = sample("x", Classification::Failed);
        s.message = r#"took <"long"> & more"#.into();
        r.add(s);
        assert!(render_junit(&r).contains("took &lt;&quot;long&quot;&gt; &amp; more"));
    }
}
