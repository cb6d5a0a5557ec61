//! Plain-text rendering of reports.

use std::fmt::Write as _;

use nyc311_analytics_models::{CountEntry, DeltaEntry};
use nyc311_dashboard::controller::BoroughResult;
use nyc311_dashboard::lookup::ZipReport;
use nyc311_dashboard::report::WindowReport;

/// Renders a window report for the terminal.
#[must_use]
pub fn render_report(report: &WindowReport) -> String {
    let mut out = String::new();

    let scope = report
        .filter
        .as_ref()
        .map_or_else(|| "Citywide".to_string(), |f| f.value.clone());
    let _ = writeln!(out, "{scope}: {}", report.window);
    let _ = writeln!(out, "Compared with: {}", report.prior_window);
    let _ = writeln!(
        out,
        "Reports: {} (prior {}, {})",
        report.total,
        report.prior_total,
        signed_pct(report.total_delta_pct)
    );
    if report.current.was_capped {
        let _ = writeln!(
            out,
            "Note: capped at {} of {} matching records",
            report.current.records,
            report
                .current
                .total_known
                .map_or_else(|| "?".to_string(), |t| t.to_string())
        );
    }
    let _ = writeln!(out, "Closed: {:.1}%", report.closure_rate);
    let _ = writeln!(out, "Peak hour: {}", report.peak_hour_label);
    if let Some(day) = &report.busiest_day {
        let _ = writeln!(
            out,
            "Busiest day: {} ({} reports)",
            day.date.format("%a, %b %-d"),
            day.count
        );
    }
    if let Some(zip) = &report.busiest_zip {
        let _ = writeln!(out, "Busiest ZIP: {} ({})", zip.name, zip.value);
    }

    section(&mut out, "Top complaints", &report.complaints);
    section(&mut out, "Agencies", &report.agencies);
    section(&mut out, "Status", &report.statuses);
    if report.filter.is_none() {
        section(&mut out, "Borough mix", &report.boroughs);
    }
    risers(&mut out, &report.risers);

    if !report.borough_highlights.is_empty() {
        let _ = writeln!(out, "\nBorough highlights");
        for highlight in &report.borough_highlights {
            let _ = writeln!(
                out,
                "  {:<14} {:<40} {}",
                highlight.borough.to_string(),
                highlight.top_complaint.as_deref().unwrap_or("-"),
                highlight.peak_hour.as_deref().unwrap_or("-"),
            );
        }
    }

    if let Some(descriptor) = &report.sample_descriptor {
        let _ = writeln!(out, "\nOverheard: {descriptor}");
    }

    out
}

/// Renders per-borough totals as a table.
#[must_use]
pub fn render_boroughs(rows: &[BoroughResult]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:>9} {:>9} {:>8} {:>7}  {:<8} TOP COMPLAINT",
        "BOROUGH", "REPORTS", "PRIOR", "CHANGE", "SHARE", "PEAK"
    );
    let _ = writeln!(out, "{}", "-".repeat(90));

    for (borough, result) in rows {
        match result {
            Ok(summary) => {
                let _ = writeln!(
                    out,
                    "{:<14} {:>9} {:>9} {:>8} {:>6.1}%  {:<8} {}{}",
                    borough.to_string(),
                    summary.total,
                    summary.prior_total,
                    signed_pct(summary.delta_pct),
                    summary.share,
                    summary.peak_hour_label,
                    summary.top_complaint.as_deref().unwrap_or("-"),
                    if summary.was_capped { " (capped)" } else { "" },
                );
            }
            Err(e) => {
                let _ = writeln!(out, "{:<14} failed: {e}", borough.to_string());
            }
        }
    }

    out
}

/// Renders a ZIP lookup for the terminal.
#[must_use]
pub fn render_zip(report: &ZipReport) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "ZIP {}: {} of the latest {} reports",
        report.zip, report.total, report.requested
    );
    if report.total == 0 {
        let _ = writeln!(out, "No complaints found for this ZIP code.");
        return out;
    }
    if let (Some(newest), Some(oldest)) = (&report.newest, &report.oldest) {
        let _ = writeln!(out, "Filed between {oldest} and {newest}");
    }
    match &report.center {
        Some(center) => {
            let _ = writeln!(
                out,
                "Centre: {:.5}, {:.5} ({} of {} located)",
                center.latitude, center.longitude, report.located, report.total
            );
        }
        None => {
            let _ = writeln!(out, "Centre: no coordinates reported");
        }
    }
    let _ = writeln!(out, "Closed: {:.1}%", report.closure_rate);

    section(&mut out, "Top complaints", &report.complaints);
    section(&mut out, "Status", &report.statuses);

    let _ = writeln!(out, "\nLatest");
    for record in &report.latest {
        let _ = writeln!(
            out,
            "  {:<24} {:<32} {}",
            record.created_date.as_deref().unwrap_or("-"),
            record.complaint_type.as_deref().unwrap_or("-"),
            record.descriptor.as_deref().unwrap_or("")
        );
    }

    out
}

fn section(out: &mut String, title: &str, entries: &[CountEntry]) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{title}");
    for entry in entries {
        let _ = writeln!(
            out,
            "  {:<40} {:>8} {:>6.1}%",
            entry.name,
            entry.value,
            entry.share.unwrap_or(0.0)
        );
    }
}

fn risers(out: &mut String, rows: &[DeltaEntry]) {
    if rows.is_empty() {
        return;
    }
    let _ = writeln!(out, "\nFastest risers");
    for row in rows {
        let _ = writeln!(
            out,
            "  {:<40} {:>8} {:>8} {:>8}",
            row.name,
            row.prior,
            row.current,
            signed_pct(row.delta_pct)
        );
    }
}

fn signed_pct(pct: f64) -> String {
    format!("{pct:+.1}%")
}

#[cfg(test)]
mod tests {
    use nyc311_dashboard::lookup;
    use nyc311_source::fetcher::WindowFetch;

    use super::*;

    #[test]
    fn zip_without_records_says_so() {
        let report = lookup::build(
            "10001".parse().unwrap(),
            500,
            &WindowFetch::default(),
            None,
            10,
        );
        let text = render_zip(&report);
        assert!(text.starts_with("ZIP 10001: 0 of the latest 500 reports\n"));
        assert!(text.contains("No complaints found"));
    }

    #[test]
    fn formats_signed_percentages() {
        assert_eq!(signed_pct(12.345), "+12.3%");
        assert_eq!(signed_pct(-100.0), "-100.0%");
        assert_eq!(signed_pct(0.0), "+0.0%");
    }
}
