//! Markdown rendering of an `AnalysisReport`.

use std::fmt::Write as _;

use sovscan_core::AnalysisReport;

/// Render `report` as a markdown document.
pub(crate) fn markdown(report: &AnalysisReport) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &AnalysisReport) -> std::fmt::Result {
    writeln!(out, "# Share of Voice: \"{}\"", report.keyword)?;
    writeln!(out)?;
    writeln!(out, "**Run**: {}", report.run_id)?;
    writeln!(
        out,
        "**Generated**: {}",
        report.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "**Target brand**: {}", report.target_brand)?;
    if let Some(category) = &report.category {
        writeln!(out, "**Category**: {category}")?;
    }
    let rank = report
        .target_brand_rank
        .map_or_else(|| "not mentioned".to_string(), |r| format!("#{r}"));
    let sov = report
        .target_brand_total
        .as_ref()
        .map_or(0.0, |t| t.sov_percent);
    writeln!(out, "**Target rank**: {rank} ({sov:.2}% SOV)")?;
    writeln!(
        out,
        "**Pages**: {} analyzed, {} fetched, {} failed (avg {:.0} chars)",
        report.total_pages_analyzed,
        report.successful_fetch_count,
        report.fetch_stats.failed,
        report.fetch_stats.avg_content_length
    )?;
    writeln!(
        out,
        "**Mentions**: {} across {} brands (avg confidence {:.2})",
        report.total_mentions, report.total_brands_found, report.avg_confidence
    )?;
    writeln!(
        out,
        "**Timing**: search {} ms, total {} ms",
        report.search_duration_ms, report.duration_ms
    )?;
    writeln!(out)?;

    writeln!(out, "## Brand ranking")?;
    writeln!(out)?;
    if report.brand_totals.is_empty() {
        writeln!(out, "No brand mentions found.")?;
    } else {
        writeln!(out, "| Rank | Brand | Mentions | SOV |")?;
        writeln!(out, "|------|-------|----------|-----|")?;
        for (i, brand) in report.brand_totals.iter().enumerate() {
            let name = if brand.is_target_brand {
                format!("**{}**", brand.brand_name)
            } else {
                brand.brand_name.clone()
            };
            writeln!(
                out,
                "| {} | {name} | {} | {:.2}% |",
                i + 1,
                brand.total_mentions,
                brand.sov_percent
            )?;
        }
    }
    writeln!(out)?;

    writeln!(out, "## Pages")?;
    writeln!(out)?;
    writeln!(out, "| # | Page | Fetch | Method | Mentions |")?;
    writeln!(out, "|---|------|-------|--------|----------|")?;
    for page in &report.pages {
        let fetch = if page.fetch.success { "ok" } else { "failed" };
        writeln!(
            out,
            "| {} | {} | {fetch} | {} | {} |",
            page.source_hit.rank,
            page.source_hit.url,
            page.method,
            page.total_mentions()
        )?;
    }

    if let Some(summary) = &report.narrative_summary {
        writeln!(out)?;
        writeln!(out, "## Summary")?;
        writeln!(out)?;
        writeln!(out, "{summary}")?;
    }
    Ok(())
}
