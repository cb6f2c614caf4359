//! Result files and console summaries

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use dam_core::{BatchSummary, SectionOutcome, StabilityStatus, constants::SENTINEL_SAFETY_FACTOR};
use dam_section::Profile2D;

use crate::error::{CliError, CliResult};

/// Result file format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Pretty-printed RON
    Ron,
}

/// Everything written for an `analyze` run
#[derive(Debug, Serialize)]
pub struct BatchOutput<'a> {
    /// Case name
    pub case: &'a str,
    /// Aggregate counts
    pub summary: &'a BatchSummary,
    /// Per-section outcomes in request order
    pub sections: &'a [SectionOutcome],
}

/// Serialize a value in the requested format
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).map_err(|e| CliError::Serialize(e.to_string()))
        }
        OutputFormat::Ron => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
            .map_err(|e| CliError::Serialize(e.to_string())),
    }
}

/// Serialize a value to a file
pub fn write_file<T: Serialize>(path: &Path, value: &T, format: OutputFormat) -> CliResult<()> {
    let text = render(value, format)?;
    std::fs::write(path, text).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

fn factor(value: f64) -> String {
    if value >= SENTINEL_SAFETY_FACTOR {
        "inf".to_string()
    } else {
        format!("{:.2}", value)
    }
}

/// One line per section plus the batch totals
#[derive(Debug, Clone, Copy)]
pub struct SummaryTable<'a> {
    /// Case name
    pub case: &'a str,
    /// Per-section outcomes in request order
    pub outcomes: &'a [SectionOutcome],
    /// Aggregate counts
    pub summary: &'a BatchSummary,
}

impl fmt::Display for SummaryTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Case: {}", self.case)?;
        writeln!(
            f,
            "{:<20} {:>10} {:>10} {:>10} {:>12} {:>8}  {}",
            "section", "area", "sliding", "overturn", "sigma max", "review", "status"
        )?;

        for outcome in self.outcomes {
            let Some(report) = outcome.report() else {
                writeln!(f, "{:<20} {:>66}", outcome.name(), "cancelled")?;
                continue;
            };
            let result = &report.result;
            let area = report.features.map_or(0.0, |features| features.area);
            let status = match (&result.status, &result.failure) {
                (StabilityStatus::Failed, Some(reason)) => format!("FAILED ({})", reason),
                (StabilityStatus::Failed, None) => "FAILED".to_string(),
                (StabilityStatus::Stable, _) => "stable".to_string(),
                (StabilityStatus::Unstable, _) => "UNSTABLE".to_string(),
            };
            writeln!(
                f,
                "{:<20} {:>10.2} {:>10} {:>10} {:>12} {:>8}  {}",
                report.name,
                area,
                factor(result.sliding_sf),
                factor(result.overturning_sf),
                factor(result.max_base_stress),
                if report.requires_review() { "yes" } else { "no" },
                status
            )?;
        }

        let summary = self.summary;
        writeln!(
            f,
            "\n{} section(s): {} stable, {} unstable, {} failed, {} cancelled, {} need review",
            summary.total,
            summary.stable,
            summary.unstable,
            summary.failed,
            summary.cancelled,
            summary.requires_review
        )?;
        if let Some(g) = &summary.governing_sliding {
            writeln!(f, "Governing sliding SF: {} at '{}'", factor(g.factor), g.section)?;
        }
        if let Some(g) = &summary.governing_overturning {
            writeln!(f, "Governing overturning SF: {} at '{}'", factor(g.factor), g.section)?;
        }
        Ok(())
    }
}

/// Short description of an extracted profile
pub fn profile_line(name: &str, profile: &Profile2D) -> String {
    match profile.failure() {
        Some(reason) => format!("{:<20} {:?}: {}", name, profile.status(), reason),
        None => format!(
            "{:<20} {:?}: area {:.3} m², {} vertices, {} hole(s), {} open chain(s)",
            name,
            profile.status(),
            profile.net_area(),
            profile.main_contour().vertex_count(),
            profile.inner_contours().len(),
            profile.open_chains().len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dam_core::{
        AnalysisParameters, CancellationToken, MaterialProperties, SectionAnalyzer,
        SectionRequest,
    };
    use dam_section::{MonolithDimensions, NullSink, Plane, SnapshotBuilder};

    fn outcomes() -> Vec<SectionOutcome> {
        let dims = MonolithDimensions {
            base_width: 16.0,
            crest_width: 4.0,
            height: 20.0,
            upstream_run: 0.0,
        };
        let snapshot = SnapshotBuilder::gravity_monolith(dims, 10.0).extrude();
        let requests = vec![
            SectionRequest::new("mid", Plane::xy_at(5.0)),
            SectionRequest::new("outside", Plane::xy_at(40.0)),
        ];
        SectionAnalyzer::new(AnalysisParameters::default().with_water_levels(12.0, 0.0))
            .with_material(MaterialProperties::default())
            .analyze_batch(&snapshot, &requests, &CancellationToken::new(), &NullSink)
    }

    #[test]
    fn test_summary_lists_every_section() {
        let outcomes = outcomes();
        let summary = BatchSummary::from_outcomes(&outcomes);
        let table = SummaryTable {
            case: "demo",
            outcomes: &outcomes,
            summary: &summary,
        }
        .to_string();
        assert!(table.contains("mid"));
        assert!(table.contains("FAILED"));
        assert!(table.contains("1 stable"));
    }

    #[test]
    fn test_json_results_file() {
        let outcomes = outcomes();
        let summary = BatchSummary::from_outcomes(&outcomes);
        let output = BatchOutput {
            case: "demo",
            summary: &summary,
            sections: &outcomes,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        write_file(&path, &output, OutputFormat::Json).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["case"], "demo");
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(value["sections"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_ron_rendering() {
        let summary = BatchSummary::from_outcomes(&outcomes());
        let text = render(&summary, OutputFormat::Ron).unwrap();
        assert!(text.contains("stable: 1"));
    }

    #[test]
    fn test_sentinel_prints_as_inf() {
        assert_eq!(factor(SENTINEL_SAFETY_FACTOR), "inf");
        assert_eq!(factor(2.346), "2.35");
    }
}
