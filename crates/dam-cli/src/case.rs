//! Analysis case files
//!
//! A case bundles the solid, the section planes, the material, the load case
//! and the tolerances in one RON document.

use std::path::Path;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use dam_core::{
    AnalysisParameters, MaterialProperties, SectionAnalyzer, SectionRequest, ValidationOptions,
};
use dam_section::{
    BrepSnapshot, ExtractionOptions, GeometryKernelAdapter, MonolithDimensions, Plane,
    SnapshotBuilder, SnapshotKernel,
};

use crate::error::{CliError, CliResult};

/// Circular gallery through a monolith
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GallerySpec {
    /// Center in the monolith profile
    pub center: DVec2,
    /// Radius, m
    pub radius: f64,
}

/// Where the solid comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolidSource {
    /// A B-rep snapshot exported by a host
    Snapshot(BrepSnapshot),
    /// A prismatic monolith extruded along +Z
    Monolith {
        /// Profile dimensions
        dimensions: MonolithDimensions,
        /// Extrusion length, m
        length: f64,
        /// Optional inspection gallery
        #[serde(default)]
        gallery: Option<GallerySpec>,
        /// Fixed solid ID
        #[serde(default)]
        solid_id: Option<Uuid>,
    },
}

/// A complete analysis case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisCase {
    /// Case name
    pub name: String,
    /// Solid to cut
    pub solid: SolidSource,
    /// Explicit cutting planes
    #[serde(default)]
    pub sections: Vec<SectionRequest>,
    /// Shorthand for planes perpendicular to +Z at these offsets
    #[serde(default)]
    pub stations: Vec<f64>,
    /// Section material
    #[serde(default)]
    pub material: Option<MaterialProperties>,
    /// Load case
    #[serde(default)]
    pub parameters: AnalysisParameters,
    /// Extraction tolerances
    #[serde(default)]
    pub extraction: ExtractionOptions,
    /// Validation thresholds
    #[serde(default)]
    pub validation: ValidationOptions,
}

impl AnalysisCase {
    /// Read a case from a RON file
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&text).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// All section requests: explicit planes first, then stations
    pub fn requests(&self) -> CliResult<Vec<SectionRequest>> {
        let stations = self
            .stations
            .iter()
            .map(|&z| SectionRequest::new(format!("z={:.3}", z), Plane::xy_at(z)));
        let requests: Vec<SectionRequest> = self.sections.iter().cloned().chain(stations).collect();
        if requests.is_empty() {
            return Err(CliError::NoSections(self.name.clone()));
        }
        Ok(requests)
    }

    /// Build the solid's snapshot
    pub fn snapshot(&self) -> BrepSnapshot {
        match &self.solid {
            SolidSource::Snapshot(snapshot) => snapshot.clone(),
            SolidSource::Monolith {
                dimensions,
                length,
                gallery,
                solid_id,
            } => {
                let builder = match gallery {
                    Some(g) => SnapshotBuilder::galleried_monolith(*dimensions, *length, g.center, g.radius),
                    None => SnapshotBuilder::gravity_monolith(*dimensions, *length),
                };
                builder
                    .with_solid_id(solid_id.unwrap_or_else(Uuid::new_v4))
                    .with_name(self.name.clone())
                    .extrude()
            }
        }
    }

    /// Register the solid with a kernel and read it back through the adapter
    pub fn load_into(&self, kernel: &SnapshotKernel) -> CliResult<BrepSnapshot> {
        let id = kernel.insert(self.snapshot())?;
        Ok(kernel.snapshot(id)?)
    }

    /// Analyzer configured from the case
    pub fn analyzer(&self) -> SectionAnalyzer {
        let analyzer = SectionAnalyzer::new(self.parameters.clone())
            .with_extraction_options(self.extraction)
            .with_validation_options(self.validation);
        match &self.material {
            Some(material) => analyzer.with_material(material.clone()),
            None => analyzer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CASE: &str = r#"(
        name: "Block 4",
        solid: Monolith(
            dimensions: (base_width: 16.0, crest_width: 4.0, height: 20.0, upstream_run: 0.0),
            length: 10.0,
            gallery: Some((center: (4.0, 4.0), radius: 1.5)),
        ),
        stations: [2.5, 7.5],
        material: Some((unit_weight: 24.0, friction_coefficient: 0.75)),
        parameters: (upstream_water_level: 12.0),
    )"#;

    #[test]
    fn test_load_case_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("block.ron");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(CASE.as_bytes())
            .unwrap();

        let case = AnalysisCase::load(&path).unwrap();
        assert_eq!(case.name, "Block 4");
        assert_eq!(case.parameters.upstream_water_level, 12.0);
        assert_eq!(case.parameters.required_sliding_sf, 3.0, "defaults fill the rest");

        let requests = case.requests().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].name, "z=2.500");
    }

    #[test]
    fn test_case_runs_through_kernel() {
        let case: AnalysisCase = ron::from_str(CASE).unwrap();
        let kernel = SnapshotKernel::new();
        let snapshot = case.load_into(&kernel).unwrap();
        assert_eq!(kernel.len(), 1);

        let analyzer = case.analyzer();
        let request = &case.requests().unwrap()[0];
        let report = analyzer.analyze(&snapshot, request, &dam_section::NullSink);
        assert_eq!(report.profile.inner_contours().len(), 1);
        assert!(report.result.is_stable(), "result: {:?}", report.result);
    }

    #[test]
    fn test_case_without_sections() {
        let case = AnalysisCase {
            stations: Vec::new(),
            ..ron::from_str(CASE).unwrap()
        };
        assert!(matches!(case.requests(), Err(CliError::NoSections(_))));
    }

    #[test]
    fn test_bad_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        std::fs::write(&path, "( name: ").unwrap();
        let err = AnalysisCase::load(&path).unwrap_err();
        assert!(err.to_string().contains("broken.ron"));

        let missing = AnalysisCase::load(&dir.path().join("missing.ron")).unwrap_err();
        assert!(matches!(missing, CliError::Io { .. }));
    }

    #[test]
    fn test_demo_case_parses() {
        let case: AnalysisCase = ron::from_str(include_str!("../../../demos/monolith.ron")).unwrap();
        assert!(!case.requests().unwrap().is_empty());
    }
}
