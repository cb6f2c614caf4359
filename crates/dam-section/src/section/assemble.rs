//! Loop assembly
//!
//! Greedy endpoint stitching of intersection segments into closed 2D loops.
//! Arcs are discretized before stitching, so every loop is a polyline. The
//! search is O(n²) in the segment count.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CurveSegment, ExtractionOptions, GeometryExtractionError};
use crate::constants::AMBIGUOUS_AREA_RATIO;
use crate::diagnostics::DiagnosticSink;
use crate::geometry::{Plane, polygon};
use crate::profile::{CurveLoop, OpenChain, Profile2D};

/// Result of one stitching attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StitchOutcome {
    /// The chain returned to its start
    Closed(CurveLoop),
    /// The chain ran out of connectable segments
    Open(OpenChain),
    /// The chain closed but encloses no usable area
    Degenerate {
        /// Points of the collapsed chain
        points: Vec<DVec2>,
    },
}

/// Stitches segments into closed loops
#[derive(Debug, Clone, Copy)]
pub struct CurveLoopAssembler {
    connection_tolerance: f64,
    arc_samples: u32,
}

impl Default for CurveLoopAssembler {
    fn default() -> Self {
        Self::new(&ExtractionOptions::default())
    }
}

impl CurveLoopAssembler {
    /// Create an assembler from extraction options
    pub fn new(options: &ExtractionOptions) -> Self {
        Self {
            connection_tolerance: options.connection_tolerance,
            arc_samples: options.arc_samples.max(1),
        }
    }

    /// Stitch segments into chains, in the plane's local frame.
    ///
    /// Each chain is seeded from the lowest unused segment. At every step the
    /// unused segment with the nearest endpoint within tolerance is appended,
    /// ties going to the lower index.
    pub fn stitch(&self, segments: &[CurveSegment], plane: &Plane) -> Vec<StitchOutcome> {
        let tol = self.connection_tolerance;
        let pieces: Vec<Vec<DVec2>> = segments
            .iter()
            .map(|s| {
                s.polyline(self.arc_samples)
                    .into_iter()
                    .map(|p| plane.project(p))
                    .collect()
            })
            .collect();

        let mut used = vec![false; pieces.len()];
        let mut outcomes = Vec::new();

        for seed in 0..pieces.len() {
            if used[seed] {
                continue;
            }
            used[seed] = true;
            let mut chain = pieces[seed].clone();

            let closed = loop {
                if is_chain_closed(&chain, tol) {
                    break true;
                }
                let Some(tail) = chain.last().copied() else {
                    break false;
                };
                let Some((index, reverse)) = nearest_piece(&pieces, &used, tail, tol) else {
                    break false;
                };
                used[index] = true;
                if reverse {
                    chain.extend(pieces[index].iter().rev().skip(1));
                } else {
                    chain.extend(pieces[index].iter().skip(1));
                }
            };

            outcomes.push(if closed {
                self.close_chain(chain)
            } else {
                StitchOutcome::Open(OpenChain::new(chain))
            });
        }

        outcomes
    }

    /// Stitch segments and classify the loops into a profile.
    ///
    /// The largest loop by |area| becomes the main contour (counter-clockwise),
    /// all other closed loops become holes (clockwise). Without any closed loop,
    /// or when a loop crosses itself, the profile is `Failed`.
    pub fn assemble(
        &self,
        segments: &[CurveSegment],
        plane: &Plane,
        solid_id: Uuid,
        sink: &dyn DiagnosticSink,
    ) -> Profile2D {
        let mut loops = Vec::new();
        let mut open = Vec::new();

        for outcome in self.stitch(segments, plane) {
            match outcome {
                StitchOutcome::Closed(curve) => loops.push(curve),
                StitchOutcome::Open(chain) => {
                    sink.warn(
                        "assemble",
                        &format!(
                            "Open chain of {} point(s), gap {:.6}",
                            chain.points.len(),
                            chain.gap
                        ),
                    );
                    open.push(chain);
                }
                StitchOutcome::Degenerate { points } => {
                    sink.debug(
                        "assemble",
                        &format!("Discarding degenerate loop of {} point(s)", points.len()),
                    );
                }
            }
        }

        if loops.is_empty() {
            let reason = if open.is_empty() {
                GeometryExtractionError::DegenerateDimensions(
                    "all stitched loops have zero area".to_string(),
                )
            } else {
                GeometryExtractionError::OpenContour {
                    chains: open.len(),
                    max_gap: open.iter().map(|c| c.gap).fold(0.0, f64::max),
                }
            };
            sink.warn("assemble", &format!("No closed loop: {}", reason));
            return Profile2D::failed(solid_id, *plane, reason).with_open_chains(open);
        }

        let mut main_index = 0;
        for (i, curve) in loops.iter().enumerate() {
            if curve.area() > loops[main_index].area() {
                main_index = i;
            }
        }
        let main_area = loops[main_index].area();
        let ambiguous = loops.iter().enumerate().any(|(i, c)| {
            i != main_index && (main_area - c.area()).abs() <= AMBIGUOUS_AREA_RATIO * main_area
        });
        if ambiguous {
            sink.warn(
                "assemble",
                "Several loops share the largest area; main contour choice is ambiguous",
            );
        }

        let main = loops[main_index].oriented(true);
        let holes: Vec<CurveLoop> = loops
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != main_index)
            .map(|(_, c)| c.oriented(false))
            .collect();

        let crossed = std::iter::once(&main)
            .chain(holes.iter())
            .position(|c| polygon::is_self_intersecting(c.vertices(), self.connection_tolerance));
        if let Some(contour) = crossed {
            let reason = GeometryExtractionError::SelfIntersecting { contour };
            sink.warn("assemble", &reason.to_string());
            return Profile2D::failed(solid_id, *plane, reason).with_open_chains(open);
        }

        sink.debug(
            "assemble",
            &format!(
                "main contour {} vertices, {} hole(s), {} open chain(s)",
                main.vertex_count(),
                holes.len(),
                open.len()
            ),
        );

        Profile2D::new(solid_id, *plane, main, holes)
            .with_open_chains(open)
            .with_ambiguous_main(ambiguous)
    }

    fn close_chain(&self, mut chain: Vec<DVec2>) -> StitchOutcome {
        let tol = self.connection_tolerance;
        if let Some(first) = chain.first().copied()
            && let Some(last) = chain.last_mut()
        {
            *last = first;
        }

        let mut points: Vec<DVec2> = Vec::with_capacity(chain.len());
        for p in chain {
            match points.last() {
                Some(prev) if prev.distance(p) < tol => {}
                _ => points.push(p),
            }
        }
        // Restore the exact closing point if collapsing swallowed it
        match (points.first().copied(), points.last().copied()) {
            (Some(first), Some(last)) if first.distance(last) < tol => {
                if let Some(closing) = points.last_mut() {
                    *closing = first;
                }
            }
            (Some(first), _) => points.push(first),
            _ => {}
        }

        let distinct = points.len().saturating_sub(1);
        if distinct < 3 || polygon::signed_area(&points).abs() < tol * tol {
            return StitchOutcome::Degenerate { points };
        }
        StitchOutcome::Closed(CurveLoop::from_vertices(points))
    }
}

fn is_chain_closed(chain: &[DVec2], tolerance: f64) -> bool {
    match (chain.first(), chain.last()) {
        (Some(first), Some(last)) => chain.len() >= 3 && first.distance(*last) < tolerance,
        _ => false,
    }
}

/// Nearest unused piece touching `tail`; `true` when it must be reversed
fn nearest_piece(
    pieces: &[Vec<DVec2>],
    used: &[bool],
    tail: DVec2,
    tolerance: f64,
) -> Option<(usize, bool)> {
    let mut best: Option<(usize, bool, f64)> = None;
    for (i, piece) in pieces.iter().enumerate() {
        if used[i] {
            continue;
        }
        let (Some(start), Some(end)) = (piece.first(), piece.last()) else {
            continue;
        };
        for (distance, reverse) in [(tail.distance(*start), false), (tail.distance(*end), true)] {
            if distance < tolerance && best.is_none_or(|(_, _, d)| distance < d) {
                best = Some((i, reverse, distance));
            }
        }
    }
    best.map(|(i, reverse, _)| (i, reverse))
}
