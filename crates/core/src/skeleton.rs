use crate::connector::{
    center_from, connector_points, default_layout, ConnectorId, CONNECTOR_COUNT,
};
use crate::geometry::{
    circle_contains, circles_intersect, helix_drawing_length, interleave, junction_radius,
    points_from, segments_intersect, Line, Point, Rect, RADIUS_CONST,
};
use crate::model::{HelixIdx, JunctionIdx, JunctionType, SecondaryStructure};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DrawingError {
    #[error("no single strand starts at position {position}")]
    MissingSingleStrand { position: usize },
    #[error("helix '{helix}' is not closed by any junction")]
    MissingJunction { helix: String },
    #[error("residue {position} belongs to no helix, junction or single strand")]
    OrphanResidue { position: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    /// Space consecutive branches according to the number of residues
    /// between them instead of a fixed gap.
    pub fit_to_residues_between_branches: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            fit_to_residues_between_branches: true,
        }
    }
}

/// A placed helix: the line joining the midpoints of its two strands.
#[derive(Debug, Clone)]
pub struct HelixGeometry {
    pub helix: HelixIdx,
    pub line: Line,
}

/// A resolved junction circle with its sixteen connector points and the
/// connectors chosen for its outgoing helices.
#[derive(Debug, Clone)]
pub struct JunctionGeometry {
    pub junction: JunctionIdx,
    pub in_helix: usize,
    pub in_id: ConnectorId,
    pub center: Point,
    pub radius: f64,
    pub connectors: [Point; CONNECTOR_COUNT],
    /// Chosen out slots relative to the entry connector, one per out helix.
    pub layout: Option<Vec<ConnectorId>>,
    pub parent: Option<usize>,
    /// (out connector, helix geometry, child junction geometry) per branch.
    pub children: Vec<(ConnectorId, usize, usize)>,
    /// Set when the orientation search ran out of candidates and fell back
    /// to the preferred connector.
    pub search_exhausted: bool,
}

impl JunctionGeometry {
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius,
            self.center.y - self.radius,
            self.center.x + self.radius,
            self.center.y + self.radius,
        )
    }
}

/// One branch of the drawing: the helix rooted on the baseline and every
/// junction reachable from it.
#[derive(Debug, Clone)]
pub struct BranchGeometry {
    pub root_helix: HelixIdx,
    /// Arena index of the junction entered through the root helix.
    pub root_junction: usize,
    pub junctions: Vec<usize>,
    pub helices: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct StrandGeometry {
    /// Index into the model's single strands.
    pub strand: usize,
    pub line: Line,
    pub previous_branch: Option<usize>,
    pub next_branch: Option<usize>,
}

/// The resolved 2D skeleton: helix lines and junction circles, before
/// residue placement.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub junctions: Vec<JunctionGeometry>,
    pub helices: Vec<HelixGeometry>,
    pub branches: Vec<BranchGeometry>,
    pub strands: Vec<StrandGeometry>,
}

impl Skeleton {
    /// Lay out the whole molecule: branches left to right along the
    /// baseline, single strands between them.
    pub fn build(ss: &SecondaryStructure, options: &LayoutOptions) -> Result<Skeleton, DrawingError> {
        let mut skeleton = Skeleton::default();
        let len = ss.rna.len();
        let mut current_pos = 0usize;
        let mut bottom = Point::new(0.0, 0.0);

        loop {
            let next = ss.next_branch_root(current_pos);

            let Some(root) = next else {
                // No branch left; flush any trailing residues.
                current_pos += 1;
                let remaining = len as isize - current_pos as isize + 1;
                if remaining > 0 {
                    let strand = find_strand_at(ss, current_pos)?;
                    let end_x = if options.fit_to_residues_between_branches {
                        bottom.x + RADIUS_CONST * 2.0 * (remaining as f64 + 1.0)
                    } else {
                        bottom.x + 200.0
                    };
                    skeleton.strands.push(StrandGeometry {
                        strand,
                        line: Line::new(bottom, Point::new(end_x, bottom.y)),
                        previous_branch: None,
                        next_branch: None,
                    });
                }
                break;
            };

            let root_helix = &ss.helices[root];
            let root_start = root_helix.start();
            let junction = root_helix.junctions.inner.ok_or_else(|| {
                DrawingError::MissingJunction {
                    helix: root_helix.name.clone(),
                }
            })?;
            let residues_before = root_start as isize - current_pos as isize - 1;

            if current_pos == 0 {
                if residues_before > 0 {
                    let strand = find_strand_at(ss, current_pos + 1)?;
                    let start_x = if options.fit_to_residues_between_branches {
                        bottom.x - RADIUS_CONST * 2.0 * (residues_before as f64 + 1.0)
                    } else {
                        bottom.x - 200.0
                    };
                    skeleton.strands.push(StrandGeometry {
                        strand,
                        line: Line::new(Point::new(start_x, bottom.y), bottom),
                        previous_branch: None,
                        next_branch: None,
                    });
                }
                let branch = build_branch(ss, root, junction, bottom)?;
                merge_branch(&mut skeleton, branch, root);
            } else {
                // The branch is built twice: a first construction at the
                // current abscissa discovers the offset needed to clear the
                // previous branch, the second one is kept.
                let trial = build_branch(ss, root, junction, bottom)?;

                let previous = skeleton
                    .branches
                    .last()
                    .map(|b| branch_circle_bounds(&skeleton, b))
                    .unwrap_or_default();
                let trial_bounds: Vec<Rect> =
                    trial.junctions.iter().map(|j| j.bounds()).collect();

                let trial_min_y = trial_bounds
                    .iter()
                    .map(|b| b.min_y)
                    .fold(f64::INFINITY, f64::min);
                let mut max_x = previous
                    .iter()
                    .filter(|b| b.min_y >= trial_min_y)
                    .map(|b| b.max_x)
                    .fold(f64::NEG_INFINITY, f64::max);
                if max_x == f64::NEG_INFINITY {
                    max_x = bottom.x;
                }
                max_x += 2.0 * RADIUS_CONST;

                let previous_min_y = previous
                    .iter()
                    .map(|b| b.min_y)
                    .fold(f64::INFINITY, f64::min);
                let mut min_x = trial_bounds
                    .iter()
                    .filter(|b| b.min_y >= previous_min_y)
                    .map(|b| b.min_x)
                    .fold(f64::INFINITY, f64::min);
                if min_x == f64::INFINITY {
                    min_x = bottom.x;
                }
                min_x -= 2.0 * RADIUS_CONST;

                let mut trans_x = max_x - bottom.x;
                if min_x + trans_x < max_x {
                    trans_x += max_x - (min_x + trans_x);
                }
                if options.fit_to_residues_between_branches {
                    let minimal_trans_x =
                        (root_start - current_pos + 2) as f64 * RADIUS_CONST * 2.0;
                    if trans_x < minimal_trans_x {
                        trans_x = minimal_trans_x;
                    }
                }
                debug!(branch = root, trans_x, "translating branch");

                if current_pos + 1 <= root_start - 1 {
                    let strand = find_strand_at(ss, current_pos + 1)?;
                    skeleton.strands.push(StrandGeometry {
                        strand,
                        line: Line::new(bottom, Point::new(bottom.x + trans_x, bottom.y)),
                        previous_branch: None,
                        next_branch: None,
                    });
                }

                bottom = Point::new(bottom.x + trans_x, bottom.y);
                let branch = build_branch(ss, root, junction, bottom)?;
                merge_branch(&mut skeleton, branch, root);
            }

            current_pos = ss.helices[root].end();
            if current_pos >= len {
                break;
            }
        }

        link_strands_to_branches(ss, &mut skeleton);
        Ok(skeleton)
    }

    /// Bounding box over every placed shape.
    pub fn bounds(&self) -> Option<Rect> {
        let mut rect: Option<Rect> = None;
        let mut grow = |r: Rect| {
            rect = Some(match rect {
                Some(acc) => acc.union(&r),
                None => r,
            });
        };
        for j in &self.junctions {
            grow(j.bounds());
        }
        for h in &self.helices {
            if let Some(r) = Rect::from_points([h.line.p1, h.line.p2]) {
                grow(r);
            }
        }
        for s in &self.strands {
            if let Some(r) = Rect::from_points([s.line.p1, s.line.p2]) {
                grow(r);
            }
        }
        rect
    }
}

fn find_strand_at(ss: &SecondaryStructure, position: usize) -> Result<usize, DrawingError> {
    ss.single_strands
        .iter()
        .position(|s| s.start() == position)
        .ok_or(DrawingError::MissingSingleStrand { position })
}

fn branch_circle_bounds(skeleton: &Skeleton, branch: &BranchGeometry) -> Vec<Rect> {
    branch
        .junctions
        .iter()
        .map(|&j| skeleton.junctions[j].bounds())
        .collect()
}

fn link_strands_to_branches(ss: &SecondaryStructure, skeleton: &mut Skeleton) {
    for strand in &mut skeleton.strands {
        let location = &ss.single_strands[strand.strand].location;
        for (i, branch) in skeleton.branches.iter().enumerate() {
            let root = &ss.helices[branch.root_helix];
            if root.end() + 1 == location.start() {
                strand.previous_branch = Some(i);
                if i + 1 < skeleton.branches.len() {
                    strand.next_branch = Some(i + 1);
                }
                break;
            } else if location.end() + 1 == root.start() {
                strand.next_branch = Some(i);
                if i > 0 {
                    strand.previous_branch = Some(i - 1);
                }
                break;
            }
        }
    }
}

// ── Branch construction ─────────────────────────────────────────────

/// Per-branch construction scratch: shapes placed so far, used by the
/// orientation search to reject overlapping candidates.
struct BranchState {
    junctions: Vec<JunctionGeometry>,
    helices: Vec<HelixGeometry>,
    circles: Vec<(Point, f64)>,
    lines: Vec<Vec<Point>>,
}

fn build_branch(
    ss: &SecondaryStructure,
    root_helix: HelixIdx,
    root_junction: JunctionIdx,
    bottom: Point,
) -> Result<BranchState, DrawingError> {
    let top = Point::new(
        bottom.x,
        bottom.y - helix_drawing_length(ss.helices[root_helix].len()),
    );
    let mut state = BranchState {
        junctions: Vec::new(),
        helices: vec![HelixGeometry {
            helix: root_helix,
            line: Line::new(bottom, top),
        }],
        circles: Vec::new(),
        lines: Vec::new(),
    };
    layout_junction(
        ss,
        &mut state,
        root_junction,
        0,
        ConnectorId::S,
        top,
        None,
    )?;
    Ok(state)
}

fn merge_branch(skeleton: &mut Skeleton, state: BranchState, root_helix: HelixIdx) {
    let junction_base = skeleton.junctions.len();
    let helix_base = skeleton.helices.len();
    let junction_count = state.junctions.len();

    for mut geometry in state.junctions {
        geometry.in_helix += helix_base;
        geometry.parent = geometry.parent.map(|p| p + junction_base);
        for child in &mut geometry.children {
            child.1 += helix_base;
            child.2 += junction_base;
        }
        skeleton.junctions.push(geometry);
    }
    let helix_count = state.helices.len();
    skeleton.helices.extend(state.helices);

    skeleton.branches.push(BranchGeometry {
        root_helix,
        root_junction: junction_base,
        junctions: (junction_base..junction_base + junction_count).collect(),
        helices: (helix_base..helix_base + helix_count).collect(),
    });
}

/// Resolve one junction circle and recurse into the junctions behind its
/// outgoing helices. `in_helix` indexes the branch-local helix list.
#[allow(clippy::too_many_arguments)]
fn layout_junction(
    ss: &SecondaryStructure,
    state: &mut BranchState,
    junction: JunctionIdx,
    in_helix: usize,
    in_id: ConnectorId,
    in_point: Point,
    parent: Option<usize>,
) -> Result<usize, DrawingError> {
    let model = &ss.junctions[junction];
    let radius = junction_radius(model.len(), model.slots());
    let center = center_from(in_id, in_point, radius);
    let connectors = connector_points(in_id, in_point, center);
    state.circles.push((center, radius));

    let arena = state.junctions.len();
    state.junctions.push(JunctionGeometry {
        junction,
        in_helix,
        in_id,
        center,
        radius,
        layout: default_layout(model.junction_type).map(|l| l.to_vec()),
        connectors,
        parent,
        children: Vec::new(),
        search_exhausted: false,
    });

    let out_count = model.helices.len() - 1;
    for rank in 1..=out_count {
        let out_helix = model.helices[rank];
        let Some(mut out_id) = out_id_for(&state.junctions[arena], rank) else {
            // Apical loops have no outgoing helix; flower junctions carry
            // no layout and their arms stay undrawn.
            continue;
        };

        if model.junction_type == JunctionType::InnerLoop {
            let blocks = &model.location.blocks;
            if blocks[0].len() < 5 || blocks[1].len() < 5 {
                out_id = in_id.opposite();
            } else {
                out_id = inner_loop_exit(in_id, parent.map(|p| state.junctions[p].in_id));
            }
        }

        // Search window: between the connector after the previous rank and
        // the one before the next rank.
        let from = if rank == 1 {
            in_id.next()
        } else {
            out_id_for(&state.junctions[arena], rank - 1)
                .unwrap_or(in_id)
                .next()
        };
        let to = if rank == out_count {
            in_id.previous()
        } else {
            out_id_for(&state.junctions[arena], rank + 1)
                .unwrap_or(in_id)
                .previous()
        };

        let mut after = Vec::new();
        if to != out_id {
            let mut c = out_id.next();
            loop {
                after.push(c);
                if c == to {
                    break;
                }
                c = c.next();
            }
        }
        let mut before = Vec::new();
        if from != out_id {
            let mut c = out_id.previous();
            loop {
                before.push(c);
                if c == from {
                    break;
                }
                c = c.previous();
            }
        }
        let mut candidates = vec![out_id];
        candidates.extend(interleave(&after, &before));

        let helix_model = &ss.helices[out_helix];
        let helix_len = helix_drawing_length(helix_model.len());
        let child_junction =
            helix_model
                .junctions
                .inner
                .ok_or_else(|| DrawingError::MissingJunction {
                    helix: helix_model.name.clone(),
                })?;
        let child_model = &ss.junctions[child_junction];
        let next_radius = junction_radius(child_model.len(), child_model.slots());

        let mut fine = false;
        for &candidate in &candidates {
            if candidate_fits(
                state,
                center,
                connectors[candidate.value()],
                helix_len,
                helix_model.len(),
                next_radius,
            ) {
                out_id = candidate;
                fine = true;
                break;
            }
        }
        if !fine {
            out_id = candidates[0];
            state.junctions[arena].search_exhausted = true;
            debug!(
                junction = %model.name,
                rank,
                "orientation search exhausted, keeping preferred connector"
            );
        }

        if let Some(layout) = state.junctions[arena].layout.as_mut() {
            layout[rank - 1] = ConnectorId::from_value(out_id.slot_from(in_id));
        }

        let out_point = connectors[out_id.value()];
        let helix_in_point = points_from(center, out_point, -helix_len).1;

        let helix_geom = state.helices.len();
        state.helices.push(HelixGeometry {
            helix: out_helix,
            line: Line::new(out_point, helix_in_point),
        });

        let mut line_points = vec![out_point];
        line_points.extend(interior_helix_points(
            out_point,
            helix_in_point,
            helix_len,
            helix_model.len(),
        ));
        line_points.push(helix_in_point);
        state.lines.push(line_points);

        let child_arena = layout_junction(
            ss,
            state,
            child_junction,
            helix_geom,
            out_id.opposite(),
            helix_in_point,
            Some(arena),
        )?;
        state.junctions[arena]
            .children
            .push((out_id, helix_geom, child_arena));
    }

    Ok(arena)
}

fn out_id_for(geometry: &JunctionGeometry, rank: usize) -> Option<ConnectorId> {
    geometry
        .layout
        .as_ref()
        .and_then(|l| l.get(rank - 1))
        .map(|rel| geometry.in_id.shifted(rel.value()))
}

/// Exit side of a roomy inner loop: opposite vertical half of the entry; at
/// the poles the previous junction decides, so a zig-zag keeps its direction.
fn inner_loop_exit(in_id: ConnectorId, previous_in_id: Option<ConnectorId>) -> ConnectorId {
    use ConnectorId::{E, N, O, S};
    match in_id {
        O | E => {
            let keep_south = previous_in_id
                .map(|prev| prev.value() > O.value() && prev.value() < E.value())
                .unwrap_or(false);
            if keep_south {
                S
            } else {
                N
            }
        }
        id if id.is_south_side() => N,
        _ => S,
    }
}

/// Interior checkpoints along a helix line, one per base pair between the
/// two ends.
fn interior_helix_points(p1: Point, p2: Point, helix_len: f64, n_pairs: usize) -> Vec<Point> {
    let mut points = Vec::new();
    if n_pairs > 2 {
        for j in 1..=n_pairs - 2 {
            points.push(points_from(p1, p2, j as f64 * helix_len / n_pairs as f64).1);
        }
    }
    points
}

/// True when the candidate out-helix and the circle behind it fit among
/// the shapes already placed in this branch.
fn candidate_fits(
    state: &BranchState,
    center: Point,
    out_point: Point,
    helix_len: f64,
    n_pairs: usize,
    next_radius: f64,
) -> bool {
    let in_point = points_from(center, out_point, -helix_len).1;
    let next_center = points_from(center, out_point, -helix_len - next_radius).1;

    // The line ends sit inside their own circles, so test trimmed points.
    let trimmed = points_from(out_point, in_point, RADIUS_CONST);
    let mut next_points = vec![trimmed.0, trimmed.1];
    next_points.extend(interior_helix_points(out_point, in_point, helix_len, n_pairs));

    for &(placed_center, placed_radius) in &state.circles {
        if circles_intersect(
            next_center,
            next_radius + RADIUS_CONST * 2.0,
            placed_center,
            placed_radius,
        ) {
            return false;
        }
        for &p in &next_points {
            if circle_contains(placed_center, placed_radius, p) {
                return false;
            }
        }
    }

    let first = next_points[0];
    let last = *next_points.last().unwrap_or(&first);
    for placed in &state.lines {
        let (Some(&p_first), Some(&p_last)) = (placed.first(), placed.last()) else {
            continue;
        };
        if segments_intersect(p_first, p_last, first, last) {
            return false;
        }
        for &p in placed {
            if circle_contains(next_center, next_radius, p) {
                return false;
            }
        }
    }
    true
}
