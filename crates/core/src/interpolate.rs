use crate::geometry::{
    angle_from, cross_product, distance, get_perpendicular, helix_drawing_length,
    helix_drawing_width, points_from, rotate_point, Point, RADIUS_CONST,
};
use crate::model::SecondaryStructure;
use crate::skeleton::Skeleton;

/// Residue centers indexed by 1-based position; index 0 is unused padding.
pub type ResiduePositions = Vec<Point>;

/// Place every residue of the molecule on the resolved skeleton: helix
/// strands first, then junction arcs between the helix corners, single
/// strands last.
pub fn place_residues(ss: &SecondaryStructure, skeleton: &Skeleton) -> ResiduePositions {
    let mut positions: ResiduePositions = vec![Point::default(); ss.rna.len() + 1];

    for helix in &skeleton.helices {
        place_helix(ss, helix.helix, helix.line.p1, helix.line.p2, &mut positions);
    }
    for junction in &skeleton.junctions {
        place_junction_arcs(ss, junction.junction, junction.center, &mut positions);
    }
    place_single_strands(ss, skeleton, &mut positions);
    positions
}

/// The four corner residues sit across the helix line ends, half a helix
/// width away; interior residues interpolate between the corners.
fn place_helix(
    ss: &SecondaryStructure,
    helix: usize,
    p1: Point,
    p2: Point,
    positions: &mut ResiduePositions,
) {
    let model = &ss.helices[helix];
    let [end5_outer, end5_inner, end3_inner, end3_outer] = model.ends();
    let half_width = helix_drawing_width() / 2.0;

    let (a, b) = get_perpendicular(p1, p1, p2, half_width);
    if cross_product(p1, p2, a) < 0.0 {
        positions[end5_outer] = a;
        positions[end3_outer] = b;
    } else {
        positions[end5_outer] = b;
        positions[end3_outer] = a;
    }

    let (a, b) = get_perpendicular(p2, p1, p2, half_width);
    if cross_product(p2, p1, a) > 0.0 {
        positions[end5_inner] = a;
        positions[end3_inner] = b;
    } else {
        positions[end5_inner] = b;
        positions[end3_inner] = a;
    }

    let n = model.len();
    if n > 2 {
        let step = helix_drawing_length(n) / (n - 1) as f64;
        for i in 1..n - 1 {
            positions[end5_outer + i] =
                points_from(positions[end5_outer], positions[end5_inner], step * i as f64).0;
            positions[end3_outer - i] =
                points_from(positions[end3_inner], positions[end3_outer], step * i as f64).1;
        }
    }
}

/// Spread each loop block between its two helix-corner endpoints at equal
/// angular steps around the junction center. The cross product decides the
/// sweep direction and fixes reflex angles.
fn place_junction_arcs(
    ss: &SecondaryStructure,
    junction: usize,
    center: Point,
    positions: &mut ResiduePositions,
) {
    for block in &ss.junctions[junction].location.blocks {
        if block.len() <= 2 {
            continue;
        }
        let start = positions[block.start];
        let end = positions[block.end];
        let mut angle = angle_from(center, start, end);
        let cp = cross_product(center, start, end);
        if cp < 0.0 {
            angle -= 360.0;
        } else {
            angle = -angle;
        }
        let step = -angle / (block.end - block.start) as f64;
        for pos in block.start + 1..block.end {
            positions[pos] = rotate_point(start, center, step * (pos - block.start) as f64);
        }
    }
}

fn place_single_strands(
    ss: &SecondaryStructure,
    skeleton: &Skeleton,
    positions: &mut ResiduePositions,
) {
    let total = ss.rna.len();

    if skeleton.branches.is_empty() && skeleton.strands.len() == 1 {
        // The whole RNA is one strand: a plain horizontal line.
        let strand = &ss.single_strands[skeleton.strands[0].strand];
        let y = skeleton.strands[0].line.p1.y;
        let x0 = skeleton.strands[0].line.p1.x
            - RADIUS_CONST * 2.0 * (strand.len() as f64 / 2.0 + 1.0);
        positions[1] = Point::new(x0, y);
        for pos in strand.start() + 1..=strand.end() {
            positions[pos] = Point::new(
                positions[pos - 1].x + RADIUS_CONST * 2.0,
                positions[pos - 1].y,
            );
        }
        return;
    }

    for strand_geom in &skeleton.strands {
        let strand = &ss.single_strands[strand_geom.strand];
        let (start, end) = (strand.start(), strand.end());

        if start == 1 {
            positions[1] = strand_geom.line.p1;
            if strand.len() != 1 {
                let anchor = positions[end + 1];
                let step = distance(positions[1], anchor) / strand.len() as f64;
                for pos in start + 1..=end {
                    positions[pos] =
                        points_from(positions[1], anchor, step * (pos - start) as f64).0;
                }
            }
        } else if end == total {
            positions[total] = strand_geom.line.p2;
            if strand.len() != 1 {
                let anchor = positions[start - 1];
                let step = distance(anchor, positions[total]) / strand.len() as f64;
                for pos in start..end {
                    positions[pos] =
                        points_from(anchor, positions[total], step * (pos - start + 1) as f64).0;
                }
            }
        } else {
            let left = positions[start - 1];
            let right = positions[end + 1];
            let step = distance(left, right) / (strand.len() + 1) as f64;
            for pos in start..=end {
                positions[pos] = points_from(left, right, step * (pos - start + 1) as f64).0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::LayoutOptions;

    fn layout(seq: &str, bracket: &str) -> (SecondaryStructure, Skeleton, ResiduePositions) {
        let ss = SecondaryStructure::from_bracket_notation("test", seq, bracket).unwrap();
        let skeleton = Skeleton::build(&ss, &LayoutOptions::default()).unwrap();
        let positions = place_residues(&ss, &skeleton);
        (ss, skeleton, positions)
    }

    #[test]
    fn hairpin_places_every_residue() {
        let (_, _, positions) = layout("GCGAAAAAUCGC", "((((....))))");
        for pos in 1..=12 {
            let p = positions[pos];
            assert!(
                p.x != 0.0 || p.y != 0.0 || pos == 1,
                "residue {pos} left at the origin"
            );
            assert!(p.x.is_finite() && p.y.is_finite());
        }
    }

    #[test]
    fn paired_residues_sit_one_helix_width_apart() {
        let (ss, _, positions) = layout("GCGAAAAAUCGC", "((((....))))");
        for pair in &ss.helices[0].pairs {
            let d = distance(positions[pair.start], positions[pair.end]);
            assert!(
                (d - helix_drawing_width()).abs() < 1e-6,
                "pair {}-{} spaced {d}",
                pair.start,
                pair.end
            );
        }
    }

    #[test]
    fn helix_strand_spacing_is_even() {
        let (_, _, positions) = layout("GCGAAAAAUCGC", "((((....))))");
        let step = helix_drawing_length(4) / 3.0;
        for pos in 1..4 {
            let d = distance(positions[pos], positions[pos + 1]);
            assert!((d - step).abs() < 1e-6, "residues {pos}/{} at {d}", pos + 1);
        }
    }

    #[test]
    fn loop_residues_sit_on_the_junction_circle() {
        let (_, skeleton, positions) = layout("GCGAAAAAUCGC", "((((....))))");
        let junction = &skeleton.junctions[0];
        for pos in 5..=8 {
            let d = distance(junction.center, positions[pos]);
            assert!(
                (d - distance(junction.center, positions[4])).abs() < 1e-6,
                "loop residue {pos} off the circle"
            );
        }
    }

    #[test]
    fn loop_angular_steps_are_equal() {
        let (_, skeleton, positions) = layout("GCGAAAAAUCGC", "((((....))))");
        let center = skeleton.junctions[0].center;
        let mut steps = Vec::new();
        for pos in 4..9 {
            steps.push(angle_from(center, positions[pos], positions[pos + 1]));
        }
        for w in steps.windows(2) {
            assert!((w[0] - w[1]).abs() < 1e-6, "uneven steps {steps:?}");
        }
    }

    #[test]
    fn lone_strand_is_horizontal() {
        let (_, _, positions) = layout("AAAAAA", "......");
        for pos in 1..6 {
            assert!((positions[pos].y - positions[pos + 1].y).abs() < 1e-9);
            assert!(
                (positions[pos + 1].x - positions[pos].x - RADIUS_CONST * 2.0).abs() < 1e-9
            );
        }
    }

    #[test]
    fn middle_strand_spacing_is_even() {
        let bracket = "((((....))))...((((....))))";
        let seq = "G".repeat(bracket.len());
        let (_, _, positions) = layout(&seq, bracket);
        // Strand 13..15 sits between the two branch corners 12 and 16.
        let expected = distance(positions[12], positions[16]) / 4.0;
        for pos in 12..16 {
            let d = distance(positions[pos], positions[pos + 1]);
            assert!((d - expected).abs() < 1e-6);
        }
    }
}
