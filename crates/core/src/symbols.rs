//! Leontis-Westhof symbols for base-base interactions.
//!
//! Symbols are built in drawing coordinates from the two anchor points of an
//! interaction, after the anchors have been pulled back from the residue
//! centers. Each variant carries its resolved geometry so renderers only
//! have to match on the shape.

use serde::Serialize;

use crate::geometry::{distance, get_perpendicular, points_from, Point, Rect};
use crate::model::{Edge, Orientation};

/// Vertical position of a line symbol relative to the interaction axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VPos {
    Top,
    Middle,
    Bottom,
}

/// A fully positioned Leontis-Westhof symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LwSymbol {
    Line { p1: Point, p2: Point },
    /// Filled circle, cis Watson-Crick.
    CisWc { center: Point, radius: f64 },
    /// Open circle, trans Watson-Crick.
    TransWc { center: Point, radius: f64 },
    /// Filled square.
    CisHoogsteen { corners: [Point; 4] },
    /// Open square.
    TransHoogsteen { corners: [Point; 4] },
    /// Filled triangle.
    CisSugar { vertices: [Point; 3] },
    /// Open triangle.
    TransSugar { vertices: [Point; 3] },
}

impl LwSymbol {
    /// Line at the interaction axis, or shifted a sixth of its length
    /// above or below it for the doubled canonical G-C rendering.
    pub fn line(p1: Point, p2: Point, vpos: VPos) -> Self {
        let width = distance(p1, p2);
        match vpos {
            VPos::Top => {
                let (p1_top, _) = get_perpendicular(p1, p1, p2, width / 6.0);
                let (p2_top, _) = get_perpendicular(p2, p1, p2, width / 6.0);
                LwSymbol::Line { p1: p1_top, p2: p2_top }
            }
            VPos::Bottom => {
                let (_, p1_bottom) = get_perpendicular(p1, p1, p2, width / 6.0);
                let (_, p2_bottom) = get_perpendicular(p2, p1, p2, width / 6.0);
                LwSymbol::Line {
                    p1: p1_bottom,
                    p2: p2_bottom,
                }
            }
            VPos::Middle => LwSymbol::Line { p1, p2 },
        }
    }

    /// Circle whose diameter is the segment `p1..p2`.
    pub fn wc(p1: Point, p2: Point, orientation: Orientation) -> Self {
        let radius = distance(p1, p2) / 2.0;
        let center = Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);
        match orientation {
            Orientation::Trans => LwSymbol::TransWc { center, radius },
            _ => LwSymbol::CisWc { center, radius },
        }
    }

    /// Square spanned by the perpendiculars at both segment ends.
    pub fn hoogsteen(p1: Point, p2: Point, orientation: Orientation) -> Self {
        let width = distance(p1, p2);
        let (start_1, start_2) = get_perpendicular(p1, p1, p2, width / 2.0);
        let (end_1, end_2) = get_perpendicular(p2, p1, p2, width / 2.0);
        let corners = [start_1, end_1, end_2, start_2];
        match orientation {
            Orientation::Trans => LwSymbol::TransHoogsteen { corners },
            _ => LwSymbol::CisHoogsteen { corners },
        }
    }

    /// Triangle pointing 5' to 3'. The `right` variant has its base at `p1`
    /// and apex at `p2`, the left variant the mirror.
    pub fn sugar(p1: Point, p2: Point, orientation: Orientation, right: bool) -> Self {
        let width = distance(p1, p2);
        let vertices = if right {
            let (start_1, start_2) = get_perpendicular(p1, p1, p2, width / 2.0);
            [start_1, start_2, p2]
        } else {
            let (end_1, end_2) = get_perpendicular(p2, p1, p2, width / 2.0);
            [p1, end_1, end_2]
        };
        match orientation {
            Orientation::Trans => LwSymbol::TransSugar { vertices },
            _ => LwSymbol::CisSugar { vertices },
        }
    }

    /// One symbol for an edge, line when the edge has no shape of its own.
    pub fn single(
        p1: Point,
        p2: Point,
        edge: Edge,
        orientation: Orientation,
        right: bool,
    ) -> Self {
        match edge {
            Edge::WC => LwSymbol::wc(p1, p2, orientation),
            Edge::Hoogsteen => LwSymbol::hoogsteen(p1, p2, orientation),
            Edge::Sugar => LwSymbol::sugar(p1, p2, orientation, right),
            Edge::SingleHBond => LwSymbol::line(p1, p2, VPos::Middle),
        }
    }

    pub fn is_filled(&self) -> bool {
        matches!(
            self,
            LwSymbol::CisWc { .. } | LwSymbol::CisHoogsteen { .. } | LwSymbol::CisSugar { .. }
        )
    }

    pub fn points(&self) -> Vec<Point> {
        match self {
            LwSymbol::Line { p1, p2 } => vec![*p1, *p2],
            LwSymbol::CisWc { center, radius } | LwSymbol::TransWc { center, radius } => vec![
                Point::new(center.x - radius, center.y - radius),
                Point::new(center.x + radius, center.y + radius),
            ],
            LwSymbol::CisHoogsteen { corners } | LwSymbol::TransHoogsteen { corners } => {
                corners.to_vec()
            }
            LwSymbol::CisSugar { vertices } | LwSymbol::TransSugar { vertices } => {
                vertices.to_vec()
            }
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        Rect::from_points(self.points())
    }
}

/// The symbol row of one interaction, between anchors `p1` (5' side) and
/// `p2` (3' side):
///
/// - canonical cis Watson-Crick pairs get a single line, doubled for G-C;
/// - same-edge non-canonical pairs get one central symbol a third of the
///   span wide, flanked by connecting lines;
/// - pairs with differing edges get one symbol per end joined by a line.
pub fn assemble(
    p1: Point,
    p2: Point,
    edge5: Edge,
    edge3: Edge,
    orientation: Orientation,
    canonical: bool,
    double_paired: bool,
) -> Vec<LwSymbol> {
    if canonical {
        return if double_paired {
            vec![
                LwSymbol::line(p1, p2, VPos::Top),
                LwSymbol::line(p1, p2, VPos::Bottom),
            ]
        } else {
            vec![LwSymbol::line(p1, p2, VPos::Middle)]
        };
    }
    let symbol_width = distance(p1, p2) / 3.0;
    if edge5 == edge3 {
        let (p1_inner, p2_inner) = points_from(p1, p2, symbol_width / 2.0);
        vec![
            LwSymbol::line(p1, p1_inner, VPos::Middle),
            LwSymbol::single(p1_inner, p2_inner, edge5, orientation, true),
            LwSymbol::line(p2_inner, p2, VPos::Middle),
        ]
    } else {
        let (p1_inner, p2_inner) = points_from(p1, p2, symbol_width + symbol_width / 4.0);
        vec![
            LwSymbol::single(p1, p1_inner, edge5, orientation, false),
            LwSymbol::line(p1_inner, p2_inner, VPos::Middle),
            LwSymbol::single(p2_inner, p2, edge3, orientation, true),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::distance;

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn canonical_pair_is_one_line() {
        let symbols = assemble(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Edge::WC,
            Edge::WC,
            Orientation::Cis,
            true,
            false,
        );
        assert_eq!(
            symbols,
            vec![LwSymbol::Line {
                p1: Point::new(0.0, 0.0),
                p2: Point::new(10.0, 0.0)
            }]
        );
    }

    #[test]
    fn double_paired_lines_offset_by_sixth() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(12.0, 0.0);
        let symbols = assemble(p1, p2, Edge::WC, Edge::WC, Orientation::Cis, true, true);
        assert_eq!(symbols.len(), 2);
        for symbol in &symbols {
            let LwSymbol::Line { p1: a, p2: b } = symbol else {
                panic!("expected lines");
            };
            approx((a.y).abs(), 2.0);
            assert_eq!(a.y, b.y);
            approx(a.x, 0.0);
            approx(b.x, 12.0);
        }
        assert_ne!(symbols[0], symbols[1]);
    }

    #[test]
    fn same_edge_central_symbol_spans_a_third() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(9.0, 0.0);
        let symbols = assemble(p1, p2, Edge::Hoogsteen, Edge::Hoogsteen, Orientation::Cis, false, false);
        assert_eq!(symbols.len(), 3);
        let LwSymbol::CisHoogsteen { corners } = &symbols[1] else {
            panic!("expected a filled square in the middle");
        };
        // central segment is 9 - 2*1.5 = 6 wide, square side == segment length
        approx(distance(corners[0], corners[1]), 6.0);
        approx(distance(corners[1], corners[2]), 6.0);
    }

    #[test]
    fn differing_edges_one_symbol_per_end() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(9.0, 0.0);
        let symbols = assemble(p1, p2, Edge::WC, Edge::Sugar, Orientation::Trans, false, false);
        assert_eq!(symbols.len(), 3);
        // inset is width + width/4 = 3.75 from both ends
        let LwSymbol::TransWc { center, radius } = &symbols[0] else {
            panic!("expected an open circle on the 5' side");
        };
        approx(*radius, 3.75 / 2.0);
        approx(center.x, 3.75 / 2.0);
        let LwSymbol::Line { p1: a, p2: b } = &symbols[1] else {
            panic!("expected a middle line");
        };
        approx(a.x, 3.75);
        approx(b.x, 9.0 - 3.75);
        let LwSymbol::TransSugar { vertices } = &symbols[2] else {
            panic!("expected an open triangle on the 3' side");
        };
        // right sugar points 3', apex at the outer anchor
        approx(vertices[2].x, 9.0);
        approx(vertices[2].y, 0.0);
    }

    #[test]
    fn sugar_orientation_of_triangles() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(4.0, 0.0);
        let LwSymbol::CisSugar { vertices: right } =
            LwSymbol::sugar(p1, p2, Orientation::Cis, true)
        else {
            panic!()
        };
        // base at p1, apex at p2
        approx(right[0].x, 0.0);
        approx(right[1].x, 0.0);
        assert_eq!(right[2], p2);

        let LwSymbol::CisSugar { vertices: left } =
            LwSymbol::sugar(p1, p2, Orientation::Cis, false)
        else {
            panic!()
        };
        assert_eq!(left[0], p1);
        approx(left[1].x, 4.0);
        approx(left[2].x, 4.0);
    }

    #[test]
    fn unknown_orientation_falls_back_to_filled() {
        assert!(LwSymbol::wc(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Orientation::Orthogonal
        )
        .is_filled());
    }

    #[test]
    fn single_hbond_is_a_line() {
        let symbol = LwSymbol::single(
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Edge::SingleHBond,
            Orientation::Cis,
            true,
        );
        assert!(matches!(symbol, LwSymbol::Line { .. }));
    }
}
