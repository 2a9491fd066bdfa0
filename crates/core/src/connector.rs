use crate::geometry::Point;
use crate::model::JunctionType;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Connection point on a junction circle. Sixteen compass directions,
/// south = 0, counting clockwise on screen; `o` is west, `e` is east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum ConnectorId {
    S,
    SSO,
    SO,
    OSO,
    O,
    ONO,
    NO,
    NNO,
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
}

pub const CONNECTOR_COUNT: usize = 16;

use ConnectorId::*;

const RING: [ConnectorId; CONNECTOR_COUNT] = [
    S, SSO, SO, OSO, O, ONO, NO, NNO, N, NNE, NE, ENE, E, ESE, SE, SSE,
];

impl ConnectorId {
    pub fn value(self) -> usize {
        RING.iter().position(|&c| c == self).unwrap_or(0)
    }

    pub fn from_value(value: usize) -> ConnectorId {
        RING[value % CONNECTOR_COUNT]
    }

    /// Next connector clockwise on screen.
    pub fn next(self) -> ConnectorId {
        Self::from_value(self.value() + 1)
    }

    /// Previous connector, counter-clockwise on screen.
    pub fn previous(self) -> ConnectorId {
        Self::from_value(self.value() + CONNECTOR_COUNT - 1)
    }

    pub fn opposite(self) -> ConnectorId {
        Self::from_value(self.value() + CONNECTOR_COUNT / 2)
    }

    /// Offset by `slot` positions clockwise.
    pub fn shifted(self, slot: usize) -> ConnectorId {
        Self::from_value(self.value() + slot)
    }

    /// Clockwise distance from `other` to `self` on the ring.
    pub fn slot_from(self, other: ConnectorId) -> usize {
        (self.value() + CONNECTOR_COUNT - other.value()) % CONNECTOR_COUNT
    }

    /// True for entries on the southern half of the circle (`oso` through
    /// `sse` passing through s), used by the inner-loop orientation rule.
    pub fn is_south_side(self) -> bool {
        !matches!(self, O | E) && (self.value() <= OSO.value() || self.value() >= ESE.value())
    }
}

/// Default out-connector templates, relative to the entry connector, for
/// each junction degree. Apical loops and flowers have none.
pub fn default_layout(junction_type: JunctionType) -> Option<&'static [ConnectorId]> {
    use JunctionType::*;
    let layout: &'static [ConnectorId] = match junction_type {
        InnerLoop => &[N],
        ThreeWay => &[N, E],
        FourWay => &[O, N, E],
        FiveWay => &[O, NO, N, E],
        SixWay => &[O, NO, N, NE, E],
        SevenWay => &[SO, O, NO, N, NE, E],
        EightWay => &[SO, O, NO, N, NE, E, SE],
        NineWay => &[SO, O, NO, NNO, N, NE, E, SE],
        TenWay => &[SO, O, NO, NNO, N, NNE, NE, E, SE],
        ElevenWay => &[SO, O, ONO, NO, NNO, N, NNE, NE, E, SE],
        TwelveWay => &[SO, O, ONO, NO, NNO, N, NNE, NE, ENE, E, SE],
        ThirteenWay => &[SO, OSO, O, ONO, NO, NNO, N, NNE, NE, ENE, E, SE],
        FourteenWay => &[SO, OSO, O, ONO, NO, NNO, N, NNE, NE, ENE, E, ESE, SE],
        FifteenWay => &[SSO, SO, OSO, O, ONO, NO, NNO, N, NNE, NE, ENE, E, ESE, SE],
        SixteenWay => &[SSO, SO, OSO, O, ONO, NO, NNO, N, NNE, NE, ENE, E, ESE, SE, SSE],
        ApicalLoop | Flower => return None,
    };
    Some(layout)
}

/// Center of the circle of radius `radius` whose `in_id` connector lands on
/// `in_point`. The connector at value v sits at angle v·22.5° from south.
pub fn center_from(in_id: ConnectorId, in_point: Point, radius: f64) -> Point {
    let theta = in_id.value() as f64 * 2.0 * PI / CONNECTOR_COUNT as f64;
    Point::new(
        in_point.x + radius * theta.sin(),
        in_point.y - radius * theta.cos(),
    )
}

/// Positions of all sixteen connectors for a circle entered at `in_id`
/// through `in_point`, indexed by connector value.
pub fn connector_points(
    in_id: ConnectorId,
    in_point: Point,
    center: Point,
) -> [Point; CONNECTOR_COUNT] {
    let mut points = [Point::default(); CONNECTOR_COUNT];
    for step in 0..CONNECTOR_COUNT {
        let id = in_id.shifted(step);
        points[id.value()] = crate::geometry::rotate_point(
            in_point,
            center,
            step as f64 * 360.0 / CONNECTOR_COUNT as f64,
        );
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::distance;
    use crate::model::JunctionType;

    #[test]
    fn ring_arithmetic() {
        assert_eq!(S.value(), 0);
        assert_eq!(O.value(), 4);
        assert_eq!(N.value(), 8);
        assert_eq!(E.value(), 12);
        assert_eq!(SSE.next(), S);
        assert_eq!(S.previous(), SSE);
        assert_eq!(S.opposite(), N);
        assert_eq!(O.opposite(), E);
        assert_eq!(NE.slot_from(N), 2);
        assert_eq!(S.slot_from(E), 4);
    }

    #[test]
    fn default_layout_degrees() {
        assert!(default_layout(JunctionType::ApicalLoop).is_none());
        assert_eq!(default_layout(JunctionType::InnerLoop), Some(&[N][..]));
        assert_eq!(default_layout(JunctionType::ThreeWay), Some(&[N, E][..]));
        assert_eq!(default_layout(JunctionType::FourWay), Some(&[O, N, E][..]));
        for n in 2..=16 {
            let jt = JunctionType::from_helix_count(n);
            assert_eq!(default_layout(jt).unwrap().len(), n - 1);
        }
    }

    #[test]
    fn high_degree_templates() {
        assert_eq!(
            default_layout(JunctionType::NineWay),
            Some(&[SO, O, NO, NNO, N, NE, E, SE][..])
        );
        assert_eq!(
            default_layout(JunctionType::FifteenWay),
            Some(&[SSO, SO, OSO, O, ONO, NO, NNO, N, NNE, NE, ENE, E, ESE, SE][..])
        );
        assert_eq!(
            default_layout(JunctionType::SixteenWay),
            Some(&[SSO, SO, OSO, O, ONO, NO, NNO, N, NNE, NE, ENE, E, ESE, SE, SSE][..])
        );
    }

    #[test]
    fn center_from_cardinals() {
        let p = Point::new(10.0, 10.0);
        let c = center_from(S, p, 5.0);
        assert!((c.x - 10.0).abs() < 1e-9 && (c.y - 5.0).abs() < 1e-9);
        let c = center_from(O, p, 5.0);
        assert!((c.x - 15.0).abs() < 1e-9 && (c.y - 10.0).abs() < 1e-9);
        let c = center_from(N, p, 5.0);
        assert!((c.x - 10.0).abs() < 1e-9 && (c.y - 15.0).abs() < 1e-9);
        let c = center_from(E, p, 5.0);
        assert!((c.x - 5.0).abs() < 1e-9 && (c.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn connectors_sit_on_the_circle() {
        let in_point = Point::new(0.0, 12.0);
        let center = center_from(S, in_point, 12.0);
        let points = connector_points(S, in_point, center);
        for p in points {
            assert!((distance(center, p) - 12.0).abs() < 1e-9);
        }
        // Entry connector is the entry point; the opposite one faces away.
        assert_eq!(points[S.value()], in_point);
        assert!((points[N.value()].y - (center.y - 12.0)).abs() < 1e-9);
    }
}
