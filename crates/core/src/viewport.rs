//! View state and per-frame culling.
//!
//! A [`WorkingSession`] is the zoom and translation of one view onto a
//! [`Drawing`]. [`WorkingSession::refresh`] decides which elements fall into
//! a frame, walking the single strands along the baseline and keeping the
//! branches they touch, so a deeply zoomed view only pays for what it shows.

use crate::drawing::{BondKind, Drawing, ResidueParent};
use crate::geometry::{Point, Rect};
use crate::location::Location;

#[derive(Debug, Clone, Copy)]
pub struct WorkingSession {
    pub view_x: f64,
    pub view_y: f64,
    pub zoom: f64,
}

impl Default for WorkingSession {
    fn default() -> Self {
        WorkingSession {
            view_x: 0.0,
            view_y: 0.0,
            zoom: 1.0,
        }
    }
}

/// The elements retained for one frame, as indices into the drawing arenas.
#[derive(Debug, Clone, Default)]
pub struct FrameContent {
    pub single_strands: Vec<usize>,
    pub branches: Vec<usize>,
    /// Bonds linking two branches directly.
    pub branch_bonds: Vec<usize>,
    pub junctions: Vec<usize>,
    pub helices: Vec<usize>,
    /// Union of the drawn domains, used to clip tertiary interactions.
    pub location: Location,
}

impl WorkingSession {
    pub fn new() -> Self {
        WorkingSession::default()
    }

    /// View coordinates of a drawing point.
    pub fn transform(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.view_x, p.y * self.zoom + self.view_y)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.view_x += dx;
        self.view_y += dy;
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom *= factor;
    }

    /// Fit the whole drawing into a frame: the zoom is the smaller of the
    /// two axis ratios, the translation centers the scaled bounds.
    pub fn fit_to(&mut self, drawing: &Drawing, frame: &Rect) {
        let bounds = drawing.bounds();
        let width_ratio = bounds.width() / frame.width();
        let height_ratio = bounds.height() / frame.height();
        self.zoom = 1.0 / width_ratio.max(height_ratio);
        let center = bounds.center();
        let frame_center = frame.center();
        self.view_x = frame_center.x - center.x * self.zoom;
        self.view_y = frame_center.y - center.y * self.zoom;
    }

    /// Select what the frame shows.
    pub fn refresh(&self, drawing: &Drawing, frame: &Rect) -> FrameContent {
        let mut content = FrameContent::default();

        let branch_bonds: Vec<usize> = drawing
            .bonds
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b.kind, BondKind::BranchesLinking { .. }))
            .map(|(i, _)| i)
            .collect();

        if drawing.single_strands.is_empty() && branch_bonds.is_empty()
            || drawing.skeleton.branches.len() == 1
        {
            // A single branch is always drawn whole, single strands too.
            content.single_strands = (0..drawing.single_strands.len()).collect();
            content.branches = (0..drawing.skeleton.branches.len()).collect();
        } else {
            for (i, strand) in drawing.single_strands.iter().enumerate() {
                let s = self.transform(strand.line.p1);
                let e = self.transform(strand.line.p2);
                if e.x < frame.min_x {
                    continue;
                }
                if s.x > frame.max_x {
                    break;
                }
                if in_x_window(s.x, e.x, frame) {
                    let geometry = &drawing.skeleton.strands[strand.geometry];
                    if let Some(b) = geometry.previous_branch {
                        push_unique(&mut content.branches, b);
                    }
                    if let Some(b) = geometry.next_branch {
                        push_unique(&mut content.branches, b);
                    }
                    if s.y >= frame.min_y && s.y <= frame.max_y {
                        content.single_strands.push(i);
                    }
                }
            }

            if content.branches.is_empty() {
                // The frame sits before or after the molecule; keep at least
                // the first or last branch so the view never goes blank.
                self.keep_edge_branch(drawing, frame, &mut content, true);
                self.keep_edge_branch(drawing, frame, &mut content, false);
            }

            for &i in &branch_bonds {
                let BondKind::BranchesLinking { previous, next } = drawing.bonds[i].kind else {
                    continue;
                };
                let s = self.transform(self.branch_root_bottom(drawing, previous));
                let e = self.transform(self.branch_root_bottom(drawing, next));
                if e.x < frame.min_x {
                    continue;
                }
                if s.x > frame.max_x {
                    break;
                }
                if in_x_window(s.x, e.x, frame) {
                    push_unique(&mut content.branches, previous);
                    push_unique(&mut content.branches, next);
                    if s.y >= frame.min_y && s.y <= frame.max_y {
                        content.branch_bonds.push(i);
                    }
                }
            }
        }

        // A junction is drawn when the far end of the helix it sits on, or
        // the near end of one of its outgoing helices, is inside the frame.
        for &b in &content.branches {
            'junctions: for &j in &drawing.skeleton.branches[b].junctions {
                let geometry = &drawing.skeleton.junctions[j];
                let entry = self.transform(drawing.skeleton.helices[geometry.in_helix].line.p2);
                if frame.contains(entry) {
                    content.junctions.push(j);
                    continue 'junctions;
                }
                for &(_, helix, _) in &geometry.children {
                    let out = self.transform(drawing.skeleton.helices[helix].line.p1);
                    if frame.contains(out) {
                        content.junctions.push(j);
                        continue 'junctions;
                    }
                }
            }
        }

        for &b in &content.branches {
            for &h in &drawing.skeleton.branches[b].helices {
                let line = drawing.skeleton.helices[h].line;
                let s = self.transform(line.p1);
                let e = self.transform(line.p2);
                if in_x_window(s.x, e.x, frame) {
                    content.helices.push(h);
                }
            }
        }

        let mut location = Location::empty();
        for &j in &content.junctions {
            let model = drawing.skeleton.junctions[j].junction;
            location = location.union(&drawing.ss.junctions[model].location);
        }
        for &s in &content.single_strands {
            let model = drawing.single_strands[s].strand;
            location = location.union(&drawing.ss.single_strands[model].location);
        }
        for &h in &content.helices {
            let model = drawing.skeleton.helices[h].helix;
            location = location.union(&drawing.ss.helices[model].location);
        }
        content.location = location;
        content
    }

    fn branch_root_bottom(&self, drawing: &Drawing, branch: usize) -> Point {
        let root = drawing.skeleton.branches[branch].helices[0];
        drawing.skeleton.helices[root].line.p1
    }

    /// Frame left of the whole molecule keeps the first branch or strand,
    /// frame right of it the last ones.
    fn keep_edge_branch(
        &self,
        drawing: &Drawing,
        frame: &Rect,
        content: &mut FrameContent,
        first: bool,
    ) {
        let residue = if first {
            drawing.residues.first()
        } else {
            drawing.residues.last()
        };
        let Some(residue) = residue else {
            return;
        };
        match residue.parent {
            ResidueParent::Interaction(i) => {
                let Some(helix) = drawing.secondaries[i].helix else {
                    return;
                };
                let Some(placed) = drawing.helices.iter().position(|h| h.helix == helix) else {
                    return;
                };
                let line = drawing.helices[placed].line;
                if first {
                    if self.transform(line.p1).x >= frame.max_x
                        && !drawing.skeleton.branches.is_empty()
                    {
                        push_unique(&mut content.branches, 0);
                    }
                } else if self.transform(line.p2).x <= frame.min_x
                    && !drawing.skeleton.branches.is_empty()
                {
                    push_unique(&mut content.branches, drawing.skeleton.branches.len() - 1);
                }
            }
            ResidueParent::Strand(s) => {
                let strand = &drawing.single_strands[s];
                let geometry = &drawing.skeleton.strands[strand.geometry];
                if first {
                    if self.transform(strand.line.p1).x >= frame.max_x {
                        content.single_strands.push(s);
                        if let Some(b) = geometry.next_branch {
                            push_unique(&mut content.branches, b);
                        }
                    }
                } else if self.transform(strand.line.p2).x <= frame.min_x {
                    content.single_strands.push(s);
                    if let Some(b) = geometry.previous_branch {
                        push_unique(&mut content.branches, b);
                    }
                }
            }
            ResidueParent::Junction(_) => {}
        }
    }
}

fn in_x_window(s: f64, e: f64, frame: &Rect) -> bool {
    s >= frame.min_x && s <= frame.max_x
        || e >= frame.min_x && e <= frame.max_x
        || s < frame.min_x && e > frame.max_x
}

fn push_unique(list: &mut Vec<usize>, value: usize) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SecondaryStructure;
    use crate::skeleton::LayoutOptions;

    fn drawing(seq_len: usize, bracket: &str) -> Drawing {
        let seq = "G".repeat(seq_len);
        let ss = SecondaryStructure::from_bracket_notation("test", &seq, bracket).unwrap();
        Drawing::new(ss, &LayoutOptions::default()).unwrap()
    }

    #[test]
    fn fit_centers_the_drawing() {
        let d = drawing(12, "((((....))))");
        let mut session = WorkingSession::new();
        let frame = Rect::new(0.0, 0.0, 800.0, 600.0);
        session.fit_to(&d, &frame);

        let bounds = d.bounds();
        let center = session.transform(bounds.center());
        assert!((center.x - 400.0).abs() < 1e-6);
        assert!((center.y - 300.0).abs() < 1e-6);

        // The scaled bounds fill the tighter axis of the frame.
        let scaled_w = bounds.width() * session.zoom;
        let scaled_h = bounds.height() * session.zoom;
        assert!(scaled_w <= 800.0 + 1e-6 && scaled_h <= 600.0 + 1e-6);
        assert!((scaled_w - 800.0).abs() < 1e-6 || (scaled_h - 600.0).abs() < 1e-6);
    }

    #[test]
    fn single_branch_never_culled() {
        let d = drawing(18, "...((((....))))...");
        let session = WorkingSession::new();
        // A frame nowhere near the drawing.
        let frame = Rect::new(5000.0, 5000.0, 5100.0, 5100.0);
        let content = session.refresh(&d, &frame);
        assert_eq!(content.branches, vec![0]);
        assert_eq!(content.single_strands, vec![0, 1]);
    }

    #[test]
    fn fitted_frame_keeps_everything() {
        let d = drawing(27, "((((....))))...((((....))))");
        let mut session = WorkingSession::new();
        let frame = Rect::new(0.0, 0.0, 1000.0, 800.0);
        session.fit_to(&d, &frame);
        let content = session.refresh(&d, &frame);

        assert_eq!(content.branches.len(), 2);
        assert_eq!(content.single_strands, vec![0]);
        assert_eq!(content.helices.len(), d.helices.len());
        assert_eq!(content.junctions.len(), d.junctions.len());
        assert!(content.location.contains(1));
        assert!(content.location.contains(27));
    }

    #[test]
    fn zoomed_view_keeps_only_touched_branches() {
        let d = drawing(27, "((((....))))...((((....))))");
        let mut session = WorkingSession::new();
        let frame = Rect::new(0.0, 0.0, 1000.0, 800.0);
        session.fit_to(&d, &frame);
        // Push the second branch far outside the right edge.
        session.zoom_by(30.0);
        let left_root = session.transform(d.helices[0].line.p1);
        session.translate(-left_root.x + 200.0, 0.0);
        session.translate(0.0, 400.0 - session.transform(d.helices[0].line.p1).y);

        let content = session.refresh(&d, &frame);
        // The visible strand start keeps both its branches, but nothing of
        // the second branch survives the per-helix and per-junction tests.
        assert!(content.branches.contains(&0));
        assert_eq!(content.helices, vec![0]);
        assert!(content.location.contains(1));
        assert!(!content.location.contains(20));
    }

    #[test]
    fn frame_past_the_end_falls_back_to_last_branch() {
        let d = drawing(27, "((((....))))...((((....))))");
        let mut session = WorkingSession::new();
        let frame = Rect::new(0.0, 0.0, 1000.0, 800.0);
        session.fit_to(&d, &frame);
        session.zoom_by(50.0);
        // Move the view way past the 3' end.
        let last = session.transform(d.helices.last().unwrap().line.p2);
        session.translate(-last.x - 20000.0, 0.0);

        let content = session.refresh(&d, &frame);
        assert_eq!(content.branches, vec![1]);
    }

    #[test]
    fn linked_branches_bond_retains_both() {
        let d = drawing(24, "((((....))))((((....))))");
        let mut session = WorkingSession::new();
        let frame = Rect::new(0.0, 0.0, 1000.0, 800.0);
        session.fit_to(&d, &frame);
        let content = session.refresh(&d, &frame);
        assert_eq!(content.branches.len(), 2);
        assert_eq!(content.branch_bonds.len(), 1);
    }
}
