//! Booquet overview layout.
//!
//! A deliberately schematic rendering of the whole molecule: each stem-loop
//! becomes a vertical stalk topped by a circle, branches fan out from the
//! baseline, single strands and branch links stay horizontal. The layout is
//! driven by the structural model alone, no skeleton needed, and emits its
//! own SVG document.

use std::collections::HashMap;
use std::fmt::Write;

use crate::model::{HelixIdx, JunctionIdx, JunctionType, SecondaryStructure};
use crate::theme::Color;

#[derive(Debug, Clone, Copy)]
pub struct BooquetOptions {
    pub width: f64,
    pub height: f64,
    /// Horizontal room granted per multiway junction between stem-loops.
    pub step: f64,
    pub line_width: f64,
    /// Vertical room per helical base pair.
    pub residue_occupancy: f64,
    pub junction_diameter: f64,
    pub color: Color,
}

impl Default for BooquetOptions {
    fn default() -> Self {
        BooquetOptions {
            width: 600.0,
            height: 600.0,
            step: 25.0,
            line_width: 2.0,
            residue_occupancy: 5.0,
            junction_diameter: 20.0,
            color: Color { r: 0, g: 0, b: 0 },
        }
    }
}

/// Render the booquet SVG for a molecule.
pub fn booquet(ss: &SecondaryStructure, options: &BooquetOptions) -> String {
    let diameter = options.junction_diameter;
    let occupancy = options.residue_occupancy;

    let apical_loops: Vec<JunctionIdx> = ss
        .junctions
        .iter()
        .enumerate()
        .filter(|(_, j)| j.junction_type == JunctionType::ApicalLoop)
        .map(|(i, _)| i)
        .collect();

    // One X abscissa per apical loop, accumulating along the sequence. The
    // room between two stem-loops depends on the multiway junctions whose
    // loop strands separate them.
    let mut x_coords = vec![0.0];
    let mut x = 0.0;
    for window in apical_loops.windows(2) {
        let before = stem_loop_span(ss, window[0]).1;
        let after = stem_loop_span(ss, window[1]).0;
        let mut separating = 0usize;
        for junction in &ss.junctions {
            if matches!(
                junction.junction_type,
                JunctionType::ApicalLoop | JunctionType::InnerLoop
            ) {
                continue;
            }
            let blocks = &junction.location.blocks;
            for block in &blocks[1..blocks.len().saturating_sub(1)] {
                if before <= block.start && after >= block.end {
                    separating += 1;
                }
            }
        }
        if separating == 0 {
            let gap =
                ((after - before + 1) as f64 * occupancy * diameter).min(2.0 * diameter);
            x += gap;
        } else {
            x += separating as f64 * options.step;
        }
        x_coords.push(x);
    }

    let mut layout = Layout {
        helices: HashMap::new(),
        junctions: HashMap::new(),
        strands: HashMap::new(),
    };

    for &root in &ss.branch_roots() {
        draw_branch(ss, &mut layout, root, &x_coords, &apical_loops, 200.0, options);
    }

    // Single strands hang off the branch-root helices they touch.
    for (s, strand) in ss.single_strands.iter().enumerate() {
        if strand.start() == 1 {
            if let Some((h, _)) = ss
                .helices
                .iter()
                .enumerate()
                .find(|(_, h)| h.start() == strand.end() + 1)
            {
                if let Some(&[hx, hy, _, _]) = layout.helices.get(&h) {
                    let gap = (h_start(ss, h) as f64 * occupancy).min(2.0 * diameter);
                    layout.strands.insert(s, [hx - gap, hy, hx, hy]);
                }
            }
        } else if strand.end() == ss.rna.len() {
            if let Some((h, helix)) = ss
                .helices
                .iter()
                .enumerate()
                .find(|(_, h)| h.end() + 1 == strand.start())
            {
                if let Some(&[hx, hy, _, _]) = layout.helices.get(&h) {
                    let gap =
                        ((ss.rna.len() - helix.end() + 1) as f64 * occupancy).min(2.0 * diameter);
                    layout.strands.insert(s, [hx, hy, hx + gap, hy]);
                }
            }
        } else {
            let first = ss
                .helices
                .iter()
                .position(|h| h.end() + 1 == strand.start());
            let second = ss
                .helices
                .iter()
                .position(|h| h.start() == strand.end() + 1);
            if let (Some(first), Some(second)) = (first, second) {
                if let (Some(&[x1, y1, _, _]), Some(&[x2, y2, _, _])) =
                    (layout.helices.get(&first), layout.helices.get(&second))
                {
                    layout.strands.insert(s, [x1, y1, x2, y2]);
                }
            }
        }
    }

    render_svg(ss, &layout, options)
}

struct Layout {
    /// Helix index to [x1, y1, x2, y2], bottom first.
    helices: HashMap<HelixIdx, [f64; 4]>,
    /// Junction index to circle center.
    junctions: HashMap<JunctionIdx, [f64; 2]>,
    strands: HashMap<usize, [f64; 4]>,
}

fn h_start(ss: &SecondaryStructure, h: HelixIdx) -> usize {
    ss.helices[h].start()
}

/// Sequence span of the whole stem-loop below an apical loop: follow the
/// entry helix outward through inner loops to the base of the stalk.
fn stem_loop_span(ss: &SecondaryStructure, apical: JunctionIdx) -> (usize, usize) {
    let mut helix = ss.junctions[apical].helices[0];
    while let Some(outer) = ss.helices[helix].junctions.outer {
        if ss.junctions[outer].junction_type != JunctionType::InnerLoop {
            break;
        }
        helix = ss.junctions[outer].helices[0];
    }
    (ss.helices[helix].start(), ss.helices[helix].end())
}

fn draw_branch(
    ss: &SecondaryStructure,
    layout: &mut Layout,
    helix: HelixIdx,
    x_coords: &[f64],
    apical_loops: &[JunctionIdx],
    current_y: f64,
    options: &BooquetOptions,
) {
    let occupancy = options.residue_occupancy;
    let diameter = options.junction_diameter;
    let helix_model = &ss.helices[helix];
    let inner5 = helix_model.location.blocks[0].end;

    let mut enclosed: Vec<JunctionIdx> = Vec::new();
    let mut next_junction: Option<JunctionIdx> = None;

    for (j, junction) in ss.junctions.iter().enumerate() {
        if junction.start() != inner5 {
            continue;
        }
        next_junction = Some(j);
        let blocks = &junction.location.blocks;
        match blocks.len() {
            1 => {}
            2 => {
                let child_y =
                    current_y - helix_model.len() as f64 * occupancy - 1.5 * diameter;
                for (h, _) in ss
                    .helices
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| h.start() == blocks[0].end)
                {
                    draw_branch(ss, layout, h, x_coords, apical_loops, child_y, options);
                }
                for &apical in apical_loops {
                    let (start, end) = stem_loop_span(ss, apical);
                    if start >= blocks[0].start && end <= junction.end() {
                        enclosed.push(apical);
                    }
                }
            }
            _ => {
                let child_y =
                    current_y - helix_model.len() as f64 * occupancy - 1.5 * diameter;
                for i in 0..blocks.len() - 1 {
                    for (h, _) in ss
                        .helices
                        .iter()
                        .enumerate()
                        .filter(|(_, h)| h.start() == blocks[i].end)
                    {
                        draw_branch(ss, layout, h, x_coords, apical_loops, child_y, options);
                    }
                    for &apical in apical_loops {
                        let (start, end) = stem_loop_span(ss, apical);
                        if start >= blocks[i].end && end <= blocks[i + 1].start {
                            enclosed.push(apical);
                        }
                    }
                }
            }
        }
    }

    if enclosed.is_empty() {
        for &apical in apical_loops {
            let (start, end) = stem_loop_span(ss, apical);
            if helix_model.start() >= start && helix_model.end() <= end {
                enclosed.push(apical);
            }
        }
    }

    let xs: Vec<f64> = enclosed
        .iter()
        .filter_map(|a| apical_loops.iter().position(|b| b == a))
        .map(|i| x_coords[i])
        .collect();
    let m = if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    };

    let top_y = current_y - helix_model.len() as f64 * occupancy;
    layout.helices.insert(helix, [m, current_y, m, top_y]);
    if let Some(j) = next_junction {
        layout
            .junctions
            .insert(j, [m, top_y - 1.5 * diameter / 2.0]);
    }
}

fn render_svg(ss: &SecondaryStructure, layout: &Layout, options: &BooquetOptions) -> String {
    let diameter = options.junction_diameter;
    let color = options.color;
    let line_width = options.line_width;

    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let xs = layout
        .helices
        .values()
        .chain(layout.strands.values())
        .map(|c| (c[0], c[1]))
        .chain(layout.junctions.values().map(|c| (c[0], c[1])));
    for (x, y) in xs {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    if !min_x.is_finite() {
        return "<svg width=\"0\" height=\"0\" xmlns=\"http://www.w3.org/2000/svg\">\n</svg>"
            .to_string();
    }
    min_x -= diameter;
    min_y -= 2.0 * diameter;
    max_x += diameter;

    let ratio = (options.width / (max_x - min_x)).min(options.height / (max_y - min_y));
    min_x *= ratio;
    min_y *= ratio;
    max_x *= ratio;
    max_y *= ratio;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">",
        max_x - min_x,
        max_y - min_y
    );

    let line = |svg: &mut String, x1: f64, y1: f64, x2: f64, y2: f64| {
        let _ = writeln!(
            svg,
            "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\"/>",
            x1 * ratio - min_x,
            y1 * ratio - min_y,
            x2 * ratio - min_x,
            y2 * ratio - min_y,
            color,
            line_width
        );
    };

    for h in 0..ss.helices.len() {
        if let Some(c) = layout.helices.get(&h) {
            line(&mut svg, c[0], c[1], c[2], c[3]);
        }
    }

    // Direct links between consecutive branch roots.
    let roots = ss.branch_roots();
    for window in roots.windows(2) {
        if ss.helices[window[0]].end() + 1 == ss.helices[window[1]].start() {
            if let (Some(a), Some(b)) = (
                layout.helices.get(&window[0]),
                layout.helices.get(&window[1]),
            ) {
                line(&mut svg, a[0], a[1], b[0], b[1]);
            }
        }
    }

    for s in 0..ss.single_strands.len() {
        if let Some(c) = layout.strands.get(&s) {
            line(&mut svg, c[0], c[1], c[2], c[3]);
        }
    }

    for (j, junction) in ss.junctions.iter().enumerate() {
        let Some(center) = layout.junctions.get(&j) else {
            continue;
        };
        let cx = center[0] * ratio - min_x;
        let cy = center[1] * ratio - min_y;
        let _ = writeln!(
            svg,
            "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{}\" stroke=\"{color}\" stroke-width=\"{line_width}\" fill=\"{color}\"/>",
            diameter / 2.0 * ratio
        );
        let _ = writeln!(
            svg,
            "<circle cx=\"{cx}\" cy=\"{cy}\" r=\"{}\" stroke=\"{color}\" stroke-width=\"{line_width}\" fill=\"none\"/>",
            1.5 * diameter / 2.0 * ratio
        );

        if matches!(
            junction.junction_type,
            JunctionType::ApicalLoop | JunctionType::InnerLoop
        ) {
            continue;
        }
        // Arms from the junction circle to out-helices living on another
        // stalk.
        let blocks = &junction.location.blocks;
        for block in &blocks[..blocks.len() - 1] {
            for (h, _) in ss
                .helices
                .iter()
                .enumerate()
                .filter(|(_, h)| h.start() == block.end)
            {
                let Some(helix_coords) = layout.helices.get(&h) else {
                    continue;
                };
                if helix_coords[1] == center[1] {
                    continue;
                }
                let from = crate::geometry::Point::new(helix_coords[0], helix_coords[1]);
                let to = crate::geometry::Point::new(center[0], center[1]);
                let trimmed = crate::geometry::points_from(from, to, 1.5 * diameter / 2.0).1;
                line(&mut svg, from.x, from.y, trimmed.x, trimmed.y);
            }
        }
    }

    svg.push_str("</svg>");
    svg
}
