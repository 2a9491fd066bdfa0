//! SVG serialization of a drawing and JSON export of its scene graph.
//!
//! Rendering goes through a [`WorkingSession`]: every coordinate is
//! transformed, radii scale with the zoom level, stroke widths do not.
//! Elements whose resolved style asks for full details expand into residue
//! circles, letters and bond lines; otherwise helices stay single lines and
//! junctions stay circles.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::drawing::{BondKind, Drawing, ResidueParent};
use crate::geometry::{distance, points_from, Line, Point, Rect, RADIUS_CONST};
use crate::symbols::LwSymbol;
use crate::theme::ResolvedStyle;
use crate::viewport::WorkingSession;

/// Options controlling the SVG document, not the drawing itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SvgOptions {
    /// Document width in pixels (default: 1024.0)
    pub width: f64,
    /// Document height in pixels (default: 768.0)
    pub height: f64,
    /// Fit the drawing into the document frame before rendering (default: true)
    pub fit: bool,
    /// Background color, `None` leaves the document transparent
    pub background: Option<String>,
}

impl Default for SvgOptions {
    fn default() -> Self {
        SvgOptions {
            width: 1024.0,
            height: 768.0,
            fit: true,
            background: None,
        }
    }
}

/// Render a drawing as an SVG string.
pub fn render(drawing: &Drawing, session: &WorkingSession, opts: &SvgOptions) -> String {
    let fitted;
    let session = if opts.fit {
        let mut s = *session;
        s.fit_to(drawing, &Rect::new(0.0, 0.0, opts.width, opts.height));
        fitted = s;
        &fitted
    } else {
        session
    };

    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {:.2} {:.2}">"#,
        opts.width, opts.height
    );
    if let Some(background) = &opts.background {
        let _ = write!(
            svg,
            r#"<rect x="0" y="0" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            opts.width, opts.height, background
        );
    }

    // Layer order (back to front): single strands, bonds between branches,
    // junctions and helices per branch, residue-level details, pseudoknots
    // and tertiaries.
    render_strands(&mut svg, drawing, session);
    render_branch_bonds(&mut svg, drawing, session);
    render_branches(&mut svg, drawing, session);
    render_details(&mut svg, drawing, session);
    render_tertiaries(&mut svg, drawing, session);

    svg.push_str("</svg>");
    svg
}

// ── layers ──────────────────────────────────────────────────────────────────

fn render_strands(svg: &mut String, drawing: &Drawing, session: &WorkingSession) {
    for strand in &drawing.single_strands {
        let style = drawing.resolved(&strand.style);
        if !style.full_details {
            write_line(svg, strand.line, &style, session);
        }
    }
}

fn render_branch_bonds(svg: &mut String, drawing: &Drawing, session: &WorkingSession) {
    for bond in &drawing.bonds {
        if matches!(bond.kind, BondKind::BranchesLinking { .. }) {
            let style = drawing.resolved(&bond.style);
            let line = Line::new(drawing.positions[bond.start], drawing.positions[bond.end]);
            write_line(svg, line, &style, session);
        }
    }
}

fn render_branches(svg: &mut String, drawing: &Drawing, session: &WorkingSession) {
    for branch in &drawing.skeleton.branches {
        for &j in &branch.junctions {
            let junction = &drawing.junctions[j];
            let style = drawing.resolved(&junction.style);
            if !style.full_details {
                let center = session.transform(junction.center);
                write_circle(
                    svg,
                    center,
                    junction.radius * session.zoom,
                    &style,
                    false,
                );
            }
        }
        for &h in &branch.helices {
            let helix = &drawing.helices[h];
            let style = drawing.resolved(&helix.style);
            if !style.full_details {
                write_line(svg, helix.line, &style, session);
            }
        }
    }
}

/// Residue circles and letters, phosphodiester bonds and interaction
/// symbols, for every element drawn in full details.
fn render_details(svg: &mut String, drawing: &Drawing, session: &WorkingSession) {
    for bond in &drawing.bonds {
        if matches!(bond.kind, BondKind::BranchesLinking { .. }) {
            continue;
        }
        if !bond_full_details(drawing, bond) {
            continue;
        }
        let style = drawing.resolved(&bond.style);
        let p1 = drawing.positions[bond.start];
        let p2 = drawing.positions[bond.end];
        if distance(p1, p2) <= 2.0 * RADIUS_CONST {
            continue;
        }
        let (t1, t2) = points_from(p1, p2, RADIUS_CONST);
        write_line(svg, Line::new(t1, t2), &style, session);
    }

    for interaction in &drawing.secondaries {
        let drawn = match interaction.helix {
            Some(helix) => helix_full_details(drawing, helix),
            None => drawing.resolved(&drawing.style).full_details,
        };
        if !drawn {
            continue;
        }
        let style = drawing.resolved(&interaction.style);
        let symbol_style = drawing.resolved(&interaction.symbol_style);
        if symbol_style.full_details {
            for symbol in &interaction.symbols {
                write_symbol(svg, symbol, &symbol_style, session);
            }
        } else if let Some(symbol) = &interaction.default_symbol {
            write_symbol(svg, symbol, &style, session);
        }
    }

    for residue in &drawing.residues {
        if !parent_full_details(drawing, residue.parent) {
            continue;
        }
        let style = drawing.resolved(&residue.style);
        let center = session.transform(residue.center);
        let radius = RADIUS_CONST * session.zoom;
        write_circle(svg, center, radius, &style, false);
        let _ = write!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" font-family="monospace" font-size="{:.2}" text-anchor="middle" dominant-baseline="central" fill="{}"{}>{}</text>"#,
            center.x,
            center.y,
            radius * 1.5,
            style.color,
            opacity_attr(&style, "fill-opacity"),
            residue.letter
        );
    }
}

fn render_tertiaries(svg: &mut String, drawing: &Drawing, session: &WorkingSession) {
    let mut in_pknot = vec![false; drawing.tertiaries.len()];
    for pknot in &drawing.pknots {
        let style = drawing.resolved(&pknot.style);
        for &t in &pknot.tertiaries {
            in_pknot[t] = true;
            if style.full_details {
                render_tertiary(svg, drawing, t, session);
            }
        }
        if !style.full_details {
            if let Some([p1, p2, p3]) = pknot.elbow {
                write_line(svg, Line::new(p1, p2), &style, session);
                write_line(svg, Line::new(p2, p3), &style, session);
            }
        }
    }
    for t in 0..drawing.tertiaries.len() {
        if !in_pknot[t] {
            render_tertiary(svg, drawing, t, session);
        }
    }
}

fn render_tertiary(svg: &mut String, drawing: &Drawing, t: usize, session: &WorkingSession) {
    let interaction = &drawing.tertiaries[t];
    let style = drawing.resolved(&interaction.style);
    let symbol_style = drawing.resolved(&interaction.symbol_style);
    if style.full_details {
        for symbol in &interaction.symbols {
            write_symbol(svg, symbol, &symbol_style, session);
        }
    } else {
        let p1 = drawing.positions[interaction.pair.start];
        let p2 = drawing.positions[interaction.pair.end];
        if distance(p1, p2) > 2.0 * RADIUS_CONST {
            let (t1, t2) = points_from(p1, p2, RADIUS_CONST);
            write_line(svg, Line::new(t1, t2), &style, session);
        }
    }
}

// ── element primitives ──────────────────────────────────────────────────────

/// The details level of the structural element a bond belongs to.
fn bond_full_details(drawing: &Drawing, bond: &crate::drawing::BondDrawing) -> bool {
    match bond.kind {
        BondKind::Helical { helix } => helix_full_details(drawing, helix),
        BondKind::HelicesDirectLink { junction, .. }
        | BondKind::InHelixClosing { junction, .. }
        | BondKind::OutHelixClosing { junction, .. }
        | BondKind::Junction { junction } => junction_full_details(drawing, junction),
        BondKind::SingleStrand { strand } | BondKind::StrandToBranch { strand, .. } => {
            strand_full_details(drawing, strand)
        }
        BondKind::BranchesLinking { .. } => false,
    }
}

fn parent_full_details(drawing: &Drawing, parent: ResidueParent) -> bool {
    match parent {
        ResidueParent::Interaction(i) => match drawing.secondaries.get(i).and_then(|s| s.helix) {
            Some(helix) => helix_full_details(drawing, helix),
            None => drawing.resolved(&drawing.style).full_details,
        },
        ResidueParent::Junction(j) => match drawing.junctions.get(j) {
            Some(junction) => drawing.resolved(&junction.style).full_details,
            None => drawing.resolved(&drawing.style).full_details,
        },
        ResidueParent::Strand(s) => match drawing.single_strands.get(s) {
            Some(strand) => drawing.resolved(&strand.style).full_details,
            None => drawing.resolved(&drawing.style).full_details,
        },
    }
}

fn helix_full_details(drawing: &Drawing, helix: crate::model::HelixIdx) -> bool {
    match drawing.helices.iter().find(|h| h.helix == helix) {
        Some(h) => drawing.resolved(&h.style).full_details,
        None => drawing.resolved(&drawing.style).full_details,
    }
}

fn junction_full_details(drawing: &Drawing, junction: crate::model::JunctionIdx) -> bool {
    match drawing.junctions.iter().find(|j| j.junction == junction) {
        Some(j) => drawing.resolved(&j.style).full_details,
        None => drawing.resolved(&drawing.style).full_details,
    }
}

fn strand_full_details(drawing: &Drawing, strand: usize) -> bool {
    match drawing.single_strands.iter().find(|s| s.strand == strand) {
        Some(s) => drawing.resolved(&s.style).full_details,
        None => drawing.resolved(&drawing.style).full_details,
    }
}

fn write_line(svg: &mut String, line: Line, style: &ResolvedStyle, session: &WorkingSession) {
    let p1 = session.transform(line.p1);
    let p2 = session.transform(line.p2);
    let _ = write!(
        svg,
        r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{}" stroke-linecap="round"{}/>"#,
        p1.x,
        p1.y,
        p2.x,
        p2.y,
        style.color,
        style.line_width,
        opacity_attr(style, "stroke-opacity")
    );
}

fn write_circle(svg: &mut String, center: Point, radius: f64, style: &ResolvedStyle, fill: bool) {
    let fill_value = if fill {
        style.color.to_string()
    } else {
        "none".to_string()
    };
    let _ = write!(
        svg,
        r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" stroke="{}" stroke-width="{}" fill="{}"{}/>"#,
        center.x,
        center.y,
        radius,
        style.color,
        style.line_width,
        fill_value,
        opacity_attr(style, "stroke-opacity")
    );
}

fn write_symbol(svg: &mut String, symbol: &LwSymbol, style: &ResolvedStyle, session: &WorkingSession) {
    match symbol {
        LwSymbol::Line { p1, p2 } => {
            write_line(svg, Line::new(*p1, *p2), style, session);
        }
        LwSymbol::CisWc { center, radius } | LwSymbol::TransWc { center, radius } => {
            write_circle(
                svg,
                session.transform(*center),
                radius * session.zoom,
                style,
                symbol.is_filled(),
            );
        }
        LwSymbol::CisHoogsteen { corners } | LwSymbol::TransHoogsteen { corners } => {
            write_polygon(svg, corners, style, symbol.is_filled(), session);
        }
        LwSymbol::CisSugar { vertices } | LwSymbol::TransSugar { vertices } => {
            write_polygon(svg, vertices, style, symbol.is_filled(), session);
        }
    }
}

fn write_polygon(
    svg: &mut String,
    points: &[Point],
    style: &ResolvedStyle,
    filled: bool,
    session: &WorkingSession,
) {
    let mut coords = String::new();
    for p in points {
        let t = session.transform(*p);
        let _ = write!(coords, "{:.2},{:.2} ", t.x, t.y);
    }
    let fill_value = if filled {
        style.color.to_string()
    } else {
        "none".to_string()
    };
    let _ = write!(
        svg,
        r#"<polygon points="{}" stroke="{}" stroke-width="{}" fill="{}"{}/>"#,
        coords.trim_end(),
        style.color,
        style.line_width,
        fill_value,
        opacity_attr(style, "stroke-opacity")
    );
}

fn opacity_attr(style: &ResolvedStyle, attribute: &str) -> String {
    if style.opacity == 255 {
        String::new()
    } else {
        format!(
            " {}=\"{:.3}\"",
            attribute,
            style.opacity as f64 / 255.0
        )
    }
}

// ── scene export ────────────────────────────────────────────────────────────

/// Serializable snapshot of a drawing's scene graph, in drawing coordinates.
#[derive(Serialize)]
pub struct SceneExport<'a> {
    pub name: &'a str,
    pub sequence: &'a str,
    pub residues: Vec<ResidueExport>,
    pub helices: Vec<HelixExport<'a>>,
    pub junctions: Vec<JunctionExport<'a>>,
    pub single_strands: Vec<StrandExport<'a>>,
    pub pknot_elbows: Vec<[Point; 3]>,
    pub bounds: Rect,
}

#[derive(Serialize)]
pub struct ResidueExport {
    pub pos: usize,
    pub letter: char,
    pub center: Point,
}

#[derive(Serialize)]
pub struct HelixExport<'a> {
    pub name: &'a str,
    pub line: Line,
}

#[derive(Serialize)]
pub struct JunctionExport<'a> {
    pub name: &'a str,
    pub center: Point,
    pub radius: f64,
    pub search_exhausted: bool,
}

#[derive(Serialize)]
pub struct StrandExport<'a> {
    pub name: &'a str,
    pub line: Line,
}

/// Snapshot a drawing for JSON serialization.
pub fn export(drawing: &Drawing) -> SceneExport<'_> {
    SceneExport {
        name: &drawing.name,
        sequence: &drawing.ss.rna.seq,
        residues: drawing
            .residues
            .iter()
            .map(|r| ResidueExport {
                pos: r.pos,
                letter: r.letter,
                center: r.center,
            })
            .collect(),
        helices: drawing
            .helices
            .iter()
            .map(|h| HelixExport {
                name: &drawing.ss.helices[h.helix].name,
                line: h.line,
            })
            .collect(),
        junctions: drawing
            .junctions
            .iter()
            .map(|j| JunctionExport {
                name: &drawing.ss.junctions[j.junction].name,
                center: j.center,
                radius: j.radius,
                search_exhausted: drawing.skeleton.junctions[j.geometry].search_exhausted,
            })
            .collect(),
        single_strands: drawing
            .single_strands
            .iter()
            .map(|s| StrandExport {
                name: &drawing.ss.single_strands[s.strand].name,
                line: s.line,
            })
            .collect(),
        pknot_elbows: drawing.pknots.iter().filter_map(|p| p.elbow).collect(),
        bounds: drawing.bounds(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SecondaryStructure;
    use crate::skeleton::LayoutOptions;
    use crate::theme::{ElementKind, StyleParameter, Theme};

    fn draw(seq: &str, bracket: &str) -> Drawing {
        let ss = SecondaryStructure::from_bracket_notation("svg", seq, bracket).unwrap();
        Drawing::new(ss, &LayoutOptions::default()).unwrap()
    }

    #[test]
    fn full_details_hairpin_has_residues_and_letters() {
        let drawing = draw("GGGGAAAACCCC", "((((....))))");
        let svg = render(
            &drawing,
            &WorkingSession::default(),
            &SvgOptions::default(),
        );
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(">G<"));
        assert!(svg.contains(">A<"));
        // One circle per residue; canonical pair symbols stay lines.
        assert!(svg.matches("<circle").count() >= 12);
    }

    #[test]
    fn schematic_render_uses_lines_and_junction_circles() {
        let mut drawing = draw("GGGGAAAACCCC", "((((....))))");
        let mut theme = Theme::default();
        theme.set(ElementKind::Full2D, StyleParameter::FullDetails, "false")
            .unwrap();
        drawing.apply_theme(&theme);
        let svg = render(
            &drawing,
            &WorkingSession::default(),
            &SvgOptions::default(),
        );
        assert!(!svg.contains("<text"));
        // Helix line plus one open junction circle.
        assert!(svg.contains("<line"));
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains(r#"fill="none""#));
    }

    #[test]
    fn theme_color_reaches_the_output() {
        let mut drawing = draw("GGGGAAAACCCC", "((((....))))");
        let mut theme = Theme::default();
        theme.set(ElementKind::Full2D, StyleParameter::Color, "#FF0000")
            .unwrap();
        drawing.apply_theme(&theme);
        let svg = render(
            &drawing,
            &WorkingSession::default(),
            &SvgOptions::default(),
        );
        assert!(svg.contains("#FF0000"));
        assert!(!svg.contains("#404040"));
    }

    #[test]
    fn opacity_below_max_emits_an_attribute() {
        let mut drawing = draw("GGGGAAAACCCC", "((((....))))");
        let mut theme = Theme::default();
        theme.set(ElementKind::Full2D, StyleParameter::Opacity, "128")
            .unwrap();
        drawing.apply_theme(&theme);
        let svg = render(
            &drawing,
            &WorkingSession::default(),
            &SvgOptions::default(),
        );
        assert!(svg.contains("stroke-opacity=\"0.502\""));
    }

    #[test]
    fn background_rect_is_optional() {
        let drawing = draw("GGGAAAACCC", "(((....)))");
        let opts = SvgOptions {
            background: Some("white".into()),
            ..SvgOptions::default()
        };
        let svg = render(&drawing, &WorkingSession::default(), &opts);
        assert!(svg.contains(r#"fill="white""#));
        let opts = SvgOptions::default();
        let svg = render(&drawing, &WorkingSession::default(), &opts);
        assert!(!svg.contains("<rect"));
    }

    #[test]
    fn export_round_trips_through_json() {
        let drawing = draw("GGGGAAAACCCC", "((((....))))");
        let json = serde_json::to_string(&export(&drawing)).unwrap();
        assert!(json.contains("\"sequence\":\"GGGGAAAACCCC\""));
        assert!(json.contains("\"residues\""));
        assert!(json.contains("\"junctions\""));
        assert!(json.contains("\"search_exhausted\":false"));
    }
}
