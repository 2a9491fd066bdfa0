use rnalayout_core::drawing::Drawing;
use rnalayout_core::geometry::{
    distance, helix_drawing_length, junction_radius, Rect, RADIUS_CONST,
};
use rnalayout_core::model::{JunctionType, SecondaryStructure};
use rnalayout_core::skeleton::LayoutOptions;
use rnalayout_core::theme::{Color, Theme};
use rnalayout_core::viewport::WorkingSession;
use rnalayout_core::{booquet, svg, BooquetOptions, SvgOptions};

const TRNA_SEQ: &str =
    "GCGGAUUUAGCUCAGUUGGGAGAGCGCCAGACUGAAGAUCUGGAGGUCCUGUGUUCGAUCCACAGAAUUCGCACCA";
const TRNA_STRUCT: &str =
    "(((((((..((((........)))).((((.........)))).....(((((.......))))))))))))....";

fn compare_f64(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

fn draw(seq: &str, bracket: &str) -> Drawing {
    let ss = SecondaryStructure::from_bracket_notation("test", seq, bracket).unwrap();
    Drawing::new(ss, &LayoutOptions::default()).unwrap()
}

#[test]
fn helix_lines_have_the_expected_length() {
    let drawing = draw("GGGGAAAACCCC", "((((....))))");
    assert_eq!(drawing.helices.len(), 1);
    let line = drawing.helices[0].line;
    assert!(compare_f64(line.length(), helix_drawing_length(4), 1e-9));
}

#[test]
fn junction_circles_have_the_expected_radius() {
    let drawing = draw(&"G".repeat(26), "((..((....))..((....))..))");
    let three_way = drawing
        .junctions
        .iter()
        .find(|j| drawing.ss.junctions[j.junction].junction_type == JunctionType::ThreeWay)
        .unwrap();
    let model = &drawing.ss.junctions[three_way.junction];
    let expected = junction_radius(model.len(), model.slots());
    assert!(compare_f64(three_way.radius, expected, 1e-9));
}

#[test]
fn every_residue_is_placed() {
    let drawing = draw(TRNA_SEQ, TRNA_STRUCT);
    assert_eq!(drawing.residues.len(), TRNA_SEQ.len());
    for (i, r) in drawing.residues.iter().enumerate() {
        assert_eq!(r.pos, i + 1);
        assert!(r.center.x.is_finite() && r.center.y.is_finite());
    }
    // Consecutive residues never collapse onto the same point.
    for pair in drawing.residues.windows(2) {
        assert!(distance(pair[0].center, pair[1].center) > 1e-6);
    }
}

#[test]
fn layout_is_deterministic() {
    let a = draw(TRNA_SEQ, TRNA_STRUCT);
    let b = draw(TRNA_SEQ, TRNA_STRUCT);
    for (ra, rb) in a.residues.iter().zip(&b.residues) {
        assert_eq!(ra.center.x.to_bits(), rb.center.x.to_bits());
        assert_eq!(ra.center.y.to_bits(), rb.center.y.to_bits());
    }
}

#[test]
fn cloverleaf_builds_a_four_way_junction() {
    let drawing = draw(TRNA_SEQ, TRNA_STRUCT);
    let four_ways = drawing
        .ss
        .junctions
        .iter()
        .filter(|j| j.junction_type == JunctionType::FourWay)
        .count();
    assert_eq!(four_ways, 1);
    assert_eq!(drawing.ss.helices.len(), 4);
    assert_eq!(drawing.junctions.len(), 4);
    // No exhausted collision search on a plain cloverleaf.
    for junction in &drawing.skeleton.junctions {
        assert!(!junction.search_exhausted);
    }
}

#[test]
fn sibling_junction_circles_do_not_overlap() {
    let drawing = draw(TRNA_SEQ, TRNA_STRUCT);
    let apical: Vec<_> = drawing
        .junctions
        .iter()
        .filter(|j| {
            drawing.ss.junctions[j.junction].junction_type == JunctionType::ApicalLoop
        })
        .collect();
    assert_eq!(apical.len(), 3);
    for i in 0..apical.len() {
        for j in i + 1..apical.len() {
            let gap = distance(apical[i].center, apical[j].center);
            assert!(
                gap > apical[i].radius + apical[j].radius,
                "apical loops {i} and {j} overlap, gap {gap}"
            );
        }
    }
}

#[test]
fn branch_roots_share_a_baseline() {
    let drawing = draw(&"G".repeat(30), "..((((....))))..((((....))))..");
    assert_eq!(drawing.skeleton.branches.len(), 2);
    let ys: Vec<f64> = drawing
        .skeleton
        .branches
        .iter()
        .map(|b| drawing.skeleton.helices[b.helices[0]].line.p1.y)
        .collect();
    assert!(compare_f64(ys[0], ys[1], 1e-9));
    // Second branch sits to the right of the first.
    let xs: Vec<f64> = drawing
        .skeleton
        .branches
        .iter()
        .map(|b| drawing.skeleton.helices[b.helices[0]].line.p1.x)
        .collect();
    assert!(xs[1] > xs[0]);
}

#[test]
fn fitted_session_maps_bounds_into_frame() {
    let drawing = draw(TRNA_SEQ, TRNA_STRUCT);
    let frame = Rect::new(0.0, 0.0, 800.0, 600.0);
    let mut session = WorkingSession::default();
    session.fit_to(&drawing, &frame);
    for residue in &drawing.residues {
        let p = session.transform(residue.center);
        assert!(frame.inflated(RADIUS_CONST).contains(p));
    }
}

#[test]
fn svg_renders_the_cloverleaf() {
    let drawing = draw(TRNA_SEQ, TRNA_STRUCT);
    let out = svg::render(
        &drawing,
        &WorkingSession::default(),
        &SvgOptions::default(),
    );
    assert!(out.starts_with("<svg"));
    assert!(out.ends_with("</svg>"));
    // One letter per residue.
    assert_eq!(out.matches("<text").count(), TRNA_SEQ.len());
}

#[test]
fn pknot_brackets_become_tertiaries() {
    let drawing = draw(&"G".repeat(22), "((((..[[..))))...]]...");
    assert_eq!(drawing.pknots.len(), 1);
    assert_eq!(drawing.tertiaries.len(), 2);
    assert!(drawing.pknots[0].elbow.is_some());
}

#[test]
fn theme_from_json_restyles_the_drawing() {
    let mut drawing = draw(TRNA_SEQ, TRNA_STRUCT);
    let theme: Theme = serde_json::from_str(
        r##"{"configurations": {"full_2d": {"color": "#1F77B4"}, "helix": {"full_details": "false"}}}"##,
    )
    .unwrap();
    theme.validate().unwrap();
    drawing.apply_theme(&theme);
    assert_eq!(drawing.style.color(), Some(Color::parse("#1F77B4").unwrap()));
    let out = svg::render(
        &drawing,
        &WorkingSession::default(),
        &SvgOptions::default(),
    );
    assert!(out.contains("#1F77B4"));
}

#[test]
fn applying_the_same_theme_twice_changes_nothing() {
    let mut drawing = draw(TRNA_SEQ, TRNA_STRUCT);
    let theme: Theme = serde_json::from_str(
        r##"{"configurations": {"full_2d": {"line_width": "2.0"}, "secondary_interaction": {"full_details": "true", "line_shift": "2.5"}}}"##,
    )
    .unwrap();
    theme.validate().unwrap();

    drawing.apply_theme(&theme);
    let symbols_once: Vec<_> = drawing
        .secondaries
        .iter()
        .map(|s| s.symbols.clone())
        .collect();
    let svg_once = svg::render(
        &drawing,
        &WorkingSession::default(),
        &SvgOptions::default(),
    );

    drawing.apply_theme(&theme);
    let symbols_twice: Vec<_> = drawing
        .secondaries
        .iter()
        .map(|s| s.symbols.clone())
        .collect();
    assert_eq!(symbols_once, symbols_twice);
    let svg_twice = svg::render(
        &drawing,
        &WorkingSession::default(),
        &SvgOptions::default(),
    );
    assert_eq!(svg_once, svg_twice);
}

#[test]
fn booquet_overview_of_the_cloverleaf() {
    let ss = SecondaryStructure::from_bracket_notation("trna", TRNA_SEQ, TRNA_STRUCT).unwrap();
    let out = booquet::booquet(&ss, &BooquetOptions::default());
    assert!(out.starts_with("<svg"));
    // Three stem-loops at three distinct abscissas, each a filled circle.
    assert_eq!(out.matches("fill=\"none\"").count(), 4);
    assert!(out.matches("<line").count() >= 4);
}
