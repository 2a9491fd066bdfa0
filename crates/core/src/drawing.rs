//! The drawing scene graph.
//!
//! A [`Drawing`] owns the structural model, the resolved skeleton and the
//! residue positions, plus flat arenas of drawable elements referencing each
//! other by index. Geometry that depends on styling, the Leontis-Westhof
//! symbol rows and the pknot elbows, is rebuilt by [`Drawing::refresh_symbols`]
//! after every theme application.

use serde::Serialize;

use crate::geometry::{
    distance, helix_drawing_width, points_from, Line, Point, Rect, RADIUS_CONST,
};
use crate::interpolate::{place_residues, ResiduePositions};
use crate::location::Location;
use crate::model::{BasePair, HelixIdx, JunctionIdx, SecondaryStructure};
use crate::skeleton::{DrawingError, LayoutOptions, Skeleton};
use crate::symbols::{assemble, LwSymbol, VPos};
use crate::theme::{AdvancedTheme, ElementKind, ResolvedStyle, Style, Theme};

/// What a residue hangs from in the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResidueParent {
    /// Index into the secondary interactions.
    Interaction(usize),
    /// Index into the junction drawings.
    Junction(usize),
    /// Index into the single strand drawings.
    Strand(usize),
}

#[derive(Debug, Clone)]
pub struct ResidueDrawing {
    pub pos: usize,
    pub letter: char,
    pub center: Point,
    pub parent: ResidueParent,
    pub style: Style,
}

#[derive(Debug, Clone)]
pub struct HelixDrawing {
    pub helix: HelixIdx,
    pub line: Line,
    pub style: Style,
}

#[derive(Debug, Clone)]
pub struct JunctionDrawing {
    pub junction: JunctionIdx,
    /// Index of the matching circle in the skeleton arena.
    pub geometry: usize,
    pub center: Point,
    pub radius: f64,
    pub style: Style,
}

#[derive(Debug, Clone)]
pub struct StrandDrawing {
    /// Index into the model's single strands.
    pub strand: usize,
    /// Index of the matching segment in the skeleton arena.
    pub geometry: usize,
    pub line: Line,
    pub style: Style,
}

/// A base-base interaction, secondary or tertiary.
#[derive(Debug, Clone)]
pub struct InteractionDrawing {
    pub pair: BasePair,
    /// Set for secondary interactions, the helix the pair belongs to.
    pub helix: Option<HelixIdx>,
    /// Symbol row, empty when the residues sit too close.
    pub symbols: Vec<LwSymbol>,
    /// Plain line drawn when the symbols are switched off.
    pub default_symbol: Option<LwSymbol>,
    pub style: Style,
    pub symbol_style: Style,
}

impl InteractionDrawing {
    pub fn location(&self) -> Location {
        Location::from_positions([self.pair.start, self.pair.end])
    }

    /// Union of the symbol frames, `None` while no symbols are built.
    pub fn bounds(&self) -> Option<Rect> {
        let mut acc: Option<Rect> = None;
        for symbol in &self.symbols {
            if let Some(b) = symbol.bounds() {
                acc = Some(match acc {
                    Some(a) => a.union(&b),
                    None => b,
                });
            }
        }
        acc
    }
}

/// One pseudoknot: its crossing pairs as tertiary interactions plus the
/// elbow polyline drawn in schematic mode.
#[derive(Debug, Clone)]
pub struct PknotDrawing {
    pub pknot: usize,
    /// Indices into the drawing's tertiary interactions.
    pub tertiaries: Vec<usize>,
    pub elbow: Option<[Point; 3]>,
    pub style: Style,
}

/// Classification of a phosphodiester bond between positions i and i+1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BondKind {
    /// Both residues paired in the same helix.
    Helical { helix: HelixIdx },
    /// A junction block of two residues, two helices meeting directly.
    HelicesDirectLink {
        junction: JunctionIdx,
        /// The bond end that is an entry helix extremity, if any.
        pos_in_helix: Option<usize>,
    },
    /// One end closes the junction's entry helix.
    InHelixClosing {
        junction: JunctionIdx,
        closing: usize,
    },
    /// One end closes an outgoing helix of the junction.
    OutHelixClosing {
        junction: JunctionIdx,
        closing: usize,
    },
    /// Plain bond inside a junction loop.
    Junction { junction: JunctionIdx },
    /// Plain bond inside a single strand.
    SingleStrand { strand: usize },
    /// A single strand meeting the root helix of a branch.
    StrandToBranch {
        strand: usize,
        branch: usize,
        /// The bond end inside the branch root helix.
        helix_pos: usize,
    },
    /// Two branch root helices back to back on the baseline.
    BranchesLinking { previous: usize, next: usize },
}

#[derive(Debug, Clone)]
pub struct BondDrawing {
    pub kind: BondKind,
    pub start: usize,
    pub end: usize,
    pub style: Style,
}

// ── per-element frames ──────────────────────────────────────────────────────

impl ResidueDrawing {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.center.x, self.center.y, self.center.x, self.center.y)
            .inflated(RADIUS_CONST)
    }

    /// Closed polygon for hit-testing, the frame corners.
    pub fn selection_points(&self) -> [Point; 4] {
        self.bounds().corners()
    }
}

impl HelixDrawing {
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.line.p1.x.min(self.line.p2.x),
            self.line.p1.y.min(self.line.p2.y),
            self.line.p1.x.max(self.line.p2.x),
            self.line.p1.y.max(self.line.p2.y),
        )
        .inflated(helix_drawing_width() / 2.0)
    }

    pub fn selection_points(&self) -> [Point; 4] {
        self.bounds().corners()
    }
}

impl JunctionDrawing {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.center.x, self.center.y, self.center.x, self.center.y)
            .inflated(self.radius + RADIUS_CONST)
    }

    pub fn selection_points(&self) -> [Point; 4] {
        self.bounds().corners()
    }
}

impl StrandDrawing {
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.line.p1.x.min(self.line.p2.x),
            self.line.p1.y.min(self.line.p2.y),
            self.line.p1.x.max(self.line.p2.x),
            self.line.p1.y.max(self.line.p2.y),
        )
        .inflated(RADIUS_CONST)
    }

    pub fn selection_points(&self) -> [Point; 4] {
        self.bounds().corners()
    }
}

/// A fully resolved 2D drawing of one RNA molecule.
#[derive(Debug, Clone)]
pub struct Drawing {
    pub name: String,
    pub ss: SecondaryStructure,
    pub skeleton: Skeleton,
    pub positions: ResiduePositions,
    /// Drawing-wide style, the fallback for every element.
    pub style: Style,
    pub residues: Vec<ResidueDrawing>,
    pub helices: Vec<HelixDrawing>,
    pub junctions: Vec<JunctionDrawing>,
    pub single_strands: Vec<StrandDrawing>,
    pub secondaries: Vec<InteractionDrawing>,
    pub tertiaries: Vec<InteractionDrawing>,
    pub pknots: Vec<PknotDrawing>,
    pub bonds: Vec<BondDrawing>,
}

impl Drawing {
    pub fn new(ss: SecondaryStructure, options: &LayoutOptions) -> Result<Drawing, DrawingError> {
        let skeleton = Skeleton::build(&ss, options)?;
        let positions = place_residues(&ss, &skeleton);

        let helices: Vec<HelixDrawing> = skeleton
            .helices
            .iter()
            .map(|g| HelixDrawing {
                helix: g.helix,
                line: g.line,
                style: Style::new(),
            })
            .collect();
        let junctions: Vec<JunctionDrawing> = skeleton
            .junctions
            .iter()
            .enumerate()
            .map(|(i, g)| JunctionDrawing {
                junction: g.junction,
                geometry: i,
                center: g.center,
                radius: g.radius,
                style: Style::new(),
            })
            .collect();
        let single_strands: Vec<StrandDrawing> = skeleton
            .strands
            .iter()
            .enumerate()
            .map(|(i, g)| StrandDrawing {
                strand: g.strand,
                geometry: i,
                line: g.line,
                style: Style::new(),
            })
            .collect();

        // One secondary interaction per base pair of every placed helix.
        let mut secondaries: Vec<InteractionDrawing> = Vec::new();
        let mut interaction_at = vec![None; ss.rna.len() + 1];
        for placed in &helices {
            let helix = &ss.helices[placed.helix];
            for pair in &helix.pairs {
                interaction_at[pair.start] = Some(secondaries.len());
                interaction_at[pair.end] = Some(secondaries.len());
                secondaries.push(InteractionDrawing {
                    pair: *pair,
                    helix: Some(placed.helix),
                    symbols: Vec::new(),
                    default_symbol: None,
                    style: Style::new(),
                    symbol_style: Style::new(),
                });
            }
        }

        let mut tertiaries: Vec<InteractionDrawing> = ss
            .tertiary_interactions
            .iter()
            .map(|pair| InteractionDrawing {
                pair: *pair,
                helix: None,
                symbols: Vec::new(),
                default_symbol: None,
                style: Style::new(),
                symbol_style: Style::new(),
            })
            .collect();

        let mut pknots: Vec<PknotDrawing> = Vec::new();
        for (p, pknot) in ss.pknots.iter().enumerate() {
            let mut indices = Vec::new();
            for pair in &pknot.pairs {
                indices.push(tertiaries.len());
                tertiaries.push(InteractionDrawing {
                    pair: *pair,
                    helix: None,
                    symbols: Vec::new(),
                    default_symbol: None,
                    style: Style::new(),
                    symbol_style: Style::new(),
                });
            }
            pknots.push(PknotDrawing {
                pknot: p,
                tertiaries: indices,
                elbow: None,
                style: Style::new(),
            });
        }

        let mut residues = Vec::with_capacity(ss.rna.len());
        for pos in 1..=ss.rna.len() {
            let parent = residue_parent(&ss, &junctions, &single_strands, &interaction_at, pos)
                .ok_or(DrawingError::OrphanResidue { position: pos })?;
            residues.push(ResidueDrawing {
                pos,
                letter: ss.rna.residue(pos).unwrap_or('X'),
                center: positions[pos],
                parent,
                style: Style::new(),
            });
        }

        let bonds = classify_bonds(&ss, &skeleton);

        let mut drawing = Drawing {
            name: ss.rna.name.clone(),
            ss,
            skeleton,
            positions,
            style: Style::new(),
            residues,
            helices,
            junctions,
            single_strands,
            secondaries,
            tertiaries,
            pknots,
            bonds,
        };
        drawing.refresh_symbols();
        Ok(drawing)
    }

    /// Resolve a sparse element style against the drawing style and the
    /// built-in defaults.
    pub fn resolved(&self, style: &Style) -> ResolvedStyle {
        ResolvedStyle::resolve(style, &self.style, true)
    }

    /// Rebuild the style-dependent geometry: interaction symbol rows and
    /// pknot elbows.
    pub fn refresh_symbols(&mut self) {
        for i in 0..self.secondaries.len() {
            let interaction = &self.secondaries[i];
            let c1 = self.positions[interaction.pair.start];
            let c2 = self.positions[interaction.pair.end];
            let own = self.resolved(&interaction.style);
            let residue = self
                .residues
                .get(interaction.pair.start - 1)
                .map(|r| self.resolved(&r.style).line_width)
                .unwrap_or(1.0);
            let shift = RADIUS_CONST + own.line_shift + residue / 2.0 + own.line_width / 2.0;

            let interaction = &mut self.secondaries[i];
            if distance(c1, c2) > 2.0 * shift {
                let (p1, p2) = points_from(c1, c2, shift);
                interaction.default_symbol = Some(LwSymbol::line(p1, p2, VPos::Middle));
                let canonical = is_canonical(&self.ss, &interaction.pair);
                let double = is_double_paired(&self.ss, &interaction.pair);
                interaction.symbols = assemble(
                    p1,
                    p2,
                    interaction.pair.edge5,
                    interaction.pair.edge3,
                    interaction.pair.orientation,
                    canonical,
                    double,
                );
            } else {
                interaction.default_symbol = None;
                interaction.symbols.clear();
            }
        }

        for i in 0..self.tertiaries.len() {
            let interaction = &self.tertiaries[i];
            let c1 = self.positions[interaction.pair.start];
            let c2 = self.positions[interaction.pair.end];
            let residue = self
                .residues
                .get(interaction.pair.start - 1)
                .map(|r| self.resolved(&r.style).line_width)
                .unwrap_or(1.0);
            let shift = RADIUS_CONST + residue / 2.0;

            let interaction = &mut self.tertiaries[i];
            if distance(c1, c2) > 2.0 * shift {
                let (o1, o2) = points_from(c1, c2, shift);
                let (i1, i2) = points_from(c1, c2, shift + RADIUS_CONST * 1.5);
                interaction.default_symbol = Some(LwSymbol::line(o1, o2, VPos::Middle));
                interaction.symbols = vec![
                    LwSymbol::single(
                        o1,
                        i1,
                        interaction.pair.edge5,
                        interaction.pair.orientation,
                        false,
                    ),
                    LwSymbol::line(i1, i2, VPos::Middle),
                    LwSymbol::single(
                        o2,
                        i2,
                        interaction.pair.edge3,
                        interaction.pair.orientation,
                        true,
                    ),
                ];
            } else {
                interaction.default_symbol = None;
                interaction.symbols.clear();
            }
        }

        for p in 0..self.pknots.len() {
            self.pknots[p].elbow = self.pknot_elbow(p);
        }
    }

    /// Elbow polyline through the middle crossing pair of a pknot, the
    /// schematic rendering of the whole knot.
    fn pknot_elbow(&self, pknot: usize) -> Option<[Point; 3]> {
        let indices = &self.pknots[pknot].tertiaries;
        if indices.is_empty() {
            return None;
        }
        let n = indices.len();
        let (p1, p2) = if n % 2 == 0 {
            let a = &self.tertiaries[indices[n / 2 - 1]].pair;
            let b = &self.tertiaries[indices[n / 2]].pair;
            (
                midpoint(self.positions[a.start], self.positions[b.start]),
                midpoint(self.positions[a.end], self.positions[b.end]),
            )
        } else {
            let m = &self.tertiaries[indices[n / 2]].pair;
            (self.positions[m.start], self.positions[m.end])
        };
        Some([p1, Point::new(p2.x, p1.y), p2])
    }

    /// Batch styling by element kind. `Full2D` entries land on the drawing
    /// style; everything is refreshed afterwards.
    pub fn apply_theme(&mut self, theme: &Theme) {
        let mut merge = |style: &mut Style, kind: ElementKind| {
            if let Some(parameters) = theme.parameters_for(kind) {
                for (parameter, value) in parameters {
                    // Theme values are validated on insertion.
                    let _ = style.set(*parameter, value);
                }
            }
        };
        merge(&mut self.style, ElementKind::Full2D);
        for r in &mut self.residues {
            merge(&mut r.style, ElementKind::Residue);
        }
        for h in &mut self.helices {
            merge(&mut h.style, ElementKind::Helix);
        }
        for j in &mut self.junctions {
            merge(&mut j.style, ElementKind::Junction);
        }
        for s in &mut self.single_strands {
            merge(&mut s.style, ElementKind::SingleStrand);
        }
        for i in &mut self.secondaries {
            merge(&mut i.style, ElementKind::SecondaryInteraction);
            merge(&mut i.symbol_style, ElementKind::InteractionSymbol);
        }
        for i in &mut self.tertiaries {
            merge(&mut i.style, ElementKind::TertiaryInteraction);
            merge(&mut i.symbol_style, ElementKind::InteractionSymbol);
        }
        for b in &mut self.bonds {
            merge(&mut b.style, ElementKind::PhosphodiesterBond);
        }
        for p in &mut self.pknots {
            merge(&mut p.style, ElementKind::Pknot);
        }
        self.refresh_symbols();
    }

    /// Rule-based styling selecting on kind and location.
    pub fn apply_advanced_theme(&mut self, theme: &AdvancedTheme) {
        for r in &mut self.residues {
            theme.apply_to(&mut r.style, ElementKind::Residue, &Location::range(r.pos, r.pos));
        }
        for h in &mut self.helices {
            let location = self.ss.helices[h.helix].location.clone();
            theme.apply_to(&mut h.style, ElementKind::Helix, &location);
        }
        for j in &mut self.junctions {
            let location = self.ss.junctions[j.junction].location.clone();
            theme.apply_to(&mut j.style, ElementKind::Junction, &location);
        }
        for s in &mut self.single_strands {
            let location = self.ss.single_strands[s.strand].location.clone();
            theme.apply_to(&mut s.style, ElementKind::SingleStrand, &location);
        }
        for i in &mut self.secondaries {
            let location = i.location();
            theme.apply_to(&mut i.style, ElementKind::SecondaryInteraction, &location);
            theme.apply_to(&mut i.symbol_style, ElementKind::InteractionSymbol, &location);
        }
        for i in &mut self.tertiaries {
            let location = i.location();
            theme.apply_to(&mut i.style, ElementKind::TertiaryInteraction, &location);
            theme.apply_to(&mut i.symbol_style, ElementKind::InteractionSymbol, &location);
        }
        for b in &mut self.bonds {
            let location = Location::range(b.start, b.end);
            theme.apply_to(&mut b.style, ElementKind::PhosphodiesterBond, &location);
        }
        for p in &mut self.pknots {
            let location = self.ss.pknots[p.pknot].location();
            theme.apply_to(&mut p.style, ElementKind::Pknot, &location);
        }
        self.refresh_symbols();
    }

    /// Bounding box over the skeleton and every placed residue.
    pub fn bounds(&self) -> Rect {
        let residues = Rect::from_points(self.residues.iter().map(|r| r.center))
            .map(|r| r.inflated(RADIUS_CONST))
            .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
        match self.skeleton.bounds() {
            Some(skeleton) => skeleton.union(&residues),
            None => residues,
        }
    }

    pub fn length(&self) -> usize {
        self.ss.rna.len()
    }
}

fn midpoint(p1: Point, p2: Point) -> Point {
    Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0)
}

fn is_canonical(ss: &SecondaryStructure, pair: &BasePair) -> bool {
    use crate::model::{Edge, Orientation};
    if pair.edge5 != Edge::WC || pair.edge3 != Edge::WC || pair.orientation != Orientation::Cis {
        return false;
    }
    matches!(
        letters(ss, pair),
        ('A', 'U') | ('U', 'A') | ('G', 'C') | ('C', 'G')
    )
}

fn is_double_paired(ss: &SecondaryStructure, pair: &BasePair) -> bool {
    matches!(letters(ss, pair), ('G', 'C') | ('C', 'G'))
}

fn letters(ss: &SecondaryStructure, pair: &BasePair) -> (char, char) {
    (
        ss.rna
            .residue(pair.start)
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('X'),
        ss.rna
            .residue(pair.end)
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('X'),
    )
}

fn residue_parent(
    ss: &SecondaryStructure,
    junctions: &[JunctionDrawing],
    strands: &[StrandDrawing],
    interaction_at: &[Option<usize>],
    pos: usize,
) -> Option<ResidueParent> {
    if let Some(i) = interaction_at[pos] {
        return Some(ResidueParent::Interaction(i));
    }
    if let Some(j) = junctions
        .iter()
        .position(|j| ss.junctions[j.junction].location.contains(pos))
    {
        return Some(ResidueParent::Junction(j));
    }
    strands
        .iter()
        .position(|s| ss.single_strands[s.strand].location.contains(pos))
        .map(ResidueParent::Strand)
}

/// Classify the bond between every pair of consecutive positions. Mirrors the
/// element ownership: helix first, then junction, then single strand, then
/// the links stitching strands and branches together on the baseline.
fn classify_bonds(ss: &SecondaryStructure, skeleton: &Skeleton) -> Vec<BondDrawing> {
    let mut bonds = Vec::with_capacity(ss.rna.len().saturating_sub(1));
    for i in 1..ss.rna.len() {
        if let Some(kind) = classify_bond(ss, skeleton, i) {
            bonds.push(BondDrawing {
                kind,
                start: i,
                end: i + 1,
                style: Style::new(),
            });
        }
    }
    bonds
}

fn classify_bond(ss: &SecondaryStructure, skeleton: &Skeleton, i: usize) -> Option<BondKind> {
    for (h, helix) in ss.helices.iter().enumerate() {
        if helix.location.contains(i) && helix.location.contains(i + 1) {
            return Some(BondKind::Helical { helix: h });
        }
    }

    for (j, junction) in ss.junctions.iter().enumerate() {
        if !(junction.location.contains(i) && junction.location.contains(i + 1)) {
            continue;
        }
        let in_ends = ss.helices[junction.helices[0]].ends();
        for block in &junction.location.blocks {
            if block.start == i && block.end == i + 1 {
                let pos_in_helix = if in_ends.contains(&i) {
                    Some(i)
                } else if in_ends.contains(&(i + 1)) {
                    Some(i + 1)
                } else {
                    None
                };
                return Some(BondKind::HelicesDirectLink {
                    junction: j,
                    pos_in_helix,
                });
            }
        }
        if in_ends.contains(&i) {
            return Some(BondKind::InHelixClosing { junction: j, closing: i });
        }
        if in_ends.contains(&(i + 1)) {
            return Some(BondKind::InHelixClosing {
                junction: j,
                closing: i + 1,
            });
        }
        for &out in junction.helices.iter().skip(1) {
            let ends = ss.helices[out].ends();
            if ends.contains(&i) {
                return Some(BondKind::OutHelixClosing { junction: j, closing: i });
            }
            if ends.contains(&(i + 1)) {
                return Some(BondKind::OutHelixClosing {
                    junction: j,
                    closing: i + 1,
                });
            }
        }
        return Some(BondKind::Junction { junction: j });
    }

    for (s, strand) in ss.single_strands.iter().enumerate() {
        if strand.location.contains(i) && strand.location.contains(i + 1) {
            return Some(BondKind::SingleStrand { strand: s });
        }
    }

    for (s, strand) in ss.single_strands.iter().enumerate() {
        if strand.location.contains(i) {
            if let Some(b) = branch_with_root_at(ss, skeleton, i + 1) {
                return Some(BondKind::StrandToBranch {
                    strand: s,
                    branch: b,
                    helix_pos: i + 1,
                });
            }
        } else if strand.location.contains(i + 1) {
            if let Some(b) = branch_with_root_at(ss, skeleton, i) {
                return Some(BondKind::StrandToBranch {
                    strand: s,
                    branch: b,
                    helix_pos: i,
                });
            }
        }
    }

    if let (Some(previous), Some(next)) = (
        branch_with_root_at(ss, skeleton, i),
        branch_with_root_at(ss, skeleton, i + 1),
    ) {
        return Some(BondKind::BranchesLinking { previous, next });
    }
    None
}

fn branch_with_root_at(ss: &SecondaryStructure, skeleton: &Skeleton, pos: usize) -> Option<usize> {
    skeleton
        .branches
        .iter()
        .position(|b| ss.helices[b.root_helix].location.contains(pos))
}
