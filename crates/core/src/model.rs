use crate::location::Location;
use crate::parser::{parse_bracket_notation, PairTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type HelixIdx = usize;
pub type JunctionIdx = usize;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("empty structure")]
    EmptyStructure,
    #[error("illegal character '{character}' at position {position}")]
    IllegalCharacter { position: usize, character: char },
    #[error("unmatched '{bracket}' at position {position}")]
    UnmatchedClosing { position: usize, bracket: char },
    #[error("unmatched '{bracket}' at position {position}")]
    UnmatchedOpening { position: usize, bracket: char },
    #[error("sequence length {sequence} does not match structure length {structure}")]
    LengthMismatch { sequence: usize, structure: usize },
    #[error("position {position} outside molecule of length {len}")]
    PositionOutOfRange { position: usize, len: usize },
}

/// Interacting edge of a residue, after Leontis-Westhof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    WC,
    Hoogsteen,
    Sugar,
    SingleHBond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Cis,
    Trans,
    Orthogonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasePair {
    pub start: usize,
    pub end: usize,
    pub edge5: Edge,
    pub edge3: Edge,
    pub orientation: Orientation,
}

impl BasePair {
    /// Canonical cis Watson-Crick pair.
    pub fn new(start: usize, end: usize) -> Self {
        BasePair {
            start,
            end,
            edge5: Edge::WC,
            edge3: Edge::WC,
            orientation: Orientation::Cis,
        }
    }

    pub fn with_edges(start: usize, end: usize, edge5: Edge, edge3: Edge, orientation: Orientation) -> Self {
        BasePair {
            start,
            end,
            edge5,
            edge3,
            orientation,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rna {
    pub name: String,
    pub seq: String,
}

impl Rna {
    pub fn new(name: impl Into<String>, seq: impl Into<String>) -> Self {
        Rna {
            name: name.into(),
            seq: seq.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.seq.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// Residue letter at a 1-based position.
    pub fn residue(&self, pos: usize) -> Option<char> {
        self.seq.chars().nth(pos.checked_sub(1)?)
    }
}

/// The junctions a helix terminates into. `outer` faces the exterior loop
/// side; a helix without one is the root of a branch.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JunctionsLinked {
    pub inner: Option<JunctionIdx>,
    pub outer: Option<JunctionIdx>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Helix {
    pub name: String,
    pub location: Location,
    pub pairs: Vec<BasePair>,
    pub junctions: JunctionsLinked,
}

impl Helix {
    /// Number of base pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn start(&self) -> usize {
        self.location.start()
    }

    pub fn end(&self) -> usize {
        self.location.end()
    }

    /// The four strand-extremity positions:
    /// [5' outer, 5' inner, 3' inner, 3' outer].
    pub fn ends(&self) -> [usize; 4] {
        let start = self.start();
        let end = self.end();
        let len = self.len();
        [start, start + len - 1, end - len + 1, end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JunctionType {
    ApicalLoop,
    InnerLoop,
    ThreeWay,
    FourWay,
    FiveWay,
    SixWay,
    SevenWay,
    EightWay,
    NineWay,
    TenWay,
    ElevenWay,
    TwelveWay,
    ThirteenWay,
    FourteenWay,
    FifteenWay,
    SixteenWay,
    Flower,
}

impl JunctionType {
    pub fn from_helix_count(n: usize) -> JunctionType {
        use JunctionType::*;
        match n {
            1 => ApicalLoop,
            2 => InnerLoop,
            3 => ThreeWay,
            4 => FourWay,
            5 => FiveWay,
            6 => SixWay,
            7 => SevenWay,
            8 => EightWay,
            9 => NineWay,
            10 => TenWay,
            11 => ElevenWay,
            12 => TwelveWay,
            13 => ThirteenWay,
            14 => FourteenWay,
            15 => FifteenWay,
            16 => SixteenWay,
            _ => Flower,
        }
    }
}

/// A loop closed by helices. `helices` starts with the entry helix (the one
/// whose inner end opens this junction) followed by the outgoing helices in
/// 5'→3' order. Block boundaries of `location` are the flanking paired
/// residues of those helices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Junction {
    pub name: String,
    pub location: Location,
    pub junction_type: JunctionType,
    pub helices: Vec<HelixIdx>,
}

impl Junction {
    pub fn start(&self) -> usize {
        self.location.start()
    }

    pub fn end(&self) -> usize {
        self.location.end()
    }

    /// Total residues in the loop, flanking paired residues included.
    pub fn len(&self) -> usize {
        self.location.len()
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_empty()
    }

    /// Helix slots around the circle.
    pub fn slots(&self) -> usize {
        self.helices.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleStrand {
    pub name: String,
    pub location: Location,
}

impl SingleStrand {
    pub fn start(&self) -> usize {
        self.location.start()
    }

    pub fn end(&self) -> usize {
        self.location.end()
    }

    pub fn len(&self) -> usize {
        self.location.len()
    }
}

/// A stacked run of base pairs crossing the nested structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pknot {
    pub name: String,
    pub pairs: Vec<BasePair>,
}

impl Pknot {
    pub fn location(&self) -> Location {
        Location::from_positions(self.pairs.iter().flat_map(|p| [p.start, p.end]))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryStructure {
    pub rna: Rna,
    pub helices: Vec<Helix>,
    pub junctions: Vec<Junction>,
    pub single_strands: Vec<SingleStrand>,
    pub pknots: Vec<Pknot>,
    pub tertiary_interactions: Vec<BasePair>,
}

impl SecondaryStructure {
    /// Build the full model from a sequence and bracket notation.
    pub fn from_bracket_notation(
        name: impl Into<String>,
        seq: &str,
        bracket: &str,
    ) -> Result<SecondaryStructure, StructureError> {
        let pt = parse_bracket_notation(bracket)?;
        let rna = Rna::new(name, seq);
        if rna.len() != pt.len {
            return Err(StructureError::LengthMismatch {
                sequence: rna.len(),
                structure: pt.len,
            });
        }
        Ok(Self::from_pair_table(rna, &pt))
    }

    /// Derive helices, the junction tree, single strands and pknots from a
    /// pair table.
    pub fn from_pair_table(rna: Rna, pt: &PairTable) -> SecondaryStructure {
        let len = pt.len;
        let mut helices: Vec<Helix> = Vec::new();
        let mut helix_at: Vec<Option<HelixIdx>> = vec![None; len + 1];

        // Maximal stacked runs of nested pairs.
        for pos in 1..=len {
            if helix_at[pos].is_some() {
                continue;
            }
            let j = match pt.partner[pos] {
                Some(j) if j > pos => j,
                _ => continue,
            };
            let mut pairs = vec![BasePair::new(pos, j)];
            while pos + pairs.len() < j - pairs.len()
                && pt.partner[pos + pairs.len()] == Some(j - pairs.len())
            {
                pairs.push(BasePair::new(pos + pairs.len(), j - pairs.len()));
            }
            let n = pairs.len();
            let idx = helices.len();
            for k in 0..n {
                helix_at[pos + k] = Some(idx);
                helix_at[j - k] = Some(idx);
            }
            helices.push(Helix {
                name: format!("H{}", idx + 1),
                location: Location::from_ranges([(pos, pos + n - 1), (j - n + 1, j)]),
                pairs,
                junctions: JunctionsLinked::default(),
            });
        }

        // One junction per helix inner end: walk the closed loop it opens.
        let mut junctions: Vec<Junction> = Vec::new();
        for h in 0..helices.len() {
            let [_, inner5, inner3, _] = helices[h].ends();
            let mut linked = vec![h];
            let mut blocks: Vec<(usize, usize)> = Vec::new();
            let mut block_start = inner5;
            let mut p = inner5 + 1;
            loop {
                if pt.partner[p].is_none() {
                    p += 1;
                    continue;
                }
                blocks.push((block_start, p));
                if p == inner3 {
                    break;
                }
                // p is the 5' outer end of another helix; jump over it.
                let out = helix_at[p].unwrap_or(h);
                linked.push(out);
                block_start = helices[out].ends()[3];
                p = block_start + 1;
            }
            let junction_type = JunctionType::from_helix_count(linked.len());
            let idx = junctions.len();
            helices[h].junctions.inner = Some(idx);
            for &out in linked.iter().skip(1) {
                helices[out].junctions.outer = Some(idx);
            }
            junctions.push(Junction {
                name: format!("{junction_type:?} {}", idx + 1),
                location: Location::from_ranges(blocks),
                junction_type,
                helices: linked,
            });
        }

        // Exterior unpaired runs become single strands.
        let mut single_strands: Vec<SingleStrand> = Vec::new();
        let mut depth = 0usize;
        let mut run_start: Option<usize> = None;
        for pos in 1..=len {
            match pt.partner[pos] {
                Some(j) if j > pos => {
                    if let Some(start) = run_start.take() {
                        single_strands.push(SingleStrand {
                            name: format!("SS{}", single_strands.len() + 1),
                            location: Location::range(start, pos - 1),
                        });
                    }
                    depth += 1;
                }
                Some(_) => depth -= 1,
                None => {
                    if depth == 0 && run_start.is_none() {
                        run_start = Some(pos);
                    }
                }
            }
        }
        if let Some(start) = run_start {
            single_strands.push(SingleStrand {
                name: format!("SS{}", single_strands.len() + 1),
                location: Location::range(start, len),
            });
        }

        // Stacked runs in the crossing layer.
        let mut pknots: Vec<Pknot> = Vec::new();
        for &(a, b) in &pt.pknot_pairs {
            match pknots.last_mut() {
                Some(pk)
                    if pk
                        .pairs
                        .last()
                        .is_some_and(|last| a == last.start + 1 && b + 1 == last.end) =>
                {
                    pk.pairs.push(BasePair::new(a, b));
                }
                _ => pknots.push(Pknot {
                    name: format!("PK{}", pknots.len() + 1),
                    pairs: vec![BasePair::new(a, b)],
                }),
            }
        }

        SecondaryStructure {
            rna,
            helices,
            junctions,
            single_strands,
            pknots,
            tertiary_interactions: Vec::new(),
        }
    }

    /// Register an extra tertiary pair, e.g. a non-canonical long-range
    /// interaction.
    pub fn add_tertiary_interaction(&mut self, pair: BasePair) -> Result<(), StructureError> {
        let len = self.rna.len();
        for pos in [pair.start, pair.end] {
            if pos == 0 || pos > len {
                return Err(StructureError::PositionOutOfRange { position: pos, len });
            }
        }
        self.tertiary_interactions.push(pair);
        Ok(())
    }

    /// The helix containing a position, if any.
    pub fn helix_of(&self, pos: usize) -> Option<HelixIdx> {
        self.helices.iter().position(|h| h.location.contains(pos))
    }

    /// The next branch-root helix starting after `after`, in sequence order.
    pub fn next_branch_root(&self, after: usize) -> Option<HelixIdx> {
        self.helices
            .iter()
            .enumerate()
            .filter(|(_, h)| h.junctions.outer.is_none() && h.start() > after)
            .min_by_key(|(_, h)| h.start())
            .map(|(i, _)| i)
    }

    /// All branch-root helices in sequence order.
    pub fn branch_roots(&self) -> Vec<HelixIdx> {
        let mut roots: Vec<HelixIdx> = self
            .helices
            .iter()
            .enumerate()
            .filter(|(_, h)| h.junctions.outer.is_none())
            .map(|(i, _)| i)
            .collect();
        roots.sort_by_key(|&i| self.helices[i].start());
        roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hairpin_decomposition() {
        let ss =
            SecondaryStructure::from_bracket_notation("hairpin", "GCGAAAAAUCGC", "((((....))))")
                .unwrap();
        assert_eq!(ss.helices.len(), 1);
        assert_eq!(ss.helices[0].len(), 4);
        assert_eq!(ss.helices[0].ends(), [1, 4, 9, 12]);
        assert_eq!(ss.junctions.len(), 1);
        let j = &ss.junctions[0];
        assert_eq!(j.junction_type, JunctionType::ApicalLoop);
        assert_eq!(j.location, Location::range(4, 9));
        assert_eq!(j.len(), 6);
        assert!(ss.single_strands.is_empty());
        assert!(ss.helices[0].junctions.outer.is_none());
        assert_eq!(ss.helices[0].junctions.inner, Some(0));
    }

    #[test]
    fn three_way_junction() {
        //           111111111122222222
        // 123456789012345678901234567
        let bracket = "((..((....))..((....))..))";
        let seq = "G".repeat(bracket.len());
        let ss = SecondaryStructure::from_bracket_notation("3way", &seq, bracket).unwrap();
        assert_eq!(ss.helices.len(), 3);
        assert_eq!(ss.junctions.len(), 3);
        let three_way = ss
            .junctions
            .iter()
            .find(|j| j.junction_type == JunctionType::ThreeWay)
            .unwrap();
        assert_eq!(three_way.helices.len(), 3);
        // Entry helix first, then the two branches in 5'→3' order.
        assert_eq!(three_way.helices[0], 0);
        assert_eq!(ss.helices[three_way.helices[1]].start(), 5);
        assert_eq!(ss.helices[three_way.helices[2]].start(), 15);
        assert_eq!(three_way.location.blocks.len(), 3);
    }

    #[test]
    fn exterior_single_strands() {
        let bracket = "..((....))..((....))..";
        let seq = "A".repeat(bracket.len());
        let ss = SecondaryStructure::from_bracket_notation("two", &seq, bracket).unwrap();
        assert_eq!(ss.single_strands.len(), 3);
        assert_eq!(ss.single_strands[0].location, Location::range(1, 2));
        assert_eq!(ss.single_strands[1].location, Location::range(11, 12));
        assert_eq!(ss.single_strands[2].location, Location::range(21, 22));
        assert_eq!(ss.branch_roots().len(), 2);
        assert_eq!(ss.next_branch_root(0), Some(0));
        assert_eq!(ss.next_branch_root(3), Some(1));
        assert_eq!(ss.next_branch_root(13), None);
    }

    #[test]
    fn inner_loop_links_junctions() {
        let bracket = "(((..((....))..)))";
        let seq = "C".repeat(bracket.len());
        let ss = SecondaryStructure::from_bracket_notation("il", &seq, bracket).unwrap();
        assert_eq!(ss.helices.len(), 2);
        let inner_loop = ss
            .junctions
            .iter()
            .find(|j| j.junction_type == JunctionType::InnerLoop)
            .unwrap();
        assert_eq!(inner_loop.helices, vec![0, 1]);
        assert_eq!(ss.helices[1].junctions.outer, Some(0));
        assert_eq!(ss.helices[1].junctions.inner, Some(1));
    }

    #[test]
    fn pknot_grouped_as_stacked_run() {
        let bracket = "((..[[..))..]]";
        let seq = "G".repeat(bracket.len());
        let ss = SecondaryStructure::from_bracket_notation("pk", &seq, bracket).unwrap();
        assert_eq!(ss.pknots.len(), 1);
        assert_eq!(ss.pknots[0].pairs.len(), 2);
        assert_eq!(ss.pknots[0].location().start(), 5);
        assert_eq!(ss.pknots[0].location().end(), 14);
    }

    #[test]
    fn length_mismatch_rejected() {
        assert!(matches!(
            SecondaryStructure::from_bracket_notation("bad", "GGG", "((..))"),
            Err(StructureError::LengthMismatch { sequence: 3, structure: 6 })
        ));
    }

    #[test]
    fn tertiary_interaction_bounds_checked() {
        let mut ss =
            SecondaryStructure::from_bracket_notation("t", "GGGAAACCC", "(((...)))").unwrap();
        assert!(ss.add_tertiary_interaction(BasePair::new(1, 5)).is_ok());
        assert!(matches!(
            ss.add_tertiary_interaction(BasePair::new(2, 42)),
            Err(StructureError::PositionOutOfRange { position: 42, .. })
        ));
    }
}
