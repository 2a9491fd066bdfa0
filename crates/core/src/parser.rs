use crate::model::StructureError;

/// Pairing derived from bracket notation. Positions are 1-based; index 0 of
/// `partner` is unused padding.
#[derive(Debug, Clone)]
pub struct PairTable {
    pub len: usize,
    /// Nested layer: `partner[i]` is the paired position of residue `i`.
    pub partner: Vec<Option<usize>>,
    /// Crossing layers (`[]`, `{}`, `<>`), as (5' position, 3' position) pairs.
    pub pknot_pairs: Vec<(usize, usize)>,
}

/// Parse bracket notation into a pair table.
///
/// `(`/`)` form the nested secondary structure; `[`/`]`, `{`/`}` and `<`/`>`
/// are pseudoknot layers crossing it; `.` and `-` are unpaired.
pub fn parse_bracket_notation(input: &str) -> Result<PairTable, StructureError> {
    if input.is_empty() {
        return Err(StructureError::EmptyStructure);
    }

    let mut partner: Vec<Option<usize>> = vec![None; input.chars().count() + 1];
    let mut pknot_pairs: Vec<(usize, usize)> = Vec::new();
    let mut round: Vec<usize> = Vec::new();
    // One stack per crossing layer: [], {}, <>.
    let mut crossing: [Vec<usize>; 3] = [Vec::new(), Vec::new(), Vec::new()];

    for (i, ch) in input.chars().enumerate() {
        let pos = i + 1;
        match ch {
            '(' => round.push(pos),
            ')' => {
                let open = round
                    .pop()
                    .ok_or(StructureError::UnmatchedClosing { position: pos, bracket: ')' })?;
                partner[open] = Some(pos);
                partner[pos] = Some(open);
            }
            '[' => crossing[0].push(pos),
            '{' => crossing[1].push(pos),
            '<' => crossing[2].push(pos),
            ']' | '}' | '>' => {
                let layer = match ch {
                    ']' => 0,
                    '}' => 1,
                    _ => 2,
                };
                let open = crossing[layer]
                    .pop()
                    .ok_or(StructureError::UnmatchedClosing { position: pos, bracket: ch })?;
                pknot_pairs.push((open, pos));
            }
            '.' | '-' => {}
            _ => {
                return Err(StructureError::IllegalCharacter {
                    position: pos,
                    character: ch,
                })
            }
        }
    }

    if let Some(&open) = round.last() {
        return Err(StructureError::UnmatchedOpening { position: open, bracket: '(' });
    }
    for (stack, bracket) in crossing.iter().zip(['[', '{', '<']) {
        if let Some(&open) = stack.last() {
            return Err(StructureError::UnmatchedOpening { position: open, bracket });
        }
    }

    pknot_pairs.sort_unstable();
    Ok(PairTable {
        len: partner.len() - 1,
        partner,
        pknot_pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_pair() {
        let pt = parse_bracket_notation("(.)").unwrap();
        assert_eq!(pt.len, 3);
        assert_eq!(pt.partner[1], Some(3));
        assert_eq!(pt.partner[2], None);
        assert_eq!(pt.partner[3], Some(1));
    }

    #[test]
    fn nested() {
        let pt = parse_bracket_notation("(((...)))").unwrap();
        assert_eq!(pt.partner[1], Some(9));
        assert_eq!(pt.partner[3], Some(7));
        assert_eq!(pt.partner[5], None);
    }

    #[test]
    fn pknot_layer() {
        let pt = parse_bracket_notation("((..[[..))..]]").unwrap();
        assert_eq!(pt.partner[1], Some(10));
        assert_eq!(pt.pknot_pairs, vec![(5, 14), (6, 13)]);
    }

    #[test]
    fn curly_and_angle_layers() {
        let pt = parse_bracket_notation("((..{{..))..}}").unwrap();
        assert_eq!(pt.pknot_pairs, vec![(5, 14), (6, 13)]);
        let pt = parse_bracket_notation("((..<<..))..>>").unwrap();
        assert_eq!(pt.pknot_pairs, vec![(5, 14), (6, 13)]);
        assert!(matches!(
            parse_bracket_notation("((..{..))"),
            Err(StructureError::UnmatchedOpening { position: 5, bracket: '{' })
        ));
    }

    #[test]
    fn unmatched_close_reports_position() {
        match parse_bracket_notation("(.))") {
            Err(StructureError::UnmatchedClosing { position, bracket }) => {
                assert_eq!(position, 4);
                assert_eq!(bracket, ')');
            }
            other => panic!("expected UnmatchedClosing, got {other:?}"),
        }
    }

    #[test]
    fn unmatched_open_reports_position() {
        match parse_bracket_notation("((.)") {
            Err(StructureError::UnmatchedOpening { position, .. }) => assert_eq!(position, 1),
            other => panic!("expected UnmatchedOpening, got {other:?}"),
        }
    }

    #[test]
    fn bad_character() {
        assert!(matches!(
            parse_bracket_notation("(x)"),
            Err(StructureError::IllegalCharacter { position: 2, character: 'x' })
        ));
    }

    #[test]
    fn empty_input() {
        assert!(matches!(
            parse_bracket_notation(""),
            Err(StructureError::EmptyStructure)
        ));
    }
}
