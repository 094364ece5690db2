use super::MultipleAligner;
use crate::utils::Result;
use bio::alignment::{pairwise::Aligner, AlignmentOperation};
use itertools::Itertools;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

const GAP: u8 = b'-';

type ScoreFunc = fn(u8, u8) -> i32;

fn score(a: u8, b: u8) -> i32 {
    if a.eq_ignore_ascii_case(&b) {
        1i32
    } else {
        -1i32
    }
}

/// Center-star multiple alignment built from global pairwise alignments.
///
/// The longest sequence is the center. Each other sequence is aligned to it
/// and insertions relative to the center are merged into shared columns.
#[derive(Debug, Clone, Copy)]
pub struct StarAligner {
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for StarAligner {
    fn default() -> Self {
        Self {
            gap_open: -5,
            gap_extend: -1,
        }
    }
}

/// One sequence placed against the center: the inserted bases preceding each
/// center position (plus a trailing slot) and the base or gap at each position.
struct CenterPlacement {
    inserts: Vec<Vec<u8>>,
    columns: Vec<u8>,
}

impl CenterPlacement {
    fn identity(center: &[u8]) -> Self {
        Self {
            inserts: vec![Vec::new(); center.len() + 1],
            columns: center.to_vec(),
        }
    }

    fn from_operations(seq: &[u8], center_len: usize, operations: &[AlignmentOperation]) -> Self {
        let mut inserts = vec![Vec::new(); center_len + 1];
        let mut columns = Vec::with_capacity(center_len);
        let mut x_pos = 0;
        let mut y_pos = 0;
        for op in operations {
            match op {
                AlignmentOperation::Match | AlignmentOperation::Subst => {
                    columns.push(seq[x_pos]);
                    x_pos += 1;
                    y_pos += 1;
                }
                AlignmentOperation::Del => {
                    columns.push(GAP);
                    y_pos += 1;
                }
                AlignmentOperation::Ins => {
                    inserts[y_pos].push(seq[x_pos]);
                    x_pos += 1;
                }
                // Global alignments are never clipped
                AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {}
            }
        }
        Self { inserts, columns }
    }

    fn render(&self, insert_widths: &[usize]) -> String {
        let width = insert_widths.iter().sum::<usize>() + self.columns.len();
        let mut row = Vec::with_capacity(width);
        for (pos, insert_width) in insert_widths.iter().enumerate() {
            let insert = &self.inserts[pos];
            row.extend_from_slice(insert);
            row.extend(std::iter::repeat(GAP).take(insert_width - insert.len()));
            if let Some(&base) = self.columns.get(pos) {
                row.push(base);
            }
        }
        String::from_utf8_lossy(&row).into_owned()
    }
}

impl StarAligner {
    fn place(&self, aligner: &mut Aligner<ScoreFunc>, seq: &[u8], center: &[u8]) -> CenterPlacement {
        if seq.is_empty() {
            return CenterPlacement {
                inserts: vec![Vec::new(); center.len() + 1],
                columns: vec![GAP; center.len()],
            };
        }
        let alignment = aligner.global(seq, center);
        CenterPlacement::from_operations(seq, center.len(), &alignment.operations)
    }
}

impl MultipleAligner for StarAligner {
    fn align(&self, seqs: &[&str]) -> Result<Vec<String>> {
        let Some((center_index, center)) = seqs
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.len().cmp(&b.len()).then(ib.cmp(ia)))
        else {
            return Ok(Vec::new());
        };
        let center = center.as_bytes();
        log::debug!(
            "Star alignment of {} sequences around sequence {} ({} bp)",
            seqs.len(),
            center_index,
            center.len()
        );

        let (gap_open, gap_extend) = (self.gap_open, self.gap_extend);
        let placements = seqs
            .par_iter()
            .enumerate()
            .map_init(
                || Aligner::with_capacity(center.len(), center.len(), gap_open, gap_extend, score as ScoreFunc),
                |aligner, (index, seq)| {
                    if index == center_index {
                        CenterPlacement::identity(center)
                    } else {
                        self.place(aligner, seq.as_bytes(), center)
                    }
                },
            )
            .collect::<Vec<_>>();

        let insert_widths = (0..=center.len())
            .map(|pos| {
                placements
                    .iter()
                    .map(|p| p.inserts[pos].len())
                    .max()
                    .unwrap_or(0)
            })
            .collect_vec();

        Ok(placements
            .iter()
            .map(|placement| placement.render(&insert_widths))
            .collect())
    }
}
