//! Extraction and assembly of requested subsequences
//!
//! Given one finished source sequence body and the first matching entry of
//! the interval table, renders every matching request in table order:
//! slices and concatenates the pieces, reverse-complements on the minus
//! strand, and writes 80-column wrapped FASTA.

use crate::interval::{IntervalRequest, Piece, Strand};
use crate::table::IntervalTable;
use std::io::{self, Write};

/// Output bodies are wrapped at this column width.
pub const WRAP_WIDTH: usize = 80;

/// Render one output record for every table entry from `first_match`
/// onward whose name matches, in table order.
pub fn emit_matches<W: Write>(
    table: &IntervalTable,
    first_match: usize,
    name: &str,
    body: &[u8],
    out: &mut W,
) -> io::Result<()> {
    if body.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("No sequence data for '{}'", name),
        ));
    }

    for req in table.requests()[first_match..]
        .iter()
        .take_while(|req| req.name == name)
    {
        emit_one(req, body, out)?;
    }
    Ok(())
}

fn emit_one<W: Write>(req: &IntervalRequest, body: &[u8], out: &mut W) -> io::Result<()> {
    let seq_len = body.len() as u64;
    let pieces = req.resolve_pieces(seq_len);

    // Sequence length is unknown at parse time; the span check happens here.
    let span_end = pieces.last().map(|p| p.end).unwrap_or(0);
    if span_end > seq_len {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "End position exceeds sequence length ({} > {}) for sequence {}",
                span_end, seq_len, req.name
            ),
        ));
    }

    writeln!(out, "{}", format_defline(req, &pieces, seq_len))?;

    let assembled = assemble(&pieces, req.strand, body);
    for chunk in assembled.chunks(WRAP_WIDTH) {
        out.write_all(chunk)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Output name: `>{name}:{s1}_{e1}:...:{+|-}[:{suffix}]`, with `<` marking
/// a start that touches position 1 and `>` marking an end that touches the
/// final position of the source sequence.
fn format_defline(req: &IntervalRequest, pieces: &[Piece], seq_len: u64) -> String {
    let mut defline = format!(">{}:", req.name);
    for piece in pieces {
        let at_start = if piece.start == 1 { "<" } else { "" };
        let at_end = if piece.end == seq_len { ">" } else { "" };
        defline.push_str(&format!(
            "{}{}_{}{}:",
            at_start, piece.start, at_end, piece.end
        ));
    }
    defline.push(match req.strand {
        Strand::Plus => '+',
        Strand::Minus => '-',
    });
    if let Some(suffix) = &req.suffix {
        defline.push(':');
        defline.push_str(suffix);
    }
    defline
}

/// Concatenate the pieces in order for the plus strand; for the minus
/// strand, reverse the piece order and reverse-complement each piece, so
/// the result is the reverse-complement of the plus-strand concatenation.
fn assemble(pieces: &[Piece], strand: Strand, body: &[u8]) -> Vec<u8> {
    let total: u64 = pieces.iter().map(|p| p.span()).sum();
    let mut assembled = Vec::with_capacity(total as usize);
    match strand {
        Strand::Plus => {
            for piece in pieces {
                assembled.extend_from_slice(slice_piece(piece, body));
            }
        }
        Strand::Minus => {
            for piece in pieces.iter().rev() {
                assembled.extend(reverse_complement(slice_piece(piece, body)));
            }
        }
    }
    assembled
}

/// 1-based inclusive coordinates to a body slice.
fn slice_piece<'a>(piece: &Piece, body: &'a [u8]) -> &'a [u8] {
    &body[(piece.start - 1) as usize..piece.end as usize]
}

pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&base| match base {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            b'a' => b't',
            b't' => b'a',
            b'c' => b'g',
            b'g' => b'c',
            _ => b'N',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{parse_intervals, DEFAULT_MAX_PIECES};

    fn emit_for(intervals: &str, name: &str, body: &[u8]) -> io::Result<String> {
        let table = parse_intervals(intervals.as_bytes(), DEFAULT_MAX_PIECES).unwrap();
        let first = table.find_first(name).unwrap();
        let mut out = Vec::new();
        emit_matches(&table, first, name, body, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    // 100 bases; positions 10..20 are A, 30..40 are C, rest is G
    fn fixture_body() -> Vec<u8> {
        let mut body = vec![b'G'; 100];
        body[9..20].fill(b'A');
        body[29..40].fill(b'C');
        body
    }

    #[test]
    fn test_single_piece_plus_length() {
        let output = emit_for("seqA 1 10 20 +\n", "seqA", &fixture_body()).unwrap();
        assert_eq!(output, ">seqA:10_20:+\nAAAAAAAAAAA\n");
    }

    #[test]
    fn test_multi_piece_plus_concatenation() {
        let output = emit_for("seqA 2 10 20 30 40 +\n", "seqA", &fixture_body()).unwrap();
        assert_eq!(output, ">seqA:10_20:30_40:+\nAAAAAAAAAAACCCCCCCCCCC\n");
    }

    #[test]
    fn test_multi_piece_minus_swaps_order_and_direction() {
        // reverse-complement of the plus-strand concatenation: the C piece
        // comes out first as G runs, then the A piece as T runs
        let output = emit_for("seqA 2 10 20 30 40 -\n", "seqA", &fixture_body()).unwrap();
        assert_eq!(output, ">seqA:10_20:30_40:-\nGGGGGGGGGGGTTTTTTTTTTT\n");
    }

    #[test]
    fn test_whole_sequence_markers_on_both_ends() {
        let output = emit_for("seqB\n", "seqB", b"ACGTN").unwrap();
        assert_eq!(output, ">seqB:<1_>5:+\nACGTN\n");
    }

    #[test]
    fn test_boundary_markers() {
        let body = fixture_body();
        let output = emit_for("seqA 1 1 20 +\n", "seqA", &body).unwrap();
        assert!(output.starts_with(">seqA:<1_20:+\n"));
        let output = emit_for("seqA 1 20 100 +\n", "seqA", &body).unwrap();
        assert!(output.starts_with(">seqA:20_>100:+\n"));
        let output = emit_for("seqA 1 20 40 +\n", "seqA", &body).unwrap();
        assert!(output.starts_with(">seqA:20_40:+\n"));
    }

    #[test]
    fn test_suffix_appended_to_name() {
        let output = emit_for("seqA 1 10 20 + mrna1\n", "seqA", &fixture_body()).unwrap();
        assert!(output.starts_with(">seqA:10_20:+:mrna1\n"));
    }

    #[test]
    fn test_reverse_complement_round_trip() {
        let forward = b"ACGTacgt".to_vec();
        let twice = reverse_complement(&reverse_complement(&forward));
        assert_eq!(twice, forward);
    }

    #[test]
    fn test_reverse_complement_unknown_maps_to_n() {
        assert_eq!(reverse_complement(b"AXGU-"), b"NNCNT");
    }

    #[test]
    fn test_case_preserved() {
        let output = emit_for("seqA 1 1 4 -\n", "seqA", b"acgtGGGG").unwrap();
        assert_eq!(output, ">seqA:<1_4:-\nacgt\n");
    }

    #[test]
    fn test_wrapping_at_80_columns() {
        let body = vec![b'A'; 200];
        let output = emit_for("seqA 1 1 200 +\n", "seqA", &body).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2].len(), 80);
        assert_eq!(lines[3].len(), 40);
        assert!(output.ends_with("\n"));
    }

    #[test]
    fn test_exactly_full_final_line_gets_no_blank() {
        let body = vec![b'A'; 160];
        let output = emit_for("seqA 1 1 160 +\n", "seqA", &body).unwrap();
        assert!(output.ends_with("A\n"));
        assert!(!output.ends_with("\n\n"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_duplicate_requests_emit_identical_records() {
        let output = emit_for(
            "seqA 1 10 20 +\nseqA 1 10 20 +\n",
            "seqA",
            &fixture_body(),
        )
        .unwrap();
        assert_eq!(output, ">seqA:10_20:+\nAAAAAAAAAAA\n>seqA:10_20:+\nAAAAAAAAAAA\n");
    }

    #[test]
    fn test_requests_emitted_in_sort_order() {
        let output = emit_for(
            "seqA 1 30 40 +\nseqA 1 10 20 -\nseqA\n",
            "seqA",
            &fixture_body(),
        )
        .unwrap();
        let deflines: Vec<&str> = output.lines().filter(|l| l.starts_with('>')).collect();
        assert_eq!(
            deflines,
            vec![">seqA:<1_>100:+", ">seqA:10_20:-", ">seqA:30_40:+"]
        );
    }

    #[test]
    fn test_end_past_sequence_length_fails() {
        let err = emit_for("seqA 1 90 101 +\n", "seqA", &fixture_body()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("101 > 100") && msg.contains("seqA"), "{}", msg);
    }

    #[test]
    fn test_empty_body_fails() {
        let err = emit_for("seqA\n", "seqA", b"").unwrap_err();
        assert!(err.to_string().contains("seqA"));
    }
}
