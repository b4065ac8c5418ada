/// Strand orientation for an interval request
///
/// `Plus` sorts before `Minus`, which fixes the tie-break order of the
/// sorted interval table.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
#[repr(u8)]
pub enum Strand {
    #[default]
    Plus,
    Minus,
}

/// One contiguous sub-range of a source sequence, 1-based inclusive on both
/// ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub start: u64,
    pub end: u64,
}

impl Piece {
    /// Number of bases covered by this piece. Never zero, since
    /// `start <= end` is checked at parse time.
    pub fn span(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// A validated request for one output record: which source sequence to cut,
/// which pieces to join, and in which orientation.
///
/// `pieces` is empty exactly when `whole_sequence` is set; the single piece
/// spanning the full source is resolved lazily once the sequence length is
/// known (see [`IntervalRequest::resolve_pieces`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalRequest {
    pub name: String,
    pub pieces: Vec<Piece>,
    pub strand: Strand,
    pub suffix: Option<String>,
    pub whole_sequence: bool,
}

impl IntervalRequest {
    /// Build a whole-sequence request: the entire source, plus strand.
    pub fn whole(name: String) -> Self {
        IntervalRequest {
            name,
            pieces: Vec::new(),
            strand: Strand::Plus,
            suffix: None,
            whole_sequence: true,
        }
    }

    /// Start of the overall span (first piece). Whole-sequence requests
    /// report 0 so they sort ahead of any explicit request for the same
    /// name, whose starts are all >= 1.
    pub fn span_start(&self) -> u64 {
        self.pieces.first().map(|p| p.start).unwrap_or(0)
    }

    /// End of the overall span (final piece); 0 for whole-sequence requests.
    pub fn span_end(&self) -> u64 {
        self.pieces.last().map(|p| p.end).unwrap_or(0)
    }

    /// Pieces to extract once the source sequence length is known. The
    /// whole-sequence form becomes a single piece covering `[1, seq_len]`.
    pub fn resolve_pieces(&self, seq_len: u64) -> Vec<Piece> {
        if self.whole_sequence {
            vec![Piece {
                start: 1,
                end: seq_len,
            }]
        } else {
            self.pieces.clone()
        }
    }
}
