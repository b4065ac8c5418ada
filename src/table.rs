//! Interval list parsing
//!
//! This module parses the interval request list (one request per line) into
//! a sorted, read-only table that the FASTA pass queries by sequence name.
//!
//! Line grammar, whitespace-tokenized:
//!
//! ```text
//! <name>                                              whole sequence, strand +
//! <name> <n> <s1> <e1> [<s2> <e2> ...] <+|-> [<suffix>]
//! ```

use crate::interval::{IntervalRequest, Piece, Strand};
use log::debug;
use std::io::{BufRead, Error as IoError};

/// Maximum number of pieces allowed per request unless overridden.
pub const DEFAULT_MAX_PIECES: usize = 150;

#[derive(Debug)]
pub enum ParseErr {
    IoError(IoError),
    MissingField { line: usize, what: String },
    InvalidNumber { line: usize, what: String, token: String },
    InvalidStrand { line: usize, token: String },
    ExtraField { line: usize, token: String },
    PieceCountOutOfRange { line: usize, count: u64, max: usize },
    CoordinateOutOfRange { line: usize, piece: usize, what: &'static str },
    PieceStartAfterEnd { line: usize, piece: usize, start: u64, end: u64 },
    UnorderedPieces { line: usize, piece: usize, start: u64, prev_end: u64 },
}

impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErr::IoError(e) => write!(f, "IO error: {}", e),
            ParseErr::MissingField { line, what } => {
                write!(f, "Line {}: missing {}", line, what)
            }
            ParseErr::InvalidNumber { line, what, token } => {
                write!(f, "Line {}: invalid {} '{}'", line, what, token)
            }
            ParseErr::InvalidStrand { line, token } => {
                write!(f, "Line {}: strand must be '+' or '-', got '{}'", line, token)
            }
            ParseErr::ExtraField { line, token } => {
                write!(f, "Line {}: too many fields, unexpected '{}'", line, token)
            }
            ParseErr::PieceCountOutOfRange { line, count, max } => {
                write!(f, "Line {}: piece count {} out of range [1, {}]", line, count, max)
            }
            ParseErr::CoordinateOutOfRange { line, piece, what } => {
                write!(f, "Line {}: piece {} {} position must be >= 1", line, piece, what)
            }
            ParseErr::PieceStartAfterEnd { line, piece, start, end } => {
                write!(f, "Line {}: piece {} start > end ({} > {})", line, piece, start, end)
            }
            ParseErr::UnorderedPieces { line, piece, start, prev_end } => {
                write!(
                    f,
                    "Line {}: piece {} start {} does not come after previous piece end {}",
                    line, piece, start, prev_end
                )
            }
        }
    }
}

impl std::error::Error for ParseErr {}

/// The sorted, read-only set of interval requests. Built once from the full
/// request list, then only queried during the FASTA pass.
#[derive(Debug, Default)]
pub struct IntervalTable {
    requests: Vec<IntervalRequest>,
}

impl IntervalTable {
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn requests(&self) -> &[IntervalRequest] {
        &self.requests
    }

    /// Lowest table index whose request name equals `name`, or `None` if
    /// absent. Binary search, then a linear scan backward to the first of a
    /// run of equal names (multiple requests per source sequence are
    /// common).
    pub fn find_first(&self, name: &str) -> Option<usize> {
        let mut index = self
            .requests
            .binary_search_by(|req| req.name.as_str().cmp(name))
            .ok()?;
        while index > 0 && self.requests[index - 1].name == name {
            index -= 1;
        }
        Some(index)
    }

    /// Log every entry of the sorted table at debug level.
    pub fn dump(&self) {
        for (i, req) in self.requests.iter().enumerate() {
            debug!(
                "table[{}]: {} {} piece(s) ({}..{}) strand {:?} suffix {:?}",
                i,
                req.name,
                if req.whole_sequence { 1 } else { req.pieces.len() },
                req.span_start(),
                req.span_end(),
                req.strand,
                req.suffix,
            );
        }
    }
}

fn parse_number(token: &str, line: usize, what: &str) -> Result<u64, ParseErr> {
    token.parse::<u64>().map_err(|_| ParseErr::InvalidNumber {
        line,
        what: what.to_string(),
        token: token.to_string(),
    })
}

/// Parse a single request line. `line_num` is 1-based and used for error
/// reporting only.
fn parse_interval_line(
    line: &str,
    line_num: usize,
    max_pieces: usize,
) -> Result<IntervalRequest, ParseErr> {
    let mut tokens = line.split_whitespace();

    let name = tokens.next().ok_or_else(|| ParseErr::MissingField {
        line: line_num,
        what: "sequence name".to_string(),
    })?;

    // A line with only a name token requests the whole sequence.
    let Some(count_token) = tokens.next() else {
        return Ok(IntervalRequest::whole(name.to_string()));
    };

    let npieces = parse_number(count_token, line_num, "piece count")?;
    if npieces < 1 || npieces as usize > max_pieces {
        return Err(ParseErr::PieceCountOutOfRange {
            line: line_num,
            count: npieces,
            max: max_pieces,
        });
    }

    let mut pieces: Vec<Piece> = Vec::with_capacity(npieces as usize);
    for p in 1..=npieces as usize {
        let start_token = tokens.next().ok_or_else(|| ParseErr::MissingField {
            line: line_num,
            what: format!("start position for piece {}", p),
        })?;
        let start = parse_number(start_token, line_num, "start position")?;

        let end_token = tokens.next().ok_or_else(|| ParseErr::MissingField {
            line: line_num,
            what: format!("end position for piece {}", p),
        })?;
        let end = parse_number(end_token, line_num, "end position")?;

        if start < 1 {
            return Err(ParseErr::CoordinateOutOfRange {
                line: line_num,
                piece: p,
                what: "start",
            });
        }
        if end < 1 {
            return Err(ParseErr::CoordinateOutOfRange {
                line: line_num,
                piece: p,
                what: "end",
            });
        }
        if start > end {
            return Err(ParseErr::PieceStartAfterEnd {
                line: line_num,
                piece: p,
                start,
                end,
            });
        }
        // Pieces must be strictly ordered and non-overlapping.
        if let Some(prev) = pieces.last() {
            if start <= prev.end {
                return Err(ParseErr::UnorderedPieces {
                    line: line_num,
                    piece: p,
                    start,
                    prev_end: prev.end,
                });
            }
        }
        pieces.push(Piece { start, end });
    }

    let strand_token = tokens.next().ok_or_else(|| ParseErr::MissingField {
        line: line_num,
        what: "strand".to_string(),
    })?;
    let strand = match strand_token {
        "+" => Strand::Plus,
        "-" => Strand::Minus,
        _ => {
            return Err(ParseErr::InvalidStrand {
                line: line_num,
                token: strand_token.to_string(),
            })
        }
    };

    // One optional trailing token becomes the output-name suffix.
    let suffix = tokens.next().map(|t| t.to_string());
    if let Some(extra) = tokens.next() {
        return Err(ParseErr::ExtraField {
            line: line_num,
            token: extra.to_string(),
        });
    }

    Ok(IntervalRequest {
        name: name.to_string(),
        pieces,
        strand,
        suffix,
        whole_sequence: false,
    })
}

/// Parse the full request list and produce the sorted table.
///
/// Any malformed line fails the whole run; no partial table is returned.
pub fn parse_intervals<R: BufRead>(
    reader: R,
    max_pieces: usize,
) -> Result<IntervalTable, ParseErr> {
    let mut requests = Vec::new();
    for (i, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(ParseErr::IoError)?;
        requests.push(parse_interval_line(&line, i + 1, max_pieces)?);
    }

    // Stable sort; the tie-break order (name, span_start, span_end, strand)
    // is observable in the output and must be reproducible.
    requests.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.span_start().cmp(&b.span_start()))
            .then_with(|| a.span_end().cmp(&b.span_end()))
            .then_with(|| a.strand.cmp(&b.strand))
    });

    debug!("parsed {} interval request(s)", requests.len());
    Ok(IntervalTable { requests })
}
