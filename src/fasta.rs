//! Single-pass FASTA stream scanning
//!
//! Reconstructs one full sequence body at a time from wrapped FASTA lines
//! and hands each finished body to the extraction engine. Bodies of
//! sequences no request asks for are consumed and discarded line by line,
//! so memory stays bounded by the largest requested sequence.

use crate::extract::emit_matches;
use crate::table::IntervalTable;
use log::{debug, warn};
use rustc_hash::FxHashSet;
use std::io::{self, BufRead, Write};

/// Sequence currently being accumulated: its defline token and the table
/// index of the first matching request.
struct Accumulating {
    name: String,
    first_match: usize,
}

/// Stream `reader`, emitting one output record per matching interval request
/// to `out`.
///
/// The accumulation buffer grows geometrically and is cleared, not freed,
/// between source sequences. After the stream ends, every requested name
/// that never appeared in it is reported with a warning.
pub fn scan_fasta<R: BufRead, W: Write>(
    mut reader: R,
    table: &IntervalTable,
    out: &mut W,
) -> io::Result<()> {
    let mut line_bytes: Vec<u8> = Vec::new();
    let mut body: Vec<u8> = Vec::new();
    let mut current: Option<Accumulating> = None;
    let mut seen_names: FxHashSet<String> = FxHashSet::default();

    loop {
        line_bytes.clear();
        let bytes_read = reader.read_until(b'\n', &mut line_bytes)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let line = strip_line_ending(&line_bytes);

        if line.first() == Some(&b'>') {
            // New source sequence; flush the one being accumulated first.
            if let Some(acc) = current.take() {
                emit_matches(table, acc.first_match, &acc.name, &body, out)?;
                body.clear();
            }

            let name = defline_token(line)?;
            seen_names.insert(name.to_string());
            match table.find_first(name) {
                Some(first_match) => {
                    debug!("accumulating sequence '{}'", name);
                    current = Some(Accumulating {
                        name: name.to_string(),
                        first_match,
                    });
                }
                None => {
                    debug!("no interval requests for '{}', skipping", name);
                }
            }
        } else if current.is_some() {
            // Body fragment for a matched sequence; whitespace-only lines
            // carry no sequence data.
            if !line.iter().all(u8::is_ascii_whitespace) {
                body.extend_from_slice(line);
            }
        }
    }

    // Final flush at end of stream.
    if let Some(acc) = current.take() {
        emit_matches(table, acc.first_match, &acc.name, &body, out)?;
    }

    for req in table.requests() {
        if !seen_names.contains(&req.name) {
            warn!("requested sequence '{}' not found in FASTA input", req.name);
        }
    }

    Ok(())
}

/// Trailing `\n` or `\r\n` removed.
fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// The sequence name on a `>` line: everything after the marker up to the
/// first whitespace.
fn defline_token(line: &[u8]) -> io::Result<&str> {
    let after = &line[1..];
    let end = after
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(after.len());
    std::str::from_utf8(&after[..end]).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            "FASTA defline is not valid UTF-8",
        )
    })
}
