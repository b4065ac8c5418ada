use clap::Parser;
use fasplice::fasta::scan_fasta;
use fasplice::table::{parse_intervals, IntervalTable, DEFAULT_MAX_PIECES};
use log::info;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

/// Extract named subsequences from a FASTA file, joining the pieces of each
/// interval request into one output record and reverse-complementing on the
/// minus strand.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
struct Args {
    /// Path to the interval list file, one request per line:
    /// `<name>` or `<name> <n> <s1> <e1> ... <sn> <en> <+|-> [<suffix>]`
    interval_list: String,

    /// Path to the FASTA file. Reads standard input if omitted.
    fasta_file: Option<String>,

    /// Maximum number of pieces allowed per request.
    #[clap(long, value_parser, default_value_t = DEFAULT_MAX_PIECES)]
    max_pieces: usize,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let table = build_table(&args.interval_list, args.max_pieces)?;
    if table.is_empty() {
        info!("no interval requests in {}, nothing to do", args.interval_list);
        return Ok(());
    }
    table.dump();

    let stdout = io::stdout().lock();
    let mut out = BufWriter::new(stdout);
    match &args.fasta_file {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| io::Error::new(e.kind(), format!("Cannot open {}: {}", path, e)))?;
            scan_fasta(BufReader::new(file), &table, &mut out)?;
        }
        None => {
            let stdin = io::stdin().lock();
            scan_fasta(stdin, &table, &mut out)?;
        }
    }
    out.flush()
}

fn build_table(interval_list: &str, max_pieces: usize) -> io::Result<IntervalTable> {
    let file = File::open(interval_list).map_err(|e| {
        io::Error::new(e.kind(), format!("Cannot open {}: {}", interval_list, e))
    })?;
    let reader = BufReader::new(file);
    let table = parse_intervals(reader, max_pieces).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to parse intervals from {}: {}", interval_list, e),
        )
    })?;
    info!(
        "parsed {} interval request(s) from {}",
        table.len(),
        interval_list
    );
    Ok(table)
}
