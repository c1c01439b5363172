//! Plain-text observation files: one sequence per line, symbols separated by whitespace.
use crate::{Error, Result};
use rand::Rng;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

pub const DEFAULT_OUTPUT: &str = "generated.obs";
/// Token closing every written line.
pub const TERMINATOR: &str = ".";
pub const MIN_LINE: usize = 3;
pub const MAX_LINE: usize = 6;

/// Read every non-blank line of `file` as a sequence of symbols.
pub fn read_observations<P: AsRef<Path>>(file: P) -> Result<Vec<Vec<String>>> {
    let file = file.as_ref();
    let rdr = std::fs::File::open(file)
        .map(BufReader::new)
        .map_err(|why| Error::on_open(file, why))?;
    parse_observations(rdr)
}

pub fn parse_observations<R: BufRead>(rdr: R) -> Result<Vec<Vec<String>>> {
    let mut records = vec![];
    for line in rdr.lines() {
        let symbols: Vec<_> = line?.split_whitespace().map(String::from).collect();
        if !symbols.is_empty() {
            records.push(symbols);
        }
    }
    Ok(records)
}

/// Write `symbols` as consecutive lines of `MIN_LINE..=MAX_LINE` symbols
/// (the last line takes whatever is left), each closed by ` .`.
pub fn write_observations<W: Write, R: Rng, T: AsRef<str>>(
    wtr: &mut W,
    symbols: &[T],
    rng: &mut R,
) -> std::io::Result<()> {
    let mut rest = symbols;
    while !rest.is_empty() {
        let len = rng.gen_range(MIN_LINE..=MAX_LINE).min(rest.len());
        let (line, tail) = rest.split_at(len);
        for symbol in line {
            write!(wtr, "{} ", symbol.as_ref())?;
        }
        writeln!(wtr, "{}", TERMINATOR)?;
        rest = tail;
    }
    Ok(())
}
