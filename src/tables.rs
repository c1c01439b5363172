//! Very thin reader for the two flat-file tables describing a model.
//!
//! `<basename>.trans` holds one transition row per line and `<basename>.emit`
//! one emission row per line. A row is a state name followed by
//! `target probability` pairs, all whitespace-separated. The start marker is
//! written `#` and may only appear as the first token of a transition row.
//! A state may be given several rows; later entries extend or overwrite the
//! earlier ones. Blank lines are skipped.
use crate::hmm::{Model, ModelBuilder, Source};
use crate::{Error, Result};
use log::debug;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub const START_MARKER: &str = "#";
pub const TRANSITION_EXT: &str = "trans";
pub const EMISSION_EXT: &str = "emit";

/// Read `<basename>.trans` and `<basename>.emit` into a model.
pub fn load<P: AsRef<Path>>(basename: P) -> Result<Model> {
    let trans = with_extension(basename.as_ref(), TRANSITION_EXT);
    let emit = with_extension(basename.as_ref(), EMISSION_EXT);
    let trans_rdr = std::fs::File::open(&trans)
        .map(BufReader::new)
        .map_err(|why| Error::on_open(&trans, why))?;
    let emit_rdr = std::fs::File::open(&emit)
        .map(BufReader::new)
        .map_err(|why| Error::on_open(&emit, why))?;
    debug!("LOAD\t{}\t{}", trans.display(), emit.display());
    let mut builder = ModelBuilder::new();
    read_transitions(&mut builder, trans_rdr, &trans.display().to_string())?;
    read_emissions(&mut builder, emit_rdr, &emit.display().to_string())?;
    Ok(builder.build())
}

/// Same as [`load`], reading from already opened sources.
pub fn from_readers<R: BufRead, S: BufRead>(trans: R, emit: S) -> Result<Model> {
    let mut builder = ModelBuilder::new();
    read_transitions(&mut builder, trans, TRANSITION_EXT)?;
    read_emissions(&mut builder, emit, EMISSION_EXT)?;
    Ok(builder.build())
}

// `cat` -> `cat.trans`. Appends rather than replaces, so `data/v1.2` -> `data/v1.2.trans`.
fn with_extension(basename: &Path, ext: &str) -> PathBuf {
    let mut name = basename.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

pub fn read_transitions<R: BufRead>(builder: &mut ModelBuilder, rdr: R, file: &str) -> Result<()> {
    for_each_row(rdr, file, |line, head, pairs| {
        let from = match head {
            START_MARKER => Source::Start,
            name => Source::State(name),
        };
        builder.transition_row(from);
        for (to, prob) in pairs {
            if to == START_MARKER {
                let reason = "the start marker cannot be a transition target".to_string();
                return Err(malformed(file, line, reason));
            }
            builder.transition(from, to, prob);
        }
        Ok(())
    })
}

pub fn read_emissions<R: BufRead>(builder: &mut ModelBuilder, rdr: R, file: &str) -> Result<()> {
    for_each_row(rdr, file, |line, head, pairs| {
        if head == START_MARKER {
            let reason = "the start marker cannot emit".to_string();
            return Err(malformed(file, line, reason));
        }
        builder.emission_row(head);
        for (symbol, prob) in pairs {
            builder.emission(head, symbol, prob);
        }
        Ok(())
    })
}

fn malformed(file: &str, line: usize, reason: String) -> Error {
    Error::MalformedTable {
        file: file.to_string(),
        line,
        reason,
    }
}

// Tokenize each row and hand (line number, head, pairs) to `f`.
fn for_each_row<R, F>(rdr: R, file: &str, mut f: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(usize, &str, Vec<(&str, f64)>) -> Result<()>,
{
    for (i, line) in rdr.lines().enumerate() {
        let (line, lineno) = (line?, i + 1);
        let mut tokens = line.split_whitespace();
        let head = match tokens.next() {
            Some(head) => head,
            None => continue,
        };
        let rest: Vec<_> = tokens.collect();
        if rest.len() % 2 == 1 {
            let reason = format!("{} has a target without a probability", head);
            return Err(malformed(file, lineno, reason));
        }
        let pairs = rest
            .chunks_exact(2)
            .map(|pair| parse_prob(pair[1]).map(|p| (pair[0], p)))
            .collect::<std::result::Result<Vec<_>, String>>()
            .map_err(|reason| malformed(file, lineno, reason))?;
        f(lineno, head, pairs)?;
    }
    Ok(())
}

fn parse_prob(token: &str) -> std::result::Result<f64, String> {
    match token.parse::<f64>() {
        Ok(p) if p.is_finite() && 0f64 <= p => Ok(p),
        Ok(p) => Err(format!("{} is not a probability", p)),
        Err(why) => Err(format!("cannot parse {:?}: {}", token, why)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    fn fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("cat")
    }
    #[test]
    fn load_transitions() {
        let model = load(fixture()).unwrap();
        assert_eq!(
            model.transitions_from(Source::Start),
            Some(vec![("happy", 0.5), ("grumpy", 0.5), ("hungry", 0.0)])
        );
        let expected = [
            ("happy", vec![("happy", 0.5), ("grumpy", 0.1), ("hungry", 0.4)]),
            ("grumpy", vec![("happy", 0.6), ("grumpy", 0.3), ("hungry", 0.1)]),
            ("hungry", vec![("happy", 0.1), ("grumpy", 0.6), ("hungry", 0.3)]),
        ];
        let sources: Vec<_> = model.sources().collect();
        assert_eq!(sources, vec!["happy", "grumpy", "hungry"]);
        for (from, row) in expected.iter() {
            assert_eq!(model.transitions_from(Source::State(*from)).as_ref(), Some(row));
        }
    }
    #[test]
    fn load_emissions() {
        let model = load(fixture()).unwrap();
        let expected = [
            ("happy", vec![("silent", 0.2), ("meow", 0.3), ("purr", 0.5)]),
            ("grumpy", vec![("silent", 0.5), ("meow", 0.4), ("purr", 0.1)]),
            ("hungry", vec![("silent", 0.2), ("meow", 0.6), ("purr", 0.2)]),
        ];
        let states: Vec<_> = model.emitting_states().collect();
        assert_eq!(states, vec!["happy", "grumpy", "hungry"]);
        for (state, row) in expected.iter() {
            assert_eq!(model.emissions_of(state).as_ref(), Some(row));
        }
        assert_eq!(model.emission("happy", "bark"), 0.0);
        assert!(model.validate(1e-9).is_ok());
    }
    #[test]
    fn missing_resource() {
        let path = fixture().with_file_name("dog");
        match load(&path) {
            Err(Error::ResourceNotFound(p)) => assert_eq!(p, with_extension(&path, TRANSITION_EXT)),
            x => panic!("{:?}", x),
        }
    }
    #[test]
    fn duplicate_rows_extend() {
        let trans = "# a 1.0\na a 0.5\n\na b 0.5\na a 0.25\n";
        let emit = "a x 1.0\nb x 0.5\nb y 0.5\n";
        let model = from_readers(trans.as_bytes(), emit.as_bytes()).unwrap();
        assert_eq!(
            model.transitions_from(Source::State("a")),
            Some(vec![("a", 0.25), ("b", 0.5)])
        );
        assert_eq!(model.emissions_of("b"), Some(vec![("x", 0.5), ("y", 0.5)]));
        assert!(model.transitions_from(Source::State("b")).is_none());
    }
    #[test]
    fn bare_rows() {
        let model = from_readers("#\nz\n".as_bytes(), "z\n".as_bytes()).unwrap();
        assert_eq!(model.initial(), Some(vec![]));
        assert_eq!(model.transitions_from(Source::State("z")), Some(vec![]));
        assert_eq!(model.emissions_of("z"), Some(vec![]));
    }
    #[test]
    fn malformed_rows() {
        let cases = [
            ("# a 0.5 b\n", "a x 1\n"),
            ("# a half\n", "a x 1\n"),
            ("# a -0.5\n", "a x 1\n"),
            ("# a inf\n", "a x 1\n"),
            ("# a 1\na # 1\n", "a x 1\n"),
            ("# a 1\n", "a x 1\n# x 1\n"),
        ];
        for (trans, emit) in cases.iter() {
            let result = from_readers(trans.as_bytes(), emit.as_bytes());
            assert!(
                matches!(result, Err(Error::MalformedTable { .. })),
                "{:?}\t{:?}",
                trans,
                emit
            );
        }
        match from_readers("# a 1\n\na a\n".as_bytes(), "".as_bytes()) {
            Err(Error::MalformedTable { line, .. }) => assert_eq!(line, 3),
            x => panic!("{:?}", x),
        }
    }
}
