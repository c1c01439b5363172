use super::first_argmax;
use super::Model;
use crate::dptable::DPTable;
use crate::{Error, Result};
use log::trace;

impl Model {
    /// Viterbi algorithm. Return the most probable state path explaining `observations`,
    /// one state per observation.
    ///
    /// Only states with an emission row take part, iterated in the order the rows were
    /// declared. Ties, including the all-zero slices left behind by an observation no
    /// state can emit, go to the earliest state in that order.
    pub fn viterbi<T: AsRef<str>>(&self, observations: &[T]) -> Result<Vec<&str>> {
        let (scores, traceback) = self.viterbi_table(observations)?;
        let states: Vec<_> = self.emission_rows().iter().map(|x| x.0).collect();
        let last = match observations.len().checked_sub(1) {
            Some(last) => last,
            None => return Ok(vec![]),
        };
        let final_scores = scores.get_line(last).iter().copied().enumerate();
        let (mut current, max) = first_argmax(final_scores).unwrap_or((0, 0f64));
        trace!("VIT\t{}\t{}", self.state_name(states[current]), max);
        let mut path = Vec::with_capacity(observations.len());
        path.push(states[current]);
        for t in (1..=last).rev() {
            current = traceback.get(t, current);
            path.push(states[current]);
        }
        path.reverse();
        Ok(path.into_iter().map(|s| self.state_name(s)).collect())
    }
    /// Raw Viterbi lattice. Column `j` is the `j`-th emitting state in declared order.
    /// Returns the best path score ending at each cell, and the column of the
    /// best predecessor for each cell (row 0 has none and holds 0).
    pub fn viterbi_table<T: AsRef<str>>(
        &self,
        observations: &[T],
    ) -> Result<(DPTable<f64>, DPTable<usize>)> {
        let states: Vec<_> = self.emission_rows().iter().map(|x| x.0).collect();
        if states.is_empty() {
            return Err(Error::Model("no state has an emission row".to_string()));
        }
        let (len, width) = (observations.len(), states.len());
        let mut scores = DPTable::new(len, width, 0f64);
        let mut traceback = DPTable::new(len, width, 0usize);
        if let Some(first) = observations.first() {
            let symbol = self.symbol_id(first.as_ref());
            for (j, &s) in states.iter().enumerate() {
                scores.set(0, j, self.init_prob(s) * self.emit_prob(s, symbol));
            }
        }
        for (t, obs) in observations.iter().enumerate().skip(1) {
            let symbol = self.symbol_id(obs.as_ref());
            for (j, &s) in states.iter().enumerate() {
                let emit = self.emit_prob(s, symbol);
                let candidates = states
                    .iter()
                    .enumerate()
                    .map(|(i, &from)| (i, scores.get(t - 1, i) * self.trans_prob(from, s) * emit));
                let (arg, max) = first_argmax(candidates).unwrap_or((0, 0f64));
                scores.set(t, j, max);
                traceback.set(t, j, arg);
            }
        }
        Ok((scores, traceback))
    }
}

#[cfg(test)]
mod test {
    use super::super::test::cat;
    use super::super::{ModelBuilder, Source};
    use super::*;
    #[test]
    fn cat_sequence() {
        let model = cat();
        let obs = ["silent", "silent", "meow", "meow", "silent"];
        let path = model.viterbi(&obs).unwrap();
        assert_eq!(path, vec!["grumpy", "grumpy", "happy", "hungry", "grumpy"]);
        let (scores, _) = model.viterbi_table(&obs).unwrap();
        // happy, grumpy, hungry
        let expected = [
            [0.1, 0.25, 0.0],
            [0.03, 0.0375, 0.008],
            [0.00675, 0.0045, 0.0072],
            [0.0010125, 0.001728, 0.00162],
            [0.00020736, 0.000486, 0.0000972],
        ];
        for (t, row) in expected.iter().enumerate() {
            for (j, &x) in row.iter().enumerate() {
                assert!((scores.get(t, j) - x).abs() < 1e-12, "{},{}", t, j);
            }
        }
        assert_eq!(model.viterbi(&["purr", "meow"]).unwrap(), vec!["happy", "hungry"]);
    }
    #[test]
    fn length_and_membership() {
        let model = cat();
        let symbols = ["silent", "meow", "purr"];
        for len in 1..8 {
            let obs: Vec<_> = (0..len).map(|i| symbols[(i * 7 + len) % 3]).collect();
            let path = model.viterbi(&obs).unwrap();
            assert_eq!(path.len(), len);
            assert!(path.iter().all(|s| model.emitting_states().any(|e| e == *s)));
        }
    }
    fn symmetric(order: [&str; 2]) -> Model {
        let mut builder = ModelBuilder::new();
        for &to in ["a", "b"].iter() {
            builder.transition(Source::Start, to, 0.5);
            for &from in ["a", "b"].iter() {
                builder.transition(Source::State(from), to, 0.5);
            }
        }
        for &s in order.iter() {
            builder.emission(s, "x", 1.0);
        }
        builder.build()
    }
    #[test]
    fn ties_follow_emission_order() {
        let obs = ["x", "x", "x"];
        let model = symmetric(["a", "b"]);
        for _ in 0..3 {
            assert_eq!(model.viterbi(&obs).unwrap(), vec!["a"; 3]);
        }
        let (_, traceback) = model.viterbi_table(&obs).unwrap();
        assert_eq!(traceback.get_line(1), &[0, 0]);
        let model = symmetric(["b", "a"]);
        assert_eq!(model.viterbi(&obs).unwrap(), vec!["b"; 3]);
    }
    #[test]
    fn unseen_symbol_keeps_length() {
        let model = cat();
        let obs = ["silent", "bark", "meow", "purr"];
        let path = model.viterbi(&obs).unwrap();
        assert_eq!(path, vec!["happy"; 4]);
        let (scores, _) = model.viterbi_table(&obs).unwrap();
        assert!((1..4).all(|t| scores.get_line(t).iter().all(|&x| x == 0f64)));
    }
    #[test]
    fn degenerate_inputs() {
        let model = cat();
        let empty: [&str; 0] = [];
        assert!(model.viterbi(&empty).unwrap().is_empty());
        let mut builder = ModelBuilder::new();
        builder.transition(Source::Start, "a", 1.0);
        let model = builder.build();
        assert!(matches!(model.viterbi(&["x"]), Err(Error::Model(_))));
        // No start row: every path starts at zero, but decoding still succeeds.
        let mut builder = ModelBuilder::new();
        builder
            .transition(Source::State("a"), "b", 1.0)
            .emission("a", "x", 1.0)
            .emission("b", "x", 1.0);
        let model = builder.build();
        assert_eq!(model.viterbi(&["x", "x"]).unwrap(), vec!["a", "a"]);
    }
}
