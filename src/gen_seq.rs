//! This module samples synthetic sequences from a model.
use crate::hmm::{Model, Row};
use crate::{Error, Result};
use log::debug;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Hidden states paired with the symbols they emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub states: Vec<String>,
    pub outputs: Vec<String>,
}

impl Sequence {
    pub fn new(states: Vec<String>, outputs: Vec<String>) -> Self {
        Self { states, outputs }
    }
    pub fn len(&self) -> usize {
        self.outputs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
    fn push(&mut self, state: &str, output: &str) {
        self.states.push(state.to_string());
        self.outputs.push(output.to_string());
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.states.join(" "))?;
        writeln!(f, "{}", self.outputs.join(" "))
    }
}

// Pick a key with probability proportional to its entry.
// None if the row has no positive mass.
fn choose<R: rand::Rng>(row: &Row, rng: &mut R) -> Option<usize> {
    row.entries()
        .choose_weighted(rng, |e| e.1)
        .ok()
        .map(|e| e.0)
}

/// Random walk of at most `len` steps over `model`.
///
/// The first state is drawn from the start marker's row. Each step records the
/// current state with a symbol drawn from its emission row, then moves along
/// its transition row. The walk ends early, without error, as soon as the
/// current state has nothing to emit or nowhere to go; a state that cannot emit
/// is not recorded. Fails only if the start marker has no row to draw from.
pub fn generate<R: rand::Rng>(model: &Model, len: usize, rng: &mut R) -> Result<Sequence> {
    let initial = model
        .initial_row()
        .ok_or_else(|| Error::Model("start marker has no transition row".to_string()))?;
    let mut current = choose(initial, rng)
        .ok_or_else(|| Error::Model("start marker has no positive transition".to_string()))?;
    let mut seq = Sequence::default();
    for _ in 0..len {
        let output = match model.emission_row(current).and_then(|row| choose(row, rng)) {
            Some(output) => output,
            None => break,
        };
        seq.push(model.state_name(current), model.symbol_name(output));
        current = match model.transition_row(current).and_then(|row| choose(row, rng)) {
            Some(next) => next,
            None => break,
        };
    }
    debug!("GEN\t{}\t{}", len, seq.len());
    Ok(seq)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hmm::test::cat;
    use crate::hmm::{ModelBuilder, Source};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;
    #[test]
    fn length_bound() {
        let model = cat();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(32389);
        for len in 0..50 {
            let seq = generate(&model, len, &mut rng).unwrap();
            assert_eq!(seq.states.len(), seq.outputs.len());
            assert_eq!(seq.len(), len);
        }
        let seq = generate(&model, 0, &mut rng).unwrap();
        assert!(seq.is_empty() && seq.states.is_empty());
    }
    #[test]
    fn members_of_model() {
        let model = cat();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(4280);
        let seq = generate(&model, 200, &mut rng).unwrap();
        assert!(seq.states.iter().all(|s| model.emitting_states().any(|e| e == s.as_str())));
        assert!(seq
            .outputs
            .iter()
            .all(|o| ["silent", "meow", "purr"].contains(&o.as_str())));
        // Pr{start -> hungry} is zero.
        assert_ne!(seq.states[0], "hungry");
    }
    #[test]
    fn deterministic_under_seed() {
        let model = cat();
        let mut rng1: Xoshiro256StarStar = SeedableRng::seed_from_u64(91);
        let mut rng2: Xoshiro256StarStar = SeedableRng::seed_from_u64(91);
        let xs = generate(&model, 30, &mut rng1).unwrap();
        let ys = generate(&model, 30, &mut rng2).unwrap();
        assert_eq!(xs, ys);
    }
    #[test]
    fn stops_at_silent_state() {
        let mut builder = ModelBuilder::new();
        builder
            .transition(Source::Start, "a", 1.0)
            .transition(Source::State("a"), "b", 1.0)
            .transition(Source::State("b"), "a", 1.0)
            .emission("a", "x", 1.0);
        let model = builder.build();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(1);
        let seq = generate(&model, 10, &mut rng).unwrap();
        assert_eq!(seq.states, vec!["a".to_string()]);
        assert_eq!(seq.outputs, vec!["x".to_string()]);
    }
    #[test]
    fn stops_at_dead_end() {
        let mut builder = ModelBuilder::new();
        builder
            .transition(Source::Start, "a", 1.0)
            .emission("a", "x", 1.0);
        let model = builder.build();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(1);
        let seq = generate(&model, 10, &mut rng).unwrap();
        assert_eq!(seq.len(), 1);
        assert_eq!(format!("{}", seq), "a\nx\n");
    }
    #[test]
    fn needs_start_row() {
        let mut builder = ModelBuilder::new();
        builder
            .transition(Source::State("a"), "a", 1.0)
            .emission("a", "x", 1.0);
        let model = builder.build();
        let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(1);
        assert!(matches!(generate(&model, 3, &mut rng), Err(Error::Model(_))));
        let mut builder = ModelBuilder::new();
        builder.transition(Source::Start, "a", 0.0);
        let model = builder.build();
        assert!(matches!(generate(&model, 0, &mut rng), Err(Error::Model(_))));
    }
}
