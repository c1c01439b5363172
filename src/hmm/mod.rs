//! A tiny implementation of discrete, first-order hidden Markov models.
//!
//! States and symbols are named by strings in the input tables. Internally each
//! distinct name is given a dense index in first-appearance order, and every
//! table is kept twice: as sparse rows which remember the declared keys and
//! their order (the recurrences iterate in that order, so ties are broken by
//! it), and as flat dense matrices for constant-time lookups.
//! Anything not declared reads as probability zero.
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
pub mod forward;
pub mod viterbi;

/// Source of a transition row: the virtual start marker or a real state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source<'a> {
    Start,
    State(&'a str),
}

impl std::fmt::Display for Source<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Start => write!(f, "<start>"),
            Source::State(name) => write!(f, "{}", name),
        }
    }
}

/// Sparse probability row. Keys keep their first-declared position;
/// redeclaring a key overwrites its probability in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    entries: Vec<(usize, f64)>,
}

impl Row {
    pub fn get(&self, target: usize) -> f64 {
        self.entries
            .iter()
            .find(|&&(key, _)| key == target)
            .map_or(0f64, |&(_, prob)| prob)
    }
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }
    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// Sum of all probabilities in this row.
    pub fn mass(&self) -> f64 {
        self.entries.iter().map(|x| x.1).sum()
    }
    fn set(&mut self, target: usize, prob: f64) {
        match self.entries.iter_mut().find(|(key, _)| *key == target) {
            Some(slot) => slot.1 = prob,
            None => self.entries.push((target, prob)),
        }
    }
}

/// String interner. Ids are dense and follow first appearance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Names {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Names {
    fn intern(&mut self, name: &str) -> usize {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }
    fn id(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
    fn name(&self, id: usize) -> &str {
        &self.names[id]
    }
    fn len(&self) -> usize {
        self.names.len()
    }
}

/// Mutable staging area for a [`Model`]. The table loader drives it line by line.
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    states: Names,
    symbols: Names,
    initial: Option<Row>,
    transitions: Vec<(usize, Row)>,
    emissions: Vec<(usize, Row)>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    /// Declare a transition row for `from`, even if it never gets an entry.
    pub fn transition_row(&mut self, from: Source<'_>) -> &mut Row {
        match from {
            Source::Start => self.initial.get_or_insert_with(Row::default),
            Source::State(name) => {
                let id = self.states.intern(name);
                Self::row_of(&mut self.transitions, id)
            }
        }
    }
    pub fn transition(&mut self, from: Source<'_>, to: &str, prob: f64) -> &mut Self {
        let to = self.states.intern(to);
        self.transition_row(from).set(to, prob);
        self
    }
    /// Declare an emission row for `state`, even if it never gets an entry.
    pub fn emission_row(&mut self, state: &str) -> &mut Row {
        let id = self.states.intern(state);
        Self::row_of(&mut self.emissions, id)
    }
    pub fn emission(&mut self, state: &str, symbol: &str, prob: f64) -> &mut Self {
        let symbol = self.symbols.intern(symbol);
        self.emission_row(state).set(symbol, prob);
        self
    }
    fn row_of(rows: &mut Vec<(usize, Row)>, id: usize) -> &mut Row {
        let pos = match rows.iter().position(|&(key, _)| key == id) {
            Some(pos) => pos,
            None => {
                rows.push((id, Row::default()));
                rows.len() - 1
            }
        };
        &mut rows[pos].1
    }
    pub fn build(self) -> Model {
        let (n, m) = (self.states.len(), self.symbols.len());
        let mut init = vec![0f64; n];
        if let Some(row) = self.initial.as_ref() {
            row.iter().for_each(|(to, prob)| init[to] = prob);
        }
        let mut trans = vec![0f64; n * n];
        for (from, row) in self.transitions.iter() {
            row.iter().for_each(|(to, prob)| trans[from * n + to] = prob);
        }
        let mut emit = vec![0f64; n * m];
        let mut has_emission = vec![false; n];
        for &(state, ref row) in self.emissions.iter() {
            has_emission[state] = true;
            row.iter().for_each(|(sym, prob)| emit[state * m + sym] = prob);
        }
        debug!(
            "MODEL\t{} states\t{} symbols\t{} transition rows\t{} emission rows",
            n,
            m,
            self.transitions.len() + self.initial.is_some() as usize,
            self.emissions.len()
        );
        Model {
            states: self.states,
            symbols: self.symbols,
            initial: self.initial,
            transitions: self.transitions,
            emissions: self.emissions,
            init,
            trans,
            emit,
            has_emission,
        }
    }
}

/// Immutable HMM. Built once, then shared by reference between the generator,
/// the forward evaluator, and the Viterbi decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    states: Names,
    symbols: Names,
    /// Row of the start marker.
    initial: Option<Row>,
    /// Transition rows of real states, in declaration order.
    transitions: Vec<(usize, Row)>,
    /// Emission rows, in declaration order.
    emissions: Vec<(usize, Row)>,
    /// Pr{start -> to} at [to].
    init: Vec<f64>,
    /// Pr{from -> to} at [from * n + to].
    trans: Vec<f64>,
    /// Pr{symbol | state} at [state * m + symbol].
    emit: Vec<f64>,
    has_emission: Vec<bool>,
}

impl Model {
    pub fn num_states(&self) -> usize {
        self.states.len()
    }
    pub fn num_symbols(&self) -> usize {
        self.symbols.len()
    }
    pub fn state_name(&self, id: usize) -> &str {
        self.states.name(id)
    }
    pub fn symbol_name(&self, id: usize) -> &str {
        self.symbols.name(id)
    }
    pub fn state_id(&self, name: &str) -> Option<usize> {
        self.states.id(name)
    }
    pub fn symbol_id(&self, name: &str) -> Option<usize> {
        self.symbols.id(name)
    }
    /// Real states owning a transition row, in declaration order.
    pub fn sources(&self) -> impl Iterator<Item = &str> + '_ {
        self.transitions.iter().map(move |&(s, _)| self.states.name(s))
    }
    /// States owning an emission row, in declaration order.
    pub fn emitting_states(&self) -> impl Iterator<Item = &str> + '_ {
        self.emissions.iter().map(move |&(s, _)| self.states.name(s))
    }
    pub fn initial(&self) -> Option<Vec<(&str, f64)>> {
        self.initial.as_ref().map(|row| self.named(row, &self.states))
    }
    pub fn transitions_from(&self, from: Source<'_>) -> Option<Vec<(&str, f64)>> {
        match from {
            Source::Start => self.initial(),
            Source::State(name) => {
                let row = self.transition_row(self.states.id(name)?)?;
                Some(self.named(row, &self.states))
            }
        }
    }
    pub fn emissions_of(&self, state: &str) -> Option<Vec<(&str, f64)>> {
        let row = self.emission_row(self.states.id(state)?)?;
        Some(self.named(row, &self.symbols))
    }
    /// Pr{from -> to}. Zero if either side is unknown.
    pub fn transition(&self, from: Source<'_>, to: &str) -> f64 {
        let to = match self.states.id(to) {
            Some(to) => to,
            None => return 0f64,
        };
        match from {
            Source::Start => self.init[to],
            Source::State(name) => self.states.id(name).map_or(0f64, |from| self.trans_prob(from, to)),
        }
    }
    /// Pr{symbol | state}. Zero if either side is unknown.
    pub fn emission(&self, state: &str, symbol: &str) -> f64 {
        match self.states.id(state) {
            Some(state) => self.emit_prob(state, self.symbols.id(symbol)),
            None => 0f64,
        }
    }
    /// Check the expectations the algorithms rely on but never enforce: every
    /// non-empty row sums to one within `tolerance`, every transition target
    /// can emit, and every emitting state is the target of some transition.
    pub fn validate(&self, tolerance: f64) -> crate::Result<()> {
        let rows = self
            .initial
            .iter()
            .map(|row| (Source::Start, row))
            .chain(
                self.transitions
                    .iter()
                    .map(|(s, row)| (Source::State(self.states.name(*s)), row)),
            );
        for (from, row) in rows {
            let mass = row.mass();
            if !row.is_empty() && (mass - 1f64).abs() > tolerance {
                let msg = format!("transitions from {} sum to {}", from, mass);
                return Err(crate::Error::Model(msg));
            }
            if let Some((to, _)) = row.iter().find(|&(to, _)| !self.has_emission[to]) {
                let msg = format!("{} -> {} targets a state without emissions", from, self.states.name(to));
                return Err(crate::Error::Model(msg));
            }
        }
        for (state, row) in self.emissions.iter() {
            let mass = row.mass();
            let name = self.states.name(*state);
            if !row.is_empty() && (mass - 1f64).abs() > tolerance {
                let msg = format!("emissions of {} sum to {}", name, mass);
                return Err(crate::Error::Model(msg));
            }
            let targets = self.initial.iter().chain(self.transitions.iter().map(|x| &x.1));
            if !targets.flat_map(|row| row.iter()).any(|(to, _)| to == *state) {
                let msg = format!("{} emits but is never a transition target", name);
                return Err(crate::Error::Model(msg));
            }
        }
        Ok(())
    }
    pub(crate) fn initial_row(&self) -> Option<&Row> {
        self.initial.as_ref()
    }
    pub(crate) fn transition_row(&self, state: usize) -> Option<&Row> {
        self.transitions
            .iter()
            .find(|&&(s, _)| s == state)
            .map(|(_, row)| row)
    }
    pub(crate) fn emission_row(&self, state: usize) -> Option<&Row> {
        self.emissions
            .iter()
            .find(|&&(s, _)| s == state)
            .map(|(_, row)| row)
    }
    pub(crate) fn transition_rows(&self) -> &[(usize, Row)] {
        &self.transitions
    }
    pub(crate) fn emission_rows(&self) -> &[(usize, Row)] {
        &self.emissions
    }
    pub(crate) fn has_emission(&self, state: usize) -> bool {
        self.has_emission[state]
    }
    pub(crate) fn init_prob(&self, to: usize) -> f64 {
        self.init[to]
    }
    pub(crate) fn trans_prob(&self, from: usize, to: usize) -> f64 {
        self.trans[from * self.states.len() + to]
    }
    // Unknown symbols are never emitted.
    pub(crate) fn emit_prob(&self, state: usize, symbol: Option<usize>) -> f64 {
        match symbol {
            Some(sym) => self.emit[state * self.symbols.len() + sym],
            None => 0f64,
        }
    }
    fn named<'a>(&'a self, row: &'a Row, names: &'a Names) -> Vec<(&'a str, f64)> {
        row.iter().map(|(id, prob)| (names.name(id), prob)).collect()
    }
}

/// Index of the first maximum. Later candidates must be strictly larger to win,
/// so ties go to whatever comes first in iteration order.
pub(crate) fn first_argmax<I: IntoIterator<Item = (usize, f64)>>(xs: I) -> Option<(usize, f64)> {
    xs.into_iter().fold(None, |best, (i, x)| match best {
        Some((_, max)) if x > max => Some((i, x)),
        None => Some((i, x)),
        _ => best,
    })
}
