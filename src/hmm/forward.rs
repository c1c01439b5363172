use super::first_argmax;
use super::Model;
use crate::{Error, Result};
use log::trace;

impl Model {
    /// Forward algorithm. Returns the state carrying the most mass at the last
    /// observation, together with its share of the mass of that final slice.
    ///
    /// The share is normalized over the final time step only. It is not the
    /// sequence likelihood Pr{observations|self}; to get that, call
    /// [`Model::forward_table`] and sum the last row.
    /// If every path dies out the weight is 0, and the state is the first one
    /// in iteration order.
    pub fn forward<T: AsRef<str>>(&self, observations: &[T]) -> Result<(&str, f64)> {
        let alpha = self.forward_table(observations)?;
        let last = alpha.last().ok_or(Error::EmptyObservations)?;
        let (best, max) = first_argmax(last.iter().copied())
            .ok_or_else(|| Error::Model("no state is reachable from the start marker".to_string()))?;
        let total: f64 = last.iter().map(|x| x.1).sum();
        let weight = if 0f64 < total { max / total } else { 0f64 };
        trace!("FWD\t{}\t{}\t{}", self.state_name(best), max, total);
        Ok((self.state_name(best), weight))
    }
    /// Raw forward values, one slice per observation.
    /// The first slice covers the targets of the start marker, in declared order.
    /// Later slices cover every transition source that has an emission row,
    /// in declared order.
    pub fn forward_table<T: AsRef<str>>(&self, observations: &[T]) -> Result<Vec<Vec<(usize, f64)>>> {
        let (first, rest) = observations
            .split_first()
            .ok_or(Error::EmptyObservations)?;
        let initial = self
            .initial_row()
            .ok_or_else(|| Error::Model("start marker has no transition row".to_string()))?;
        let symbol = self.symbol_id(first.as_ref());
        let alpha: Vec<_> = initial
            .iter()
            .map(|(s, p)| (s, p * self.emit_prob(s, symbol)))
            .collect();
        let mut table = Vec::with_capacity(observations.len());
        table.push(alpha);
        for obs in rest {
            let symbol = self.symbol_id(obs.as_ref());
            let prev = &table[table.len() - 1];
            let alpha: Vec<_> = self
                .transition_rows()
                .iter()
                .map(|&(s, _)| s)
                .filter(|&s| self.has_emission(s))
                .map(|s| {
                    let emit = self.emit_prob(s, symbol);
                    let lk: f64 = prev
                        .iter()
                        .map(|&(from, a)| a * self.trans_prob(from, s) * emit)
                        .sum();
                    (s, lk)
                })
                .collect();
            table.push(alpha);
        }
        Ok(table)
    }
}
