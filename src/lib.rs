//! Inference over discrete, first-order hidden Markov models.
//!
//! A [`Model`] is loaded once from a pair of flat tables (see [`tables`]) and then
//! queried read-only:
//! - [`gen_seq::generate`] samples a synthetic state/observation sequence,
//! - [`Model::forward`] predicts the state at the last observation,
//! - [`Model::viterbi`] recovers the most probable state path.
//!
//! ```
//! use tinyhmm::{ModelBuilder, Source};
//! let mut builder = ModelBuilder::new();
//! builder
//!     .transition(Source::Start, "rain", 0.6)
//!     .transition(Source::Start, "sun", 0.4)
//!     .transition(Source::State("rain"), "rain", 0.7)
//!     .transition(Source::State("rain"), "sun", 0.3)
//!     .transition(Source::State("sun"), "rain", 0.4)
//!     .transition(Source::State("sun"), "sun", 0.6)
//!     .emission("rain", "umbrella", 0.9)
//!     .emission("rain", "none", 0.1)
//!     .emission("sun", "umbrella", 0.2)
//!     .emission("sun", "none", 0.8);
//! let model = builder.build();
//! let path = model.viterbi(&["umbrella", "umbrella", "none"]).unwrap();
//! assert_eq!(path, vec!["rain", "rain", "sun"]);
//! ```
pub mod dptable;
pub mod error;
pub mod gen_seq;
pub mod hmm;
pub mod observations;
pub mod tables;
pub use error::{Error, Result};
pub use gen_seq::{generate, Sequence};
pub use hmm::{Model, ModelBuilder, Source};
pub use tables::load;
