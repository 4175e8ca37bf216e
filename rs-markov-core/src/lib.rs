//! Variable-order Markov chain text generation.
//!
//! This crate provides:
//! - Word, character and line tokenizers backed by an interning vocabulary
//! - An n-gram counting trie and its normalized probability trie
//! - Back-off prediction with an injected random source
//! - Graphviz rendering of either trie
//!
//! Training needs exclusive access; a derived `ProbabilityTrie` is immutable
//! and can be shared between threads.

/// Serde-backed chain configuration.
pub mod config;

/// Error taxonomy.
pub mod error;

/// Tries, prediction and the `MarkovChain` facade.
pub mod model;

/// Token ids, vocabulary and tokenizers.
pub mod token;

/// Directed-graph and DOT rendering of tries.
pub mod visualize;

/// I/O utilities (file loading, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use config::ChainConfig;
pub use error::{MarkovError, Result};
pub use model::chain::MarkovChain;
pub use model::counting_trie::{CountNode, CountingTrie, TrieStats};
pub use model::probability_trie::{ProbNode, ProbabilityTrie};
pub use token::{TokenId, TokenKind, Vocabulary};
