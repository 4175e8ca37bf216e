//! Variable-order Markov chain over interned tokens.
//!
//! - Counting trie built during training (`CountingTrie`)
//! - Normalized, immutable probability trie (`ProbabilityTrie`)
//! - Back-off prediction and rolling-window generation
//! - A high-level facade tying tokenizer and tries together (`MarkovChain`)

/// Corpus-level facade: tokenize, train, derive, generate text.
pub mod chain;

/// N-gram counting trie.
///
/// Accumulates prefix counts from a token sequence and derives the
/// probability trie from them.
pub mod counting_trie;

/// Normalized trie with back-off prediction and sequence generation.
pub mod probability_trie;
