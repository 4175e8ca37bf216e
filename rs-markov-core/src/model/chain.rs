use std::path::Path;

use log::info;
use rand::Rng;

use super::counting_trie::CountingTrie;
use super::probability_trie::ProbabilityTrie;
use crate::config::ChainConfig;
use crate::error::{MarkovError, Result};
use crate::io;
use crate::token::{TokenId, TokenKind, Vocabulary};

/// High-level Markov chain over one corpus.
///
/// # Responsibilities
/// - Tokenize the corpus once and own the resulting `Vocabulary`
/// - Train the `CountingTrie` and derive the `ProbabilityTrie`
/// - Turn seed text into a history and generated tokens back into text
///
/// The chain is read-only once built; `generate_text` only needs `&self`.
#[derive(Clone, Debug)]
pub struct MarkovChain {
	kind: TokenKind,
	order: usize,
	vocabulary: Vocabulary,
	counts: CountingTrie,
	trie: ProbabilityTrie,
}

impl MarkovChain {
	/// Tokenizes `text` with `kind` and trains an order-`order` chain on it.
	///
	/// # Errors
	/// Returns `MarkovError::InvalidOrder` if `order == 0`.
	pub fn train(text: &str, kind: TokenKind, order: usize) -> Result<Self> {
		let mut vocabulary = Vocabulary::new();
		let sequence = kind.tokenize(text, &mut vocabulary);

		info!(
			"training on {} {} tokens ({} distinct), order {}...",
			sequence.len(),
			kind,
			vocabulary.len(),
			order
		);
		let mut counts = CountingTrie::new();
		counts.learn_ngrams(&sequence, order)?;
		let trie = counts.to_probability_trie();
		info!("done");

		Ok(Self { kind, order, vocabulary, counts, trie })
	}

	/// Reads the corpus at `path` and trains on it.
	pub fn from_corpus<P: AsRef<Path>>(path: P, kind: TokenKind, order: usize) -> Result<Self> {
		let text = io::read_text(&path)?;
		info!("loaded corpus '{}'", io::corpus_name(&path));
		Self::train(&text, kind, order)
	}

	/// Validates `config`, reads its corpus and trains on it.
	///
	/// Configuration errors are reported before the corpus is even read.
	pub fn from_config(config: &ChainConfig) -> Result<Self> {
		config.validate()?;
		Self::from_corpus(&config.file, config.kind, config.order)
	}

	pub fn kind(&self) -> TokenKind {
		self.kind
	}

	pub fn order(&self) -> usize {
		self.order
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn counting_trie(&self) -> &CountingTrie {
		&self.counts
	}

	pub fn probability_trie(&self) -> &ProbabilityTrie {
		&self.trie
	}

	/// Tokenizes `seed` against the corpus vocabulary.
	///
	/// # Errors
	/// Returns `MarkovError::EmptySeed` if `seed` holds no token.
	pub fn history(&self, seed: &str) -> Result<Vec<TokenId>> {
		let history = self.kind.encode(seed, &self.vocabulary);
		if history.is_empty() {
			return Err(MarkovError::EmptySeed);
		}
		Ok(history)
	}

	/// Generates up to `amount` tokens following `seed`.
	pub fn generate_tokens<R: Rng + ?Sized>(&self, seed: &str, amount: usize, rng: &mut R) -> Result<Vec<TokenId>> {
		let history = self.history(seed)?;
		Ok(self.trie.generate(&history, amount, rng))
	}

	/// Generates up to `amount` tokens and renders them after `seed`.
	///
	/// Each generated token is preceded by the kind's separator: a space for
	/// words, a line break for lines, nothing for characters.
	pub fn generate_text<R: Rng + ?Sized>(&self, seed: &str, amount: usize, rng: &mut R) -> Result<String> {
		let tokens = self.generate_tokens(seed, amount, rng)?;
		Ok(self.render(seed, &tokens))
	}

	/// Joins `tokens` after `prefix` with the kind's separator.
	pub fn render(&self, prefix: &str, tokens: &[TokenId]) -> String {
		let separator = self.kind.separator();
		let mut text = prefix.to_owned();
		for token in tokens {
			text.push_str(separator);
			// Generated ids always come from the vocabulary
			text.push_str(self.vocabulary.resolve(*token).unwrap_or_default());
		}
		text
	}
}
