use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, Result};
use crate::io;
use crate::token::TokenKind;

/// Default look-behind length of the chain.
pub const DEFAULT_ORDER: usize = 5;
/// Default number of generated tokens.
pub const DEFAULT_AMOUNT: usize = 8;
/// Default corpus path.
pub const DEFAULT_FILE: &str = "in.txt";

/// Everything needed to train a chain and run one generation.
///
/// Missing fields fall back to their defaults when deserialized, so a config
/// file only has to name what it changes. Unknown keys are rejected.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
	/// Look-behind length of the chain, `>= 1`.
	pub order: usize,
	/// Corpus to train on.
	pub file: PathBuf,
	/// How the corpus and the seed are split into tokens.
	pub kind: TokenKind,
	/// Initial history, tokenized with `kind`.
	pub seed: String,
	/// Number of tokens to generate.
	pub amount: usize,
	/// Fixed seed for the random source, fresh entropy when absent.
	pub rng_seed: Option<u64>,
}

impl Default for ChainConfig {
	fn default() -> Self {
		Self {
			order: DEFAULT_ORDER,
			file: PathBuf::from(DEFAULT_FILE),
			kind: TokenKind::default(),
			seed: String::new(),
			amount: DEFAULT_AMOUNT,
			rng_seed: None,
		}
	}
}

impl ChainConfig {
	/// Parses a JSON document.
	///
	/// # Errors
	/// Returns `MarkovError::Config` on malformed JSON, an unknown key or an
	/// unknown kind.
	pub fn from_json(text: &str) -> Result<Self> {
		serde_json::from_str(text).map_err(|e| MarkovError::Config(e.to_string()))
	}

	/// Reads and parses a JSON config file.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		Self::from_json(&io::read_text(path)?)
	}

	/// Rejects configurations that cannot produce any output.
	///
	/// Runs before any training so that a bad seed does not cost a full pass
	/// over the corpus.
	///
	/// # Errors
	/// - `MarkovError::InvalidOrder` if `order == 0`
	/// - `MarkovError::EmptySeed` if the seed holds no token for `kind`
	pub fn validate(&self) -> Result<()> {
		if self.order == 0 {
			return Err(MarkovError::InvalidOrder(self.order));
		}
		if self.kind.split(&self.seed).is_empty() {
			return Err(MarkovError::EmptySeed);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_match_the_cli() {
		let config = ChainConfig::default();
		assert_eq!(config.order, 5);
		assert_eq!(config.amount, 8);
		assert_eq!(config.kind, TokenKind::Word);
		assert_eq!(config.file, PathBuf::from("in.txt"));
	}

	#[test]
	fn partial_json_keeps_defaults() {
		let config = ChainConfig::from_json(r#"{ "kind": "character", "seed": "ab", "rng_seed": 3 }"#).unwrap();
		assert_eq!(config.kind, TokenKind::Character);
		assert_eq!(config.seed, "ab");
		assert_eq!(config.rng_seed, Some(3));
		assert_eq!(config.order, DEFAULT_ORDER);
	}

	#[test]
	fn unknown_kind_is_a_config_error() {
		assert!(matches!(ChainConfig::from_json(r#"{ "kind": "sentence" }"#), Err(MarkovError::Config(_))));
	}

	#[test]
	fn misspelt_key_is_a_config_error() {
		match ChainConfig::from_json(r#"{ "amout": 12 }"#) {
			Err(MarkovError::Config(message)) => assert!(message.contains("amout"), "{message}"),
			other => panic!("unexpected result: {other:?}"),
		}
	}

	#[test]
	fn validation() {
		let mut config = ChainConfig {
			seed: "hello there".to_owned(),
			..ChainConfig::default()
		};
		assert!(config.validate().is_ok());

		config.order = 0;
		assert!(matches!(config.validate(), Err(MarkovError::InvalidOrder(0))));

		config.order = 2;
		config.seed = " \t\n".to_owned();
		assert!(matches!(config.validate(), Err(MarkovError::EmptySeed)));

		config.kind = TokenKind::Character;
		assert!(config.validate().is_ok());
	}
}
