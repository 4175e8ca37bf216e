use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MarkovError;

/// Interned token identifier.
///
/// The tries only ever compare and hash these ids; the text behind an id
/// lives in the `Vocabulary` that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TokenId(u32);

impl TokenId {
	/// Id reserved for text that was never interned. It never labels a trie edge.
	pub const UNKNOWN: TokenId = TokenId(u32::MAX);

	pub fn index(self) -> usize {
		self.0 as usize
	}

	/// Id of the `index`-th interned token, `None` once ids would reach
	/// `UNKNOWN`.
	fn from_index(index: usize) -> Option<Self> {
		match u32::try_from(index) {
			Ok(id) if id != u32::MAX => Some(TokenId(id)),
			_ => None,
		}
	}
}

impl fmt::Display for TokenId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Bidirectional `String <-> TokenId` interner.
///
/// Ids are assigned densely in first-seen order, so `resolve` is a plain index.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
	ids: HashMap<String, TokenId>,
	texts: Vec<String>,
}

impl Vocabulary {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the id of `text`, assigning a new one on first sight.
	///
	/// # Panics
	/// Panics if the vocabulary already holds `u32::MAX` distinct tokens, the
	/// last id being reserved for `TokenId::UNKNOWN`.
	pub fn intern(&mut self, text: &str) -> TokenId {
		if let Some(id) = self.ids.get(text) {
			return *id;
		}
		let Some(id) = TokenId::from_index(self.texts.len()) else {
			panic!("vocabulary is full: {} distinct tokens", self.texts.len());
		};
		self.texts.push(text.to_owned());
		self.ids.insert(text.to_owned(), id);
		id
	}

	/// Read-only lookup, `None` if `text` was never interned.
	pub fn lookup(&self, text: &str) -> Option<TokenId> {
		self.ids.get(text).copied()
	}

	/// Text behind an id, `None` for `TokenId::UNKNOWN` or foreign ids.
	pub fn resolve(&self, id: TokenId) -> Option<&str> {
		self.texts.get(id.index()).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.texts.len()
	}

	pub fn is_empty(&self) -> bool {
		self.texts.is_empty()
	}
}

/// Granularity of a single token.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
	/// Whitespace-delimited words.
	#[default]
	Word,
	/// One token per Unicode scalar value.
	Character,
	/// One token per line, `\n` and `\r\n` both end a line.
	Line,
}

impl TokenKind {
	/// Splits `text` into raw token slices.
	pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
		match self {
			TokenKind::Word => text.split_whitespace().collect(),
			TokenKind::Character => text
				.char_indices()
				.map(|(i, c)| &text[i..i + c.len_utf8()])
				.collect(),
			TokenKind::Line => text.lines().collect(),
		}
	}

	/// Splits `text` and interns every token into `vocabulary`.
	pub fn tokenize(&self, text: &str, vocabulary: &mut Vocabulary) -> Vec<TokenId> {
		self.split(text)
			.into_iter()
			.map(|token| vocabulary.intern(token))
			.collect()
	}

	/// Splits `text` against a frozen vocabulary.
	///
	/// Tokens the vocabulary has never seen become `TokenId::UNKNOWN`, so they
	/// keep their position in a history without ever matching a trie edge.
	pub fn encode(&self, text: &str, vocabulary: &Vocabulary) -> Vec<TokenId> {
		self.split(text)
			.into_iter()
			.map(|token| vocabulary.lookup(token).unwrap_or(TokenId::UNKNOWN))
			.collect()
	}

	/// Text written after each token when rendering output.
	pub fn separator(&self) -> &'static str {
		match self {
			TokenKind::Word => " ",
			TokenKind::Character => "",
			TokenKind::Line => "\n",
		}
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			TokenKind::Word => "word",
			TokenKind::Character => "character",
			TokenKind::Line => "line",
		}
	}
}

impl FromStr for TokenKind {
	type Err = MarkovError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"word" => Ok(TokenKind::Word),
			"character" => Ok(TokenKind::Character),
			"line" => Ok(TokenKind::Line),
			other => Err(MarkovError::UnsupportedKind(other.to_owned())),
		}
	}
}

impl fmt::Display for TokenKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
