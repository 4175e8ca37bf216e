use std::io;
use std::path::PathBuf;

/// Errors surfaced by the chain before any prediction happens.
///
/// Exhausted contexts during prediction are never errors: they are absorbed by
/// back-off, and an empty chain answers with `None` instead.
#[derive(Debug, thiserror::Error)]
pub enum MarkovError {
	#[error("unsupported token kind '{0}', expected 'word', 'character' or 'line'")]
	UnsupportedKind(String),

	#[error("seed must contain at least one token")]
	EmptySeed,

	#[error("order must be >= 1, got {0}")]
	InvalidOrder(usize),

	#[error("failed to read {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("invalid configuration: {0}")]
	Config(String),
}

pub type Result<T> = std::result::Result<T, MarkovError>;
