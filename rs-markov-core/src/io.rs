use std::fs;
use std::path::Path;

use crate::error::{MarkovError, Result};

/// Reads a whole UTF-8 text file into memory.
///
/// The path is kept in the error so callers can report which file failed.
pub(crate) fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
	let path = path.as_ref();
	fs::read_to_string(path).map_err(|source| MarkovError::Io {
		path: path.to_path_buf(),
		source,
	})
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/corpus.txt"` → `"corpus"`
/// - `"corpus"` → `"corpus"`
pub(crate) fn corpus_name<P: AsRef<Path>>(path: P) -> String {
	path.as_ref()
		.file_stem()
		.map(|stem| stem.to_string_lossy().to_string())
		.unwrap_or_else(|| path.as_ref().display().to_string())
}
