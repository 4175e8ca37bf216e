use std::collections::HashMap;
use std::fmt;

use log::debug;
use serde::Serialize;

use super::probability_trie::{ProbNode, ProbabilityTrie};
use crate::error::{MarkovError, Result};
use crate::token::TokenId;

/// A node of the counting trie.
///
/// A node stands for one prefix of tokens read from the root. `count` is the
/// number of times that exact prefix was observed during training.
///
/// ## Invariants
/// - Every non-root node has `count >= 1` (it exists because it was observed)
/// - The root count is unused and stays at 0
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountNode {
	count: usize,
	children: HashMap<TokenId, CountNode>,
}

impl CountNode {
	pub fn count(&self) -> usize {
		self.count
	}

	pub fn children(&self) -> &HashMap<TokenId, CountNode> {
		&self.children
	}

	pub fn child(&self, token: TokenId) -> Option<&CountNode> {
		self.children.get(&token)
	}

	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Sum of the direct children counts.
	pub fn children_total(&self) -> usize {
		self.children.values().map(|child| child.count).sum()
	}

	/// Converts this subtree into probabilities relative to each parent.
	///
	/// Children are converted first, then their own probability is set from
	/// this node's total. A leaf yields an empty map and never divides.
	fn to_prob_node(&self) -> ProbNode {
		let total = self.children_total();
		let children = self
			.children
			.iter()
			.map(|(token, child)| {
				let probability = child.count as f64 / total as f64;
				(*token, child.to_prob_node().with_probability(probability))
			})
			.collect();
		ProbNode::new(0.0, children)
	}
}

impl fmt::Display for CountNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut children: Vec<_> = self.children.iter().collect();
		children.sort_by_key(|(token, _)| **token);

		write!(f, "(n={}, children={{", self.count)?;
		for (i, (token, child)) in children.into_iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{token}: {child}")?;
		}
		f.write_str("})")
	}
}

/// Shape summary of a counting trie.
#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TrieStats {
	/// Number of nodes, root excluded.
	pub nodes: usize,
	/// Length of the longest learned prefix.
	pub depth: usize,
	/// Number of distinct tokens directly under the root.
	pub root_fanout: usize,
	/// Sum of counts per depth, `level_totals[0]` being depth 1.
	pub level_totals: Vec<usize>,
}

/// N-gram counting trie.
///
/// Accumulates how often every prefix of length `1..=order` was seen in the
/// training sequence. It is the mutable half of the chain: once training is
/// done it is turned into a `ProbabilityTrie` and left untouched.
///
/// # Responsibilities
/// - Count token paths (`learn`, `learn_many`)
/// - Slide an order-bounded window over a sequence (`learn_ngrams`)
/// - Derive the normalized `ProbabilityTrie`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountingTrie {
	root: CountNode,
}

impl CountingTrie {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn root(&self) -> &CountNode {
		&self.root
	}

	/// True when nothing was ever learned.
	pub fn is_empty(&self) -> bool {
		self.root.is_leaf()
	}

	/// Increments every prefix of `sequence`, creating missing nodes.
	///
	/// An empty sequence is a no-op.
	pub fn learn(&mut self, sequence: &[TokenId]) {
		let mut node = &mut self.root;
		for token in sequence {
			let child = node.children.entry(*token).or_default();
			child.count += 1;
			node = child;
		}
	}

	/// Learns each sequence in turn.
	pub fn learn_many<I, S>(&mut self, sequences: I)
	where
		I: IntoIterator<Item = S>,
		S: AsRef<[TokenId]>,
	{
		for sequence in sequences {
			self.learn(sequence.as_ref());
		}
	}

	/// Trains the trie on `sequence` for an order-`order` chain.
	///
	/// Every full window of `order` tokens is learned, then the final window
	/// (the whole sequence when it is shorter than `order`, learned once in
	/// that case) is learned again through each of its suffixes, from length
	/// `len - 1` down to 1. Each position of the sequence therefore starts
	/// exactly one learned window, and all context lengths get counted.
	///
	/// # Errors
	/// Returns `MarkovError::InvalidOrder` if `order == 0`.
	pub fn learn_ngrams(&mut self, sequence: &[TokenId], order: usize) -> Result<()> {
		if order == 0 {
			return Err(MarkovError::InvalidOrder(order));
		}
		if sequence.is_empty() {
			debug!("empty training sequence, nothing learned");
			return Ok(());
		}

		for window in sequence.windows(order) {
			self.learn(window);
		}

		let tail = &sequence[sequence.len().saturating_sub(order)..];
		if tail.len() < order {
			// The window never filled up
			self.learn(tail);
		}
		for start in 1..tail.len() {
			self.learn(&tail[start..]);
		}

		debug!(
			"learned {} tokens with order {}: {} distinct first tokens",
			sequence.len(),
			order,
			self.root.children.len()
		);
		Ok(())
	}

	/// Count of the prefix `path`, `None` if it was never observed.
	///
	/// The empty path designates the root and returns its children total.
	pub fn count(&self, path: &[TokenId]) -> Option<usize> {
		let mut node = &self.root;
		for token in path {
			node = node.children.get(token)?;
		}
		if path.is_empty() {
			Some(node.children_total())
		} else {
			Some(node.count)
		}
	}

	/// Walks the whole trie and summarizes its shape.
	pub fn stats(&self) -> TrieStats {
		let mut stats = TrieStats {
			root_fanout: self.root.children.len(),
			..TrieStats::default()
		};

		let mut stack: Vec<(&CountNode, usize)> = self.root.children.values().map(|child| (child, 1)).collect();
		while let Some((node, depth)) = stack.pop() {
			stats.nodes += 1;
			stats.depth = stats.depth.max(depth);
			if stats.level_totals.len() < depth {
				stats.level_totals.resize(depth, 0);
			}
			stats.level_totals[depth - 1] += node.count;
			stack.extend(node.children.values().map(|child| (child, depth + 1)));
		}

		stats
	}

	/// Derives the normalized probability trie.
	///
	/// Borrows immutably: calling it twice yields two identical tries.
	pub fn to_probability_trie(&self) -> ProbabilityTrie {
		let trie = ProbabilityTrie::new(self.root.to_prob_node());
		debug!("derived probability trie of depth {}", trie.depth());
		trie
	}
}

impl fmt::Display for CountingTrie {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.root, f)
	}
}
