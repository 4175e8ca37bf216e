//! Graph rendering of a trained trie.
//!
//! The traversal only reads the trie. Node ids are the graph's own indices,
//! so each call numbers its nodes from zero.

use std::fmt;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::model::counting_trie::CountNode;
use crate::model::probability_trie::ProbNode;
use crate::token::{TokenId, Vocabulary};

/// Label of the root node.
pub const ROOT_LABEL: &str = "start";

/// Weight carried by an edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Weight {
	Count(usize),
	Probability(f64),
}

impl fmt::Display for Weight {
	/// Counts print as-is, probabilities are floored to two decimals.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Weight::Count(count) => write!(f, "{count}"),
			Weight::Probability(p) => write!(f, "{}", (p * 100.0).floor() / 100.0),
		}
	}
}

/// Read-only access to a trie node, enough to draw it.
pub trait TrieView {
	/// `(child token, child weight, child subtree)` for every direct child.
	fn branches(&self) -> Vec<(TokenId, Weight, &Self)>;
}

impl TrieView for CountNode {
	fn branches(&self) -> Vec<(TokenId, Weight, &Self)> {
		self.children()
			.iter()
			.map(|(token, child)| (*token, Weight::Count(child.count()), child))
			.collect()
	}
}

impl TrieView for ProbNode {
	fn branches(&self) -> Vec<(TokenId, Weight, &Self)> {
		self.children()
			.iter()
			.map(|(token, child)| (*token, Weight::Probability(child.probability()), child))
			.collect()
	}
}

fn label(vocabulary: &Vocabulary, token: TokenId) -> String {
	match vocabulary.resolve(token) {
		Some(text) => text.to_owned(),
		None => token.to_string(),
	}
}

/// Builds a directed graph of `root`: nodes labelled with token text, edges
/// with weights.
///
/// Siblings are visited in token text order so that the output is stable.
pub fn to_graph<T: TrieView>(root: &T, vocabulary: &Vocabulary) -> DiGraph<String, String> {
	let mut graph = DiGraph::new();
	let root_index = graph.add_node(ROOT_LABEL.to_owned());

	let mut stack: Vec<(&T, NodeIndex)> = vec![(root, root_index)];
	while let Some((node, index)) = stack.pop() {
		let mut branches: Vec<(String, Weight, &T)> = node
			.branches()
			.into_iter()
			.map(|(token, weight, child)| (label(vocabulary, token), weight, child))
			.collect();
		branches.sort_by(|a, b| a.0.cmp(&b.0));

		// Pushed in reverse so siblings pop in order
		for (text, weight, child) in branches.into_iter().rev() {
			let child_index = graph.add_node(text);
			graph.add_edge(index, child_index, weight.to_string());
			stack.push((child, child_index));
		}
	}

	graph
}

/// Renders `root` as a Graphviz DOT document.
pub fn to_dot<T: TrieView>(root: &T, vocabulary: &Vocabulary) -> String {
	let graph = to_graph(root, vocabulary);
	format!("digraph G {{\n{}}}\n", Dot::with_config(&graph, &[Config::GraphContentOnly]))
}
