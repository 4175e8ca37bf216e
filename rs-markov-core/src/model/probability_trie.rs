use std::collections::{HashMap, VecDeque};
use std::fmt;

use log::{debug, trace};
use rand::Rng;

use crate::token::TokenId;

/// A node of the probability trie.
///
/// Same prefix structure as `CountNode`, but each node carries its likelihood
/// given the parent context instead of a raw count.
///
/// ## Invariants
/// - For any node with children, the children probabilities sum to 1.0
/// - The root probability is unused and stays at 0.0
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbNode {
	probability: f64,
	children: HashMap<TokenId, ProbNode>,
}

impl ProbNode {
	pub(crate) fn new(probability: f64, children: HashMap<TokenId, ProbNode>) -> Self {
		Self { probability, children }
	}

	pub(crate) fn with_probability(mut self, probability: f64) -> Self {
		self.probability = probability;
		self
	}

	pub fn probability(&self) -> f64 {
		self.probability
	}

	pub fn children(&self) -> &HashMap<TokenId, ProbNode> {
		&self.children
	}

	pub fn child(&self, token: TokenId) -> Option<&ProbNode> {
		self.children.get(&token)
	}

	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	fn depth(&self) -> usize {
		self.children
			.values()
			.map(|child| child.depth() + 1)
			.max()
			.unwrap_or(0)
	}

	/// Draws one child token, weighted by the children probabilities.
	///
	/// Candidates are accumulated in ascending probability order (ties broken
	/// by token id) and the first one whose cumulative boundary exceeds a
	/// uniform draw in `[0, 1)` wins. The last candidate absorbs any rounding
	/// shortfall.
	///
	/// Returns `None` if the node is a leaf.
	pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<TokenId> {
		let mut choices: Vec<(TokenId, f64)> = self
			.children
			.iter()
			.map(|(token, child)| (*token, child.probability))
			.collect();
		choices.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

		let r: f64 = rng.random();
		let mut cumulative = 0.0;
		for (token, probability) in &choices {
			cumulative += probability;
			if r < cumulative {
				return Some(*token);
			}
		}

		choices.last().map(|(token, _)| *token)
	}
}

impl fmt::Display for ProbNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut children: Vec<_> = self.children.iter().collect();
		children.sort_by_key(|(token, _)| **token);

		write!(f, "(p={}, children={{", self.probability)?;
		for (i, (token, child)) in children.into_iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{token}: {child}")?;
		}
		f.write_str("})")
	}
}

/// Normalized, immutable view of a trained chain.
///
/// Built once from a `CountingTrie` and only read afterwards, so a single
/// instance can serve any number of threads, each bringing its own random
/// source.
///
/// # Responsibilities
/// - Resolve the longest usable context for a history (back-off)
/// - Sample the next token from that context
/// - Generate sequences over a rolling history window
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProbabilityTrie {
	root: ProbNode,
	depth: usize,
}

impl ProbabilityTrie {
	pub(crate) fn new(root: ProbNode) -> Self {
		let depth = root.depth();
		Self { root, depth }
	}

	pub fn root(&self) -> &ProbNode {
		&self.root
	}

	/// Length of the longest stored prefix (the training order at most).
	pub fn depth(&self) -> usize {
		self.depth
	}

	pub fn is_empty(&self) -> bool {
		self.root.is_leaf()
	}

	/// Follows `path` from the root, `None` as soon as an edge is missing.
	pub fn walk(&self, path: &[TokenId]) -> Option<&ProbNode> {
		let mut node = &self.root;
		for token in path {
			node = node.children.get(token)?;
		}
		Some(node)
	}

	/// Finds the context a prediction for `history` is drawn from.
	///
	/// The oldest token is dropped until the remaining history leads to a node
	/// that has continuations; the empty history stands for the root. Histories
	/// longer than the trie can never match, so they start out trimmed to its
	/// depth.
	///
	/// Returns the matched suffix of `history` with its node, or `None` when
	/// the trie holds no data at all.
	pub fn back_off<'h>(&self, history: &'h [TokenId]) -> Option<(&'h [TokenId], &ProbNode)> {
		let mut context = &history[history.len().saturating_sub(self.depth)..];
		loop {
			if let Some(node) = self.walk(context) {
				if !node.is_leaf() {
					return Some((context, node));
				}
			}
			if context.is_empty() {
				return None;
			}
			trace!("no continuation for a {}-token context, backing off", context.len());
			context = &context[1..];
		}
	}

	/// Samples the token following `history`.
	///
	/// Returns `None` only when the trie was trained on nothing.
	pub fn predict<R: Rng + ?Sized>(&self, history: &[TokenId], rng: &mut R) -> Option<TokenId> {
		let (_, node) = self.back_off(history)?;
		node.sample(rng)
	}

	/// Predicts `count` tokens, sliding the history window after each one.
	///
	/// The window keeps the length of `seed`: the oldest token is dropped and
	/// the prediction appended. Stops early only if `predict` returns `None`.
	pub fn generate<R: Rng + ?Sized>(&self, seed: &[TokenId], count: usize, rng: &mut R) -> Vec<TokenId> {
		let mut window: VecDeque<TokenId> = seed.iter().copied().collect();
		let mut output = Vec::with_capacity(count);

		for _ in 0..count {
			let Some(next) = self.predict(window.make_contiguous(), rng) else {
				debug!("empty chain, stopping after {} tokens", output.len());
				break;
			};
			output.push(next);
			if window.pop_front().is_some() {
				window.push_back(next);
			}
		}

		output
	}
}

impl fmt::Display for ProbabilityTrie {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.root, f)
	}
}

#[cfg(test)]
mod tests {
	use rand::rngs::StdRng;
	use rand::{RngCore, SeedableRng};

	use super::*;
	use crate::model::counting_trie::CountingTrie;
	use crate::token::{TokenKind, Vocabulary};

	/// Always draws the largest value below 1.0.
	struct MaxRng;

	impl RngCore for MaxRng {
		fn next_u32(&mut self) -> u32 {
			u32::MAX
		}

		fn next_u64(&mut self) -> u64 {
			u64::MAX
		}

		fn fill_bytes(&mut self, dst: &mut [u8]) {
			dst.fill(0xff);
		}
	}

	fn train(text: &str, order: usize) -> (ProbabilityTrie, Vocabulary) {
		let mut vocabulary = Vocabulary::new();
		let seq = TokenKind::Word.tokenize(text, &mut vocabulary);
		let mut counts = CountingTrie::new();
		counts.learn_ngrams(&seq, order).unwrap();
		(counts.to_probability_trie(), vocabulary)
	}

	fn id(vocabulary: &Vocabulary, text: &str) -> TokenId {
		vocabulary.lookup(text).unwrap()
	}

	fn assert_normalized(node: &ProbNode) {
		if !node.is_leaf() {
			let sum: f64 = node.children().values().map(ProbNode::probability).sum();
			assert!((sum - 1.0).abs() < 1e-9, "children sum to {sum}");
		}
		for child in node.children().values() {
			assert!((0.0..=1.0).contains(&child.probability()));
			assert_normalized(child);
		}
	}

	#[test]
	fn scenario_probabilities() {
		let (trie, v) = train("a b a b a c", 2);
		let (a, b, c) = (id(&v, "a"), id(&v, "b"), id(&v, "c"));
		let root = trie.root();

		assert!((root.child(a).unwrap().probability() - 0.5).abs() < 1e-9);
		assert!((root.child(b).unwrap().probability() - 1.0 / 3.0).abs() < 1e-9);
		assert!((root.child(c).unwrap().probability() - 1.0 / 6.0).abs() < 1e-9);

		let after_a = root.child(a).unwrap();
		assert!((after_a.child(b).unwrap().probability() - 2.0 / 3.0).abs() < 1e-9);
		assert!((after_a.child(c).unwrap().probability() - 1.0 / 3.0).abs() < 1e-9);
		assert_eq!(trie.depth(), 2);
	}

	#[test]
	fn probabilities_are_normalized_everywhere() {
		let (trie, _) = train("the cat sat on the mat and the dog sat on the cat", 4);
		assert_normalized(trie.root());
	}

	#[test]
	fn derivation_is_idempotent() {
		let mut vocabulary = Vocabulary::new();
		let seq = TokenKind::Character.tokenize("abracadabra", &mut vocabulary);
		let mut counts = CountingTrie::new();
		counts.learn_ngrams(&seq, 3).unwrap();

		assert_eq!(counts.to_probability_trie(), counts.to_probability_trie());
	}

	#[test]
	fn predict_after_a_follows_observed_transitions() {
		let (trie, v) = train("a b a b a c", 2);
		let (a, b, c) = (id(&v, "a"), id(&v, "b"), id(&v, "c"));
		let mut rng = StdRng::seed_from_u64(42);

		let mut seen_b = 0;
		let draws = 10_000;
		for _ in 0..draws {
			let next = trie.predict(&[a], &mut rng).unwrap();
			assert!(next == b || next == c);
			if next == b {
				seen_b += 1;
			}
		}
		let ratio = seen_b as f64 / draws as f64;
		assert!((ratio - 2.0 / 3.0).abs() < 0.03, "P(b|a) observed as {ratio}");
	}

	#[test]
	fn unknown_oldest_token_backs_off_to_shorter_context() {
		let (trie, v) = train("a b a b a c", 2);
		let a = id(&v, "a");
		let history = [TokenId::UNKNOWN, a];

		let (context, node) = trie.back_off(&history).unwrap();
		assert_eq!(context, &[a]);
		assert_eq!(node, trie.root().child(a).unwrap());
	}

	#[test]
	fn unknown_last_token_backs_off_to_root() {
		let (trie, v) = train("a b a b a c", 2);
		let history = [id(&v, "a"), TokenId::UNKNOWN];

		let (context, node) = trie.back_off(&history).unwrap();
		assert!(context.is_empty());
		assert_eq!(node, trie.root());

		let mut rng = StdRng::seed_from_u64(1);
		assert!(trie.predict(&history, &mut rng).is_some());
	}

	#[test]
	fn leaf_context_backs_off() {
		let (trie, v) = train("a b a b a c", 2);
		// "a c" is a depth-2 leaf, then "c" alone is a leaf too
		let history = [id(&v, "a"), id(&v, "c")];
		let (context, node) = trie.back_off(&history).unwrap();
		assert!(context.is_empty());
		assert_eq!(node, trie.root());
	}

	#[test]
	fn long_histories_are_trimmed_to_depth() {
		let (trie, v) = train("a b a b a c", 2);
		let (a, b) = (id(&v, "a"), id(&v, "b"));
		let history = [b, b, b, b, b, a];
		let (context, _) = trie.back_off(&history).unwrap();
		assert_eq!(context, &[a]);
	}

	#[test]
	fn empty_trie_never_predicts() {
		let (trie, _) = train("", 3);
		let mut rng = StdRng::seed_from_u64(0);

		assert!(trie.is_empty());
		assert_eq!(trie.predict(&[], &mut rng), None);
		assert_eq!(trie.predict(&[TokenId::UNKNOWN, TokenId::UNKNOWN], &mut rng), None);
		assert!(trie.generate(&[TokenId::UNKNOWN], 5, &mut rng).is_empty());
	}

	#[test]
	fn back_off_always_terminates_with_a_token() {
		let (trie, v) = train("one two three two one three three one", 3);
		let mut rng = StdRng::seed_from_u64(9);
		let one = id(&v, "one");
		let histories: [&[TokenId]; 4] = [
			&[one],
			&[TokenId::UNKNOWN],
			&[TokenId::UNKNOWN, TokenId::UNKNOWN, TokenId::UNKNOWN, TokenId::UNKNOWN],
			&[one, TokenId::UNKNOWN, one, one, one, one, one],
		];
		for history in histories {
			assert!(trie.predict(history, &mut rng).is_some());
		}
	}

	#[test]
	fn sampling_falls_back_to_last_candidate() {
		let mut children = HashMap::new();
		children.insert(TokenId::UNKNOWN, ProbNode::new(0.3, HashMap::new()));
		let node = ProbNode::new(0.0, children);

		// The draw is just below 1.0, beyond the cumulative 0.3
		assert_eq!(node.sample(&mut MaxRng), Some(TokenId::UNKNOWN));
		assert_eq!(ProbNode::default().sample(&mut MaxRng), None);
	}

	#[test]
	fn generate_is_reproducible_with_a_seeded_rng() {
		let (trie, v) = train("the cat sat on the mat and the dog sat on the cat", 3);
		let seed = [id(&v, "the"), id(&v, "cat")];

		let first = trie.generate(&seed, 20, &mut StdRng::seed_from_u64(7));
		let second = trie.generate(&seed, 20, &mut StdRng::seed_from_u64(7));
		assert_eq!(first.len(), 20);
		assert_eq!(first, second);
	}

	#[test]
	fn generate_with_empty_seed_samples_from_root() {
		let (trie, v) = train("x x x", 2);
		let output = trie.generate(&[], 4, &mut StdRng::seed_from_u64(3));
		assert_eq!(output, vec![id(&v, "x"); 4]);
	}

	#[test]
	fn shared_trie_predicts_from_many_threads() {
		let (trie, v) = train("a b a b a c", 2);
		let a = id(&v, "a");

		std::thread::scope(|scope| {
			for seed in 0..4 {
				let trie = &trie;
				scope.spawn(move || {
					let mut rng = StdRng::seed_from_u64(seed);
					for _ in 0..100 {
						assert_ne!(trie.predict(&[a], &mut rng), Some(a));
					}
				});
			}
		});
	}
}
