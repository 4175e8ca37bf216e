use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use env_logger::Env;
use log::{LevelFilter, debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

use rs_markov_core::visualize::to_dot;
use rs_markov_core::{ChainConfig, MarkovChain, TokenKind};

/// Which trie `--graph` prints.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum GraphKind {
	Probability,
	Counting,
}

/// Command-line flags.
///
/// Every chain option is optional here so that an explicit flag can be told
/// apart from a default and override the `--config` file.
#[derive(Parser, Debug)]
#[command(author, version, about = "Variable-order Markov chain text generator", long_about = None)]
struct Cli {
	/// The 'look-behind memory' of the Markov chain [default: 5]
	#[arg(long, value_name = "N")]
	order: Option<usize>,

	/// The file to create a Markov chain from [default: in.txt]
	#[arg(long, value_name = "PATH")]
	file: Option<PathBuf>,

	/// The size of a single token: word, character or line [default: word]
	#[arg(long)]
	kind: Option<String>,

	/// The text to seed the generator with
	#[arg(long)]
	seed: Option<String>,

	/// The amount of tokens to generate [default: 8]
	#[arg(long, value_name = "COUNT")]
	amount: Option<usize>,

	/// Seed the random source for reproducible output
	#[arg(long, value_name = "SEED")]
	rng_seed: Option<u64>,

	/// JSON configuration file, explicit flags take precedence
	#[arg(long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Print a trie as Graphviz DOT instead of generating
	#[arg(long, value_enum)]
	graph: Option<GraphKind>,

	/// Log trie statistics as JSON
	#[arg(long)]
	stats: bool,

	/// Print the effective configuration as JSON and exit
	#[arg(long)]
	dump_config: bool,

	/// Increase verbosity (-v, -vv)
	#[arg(short = 'v', long, action = ArgAction::Count)]
	verbose: u8,

	/// Decrease verbosity (-q, -qq)
	#[arg(short = 'q', long, action = ArgAction::Count)]
	quiet: u8,
}

impl Cli {
	/// Builds the effective configuration: file (or defaults), then flags.
	fn chain_config(&self) -> Result<ChainConfig> {
		let mut config = match &self.config {
			Some(path) => ChainConfig::load(path)
				.with_context(|| format!("unable to load config {}", path.display()))?,
			None => ChainConfig::default(),
		};

		if let Some(order) = self.order {
			config.order = order;
		}
		if let Some(file) = &self.file {
			config.file = file.clone();
		}
		if let Some(kind) = &self.kind {
			config.kind = kind.parse::<TokenKind>()?;
		}
		if let Some(seed) = &self.seed {
			config.seed = seed.clone();
		}
		if let Some(amount) = self.amount {
			config.amount = amount;
		}
		if self.rng_seed.is_some() {
			config.rng_seed = self.rng_seed;
		}

		Ok(config)
	}
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_logging(cli.verbose, cli.quiet);

	let config = cli.chain_config()?;
	debug!("effective configuration: {config:?}");

	if cli.dump_config {
		println!("{}", serde_json::to_string_pretty(&config)?);
		return Ok(());
	}

	match cli.graph {
		Some(graph) => run_graph(&config, graph, cli.stats),
		None => run_generate(&config, cli.stats),
	}
}

/// Level forced by -v/-q, `None` to leave the filter to `RUST_LOG`.
fn level_override(verbose: u8, quiet: u8) -> Option<LevelFilter> {
	match (quiet, verbose) {
		(0, 0) => None,
		(1, _) => Some(LevelFilter::Warn),
		(q, _) if q > 1 => Some(LevelFilter::Error),
		(_, 1) => Some(LevelFilter::Debug),
		_ => Some(LevelFilter::Trace),
	}
}

fn init_logging(verbose: u8, quiet: u8) {
	let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
	builder.format_timestamp_millis();
	if let Some(level) = level_override(verbose, quiet) {
		builder.filter_level(level);
	}
	let _ = builder.try_init();
}

fn log_stats(chain: &MarkovChain) -> Result<()> {
	let stats = chain.counting_trie().stats();
	info!("trie stats: {}", serde_json::to_string(&stats)?);
	Ok(())
}

fn run_graph(config: &ChainConfig, graph: GraphKind, stats: bool) -> Result<()> {
	let chain = MarkovChain::from_corpus(&config.file, config.kind, config.order)
		.with_context(|| format!("unable to train on {}", config.file.display()))?;
	if stats {
		log_stats(&chain)?;
	}

	let dot = match graph {
		GraphKind::Probability => to_dot(chain.probability_trie().root(), chain.vocabulary()),
		GraphKind::Counting => to_dot(chain.counting_trie().root(), chain.vocabulary()),
	};
	print!("{dot}");
	Ok(())
}

fn run_generate(config: &ChainConfig, stats: bool) -> Result<()> {
	config.validate().context("invalid configuration")?;

	let chain = MarkovChain::from_corpus(&config.file, config.kind, config.order)
		.with_context(|| format!("unable to train on {}", config.file.display()))?;
	if stats {
		log_stats(&chain)?;
	}

	let mut rng = match config.rng_seed {
		Some(seed) => StdRng::seed_from_u64(seed),
		None => StdRng::from_os_rng(),
	};

	let text = chain.generate_text(&config.seed, config.amount, &mut rng)?;
	println!("{text}");
	Ok(())
}
