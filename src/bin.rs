use clap::Parser;
use crossword_csp::backtracking_search::{find_fill, FillFailure, FillOptions};
use crossword_csp::grid_config::generate_grid_config_from_template_string;
use crossword_csp::render::render_grid_with_block;
use crossword_csp::word_list::{WordList, WordListSourceConfig};
use log::LevelFilter;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::time::Duration;

/// crossword-csp: fill a crossword structure from a word list
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the structure file, with _ or . for fillable squares and # for blocks
    structure_path: String,

    /// Path to the word list, one word per line
    words_path: String,

    /// Give up after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Give up after this many backtracks
    #[arg(long)]
    max_backtracks: Option<usize>,

    /// Re-run arc consistency after every choice
    #[arg(long)]
    maintain_arc_consistency: bool,

    /// Character used to draw blocked squares in the output
    #[arg(long, default_value_t = '#')]
    block: char,

    /// Log progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn init_logger(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter(
            None,
            if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Warn
            },
        )
        .format_timestamp(None)
        .format_target(false);

    // Let RUST_LOG override our defaults if explicitly set
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    builder.init();
}

fn main() -> Result<(), Error> {
    let args = Args::parse();
    init_logger(args.verbose);

    let structure = fs::read_to_string(&args.structure_path)
        .map_err(|_| Error(format!("Couldn't read file '{}'", args.structure_path)))?;

    let word_list = WordList::new(
        &[WordListSourceConfig::File {
            id: "0".into(),
            path: args.words_path.clone().into(),
        }],
        None,
    );

    #[allow(clippy::comparison_chain)]
    if let Some(errors) = word_list.get_source_errors().get("0") {
        if errors.len() == 1 {
            return Err(Error(format!("{}", errors[0])));
        } else if errors.len() > 1 {
            let mut full_error: String = "".into();
            for error in errors {
                full_error.push_str(&format!("\n- {error}"));
            }
            return Err(Error(full_error));
        }
    }

    let grid_config = generate_grid_config_from_template_string(word_list, &structure)
        .map_err(|error| Error(error.to_string()))?;

    log::debug!("{grid_config:?}");

    let options = FillOptions {
        timeout: args.timeout_secs.map(Duration::from_secs),
        max_backtracks: args.max_backtracks,
        maintain_arc_consistency: args.maintain_arc_consistency,
        abort: None,
    };

    match find_fill(&grid_config, &options) {
        Ok(result) => {
            log::debug!("{:?}", result.statistics);
            println!(
                "{}",
                render_grid_with_block(&grid_config, &result.assignment, args.block)
            );
            Ok(())
        }
        Err(FillFailure::HardFailure) => {
            println!("No solution.");
            Ok(())
        }
        Err(other) => Err(Error(other.to_string())),
    }
}
