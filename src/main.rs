//! Quran Page Mapping Pipeline
//!
//! Builds `detailed_quran.json`: every verse with its mushaf page and hasanah.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level};

mod index;
mod join;
mod loader;
mod models;
mod output;
mod score;

use loader::load_all;
use models::{default_output_path, InputPaths, JoinParams, VerseOrder};
use output::{print_page, print_sample, print_summary, read_json_file, write_json_file};

#[derive(Parser)]
#[command(name = "quran-pagemap")]
#[command(about = "Build the page-annotated Quran verse dataset with hasanah scores")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Order of verses within a page (CLI version, mirrors models::VerseOrder)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliVerseOrder {
    /// Chapter then verse, numerically (default)
    Numeric,
    /// String order of "chapter:verse", as the legacy script produced
    Lexicographic,
}

impl From<CliVerseOrder> for VerseOrder {
    fn from(order: CliVerseOrder) -> Self {
        match order {
            CliVerseOrder::Numeric => VerseOrder::Numeric,
            CliVerseOrder::Lexicographic => VerseOrder::Lexicographic,
        }
    }
}

/// Dataset locations shared by the commands that read the inputs
#[derive(clap::Args)]
struct InputArgs {
    /// Page layout [default: source/resources/qpc-v2-15-lines.json]
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Word-by-word index [default: source/resources/qpc-v2-word-by-word.json]
    #[arg(long)]
    words: Option<PathBuf>,

    /// Verse texts [default: source/resources/quran.json]
    #[arg(long)]
    verses: Option<PathBuf>,
}

impl InputArgs {
    fn into_paths(self) -> InputPaths {
        let defaults = InputPaths::default();
        InputPaths {
            layout: self.layout.unwrap_or(defaults.layout),
            words: self.words.unwrap_or(defaults.words),
            verses: self.verses.unwrap_or(defaults.verses),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Join the datasets and write the detailed verse file
    Build {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output file [default: source/resources/detailed_quran.json]
        #[arg(long)]
        output: Option<PathBuf>,

        /// Verse order within a page [default: numeric]
        #[arg(long, value_enum)]
        verse_order: Option<CliVerseOrder>,

        /// Scan layout lines on a single thread
        #[arg(long)]
        sequential: bool,

        /// Suppress progress output
        #[arg(long)]
        quiet: bool,

        /// Print the first verses of the first chapters
        #[arg(long)]
        show_sample: bool,
    },

    /// Show the letter count and hasanah of a text
    Score {
        /// Arabic text
        #[arg(long)]
        text: String,
    },

    /// Show the verses on one page of a built dataset
    Page {
        /// Path to detailed_quran.json [default: source/resources/detailed_quran.json]
        #[arg(long)]
        input: Option<PathBuf>,

        /// Page number (1-604)
        #[arg(long)]
        page: u32,
    },

    /// Show input dataset statistics
    Stats {
        #[command(flatten)]
        inputs: InputArgs,
    },
}

fn init_logging(quiet: bool) {
    let level = if quiet { Level::WARN } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            inputs,
            output,
            verse_order,
            sequential,
            quiet,
            show_sample,
        } => {
            init_logging(quiet);

            // Start with library defaults, overlay user-specified values
            let defaults = JoinParams::default();
            let params = JoinParams {
                verse_order: verse_order.map(VerseOrder::from).unwrap_or(defaults.verse_order),
                parallel: !sequential && defaults.parallel,
                show_progress: !quiet,
            };

            let paths = inputs.into_paths();
            let output = output.unwrap_or_else(default_output_path);

            let result = join::build_from_files(&paths, &params)?;

            info!(path = %output.display(), "Writing detailed verse file...");
            write_json_file(&result.chapters, &output)?;

            if !quiet {
                print_summary(&result);
                eprintln!("\nOutput: {}", output.display());
            }

            if show_sample {
                print_sample(&result.chapters, 2, 2);
            }
        }

        Commands::Score { text } => {
            println!("Letters: {}", score::count_arabic_characters(&text));
            println!("Hasanah: {}", score::calculate_hasanah(&text));
        }

        Commands::Page { input, page } => {
            let input = input.unwrap_or_else(default_output_path);
            let chapters = read_json_file(&input)?;
            print_page(&chapters, page);
        }

        Commands::Stats { inputs } => {
            init_logging(true);

            let raw = load_all(&inputs.into_paths())?;
            let index = index::build_verse_index(&raw.words);

            let verse_lines = raw.lines.iter().filter(|l| l.is_verse_line()).count();
            let pages = raw
                .lines
                .iter()
                .map(|l| l.page_number)
                .collect::<std::collections::BTreeSet<_>>()
                .len();

            println!("=== Dataset Statistics ===");
            println!("Layout lines: {}", raw.lines.len());
            println!("Verse lines: {}", verse_lines);
            println!("Layout pages: {}", pages);
            println!("Words: {}", raw.words.len());
            println!("Unique verses in word index: {}", index.len());
            println!("Verse text chapters: {}", raw.verses.chapter_count());
            println!("Verse texts: {}", raw.verses.verse_count());
        }
    }

    Ok(())
}
