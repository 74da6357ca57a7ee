use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use treeaug::{
    CoreNlpClient, CoreNlpConfig, DepPattern, Omit, PosColumn, PosQuery, Schema, SentenceReader,
    augment_file, check_dependencies, conll, pos_histogram,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(
    name = "treeaug",
    about = "Augment elided-token treebanks with CoreNLP parses and report statistics"
)]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Column layout of the file to augment
#[derive(Clone, Copy, ValueEnum)]
enum InputSchema {
    /// id, form, omit, head
    Plain,
    /// Output of a previous augmentation
    Augmented,
}

impl From<InputSchema> for Schema {
    fn from(schema: InputSchema) -> Self {
        match schema {
            InputSchema::Plain => Schema::Plain,
            InputSchema::Augmented => Schema::Augmented,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Add full and reduced CoreNLP parses, writing FILE's .aug sibling
    Augment {
        /// CoreNLP server host, e.g. http://localhost (no trailing slash)
        #[arg(env = "TREEAUG_HOST")]
        host: String,

        /// CoreNLP server port
        #[arg(env = "TREEAUG_PORT")]
        port: u16,

        /// Tab-separated treebank file to augment
        file: PathBuf,

        /// Column layout of FILE
        #[arg(long, value_enum, default_value = "plain")]
        schema: InputSchema,

        /// CoreNLP pipeline language
        #[arg(long, default_value = "zh")]
        lang: String,

        /// Request timeout in seconds (default: wait forever)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Count sentences with a dependency between tokens of given omit flags
    Deps {
        /// Unaugmented (4-column) treebank file
        file: PathBuf,

        /// Parent/child omit flags to look for
        #[arg(long, value_enum, default_value = "e2e")]
        pattern: DepPattern,
    },

    /// POS histogram of omitted or kept tokens in an augmented file
    Pos {
        /// Augmented (12-column) treebank file
        file: PathBuf,

        /// Only count tokens with this omit flag (default: both, I then O)
        #[arg(long)]
        omit: Option<Omit>,

        /// Map CTB tags to Universal POS categories
        #[arg(long)]
        ud: bool,

        /// Which POS column to count
        #[arg(long, value_enum, default_value = "ppos")]
        column: PosColumn,
    },
}

/// `--verbose` wins, then `RUST_LOG`, then `info`
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(verbose, rust_log.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Augment {
            host,
            port,
            file,
            schema,
            lang,
            timeout,
        } => {
            let mut config = CoreNlpConfig::new(&host, port);
            config.language = lang;
            config.timeout = timeout.map(Duration::from_secs);
            cmd_augment(config, &file, schema.into())
        }
        Commands::Deps { file, pattern } => cmd_deps(&file, pattern),
        Commands::Pos {
            file,
            omit,
            ud,
            column,
        } => cmd_pos(&file, omit, ud, column),
    }
}

fn cmd_augment(config: CoreNlpConfig, file: &Path, schema: Schema) -> Result<()> {
    tracing::info!("using CoreNLP server at {}", config.url());
    let client = CoreNlpClient::new(config);
    let summary = augment_file(file, schema, &client)
        .with_context(|| format!("failed to augment {}", file.display()))?;
    println!(
        "{} sentences ({} tokens) written to {}",
        summary.sentences,
        summary.tokens,
        summary.output.display()
    );
    Ok(())
}

fn cmd_deps(file: &Path, pattern: DepPattern) -> Result<()> {
    let reader = SentenceReader::from_file(file, Schema::Plain)
        .with_context(|| format!("failed to open {}", file.display()))?;
    let mut out = BufWriter::new(std::io::stdout().lock());
    let report = check_dependencies(reader, pattern, &mut out)
        .with_context(|| format!("dependency check failed on {}", file.display()))?;
    writeln!(out, "{}", report)?;
    out.flush()?;
    Ok(())
}

fn cmd_pos(file: &Path, omit: Option<Omit>, universal: bool, column: PosColumn) -> Result<()> {
    let flags = match omit {
        Some(omit) => vec![omit],
        None => vec![Omit::Inside, Omit::Outside],
    };

    let mut out = BufWriter::new(std::io::stdout().lock());
    for omit in flags {
        let reader =
            conll::open(file).with_context(|| format!("failed to open {}", file.display()))?;
        let query = PosQuery {
            omit,
            column,
            universal,
        };
        let histogram = pos_histogram(reader, query)
            .with_context(|| format!("POS count failed on {}", file.display()))?;
        writeln!(out, "{}", histogram)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter(false, Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(false, Some("warn")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            log_filter(true, Some("warn")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }
}
