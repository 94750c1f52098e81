use std::{
    path::{Path, PathBuf},
    process,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use owners_rs::{Database, FsRepo, Owner, SelectionStrategy, DEFAULT_OWNERS_FILE_NAME};

#[derive(Parser)]
#[command(version)]
struct Cli {
    /// Root of the tree the file paths are relative to
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Name of the owners file looked up in each directory
    #[arg(long = "owners-file", default_value = DEFAULT_OWNERS_FILE_NAME, global = true)]
    owners_file: String,

    #[arg(long, value_enum, default_value_t = Strategy::Scaled, global = true)]
    strategy: Strategy,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the files the given reviewers can't approve
    Check {
        #[arg(short = 'r', long = "reviewer", value_delimiter = ',', required = true)]
        reviewers: Vec<String>,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Suggest reviewers for the given files, or for every file in the tree
    Suggest {
        #[arg(long)]
        author: Option<String>,

        files: Vec<PathBuf>,
    },
    /// Suggest reviewers along with their alternates and OWNERS comments
    ReviewerSet {
        #[arg(long)]
        author: Option<String>,

        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Fewest reviewers, weighted by how far up the tree they are
    Scaled,
    /// Most directories per reviewer first, then closest
    CoverageFirst,
}

impl From<Strategy> for SelectionStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Scaled => SelectionStrategy::default(),
            Strategy::CoverageFirst => SelectionStrategy::CoverageFirst,
        }
    }
}

impl Cli {
    fn database(&self) -> Result<Database<FsRepo>> {
        if !self.root.is_dir() {
            anyhow::bail!("root is not a directory: {}", self.root.display());
        }
        Ok(Database::builder(&self.root, FsRepo)
            .owners_file_name(&self.owners_file)
            .strategy(self.strategy.into())
            .build())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { "debug" } else { "warn" });

    let mut db = cli.database()?;
    match &cli.command {
        Command::Check { reviewers, files } => {
            preload(&mut db, files)?;
            let uncovered = db
                .files_not_covered_by(files, reviewers)
                .context("failed to check coverage")?;
            for file in &uncovered {
                println!("{}", file.display());
            }
            if !uncovered.is_empty() {
                process::exit(1);
            }
        }
        Command::Suggest { author, files } => {
            let files = if files.is_empty() {
                let files: Vec<PathBuf> = walk_files(&cli.root).collect();
                tracing::debug!(files = files.len(), root = %cli.root.display(), "walked tree");
                files
            } else {
                files.clone()
            };
            preload(&mut db, &files)?;
            let reviewers = db
                .reviewers_for(&files, author.as_deref())
                .context("failed to suggest reviewers")?;
            for owner in &reviewers {
                println!("{}", display_owner(owner));
            }
        }
        Command::ReviewerSet { author, files } => {
            preload(&mut db, files)?;
            let set = db
                .reviewer_set_for(files, author.as_deref().unwrap_or_default())
                .context("failed to suggest reviewers")?;
            for (owner, reviewer) in &set {
                println!("{}", display_owner(owner));
                if !reviewer.alternates.is_empty() {
                    let alternates: Vec<&str> =
                        reviewer.alternates.iter().map(display_owner).collect();
                    println!("    alternates: {}", alternates.join(" "));
                }
                for (label, files) in &reviewer.comments {
                    let files: Vec<String> =
                        files.iter().map(|f| f.display().to_string()).collect();
                    println!("    {}: {}", label, files.join(" "));
                }
            }
        }
    }

    Ok(())
}

fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

#[cfg(feature = "rayon")]
fn preload(db: &mut Database<FsRepo>, files: &[PathBuf]) -> Result<()> {
    db.preload(files).context("failed to load owners files")
}

#[cfg(not(feature = "rayon"))]
fn preload(_db: &mut Database<FsRepo>, _files: &[PathBuf]) -> Result<()> {
    Ok(())
}

fn display_owner(owner: &Owner) -> &str {
    if owner.is_everyone() {
        "<anyone>"
    } else {
        owner.as_str()
    }
}

fn walk_files(root: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    let git_dir = root.join(".git");
    walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(move |entry| entry.path() != git_dir)
        .filter_map(|e| e.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .filter_map(move |entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
}
