use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rsgit::{GitError, Repository};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rsgit", about = "A from-scratch reimplementation of git's plumbing")]
pub struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create an empty repository in the current directory.
    Init,
    /// Stage files (or whole directories) for the next commit.
    Add { paths: Vec<PathBuf> },
    /// Unstage files, optionally also deleting them from disk.
    Rm {
        #[clap(long)]
        cached: bool,
        paths: Vec<String>,
    },
    /// Show staged, unstaged, untracked, and ignored paths.
    Status,
    /// Record a new commit from the current index.
    Commit {
        #[clap(short = 'm')]
        message: String,
    },
    /// Create a branch pointing at HEAD, or list all branches.
    Branch { name: Option<String> },
    /// Repoint HEAD at an existing branch.
    Checkout { name: String },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run() {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            eprintln!("rsgit: {e}");
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<GitError>() {
        Some(GitError::Io(_)) => ExitCode::from(2),
        Some(_) => ExitCode::from(1),
        None => ExitCode::from(2),
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let cwd = std::env::current_dir().context("failed to read current directory")?;

    match args.command {
        Command::Init => {
            rsgit::repo::init(&cwd)?;
            println!("Initialized empty repository in {}", cwd.join(".git").display());
        }
        Command::Add { paths } => {
            let mut repo = open_here(&cwd)?;
            let report = repo.add(&paths)?;
            for (path, kind) in &report.staged {
                println!("{:?}\t{}", kind, path.display());
            }
            for (path, reason) in &report.failed {
                eprintln!("error: {}: {reason}", path.display());
            }
            if !report.failed.is_empty() {
                bail!("not all paths could be staged");
            }
        }
        Command::Rm { cached, paths } => {
            let mut repo = open_here(&cwd)?;
            repo.remove(&paths, !cached)?;
        }
        Command::Status => {
            let repo = open_here(&cwd)?;
            print_status(&repo)?;
        }
        Command::Commit { message } => {
            let mut repo = open_here(&cwd)?;
            let hash = repo.commit(message)?;
            println!("{hash}");
        }
        Command::Branch { name } => {
            let repo = open_here(&cwd)?;
            match name {
                Some(name) => {
                    let head = repo
                        .current_head()?
                        .context("cannot create a branch with no commits yet")?;
                    repo.create_branch(&name, head)?;
                }
                None => {
                    for branch in repo.list_branches()? {
                        println!("{branch}");
                    }
                }
            }
        }
        Command::Checkout { name } => {
            let repo = open_here(&cwd)?;
            repo.checkout_branch(&name)?;
        }
    }
    Ok(())
}

fn open_here(cwd: &std::path::Path) -> Result<Repository> {
    let root = rsgit::repo::discover(cwd)?;
    Ok(Repository::open(root)?)
}

fn print_status(repo: &Repository) -> Result<()> {
    let report = repo.status()?;
    if report.is_clean() {
        println!("nothing to commit, working tree clean");
        return Ok(());
    }
    if !report.staged_added.is_empty()
        || !report.staged_modified.is_empty()
        || !report.staged_deleted.is_empty()
    {
        println!("Changes to be committed:");
        for path in &report.staged_added {
            println!("\tnew file:   {path}");
        }
        for path in &report.staged_modified {
            println!("\tmodified:   {path}");
        }
        for path in &report.staged_deleted {
            println!("\tdeleted:    {path}");
        }
    }
    if !report.unstaged_modified.is_empty() || !report.unstaged_deleted.is_empty() {
        println!("Changes not staged for commit:");
        for path in &report.unstaged_modified {
            println!("\tmodified:   {path}");
        }
        for path in &report.unstaged_deleted {
            println!("\tdeleted:    {path}");
        }
    }
    if !report.untracked.is_empty() {
        println!("Untracked files:");
        for path in &report.untracked {
            println!("\t{path}");
        }
    }
    Ok(())
}
