use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run named SQL queries against a SQLite database")]
pub(crate) struct Args {
    /// Database file (created if missing)
    #[arg(long)]
    pub(crate) db: PathBuf,
    /// Query definitions: properties file, or JSON object when the name ends in .json
    #[arg(long)]
    pub(crate) queries: PathBuf,
    /// JSON storage config
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// SQL script run before the queries are prepared
    #[arg(long)]
    pub(crate) init: Option<PathBuf>,
    /// Disable auto-commit; work is committed once the command succeeds
    #[arg(long)]
    pub(crate) manual_commit: bool,
    #[arg(long, default_value = "warn")]
    pub(crate) log_level: String,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Run a query and print each row as a JSON object
    Read {
        name: String,
        /// Positional parameters as JSON literals; anything else is bound as text
        params: Vec<String>,
    },
    /// Execute a write and print the affected row count
    Write {
        name: String,
        params: Vec<String>,
        /// Defaults to the `batch_size` from `--config`
        #[arg(long)]
        batch_size: Option<usize>,
        /// Read one JSON array of parameters per line from stdin instead
        #[arg(long, conflicts_with = "params")]
        stdin: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_write_with_batch_size() {
        let args = Args::parse_from([
            "sqlrunner",
            "--db",
            "app.db",
            "--queries",
            "q.properties",
            "--manual-commit",
            "write",
            "users.insert",
            "1",
            "ann",
            "--batch-size",
            "10",
        ]);
        assert!(args.manual_commit);
        match args.command {
            Command::Write {
                name,
                params,
                batch_size,
                stdin,
            } => {
                assert_eq!(name, "users.insert");
                assert_eq!(params, vec!["1", "ann"]);
                assert_eq!(batch_size, Some(10));
                assert!(!stdin);
            }
            Command::Read { .. } => panic!("expected write"),
        }
    }

    #[test]
    fn stdin_conflicts_with_inline_params() {
        let parsed = Args::try_parse_from([
            "sqlrunner", "--db", "a.db", "--queries", "q", "write", "q", "1", "--stdin",
        ]);
        assert!(parsed.is_err());
    }
}
