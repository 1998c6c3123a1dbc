mod args;

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde_json::{Map, Value as JsonValue};
use sqlrunner::prelude::*;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("database error: {0}")]
    Driver(#[from] DriverError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid parameter row {line}: {message}")]
    ParamRow { line: usize, message: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            CliError::Storage(err) => err.code(),
            _ => "CLI_ERROR",
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|err| {
        eprintln!("invalid log level {:?}: {err}", args.log_level);
        EnvFilter::new("warn")
    });
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref(), args.manual_commit)?;
    let conn = SqliteConnection::open(&args.db)?;
    if let Some(path) = &args.init {
        let script = read_file(path)?;
        conn.execute_batch(&script)?;
        tracing::info!(script = %path.display(), "init script applied");
    }

    let storage = Storage::sqlite_builder()
        .connection(conn)
        .queries_from_file(&args.queries)?
        .config(config)
        .build()?;

    let outcome = execute(&storage, args.command);
    match &outcome {
        Ok(()) => storage.commit()?,
        Err(_) => {
            if let Err(err) = storage.rollback() {
                tracing::warn!(error = %err, "rollback after failure failed");
            }
        }
    }
    storage.close();
    outcome
}

fn execute(storage: &Storage<SqliteConnection>, command: Command) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    match command {
        Command::Read { name, params } => {
            let params = parse_params(&params)?;
            let result = storage.read_result_set(&name, &params)?;
            for row in result.rows() {
                let object: Map<String, JsonValue> = result
                    .column_names()
                    .iter()
                    .cloned()
                    .zip(row.iter().map(serde_json::to_value))
                    .map(|(column, value)| value.map(|v| (column, v)))
                    .collect::<Result<_, _>>()?;
                writeln!(out, "{}", JsonValue::Object(object))?;
            }
        }
        Command::Write {
            name,
            params,
            batch_size,
            stdin,
        } => {
            // without --batch-size the configured batch size applies here, not in Storage::write
            let batch_size = batch_size.unwrap_or_else(|| storage.config().batch_size());
            let mut affected = 0;
            if stdin {
                for (idx, line) in io::stdin().lock().lines().enumerate() {
                    let line = line?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    let row = parse_param_row(&line, idx + 1)?;
                    affected += storage.write_batched(&name, &row, batch_size)?;
                }
            } else {
                let params = parse_params(&params)?;
                affected += storage.write_batched(&name, &params, batch_size)?;
            }
            affected += storage.flush(&name)?;
            writeln!(out, "{affected}")?;
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>, manual_commit: bool) -> Result<StorageConfig, CliError> {
    let config = match path {
        Some(path) => StorageConfig::from_json_str(&read_file(path)?)?,
        None => StorageConfig::default(),
    };
    if !manual_commit {
        return Ok(config);
    }
    Ok(StorageConfig::new(
        config.max_string_param_length(),
        config.batch_size(),
        false,
    )?)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

// JSON literal when it parses as one, plain text otherwise
fn parse_param(raw: &str) -> Result<ParamValue, StorageError> {
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(value) => ParamValue::try_from(value),
        Err(_) => Ok(ParamValue::Text(raw.to_string())),
    }
}

fn parse_params(raw: &[String]) -> Result<Vec<ParamValue>, StorageError> {
    raw.iter().map(String::as_str).map(parse_param).collect()
}

fn parse_param_row(line: &str, line_no: usize) -> Result<Vec<ParamValue>, CliError> {
    let value: JsonValue = serde_json::from_str(line).map_err(|e| CliError::ParamRow {
        line: line_no,
        message: e.to_string(),
    })?;
    let JsonValue::Array(items) = value else {
        return Err(CliError::ParamRow {
            line: line_no,
            message: "expected a JSON array".to_string(),
        });
    };
    Ok(items
        .into_iter()
        .map(ParamValue::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}
