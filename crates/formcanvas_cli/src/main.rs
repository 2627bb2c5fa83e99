//! Operator CLI over the form store.
//!
//! ```bash
//! formcanvas list
//! formcanvas show contactform
//! formcanvas validate ./contactform.json
//! formcanvas --backend sqlite import ./contactform.json --replace
//! formcanvas delete contactform
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use formcanvas_core::db::open_db;
use formcanvas_core::{
    init_from_config, CoreConfig, FileFormRepository, Form, FormRepository, FormService,
    SqliteFormRepository, StorageBackend, StoreError,
};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "formcanvas")]
#[command(version)]
#[command(about = "Inspect and manage stored form definitions", long_about = None)]
struct Cli {
    /// Directory holding form documents (or the SQLite database)
    #[arg(long, env = "FORMCANVAS_STORAGE_ROOT")]
    storage_root: Option<PathBuf>,

    /// Storage backend
    #[arg(long, env = "FORMCANVAS_BACKEND", value_enum)]
    backend: Option<BackendArg>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, env = "FORMCANVAS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for log files; file logging is off without it
    #[arg(long, env = "FORMCANVAS_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    File,
    Sqlite,
}

#[derive(Subcommand)]
enum Command {
    /// List stored forms
    List,
    /// Print one stored form as JSON
    Show { id: String },
    /// Check a form document without storing it
    Validate { file: PathBuf },
    /// Store a form document
    Import {
        file: PathBuf,
        /// Replace the stored form when the id already exists
        #[arg(long)]
        replace: bool,
    },
    /// Delete a stored form
    Delete { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("error: {message}");
            return ExitCode::from(2);
        }
    };
    if let Err(message) = init_from_config(&config) {
        eprintln!("warning: file logging disabled: {message}");
    }

    let result = match config.backend {
        StorageBackend::File => {
            let service = FormService::new(FileFormRepository::new(config.storage_root()));
            run(&cli.command, &service)
        }
        StorageBackend::Sqlite => match open_db(config.sqlite_path()) {
            Ok(conn) => match SqliteFormRepository::try_new(&conn) {
                Ok(repo) => run(&cli.command, &FormService::new(repo)),
                Err(err) => Err(CliError::Store(err)),
            },
            Err(err) => Err(CliError::Store(err.into())),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

/// Environment defaults first, explicit flags on top.
fn build_config(cli: &Cli) -> Result<CoreConfig, String> {
    let mut config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(root) = &cli.storage_root {
        config.storage_root = root.clone();
    }
    if let Some(backend) = cli.backend {
        config.backend = match backend {
            BackendArg::File => StorageBackend::File,
            BackendArg::Sqlite => StorageBackend::Sqlite,
        };
    }
    if let Some(level) = &cli.log_level {
        config.log_level =
            formcanvas_core::config::normalize_level(level).map_err(|err| err.to_string())?;
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(log_dir.clone());
    }
    Ok(config)
}

fn run<R: FormRepository>(command: &Command, service: &FormService<R>) -> Result<(), CliError> {
    match command {
        Command::List => {
            for form in service.list_forms()? {
                println!("{}\t{}\t{} fields", form.id, form.title, form.model.len());
            }
        }
        Command::Show { id } => {
            let form = service.get_form(id)?;
            println!("{}", to_pretty(&form)?);
        }
        Command::Validate { file } => {
            let form = read_form(file)?;
            form.validate().map_err(StoreError::BadRequest)?;
            println!("{}: ok ({} fields)", form.id, form.model.len());
        }
        Command::Import { file, replace } => {
            let form = read_form(file)?;
            let stored = match service.create_form(&form) {
                Err(StoreError::Conflict(id)) if *replace => service.update_form(&id, &form)?,
                other => other?,
            };
            info!("event=cli_import module=cli status=ok id={}", stored.id);
            println!("stored {}", stored.id);
        }
        Command::Delete { id } => {
            service.delete_form(id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn read_form(file: &Path) -> Result<Form, CliError> {
    let body = std::fs::read_to_string(file).map_err(|source| CliError::Read {
        path: file.to_path_buf(),
        source,
    })?;
    Ok(Form::from_json_str(&body).map_err(StoreError::BadRequest)?)
}

fn to_pretty(form: &Form) -> Result<String, CliError> {
    serde_json::to_string_pretty(form).map_err(|err| CliError::Output(err.to_string()))
}

#[derive(Debug)]
enum CliError {
    Store(StoreError),
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Output(String),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            Self::Store(StoreError::NotFound(_)) => 4,
            Self::Store(StoreError::BadRequest(_)) | Self::Read { .. } => 3,
            Self::Store(StoreError::Conflict(_)) => 5,
            Self::Store(StoreError::Storage(_)) | Self::Output(_) => 1,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Output(message) => write!(f, "cannot render output: {message}"),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
