//! Command-line host: runs the locale runtime against a page snapshot.

use std::io::{
    self,
    Write,
};
use std::path::{
    Path,
    PathBuf,
};
use std::process::ExitCode;
use std::time::Duration;

use page_locale_runtime::config::{
    ConfigError,
    RuntimeSettings,
};
use page_locale_runtime::dom::Document;
use page_locale_runtime::engine::RepaintCards;
use page_locale_runtime::registry::{
    RegistryError,
    TranslationRegistry,
    load_dictionary_file,
    load_translation_files,
};
use page_locale_runtime::store::{
    FileStorage,
    MemoryStorage,
    Storage,
    StorageError,
    SystemClock,
    WriteOutcome,
};
use page_locale_runtime::{
    InitStatus,
    LocaleRuntime,
};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Usage text for `--help`.
const HELP: &str = "\
locale-runtime: apply a stored locale preference to a page snapshot

USAGE:
  locale-runtime --page <page.json> [OPTIONS]

OPTIONS:
  --page <file>        Page snapshot (JSON) to translate
  --root <dir>         Host root: .locale-runtime.json and locale resource files
  --dictionary <file>  Key-major dictionary (JSON with comments)
  --state <file>       Persisted storage file (in-memory when omitted)
  --set <locale>       Select a locale after initialization
  --ttl-ms <n>         Lifetime of the preference written by --set
  --finish-loading     Fire the ready signal for pages still loading
  -h, --help           Print this help

The resulting page snapshot is written to stdout. Set RUST_LOG to control logging.
";

/// Anything that stops a run before the page is written.
#[derive(Error, Debug)]
enum CliError {
    #[error("Invalid arguments: {0}")]
    Args(#[from] pico_args::Error),

    #[error("Unexpected arguments: {}", .0.join(" "))]
    UnexpectedArgs(Vec<String>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to read page '{}': {source}", path.display())]
    ReadPage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid page snapshot '{}': {source}", path.display())]
    ParsePage {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode page snapshot: {0}")]
    EncodePage(#[source] serde_json::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Parsed command line.
#[derive(Debug)]
struct Args {
    page: PathBuf,
    root: Option<PathBuf>,
    dictionary: Option<PathBuf>,
    state: Option<PathBuf>,
    set: Option<String>,
    ttl_ms: Option<u64>,
    finish_loading: bool,
}

/// Returns `None` when help was requested.
fn parse_args() -> Result<Option<Args>, CliError> {
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let args = Args {
        page: pargs.value_from_str("--page")?,
        root: pargs.opt_value_from_str("--root")?,
        dictionary: pargs.opt_value_from_str("--dictionary")?,
        state: pargs.opt_value_from_str("--state")?,
        set: pargs.opt_value_from_str("--set")?,
        ttl_ms: pargs.opt_value_from_str("--ttl-ms")?,
        finish_loading: pargs.contains("--finish-loading"),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        return Err(CliError::UnexpectedArgs(
            remaining.iter().map(|arg| arg.to_string_lossy().into_owned()).collect(),
        ));
    }

    Ok(Some(args))
}

/// Merges the dictionary file and the locale resource files under the root.
fn load_registry(
    args: &Args,
    settings: &RuntimeSettings,
) -> Result<TranslationRegistry, RegistryError> {
    let mut builder =
        TranslationRegistry::builder().with_key_separator(settings.key_separator.clone());

    if let Some(path) = &args.dictionary {
        load_dictionary_file(&mut builder, path)?;
    }
    if let Some(root) = &args.root {
        load_translation_files(&mut builder, root, settings)?;
    }

    let registry = builder.build();
    if registry.is_empty() {
        tracing::warn!("No translations loaded; the page will be left as is");
    }
    Ok(registry)
}

/// File-backed storage when `--state` is given, in-memory otherwise.
fn open_storage(state: Option<&Path>) -> Result<Box<dyn Storage>, StorageError> {
    Ok(match state {
        Some(path) => Box::new(FileStorage::open(path)?),
        None => Box::new(MemoryStorage::new()),
    })
}

/// Reads a page snapshot.
fn load_page(path: &Path) -> Result<Document, CliError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| CliError::ReadPage { path: path.to_path_buf(), source })?;
    serde_json::from_str(&content)
        .map_err(|source| CliError::ParsePage { path: path.to_path_buf(), source })
}

/// Translates the page and writes it to stdout.
fn run(args: &Args) -> Result<(), CliError> {
    let settings = RuntimeSettings::resolve(args.root.as_deref())?;

    let registry = load_registry(args, &settings)?;
    let storage = open_storage(args.state.as_deref())?;
    let mut page = load_page(&args.page)?;

    let mut runtime = LocaleRuntime::new(settings, registry, storage, SystemClock)
        .with_post_apply_hook(RepaintCards::default());

    if runtime.init(&mut page) == InitStatus::Deferred {
        if args.finish_loading {
            page.finish_loading();
            runtime.pump(&mut page);
        } else {
            tracing::info!("Page is still loading; pass --finish-loading to initialize it");
        }
    }

    if let Some(locale) = &args.set {
        let ttl = args.ttl_ms.map(Duration::from_millis);
        match runtime.set_locale(&mut page, locale, ttl) {
            WriteOutcome::Stored { locale, expires_at } => {
                tracing::info!(%locale, expires_at, "Locale preference stored");
            }
            WriteOutcome::Rejected => {
                tracing::warn!(locale = %locale, "Unsupported locale; preference unchanged");
            }
            WriteOutcome::Failed => {
                tracing::warn!(locale = %locale, "Locale preference could not be persisted");
            }
        }
    }
    runtime.pump(&mut page);

    let active = runtime.get_locale();
    tracing::info!(
        locale = active.as_ref().map_or("<none>", |locale| locale.as_str()),
        notifications = page.notifications().len(),
        "Page processed"
    );

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &page).map_err(CliError::EncodePage)?;
    writeln!(stdout)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let result = match parse_args() {
        Ok(Some(args)) => run(&args),
        Ok(None) => io::stdout().write_all(HELP.as_bytes()).map_err(CliError::from),
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "locale-runtime failed");
            ExitCode::FAILURE
        }
    }
}
