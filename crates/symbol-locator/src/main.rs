use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Args as ClapArgs, Parser, Subcommand};
use lsp_types::{DocumentSymbolResponse, Position, Url};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use symbol_locator::{
    DeclarationProvider, HoverProvider, InMemoryProvider, LanguageServerClient, OverviewScanner, ProviderError,
    ReportRenderer, SearchOptions, Selector, Settings, SymbolOperations, answer_json, kind::parse_kind,
};

#[derive(Parser, Debug)]
#[command(name = "symbol-locator", version, about)]
struct Args {
    #[arg(long, short)]
    verbose: bool,

    #[arg(long)]
    log_file: Option<String>,

    /// TOML settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serve declarations from a JSON snapshot instead of a language server.
    #[arg(long)]
    symbols: Option<PathBuf>,

    /// Workspace root; defaults to the current directory.
    #[arg(long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a symbol by position or name path and print it as JSON.
    Locate {
        #[command(flatten)]
        target: Target,

        /// Case-insensitive substring match on bare names.
        #[arg(long)]
        substring: bool,

        #[arg(long = "include-kind")]
        include_kinds: Vec<String>,

        #[arg(long = "exclude-kind")]
        exclude_kinds: Vec<String>,

        /// Only consider symbols at most this deep (0 = top level).
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Print the descendants of a symbol as a table.
    Children {
        #[command(flatten)]
        target: Target,

        /// `1`, `2`, ... or `all`.
        #[arg(long, default_value = "1")]
        depth: String,

        #[arg(long)]
        hover: bool,

        #[arg(long)]
        max_answer_chars: Option<usize>,
    },
    /// Print the top-level symbols of every file under a path as JSON.
    Overview {
        #[arg(default_value = "")]
        path: String,

        #[arg(long)]
        max_answer_chars: Option<usize>,
    },
}

#[derive(ClapArgs, Debug)]
struct Target {
    /// File path, relative to the workspace root.
    file: PathBuf,

    #[arg(long, requires = "character")]
    line: Option<u32>,

    #[arg(long, requires = "line")]
    character: Option<u32>,

    /// Name path such as `MyClass/method` or `/Root/Level1`.
    #[arg(long)]
    name: Option<String>,
}

impl Target {
    fn position(&self) -> Option<Position> {
        Some(Position::new(self.line?, self.character?))
    }
}

/// Where declarations come from for this run.
enum Backend {
    Snapshot(InMemoryProvider),
    Server(LanguageServerClient),
}

impl Backend {
    async fn shutdown(&self) {
        if let Self::Server(client) = self
            && let Err(error) = client.shutdown().await
        {
            warn!("Language server did not shut down cleanly: {error}");
        }
    }
}

impl DeclarationProvider for Backend {
    async fn document_symbols(
        &self,
        uri: &Url,
    ) -> Result<DocumentSymbolResponse, ProviderError> {
        match self {
            Self::Snapshot(provider) => provider.document_symbols(uri).await,
            Self::Server(client) => client.document_symbols(uri).await,
        }
    }
}

impl HoverProvider for Backend {
    async fn hover(
        &self,
        uri: &Url,
        position: Position,
    ) -> Result<Option<String>, ProviderError> {
        match self {
            Self::Snapshot(provider) => provider.hover(uri, position).await,
            Self::Server(client) => client.hover(uri, position).await,
        }
    }
}

fn default_log_path() -> PathBuf {
    let dir = dirs_or_tmp();
    dir.join("symbol-locator.log")
}

fn dirs_or_tmp() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        let dir = PathBuf::from(home).join(".symbol-locator");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }
    std::env::temp_dir()
}

fn init_logging(
    args: &Args,
    settings: &Settings,
) -> PathBuf {
    let level = if args.verbose {
        "debug"
    } else {
        settings.logging.level.as_filter()
    };
    let stderr_filter = EnvFilter::new(format!("symbol_locator={level}"));
    let file_filter = EnvFilter::new(format!("symbol_locator={level}"));

    let log_path = args.log_file.as_ref().map(PathBuf::from).unwrap_or_else(default_log_path);

    let file_appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or(Path::new(".")),
        log_path.file_name().unwrap_or(std::ffi::OsStr::new("symbol-locator.log")),
    );

    let file_layer =
        fmt::layer().with_writer(file_appender).with_ansi(false).with_target(false).with_filter(file_filter);

    let stderr_layer =
        fmt::layer().with_writer(std::io::stderr).with_ansi(false).with_target(false).with_filter(stderr_filter);

    tracing_subscriber::registry().with(file_layer).with(stderr_layer).init();
    log_path
}

fn load_settings(path: Option<&Path>) -> Result<Settings, String> {
    match path {
        Some(path) => Settings::from_file(path).map_err(|error| error.to_string()),
        None => Ok(Settings::default()),
    }
}

async fn open_backend(
    args: &Args,
    settings: &Settings,
    root: &Path,
) -> Result<Backend, String> {
    if let Some(snapshot) = &args.symbols {
        let provider = InMemoryProvider::from_snapshot_file(snapshot).map_err(|error| error.to_string())?;
        info!("Serving declarations for {} documents from {}", provider.uris().len(), snapshot.display());
        return Ok(Backend::Snapshot(provider));
    }
    let client = LanguageServerClient::spawn(&settings.provider, root).await.map_err(|error| error.to_string())?;
    Ok(Backend::Server(client))
}

fn document_uri(
    root: &Path,
    file: &Path,
) -> Result<Url, String> {
    let path = std::path::absolute(root.join(file)).map_err(|error| error.to_string())?;
    Url::from_file_path(&path).map_err(|()| format!("{} is not a valid file path", path.display()))
}

fn selector_for(target: &Target) -> Result<Selector, String> {
    Selector::from_parts(target.position(), target.name.as_deref())
        .ok_or_else(|| "give either --name or --line and --character".to_string())
}

fn parse_kinds(names: &[String]) -> Result<Vec<lsp_types::SymbolKind>, String> {
    names.iter().map(|name| parse_kind(name).ok_or_else(|| format!("unknown symbol kind '{name}'"))).collect()
}

/// Print `value` in the compact form the answer-size bound was checked against.
fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = answer_json(value).map_err(|error| error.to_string())?;
    println!("{text}");
    Ok(())
}

async fn run(
    args: &Args,
    settings: &Settings,
    root: &Path,
    backend: Backend,
) -> Result<(), String> {
    match &args.command {
        Command::Locate {
            target,
            substring,
            include_kinds,
            exclude_kinds,
            max_depth,
        } => {
            let options = SearchOptions {
                substring: *substring,
                include_kinds: parse_kinds(include_kinds)?,
                exclude_kinds: parse_kinds(exclude_kinds)?,
                max_depth: *max_depth,
            };
            let uri = document_uri(root, &target.file)?;
            let operations = SymbolOperations::new(backend);
            let result = match selector_for(target) {
                Ok(selector) => operations.locator().locate_with(&uri, &selector, &options).await,
                Err(_) => operations.locator().locate(&uri, None, None).await,
            };
            let printed = print_json(&result.to_report());
            operations.locator().provider().shutdown().await;
            printed
        },
        Command::Children {
            target,
            depth,
            hover,
            max_answer_chars,
        } => {
            let uri = document_uri(root, &target.file)?;
            let selector = selector_for(target)?;
            let operations =
                SymbolOperations::new(backend).with_renderer(ReportRenderer::from_settings(&settings.report));
            let include_hover = *hover || settings.report.include_hover;
            let report = operations.get_children(&uri, &selector, depth, include_hover, *max_answer_chars).await;
            operations.locator().provider().shutdown().await;
            print!("{}", report.map_err(|error| error.to_string())?);
            Ok(())
        },
        Command::Overview {
            path,
            max_answer_chars,
        } => {
            let scanner = OverviewScanner::new(backend, root, settings.overview.clone());
            let governed = scanner.overview(path, *max_answer_chars).await;
            scanner.provider().shutdown().await;
            if governed.is_oversized() {
                warn!("Overview of '{path}' exceeds the answer size limit");
            }
            print_json(&governed.into_value())
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match load_settings(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(message) => {
            eprintln!("symbol-locator: {message}");
            return ExitCode::FAILURE;
        },
    };
    let log_path = init_logging(&args, &settings);
    info!("Starting symbol-locator v{}", env!("CARGO_PKG_VERSION"));
    info!("Log file: {}", log_path.display());

    let root = args.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let root = std::path::absolute(&root).unwrap_or(root);

    let outcome = match open_backend(&args, &settings, &root).await {
        Ok(backend) => run(&args, &settings, &root, backend).await,
        Err(message) => Err(message),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{message}");
            ExitCode::FAILURE
        },
    }
}
