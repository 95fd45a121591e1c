//! print-pager CLI: paginate an HTML file with the headless metrics oracle.
//! The main interface is through WASM bindings.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use print_pager::{
    ContentDocument, MetricsOracle, Orientation, PaginationConfig, PaginationError, PaperSize,
    PreviewSession, PrintDocument,
};

#[derive(Parser)]
#[command(name = "print-pager")]
#[command(about = "Split HTML content into printable pages")]
#[command(version)]
struct Cli {
    /// HTML file to paginate
    input: PathBuf,

    /// JSON pagination config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Paper size (overrides the config)
    #[arg(short, long, value_enum)]
    paper: Option<PaperArg>,

    /// Landscape orientation
    #[arg(short, long)]
    landscape: bool,

    /// Write the print document to this file
    #[arg(long)]
    print: Option<PathBuf>,

    /// Print pages as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => PaperSize::A3,
            PaperArg::A4 => PaperSize::A4,
            PaperArg::A5 => PaperSize::A5,
            PaperArg::Letter => PaperSize::Letter,
            PaperArg::Legal => PaperSize::Legal,
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error("json output failed: {0}")]
    Json(#[from] serde_json::Error),
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => PaginationConfig::from_json(&read(path)?)?,
        None => PaginationConfig::default(),
    };
    if let Some(paper) = cli.paper {
        config.paper = paper.into();
    }
    if cli.landscape {
        config.orientation = Orientation::Landscape;
    }

    let content = read(&cli.input)?;
    let document = ContentDocument::parse(&content);
    let mut session = PreviewSession::from_config(&config)?;
    let mut oracle = MetricsOracle::default();
    let pages = session.refresh(&document, &mut oracle)?.clone();

    if cli.json {
        println!("{}", pages.to_json()?);
    } else {
        println!(
            "{}: {} page(s), {} manual break(s)",
            cli.input.display(),
            pages.total_pages(),
            document.marker_count()
        );
        for page in &pages {
            println!(
                "  page {:>3}  section {:>2}  bytes {:>6}..{:<6} {:>8.1}px{}",
                page.index,
                page.section,
                page.span.start,
                page.span.end,
                page.height,
                if page.overflow { "  (overflow)" } else { "" }
            );
        }
    }

    if let Some(path) = &cli.print {
        let title = cli
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let html = PrintDocument::new(&pages, session.footer())
            .typography(session.typography())
            .page_size(config.paper.css_size(config.orientation))
            .title(title)
            .render();
        std::fs::write(path, html).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("wrote print document to {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
