mod cli;
mod collab;
mod error;
mod logging;

use crate::cli::Cli;
use crate::collab::{ChromeRender, PdfcpuBind};
use crate::error::{ErrorKind, Result};
use bindery_book::{ArtifactStore, Binder, Book, FrontMatter, Matcher, Reconciler};
use bindery_config::Config;
use bindery_pdf::Pdfcpu;
use bindery_render::{Chrome, Renderer, StyleConfig};
use bindery_source::GithubSource;
use clap::Parser;
use exn::ResultExt;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.level(), cli.log_json) {
        eprintln!("could not initialise logging: {e}");
    }
    match run(cli).await {
        Ok(book) => {
            for skipped in &book.skipped {
                tracing::warn!(id = %skipped.id, reason = %skipped.reason, "Left out of the book");
            }
            tracing::info!(
                output = %book.output.display(),
                chapters = book.chapters.len(),
                pages = book.pages(),
                "Done"
            );
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!(error = ?e, "Run failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<Book> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    cli.apply(&mut config);
    config.validate().or_raise(|| ErrorKind::Config)?;

    let cache_dir = std::path::absolute(&config.cache_dir).or_raise(|| ErrorKind::Setup("cache directory"))?;
    let store = ArtifactStore::new(&cache_dir).or_raise(|| ErrorKind::Setup("cache directory"))?;
    tracing::debug!(cache_dir = %cache_dir.display(), "Artifact store ready");

    let source = GithubSource::new()
        .or_raise(|| ErrorKind::Setup("source"))?
        .with_listing_url(&config.source.listing_url)
        .with_raw_base_url(&config.source.raw_base_url)
        .with_title_prefix(Some(config.source.title_prefix.clone()))
        .with_assets(&config.source.assets);

    let chrome = match &config.tools.chrome {
        Some(path) => Chrome::at(path),
        None => Chrome::discover(),
    }
    .or_raise(|| ErrorKind::Setup("chrome"))?;
    let pdfcpu = match &config.tools.pdfcpu {
        Some(path) => Pdfcpu::at(path),
        None => Pdfcpu::discover(),
    }
    .or_raise(|| ErrorKind::Setup("pdfcpu"))?;
    let renderer = Renderer::with_chrome(chrome, styles(&config)?);

    let binder = Binder::new(
        store,
        Arc::new(source),
        Arc::new(ChromeRender::new(renderer, pdfcpu.clone())),
        Arc::new(PdfcpuBind::new(pdfcpu)),
        front_matter(&config).await?,
    )
    .with_reconciler(Reconciler::new(Matcher::new(&config.matching.stopwords, config.matching.threshold)))
    .with_front_matter_bookmark(&config.book.front_matter_bookmark)
    .with_concurrency(config.concurrency)
    .with_politeness(config.politeness())
    .with_assets(config.assets);

    binder.run(&config.output).await.or_raise(|| ErrorKind::Bind)
}

fn styles(config: &Config) -> Result<StyleConfig> {
    let mut styles = StyleConfig::new();
    for name in &config.render.styles {
        styles = match styles.with_builtin(name) {
            Ok(styles) => styles,
            Err(e) => {
                tracing::error!(style = %name, available = ?StyleConfig::list_builtins(), "Unknown built-in stylesheet");
                return Err(e).or_raise(|| ErrorKind::Setup("stylesheets"));
            },
        };
    }
    for path in &config.render.stylesheets {
        styles = styles.with_file(path).or_raise(|| ErrorKind::Setup("stylesheets"))?;
    }
    Ok(styles)
}

async fn front_matter(config: &Config) -> Result<FrontMatter> {
    let front = match &config.book.template {
        Some(path) => {
            let template = tokio::fs::read_to_string(path).await.or_raise(|| ErrorKind::Setup("front matter"))?;
            template.parse::<FrontMatter>().or_raise(|| ErrorKind::Setup("front matter"))?
        },
        None => FrontMatter::builtin(&config.book.title).or_raise(|| ErrorKind::Setup("front matter"))?,
    };
    Ok(front
        .with_title(&config.book.title)
        .with_subtitle(config.book.subtitle.clone())
        .with_intro(config.book.intro.clone()))
}
