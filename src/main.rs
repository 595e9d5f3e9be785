//! luxi: scan comic libraries into a catalog and serve issues from it.

mod cli;

use crate::cli::{Cli, Command, IssueCommand, LibraryCommand, SeriesCommand};
use clap::Parser;
use luxi_catalog::{Database, Issue, Repository};
use luxi_config::Config;
use luxi_library::scan::{ScanSummary, recover, request_scan};
use luxi_library::{Context, manage, stream};
use luxi_lookup::JikanClient;
use luxi_storage::{BackendHandle, LocalBackend};
use luxi_thumbnail::Thumbnailer;
use miette::{IntoDiagnostic, Result};
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// `Exn` trees print their whole chain (with locations) through `Debug`.
fn report<E: Debug>(err: E) -> miette::Report {
    miette::miette!("{err:?}")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).map_err(report)?;

    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
    debug!(?config, "configuration loaded");

    let db = Database::connect(&config.database_path).await.map_err(report)?;
    let ctx = context(&config, &db).await?;
    let result = run(cli.command, &ctx).await;
    db.close().await;
    result
}

async fn context(config: &Config, db: &Database) -> Result<Context> {
    for dir in [config.previews_dir(), config.covers_dir()] {
        tokio::fs::create_dir_all(&dir).await.into_diagnostic()?;
    }
    let assets_root = std::path::absolute(&config.assets_path).into_diagnostic()?;
    let assets: BackendHandle = Arc::new(LocalBackend::new(assets_root).map_err(report)?);
    let thumbnailer = Thumbnailer::new(config.thumbnail.width).map_err(report)?;
    let ctx = Context::new(Repository::from(db), assets, thumbnailer);
    if !config.lookup.enabled {
        return Ok(ctx);
    }
    let client = JikanClient::new(&config.lookup.base_url).map_err(report)?;
    Ok(ctx.with_lookup(Arc::new(client), config.lookup.delay()))
}

async fn run(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Library(LibraryCommand::Add { name, path }) => {
            let path = std::path::absolute(&path).into_diagnostic()?;
            let (library, handle) = manage::create_library(ctx, &name, &path).await.map_err(report)?;
            println!("library {} created: {} ({})", library.id, library.name, library.path.display());
            match handle {
                Some(handle) => print_summary(&handle.wait().await.map_err(report)?),
                None => println!("another scan is running; scan this library once it finishes"),
            }
        },
        Command::Library(LibraryCommand::List) => {
            for library in manage::list_libraries(ctx).await.map_err(report)? {
                println!("{}\t{}\t{}", library.id, library.name, library.path.display());
            }
        },
        Command::Library(LibraryCommand::Show { id }) => {
            let overview = manage::get_library(ctx, id).await.map_err(report)?;
            println!("{} ({})", overview.library.name, overview.library.path.display());
            for summary in overview.series {
                println!("{}\t{}\t{} issues", summary.series.id, summary.series.title, summary.issue_count);
            }
        },
        Command::Scan { library } => {
            let handle = request_scan(ctx, library).await.map_err(report)?;
            print_summary(&handle.wait().await.map_err(report)?);
        },
        Command::Status => {
            println!("{}", manage::scan_status(ctx).await.map_err(report)?);
        },
        Command::Recover => {
            if recover(ctx).await.map_err(report)? {
                println!("scan flag cleared");
            } else {
                println!("no scan flag was set");
            }
        },
        Command::Series(SeriesCommand::Show { id }) => {
            let detail = manage::get_series(ctx, id).await.map_err(report)?;
            let series = detail.series;
            println!("{} ({})", series.title, series.path.display());
            if let Some(view) = series.metadata.as_ref().and_then(|m| m.view().ok()) {
                if let Some(title) = view.primary_title() {
                    println!("matched: {title}");
                }
                if let Some(synopsis) = &view.synopsis {
                    println!("{synopsis}");
                }
            }
            if let Some(cover) = &series.cover_path {
                println!("cover: {}", cover.display());
            }
            for issue in &detail.issues {
                print_issue(issue);
            }
        },
        Command::Series(SeriesCommand::Read { id }) => {
            let marked = manage::mark_series_read(ctx, id).await.map_err(report)?;
            println!("marked {marked} issues read");
        },
        Command::Series(SeriesCommand::Cover { id, out }) => {
            save(&out, &manage::series_cover(ctx, id).await.map_err(report)?).await?;
        },
        Command::Series(SeriesCommand::Delete { id, removal }) => {
            manage::delete_series(ctx, id, removal.remove_files).await.map_err(report)?;
            println!("series {id} deleted");
        },
        Command::Issue(IssueCommand::Page { id, page }) => {
            print_issue(&manage::set_current_page(ctx, id, page).await.map_err(report)?);
        },
        Command::Issue(IssueCommand::Read { id }) => {
            print_issue(&manage::mark_issue_read(ctx, id).await.map_err(report)?);
        },
        Command::Issue(IssueCommand::Preview { id, out }) => {
            save(&out, &manage::issue_preview(ctx, id).await.map_err(report)?).await?;
        },
        Command::Issue(IssueCommand::Delete { id, removal }) => {
            manage::delete_issue(ctx, id, removal.remove_files).await.map_err(report)?;
            println!("issue {id} deleted");
        },
        Command::Stream { series, issue, out } => {
            let delivery = stream::deliver(ctx, series, issue).await.map_err(report)?;
            tokio::fs::create_dir_all(&out).await.into_diagnostic()?;
            let target = out.join(&delivery.filename);
            let (content_type, length) = (delivery.content_type, delivery.length);
            let mut reader = delivery.into_reader();
            let mut file = tokio::fs::File::create(&target).await.into_diagnostic()?;
            tokio::io::copy(&mut reader, &mut file).await.into_diagnostic()?;
            println!("{} ({content_type}, {length} bytes)", target.display());
        },
    }
    Ok(())
}

async fn save(out: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(out, bytes).await.into_diagnostic()?;
    println!("{} ({} bytes)", out.display(), bytes.len());
    Ok(())
}

fn print_summary(summary: &ScanSummary) {
    println!(
        "scan finished: {} new series, {} new issues, {} already known, {} skipped, {} failed",
        summary.series_created, summary.issues_created, summary.issues_found, summary.skipped, summary.failures
    );
}

fn print_issue(issue: &Issue) {
    println!(
        "{}\tv{}\tc{}\t{}/{}\t{}\t{}",
        issue.id,
        issue.volume,
        issue.chapter,
        issue.current_page,
        issue.page_count,
        if issue.is_read { "read" } else { "unread" },
        issue.path.display()
    );
}
