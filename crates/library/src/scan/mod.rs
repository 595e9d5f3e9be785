//! Library scanning.
//!
//! A scan walks a library root ([`luxi_storage`]), classifies each file
//! ([`Classifier`]), and finds or creates the series and issue it belongs to.
//! New series are enriched with metadata; new issues are inspected for their
//! page count and thumbnailed. Rescanning an unchanged library changes
//! nothing, because every row is keyed by its path.
//!
//! [`scan`] is the event stream itself. [`request_scan`] is how a front end
//! starts one: it guards against concurrent scans with the persisted
//! [`ScanState`] flag and runs the stream to completion in the background.

mod classify;
mod stream;
mod sync;

pub use self::classify::{Classification, Classifier, LOOSE_IMAGE_EXTENSIONS, RESERVED_NAMES, SkipReason};
pub use self::stream::{ScanEvent, scan};
pub use self::sync::{Synced, cover_path};

use crate::Context;
use crate::error::{CatalogResultExt, ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use futures::StreamExt;
use luxi_catalog::{Library, ScanState};
use std::pin::pin;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

/// Tally of one finished scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub series_created: u64,
    pub issues_created: u64,
    pub issues_found: u64,
    pub skipped: u64,
    pub failures: u64,
}

/// A scan running in the background.
///
/// Dropping the handle detaches the scan; it still runs to completion and
/// still clears the scan flag.
#[derive(Debug)]
pub struct ScanHandle {
    library: i64,
    task: JoinHandle<ScanSummary>,
}

impl ScanHandle {
    pub fn library(&self) -> i64 {
        self.library
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the scan to finish.
    pub async fn wait(self) -> Result<ScanSummary> {
        self.task.await.or_raise(|| ErrorKind::Io)
    }
}

/// Start scanning a library in the background.
///
/// Fails with [`ErrorKind::NotFound`] for an unknown library, and with
/// [`ErrorKind::Conflict`] (changing nothing) if any scan is already
/// running. The busy flag is set before this returns and is cleared when
/// the scan ends, however many of its files failed and even if it panics.
#[instrument(skip(ctx))]
pub async fn request_scan(ctx: &Context, library_id: i64) -> Result<ScanHandle> {
    let catalog = ctx.catalog();
    let library = catalog.get_library(library_id).await.or_catalog()?.ok_or_raise(|| ErrorKind::NotFound)?;
    if !catalog.try_begin_scan().await.or_catalog()? {
        exn::bail!(ErrorKind::Conflict);
    }
    let scan_ctx = ctx.clone();
    let task = spawn_scan(ctx.clone(), library_id, async move { run(&scan_ctx, &library).await });
    Ok(ScanHandle { library: library_id, task })
}

/// Run `work` as the owner of an already-claimed scan flag.
fn spawn_scan<F>(ctx: Context, library: i64, work: F) -> JoinHandle<ScanSummary>
where
    F: Future<Output = ScanSummary> + Send + 'static,
{
    tokio::spawn(async move {
        let guard = FlagGuard { ctx: Some(ctx), library };
        let summary = work.await;
        guard.release().await;
        summary
    })
}

/// Holds the scan flag for one scan task. Releasing it clears the flag in
/// line; dropping it unreleased (a panic) clears it from a fresh task.
struct FlagGuard {
    ctx: Option<Context>,
    library: i64,
}

impl FlagGuard {
    async fn release(mut self) {
        if let Some(ctx) = self.ctx.take() {
            clear_flag(&ctx, self.library).await;
        }
    }
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        let Some(ctx) = self.ctx.take() else {
            return;
        };
        let library = self.library;
        warn!(library, "scan ended abnormally; clearing scan flag");
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move { clear_flag(&ctx, library).await });
            },
            Err(_) => error!(library, "no runtime left to clear scan flag"),
        }
    }
}

async fn clear_flag(ctx: &Context, library: i64) {
    if let Err(e) = ctx.catalog().set_scan_state(ScanState::Idle).await {
        error!(library, error = ?e, "could not clear scan flag");
    }
}

/// Drive [`scan`] to completion, logging failures as they come.
pub async fn run(ctx: &Context, library: &Library) -> ScanSummary {
    info!(library = library.id, path = %library.path.display(), "scan started");
    let mut summary = ScanSummary::default();
    let mut events = pin!(scan(ctx, library));
    while let Some(event) = events.next().await {
        match event {
            Ok(ScanEvent::Synced(synced)) => {
                summary.series_created += u64::from(synced.series_created);
                if synced.issue_created {
                    summary.issues_created += 1;
                } else {
                    summary.issues_found += 1;
                }
            },
            Ok(ScanEvent::Skipped { .. }) => summary.skipped += 1,
            Ok(ScanEvent::Started { .. } | ScanEvent::Complete) => {},
            Err(e) => {
                summary.failures += 1;
                warn!(library = library.id, error = ?e, "scan entry failed");
            },
        }
    }
    info!(
        library = library.id,
        series_created = summary.series_created,
        issues_created = summary.issues_created,
        issues_found = summary.issues_found,
        skipped = summary.skipped,
        failures = summary.failures,
        "scan finished"
    );
    summary
}

/// Clear a busy flag left behind by a process that died mid-scan.
///
/// The flag is shared by every process using the catalog, so this is only
/// safe when no other process can be scanning: an operator's explicit
/// request, or the start of the one long-lived process that owns the
/// catalog. Returns whether a set flag was found.
pub async fn recover(ctx: &Context) -> Result<bool> {
    let catalog = ctx.catalog();
    if !catalog.scan_state().await.or_catalog()?.is_busy() {
        return Ok(false);
    }
    warn!("found scan flag left set by a previous process; clearing it");
    catalog.set_scan_state(ScanState::Idle).await.or_catalog()?;
    Ok(true)
}
