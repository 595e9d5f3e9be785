use crate::Context;
use crate::error::{ErrorKind, Result};
use crate::scan::classify::{Classification, Classifier, SkipReason};
use crate::scan::sync::{Synced, Synchronizer};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use luxi_catalog::Library;
use luxi_storage::{LocalBackend, StorageBackend};
use std::path::PathBuf;
use tracing::trace;

/// Progress events emitted by [`scan`] as it walks a library.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`Skipped`](Self::Skipped) and [`Synced`](Self::Synced), once per
///    walked file, in walk order.
/// 3. [`Complete`](Self::Complete) exactly once.
///
/// Per-file failures (an unreadable directory, a corrupt archive, a failed
/// thumbnail) are yielded as `Err` items between those events and never
/// end the stream. Only an unusable library root does, in which case
/// [`Complete`](Self::Complete) is never emitted.
#[derive(Debug)]
pub enum ScanEvent {
    Started { library: i64 },
    Skipped { path: PathBuf, reason: SkipReason },
    Synced(Box<Synced>),
    Complete,
}

/// Walk `library` and bring the catalog up to date with it, one file at a
/// time in walk order.
pub fn scan<'a>(ctx: &'a Context, library: &'a Library) -> impl Stream<Item = Result<ScanEvent>> + Send + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(ScanEvent::Started { library: library.id });

        let backend = match LocalBackend::existing(&library.path).or_raise(|| ErrorKind::NotFound) {
            Ok(backend) => backend,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let synchronizer = Synchronizer::new(ctx, library, &backend);
        let mut classifier = Classifier::new();
        let mut files = backend.list_stream();

        while let Some(entry) = files.next().await {
            let file = match entry.or_raise(|| ErrorKind::Storage) {
                Ok(file) => file,
                Err(e) => {
                    yield Err(e);
                    continue;
                },
            };
            match classifier.classify(&file) {
                Classification::Skip(reason) => {
                    trace!(path = %file.path.display(), %reason, "skipping");
                    yield Ok(ScanEvent::Skipped { path: file.path, reason });
                },
                item => match synchronizer.sync(&item).await {
                    Ok((synced, failure)) => {
                        yield Ok(ScanEvent::Synced(Box::new(synced)));
                        if let Some(e) = failure {
                            yield Err(e);
                        }
                    },
                    Err(e) => yield Err(e),
                },
            }
        }

        yield Ok(ScanEvent::Complete);
    })
}
