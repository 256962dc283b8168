//! Phase 2: Fetching
//!
//! Imports every repository of a batch concurrently. Completions are handled
//! as they arrive; the first failure cancels the rest of the batch and removes
//! every working copy it may have produced.

use futures::stream::{FuturesUnordered, StreamExt};
use log::{info, warn};

use crate::error::{Error, Result};
use crate::progress::{self, ProgressSink};
use crate::repository::{DocsRepo, Repo};
use crate::script::ScriptRunner;

/// Execute Phase 2: fetch and normalize `repos`.
pub async fn execute(
    repos: Vec<&mut DocsRepo>,
    runner: &dyn ScriptRunner,
    sink: Box<dyn ProgressSink>,
) -> Result<()> {
    let total = repos.len();
    if total == 0 {
        return Ok(());
    }
    let batch: Vec<Repo> = repos.iter().map(|r| r.repo.clone()).collect();
    let (reporter, reporting) = progress::spawn(sink);

    let mut pending: FuturesUnordered<_> = repos
        .into_iter()
        .map(|repo| {
            let reporter = reporter.clone();
            async move {
                reporter.started(repo.name());
                let result = repo.import_docs(runner).await;
                match &result {
                    Ok(()) => reporter.finished(repo.name()),
                    Err(e) => reporter.failed(repo.name(), e.to_string()),
                }
                (repo.name().to_string(), result)
            }
        })
        .collect();
    drop(reporter);

    let mut completed = 0;
    let mut failure = None;
    while let Some((name, result)) = pending.next().await {
        match result {
            Ok(()) => completed += 1,
            Err(e) => {
                failure = Some((name, e));
                break;
            }
        }
    }
    // Dropping the in-flight imports kills their child processes.
    drop(pending);
    reporting.await?;

    let Some((repo, source)) = failure else {
        info!("Imported {} repositories", completed);
        return Ok(());
    };

    for copy in &batch {
        if let Err(e) = copy.delete() {
            warn!("Could not remove {}: {}", copy.location().display(), e);
        }
    }
    Err(Error::BatchAborted {
        repo,
        completed,
        total,
        source: Box::new(source),
    })
}
