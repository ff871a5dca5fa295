//! Bounded fan-out shared by every operator

use anyhow::Result;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::future::Future;
use tracing::debug;

/// Run `tasks` with at most `limit` in flight, returning the first error.
///
/// Tasks start in submission order as slots free up. After the first
/// failure no further task is started; tasks already running finish
/// normally. A `limit` of zero is treated as one.
pub async fn run_bounded<I, F, Fut>(limit: usize, tasks: I) -> Result<()>
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let limit = limit.max(1);
    let mut pending = tasks.into_iter();
    let mut running = FuturesUnordered::new();
    let mut first_error = None;

    loop {
        while first_error.is_none() && running.len() < limit {
            match pending.next() {
                Some(task) => running.push(task()),
                None => break,
            }
        }

        match running.next().await {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
            None => break,
        }
    }

    match first_error {
        Some(e) => {
            let skipped = pending.count();
            if skipped > 0 {
                debug!(skipped, "Skipped tasks after earlier failure");
            }
            Err(e)
        }
        None => Ok(()),
    }
}
