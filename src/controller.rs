use std::hash::{DefaultHasher, Hash, Hasher};
use std::time::Duration;

use event::{Metric, Resource, Snapshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::metrics::{SCRAPE_DURATION, UP};
use crate::output::Output;
use crate::scrape::{Receiver, ScrapeError};

#[inline]
fn target_hash<H: Hash>(target: H) -> u64 {
    let mut hasher = DefaultHasher::default();
    target.hash(&mut hasher);
    hasher.finish()
}

/// Offset of the first tick, so many scrapers started at once don't hit
/// their controllers in lockstep.
fn jitter(endpoint: &str, interval: Duration) -> Duration {
    let nanos = interval.as_nanos().max(1) as u64;

    Duration::from_nanos(target_hash(endpoint) % nanos)
}

/// Runs scrape cycles every `interval` until `shutdown` is cancelled.
///
/// A cycle that fails to scrape still produces a snapshot, carrying only the
/// self metrics. The loop ends with an error only when `output` fails.
pub async fn run<O: Output + ?Sized>(
    mut receiver: Receiver,
    output: &mut O,
    shutdown: CancellationToken,
) -> crate::Result<()> {
    let interval = receiver.config().interval;
    let offset = jitter(&receiver.config().endpoint, interval);
    let mut ticker = tokio::time::interval_at(Instant::now() + offset, interval);

    info!(
        message = "start scraping",
        endpoint = %receiver.config().endpoint,
        ?interval,
        ?offset,
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => break,
        }

        let Some(snapshot) = cycle(&mut receiver, &shutdown).await else {
            break;
        };

        if let Err(err) = output.send(snapshot).await {
            error!(message = "send snapshot failed", %err);

            receiver.shutdown();
            return Err(err);
        }
    }

    receiver.shutdown();
    info!(message = "scraper stopped");

    Ok(())
}

/// One cycle plus the self metrics. `None` if it was cancelled.
pub async fn cycle(receiver: &mut Receiver, cx: &CancellationToken) -> Option<Snapshot> {
    let start = Instant::now();
    let result = receiver.scrape(cx).await;
    let elapsed = start.elapsed();

    let mut snapshot = match result {
        Ok(snapshot) => snapshot,
        Err(ScrapeError::Cancelled) => return None,
        Err(err) => {
            warn!(
                message = "scrape redfish failed",
                endpoint = %receiver.config().endpoint,
                %err,
            );

            let mut resource = Resource::default();
            resource.insert("endpoint", receiver.config().endpoint.as_str());
            resource.insert("model", receiver.config().model.as_str());

            Snapshot {
                resource,
                metrics: Vec::with_capacity(2),
            }
        }
    };

    // nothing answered, the controller is unreachable or rejects us
    let up = !snapshot.is_empty();
    let timestamp = snapshot
        .metrics
        .first()
        .and_then(Metric::timestamp)
        .or_else(|| Some(chrono::Utc::now()));

    let metrics = &receiver.config().metrics;
    if metrics.enabled(UP.name) {
        snapshot
            .metrics
            .push(Metric::gauge(UP.name, UP.description, up).with_timestamp(timestamp));
    }
    if metrics.enabled(SCRAPE_DURATION.name) {
        snapshot.metrics.push(
            Metric::gauge(SCRAPE_DURATION.name, SCRAPE_DURATION.description, elapsed)
                .with_timestamp(timestamp)
                .with_unit(SCRAPE_DURATION.unit.map(ToString::to_string)),
        );
    }

    Some(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_is_stable_and_bounded() {
        let interval = Duration::from_secs(15);

        for endpoint in ["https://10.0.0.1", "https://10.0.0.2", "https://bmc.local"] {
            let offset = jitter(endpoint, interval);
            assert!(offset < interval);
            assert_eq!(offset, jitter(endpoint, interval));
        }
    }
}
