use std::{future::Future, time::Duration};

use tokio::{
    sync::broadcast,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Call `task` now and then once per `every` until `shutdown` fires.
///
/// Only a sent message stops the loop. A dropped sender leaves it running.
///
/// Runs are sequential: a run that overruns its slot delays the next one instead of
/// overlapping it, and missed ticks are dropped rather than replayed.
pub async fn run_every<F, Fut>(every: Duration, mut shutdown: broadcast::Receiver<()>, mut task: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(every_secs = every.as_secs(), "scheduler started");

    loop {
        tokio::select! {
            Ok(()) = shutdown.recv() => {
                info!("scheduler stopped");
                return;
            }
            _ = ticker.tick() => {
                debug!("tick");
                task().await;
            }
        }
    }
}
