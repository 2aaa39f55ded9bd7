use std::time::Duration;

use log::{info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

use crate::client::Client;
use crate::config::WatchConfig;
use crate::types::event::{EventQuery, LiveEvent};

const CHANNEL_SIZE: usize = 64;

/// Polls the server-side event feed and forwards change notifications as
/// a tagged stream. Independent from the decision gateway; consumers use
/// it to mark open records as stale when they change elsewhere.
pub struct Watcher {
    client: Client,
    interval: Duration,
    resources: Vec<String>,
    cursor: u64,
}

impl Watcher {
    pub fn new(client: Client, cfg: &WatchConfig) -> Self {
        Self {
            client,
            interval: Duration::from_millis(cfg.interval_ms as u64),
            resources: cfg.resources.clone(),
            cursor: 0,
        }
    }

    /// Spawns the poll loop. Events arrive in server order; events for
    /// resources outside the configured filter are skipped, the cursor
    /// still advances past them. Dropping the receiver stops the loop.
    pub fn subscribe(mut self) -> (JoinHandle<()>, mpsc::Receiver<LiveEvent>) {
        let (tx, rx) = mpsc::channel(CHANNEL_SIZE);
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    info!("Event receiver dropped, stopping watcher");
                    return;
                }

                let query = EventQuery {
                    since: (self.cursor > 0).then_some(self.cursor),
                };
                let events = match self.client.read_events(&query).await {
                    Ok(events) => events,
                    Err(err) => {
                        warn!("Read events failed: {err:#}");
                        continue;
                    }
                };

                for event in events {
                    if event.timestamp >= self.cursor {
                        self.cursor = event.timestamp + 1;
                    }
                    if !self.resources.is_empty() && !self.resources.contains(&event.resource) {
                        continue;
                    }
                    if tx.send(event).await.is_err() {
                        info!("Event receiver dropped, stopping watcher");
                        return;
                    }
                }
            }
        });

        (handle, rx)
    }
}
