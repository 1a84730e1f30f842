//! The self-paced primary-action driver.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{Link, Session, lock};
use crate::error::AnglerError;
use crate::message::Command;

impl Session {
    /// Spawn the action loop unless one is already running.
    ///
    /// Returns `false` if the loop was already active.
    pub fn start_action_loop(self: &Arc<Self>) -> bool {
        let Some(epoch) = self.claim_loop() else {
            return false;
        };
        tokio::spawn(self.clone().drive_loop(epoch));
        true
    }

    /// Run the action loop on the current task until it stops or the
    /// connection drops. A second call while active returns at once.
    pub async fn run_action_loop(self: Arc<Self>) {
        if let Some(epoch) = self.claim_loop() {
            self.drive_loop(epoch).await;
        }
    }

    /// Ask the loop to stop. Takes effect at its next check; a wait in
    /// progress runs to completion.
    pub fn stop_action_loop(&self) {
        if self.loop_active.swap(false, Ordering::SeqCst) {
            info!(actions = self.action_count(), "action loop stopping");
        }
    }

    /// Mark the loop active. The returned epoch lets a loop that was
    /// stopped and restarted before it noticed tell that it is stale.
    fn claim_loop(&self) -> Option<u64> {
        if self
            .loop_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("action loop already running");
            return None;
        }
        self.action_count.store(0, Ordering::SeqCst);
        Some(self.loop_epoch.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn keep_going(&self, link: &Link, epoch: u64) -> bool {
        self.is_loop_active()
            && self.loop_epoch.load(Ordering::SeqCst) == epoch
            && self.is_connected()
            && !link.is_severed()
    }

    async fn drive_loop(self: Arc<Self>, epoch: u64) {
        let Some(link) = self.link() else {
            self.loop_active.store(false, Ordering::SeqCst);
            return;
        };
        info!(generation = link.generation(), "action loop started");

        let status_stop = link.token().child_token();
        tokio::spawn(status_log(self.clone(), status_stop.clone()));

        if let Err(e) = self.bursts(&link, epoch).await {
            self.lose_link(&link, &e);
        }

        status_stop.cancel();
        info!(actions = self.action_count(), "action loop finished");
    }

    async fn bursts(&self, link: &Link, epoch: u64) -> Result<(), AnglerError> {
        let settings = &self.settings;
        while self.keep_going(link, epoch) {
            for _ in 0..settings.burst_size {
                if !self.keep_going(link, epoch) {
                    return Ok(());
                }
                link.send(Command::Fish).await?;
                let count = self.action_count.fetch_add(1, Ordering::SeqCst) + 1;
                debug!(count, "fish");
                self.clock.sleep(settings.action_delay).await;

                if settings.inventory_every > 0 && count % settings.inventory_every == 0 {
                    self.request_inventory(link).await?;
                }
                if settings.market_every > 0 && count % settings.market_every == 0 {
                    link.send(Command::Market).await?;
                }
            }
            if !self.keep_going(link, epoch) {
                break;
            }
            let cooldown = self.cooldown();
            debug!(?cooldown, "burst done");
            self.clock.sleep(cooldown).await;
        }
        Ok(())
    }

    async fn request_inventory(&self, link: &Link) -> Result<(), AnglerError> {
        if !self.is_connected() {
            return Ok(());
        }
        lock(&self.segmenter).clear_buffer();
        link.send(Command::Inventory).await
    }
}

async fn status_log(session: Arc<Session>, stop: CancellationToken) {
    let period = session.settings.status_interval;
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                info!(actions = session.action_count(), "fishing: {} commands sent", session.action_count());
            }
        }
    }
}
