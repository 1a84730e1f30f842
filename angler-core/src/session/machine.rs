//! Session state machine: connection lifecycle, server events and
//! operator input.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::{debug, info, warn};

use super::handlers::{self, InventoryGuard};
use super::{Link, OperatorInput, Session, lock};
use crate::error::AnglerError;
use crate::message::Command;
use crate::network::CommandSender;
use crate::segmenter::SessionEvent;

impl Session {
    // ── Lifecycle ────────────────────────────────────────────────

    /// A connection attempt is starting.
    pub fn on_connecting(&self) -> Result<(), AnglerError> {
        lock(&self.status).begin_connect()
    }

    /// Transport is up. Installs a fresh [`Link`] and resets the
    /// per-connection flags; game state and cooldown carry over.
    pub fn on_connected(&self, tx: CommandSender) -> Result<Link, AnglerError> {
        lock(&self.status).complete_connect()?;

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let link = Link::new(generation, tx);
        *lock(&self.link) = Some(link.clone());

        self.skip_sent.store(false, Ordering::SeqCst);
        lock(&self.segmenter).reset();

        let authenticated = self.authenticated.load(Ordering::SeqCst);
        lock(&self.phase).on_connected(authenticated);
        info!(generation, phase = %self.phase(), "connected");
        Ok(link)
    }

    /// Transport closed or failed. Safe to call more than once.
    pub fn on_disconnected(&self) {
        if let Some(link) = lock(&self.link).take() {
            link.sever();
        }
        {
            let mut status = lock(&self.status);
            if let Some(uptime) = status.connected_duration() {
                info!(?uptime, "disconnected");
            }
            status.force_disconnect();
        }
        lock(&self.phase).on_disconnected();
        if self.loop_active.swap(false, Ordering::SeqCst) {
            info!("action loop stopped by disconnect");
        }
    }

    // ── Server events ────────────────────────────────────────────

    /// Feed one decoded chunk from the server.
    pub async fn handle_chunk(self: &Arc<Self>, chunk: &str) {
        let segment = lock(&self.segmenter).feed(chunk);
        for line in &segment.lines {
            debug!(target: "server", "{line}");
        }
        for event in segment.events {
            self.handle_event(event).await;
        }
    }

    pub async fn handle_event(self: &Arc<Self>, event: SessionEvent) {
        let Some(link) = self.link() else {
            debug!(?event, "event without a connection, ignored");
            return;
        };

        match event {
            SessionEvent::CredentialRequested => {
                info!("credential requested");
                let code = self.settings.invite_code.clone();
                if let Err(e) = link.send(Command::InviteCode(code)).await {
                    self.lose_link(&link, &e);
                    return;
                }
                self.authenticated.store(true, Ordering::SeqCst);
                lock(&self.phase).on_credential_sent();
                self.start_action_loop();
            }
            SessionEvent::SkipProbe => {
                if self.skip_sent.swap(true, Ordering::SeqCst) {
                    return;
                }
                debug!("skipping intro animation");
                if let Err(e) = link.send(Command::SkipAnimation).await {
                    self.lose_link(&link, &e);
                }
            }
            SessionEvent::CooldownAnnounced { millis } => {
                info!(millis, "cooldown updated");
                self.set_cooldown(millis);
            }
            SessionEvent::MarketReportComplete { text } => {
                tokio::spawn(handlers::handle_market(self.clone(), link, text));
            }
            SessionEvent::InventoryReportComplete { text } => {
                match InventoryGuard::acquire(self) {
                    Some(guard) => {
                        tokio::spawn(handlers::handle_inventory(self.clone(), link, text, guard));
                    }
                    None => info!("inventory handling already in progress, report dropped"),
                }
            }
        }
    }

    // ── Operator ─────────────────────────────────────────────────

    pub async fn handle_operator(self: &Arc<Self>, input: OperatorInput) {
        match input {
            OperatorInput::StartLoop => {
                if !self.is_connected() {
                    warn!("not connected, cannot start fishing");
                    return;
                }
                self.start_action_loop();
            }
            OperatorInput::StopLoop => self.stop_action_loop(),
            OperatorInput::Forward(line) => {
                let Some(link) = self.link() else {
                    warn!("not connected, dropped: {line}");
                    return;
                };
                if let Err(e) = link.send(Command::Raw(line)).await {
                    self.lose_link(&link, &e);
                }
            }
        }
    }
}
