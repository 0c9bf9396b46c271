//! Session channel binding.
//!
//! ARCHITECTURE
//! ============
//! A [`SessionBinding`] owns exactly one logical live-update connection for
//! a given (PIN, kind) pair. A dispatch task pulls inbound events off the
//! transport and folds them into a shared [`LiveView`] through the pure
//! reducers in `state`; user actions travel the other way as commands.
//! Consumers read an immutable snapshot and subscribe to a change tick;
//! waiting for data is only ever "no update yet", never a suspended call.
//!
//! LIFECYCLE
//! =========
//! 1. `open`: inert (no connection attempt, disconnected status) when the
//!    PIN is empty or the kind unset; otherwise spawns the dispatch task.
//! 2. Transport yields `Connected` → announce presence with the current
//!    identity. This covers the initial connect and every reconnect.
//! 3. Inbound events fold into the view, one at a time.
//! 4. `close`: best-effort leave, transport closed, every slice cleared.
//!    Idempotent; events delivered after close are ignored.
//!
//! DESIGN
//! ======
//! Kind-specific events are gated in the reducer: a chat event in a fair
//! session (or scenario state in a restaurant session) is ignored rather
//! than merged, so a shared transport can never leak cross-kind payloads
//! into the view. The binding identity (PIN, kind) is immutable; callers
//! re-bind by tearing down and opening fresh. Only the announced identity
//! may change in place, which re-announces without reconnecting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::event::{self, Inbound, Outbound};
use crate::model::{Role, SessionKind};
use crate::state::LiveView;
use crate::transport::Channel;

// =============================================================================
// TYPES
// =============================================================================

/// Who this console announces itself as on the live channel.
#[derive(Debug, Clone)]
pub struct Identity {
    pub participant_id: String,
    pub display_name: String,
    pub role: Role,
}

/// Inputs for [`SessionBinding::open`]. An empty `pin` or an unset `kind`
/// produces an inert binding.
#[derive(Debug, Clone)]
pub struct BindingConfig {
    pub pin: String,
    pub kind: Option<SessionKind>,
    pub identity: Identity,
}

enum Command {
    Announce(Identity),
    Send(Outbound),
    Close,
}

struct Shared {
    view: RwLock<LiveView>,
    closed: AtomicBool,
    changes: watch::Sender<u64>,
}

impl Shared {
    fn bump(&self) {
        self.changes.send_modify(|v| *v = v.wrapping_add(1));
    }
}

// =============================================================================
// BINDING
// =============================================================================

pub struct SessionBinding {
    pin: String,
    shared: Arc<Shared>,
    commands: Option<mpsc::Sender<Command>>,
    task: Option<JoinHandle<()>>,
    changes: watch::Receiver<u64>,
}

impl SessionBinding {
    /// Open a binding over `channel`. If the PIN is empty or the kind is
    /// unset, no connection attempt is made: the binding reports
    /// disconnected status with empty slices until torn down.
    #[must_use]
    pub fn open(config: BindingConfig, channel: Box<dyn Channel>) -> Self {
        let (changes_tx, changes_rx) = watch::channel(0);
        let shared = Arc::new(Shared {
            view: RwLock::new(LiveView::default()),
            closed: AtomicBool::new(false),
            changes: changes_tx,
        });

        let kind = match config.kind {
            Some(kind) if !config.pin.is_empty() => kind,
            _ => {
                debug!("session binding left inert: pin or kind unset");
                return Self {
                    pin: config.pin,
                    shared,
                    commands: None,
                    task: None,
                    changes: changes_rx,
                };
            }
        };

        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let task = tokio::spawn(run_binding(
            channel,
            cmd_rx,
            Arc::clone(&shared),
            config.pin.clone(),
            kind,
            config.identity,
        ));

        Self {
            pin: config.pin,
            shared,
            commands: Some(cmd_tx),
            task: Some(task),
            changes: changes_rx,
        }
    }

    /// Immutable snapshot of the accumulated view state.
    pub async fn snapshot(&self) -> LiveView {
        self.shared.view.read().await.clone()
    }

    /// Subscription that ticks on every applied event. Poll with
    /// `changed().await`, then read [`snapshot`](Self::snapshot).
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.changes.clone()
    }

    /// Whether `open` declined to connect (empty PIN or unset kind).
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.commands.is_none()
    }

    /// Re-announce presence under a new identity without reconnecting.
    pub async fn set_identity(&self, identity: Identity) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(Command::Announce(identity)).await;
        }
    }

    /// Send the end notification for this session. Local status is not
    /// touched; the status change travels the REST path separately.
    /// Safe no-op when inert or not connected.
    pub async fn end_session(&self) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(Command::Send(Outbound::End(self.pin.clone()))).await;
        }
    }

    /// Outbound chat on behalf of a student.
    pub async fn send_student_message(&self, student_id: &str, text: &str) {
        self.send(Outbound::StudentMessage {
            experience_id: self.pin.clone(),
            student_id: student_id.to_owned(),
            text: text.to_owned(),
        })
        .await;
    }

    /// Outbound chat as the scenario narrator.
    pub async fn send_npc_message(&self, student_id: &str, text: &str) {
        self.send(Outbound::NpcMessage {
            experience_id: self.pin.clone(),
            student_id: student_id.to_owned(),
            text: text.to_owned(),
        })
        .await;
    }

    async fn send(&self, outbound: Outbound) {
        if let Some(commands) = &self.commands {
            let _ = commands.send(Command::Send(outbound)).await;
        }
    }

    /// Tear the binding down: best-effort leave, transport closed, every
    /// slice cleared. Safe to call repeatedly and on a binding that never
    /// connected; events the transport still delivers afterwards are
    /// ignored.
    pub async fn close(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(Command::Close).await;
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        self.shared.view.write().await.reset();
        self.shared.bump();
    }
}

impl Drop for SessionBinding {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// =============================================================================
// DISPATCH TASK
// =============================================================================

async fn run_binding(
    mut channel: Box<dyn Channel>,
    mut commands: mpsc::Receiver<Command>,
    shared: Arc<Shared>,
    pin: String,
    kind: SessionKind,
    mut identity: Identity,
) {
    loop {
        tokio::select! {
            inbound = channel.recv() => {
                let Some(inbound) = inbound else { break };
                if shared.closed.load(Ordering::SeqCst) {
                    break;
                }
                match &inbound {
                    Inbound::Connected => {
                        info!(%pin, "live channel connected");
                        announce(channel.as_mut(), &pin, &identity).await;
                    }
                    Inbound::Disconnected => {
                        info!(%pin, "live channel disconnected");
                    }
                    Inbound::System(notice) => {
                        info!(%pin, notice, "system notice");
                    }
                    _ => {}
                }
                {
                    let mut view = shared.view.write().await;
                    view.apply(&inbound, &pin, kind, event::now_ms());
                }
                shared.bump();
            }
            command = commands.recv() => {
                match command {
                    Some(Command::Announce(next)) => {
                        identity = next;
                        announce(channel.as_mut(), &pin, &identity).await;
                    }
                    Some(Command::Send(outbound)) => {
                        if let Err(e) = channel.send(&outbound).await {
                            debug!(error = %e, %pin, "outbound notification dropped");
                        }
                    }
                    Some(Command::Close) | None => {
                        // Best-effort goodbye; no acknowledgement awaited.
                        let _ = channel.send(&Outbound::Leave).await;
                        channel.close().await;
                        break;
                    }
                }
            }
        }
    }
}

async fn announce(channel: &mut dyn Channel, pin: &str, identity: &Identity) {
    let join = Outbound::Join {
        experience_id: pin.to_owned(),
        student_id: identity.participant_id.clone(),
        name: identity.display_name.clone(),
        user_type: identity.role,
    };
    if let Err(e) = channel.send(&join).await {
        warn!(error = %e, %pin, "presence announce failed");
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
