//! The per-conversation session actor.
//!
//! One tokio task owns the [`SessionState`] for an open conversation.
//! External code talks to it through a typed command channel and observes
//! the message list through a watch channel; teardown is a watch flag the
//! loop races every await against, so no tick result is applied after the
//! conversation view is gone.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use plauder_shared::{ChatId, Identity, Message};
use plauder_store::Database;

use crate::error::{Result, SyncError};
use crate::remote::{ChatApi, Connectivity, Outgoing};
use crate::session::SessionState;

/// Synchronizer tuning knobs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fixed interval between poll ticks while the conversation is open.
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Commands sent *into* the session task.
enum SessionCommand {
    Send {
        outgoing: Outgoing,
        reply: oneshot::Sender<Result<()>>,
    },
    Refresh {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Handle to a running conversation session.
///
/// Dropping the handle tears the session down; [`SessionHandle::close`]
/// additionally waits until the task has exited.
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
    view_rx: watch::Receiver<Vec<Message>>,
    close_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl SessionHandle {
    /// Subscribe to the ordered message list.
    pub fn messages(&self) -> watch::Receiver<Vec<Message>> {
        self.view_rx.clone()
    }

    /// Submit an outgoing message. Send failures (transport error or
    /// non-success acknowledgment) are surfaced here after the optimistic
    /// placeholder has been rolled back.
    pub async fn send(&self, outgoing: Outgoing) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(SessionCommand::Send { outgoing, reply })
            .await
            .map_err(|_| SyncError::SessionClosed)?;
        reply_rx.await.map_err(|_| SyncError::SessionClosed)?
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Outgoing::text(text)).await
    }

    /// Force a full refresh outside the poll schedule.
    pub async fn refresh(&self) -> Result<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(SessionCommand::Refresh { reply })
            .await
            .map_err(|_| SyncError::SessionClosed)?;
        reply_rx.await.map_err(|_| SyncError::SessionClosed)?
    }

    /// Tear the session down and wait for the task to exit. Any in-flight
    /// poll tick is abandoned, its result discarded.
    pub async fn close(self) {
        let _ = self.close_tx.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the session task for one conversation.
///
/// The task performs the initial load (cache first, then full refresh) and
/// then polls on `config.poll_interval` until torn down.
pub fn spawn_session(
    chat_id: ChatId,
    identity: Identity,
    store: Arc<Mutex<Database>>,
    api: Arc<dyn ChatApi>,
    connectivity: Arc<dyn Connectivity>,
    config: SyncConfig,
) -> SessionHandle {
    let mut state = SessionState::new(chat_id.clone(), identity, store, api, connectivity);
    let view_rx = state.subscribe();

    let (cmd_tx, mut cmd_rx) = mpsc::channel::<SessionCommand>(16);
    let (close_tx, mut close_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = close_rx.changed() => return,
            res = state.open() => {
                if let Err(e) = res {
                    warn!(chat_id = %chat_id, error = %e, "initial load failed");
                }
            }
        }

        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + config.poll_interval, config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = close_rx.changed() => break,
                cmd = cmd_rx.recv() => match cmd {
                    None => break,
                    Some(SessionCommand::Send { outgoing, reply }) => {
                        let _ = reply.send(state.send(outgoing).await);
                    }
                    Some(SessionCommand::Refresh { reply }) => {
                        let _ = reply.send(state.refresh().await);
                    }
                },
                _ = ticker.tick() => {
                    // Race the tick against teardown: a result arriving
                    // after close must be discarded, not merged.
                    tokio::select! {
                        biased;
                        _ = close_rx.changed() => break,
                        res = state.poll_once() => {
                            if let Err(e) = res {
                                debug!(chat_id = %chat_id, error = %e, "poll tick failed, retrying next interval");
                            }
                        }
                    }
                }
            }
        }

        debug!(chat_id = %chat_id, "session torn down");
    });

    SessionHandle {
        cmd_tx,
        view_rx,
        close_tx,
        task,
    }
}
