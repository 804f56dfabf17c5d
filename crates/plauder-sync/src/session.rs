//! Per-conversation synchronization state.
//!
//! [`SessionState`] reconciles three sources of truth for one conversation:
//! the persisted cache, freshly fetched server state, and locally-pending
//! optimistic placeholders. All mutation paths (initial load, poll tick,
//! send reconciliation) funnel through the same merge, so they converge to
//! the same list regardless of arrival order.
//!
//! Placeholders live only in the in-memory view; the cache never sees them.
//! Storage failures degrade the affected operation to memory-only and are
//! logged, never fatal. Fetch failures leave the current view untouched.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use plauder_shared::merge::{max_numeric_id, merge_by_id, only_new};
use plauder_shared::{ChatId, Identity, Message, MessageId};
use plauder_store::Database;

use crate::error::{Result, SyncError};
use crate::remote::{ChatApi, Connectivity, Outgoing};

pub struct SessionState {
    chat_id: ChatId,
    identity: Identity,
    store: Arc<Mutex<Database>>,
    api: Arc<dyn ChatApi>,
    connectivity: Arc<dyn Connectivity>,

    /// In-memory view, sorted, including unconfirmed placeholders.
    messages: Vec<Message>,
    /// Incremental-fetch cursor: highest confirmed numeric message id.
    last_from_id: u64,

    view_tx: watch::Sender<Vec<Message>>,
}

impl SessionState {
    pub fn new(
        chat_id: ChatId,
        identity: Identity,
        store: Arc<Mutex<Database>>,
        api: Arc<dyn ChatApi>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        let (view_tx, _) = watch::channel(Vec::new());
        Self {
            chat_id,
            identity,
            store,
            api,
            connectivity,
            messages: Vec::new(),
            last_from_id: 0,
            view_tx,
        }
    }

    /// Subscribe to the ordered message list. Receivers see every published
    /// state change, including optimistic placeholders.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.view_tx.subscribe()
    }

    /// Current view snapshot.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of placeholders still awaiting server confirmation. A
    /// placeholder with no matching server message remains pending
    /// indefinitely; any timeout policy is the caller's decision.
    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_placeholder()).count()
    }

    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }

    /// Initial load: cached view first (offline-capable), then a full
    /// refresh. A refresh failure keeps the cache-provisioned view; it is
    /// only surfaced when there was no cache to fall back on.
    pub async fn open(&mut self) -> Result<()> {
        let had_cache = self.load_cached();

        match self.refresh().await {
            Ok(()) => Ok(()),
            Err(e) if had_cache => {
                warn!(chat_id = %self.chat_id, error = %e, "refresh failed, keeping cached view");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Populate the view from the cache. Returns whether anything was
    /// cached. Storage failures degrade to an empty in-memory view.
    pub fn load_cached(&mut self) -> bool {
        let loaded = (|| -> Result<(Vec<Message>, u64)> {
            let store = self.lock_store()?;
            Ok((
                store.get_messages(&self.chat_id)?,
                store.get_watermark(&self.chat_id)?,
            ))
        })();

        match loaded {
            Ok((messages, watermark)) => {
                self.messages = messages;
                self.last_from_id = watermark;
                self.publish();
                !self.messages.is_empty()
            }
            Err(e) => {
                warn!(chat_id = %self.chat_id, error = %e, "cache read failed, memory-only view");
                false
            }
        }
    }

    /// Full refresh: fetch everything from id 0 and replace the confirmed
    /// part of the view with the authoritative server list. Pending
    /// placeholders are reconciled against the fetch and the survivors are
    /// folded back in.
    pub async fn refresh(&mut self) -> Result<()> {
        let fetched = self.api.fetch_messages(&self.chat_id, 0).await?;

        self.reconcile_placeholders(&fetched);

        let authoritative = merge_by_id(&[], &fetched);
        let placeholders: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.is_placeholder())
            .cloned()
            .collect();

        self.messages = merge_by_id(&authoritative, &placeholders);
        self.last_from_id = max_numeric_id(&authoritative).max(self.last_from_id);

        self.persist_replace(&authoritative);
        self.publish();

        debug!(chat_id = %self.chat_id, messages = self.messages.len(), watermark = self.last_from_id, "refreshed");
        Ok(())
    }

    /// One poll tick: fetch messages since the watermark and fold in
    /// anything new. A no-op while offline (no request issued). Returns
    /// whether the view changed.
    pub async fn poll_once(&mut self) -> Result<bool> {
        if !self.connectivity.is_online() {
            trace!(chat_id = %self.chat_id, "offline, skipping poll tick");
            return Ok(false);
        }

        let fetched = self
            .api
            .fetch_messages(&self.chat_id, self.last_from_id)
            .await?;
        Ok(self.apply_incremental(fetched))
    }

    /// Optimistic send: insert a placeholder immediately, dispatch, then
    /// reconcile against a look-behind fetch. On any send failure the
    /// placeholder is rolled back and the failure surfaced.
    pub async fn send(&mut self, outgoing: Outgoing) -> Result<()> {
        let content = outgoing
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);

        if content.is_none() && outgoing.image.is_none() {
            return Err(SyncError::EmptySend);
        }

        let placeholder = Message {
            id: MessageId::placeholder(),
            chat_id: self.chat_id.clone(),
            sender: self.identity.user_id.clone(),
            content: content.clone(),
            image_url: outgoing.image.as_ref().and_then(|i| i.preview_url.clone()),
            created_at: Utc::now().to_rfc3339(),
        };
        let placeholder_id = placeholder.id.clone();

        self.messages.push(placeholder);
        self.publish();

        let dispatched = match &outgoing.image {
            Some(image) => {
                self.api
                    .send_image(&self.chat_id, &image.png, content.as_deref())
                    .await
            }
            None => {
                // Checked above: no image implies text.
                self.api
                    .send_text(&self.chat_id, content.as_deref().unwrap_or_default())
                    .await
            }
        };

        match dispatched {
            Ok(ack) if ack.ok => {}
            Ok(ack) => {
                self.rollback(&placeholder_id);
                return Err(SyncError::SendRejected(
                    ack.detail.unwrap_or_else(|| "unknown error".into()),
                ));
            }
            Err(e) => {
                self.rollback(&placeholder_id);
                return Err(e);
            }
        }

        // Look behind by one to tolerate off-by-one server numbering.
        let from = self.last_from_id.saturating_sub(1);
        match self.api.fetch_messages(&self.chat_id, from).await {
            Ok(fetched) => {
                self.apply_incremental(fetched);
            }
            Err(e) => {
                // The send itself succeeded; the next poll tick will
                // confirm the placeholder.
                debug!(chat_id = %self.chat_id, error = %e, "reconcile fetch failed, placeholder stays pending");
            }
        }

        Ok(())
    }

    /// Fold a fetched batch into the view: reconcile placeholders, merge
    /// unseen messages, advance the watermark, persist. Returns whether
    /// anything changed; an empty or fully-known batch writes nothing.
    fn apply_incremental(&mut self, fetched: Vec<Message>) -> bool {
        if fetched.is_empty() {
            return false;
        }

        let reconciled = self.reconcile_placeholders(&fetched);
        let fresh = only_new(&self.messages, &fetched);

        if fresh.is_empty() && reconciled == 0 {
            return false;
        }

        if !fresh.is_empty() {
            self.messages = merge_by_id(&self.messages, &fresh);
            self.last_from_id = max_numeric_id(&self.messages).max(self.last_from_id);
            self.persist_append(&fresh);
        }

        self.publish();
        true
    }

    /// Remove placeholders confirmed by server-authored counterparts in
    /// `fetched`: same sender (the local actor) and equal content. At most
    /// one placeholder per distinct content is reconciled per batch.
    fn reconcile_placeholders(&mut self, fetched: &[Message]) -> usize {
        if !self.messages.iter().any(|m| m.is_placeholder()) {
            return 0;
        }

        let mut consumed: HashSet<String> = HashSet::new();
        let mut removed = 0;

        for server_msg in fetched {
            if server_msg.is_placeholder() || !self.identity.matches_sender(&server_msg.sender) {
                continue;
            }
            let key = server_msg.content.clone().unwrap_or_default();
            if !consumed.insert(key.clone()) {
                continue;
            }

            let position = self.messages.iter().position(|m| {
                m.is_placeholder()
                    && self.identity.matches_sender(&m.sender)
                    && m.content.as_deref().unwrap_or_default() == key
            });
            if let Some(index) = position {
                let confirmed = self.messages.remove(index);
                debug!(chat_id = %self.chat_id, placeholder = %confirmed.id, server_id = %server_msg.id, "placeholder confirmed");
                removed += 1;
            }
        }

        removed
    }

    fn rollback(&mut self, placeholder_id: &MessageId) {
        self.messages.retain(|m| &m.id != placeholder_id);
        self.publish();
    }

    /// Persist the confirmed (non-placeholder) part of the view, replacing
    /// the stored list. Errors degrade to memory-only.
    fn persist_replace(&self, confirmed: &[Message]) {
        let result = (|| -> Result<()> {
            let mut store = self.lock_store()?;
            store.set_messages(&self.chat_id, confirmed)?;
            Ok(())
        })();
        if let Err(e) = result {
            warn!(chat_id = %self.chat_id, error = %e, "cache write failed, memory-only");
        }
    }

    /// Merge freshly confirmed messages into the persisted list. Errors
    /// degrade to memory-only.
    fn persist_append(&self, fresh: &[Message]) {
        let result = (|| -> Result<()> {
            let mut store = self.lock_store()?;
            store.append_messages(&self.chat_id, fresh)?;
            Ok(())
        })();
        if let Err(e) = result {
            warn!(chat_id = %self.chat_id, error = %e, "cache write failed, memory-only");
        }
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, Database>> {
        self.store.lock().map_err(|_| SyncError::StoreUnavailable)
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.messages.clone());
    }
}
