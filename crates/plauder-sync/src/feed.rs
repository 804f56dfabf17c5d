//! Conversation feed: the cached-then-refreshed chat list.
//!
//! Renders from the cache immediately (offline-capable), refreshes the list
//! from the server when connectivity allows, and builds per-conversation
//! previews from the temporally-last cached message. Leaving is open to any
//! member; deleting is gated on the owner role.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use plauder_shared::{ChatId, Conversation, Message, Role};
use plauder_store::Database;

use crate::error::{Result, SyncError};
use crate::remote::{ChatApi, Connectivity};

/// A conversation-list entry with its preview message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationPreview {
    pub conversation: Conversation,
    pub last_message: Option<Message>,
}

pub struct Feed {
    store: Arc<Mutex<Database>>,
    api: Arc<dyn ChatApi>,
    connectivity: Arc<dyn Connectivity>,
}

impl Feed {
    pub fn new(
        store: Arc<Mutex<Database>>,
        api: Arc<dyn ChatApi>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        Self {
            store,
            api,
            connectivity,
        }
    }

    /// The last persisted conversation list with previews, without touching
    /// the network.
    pub fn cached(&self) -> Result<Vec<ConversationPreview>> {
        let store = self.lock_store()?;
        let list = store.get_conversations()?;
        Self::previews(&store, list)
    }

    /// Refresh the conversation list from the server and persist it. While
    /// offline this degrades to the cached list. A fetch failure keeps the
    /// cached list too, but is surfaced.
    pub async fn refresh(&self) -> Result<Vec<ConversationPreview>> {
        if !self.connectivity.is_online() {
            debug!("offline, serving cached conversation list");
            return self.cached();
        }

        let list = self.api.fetch_conversations().await?;

        let store = self.lock_store()?;
        if let Err(e) = store.set_conversations(&list) {
            warn!(error = %e, "conversation cache write failed, serving fetched list");
        }
        Self::previews(&store, list)
    }

    /// Look a conversation up, refreshing from the server when online.
    /// Returns [`SyncError::ConversationGone`] when the server no longer
    /// lists it (e.g. deleted by its owner elsewhere).
    pub async fn resolve(&self, chat_id: &ChatId) -> Result<Conversation> {
        let list = if self.connectivity.is_online() {
            let fetched = self.api.fetch_conversations().await?;
            let store = self.lock_store()?;
            if let Err(e) = store.set_conversations(&fetched) {
                warn!(error = %e, "conversation cache write failed");
            }
            fetched
        } else {
            self.lock_store()?.get_conversations()?
        };

        list.into_iter()
            .find(|c| &c.id == chat_id)
            .ok_or(SyncError::ConversationGone)
    }

    /// Leave a conversation. On acknowledgment the conversation and its
    /// cached messages and watermark are dropped locally.
    pub async fn leave(&self, chat_id: &ChatId) -> Result<()> {
        let ack = self.api.leave_conversation(chat_id).await?;
        if !ack.ok {
            return Err(SyncError::SendRejected(
                ack.detail.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        self.drop_locally(chat_id)
    }

    /// Delete a conversation. Only the owner may delete; everyone else gets
    /// [`SyncError::NotOwner`] without a server round trip.
    pub async fn delete(&self, chat_id: &ChatId) -> Result<()> {
        let role = self
            .lock_store()?
            .get_conversations()?
            .into_iter()
            .find(|c| &c.id == chat_id)
            .map(|c| c.role)
            .unwrap_or_default();
        if role != Role::Owner {
            return Err(SyncError::NotOwner);
        }

        let ack = self.api.delete_conversation(chat_id).await?;
        if !ack.ok {
            return Err(SyncError::SendRejected(
                ack.detail.unwrap_or_else(|| "unknown error".into()),
            ));
        }
        self.drop_locally(chat_id)
    }

    fn drop_locally(&self, chat_id: &ChatId) -> Result<()> {
        let mut store = self.lock_store()?;

        let remaining: Vec<Conversation> = store
            .get_conversations()?
            .into_iter()
            .filter(|c| &c.id != chat_id)
            .collect();
        store.set_conversations(&remaining)?;
        store.remove_conversation_data(chat_id)?;

        debug!(chat_id = %chat_id, "conversation removed locally");
        Ok(())
    }

    fn previews(store: &Database, list: Vec<Conversation>) -> Result<Vec<ConversationPreview>> {
        list.into_iter()
            .map(|conversation| {
                let last_message = store.get_last_message(&conversation.id)?;
                Ok(ConversationPreview {
                    conversation,
                    last_message,
                })
            })
            .collect()
    }

    fn lock_store(&self) -> Result<MutexGuard<'_, Database>> {
        self.store.lock().map_err(|_| SyncError::StoreUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::AlwaysOnline;
    use crate::testutil::{msg, MockApi, SwitchedOnline};

    use std::sync::atomic::Ordering;

    fn test_store() -> (tempfile::TempDir, Arc<Mutex<Database>>) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, Arc::new(Mutex::new(db)))
    }

    fn conv(id: &str, name: &str, role: Role) -> Conversation {
        Conversation {
            id: ChatId::from(id),
            name: name.into(),
            role,
        }
    }

    #[tokio::test]
    async fn refresh_caches_list_and_builds_previews() {
        let (_dir, store) = test_store();
        {
            let mut db = store.lock().unwrap();
            db.set_messages(
                &ChatId::from("c1"),
                &[msg("1", "2024-01-01T10:00:00Z", "hallo zusammen")],
            )
            .unwrap();
        }

        let api = Arc::new(MockApi::default());
        api.set_conversations(vec![
            conv("c1", "Allgemein", Role::Owner),
            conv("c2", "Projekt", Role::Member),
        ]);

        let feed = Feed::new(store.clone(), api, Arc::new(AlwaysOnline));
        let previews = feed.refresh().await.unwrap();

        assert_eq!(previews.len(), 2);
        assert_eq!(
            previews[0]
                .last_message
                .as_ref()
                .and_then(|m| m.content.as_deref()),
            Some("hallo zusammen")
        );
        assert!(previews[1].last_message.is_none());

        // List was persisted for offline use.
        assert_eq!(store.lock().unwrap().get_conversations().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn offline_refresh_serves_cache_without_fetching() {
        let (_dir, store) = test_store();
        store
            .lock()
            .unwrap()
            .set_conversations(&[conv("c1", "Allgemein", Role::Member)])
            .unwrap();

        let api = Arc::new(MockApi::default());
        let feed = Feed::new(store, api.clone(), Arc::new(SwitchedOnline::new(false)));

        let previews = feed.refresh().await.unwrap();
        assert_eq!(previews.len(), 1);
        assert_eq!(api.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolve_reports_vanished_conversation() {
        let (_dir, store) = test_store();
        let api = Arc::new(MockApi::default());
        api.set_conversations(vec![conv("c1", "Allgemein", Role::Member)]);

        let feed = Feed::new(store, api, Arc::new(AlwaysOnline));

        assert!(feed.resolve(&ChatId::from("c1")).await.is_ok());
        assert!(matches!(
            feed.resolve(&ChatId::from("gone")).await,
            Err(SyncError::ConversationGone)
        ));
    }

    #[tokio::test]
    async fn delete_requires_owner_role() {
        let (_dir, store) = test_store();
        store
            .lock()
            .unwrap()
            .set_conversations(&[conv("c1", "Allgemein", Role::Member)])
            .unwrap();

        let api = Arc::new(MockApi::default());
        let feed = Feed::new(store, api.clone(), Arc::new(AlwaysOnline));

        assert!(matches!(
            feed.delete(&ChatId::from("c1")).await,
            Err(SyncError::NotOwner)
        ));
        assert_eq!(api.membership_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn leave_drops_local_state() {
        let (_dir, store) = test_store();
        {
            let mut db = store.lock().unwrap();
            db.set_conversations(&[
                conv("c1", "Allgemein", Role::Member),
                conv("c2", "Projekt", Role::Member),
            ])
            .unwrap();
            db.set_messages(
                &ChatId::from("c1"),
                &[msg("1", "2024-01-01T10:00:00Z", "tschüss")],
            )
            .unwrap();
        }

        let api = Arc::new(MockApi::default());
        let feed = Feed::new(store.clone(), api, Arc::new(AlwaysOnline));

        feed.leave(&ChatId::from("c1")).await.unwrap();

        let db = store.lock().unwrap();
        let remaining = db.get_conversations().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, ChatId::from("c2"));
        assert!(db.get_messages(&ChatId::from("c1")).unwrap().is_empty());
        assert_eq!(db.get_watermark(&ChatId::from("c1")).unwrap(), 0);
    }
}
