use super::notifier::{ChangeEvent, Subscription};
use tracing::debug;

/// What a session should do about an incoming change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationAction {
    /// No local edits: refetch and swap the model now.
    RefreshNow,
    /// Local edits pending: refresh once the edit session ends.
    Deferred,
    /// Our own write, another album, or a version we already hold.
    Ignored,
}

/// Decides when remote changes may replace a session's working model.
pub struct RealtimeInvalidator {
    subscription: Subscription,
    session_id: String,
    pending_refresh: bool,
}

impl RealtimeInvalidator {
    pub fn new(subscription: Subscription, session_id: impl Into<String>) -> Self {
        Self {
            subscription,
            session_id: session_id.into(),
            pending_refresh: false,
        }
    }

    pub fn album_id(&self) -> &str {
        self.subscription.album_id()
    }

    pub fn on_change(
        &mut self,
        event: &ChangeEvent,
        has_unsaved_edits: bool,
        current_version: i64,
    ) -> InvalidationAction {
        if event.album_id != self.subscription.album_id()
            || event.origin_session.as_deref() == Some(self.session_id.as_str())
            || event.version <= current_version
        {
            return InvalidationAction::Ignored;
        }
        if has_unsaved_edits {
            debug!(
                "Deferring refresh of album {} to version {} until local edits end",
                event.album_id, event.version
            );
            self.pending_refresh = true;
            return InvalidationAction::Deferred;
        }
        InvalidationAction::RefreshNow
    }

    /// Called when local edits are saved or discarded. Returns whether a
    /// deferred refresh is now due.
    pub fn on_edit_session_end(&mut self) -> bool {
        std::mem::take(&mut self.pending_refresh)
    }

    /// Puts back a deferred refresh that could not run.
    pub fn keep_pending_refresh(&mut self) {
        self.pending_refresh = true;
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.pending_refresh
    }

    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        self.subscription.try_recv()
    }

    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        self.subscription.recv().await
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn unsubscribe(&mut self) {
        self.subscription.unsubscribe();
        self.pending_refresh = false;
    }
}
