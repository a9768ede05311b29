use super::history::EditHistory;
use super::liveness::Liveness;
use super::upload::{AssetUploader, UploadFile};
use crate::adapters::{ConversionWarning, SchemaVariant};
use crate::error::{AlbumError, AlbumResult};
use crate::layout::{add_asset, Album, NewAsset, ValidationError, ValidationResult};
use crate::realtime::{ChangeEvent, InvalidationAction, RealtimeInvalidator};
use crate::service::{AlbumDataService, AlbumDocument};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A save running detached from its session.
pub struct BackgroundSave {
    pub handle: JoinHandle<AlbumResult<i64>>,
    /// The album as it was handed to the save.
    pub snapshot: Album,
    pub liveness: Liveness,
}

/// One open album: the working copy, its history, and its subscription.
pub struct EditorSession {
    service: Arc<AlbumDataService>,
    session_id: String,
    album: Album,
    version: i64,
    loaded_variant: SchemaVariant,
    warnings: Vec<ConversionWarning>,
    history: EditHistory,
    dirty: bool,
    invalidator: RealtimeInvalidator,
    liveness: Liveness,
}

impl EditorSession {
    pub async fn open(
        service: Arc<AlbumDataService>,
        album_id: &str,
        history_capacity: usize,
    ) -> AlbumResult<Self> {
        let session_id = Uuid::new_v4().to_string();
        // subscribe first so nothing published during the fetch is missed
        let subscription = service.notifier().subscribe(album_id);
        let invalidator = RealtimeInvalidator::new(subscription, session_id.clone());
        let doc = service.fetch_album(album_id).await?;
        debug!(
            "Session {} opened album {} at version {}",
            session_id, album_id, doc.version
        );

        Ok(Self {
            service,
            session_id,
            album: doc.album,
            version: doc.version,
            loaded_variant: doc.variant,
            warnings: doc.warnings,
            history: EditHistory::new(history_capacity),
            dirty: false,
            invalidator,
            liveness: Liveness::new(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn album_id(&self) -> &str {
        &self.album.id
    }

    pub fn album(&self) -> &Album {
        &self.album
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    /// Storage shape the album was last loaded from.
    pub fn loaded_variant(&self) -> SchemaVariant {
        self.loaded_variant
    }

    pub fn warnings(&self) -> &[ConversionWarning] {
        &self.warnings
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn has_pending_refresh(&self) -> bool {
        self.invalidator.has_pending_refresh()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    /// Applies one command to the working copy as a single undoable step.
    pub fn edit<T>(
        &mut self,
        f: impl FnOnce(&mut Album) -> ValidationResult<T>,
    ) -> AlbumResult<T> {
        let mut candidate = self.album.clone();
        let out = f(&mut candidate)?;
        let prior = std::mem::replace(&mut self.album, candidate);
        self.history.push(prior);
        self.dirty = true;
        Ok(out)
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        self.album = self.history.undo(self.album.clone());
        self.dirty = true;
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        self.album = self.history.redo(self.album.clone());
        self.dirty = true;
        true
    }

    /// Saves the working copy against the version it was loaded at.
    ///
    /// On failure the working copy and dirty flag are left as they were. A
    /// deferred refresh that fails after a successful save stays pending.
    pub async fn save(&mut self) -> AlbumResult<i64> {
        let album_id = self.album.id.clone();
        let version = self
            .service
            .save_album(&album_id, &self.album, self.version, Some(&self.session_id))
            .await?;
        self.version = version;
        self.dirty = false;
        self.run_deferred_refresh().await;
        Ok(version)
    }

    async fn run_deferred_refresh(&mut self) {
        if !self.invalidator.on_edit_session_end() {
            return;
        }
        if let Err(e) = self.refresh().await {
            warn!(
                "Session {} could not refresh album {} after saving: {}",
                self.session_id, self.album.id, e
            );
            self.invalidator.keep_pending_refresh();
        }
    }

    /// Drops local edits and reloads the stored album.
    pub async fn discard(&mut self) -> AlbumResult<()> {
        self.invalidator.on_edit_session_end();
        self.refresh().await
    }

    async fn refresh(&mut self) -> AlbumResult<()> {
        let AlbumDocument {
            album,
            version,
            variant,
            warnings,
        } = self.service.fetch_album(&self.album.id).await?;
        info!(
            "Session {} refreshed album {} to version {}",
            self.session_id, album.id, version
        );
        self.album = album;
        self.version = version;
        self.loaded_variant = variant;
        self.warnings = warnings;
        // snapshots of a superseded version must not come back
        self.history.clear();
        self.dirty = false;
        Ok(())
    }

    fn decide(&mut self, event: &ChangeEvent) -> InvalidationAction {
        self.invalidator.on_change(event, self.dirty, self.version)
    }

    /// Handles every change event already delivered. Returns whether the
    /// working copy was refreshed.
    pub async fn process_notifications(&mut self) -> AlbumResult<bool> {
        let mut refresh = false;
        while let Some(event) = self.invalidator.try_next() {
            if self.decide(&event) == InvalidationAction::RefreshNow {
                refresh = true;
            }
        }
        if refresh {
            self.refresh().await?;
        }
        Ok(refresh)
    }

    /// Waits for the next change event and handles it. Returns `None` once
    /// the session is closed.
    pub async fn next_notification(&mut self) -> AlbumResult<Option<InvalidationAction>> {
        let Some(event) = self.invalidator.next_event().await else {
            return Ok(None);
        };
        let action = self.decide(&event);
        if action == InvalidationAction::RefreshNow {
            self.refresh().await?;
        }
        Ok(Some(action))
    }

    /// Starts a save that keeps running even if the session goes away.
    pub fn save_in_background(&self) -> BackgroundSave {
        let service = self.service.clone();
        let snapshot = self.album.clone();
        let album = snapshot.clone();
        let expected_version = self.version;
        let session_id = self.session_id.clone();

        let handle = tokio::spawn(async move {
            service
                .save_album(&album.id, &album, expected_version, Some(&session_id))
                .await
        });
        BackgroundSave {
            handle,
            snapshot,
            liveness: self.liveness.clone(),
        }
    }

    /// Records the outcome of a background save of `snapshot`.
    pub async fn apply_background_save(
        &mut self,
        snapshot: &Album,
        version: i64,
    ) -> AlbumResult<()> {
        if version <= self.version {
            return Ok(());
        }
        self.version = version;
        if self.album == *snapshot {
            self.dirty = false;
            self.run_deferred_refresh().await;
        }
        Ok(())
    }

    /// Uploads `file` and adds it to a page as one undoable edit.
    pub async fn add_uploaded_asset(
        &mut self,
        uploader: &dyn AssetUploader,
        page_number: u32,
        file: UploadFile,
        template: NewAsset,
    ) -> AlbumResult<String> {
        if self.album.page(page_number).is_none() {
            return Err(ValidationError::PageNotFound(page_number).into());
        }
        let url = uploader.upload(file).await.map_err(AlbumError::Upload)?;
        self.edit(|album| {
            add_asset(
                album,
                page_number,
                NewAsset {
                    content: url,
                    ..template
                },
            )
        })
    }

    /// Unsubscribes and marks detached work as orphaned.
    pub fn close(&mut self) {
        self.invalidator.unsubscribe();
        self.liveness.mark_dead();
    }

    pub fn is_open(&self) -> bool {
        self.liveness.is_alive()
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.close();
    }
}
