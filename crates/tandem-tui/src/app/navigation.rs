//! Listing loads, cache consultation and directory movement.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use tandem_core::entry::DirListing;
use tandem_core::error::{FsError, FsErrorKind};
use tandem_fs::adapter;

use crate::panel::Side;

use super::App;

impl App {
    /// Produce a listing for `path`, consulting the cache unless `force`.
    ///
    /// The cache stores raw adapter listings; panels sort and decorate
    /// their own copies.
    pub(crate) async fn load_listing(
        &mut self,
        path: &PathBuf,
        force: bool,
    ) -> Result<Arc<DirListing>, FsError> {
        let show_hidden = self.config.general.show_hidden;
        let key = (path.clone(), show_hidden);
        let cache_enabled = self.config.cache.enabled && !force;

        if cache_enabled {
            if let Some(listing) = self.cache.get(&key, Instant::now()) {
                debug!(path = %path.display(), "listing served from cache");
                return Ok(listing);
            }
        }

        let listing = Arc::new(adapter::list_dir(path, show_hidden).await?);
        if self.config.cache.enabled {
            self.cache.put(key, Arc::clone(&listing), Instant::now());
        }
        Ok(listing)
    }

    /// Reload one panel's listing in place.
    pub(crate) async fn reload_panel(&mut self, side: Side, force: bool) -> Result<(), FsError> {
        let path = self.panel(side).cwd.clone();
        let listing = self.load_listing(&path, force).await?;
        self.panel_mut(side).apply_listing(&listing);
        self.mark_panel_dirty(side);
        Ok(())
    }

    /// Enter the directory under the cursor (or an explicit target).
    ///
    /// The listing is loaded before any state changes, so a failed load
    /// (permissions, vanished directory) leaves the panel where it was.
    pub(crate) async fn enter_directory(&mut self, side: Side, target: PathBuf) {
        match self.load_listing(&target, false).await {
            Ok(listing) => {
                let panel = self.panel_mut(side);
                panel.enter_dir(target);
                panel.apply_listing(&listing);
                self.mark_panel_dirty(side);
            }
            Err(e) => {
                let non_fatal = matches!(
                    e.kind,
                    FsErrorKind::PermissionDenied | FsErrorKind::NotFound
                );
                self.set_status(true, e.to_string());
                if !non_fatal {
                    debug!(error = %e, "directory entry failed");
                }
            }
        }
    }

    /// Go to the parent, putting the cursor on the directory just left.
    pub(crate) async fn go_parent(&mut self, side: Side) {
        let Some(parent) = self.panel(side).cwd.parent().map(|p| p.to_path_buf()) else {
            return;
        };
        match self.load_listing(&parent, false).await {
            Ok(listing) => {
                let panel = self.panel_mut(side);
                let left = panel.go_parent();
                panel.apply_listing(&listing);
                if let Some(left) = left {
                    if let Some(index) = panel.listing.position_of(&left) {
                        panel.cursor = index;
                    }
                }
                self.mark_panel_dirty(side);
            }
            Err(e) => self.set_status(true, e.to_string()),
        }
    }

    /// History traversal in either direction.
    pub(crate) async fn traverse_history(&mut self, side: Side, back: bool) {
        // Peek the target by cloning state; the move only commits when the
        // listing loads.
        let panel = self.panel_mut(side);
        let moved = if back {
            panel.history_back()
        } else {
            panel.history_forward()
        };
        if !moved {
            return;
        }

        let target = self.panel(side).cwd.clone();
        match self.load_listing(&target, false).await {
            Ok(listing) => {
                self.panel_mut(side).apply_listing(&listing);
                self.mark_panel_dirty(side);
            }
            Err(e) => {
                // Roll the traversal back so the panel stays somewhere real.
                let panel = self.panel_mut(side);
                if back {
                    panel.history_forward();
                } else {
                    panel.history_back();
                }
                self.set_status(true, e.to_string());
            }
        }
    }

    /// Point `side` at an arbitrary directory (find result, same-dir).
    pub(crate) async fn jump_panel(&mut self, side: Side, target: PathBuf, focus: Option<PathBuf>) {
        match self.load_listing(&target, false).await {
            Ok(listing) => {
                let panel = self.panel_mut(side);
                panel.jump_to(target);
                panel.apply_listing(&listing);
                if let Some(focus) = focus {
                    if let Some(index) = panel.listing.position_of(&focus) {
                        panel.cursor = index;
                    }
                }
                self.mark_panel_dirty(side);
            }
            Err(e) => self.set_status(true, e.to_string()),
        }
    }

    /// Refresh both panels after a hidden-files toggle or theme-free
    /// config change.
    pub(crate) async fn reload_both(&mut self, force: bool) {
        for side in [Side::Left, Side::Right] {
            if let Err(e) = self.reload_panel(side, force).await {
                self.set_status(true, e.to_string());
            }
        }
    }
}
