//! Attachment controller: one overlay per live background surface

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::host::{HostContext, HostEvent};
use crate::overlay::LogoOverlay;
use crate::types::{ImageId, SurfaceId};

/// Tracks the set of live background surfaces and owns one [`LogoOverlay`]
/// per surface.
///
/// The host calls [`enable`](Self::enable)/[`disable`](Self::disable) from
/// its plugin lifecycle hooks and forwards change notifications to
/// [`handle_event`](Self::handle_event) from its event loop. Failures are
/// absorbed and logged per overlay; nothing escapes into the host loop.
#[derive(Debug, Default)]
pub struct OverlayManager {
    overlays: HashMap<SurfaceId, LogoOverlay>,
    enabled: bool,
}

impl OverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Surfaces that currently carry an overlay.
    pub fn attached_surfaces(&self) -> Vec<SurfaceId> {
        let mut surfaces: Vec<SurfaceId> = self.overlays.keys().copied().collect();
        surfaces.sort_unstable();
        surfaces
    }

    /// Activate the feature and attach to every live surface.
    pub fn enable(&mut self, ctx: &HostContext<'_>) {
        if self.enabled {
            warn!("enable called while already enabled, resynchronizing");
        }
        self.enabled = true;
        self.attach_all(ctx);
    }

    /// Deactivate: destroy every overlay and stop reacting to host events.
    /// Reverses every observable effect of [`enable`](Self::enable).
    pub fn disable(&mut self, ctx: &HostContext<'_>) {
        self.detach_all(ctx);
        self.enabled = false;
        info!("logo overlays disabled");
    }

    /// Route one host notification. No-op while disabled.
    pub fn handle_event(&mut self, ctx: &HostContext<'_>, event: HostEvent) {
        if !self.enabled {
            return;
        }
        match event {
            HostEvent::PrefChanged(key) => {
                for overlay in self.overlays.values_mut() {
                    if let Err(err) = overlay.on_pref_changed(ctx, key) {
                        error!(
                            surface = overlay.surface(),
                            key = key.name(),
                            error = ?err,
                            "preference update failed"
                        );
                    }
                }
            }
            HostEvent::MonitorsChanged | HostEvent::StartupPrepared => {
                // The host rebuilds its surfaces wholesale around these
                // events, so reconciliation is a full teardown and rebuild.
                self.attach_all(ctx);
            }
            HostEvent::SurfaceCreated(surface) => {
                self.attach(ctx, surface);
            }
            HostEvent::SurfaceDestroyed {
                surface,
                replacement,
            } => {
                let Some(mut overlay) = self.overlays.remove(&surface) else {
                    return;
                };
                match replacement {
                    Some(new_surface) => {
                        if let Err(err) = overlay.rebind(ctx, new_surface) {
                            error!(
                                surface = new_surface,
                                error = ?err,
                                "rebind failed, destroying overlay"
                            );
                            overlay.destroy(ctx);
                            return;
                        }
                        self.overlays.insert(new_surface, overlay);
                    }
                    None => overlay.destroy(ctx),
                }
            }
            HostEvent::SurfaceChanged(surface) => {
                if let Some(overlay) = self.overlays.get_mut(&surface)
                    && let Err(err) = overlay.on_surface_changed(ctx)
                {
                    error!(surface = surface, error = ?err, "surface change update failed");
                }
            }
            HostEvent::ImageReady(image) => self.dispatch_image_ready(ctx, image),
            HostEvent::ImageFileChanged(path) => {
                for overlay in self.overlays.values_mut() {
                    if let Err(err) = overlay.on_file_changed(ctx, &path) {
                        error!(
                            surface = overlay.surface(),
                            error = ?err,
                            "file change reload failed"
                        );
                    }
                }
            }
        }
    }

    fn dispatch_image_ready(&mut self, ctx: &HostContext<'_>, image: ImageId) {
        // The completion may belong to an overlay destroyed while the load
        // was in flight; such handles match nothing and are dropped here.
        let Some(overlay) = self
            .overlays
            .values_mut()
            .find(|overlay| overlay.owns_image(image))
        else {
            debug!(image = image, "image ready for no live overlay, discarding");
            return;
        };
        if let Err(err) = overlay.on_image_ready(ctx, image) {
            error!(
                surface = overlay.surface(),
                image = image,
                error = ?err,
                "deferred scale update failed"
            );
        }
    }

    fn attach(&mut self, ctx: &HostContext<'_>, surface: SurfaceId) {
        if let Some(mut stale) = self.overlays.remove(&surface) {
            // Exactly one overlay per surface; a stale entry means the host
            // reused the id without a destroy notification.
            warn!(surface = surface, "replacing stale overlay for reused surface id");
            stale.destroy(ctx);
        }
        match LogoOverlay::new(ctx, surface) {
            Ok(overlay) => {
                self.overlays.insert(surface, overlay);
            }
            Err(err) => {
                // A surface that cannot be queried gets no overlay; the next
                // layout event retries.
                error!(surface = surface, error = ?err, "failed to attach overlay");
            }
        }
    }

    fn attach_all(&mut self, ctx: &HostContext<'_>) {
        self.detach_all(ctx);
        for surface in ctx.surfaces.surfaces() {
            self.attach(ctx, surface);
        }
        info!(overlays = self.overlays.len(), "resynchronized logo overlays");
    }

    fn detach_all(&mut self, ctx: &HostContext<'_>) {
        for (_, mut overlay) in self.overlays.drain() {
            overlay.destroy(ctx);
        }
    }
}
