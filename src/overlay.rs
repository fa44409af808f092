//! Per-surface logo overlay node

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::constants::{fade, opacity};
use crate::geometry;
use crate::host::{Easing, HostContext, LoadSpec, SceneGraph};
use crate::prefs::{self, PrefKey};
use crate::types::{ImageId, NodeId, Rect, SurfaceId};
use crate::visibility;

/// One logo bound to one background surface.
///
/// Owns a container node (full-bleed over the surface's work area) and an
/// inner bin carrying alignment, opacity and the scale transform. Created
/// and destroyed exclusively by
/// [`OverlayManager`](crate::manager::OverlayManager); the container is
/// parented under the surface's root node, which the host keeps alive across
/// background swaps on the same manager.
#[derive(Debug)]
pub struct LogoOverlay {
    surface: SurfaceId,
    monitor_index: usize,
    work_area: Rect,
    resource_scale: f64,
    container: NodeId,
    bin: NodeId,
    logo_file: Option<PathBuf>,
    image: Option<ImageId>,
}

/// Destroys a half-built container if overlay setup fails partway, so a
/// failing surface never leaks scene nodes.
struct NodeGuard<'a> {
    scene: &'a dyn SceneGraph,
    node: NodeId,
    armed: bool,
}

impl Drop for NodeGuard<'_> {
    fn drop(&mut self) {
        if self.armed
            && let Err(err) = self.scene.destroy_node(self.node)
        {
            error!(
                node = self.node,
                error = ?err,
                "failed to clean up container after overlay setup failure"
            );
        }
    }
}

impl LogoOverlay {
    pub fn new(ctx: &HostContext<'_>, surface: SurfaceId) -> Result<Self> {
        let monitor_index = ctx
            .surfaces
            .monitor_index(surface)
            .context("failed to query monitor index for new overlay")?;
        let work_area = ctx
            .surfaces
            .work_area(surface)
            .context("failed to query work area for new overlay")?;
        let resource_scale = ctx
            .surfaces
            .resource_scale(surface)
            .context("failed to query resource scale for new overlay")?;
        let root = ctx
            .surfaces
            .root_node(surface)
            .context("failed to query root node for new overlay")?;

        let container = ctx
            .scene
            .create_node(root)
            .context("failed to create overlay container")?;
        let mut guard = NodeGuard {
            scene: ctx.scene,
            node: container,
            armed: true,
        };

        // Invisible until the first visibility evaluation below, so the logo
        // never flashes on a wallpaper it should not appear on.
        ctx.scene
            .set_opacity(container, opacity::TRANSPARENT)
            .context("failed to initialize container opacity")?;
        ctx.scene
            .set_geometry(container, work_area)
            .context("failed to constrain container to work area")?;

        let bin = ctx
            .scene
            .create_node(container)
            .context("failed to create overlay bin")?;

        let mut overlay = Self {
            surface,
            monitor_index,
            work_area,
            resource_scale,
            container,
            bin,
            logo_file: None,
            image: None,
        };

        overlay.update_logo(ctx)?;
        overlay.update_position(ctx)?;
        overlay.update_border(ctx)?;
        overlay.update_opacity(ctx)?;
        overlay.update_visibility(ctx)?;

        guard.armed = false;
        info!(
            surface = surface,
            monitor = monitor_index,
            "attached logo overlay"
        );
        Ok(overlay)
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn monitor_index(&self) -> usize {
        self.monitor_index
    }

    pub(crate) fn owns_image(&self, image: ImageId) -> bool {
        self.image == Some(image)
    }

    #[cfg(test)]
    pub(crate) fn container(&self) -> NodeId {
        self.container
    }

    #[cfg(test)]
    pub(crate) fn bin(&self) -> NodeId {
        self.bin
    }

    /// Apply a single changed preference. Each key touches only its own
    /// policy output; unrelated axes are left as applied.
    pub fn on_pref_changed(&mut self, ctx: &HostContext<'_>, key: PrefKey) -> Result<()> {
        debug!(
            surface = self.surface,
            key = key.name(),
            "applying preference change"
        );
        match key {
            PrefKey::LogoFile => self.update_logo(ctx),
            PrefKey::LogoSize => self.update_scale(ctx),
            PrefKey::LogoPosition => self.update_position(ctx),
            PrefKey::LogoBorder => self.update_border(ctx),
            PrefKey::LogoOpacity => self.update_opacity(ctx),
            PrefKey::AlwaysVisible => self.update_visibility(ctx),
        }
    }

    /// The surface's content or brightness changed; both the effective
    /// opacity and the wallpaper-identity visibility check may shift.
    pub fn on_surface_changed(&mut self, ctx: &HostContext<'_>) -> Result<()> {
        self.update_opacity(ctx)?;
        self.update_visibility(ctx)
    }

    /// A load completed. Stale handles (loads outliving a file change or the
    /// overlay that requested them) match nothing and are discarded.
    pub fn on_image_ready(&mut self, ctx: &HostContext<'_>, image: ImageId) -> Result<()> {
        if self.image != Some(image) {
            return Ok(());
        }
        self.update_scale(ctx)
    }

    /// Bytes of a cached file changed on disk. Reload unconditionally when
    /// it is our file; this is also the retry path for a logo path that only
    /// became valid after it was configured.
    pub fn on_file_changed(&mut self, ctx: &HostContext<'_>, path: &Path) -> Result<()> {
        if self.logo_file.as_deref() != Some(path) {
            return Ok(());
        }
        debug!(
            surface = self.surface,
            path = %path.display(),
            "logo file changed on disk, reloading"
        );
        self.reload_image(ctx)
    }

    /// Follow a background swap: the owning manager replaced its surface
    /// while keeping the root container alive, so the overlay switches its
    /// binding instead of dying.
    pub fn rebind(&mut self, ctx: &HostContext<'_>, replacement: SurfaceId) -> Result<()> {
        info!(
            old = self.surface,
            new = replacement,
            "rebinding overlay to replacement surface"
        );
        self.surface = replacement;
        // The replacement may carry different content or vignette state;
        // re-evaluate once now, later changes arrive as surface events.
        self.update_opacity(ctx)?;
        self.update_visibility(ctx)
    }

    /// Release everything this overlay owns. Each resource is released
    /// independently so one failure cannot leak the rest.
    pub fn destroy(&mut self, ctx: &HostContext<'_>) {
        if let Some(image) = self.image.take()
            && let Err(err) = ctx.images.release(image)
        {
            error!(
                surface = self.surface,
                image = image,
                error = ?err,
                "failed to release logo image"
            );
        }
        if let Err(err) = ctx.scene.destroy_node(self.container) {
            error!(
                surface = self.surface,
                node = self.container,
                error = ?err,
                "failed to destroy overlay container"
            );
        }
        info!(
            surface = self.surface,
            monitor = self.monitor_index,
            "detached logo overlay"
        );
    }

    fn update_logo(&mut self, ctx: &HostContext<'_>) -> Result<()> {
        let resolved = prefs::resolve_logo_file(&ctx.prefs.logo_file());
        if resolved == self.logo_file {
            return Ok(()); // same file, nothing to reload
        }
        self.logo_file = resolved;
        self.reload_image(ctx)
    }

    /// Drop the current image and request a fresh load of the configured
    /// file. The decode width covers the top of the size schema range, so
    /// size changes only touch the scale transform and never re-decode.
    fn reload_image(&mut self, ctx: &HostContext<'_>) -> Result<()> {
        if let Some(old) = self.image.take()
            && let Err(err) = ctx.images.release(old)
        {
            error!(
                surface = self.surface,
                image = old,
                error = ?err,
                "failed to release previous logo image"
            );
        }

        let Some(path) = self.logo_file.clone() else {
            return Ok(()); // no logo configured
        };

        let spec = LoadSpec {
            max_width: geometry::max_decode_width(
                ctx.prefs.size_range_max(),
                self.work_area.width,
            ),
            max_height: -1,
            scale_factor: ctx.scene.scale_factor(),
            resource_scale: self.resource_scale,
        };
        match ctx.images.load(&path, spec) {
            Ok(image) => {
                ctx.scene
                    .add_image(self.bin, image)
                    .context("failed to attach logo image to bin")?;
                self.image = Some(image);
                // Scale is applied once the decoded size is known.
                self.update_scale(ctx)?;
            }
            Err(err) => {
                // Stay imageless until the file becomes loadable; a later
                // file-changed notification retries.
                warn!(
                    surface = self.surface,
                    path = %path.display(),
                    error = ?err,
                    "logo image load failed"
                );
            }
        }
        Ok(())
    }

    fn update_scale(&mut self, ctx: &HostContext<'_>) -> Result<()> {
        let Some(image) = self.image else {
            return Ok(());
        };
        let natural = ctx
            .images
            .natural_size(image)
            .context("failed to query decoded logo size")?;
        let Some(natural) = natural else {
            return Ok(()); // still decoding
        };
        let target = geometry::target_width(ctx.prefs.logo_size(), self.work_area.width);
        let Some(scale) = geometry::scale_factor(target, natural.width) else {
            return Ok(());
        };
        ctx.scene
            .set_scale(self.bin, scale)
            .context("failed to apply logo scale transform")
    }

    fn update_position(&mut self, ctx: &HostContext<'_>) -> Result<()> {
        let raw = ctx.prefs.logo_position();
        match geometry::alignment_for(&raw) {
            Some((x, y)) => ctx
                .scene
                .set_align(self.bin, x, y)
                .context("failed to apply logo alignment"),
            None => {
                // Corrupted value; keep whatever placement is applied.
                debug!(
                    surface = self.surface,
                    position = %raw,
                    "unrecognized logo-position value ignored"
                );
                Ok(())
            }
        }
    }

    fn update_border(&mut self, ctx: &HostContext<'_>) -> Result<()> {
        ctx.scene
            .set_padding(self.container, ctx.prefs.logo_border())
            .context("failed to apply logo border padding")
    }

    fn update_opacity(&mut self, ctx: &HostContext<'_>) -> Result<()> {
        let brightness = ctx
            .surfaces
            .brightness(self.surface)
            .context("failed to query surface brightness")?;
        let effective = visibility::effective_opacity(ctx.prefs.logo_opacity(), brightness);
        ctx.scene
            .set_opacity(self.bin, effective)
            .context("failed to apply logo opacity")
    }

    fn update_visibility(&mut self, ctx: &HostContext<'_>) -> Result<()> {
        let current = ctx
            .surfaces
            .image(self.surface)
            .context("failed to query surface background image")?;
        let visible = visibility::compute(
            ctx.prefs.always_visible(),
            current.as_deref(),
            ctx.surfaces.default_image().as_deref(),
        );
        let target = if visible {
            opacity::OPAQUE
        } else {
            opacity::TRANSPARENT
        };
        ctx.scene
            .animate_opacity(self.container, target, fade::DURATION_MS, Easing::EaseOutQuad)
            .context("failed to animate logo visibility")
    }
}
