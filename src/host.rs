//! Host collaborator interfaces
//!
//! The shell process hosting the overlay implements these traits and drives
//! [`OverlayManager::handle_event`](crate::manager::OverlayManager::handle_event)
//! from its event loop. All methods take `&self`; implementations use
//! interior mutability, matching the single-threaded cooperative model —
//! nothing here is `Send` or blocks.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::prefs::{PrefKey, PreferenceStore};
use crate::types::{Align, Dimensions, ImageId, NodeId, Rect, SurfaceId};

/// Easing curve for opacity animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    /// Quadratic ease-out; the only curve the overlay requests.
    EaseOutQuad,
}

/// Decode constraints for an image load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadSpec {
    /// Maximum decode width in pixels; `-1` leaves the axis unconstrained.
    pub max_width: i32,
    /// Maximum decode height in pixels; `-1` leaves the axis unconstrained.
    pub max_height: i32,
    /// Global UI scale of the scene (theme scale factor).
    pub scale_factor: f64,
    /// Per-surface device-pixel-ratio-like decode factor.
    pub resource_scale: f64,
}

/// Scene-graph primitives the host exposes for visual nodes.
pub trait SceneGraph {
    /// Create a node parented under `parent`.
    fn create_node(&self, parent: NodeId) -> Result<NodeId>;

    /// Destroy a node together with its subtree.
    fn destroy_node(&self, node: NodeId) -> Result<()>;

    /// Position and size a node in surface coordinates.
    fn set_geometry(&self, node: NodeId, rect: Rect) -> Result<()>;

    /// Align a node inside its parent, per axis.
    fn set_align(&self, node: NodeId, x: Align, y: Align) -> Result<()>;

    /// Uniform padding inside a node, in pixels.
    fn set_padding(&self, node: NodeId, padding: u32) -> Result<()>;

    /// Set node opacity without animation.
    fn set_opacity(&self, node: NodeId, opacity: u8) -> Result<()>;

    /// Uniform multiplicative scale transform on a node.
    fn set_scale(&self, node: NodeId, scale: f64) -> Result<()>;

    /// Attach loaded image content as a child of `node`.
    fn add_image(&self, node: NodeId, image: ImageId) -> Result<()>;

    /// Animate node opacity toward `target`. Fire-and-forget; completion is
    /// never observed by the caller.
    fn animate_opacity(
        &self,
        node: NodeId,
        target: u8,
        duration_ms: u32,
        easing: Easing,
    ) -> Result<()>;

    /// Global UI scale (theme scale factor) of the scene.
    fn scale_factor(&self) -> f64;
}

/// Enumeration of and queries against the shell's background surfaces.
pub trait SurfaceRegistry {
    /// Currently live surfaces, one per (monitor, background manager) pair.
    fn surfaces(&self) -> Vec<SurfaceId>;

    /// Monitor index the surface presents.
    fn monitor_index(&self, surface: SurfaceId) -> Result<usize>;

    /// Usable monitor rectangle excluding panels and docks.
    fn work_area(&self, surface: SurfaceId) -> Result<Rect>;

    /// Per-surface decode resolution factor.
    fn resource_scale(&self, surface: SurfaceId) -> Result<f64>;

    /// Container node that stays alive across background swaps on the same
    /// manager; overlays parent their visuals here.
    fn root_node(&self, surface: SurfaceId) -> Result<NodeId>;

    /// Identity of the surface's current background image, if any.
    fn image(&self, surface: SurfaceId) -> Result<Option<PathBuf>>;

    /// Brightness factor applied by a vignette effect; `1.0` when inactive.
    fn brightness(&self, surface: SurfaceId) -> Result<f64>;

    /// Identity of the user's default background image.
    fn default_image(&self) -> Option<PathBuf>;
}

/// Asynchronous image loading.
pub trait ImageCache {
    /// Begin loading `path`. The handle is valid immediately; its size
    /// becomes available once the host delivers
    /// [`HostEvent::ImageReady`] for it.
    fn load(&self, path: &Path, spec: LoadSpec) -> Result<ImageId>;

    /// Decoded size, or `None` while the load is in flight or failed.
    fn natural_size(&self, image: ImageId) -> Result<Option<Dimensions>>;

    /// Release a handle, detaching its content from the scene.
    fn release(&self, image: ImageId) -> Result<()>;
}

/// Change notifications the host forwards from its event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A preference value changed.
    PrefChanged(PrefKey),
    /// Monitor layout changed; surfaces were rebuilt wholesale.
    MonitorsChanged,
    /// The shell finished its startup transition.
    StartupPrepared,
    /// A background surface came alive after the initial sweep.
    SurfaceCreated(SurfaceId),
    /// A surface went away. `replacement` is set when the owning manager
    /// swapped in a successor (background source change) rather than dying.
    SurfaceDestroyed {
        surface: SurfaceId,
        replacement: Option<SurfaceId>,
    },
    /// A surface's content or brightness changed.
    SurfaceChanged(SurfaceId),
    /// An image load completed.
    ImageReady(ImageId),
    /// Bytes of a cached image file changed on disk.
    ImageFileChanged(PathBuf),
}

/// Borrowed bundle of host collaborators threaded through every operation.
#[derive(Clone, Copy)]
pub struct HostContext<'a> {
    pub prefs: &'a dyn PreferenceStore,
    pub surfaces: &'a dyn SurfaceRegistry,
    pub scene: &'a dyn SceneGraph,
    pub images: &'a dyn ImageCache,
}

#[cfg(test)]
pub(crate) mod fakes {
    //! In-memory collaborators backing the unit tests.

    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeMap, HashMap};
    use std::path::{Path, PathBuf};

    use anyhow::{Result, anyhow};

    use super::{Easing, HostContext, ImageCache, LoadSpec, SceneGraph, SurfaceRegistry};
    use crate::prefs::MemoryPrefs;
    use crate::types::{Align, Dimensions, ImageId, NodeId, Rect, SurfaceId};

    #[derive(Debug, Clone, Default)]
    pub struct FakeNode {
        pub parent: Option<NodeId>,
        pub geometry: Option<Rect>,
        pub align: Option<(Align, Align)>,
        pub padding: Option<u32>,
        pub opacity: u8,
        pub scale: Option<f64>,
        pub images: Vec<ImageId>,
        pub animations: Vec<(u8, u32, Easing)>,
    }

    #[derive(Debug)]
    pub struct FakeScene {
        nodes: RefCell<HashMap<NodeId, FakeNode>>,
        next_id: Cell<NodeId>,
    }

    impl FakeScene {
        pub fn new() -> Self {
            Self {
                nodes: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
            }
        }

        fn alloc(&self) -> NodeId {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            id
        }

        /// Create a parentless node standing in for a host-owned container.
        pub fn add_root(&self) -> NodeId {
            let id = self.alloc();
            self.nodes.borrow_mut().insert(id, FakeNode::default());
            id
        }

        pub fn node(&self, node: NodeId) -> Option<FakeNode> {
            self.nodes.borrow().get(&node).cloned()
        }

        pub fn exists(&self, node: NodeId) -> bool {
            self.nodes.borrow().contains_key(&node)
        }

        pub fn count(&self) -> usize {
            self.nodes.borrow().len()
        }

        /// Children of a node, in creation order.
        pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
            let mut children: Vec<NodeId> = self
                .nodes
                .borrow()
                .iter()
                .filter(|(_, n)| n.parent == Some(parent))
                .map(|(&id, _)| id)
                .collect();
            children.sort_unstable();
            children
        }

        fn with_node<T>(
            &self,
            node: NodeId,
            apply: impl FnOnce(&mut FakeNode) -> T,
        ) -> Result<T> {
            let mut nodes = self.nodes.borrow_mut();
            let entry = nodes
                .get_mut(&node)
                .ok_or_else(|| anyhow!("no such node {node}"))?;
            Ok(apply(entry))
        }
    }

    impl SceneGraph for FakeScene {
        fn create_node(&self, parent: NodeId) -> Result<NodeId> {
            if !self.exists(parent) {
                return Err(anyhow!("no such parent node {parent}"));
            }
            let id = self.alloc();
            self.nodes.borrow_mut().insert(
                id,
                FakeNode {
                    parent: Some(parent),
                    ..FakeNode::default()
                },
            );
            Ok(id)
        }

        fn destroy_node(&self, node: NodeId) -> Result<()> {
            if !self.exists(node) {
                return Err(anyhow!("no such node {node}"));
            }
            for child in self.children(node) {
                self.destroy_node(child)?;
            }
            self.nodes.borrow_mut().remove(&node);
            Ok(())
        }

        fn set_geometry(&self, node: NodeId, rect: Rect) -> Result<()> {
            self.with_node(node, |n| n.geometry = Some(rect))
        }

        fn set_align(&self, node: NodeId, x: Align, y: Align) -> Result<()> {
            self.with_node(node, |n| n.align = Some((x, y)))
        }

        fn set_padding(&self, node: NodeId, padding: u32) -> Result<()> {
            self.with_node(node, |n| n.padding = Some(padding))
        }

        fn set_opacity(&self, node: NodeId, opacity: u8) -> Result<()> {
            self.with_node(node, |n| n.opacity = opacity)
        }

        fn set_scale(&self, node: NodeId, scale: f64) -> Result<()> {
            self.with_node(node, |n| n.scale = Some(scale))
        }

        fn add_image(&self, node: NodeId, image: ImageId) -> Result<()> {
            self.with_node(node, |n| n.images.push(image))
        }

        fn animate_opacity(
            &self,
            node: NodeId,
            target: u8,
            duration_ms: u32,
            easing: Easing,
        ) -> Result<()> {
            // The fake completes animations instantly.
            self.with_node(node, |n| {
                n.animations.push((target, duration_ms, easing));
                n.opacity = target;
            })
        }

        fn scale_factor(&self) -> f64 {
            1.0
        }
    }

    #[derive(Debug, Clone)]
    pub struct FakeSurface {
        pub monitor: usize,
        pub work_area: Rect,
        pub resource_scale: f64,
        pub root: NodeId,
        pub image: Option<PathBuf>,
        pub brightness: f64,
    }

    #[derive(Debug, Default)]
    pub struct FakeRegistry {
        surfaces: RefCell<BTreeMap<SurfaceId, FakeSurface>>,
        default_image: RefCell<Option<PathBuf>>,
    }

    impl FakeRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_surface(&self, surface: SurfaceId, monitor: usize, root: NodeId, work_area: Rect) {
            self.surfaces.borrow_mut().insert(
                surface,
                FakeSurface {
                    monitor,
                    work_area,
                    resource_scale: 1.0,
                    root,
                    image: None,
                    brightness: 1.0,
                },
            );
        }

        pub fn remove_surface(&self, surface: SurfaceId) {
            self.surfaces.borrow_mut().remove(&surface);
        }

        pub fn set_image(&self, surface: SurfaceId, image: Option<PathBuf>) {
            if let Some(entry) = self.surfaces.borrow_mut().get_mut(&surface) {
                entry.image = image;
            }
        }

        pub fn set_brightness(&self, surface: SurfaceId, brightness: f64) {
            if let Some(entry) = self.surfaces.borrow_mut().get_mut(&surface) {
                entry.brightness = brightness;
            }
        }

        pub fn set_default_image(&self, image: Option<PathBuf>) {
            *self.default_image.borrow_mut() = image;
        }

        fn query<T>(
            &self,
            surface: SurfaceId,
            read: impl FnOnce(&FakeSurface) -> T,
        ) -> Result<T> {
            let surfaces = self.surfaces.borrow();
            let entry = surfaces
                .get(&surface)
                .ok_or_else(|| anyhow!("no such surface {surface}"))?;
            Ok(read(entry))
        }
    }

    impl SurfaceRegistry for FakeRegistry {
        fn surfaces(&self) -> Vec<SurfaceId> {
            self.surfaces.borrow().keys().copied().collect()
        }

        fn monitor_index(&self, surface: SurfaceId) -> Result<usize> {
            self.query(surface, |s| s.monitor)
        }

        fn work_area(&self, surface: SurfaceId) -> Result<Rect> {
            self.query(surface, |s| s.work_area)
        }

        fn resource_scale(&self, surface: SurfaceId) -> Result<f64> {
            self.query(surface, |s| s.resource_scale)
        }

        fn root_node(&self, surface: SurfaceId) -> Result<NodeId> {
            self.query(surface, |s| s.root)
        }

        fn image(&self, surface: SurfaceId) -> Result<Option<PathBuf>> {
            self.query(surface, |s| s.image.clone())
        }

        fn brightness(&self, surface: SurfaceId) -> Result<f64> {
            self.query(surface, |s| s.brightness)
        }

        fn default_image(&self) -> Option<PathBuf> {
            self.default_image.borrow().clone()
        }
    }

    #[derive(Debug, Clone)]
    pub struct FakeImage {
        pub path: PathBuf,
        pub spec: LoadSpec,
        pub size: Option<Dimensions>,
        pub released: bool,
    }

    #[derive(Debug)]
    pub struct FakeImages {
        entries: RefCell<HashMap<ImageId, FakeImage>>,
        next_id: Cell<ImageId>,
    }

    impl FakeImages {
        pub fn new() -> Self {
            Self {
                entries: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
            }
        }

        pub fn set_ready(&self, image: ImageId, size: Dimensions) {
            if let Some(entry) = self.entries.borrow_mut().get_mut(&image) {
                entry.size = Some(size);
            }
        }

        /// Number of loads ever requested for `path`, released or not.
        pub fn load_count(&self, path: &Path) -> usize {
            self.entries
                .borrow()
                .values()
                .filter(|e| e.path == path)
                .count()
        }

        pub fn last_loaded(&self) -> Option<(ImageId, FakeImage)> {
            self.entries
                .borrow()
                .iter()
                .max_by_key(|&(&id, _)| id)
                .map(|(&id, entry)| (id, entry.clone()))
        }

        pub fn released(&self, image: ImageId) -> bool {
            self.entries
                .borrow()
                .get(&image)
                .is_some_and(|e| e.released)
        }
    }

    impl ImageCache for FakeImages {
        fn load(&self, path: &Path, spec: LoadSpec) -> Result<ImageId> {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            self.entries.borrow_mut().insert(
                id,
                FakeImage {
                    path: path.to_path_buf(),
                    spec,
                    size: None,
                    released: false,
                },
            );
            Ok(id)
        }

        fn natural_size(&self, image: ImageId) -> Result<Option<Dimensions>> {
            let entries = self.entries.borrow();
            let entry = entries
                .get(&image)
                .ok_or_else(|| anyhow!("unknown image handle {image}"))?;
            if entry.released {
                return Err(anyhow!("image handle {image} already released"));
            }
            Ok(entry.size)
        }

        fn release(&self, image: ImageId) -> Result<()> {
            let mut entries = self.entries.borrow_mut();
            let entry = entries
                .get_mut(&image)
                .ok_or_else(|| anyhow!("unknown image handle {image}"))?;
            entry.released = true;
            Ok(())
        }
    }

    /// One-stop fixture bundling all four collaborators.
    #[derive(Debug)]
    pub struct FakeHost {
        pub prefs: MemoryPrefs,
        pub scene: FakeScene,
        pub registry: FakeRegistry,
        pub images: FakeImages,
    }

    impl FakeHost {
        pub fn new() -> Self {
            Self {
                prefs: MemoryPrefs::new(),
                scene: FakeScene::new(),
                registry: FakeRegistry::new(),
                images: FakeImages::new(),
            }
        }

        pub fn ctx(&self) -> HostContext<'_> {
            HostContext {
                prefs: &self.prefs,
                surfaces: &self.registry,
                scene: &self.scene,
                images: &self.images,
            }
        }

        /// Register a surface with a fresh host-owned root container and a
        /// 1920x1080 work area; returns the root node.
        pub fn add_surface(&self, surface: SurfaceId, monitor: usize) -> NodeId {
            let root = self.scene.add_root();
            self.registry
                .add_surface(surface, monitor, root, Rect::new(0, 0, 1920, 1080));
            root
        }
    }
}
