//! Shared-texture cache.
//!
//! The cache never keeps anything alive on its own: it stores a [`Weak`]
//! reference per normalised path, so a texture is freed as soon as the last
//! mesh or caller dropping its [`Rc`] lets go. Asking again after that loads it
//! afresh.

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    rc::{Rc, Weak},
};

use crate::data_structures::texture::Texture;

/// Lexically normalise `path`: drop `.` segments and fold `dir/..` pairs.
/// Leading `..` segments of a relative path are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Path-keyed cache of weak handles.
#[derive(Debug)]
pub struct AssetCache<T> {
    entries: HashMap<PathBuf, Weak<T>>,
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live instance for `path`, if one is still owned somewhere.
    pub fn get(&self, path: &Path) -> Option<Rc<T>> {
        self.entries.get(&normalize_path(path))?.upgrade()
    }

    /// Return the live instance for `path` or build one with `load`.
    ///
    /// `load` receives the normalised path and only runs on a miss.
    pub fn get_or_load<F>(&mut self, path: &Path, load: F) -> Rc<T>
    where
        F: FnOnce(&Path) -> T,
    {
        let key = normalize_path(path);
        if let Some(live) = self.entries.get(&key).and_then(Weak::upgrade) {
            return live;
        }
        let fresh = Rc::new(load(&key));
        self.entries.insert(key, Rc::downgrade(&fresh));
        fresh
    }

    /// `true` when `path` has an entry whose value has already been dropped.
    pub fn is_stale(&self, path: &Path) -> bool {
        self.entries
            .get(&normalize_path(path))
            .is_some_and(|weak| weak.strong_count() == 0)
    }

    /// Remove entries whose value has been dropped; returns how many went.
    pub fn purge_stale(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        before - self.entries.len()
    }

    /// Number of entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Texture cache bound to the device textures are uploaded with.
#[derive(Debug)]
pub struct TextureManager {
    device: wgpu::Device,
    queue: wgpu::Queue,
    cache: AssetCache<Texture>,
}

impl TextureManager {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
            cache: AssetCache::new(),
        }
    }

    /// Shared handle to the texture at `path`, loading it on first use.
    /// Failed loads are cached too, as empty textures.
    pub fn get(&mut self, path: impl AsRef<Path>) -> Rc<Texture> {
        let (device, queue) = (&self.device, &self.queue);
        self.cache
            .get_or_load(path.as_ref(), |key| Texture::load(device, queue, key))
    }

    /// Like [`TextureManager::get`] for an image held in memory; `key` stands
    /// in for the path.
    pub fn get_embedded(&mut self, key: impl AsRef<Path>, bytes: &[u8]) -> Rc<Texture> {
        let (device, queue) = (&self.device, &self.queue);
        self.cache
            .get_or_load(key.as_ref(), |key| Texture::load_bytes(device, queue, bytes, key))
    }

    pub fn cache(&self) -> &AssetCache<Texture> {
        &self.cache
    }

    pub fn purge_stale(&mut self) -> usize {
        self.cache.purge_stale()
    }
}
