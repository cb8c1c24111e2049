use std::{cell::Cell, path::Path, path::PathBuf, rc::Rc};

use render_sandbox::data_structures::cache::{AssetCache, normalize_path};

#[test]
fn normalize_drops_current_dir_and_folds_parents() {
    assert_eq!(
        normalize_path(Path::new("assets/./textures/../textures/wall.png")),
        PathBuf::from("assets/textures/wall.png")
    );
    assert_eq!(normalize_path(Path::new("../shared/a.png")), PathBuf::from("../shared/a.png"));
    assert_eq!(normalize_path(Path::new("a/../../b.png")), PathBuf::from("../b.png"));
    assert_eq!(normalize_path(Path::new("/x/../y.png")), PathBuf::from("/y.png"));
    assert_eq!(normalize_path(Path::new("./")), PathBuf::from("."));
}

#[test]
fn same_path_shares_one_instance() {
    let mut cache = AssetCache::new();
    let loads = Cell::new(0);
    let load = |path: &Path| {
        loads.set(loads.get() + 1);
        path.to_path_buf()
    };

    let a = cache.get_or_load(Path::new("textures/wall.png"), load);
    let b = cache.get_or_load(Path::new("textures/./wall.png"), load);
    assert!(Rc::ptr_eq(&a, &b));
    assert_eq!(loads.get(), 1);
    assert_eq!(*a, PathBuf::from("textures/wall.png"));
    assert_eq!(cache.len(), 1);
}

#[test]
fn cache_does_not_keep_values_alive() {
    let mut cache = AssetCache::new();
    let path = Path::new("face.png");
    let first = cache.get_or_load(path, |_| 1u32);
    assert!(cache.get(path).is_some());
    assert!(!cache.is_stale(path));

    drop(first);
    assert!(cache.get(path).is_none());
    assert!(cache.is_stale(path));

    let second = cache.get_or_load(path, |_| 2u32);
    assert_eq!(*second, 2);
    assert!(!cache.is_stale(path));
}

#[test]
fn purge_removes_only_dropped_entries() {
    let mut cache = AssetCache::new();
    let kept = cache.get_or_load(Path::new("kept.png"), |_| "kept");
    let dropped = cache.get_or_load(Path::new("dropped.png"), |_| "dropped");
    drop(dropped);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.purge_stale(), 1);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.purge_stale(), 0);
    assert_eq!(cache.get(Path::new("kept.png")).as_deref(), Some(&"kept"));
    drop(kept);
    assert_eq!(cache.purge_stale(), 1);
    assert!(cache.is_empty());
}

#[test]
fn unknown_paths_are_neither_live_nor_stale() {
    let cache: AssetCache<u8> = AssetCache::new();
    assert!(cache.get(Path::new("missing.png")).is_none());
    assert!(!cache.is_stale(Path::new("missing.png")));
}
