//! Loading of everything that comes from disk: text files, decoded images
//! and imported scenes.

use std::path::Path;

use anyhow::Context;

pub mod scene;
pub mod texture;

pub async fn load_string(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}
