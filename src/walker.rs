use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub struct SourceFileWalker;

impl SourceFileWalker {
    pub fn new() -> Self {
        Self
    }

    pub fn walk(&self, path: &Path) -> impl Iterator<Item = PathBuf> {
        let mut builder = WalkBuilder::new(path);
        builder
            .standard_filters(true)
            .add_custom_ignore_filename(".usortignore");

        builder
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().map_or(false, |ext| ext == "cs"))
            .map(|entry| entry.path().to_path_buf())
    }
}

impl Default for SourceFileWalker {
    fn default() -> Self {
        Self::new()
    }
}
