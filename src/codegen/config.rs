//! Generator configuration
//!
//! Module search order: the directory of the main source file (when known),
//! then the configured search paths in order. The first directory holding the
//! requested file wins.

use crate::codegen::constants::{DEFAULT_SEARCH_PATHS, SEARCH_PATH_ENV};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub search_paths: Vec<PathBuf>,
    pub source_dir: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            search_paths: DEFAULT_SEARCH_PATHS.iter().map(PathBuf::from).collect(),
            source_dir: None,
        }
    }
}

impl GeneratorConfig {
    /// Default search paths followed by the entries of `FORGE_PATH`.
    pub fn from_env() -> Self {
        let mut config = GeneratorConfig::default();
        if let Some(value) = env::var_os(SEARCH_PATH_ENV) {
            config
                .search_paths
                .extend(env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
        }
        config
    }

    /// Search the directory containing `path` before anything else.
    pub fn with_source_file(mut self, path: &Path) -> Self {
        self.source_dir = path
            .parent()
            .map(|dir| {
                if dir.as_os_str().is_empty() {
                    PathBuf::from(".")
                } else {
                    dir.to_path_buf()
                }
            });
        self
    }

    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// Directories in lookup order, without duplicates.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for dir in self.source_dir.iter().chain(self.search_paths.iter()) {
            if !dirs.contains(dir) {
                dirs.push(dir.clone());
            }
        }
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_dir_is_searched_first() {
        let config = GeneratorConfig::default()
            .with_source_file(Path::new("project/src/main.forge"))
            .with_search_path("vendor");
        let dirs = config.search_dirs();
        assert_eq!(dirs[0], PathBuf::from("project/src"));
        assert_eq!(dirs.last(), Some(&PathBuf::from("vendor")));
        assert_eq!(dirs.len(), DEFAULT_SEARCH_PATHS.len() + 2);
    }

    #[test]
    fn test_bare_file_name_searches_current_dir_once() {
        let config = GeneratorConfig::default().with_source_file(Path::new("main.forge"));
        let dirs = config.search_dirs();
        assert_eq!(dirs[0], PathBuf::from("."));
        assert_eq!(dirs.iter().filter(|d| *d == Path::new(".")).count(), 1);
    }
}
