use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::error::NavigationError;

/// Resolves `change_directory` targets against a session's cursor and
/// renders cursors for display.
#[derive(Debug, Clone)]
pub struct PathResolver {
    home_dir: Option<PathBuf>,
}

impl PathResolver {
    pub fn new(home_dir: Option<PathBuf>) -> Self {
        Self { home_dir }
    }

    /// Computes the candidate directory for `target`. Nothing is checked on
    /// disk here; the caller validates before moving the cursor.
    pub fn resolve(&self, cursor: &Path, target: &str) -> Result<PathBuf, NavigationError> {
        if target == ".." {
            // the root is its own parent
            return Ok(cursor.parent().unwrap_or(cursor).to_path_buf());
        }

        let resolved = if let Some(rest) = target.strip_prefix('~') {
            let home = self
                .home_dir
                .as_deref()
                .ok_or(NavigationError::NoHomeDirectory)?;
            normalize(&home.join(rest.trim_start_matches(['/', '\\'])))
        } else {
            // join() keeps absolute and drive-prefixed targets as they are
            normalize(&cursor.join(target))
        };

        debug!("Resolved {:?} against {:?} to {:?}", target, cursor, resolved);
        Ok(resolved)
    }

    /// Tilde-abbreviated form of `path` when it lies under the home directory.
    pub fn display(&self, path: &Path) -> String {
        if let Some(rel) = self
            .home_dir
            .as_deref()
            .and_then(|home| path.strip_prefix(home).ok())
        {
            if rel.as_os_str().is_empty() {
                return "~".to_string();
            }
            return format!("~/{}", rel.to_string_lossy().replace('\\', "/"));
        }

        #[cfg(windows)]
        {
            path.to_string_lossy().replace('\\', "/")
        }

        #[cfg(not(windows))]
        {
            path.to_string_lossy().into_owned()
        }
    }
}

/// Folds `.` and `..` components without touching the file system.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
