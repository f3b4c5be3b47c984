//! Volume mount descriptor generation and the `subfolders_in` path helper
//! shared by the volume claim handle and the FTP directory-creation logic.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One `volumeMounts` entry patched into a filer or executor pod spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountDescriptor {
    pub path: String,
    pub volume_name: String,
    pub sub_path: String,
}

impl MountDescriptor {
    /// Generate one descriptor per input path, in order, each with a
    /// freshly generated unique `sub_path` tag; duplicates in `paths`
    /// still produce distinct descriptors, since two mounts targeting the
    /// same logical path must not alias on disk.
    pub fn generate(paths: &[String], volume_name: &str) -> Vec<MountDescriptor> {
        paths
            .iter()
            .map(|path| MountDescriptor {
                path: path.clone(),
                volume_name: volume_name.to_string(),
                sub_path: Uuid::new_v4().to_string(),
            })
            .collect()
    }
}

/// Returns every subfolder prefix of `whole_path`, in order.
///
/// ```text
/// subfolders_in("/a/b/c") == ["/a", "/a/b", "/a/b/c"]
/// subfolders_in("a/b/c")  == ["a", "a/b", "a/b/c"]
/// subfolders_in("/")      == ["/"]
/// ```
pub fn subfolders_in(whole_path: &str) -> Vec<String> {
    let absolute = whole_path.starts_with('/');
    let trimmed = whole_path.trim_start_matches('/');
    let mut fragments: Vec<&str> = trimmed.split('/').collect();
    if fragments.is_empty() {
        fragments.push("");
    }

    let mut path = if absolute {
        format!("/{}", fragments[0])
    } else {
        fragments[0].to_string()
    };

    let mut subfolders = vec![path.clone()];
    for fragment in &fragments[1..] {
        path.push('/');
        path.push_str(fragment);
        subfolders.push(path.clone());
    }
    subfolders
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn subfolders_root() {
        assert_eq!(subfolders_in("/"), vec!["/".to_string()]);
    }

    #[test]
    fn subfolders_absolute_path() {
        assert_eq!(
            subfolders_in("/a/b/c"),
            vec!["/a".to_string(), "/a/b".to_string(), "/a/b/c".to_string()]
        );
    }

    #[test]
    fn subfolders_relative_path() {
        assert_eq!(
            subfolders_in("a/b/c"),
            vec!["a".to_string(), "a/b".to_string(), "a/b/c".to_string()]
        );
    }

    #[test]
    fn duplicate_paths_yield_distinct_sub_paths() {
        let paths: Vec<String> = (0..10_000).map(|i| format!("/data/{}", i % 3)).collect();
        let mounts = MountDescriptor::generate(&paths, "task-volume");
        let unique: HashSet<&str> = mounts.iter().map(|m| m.sub_path.as_str()).collect();
        assert_eq!(unique.len(), mounts.len());
        assert_eq!(mounts.len(), paths.len());
    }

    #[test]
    fn empty_path_list_yields_no_mounts() {
        assert!(MountDescriptor::generate(&[], "task-volume").is_empty());
    }
}
