use std::path::{Component, Path, PathBuf};

/// Joins `path` onto `base` unless it is already absolute, then folds `.` and
/// `..` segments lexically. The filesystem is never consulted, so the result
/// is stable for paths that do not exist yet.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    normalize_lexically(&joined)
}

pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            // `..` cancels a named segment only; it never climbs above the
            // root and piles up on a relative path with nothing to cancel.
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            Component::Normal(v) => normalized.push(v),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_under_base() {
        let resolved = resolve_against(Path::new("/runs/run001"), Path::new("./out/../goodbye.txt"));
        assert_eq!(resolved, PathBuf::from("/runs/run001/goodbye.txt"));
    }

    #[test]
    fn absolute_paths_ignore_base() {
        let resolved = resolve_against(Path::new("/runs/run001"), Path::new("/data/x.txt"));
        assert_eq!(resolved, PathBuf::from("/data/x.txt"));
    }

    #[test]
    fn leading_parent_segments_accumulate() {
        assert_eq!(normalize_lexically(Path::new("../..")), PathBuf::from("../.."));
        assert_eq!(normalize_lexically(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(
            resolve_against(Path::new("../work"), Path::new("../../out.txt")),
            PathBuf::from("../../out.txt")
        );
    }

    #[test]
    fn parent_of_root_stays_root() {
        assert_eq!(normalize_lexically(Path::new("/../data")), PathBuf::from("/data"));
    }

    #[test]
    fn current_dir_alone_stays_current_dir() {
        assert_eq!(normalize_lexically(Path::new("./")), PathBuf::from("."));
    }
}
