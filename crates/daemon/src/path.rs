//! Path resolution and quoting shared by every filesystem-facing handler.

use std::path::{Component, Path, PathBuf};

/// Resolves `param` against `cwd` the way RFC 959 path commands expect:
/// absolute parameters are used as-is (after cleaning), relative ones are
/// joined onto `cwd` first. `..` components are consumed without ever
/// climbing above `/`.
#[must_use]
pub fn abs_path(cwd: &str, param: &str) -> PathBuf {
    let joined = if param.starts_with('/') {
        PathBuf::from(param)
    } else {
        Path::new(cwd).join(param)
    };
    clean(&joined)
}

fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    out
}

/// Renders `path` as FTP clients expect inside a quoted reply (`PWD`, `MKD`,
/// …): wrapped in `"`, with any internal `"` doubled.
#[must_use]
pub fn quote_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_joins_onto_cwd() {
        assert_eq!(abs_path("/home/user", "docs"), PathBuf::from("/home/user/docs"));
    }

    #[test]
    fn absolute_path_ignores_cwd() {
        assert_eq!(abs_path("/home/user", "/etc/passwd"), PathBuf::from("/etc/passwd"));
    }

    #[test]
    fn parent_dir_never_escapes_root() {
        assert_eq!(abs_path("/", "../../.."), PathBuf::from("/"));
        assert_eq!(abs_path("/home/user", "../../../../etc"), PathBuf::from("/etc"));
    }

    #[test]
    fn dot_components_are_dropped() {
        assert_eq!(abs_path("/home/user", "./a/./b"), PathBuf::from("/home/user/a/b"));
    }

    #[test]
    fn quote_path_doubles_embedded_quotes() {
        assert_eq!(
            quote_path(Path::new("/home/weird\"name")),
            "\"/home/weird\"\"name\""
        );
    }

    #[test]
    fn quote_path_wraps_plain_path() {
        assert_eq!(quote_path(Path::new("/a/b")), "\"/a/b\"");
    }
}
