//! Splitting a file name into its stem and extension.
//!
//! The extension keeps its leading dot so that `name + ext == base` always
//! holds, which is what scope reattachment relies on.

/// Split `base` into `(name, ext)`.
///
/// The extension runs from the last `.` to the end of the string. A dot in
/// first position does not start an extension, so dotfiles such as `.bashrc`
/// have an empty extension.
pub fn split_base(base: &str) -> (&str, &str) {
    if base == "." || base == ".." {
        return (base, "");
    }
    match base.rfind('.') {
        Some(0) | None => (base, ""),
        Some(dot) => base.split_at(dot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple() {
        assert_eq!(split_base("file.txt"), ("file", ".txt"));
    }

    #[test]
    fn test_split_multiple_dots() {
        assert_eq!(split_base("archive.tar.gz"), ("archive.tar", ".gz"));
    }

    #[test]
    fn test_split_no_extension() {
        assert_eq!(split_base("README"), ("README", ""));
    }

    #[test]
    fn test_split_dotfile() {
        assert_eq!(split_base(".bashrc"), (".bashrc", ""));
        assert_eq!(split_base(".config.bak"), (".config", ".bak"));
    }

    #[test]
    fn test_split_trailing_dot() {
        assert_eq!(split_base("notes."), ("notes", "."));
    }

    #[test]
    fn test_split_relative_markers() {
        assert_eq!(split_base(".."), ("..", ""));
        assert_eq!(split_base("."), (".", ""));
    }
}
