//! Sequential file naming for discovered images.

/// Default filename prefix.
pub const DEFAULT_PREFIX: &str = "flickr_image";

/// Default file extension (without dot).
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Builds `<prefix>_<n>.<extension>` names with a counter that never resets.
///
/// ```
/// use album_dl_core::source::FilenameScheme;
///
/// let mut naming = FilenameScheme::default();
/// assert_eq!(naming.next_name(), "flickr_image_1.jpg");
/// assert_eq!(naming.next_name(), "flickr_image_2.jpg");
/// ```
#[derive(Debug, Clone)]
pub struct FilenameScheme {
    prefix: String,
    extension: String,
    issued: usize,
}

impl Default for FilenameScheme {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_EXTENSION)
    }
}

impl FilenameScheme {
    /// Creates a scheme; both parts are sanitized so names stay inside the
    /// destination directory.
    #[must_use]
    pub fn new(prefix: &str, extension: &str) -> Self {
        let prefix = sanitize_filename_component(prefix);
        let extension = sanitize_filename_component(extension.trim_start_matches('.'));
        Self {
            prefix: if prefix.is_empty() {
                DEFAULT_PREFIX.to_string()
            } else {
                prefix
            },
            extension: if extension.is_empty() {
                DEFAULT_EXTENSION.to_string()
            } else {
                extension
            },
            issued: 0,
        }
    }

    /// Returns the next name, starting at 1.
    pub fn next_name(&mut self) -> String {
        self.issued += 1;
        format!("{}_{}.{}", self.prefix, self.issued, self.extension)
    }

    /// Number of names handed out so far.
    #[must_use]
    pub fn issued(&self) -> usize {
        self.issued
    }
}

/// Replaces anything other than alphanumerics, `-`, `_` and `.` with `_`,
/// collapsing runs, and trims dots and underscores from both ends so the
/// result is never `..` or hidden.
pub(crate) fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            c if c.is_alphanumeric() || matches!(c, '-' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches(|c| c == '_' || c == '.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scheme_matches_album_names() {
        let mut naming = FilenameScheme::default();
        assert_eq!(naming.next_name(), "flickr_image_1.jpg");
        assert_eq!(naming.next_name(), "flickr_image_2.jpg");
        assert_eq!(naming.issued(), 2);
    }

    #[test]
    fn test_custom_scheme_strips_leading_dot_from_extension() {
        let mut naming = FilenameScheme::new("holiday", ".png");
        assert_eq!(naming.next_name(), "holiday_1.png");
    }

    #[test]
    fn test_path_separators_cannot_escape_directory() {
        let mut naming = FilenameScheme::new("../../etc/passwd", "jpg");
        let name = naming.next_name();
        assert_eq!(name, "etc_passwd_1.jpg");
    }

    #[test]
    fn test_empty_parts_fall_back_to_defaults() {
        let mut naming = FilenameScheme::new("///", "");
        assert_eq!(naming.next_name(), "flickr_image_1.jpg");
    }

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(sanitize_filename_component("a  b::c"), "a_b_c");
        assert_eq!(sanitize_filename_component("__x__"), "x");
    }
}
