// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Content-type resolution by file extension
//!
//! Configured overrides are consulted first, then a built-in table. Nothing
//! here reads file bytes.

use std::collections::BTreeMap;
use std::path::Path;

use crate::rules::normalize_extension;

/// Extension to content-type lookup with user overrides
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    /// Build from an override map; keys are normalized to `.ext` lower-case
    pub fn new(overrides: &BTreeMap<String, String>) -> Self {
        let overrides = overrides
            .iter()
            .filter_map(|(ext, ty)| normalize_extension(ext).map(|e| (e, ty.clone())))
            .collect();
        Self { overrides }
    }

    /// Resolve the content type for a path, if any is known
    pub fn resolve(&self, path: &Path) -> Option<&str> {
        let ext = dotted_extension(path)?;
        self.overrides
            .get(&ext)
            .map(String::as_str)
            .or_else(|| standard_content_type(&ext))
    }
}

/// The lower-cased extension of a path with a leading dot
pub fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(normalize_extension)
}

/// Built-in extension table. `ext` must be lower-case with a leading dot.
pub fn standard_content_type(ext: &str) -> Option<&'static str> {
    let ty = match ext {
        // Images
        ".avif" => "image/avif",
        ".bmp" => "image/bmp",
        ".gif" => "image/gif",
        ".heic" => "image/heic",
        ".heif" => "image/heif",
        ".ico" => "image/vnd.microsoft.icon",
        ".jpeg" | ".jpg" => "image/jpeg",
        ".png" => "image/png",
        ".svg" => "image/svg+xml",
        ".tif" | ".tiff" => "image/tiff",
        ".webp" => "image/webp",

        // Audio
        ".aac" => "audio/aac",
        ".flac" => "audio/flac",
        ".m4a" => "audio/mp4",
        ".mid" | ".midi" => "audio/midi",
        ".mp3" => "audio/mpeg",
        ".oga" | ".ogg" | ".opus" => "audio/ogg",
        ".wav" => "audio/wav",
        ".wma" => "audio/x-ms-wma",

        // Video
        ".3gp" => "video/3gpp",
        ".avi" => "video/x-msvideo",
        ".flv" => "video/x-flv",
        ".m4v" => "video/x-m4v",
        ".mkv" => "video/x-matroska",
        ".mov" => "video/quicktime",
        ".mp4" => "video/mp4",
        ".mpeg" | ".mpg" => "video/mpeg",
        ".ogv" => "video/ogg",
        ".webm" => "video/webm",
        ".wmv" => "video/x-ms-wmv",

        // Documents
        ".csv" => "text/csv",
        ".doc" => "application/msword",
        ".docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".epub" => "application/epub+zip",
        ".md" => "text/markdown",
        ".odp" => "application/vnd.oasis.opendocument.presentation",
        ".ods" => "application/vnd.oasis.opendocument.spreadsheet",
        ".odt" => "application/vnd.oasis.opendocument.text",
        ".pdf" => "application/pdf",
        ".ppt" => "application/vnd.ms-powerpoint",
        ".pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ".rtf" => "application/rtf",
        ".txt" => "text/plain",
        ".xls" => "application/vnd.ms-excel",
        ".xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",

        // Archives
        ".7z" => "application/x-7z-compressed",
        ".bz2" => "application/x-bzip2",
        ".gz" => "application/gzip",
        ".rar" => "application/x-rar-compressed",
        ".tar" => "application/x-tar",
        ".xz" => "application/x-xz",
        ".zip" => "application/zip",

        // Executables and packages
        ".apk" => "application/vnd.android.package-archive",
        ".exe" => "application/x-msdos-program",
        ".msi" => "application/x-msi",

        // Code and markup
        ".c" | ".h" => "text/x-c",
        ".cpp" | ".hpp" => "text/x-c++src",
        ".css" => "text/css",
        ".go" => "text/x-go",
        ".htm" | ".html" => "text/html",
        ".java" => "text/x-java",
        ".js" | ".mjs" => "text/javascript",
        ".json" => "application/json",
        ".php" => "application/x-httpd-php",
        ".py" => "text/x-python",
        ".rb" => "text/x-ruby",
        ".rs" => "text/x-rust",
        ".sh" => "text/x-shellscript",
        ".toml" => "text/x-toml",
        ".ts" => "text/x-typescript",
        ".wasm" => "application/wasm",
        ".xml" => "text/xml",
        ".yaml" | ".yml" => "text/x-yaml",

        // Fonts
        ".otf" => "font/otf",
        ".ttf" => "font/ttf",
        ".woff" => "font/woff",
        ".woff2" => "font/woff2",

        _ => return None,
    };
    Some(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_case_insensitive_via_path() {
        let types = ContentTypes::default();
        assert_eq!(types.resolve(Path::new("/x/Photo.JPG")), Some("image/jpeg"));
        assert_eq!(types.resolve(Path::new("clip.mkv")), Some("video/x-matroska"));
    }

    #[test]
    fn test_override_wins_over_table() {
        let mut map = BTreeMap::new();
        map.insert("PNG".to_string(), "application/x-custom".to_string());
        map.insert(".dmg".to_string(), "application/x-apple-diskimage".to_string());
        let types = ContentTypes::new(&map);

        assert_eq!(types.resolve(Path::new("a.png")), Some("application/x-custom"));
        assert_eq!(types.resolve(Path::new("b.DMG")), Some("application/x-apple-diskimage"));
    }

    #[test]
    fn test_unknown_and_missing_extension() {
        let types = ContentTypes::default();
        assert_eq!(types.resolve(Path::new("notes.xyz")), None);
        assert_eq!(types.resolve(Path::new("Makefile")), None);
    }
}
