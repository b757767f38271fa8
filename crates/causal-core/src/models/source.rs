use serde::{Deserialize, Serialize};

/// One file of the analysed batch, as supplied by the source provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

/// Extensions the engine parses
pub const SUPPORTED_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Whether `path` is an analysable source file: a TS/JS module that is not a
/// declaration file, a test, or vendored under `node_modules`.
pub fn is_analyzable_path(path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    if normalized.contains("node_modules/") || normalized.ends_with(".d.ts") {
        return false;
    }
    if normalized.contains(".test.") || normalized.contains(".spec.") {
        return false;
    }
    normalized
        .rsplit_once('.')
        .map(|(_, ext)| SUPPORTED_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_non_source_paths() {
        assert!(is_analyzable_path("src/app/page.tsx"));
        assert!(is_analyzable_path("lib/util.js"));
        assert!(!is_analyzable_path("src/types/global.d.ts"));
        assert!(!is_analyzable_path("node_modules/react/index.js"));
        assert!(!is_analyzable_path("src/auth.test.ts"));
        assert!(!is_analyzable_path("src/auth.spec.tsx"));
        assert!(!is_analyzable_path("README.md"));
    }

    #[test]
    fn extension_ignores_directories_with_dots() {
        let file = SourceFile::new("src/v1.2/handler", "");
        assert_eq!(file.extension(), None);
        assert_eq!(SourceFile::new("a/b.tsx", "").extension(), Some("tsx"));
    }
}
