//! Project tree inspection used before any analyzer runs

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::ffi::OsStr;
use std::path::Path;
use walkdir::WalkDir;

/// Documentation extensions that never need analyzing
const DOC_EXTENSIONS: &[&str] = &["md", "txt", "rst", "pdf", "doc", "docx"];

/// Well-known project files, matched on their stem with any extension
const DOC_FILE_STEMS: &[&str] = &[
    "license",
    "changelog",
    "authors",
    "contributors",
    "copying",
    "install",
    "news",
    "readme",
];

static DOCS_ALLOW_LIST: Lazy<GlobSet> = Lazy::new(|| {
    let mut builder = GlobSetBuilder::new();

    let patterns = DOC_EXTENSIONS
        .iter()
        .map(|ext| format!("**/*.{}", ext))
        .chain(DOC_FILE_STEMS.iter().flat_map(|stem| {
            [format!("**/{}", stem), format!("**/{}.*", stem)]
        }));

    for pattern in patterns {
        match GlobBuilder::new(&pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()
        {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!("Invalid documentation pattern {}: {}", pattern, e),
        }
    }

    builder.build().unwrap_or_else(|e| {
        warn!("Failed to build documentation allow-list: {}", e);
        GlobSet::empty()
    })
});

/// Whether `relative_path` is documentation or a well-known project file
pub fn is_documentation_file(relative_path: &Path) -> bool {
    DOCS_ALLOW_LIST.is_match(relative_path)
}

fn is_git_metadata(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with(".git")
}

/// Whether the tree holds nothing but documentation.
///
/// Git metadata (`.git/`, `.github/`, `.gitignore` and friends) is not
/// counted. An empty tree is docs-only.
/// A walk error answers `false` so the analyzers still run.
pub fn is_docs_only_tree(root: &Path) -> bool {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_git_metadata(entry.file_name()));

    let mut docs = 0usize;
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error checking repository content: {}", e);
                return false;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if !is_documentation_file(relative) {
            debug!("Found code file {:?}, tree is not docs-only", relative);
            return false;
        }
        docs += 1;
    }

    debug!("Tree at {:?} holds only {} documentation files", root, docs);
    true
}
