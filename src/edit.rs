use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The fundamental edit primitive: literal search-and-replace.
///
/// Every patch, whether built in or loaded from a patch file, compiles down to
/// this. No pattern syntax is involved; `search` is matched byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "TextEdit does nothing until substitute() is called"]
pub struct TextEdit {
    /// Exact text to look for
    pub search: String,
    /// Text written in place of each occurrence
    pub replacement: String,
}

/// Outcome of running a [`TextEdit`] over some content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// Content after replacement
    pub content: String,
    /// Occurrences that were rewritten
    pub replaced: usize,
    /// Occurrences found inside an existing copy of the replacement
    pub already_applied: usize,
}

impl Substitution {
    /// True when the content differs from the input.
    pub fn changed(&self) -> bool {
        self.replaced > 0
    }

    /// True when the search text was not present in any form.
    pub fn is_no_match(&self) -> bool {
        self.replaced == 0 && self.already_applied == 0
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("Path has no parent directory: {0}")]
    NoParent(PathBuf),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How patched content is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate the file in place and write the new content.
    #[default]
    Truncate,
    /// Write to a sibling tempfile, fsync, then rename over the target.
    Atomic,
}

impl TextEdit {
    pub fn new(search: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replacement: replacement.into(),
        }
    }

    /// Replace every occurrence of `search` in `content`.
    ///
    /// Occurrences are scanned left to right without overlap. When the
    /// replacement itself embeds the search text, an occurrence that already
    /// sits inside a full copy of the replacement is left alone, so running
    /// the same edit twice is a no-op. When the search text is gone but the
    /// replacement is present, each copy of the replacement counts as already
    /// applied. An empty search matches nothing.
    pub fn substitute(&self, content: &str) -> Substitution {
        if self.search.is_empty() {
            return Substitution {
                content: content.to_string(),
                replaced: 0,
                already_applied: 0,
            };
        }

        // Offset of the search text inside the replacement, if it is embedded.
        let anchor = self.replacement.find(self.search.as_str());

        let mut out = String::with_capacity(content.len());
        let mut last = 0;
        let mut replaced = 0;
        let mut already_applied = 0;

        for (start, _) in content.match_indices(self.search.as_str()) {
            if let Some(offset) = anchor {
                let applied = start >= offset
                    && content
                        .get(start - offset..)
                        .is_some_and(|rest| rest.starts_with(self.replacement.as_str()));
                if applied {
                    already_applied += 1;
                    continue;
                }
            }

            out.push_str(&content[last..start]);
            out.push_str(&self.replacement);
            last = start + self.search.len();
            replaced += 1;
        }
        out.push_str(&content[last..]);

        if replaced == 0 && already_applied == 0 && !self.replacement.is_empty() {
            already_applied = content.matches(self.replacement.as_str()).count();
        }

        Substitution {
            content: out,
            replaced,
            already_applied,
        }
    }
}

/// Persist `content` to `path` using the given strategy.
pub fn write_content(path: &Path, content: &[u8], mode: WriteMode) -> Result<(), EditError> {
    match mode {
        WriteMode::Truncate => {
            fs::write(path, content)?;
            Ok(())
        }
        WriteMode::Atomic => atomic_write(path, content),
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or the target is left untouched.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Same directory keeps the rename on one filesystem
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(EditError::NoParent(path.to_path_buf())),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
