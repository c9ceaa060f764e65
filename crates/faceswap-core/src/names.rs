//! Upload file names: a random word from a list, or a fixed placeholder.

use std::path::Path;

use rand::seq::IndexedRandom;
use tracing::{debug, warn};

/// Picks the stem of the file name used when uploading a result.
///
/// The word list is read once; an unreadable or empty list degrades to the
/// placeholder instead of failing the upload.
#[derive(Debug, Clone)]
pub struct UploadNamer {
    words: Vec<String>,
    fallback: String,
}

impl UploadNamer {
    pub fn new(words: Vec<String>, fallback: impl Into<String>) -> Self {
        let words = words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        Self {
            words,
            fallback: fallback.into(),
        }
    }

    /// Load a newline-delimited word list from `path`.
    pub fn from_file(path: Option<&str>, fallback: impl Into<String>) -> Self {
        let words = match path {
            Some(p) => match std::fs::read_to_string(Path::new(p)) {
                Ok(contents) => contents.lines().map(str::to_string).collect(),
                Err(e) => {
                    warn!(path = %p, error = %e, "could not read word list, using placeholder names");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let namer = Self::new(words, fallback);
        debug!(words = namer.words.len(), "upload namer ready");
        namer
    }

    /// A file name with the given extension, e.g. `pelican.png`.
    pub fn file_name(&self, extension: &str) -> String {
        let stem = self
            .words
            .choose(&mut rand::rng())
            .map(|w| sanitize(w))
            .filter(|w| !w.is_empty())
            .unwrap_or_else(|| self.fallback.clone());
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            stem
        } else {
            format!("{stem}.{extension}")
        }
    }
}

/// Keep names filesystem- and URL-friendly.
fn sanitize(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn placeholder_without_word_list() {
        let namer = UploadNamer::from_file(None, "foo");
        assert_eq!(namer.file_name("png"), "foo.png");
        assert_eq!(namer.file_name(".jpg"), "foo.jpg");
    }

    #[test]
    fn unreadable_list_uses_placeholder() {
        let namer = UploadNamer::from_file(Some("/no/such/words.txt"), "foo");
        assert_eq!(namer.file_name("png"), "foo.png");
    }

    #[test]
    fn picks_a_line_from_the_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alpha\n\n  beta  \ngamma").unwrap();
        let namer = UploadNamer::from_file(file.path().to_str(), "foo");

        for _ in 0..20 {
            let name = namer.file_name("png");
            let stem = name.strip_suffix(".png").unwrap();
            assert!(["alpha", "beta", "gamma"].contains(&stem), "unexpected {name}");
        }
    }

    #[test]
    fn odd_characters_are_dropped() {
        let namer = UploadNamer::new(vec!["o'neil's".into()], "foo");
        assert_eq!(namer.file_name("gif"), "oneils.gif");

        let namer = UploadNamer::new(vec!["!!!".into()], "foo");
        assert_eq!(namer.file_name("gif"), "foo.gif");
    }
}
