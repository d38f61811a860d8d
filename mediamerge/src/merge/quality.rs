//! Quality tag matching and filename rewriting.
//!
//! A quality tag is a short token such as `uhd`, `hd` or `4k`. Source trees
//! carry it in their directory name (`/media/tv-uhd`) and media files carry it
//! in their file name (`episode-uhd.mkv`). In both places it appears as the
//! substring `-<tag>`.

use std::path::Path;

/// Matches and rewrites quality tags from a configured vocabulary.
///
/// The vocabulary order is the order tags are tried in. It has no influence on
/// which source wins an item; that is decided by source path order alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityTagger {
    tags: Vec<String>,
}

impl QualityTagger {
    /// Create a tagger for the given vocabulary.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// The configured vocabulary, in matching order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Determine the quality tag a source path represents.
    ///
    /// Looks at the trailing component only. When the name contains several
    /// tags, the first one in vocabulary order is returned.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    /// use mediamerge::merge::QualityTagger;
    ///
    /// let tagger = QualityTagger::new(["uhd", "hd"]);
    /// assert_eq!(tagger.tag_of(Path::new("/media/tv-uhd")), Some("uhd"));
    /// assert_eq!(tagger.tag_of(Path::new("/media/tv-hd")), Some("hd"));
    /// assert_eq!(tagger.tag_of(Path::new("/media/tv")), None);
    /// ```
    pub fn tag_of(&self, path: &Path) -> Option<&str> {
        let name = path.file_name()?.to_string_lossy();
        self.tags
            .iter()
            .find(|tag| name.contains(&format!("-{}", tag)))
            .map(String::as_str)
    }

    /// Remove every `-<tag>` occurrence, for every tag, from a file name.
    ///
    /// ```
    /// use mediamerge::merge::QualityTagger;
    ///
    /// let tagger = QualityTagger::new(["uhd", "hd"]);
    /// assert_eq!(tagger.strip_tags("film-uhd.mkv"), "film.mkv");
    /// assert_eq!(tagger.strip_tags("film.mkv"), "film.mkv");
    /// ```
    pub fn strip_tags(&self, filename: &str) -> String {
        self.tags
            .iter()
            .fold(filename.to_string(), |name, tag| {
                name.replace(&format!("-{}", tag), "")
            })
    }

    /// Insert `-<tag>` between a base name's stem and its extension.
    ///
    /// ```
    /// use mediamerge::merge::QualityTagger;
    ///
    /// assert_eq!(QualityTagger::retag("film.mkv", "uhd"), "film-uhd.mkv");
    /// assert_eq!(QualityTagger::retag("README", "hd"), "README-hd");
    /// ```
    pub fn retag(base_name: &str, tag: &str) -> String {
        let (stem, extension) = split_extension(base_name);
        format!("{}-{}{}", stem, tag, extension)
    }

    /// The name a source file gets in the merged tree.
    pub fn merged_name(&self, filename: &str, tag: &str) -> String {
        Self::retag(&self.strip_tags(filename), tag)
    }
}

/// Split a file name into stem and extension (extension keeps its dot).
///
/// Leading dots belong to the stem, so `.nfo` has no extension.
fn split_extension(name: &str) -> (&str, &str) {
    let first_non_dot = name.find(|c| c != '.').unwrap_or(name.len());
    match name[first_non_dot..].rfind('.') {
        Some(idx) => name.split_at(first_non_dot + idx),
        None => (name, ""),
    }
}
