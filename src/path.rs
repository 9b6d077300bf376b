//! Menu path utilities
//!
//! A menu path is a `/`-delimited list of folder names, optionally ending in a
//! leaf name. A literal slash inside a name is written `\/`. Any folder
//! segment may end in `.dup.<N>` to pick the Nth folder (0-indexed) with that
//! name among its siblings.

use regex::Regex;
use std::sync::OnceLock;

/// Marker separating a folder name from its sibling index.
pub const DUP_MARKER: &str = ".dup.";

/// Split a menu path into its segments.
///
/// Empty or whitespace-only input yields no segments at all (not one empty
/// segment). `\/` becomes a literal `/` inside the current segment; every
/// other character, including other backslashes, is kept as written.
///
/// # Examples
///
/// ```
/// use avatar_compose::path::split_path;
///
/// assert_eq!(split_path(r"Clothing/Shirt\/Jacket"), vec!["Clothing", "Shirt/Jacket"]);
/// assert!(split_path("  ").is_empty());
/// ```
pub fn split_path(path: &str) -> Vec<String> {
    if path.trim().is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'/') => {
                chars.next();
                current.push('/');
            }
            '/' => segments.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    segments.push(current);

    segments
}

/// Join segments back into a path, escaping slashes inside names.
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref().replace('/', "\\/"))
        .collect::<Vec<_>>()
        .join("/")
}

/// A folder segment with its `.dup.<N>` suffix separated out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderSegment<'a> {
    /// Folder name as it appears on the control
    pub name: &'a str,
    /// Which same-named sibling to select
    pub offset: usize,
}

/// Parse a folder segment, splitting off a `.dup.<N>` suffix if present.
///
/// A suffix that is not a valid index leaves the segment untouched, so the
/// whole text is used as the folder name.
pub fn parse_folder_segment(segment: &str) -> FolderSegment<'_> {
    if let Some(at) = segment.find(DUP_MARKER) {
        if let Ok(offset) = segment[at + DUP_MARKER.len()..].parse::<usize>() {
            return FolderSegment {
                name: &segment[..at],
                offset,
            };
        }
        log::debug!("Ignoring malformed dup suffix in menu segment '{}'", segment);
    }
    FolderSegment {
        name: segment,
        offset: 0,
    }
}

/// Build the segment used to address the `dup_id`-th folder called `name`.
pub fn dup_segment(name: &str, dup_id: usize) -> String {
    if dup_id > 0 {
        format!("{}{}{}", name, DUP_MARKER, dup_id)
    } else {
        name.to_string()
    }
}

/// Strip rich-text tags and collapse repeated spaces in a menu title.
pub fn clean_title(title: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    let tags = TAGS.get_or_init(|| Regex::new("<.*?>").expect("static regex"));
    let spaces = SPACES.get_or_init(|| Regex::new(" +").expect("static regex"));

    let stripped = tags.replace_all(title, "");
    spaces.replace_all(&stripped, " ").trim().to_string()
}

/// Name given to a generated menu addressed by `path`.
pub fn menu_asset_name<S: AsRef<str>>(path: &[S]) -> String {
    if path.is_empty() {
        return "VRCF_Menu".to_string();
    }
    let cleaned: Vec<String> = path.iter().map(|s| clean_title(s.as_ref())).collect();
    format!("VRCF_Menu_{}", cleaned.join("_"))
}
