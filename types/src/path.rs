//! Diagnostic paths into a data tree.
//!
//! A [`DataPath`] names the location of a value inside a model's data, rooted
//! at a bracketed label (usually the model name). It is only ever used to
//! build error messages, so it renders to the familiar accessor syntax:
//!
//! ```text
//! [user].publishers[2].id
//! ```

use std::fmt;

/// One step below the root: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, ".{key}"),
            PathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Location of a value within a root data tree.
///
/// Extending a path never mutates it; [`DataPath::key`] and
/// [`DataPath::index`] return a new path so siblings can share a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataPath {
    root: String,
    segments: Vec<PathSegment>,
}

impl DataPath {
    /// Root path labelled `[label]`.
    #[must_use]
    pub fn root(label: impl AsRef<str>) -> Self {
        Self {
            root: format!("[{}]", label.as_ref()),
            segments: Vec::new(),
        }
    }

    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.with(PathSegment::Key(key.into()))
    }

    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.with(PathSegment::Index(index))
    }

    /// Extend this path by every segment of a dot-joined watch expression.
    ///
    /// Numeric segments become array indices, everything else object keys.
    #[must_use]
    pub fn join_dotted(&self, dotted: &str) -> Self {
        let mut path = self.clone();
        for part in dotted.split('.').filter(|part| !part.is_empty()) {
            let segment = match part.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Key(part.to_string()),
            };
            path.segments.push(segment);
        }
        path
    }

    #[must_use]
    pub fn root_label(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    fn with(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        Self {
            root: self.root.clone(),
            segments,
        }
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
