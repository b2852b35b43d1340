//! Where the documents under comparison come from.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::node::{strip_comments, strip_whitespace, NodeRef};
use crate::xml::{parse_file, parse_str};

/// Provides the root of a document tree.
///
/// A source is loaded once per comparison; loading twice yields two
/// independent trees.
pub trait Source {
    fn load(&self) -> Result<NodeRef>;

    /// Identifies the source in log output, usually a path.
    fn system_id(&self) -> Option<&str> {
        None
    }
}

/// A document held in memory as text.
#[derive(Debug, Clone)]
pub struct StringSource {
    xml: String,
}

impl StringSource {
    pub fn new(xml: impl Into<String>) -> Self {
        StringSource { xml: xml.into() }
    }
}

impl Source for StringSource {
    fn load(&self) -> Result<NodeRef> {
        parse_str(&self.xml)
    }
}

/// A document read from disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    system_id: String,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let system_id = path.display().to_string();
        FileSource { path, system_id }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for FileSource {
    fn load(&self) -> Result<NodeRef> {
        parse_file(&self.path)
    }

    fn system_id(&self) -> Option<&str> {
        Some(&self.system_id)
    }
}

/// An already built tree.
#[derive(Debug, Clone)]
pub struct NodeSource {
    root: NodeRef,
}

impl NodeSource {
    pub fn new(root: NodeRef) -> Self {
        NodeSource { root }
    }
}

impl Source for NodeSource {
    fn load(&self) -> Result<NodeRef> {
        Ok(self.root.clone())
    }
}

/// Trims all text and drops whitespace-only text nodes of the wrapped source.
pub struct WhitespaceStrippedSource<S> {
    inner: S,
}

impl<S: Source> WhitespaceStrippedSource<S> {
    pub fn new(inner: S) -> Self {
        WhitespaceStrippedSource { inner }
    }
}

impl<S: Source> Source for WhitespaceStrippedSource<S> {
    fn load(&self) -> Result<NodeRef> {
        Ok(strip_whitespace(&self.inner.load()?))
    }

    fn system_id(&self) -> Option<&str> {
        self.inner.system_id()
    }
}

/// Drops all comments of the wrapped source.
pub struct CommentLessSource<S> {
    inner: S,
}

impl<S: Source> CommentLessSource<S> {
    pub fn new(inner: S) -> Self {
        CommentLessSource { inner }
    }
}

impl<S: Source> Source for CommentLessSource<S> {
    fn load(&self) -> Result<NodeRef> {
        Ok(strip_comments(&self.inner.load()?))
    }

    fn system_id(&self) -> Option<&str> {
        self.inner.system_id()
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn load(&self) -> Result<NodeRef> {
        (**self).load()
    }

    fn system_id(&self) -> Option<&str> {
        (**self).system_id()
    }
}
