//! Fragment trees: pages assembled from borrowed and owned pieces.
//!
//! A page is mostly shared material (theme CSS, header/footer components,
//! post bodies) wrapped in a little page-specific markup. Copying the shared
//! parts into every page would mean copying each stylesheet once per page per
//! theme. A [`FragmentTree`] instead holds an ordered list of leaves and
//! subtrees, each either owned by the tree or borrowed from content that
//! outlives it:
//!
//! ```text
//! page ─┬─ Owned("<html><head>…")         page-specific markup
//!       ├─ Borrowed(&theme.main_css)      shared, never copied
//!       ├─ Owned("</style><body>…")
//!       ├─ BorrowedTree(&body)            built once, used by both themes
//!       └─ Borrowed(&components.footer)
//! ```
//!
//! Consecutive owned-text appends extend the same owned leaf. Any borrowed
//! or subtree append ends that run, so the next owned text starts a new leaf
//! after it and the document order always matches append order.
//!
//! The tree is only flattened for writing. Comparing with the file on disk
//! streams the leaves depth-first against the file's blocks, so an unchanged
//! page is never materialized at all.

use crate::buffer::{BufferError, FileComparison, GrowableBuffer, StreamComparer};
use std::fmt;
use std::path::Path;

/// One node of a [`FragmentTree`].
#[derive(Debug)]
pub enum Fragment<'a> {
    Owned(GrowableBuffer),
    Borrowed(&'a GrowableBuffer),
    OwnedTree(FragmentTree<'a>),
    BorrowedTree(&'a FragmentTree<'a>),
}

#[derive(Debug, Default)]
pub struct FragmentTree<'a> {
    nodes: Vec<Fragment<'a>>,
    /// Index of the owned leaf that owned-text appends currently extend.
    append_target: Option<usize>,
}

impl<'a> FragmentTree<'a> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            append_target: None,
        }
    }

    fn push(&mut self, node: Fragment<'a>) -> Result<usize, BufferError> {
        self.nodes
            .try_reserve(1)
            .map_err(|_| BufferError::OutOfMemory {
                requested: std::mem::size_of::<Fragment<'a>>(),
            })?;
        self.nodes.push(node);
        Ok(self.nodes.len() - 1)
    }

    /// Fill the owned leaf currently receiving text, or a new one.
    ///
    /// A new leaf only joins the tree once `fill` succeeded.
    fn with_target_leaf(
        &mut self,
        fill: impl FnOnce(&mut GrowableBuffer) -> Result<(), BufferError>,
    ) -> Result<(), BufferError> {
        if let Some(Fragment::Owned(buffer)) =
            self.append_target.and_then(|index| self.nodes.get_mut(index))
        {
            return fill(buffer);
        }
        let mut buffer = GrowableBuffer::new();
        fill(&mut buffer)?;
        let index = self.push(Fragment::Owned(buffer))?;
        self.append_target = Some(index);
        Ok(())
    }

    /// Append text to the current owned leaf.
    pub fn append_owned_text(&mut self, text: &str) -> Result<(), BufferError> {
        if text.is_empty() {
            return Ok(());
        }
        self.with_target_leaf(|leaf| leaf.append(text))
    }

    /// Append formatted text to the current owned leaf.
    pub fn append_formatted(&mut self, args: fmt::Arguments<'_>) -> Result<(), BufferError> {
        self.with_target_leaf(|leaf| leaf.append_formatted(args))
    }

    /// Append an already-built buffer as its own owned leaf.
    pub fn append_owned_buffer(&mut self, buffer: GrowableBuffer) -> Result<(), BufferError> {
        self.push(Fragment::Owned(buffer))?;
        self.append_target = None;
        Ok(())
    }

    /// Reference `buffer` without copying it.
    pub fn append_borrowed_buffer(
        &mut self,
        buffer: &'a GrowableBuffer,
    ) -> Result<(), BufferError> {
        self.push(Fragment::Borrowed(buffer))?;
        self.append_target = None;
        Ok(())
    }

    /// Start a nested tree owned by this one and return it for filling.
    pub fn append_owned_subtree(&mut self) -> Result<&mut FragmentTree<'a>, BufferError> {
        self.push(Fragment::OwnedTree(FragmentTree::new()))?;
        self.append_target = None;
        match self.nodes.last_mut() {
            Some(Fragment::OwnedTree(tree)) => Ok(tree),
            _ => unreachable!("owned subtree was just pushed"),
        }
    }

    /// Move a finished tree in as a child.
    pub fn append_subtree(&mut self, tree: FragmentTree<'a>) -> Result<(), BufferError> {
        self.push(Fragment::OwnedTree(tree))?;
        self.append_target = None;
        Ok(())
    }

    /// Reference another tree without copying it.
    pub fn append_borrowed_subtree(
        &mut self,
        tree: &'a FragmentTree<'a>,
    ) -> Result<(), BufferError> {
        self.push(Fragment::BorrowedTree(tree))?;
        self.append_target = None;
        Ok(())
    }

    pub fn nodes(&self) -> &[Fragment<'a>] {
        &self.nodes
    }

    /// Leaf contents in document order.
    pub fn leaves(&self) -> Leaves<'_, 'a> {
        Leaves {
            stack: vec![self.nodes.iter()],
        }
    }

    /// Sum of all leaf lengths, computed on demand.
    pub fn total_length(&self) -> usize {
        self.leaves().map(<[u8]>::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves().all(<[u8]>::is_empty)
    }

    /// Flatten into one buffer sized exactly once.
    pub fn materialize(&self) -> Result<GrowableBuffer, BufferError> {
        let mut out = GrowableBuffer::with_capacity(self.total_length())?;
        for leaf in self.leaves() {
            out.append_bytes(leaf)?;
        }
        Ok(out)
    }

    /// Compare with the file at `path` without materializing.
    pub fn equals_file(&self, path: &Path) -> Result<FileComparison, BufferError> {
        let Some(mut comparer) = StreamComparer::open(path, self.total_length())? else {
            return Ok(FileComparison::Distinct);
        };
        for leaf in self.leaves() {
            if !comparer.feed(leaf)? {
                return Ok(FileComparison::Distinct);
            }
        }
        comparer.finish()
    }
}

/// Depth-first iterator over leaf bytes.
pub struct Leaves<'t, 'a> {
    stack: Vec<std::slice::Iter<'t, Fragment<'a>>>,
}

impl<'t, 'a: 't> Iterator for Leaves<'t, 'a> {
    type Item = &'t [u8];

    fn next(&mut self) -> Option<&'t [u8]> {
        loop {
            let node = match self.stack.last_mut()?.next() {
                Some(node) => node,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            match node {
                Fragment::Owned(buffer) => return Some(buffer.as_bytes()),
                Fragment::Borrowed(buffer) => return Some(buffer.as_bytes()),
                Fragment::OwnedTree(tree) => self.stack.push(tree.nodes.iter()),
                Fragment::BorrowedTree(tree) => self.stack.push(tree.nodes.iter()),
            }
        }
    }
}
