//! An index for random access to graph blocks by source offsets.
//!
//! The index stores, for every source, its constituent blocks in offset order.
//! A single lookup is a binary search over the blocks of one source.
//! The index is always rebuilt from the graph after a merge batch;
//! it is never patched incrementally, so it cannot diverge from the graph.

use crate::graph::{Graph, GraphError};

use std::collections::HashMap;
use std::ops::Range;


//-----------------------------------------------------------------------------

// One block of a source: the offset range it covers and its identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct IndexEntry {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) block: usize,
}

/// An offset index over the blocks of every source in a [`Graph`].
///
/// Sources are identified by the same identifiers as in the graph the index
/// was built from.
/// Building the index validates that the blocks of every source tile its
/// covered range, so a successful build is also a coverage check.
///
/// # Examples
///
/// ```
/// use obg_base::{AltLocus, BlockIndex, Graph};
///
/// let chromosomes = vec![("chr1".to_string(), 1000)];
/// let loci = vec![AltLocus {
///     name: "altA".to_string(),
///     host: "chr1".to_string(),
///     start: 300, end: 500, length: 200,
/// }];
/// let graph = Graph::create(&chromosomes, &loci).unwrap();
/// let index = BlockIndex::new(&graph).unwrap();
///
/// let chr1 = index.source_id("chr1").unwrap();
/// let (block, offset) = index.find(chr1, 450).unwrap();
/// assert_eq!(graph.block(block).unwrap().len(), 200);
/// assert_eq!(offset, 150);
///
/// // Lookups outside the covered range fail.
/// assert!(index.find(chr1, 1000).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockIndex {
    // Source names in identifier order.
    names: Vec<String>,

    // Maps source names to identifiers.
    ids: HashMap<String, usize>,

    // Covered range for each source.
    covered: Vec<Range<usize>>,

    // Blocks of each source in offset order.
    entries: Vec<Vec<IndexEntry>>,
}

impl BlockIndex {
    /// Builds the index for the given graph.
    ///
    /// Returns [`GraphError::InvariantViolation`] if the blocks of some
    /// source do not tile its covered range.
    pub fn new(graph: &Graph) -> Result<Self, GraphError> {
        let mut names: Vec<String> = Vec::with_capacity(graph.source_count());
        let mut ids: HashMap<String, usize> = HashMap::with_capacity(graph.source_count());
        let mut covered: Vec<Range<usize>> = Vec::with_capacity(graph.source_count());
        let mut entries: Vec<Vec<IndexEntry>> = vec![Vec::new(); graph.source_count()];

        for (id, source) in graph.sources() {
            names.push(source.name.clone());
            ids.insert(source.name.clone(), id);
            covered.push(source.covered.clone());
        }
        for (id, block) in graph.blocks() {
            for iv in block.intervals() {
                entries[iv.source].push(IndexEntry { start: iv.start, end: iv.end, block: id });
            }
        }
        for (source, list) in entries.iter_mut().enumerate() {
            list.sort_unstable_by_key(|entry| entry.start);
            let mut offset = covered[source].start;
            for entry in list.iter() {
                if entry.start != offset || entry.end <= entry.start {
                    return Err(GraphError::InvariantViolation(
                        format!("{} is not tiled at offset {}", names[source], offset)
                    ));
                }
                offset = entry.end;
            }
            if offset != covered[source].end {
                return Err(GraphError::InvariantViolation(
                    format!("{} is not tiled at offset {}", names[source], offset)
                ));
            }
        }

        Ok(BlockIndex { names, ids, covered, entries })
    }

    /// Returns the number of indexed sources.
    #[inline]
    pub fn source_count(&self) -> usize {
        self.names.len()
    }

    /// Returns the identifier of the source with the given name.
    #[inline]
    pub fn source_id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).cloned()
    }

    /// Returns the name of the given source.
    #[inline]
    pub fn source_name(&self, source: usize) -> Option<&str> {
        self.names.get(source).map(|name| name.as_str())
    }

    /// Returns the covered offset range of the given source.
    #[inline]
    pub fn covered(&self, source: usize) -> Option<Range<usize>> {
        self.covered.get(source).cloned()
    }

    /// Returns the block containing the given offset of the given source,
    /// along with the block-local offset.
    ///
    /// The lookup is a binary search over the blocks of the source.
    ///
    /// # Errors
    ///
    /// * [`GraphError::SourceNotFound`]: unknown source identifier.
    /// * [`GraphError::OffsetOutOfRange`]: the offset is outside the covered
    ///   range of the source.
    pub fn find(&self, source: usize, offset: usize) -> Result<(usize, usize), GraphError> {
        let entries = self.entries.get(source).ok_or(
            GraphError::SourceNotFound(format!("source {}", source))
        )?;
        let range = &self.covered[source];
        if offset < range.start || offset >= range.end {
            return Err(GraphError::OffsetOutOfRange {
                source: self.names[source].clone(),
                offset,
                len: range.end,
            });
        }
        let rank = entries.partition_point(|entry| entry.end <= offset);
        let entry = &entries[rank];
        Ok((entry.block, offset - entry.start))
    }

    /// Returns the blocks of the given source in offset order, as pairs of
    /// an offset range and a block identifier.
    pub fn blocks_for(&self, source: usize) -> impl Iterator<Item = (Range<usize>, usize)> + '_ {
        self.entries.get(source).into_iter().flatten().map(|entry| {
            (entry.start..entry.end, entry.block)
        })
    }

    // The entries of a source, for in-crate iteration.
    pub(crate) fn entries(&self, source: usize) -> &[IndexEntry] {
        self.entries.get(source).map_or(&[], |list| list.as_slice())
    }
}

//-----------------------------------------------------------------------------
