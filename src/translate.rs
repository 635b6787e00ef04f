//! Translation between flat source coordinates and graph positions.
//!
//! A [`Translation`] projects a linear interval of one source onto the blocks
//! of a [`Graph`] and back.
//! It is derived data: it wraps a [`BlockIndex`] built from the current graph
//! and must be rebuilt whenever the graph changes.
//!
//! The round-trip law holds for any interval within the covered range of a
//! source: `inverse(source, translate(source, start, end))` reconstructs
//! exactly `(source, start, end)`.

use crate::block_index::BlockIndex;
use crate::graph::{Graph, GraphError};

use std::fmt::Display;


//-----------------------------------------------------------------------------

/// Strand of a linear annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strand {
    /// The forward strand (`+`).
    Forward,
    /// The reverse strand (`-`).
    Reverse,
}

impl Strand {
    /// Parses a strand from its symbol (`+` or `-`).
    pub fn from_symbol(symbol: u8) -> Option<Self> {
        match symbol {
            b'+' => Some(Strand::Forward),
            b'-' => Some(Strand::Reverse),
            _ => None,
        }
    }

    /// Returns the symbol for the strand.
    pub fn symbol(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

//-----------------------------------------------------------------------------

/// A half-open interval in the flat coordinates of one source sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinearInterval {
    /// Name of the source sequence.
    pub source: String,
    /// Start offset.
    pub start: usize,
    /// End offset.
    pub end: usize,
    /// Strand of the annotation.
    pub strand: Strand,
}

impl LinearInterval {
    /// Creates a new forward-strand interval.
    pub fn new(source: &str, start: usize, end: usize) -> Self {
        LinearInterval {
            source: source.to_string(),
            start, end,
            strand: Strand::Forward,
        }
    }

    /// Returns the interval with the given strand.
    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = strand;
        self
    }

    /// Returns the length of the interval.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the interval is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl Display for LinearInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}-{}({})", self.source, self.start, self.end, self.strand)
    }
}

//-----------------------------------------------------------------------------

/// A run of one block, in block-local offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockSlice {
    /// Identifier of the block.
    pub block: usize,
    /// Start offset within the block.
    pub start: usize,
    /// End offset within the block.
    pub end: usize,
}

impl BlockSlice {
    /// Returns the length of the slice.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the slice is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The projection of a linear interval onto the graph: an ordered sequence of
/// block slices in source order.
///
/// An interval spanning multiple blocks yields multiple slices, each clipped
/// to its containing block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphInterval {
    slices: Vec<BlockSlice>,
}

impl GraphInterval {
    /// Returns the slices of the projection.
    pub fn slices(&self) -> &[BlockSlice] {
        &self.slices
    }

    /// Returns an iterator over the block identifiers of the projection.
    pub fn blocks(&self) -> impl Iterator<Item = usize> + '_ {
        self.slices.iter().map(|slice| slice.block)
    }

    /// Returns the total length of the projection.
    pub fn len(&self) -> usize {
        self.slices.iter().map(|slice| slice.len()).sum()
    }

    /// Returns `true` if the projection is empty.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl Display for GraphInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for slice in self.slices.iter() {
            write!(f, ">{}[{}-{})", slice.block, slice.start, slice.end)?;
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// Translation between flat source coordinates and graph positions.
///
/// # Examples
///
/// ```
/// use obg_base::{AltLocus, Graph, Translation};
///
/// let chromosomes = vec![("chr1".to_string(), 1000)];
/// let loci = vec![AltLocus {
///     name: "altA".to_string(),
///     host: "chr1".to_string(),
///     start: 300, end: 500, length: 200,
/// }];
/// let graph = Graph::create(&chromosomes, &loci).unwrap();
/// let translation = Translation::new(&graph).unwrap();
///
/// // An interval crossing the divergence point at 300 covers two blocks.
/// let projected = translation.translate("chr1", 250, 350).unwrap();
/// assert_eq!(projected.slices().len(), 2);
/// assert_eq!(projected.len(), 100);
///
/// // The inverse reconstructs the original interval.
/// let back = translation.inverse(&graph, "chr1", &projected).unwrap();
/// assert_eq!((back.start, back.end), (250, 350));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Translation {
    index: BlockIndex,
}

impl Translation {
    /// Builds a translation for the given graph.
    pub fn new(graph: &Graph) -> Result<Self, GraphError> {
        Ok(Translation { index: BlockIndex::new(graph)? })
    }

    /// Returns the underlying block index.
    pub fn index(&self) -> &BlockIndex {
        &self.index
    }

    /// Projects the interval `[start, end)` of the named source onto the graph.
    ///
    /// The result covers the interval exactly, in source order.
    ///
    /// # Errors
    ///
    /// * [`GraphError::SourceNotFound`]: unknown source name.
    /// * [`GraphError::OffsetOutOfRange`]: the interval is empty or extends
    ///   outside the covered range of the source.
    pub fn translate(&self, source: &str, start: usize, end: usize) -> Result<GraphInterval, GraphError> {
        let id = self.index.source_id(source).ok_or(
            GraphError::SourceNotFound(source.to_string())
        )?;
        let covered = self.index.covered(id).unwrap();
        if start >= end || start < covered.start || end > covered.end {
            return Err(GraphError::OffsetOutOfRange {
                source: source.to_string(),
                offset: if start >= covered.start { end } else { start },
                len: covered.end,
            });
        }

        let entries = self.index.entries(id);
        let mut slices: Vec<BlockSlice> = Vec::new();
        let mut rank = entries.partition_point(|entry| entry.end <= start);
        while rank < entries.len() && entries[rank].start < end {
            let entry = &entries[rank];
            slices.push(BlockSlice {
                block: entry.block,
                start: start.max(entry.start) - entry.start,
                end: end.min(entry.end) - entry.start,
            });
            rank += 1;
        }
        Ok(GraphInterval { slices })
    }

    /// Projects a linear interval onto the graph. See [`Self::translate`].
    pub fn translate_interval(&self, interval: &LinearInterval) -> Result<GraphInterval, GraphError> {
        self.translate(&interval.source, interval.start, interval.end)
    }

    /// Reconstructs the flat interval a projection corresponds to in the
    /// frame of the named source.
    ///
    /// This is the inverse of [`Self::translate`]: for any projection
    /// produced by `translate(source, start, end)`, it returns
    /// `(source, start, end)`.
    ///
    /// # Errors
    ///
    /// * [`GraphError::SourceNotFound`]: unknown source name.
    /// * [`GraphError::InvalidMetadata`]: the traversal is empty, visits a
    ///   block with no frame on the source, or is not contiguous in the
    ///   frame of the source.
    pub fn inverse(&self, graph: &Graph, source: &str, interval: &GraphInterval) -> Result<LinearInterval, GraphError> {
        let id = self.index.source_id(source).ok_or(
            GraphError::SourceNotFound(source.to_string())
        )?;
        let mut result: Option<(usize, usize)> = None;
        for slice in interval.slices() {
            let block = graph.block(slice.block).ok_or(GraphError::InvariantViolation(
                format!("block {} is not in the graph", slice.block)
            ))?;
            let iv = block.interval_for(id).ok_or(GraphError::InvalidMetadata(
                format!("block {} has no frame on {}", slice.block, source)
            ))?;
            let start = iv.start + slice.start;
            let end = iv.start + slice.end;
            result = match result {
                None => Some((start, end)),
                Some((first, previous)) if previous == start => Some((first, end)),
                Some(_) => {
                    return Err(GraphError::InvalidMetadata(
                        format!("the traversal is not contiguous on {}", source)
                    ));
                },
            };
        }
        let (start, end) = result.ok_or(GraphError::InvalidMetadata(
            String::from("empty traversal")
        ))?;
        Ok(LinearInterval::new(source, start, end))
    }

    /// Describes an arbitrary traversal of the graph as maximal per-source
    /// linear intervals.
    ///
    /// Each slice continues the current interval if it is contiguous in the
    /// same frame; otherwise a new interval is started.
    /// A shared block starting a new interval is attributed to its chromosome
    /// frame.
    pub fn path_intervals(&self, graph: &Graph, slices: &[BlockSlice]) -> Result<Vec<LinearInterval>, GraphError> {
        let mut result: Vec<LinearInterval> = Vec::new();
        let mut current: Option<(usize, usize, usize)> = None; // (source, start, end)
        for slice in slices {
            let block = graph.block(slice.block).ok_or(GraphError::InvariantViolation(
                format!("block {} is not in the graph", slice.block)
            ))?;
            let intervals = block.intervals();

            // Continue the current interval if some frame is contiguous with it.
            if let Some((source, start, end)) = current {
                let continuation = intervals.iter().find(|iv| {
                    iv.source == source && iv.start + slice.start == end
                });
                if let Some(iv) = continuation {
                    current = Some((source, start, iv.start + slice.end));
                    continue;
                }
                result.push(self.to_linear(source, start, end)?);
            }

            // Start a new interval, preferring the chromosome frame.
            let iv = intervals[0];
            current = Some((iv.source, iv.start + slice.start, iv.start + slice.end));
        }
        if let Some((source, start, end)) = current {
            result.push(self.to_linear(source, start, end)?);
        }
        Ok(result)
    }

    // Builds a linear interval from a source identifier and offsets.
    fn to_linear(&self, source: usize, start: usize, end: usize) -> Result<LinearInterval, GraphError> {
        let name = self.index.source_name(source).ok_or(
            GraphError::SourceNotFound(format!("source {}", source))
        )?;
        Ok(LinearInterval::new(name, start, end))
    }
}

//-----------------------------------------------------------------------------
