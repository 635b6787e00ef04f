//! An offset-based sequence graph over chromosomes and alternate loci.
//!
//! The graph partitions every input sequence (each chromosome and each alt locus)
//! into [`Block`]s and connects the blocks with edges.
//! Each block represents a contiguous run of one or two original sequences.
//! A freshly built graph represents every alt locus as a simple diamond:
//! the primary path continues through the placement region, while the alternate
//! path branches out at `chromStart` and rejoins at `chromEnd`.
//! The [`crate::merge`] module folds alt loci into the primary path where
//! alignment evidence supports it.
//!
//! The graph is a lossless re-partitioning of its input:
//! every coordinate of every source is represented by exactly one
//! (block, offset) pair, and the sum of block lengths per source never changes.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::error::Error;
use std::fmt::Display;
use std::ops::Range;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Errors from graph construction, merging, and coordinate translation.
///
/// Failures during a single locus merge ([`GraphError::NoAlignmentEvidence`],
/// [`GraphError::AlreadyMerged`]) leave the graph unchanged and should not
/// abort a batch over other loci.
/// [`GraphError::InvariantViolation`] indicates that the graph can no longer
/// be trusted and must always be surfaced to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphError {
    /// No alignment records survived filtering for the given locus.
    NoAlignmentEvidence(String),
    /// Two alt loci claim overlapping placement regions on the same chromosome.
    OverlappingAltLoci {
        /// Name of the host chromosome.
        chrom: String,
        /// Name of the locus with the earlier placement.
        first: String,
        /// Name of the locus overlapping it.
        second: String,
    },
    /// A structural invariant does not hold. This is an internal error.
    InvariantViolation(String),
    /// The named sequence does not exist in the graph.
    SourceNotFound(String),
    /// An offset is outside the covered range of a source.
    OffsetOutOfRange {
        /// Name of the source sequence.
        source: String,
        /// The requested offset.
        offset: usize,
        /// Length of the covered range.
        len: usize,
    },
    /// The locus has already been merged into the primary path.
    AlreadyMerged(String),
    /// Malformed chromosome or alt locus metadata.
    InvalidMetadata(String),
}

impl Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            GraphError::NoAlignmentEvidence(locus) => {
                write!(f, "no usable alignment evidence for locus {}", locus)
            },
            GraphError::OverlappingAltLoci { chrom, first, second } => {
                write!(f, "alt loci {} and {} overlap on {}", first, second, chrom)
            },
            GraphError::InvariantViolation(message) => {
                write!(f, "graph invariant violated: {}", message)
            },
            GraphError::SourceNotFound(name) => {
                write!(f, "source sequence {} not found", name)
            },
            GraphError::OffsetOutOfRange { source, offset, len } => {
                write!(f, "offset {} is out of range for {} (length {})", offset, source, len)
            },
            GraphError::AlreadyMerged(locus) => {
                write!(f, "locus {} has already been merged", locus)
            },
            GraphError::InvalidMetadata(message) => {
                write!(f, "invalid metadata: {}", message)
            },
        }
    }
}

impl Error for GraphError {}

impl From<GraphError> for String {
    fn from(error: GraphError) -> Self {
        error.to_string()
    }
}

//-----------------------------------------------------------------------------

/// Placement metadata for one alternate locus.
///
/// The placement states that the locus is an alternate representation of the
/// half-open region `[start, end)` of the host chromosome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AltLocus {
    /// Name of the locus.
    pub name: String,
    /// Name of the host chromosome.
    pub host: String,
    /// Placement start on the host chromosome.
    pub start: usize,
    /// Placement end on the host chromosome.
    pub end: usize,
    /// Length of the locus sequence.
    pub length: usize,
}

/// The role of a source sequence in the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A primary chromosome.
    Chromosome,
    /// An alternate locus placed on region `[start, end)` of chromosome `host`.
    AltLocus {
        /// Identifier of the host chromosome.
        host: usize,
        /// Placement start on the host chromosome.
        start: usize,
        /// Placement end on the host chromosome.
        end: usize,
    },
}

/// A source sequence: a chromosome or an alternate locus.
///
/// Sources are identified by dense identifiers assigned in insertion order.
/// A full graph covers the range `0..len` of every source.
/// A subgraph (see [`Graph::subgraph`]) may cover a smaller range;
/// sources outside the subgraph have an empty covered range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    /// Name of the sequence.
    pub name: String,
    /// Total length of the sequence.
    pub len: usize,
    /// Chromosome or alt locus.
    pub kind: SourceKind,
    /// The range of the sequence represented in this graph.
    pub covered: Range<usize>,
}

/// A half-open interval of one source sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceInterval {
    /// Identifier of the source.
    pub source: usize,
    /// Start offset in the source.
    pub start: usize,
    /// End offset in the source.
    pub end: usize,
}

impl SourceInterval {
    /// Creates a new interval.
    pub fn new(source: usize, start: usize, end: usize) -> Self {
        SourceInterval { source, start, end }
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

//-----------------------------------------------------------------------------

/// An atomic run of sequence in the graph.
///
/// A block belongs to one original source, except for a shared block,
/// which represents the same underlying sequence in a chromosome and in an
/// alt locus that has been merged into it.
/// The two intervals of a shared block always have the same length,
/// so a block-local offset is meaningful regardless of the frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// A run of a primary chromosome.
    Reference(SourceInterval),
    /// A locus-private run of an alternate locus.
    Alt(SourceInterval),
    /// A run shared by a chromosome and a merged alt locus.
    Shared {
        /// The chromosome frame of the block.
        reference: SourceInterval,
        /// The alt locus frame of the block.
        alt: SourceInterval,
    },
}

impl Block {
    /// Returns the length of the block.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Block::Reference(iv) => iv.len(),
            Block::Alt(iv) => iv.len(),
            Block::Shared { reference, .. } => reference.len(),
        }
    }

    /// Returns `true` if the block is empty. Empty blocks violate graph invariants.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the block is shared between a chromosome and an alt locus.
    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self, Block::Shared { .. })
    }

    /// Returns the interval the block occupies in the given source, if any.
    pub fn interval_for(&self, source: usize) -> Option<&SourceInterval> {
        self.intervals().into_iter().find(|iv| iv.source == source)
    }

    /// Returns all source intervals of the block: one, or two for a shared block.
    pub fn intervals(&self) -> Vec<&SourceInterval> {
        match self {
            Block::Reference(iv) => vec![iv],
            Block::Alt(iv) => vec![iv],
            Block::Shared { reference, alt } => vec![reference, alt],
        }
    }
}

//-----------------------------------------------------------------------------

/// A merged coordinate space over chromosomes and alternate loci.
///
/// The graph consists of [`Block`]s connected by edges.
/// An edge from block `a` to block `b` means that some path through the graph
/// continues from the end of `a` to the start of `b`.
/// Each block has at most 2 successors and at most 2 predecessors:
/// one continuing the primary path and at most one branching into or out of an
/// alternate path.
///
/// The graph is built with [`Graph::create`] and mutated only by
/// [`Graph::merge_alt_locus`](crate::merge).
/// Coordinate queries go through [`crate::BlockIndex`] and [`crate::Translation`],
/// which are rebuilt from the graph whenever it changes.
///
/// # Examples
///
/// ```
/// use obg_base::{AltLocus, Graph};
///
/// let chromosomes = vec![("chr1".to_string(), 1000)];
/// let loci = vec![AltLocus {
///     name: "chr1_alt1".to_string(),
///     host: "chr1".to_string(),
///     start: 300, end: 500, length: 200,
/// }];
/// let graph = Graph::create(&chromosomes, &loci).unwrap();
///
/// // Two flanks, the placement region, and the locus itself.
/// assert_eq!(graph.block_count(), 4);
/// assert_eq!(graph.edge_count(), 4);
/// assert!(graph.check_invariants().is_ok());
///
/// // The placement region is its own block.
/// let chr1 = graph.source_id("chr1").unwrap();
/// let (_, region) = graph.blocks()
///     .find(|(_, block)| block.interval_for(chr1).map_or(false, |iv| iv.start == 300))
///     .unwrap();
/// assert_eq!(region.len(), 200);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    // Source sequences by identifier.
    sources: Vec<Source>,

    // Maps source names to identifiers.
    source_ids: HashMap<String, usize>,

    // Blocks by identifier.
    blocks: BTreeMap<usize, Block>,

    // Successors of each block, in insertion order. Blocks without successors
    // have no entry.
    successors: BTreeMap<usize, Vec<usize>>,

    // Predecessors of each block, in insertion order.
    predecessors: BTreeMap<usize, Vec<usize>>,

    // The next unused block identifier.
    next_block: usize,
}

/// Building the graph.
impl Graph {
    /// Maximum number of edges incident to one end of a block.
    pub const MAX_DEGREE: usize = 2;

    /// Builds the initial graph from chromosome sizes and alt locus placements.
    ///
    /// Each chromosome becomes a chain of blocks split at the placement
    /// boundaries of its alt loci; flanks between placements remain merged.
    /// Each alt locus becomes a single block connected to the host chromosome
    /// at both ends of its placement region.
    /// The construction is deterministic: the same input always produces the
    /// same graph.
    ///
    /// # Errors
    ///
    /// * [`GraphError::OverlappingAltLoci`]: two placements on the same
    ///   chromosome overlap. Touching placements are allowed.
    /// * [`GraphError::SourceNotFound`]: a locus names an unknown host.
    /// * [`GraphError::OffsetOutOfRange`]: a placement extends past the end
    ///   of its host.
    /// * [`GraphError::InvalidMetadata`]: duplicate names, empty sequences,
    ///   or an empty placement region.
    pub fn create(chromosomes: &[(String, usize)], loci: &[AltLocus]) -> Result<Graph, GraphError> {
        let mut graph = Graph {
            sources: Vec::new(),
            source_ids: HashMap::new(),
            blocks: BTreeMap::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
            next_block: 0,
        };

        for (name, len) in chromosomes.iter() {
            if *len == 0 {
                return Err(GraphError::InvalidMetadata(format!("chromosome {} has length 0", name)));
            }
            graph.add_source(name, *len, SourceKind::Chromosome)?;
        }
        for locus in loci.iter() {
            let host = graph.source_id(&locus.host).ok_or(
                GraphError::SourceNotFound(locus.host.clone())
            )?;
            if graph.sources[host].kind != SourceKind::Chromosome {
                return Err(GraphError::InvalidMetadata(
                    format!("host {} of locus {} is not a chromosome", locus.host, locus.name)
                ));
            }
            if locus.length == 0 {
                return Err(GraphError::InvalidMetadata(format!("locus {} has length 0", locus.name)));
            }
            if locus.start >= locus.end {
                return Err(GraphError::InvalidMetadata(
                    format!("locus {} has an empty placement region", locus.name)
                ));
            }
            if locus.end > graph.sources[host].len {
                return Err(GraphError::OffsetOutOfRange {
                    source: locus.host.clone(),
                    offset: locus.end,
                    len: graph.sources[host].len,
                });
            }
            let kind = SourceKind::AltLocus { host, start: locus.start, end: locus.end };
            graph.add_source(&locus.name, locus.length, kind)?;
        }
        graph.check_placements()?;

        // Chromosome blocks, split at placement boundaries.
        let mut block_starting_at: HashMap<(usize, usize), usize> = HashMap::new();
        let mut block_ending_at: HashMap<(usize, usize), usize> = HashMap::new();
        for id in 0..graph.sources.len() {
            if graph.sources[id].kind != SourceKind::Chromosome {
                continue;
            }
            let mut boundaries: BTreeSet<usize> = BTreeSet::new();
            boundaries.insert(0);
            boundaries.insert(graph.sources[id].len);
            for source in graph.sources.iter() {
                if let SourceKind::AltLocus { host, start, end } = source.kind {
                    if host == id {
                        boundaries.insert(start);
                        boundaries.insert(end);
                    }
                }
            }
            let boundaries: Vec<usize> = boundaries.into_iter().collect();
            let mut previous: Option<usize> = None;
            for window in boundaries.windows(2) {
                let block = graph.insert_block(
                    Block::Reference(SourceInterval::new(id, window[0], window[1]))
                );
                block_starting_at.insert((id, window[0]), block);
                block_ending_at.insert((id, window[1]), block);
                if let Some(previous) = previous {
                    graph.insert_edge(previous, block)?;
                }
                previous = Some(block);
            }
        }

        // Alt locus blocks with branch and rejoin edges.
        for id in 0..graph.sources.len() {
            let (host, start, end) = match graph.sources[id].kind {
                SourceKind::AltLocus { host, start, end } => (host, start, end),
                SourceKind::Chromosome => continue,
            };
            let block = graph.insert_block(
                Block::Alt(SourceInterval::new(id, 0, graph.sources[id].len))
            );
            if start > 0 {
                graph.insert_edge(block_ending_at[&(host, start)], block)?;
            }
            if end < graph.sources[host].len {
                graph.insert_edge(block, block_starting_at[&(host, end)])?;
            }
        }

        Ok(graph)
    }

    // Registers a source sequence covering its full length.
    fn add_source(&mut self, name: &str, len: usize, kind: SourceKind) -> Result<usize, GraphError> {
        if self.source_ids.contains_key(name) {
            return Err(GraphError::InvalidMetadata(format!("duplicate source name {}", name)));
        }
        let id = self.sources.len();
        self.sources.push(Source {
            name: name.to_string(),
            len,
            kind,
            covered: 0..len,
        });
        self.source_ids.insert(name.to_string(), id);
        Ok(id)
    }

    // Rejects overlapping placement regions on the same chromosome.
    fn check_placements(&self) -> Result<(), GraphError> {
        let mut by_host: BTreeMap<usize, Vec<(usize, usize, &str)>> = BTreeMap::new();
        for source in self.sources.iter() {
            if let SourceKind::AltLocus { host, start, end } = source.kind {
                by_host.entry(host).or_default().push((start, end, &source.name));
            }
        }
        for (host, mut placements) in by_host {
            placements.sort_unstable();
            for window in placements.windows(2) {
                if window[0].1 > window[1].0 {
                    return Err(GraphError::OverlappingAltLoci {
                        chrom: self.sources[host].name.clone(),
                        first: window[0].2.to_string(),
                        second: window[1].2.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    // Rebuilds a graph from its parts, validating all invariants.
    pub(crate) fn from_parts(
        sources: Vec<Source>,
        blocks: Vec<(usize, Block)>,
        edges: Vec<(usize, usize)>
    ) -> Result<Graph, GraphError> {
        let mut source_ids: HashMap<String, usize> = HashMap::new();
        for (id, source) in sources.iter().enumerate() {
            if source_ids.insert(source.name.clone(), id).is_some() {
                return Err(GraphError::InvalidMetadata(format!("duplicate source name {}", source.name)));
            }
        }
        let mut graph = Graph {
            sources,
            source_ids,
            blocks: BTreeMap::new(),
            successors: BTreeMap::new(),
            predecessors: BTreeMap::new(),
            next_block: 0,
        };
        for (id, block) in blocks {
            if graph.blocks.insert(id, block).is_some() {
                return Err(GraphError::InvariantViolation(format!("duplicate block {}", id)));
            }
            graph.next_block = graph.next_block.max(id + 1);
        }
        for (from, to) in edges {
            graph.insert_edge(from, to)?;
        }
        graph.check_invariants()?;
        Ok(graph)
    }
}

//-----------------------------------------------------------------------------

/// Accessing the graph.
impl Graph {
    /// Returns the number of source sequences.
    #[inline]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Returns the source with the given identifier.
    #[inline]
    pub fn source(&self, id: usize) -> Option<&Source> {
        self.sources.get(id)
    }

    /// Returns the identifier of the source with the given name.
    #[inline]
    pub fn source_id(&self, name: &str) -> Option<usize> {
        self.source_ids.get(name).cloned()
    }

    /// Returns an iterator over the sources with their identifiers.
    pub fn sources(&self) -> impl Iterator<Item = (usize, &Source)> {
        self.sources.iter().enumerate()
    }

    /// Returns the number of blocks.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the block with the given identifier.
    #[inline]
    pub fn block(&self, id: usize) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// Returns an iterator over the blocks in identifier order.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &Block)> {
        self.blocks.iter().map(|(id, block)| (*id, block))
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.successors.values().map(|v| v.len()).sum()
    }

    /// Returns an iterator over the edges.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.successors.iter().flat_map(|(from, to)| {
            to.iter().map(move |to| (*from, *to))
        })
    }

    /// Returns the successors of the given block.
    pub fn successors(&self, id: usize) -> &[usize] {
        self.successors.get(&id).map_or(&[], |v| v.as_slice())
    }

    /// Returns the predecessors of the given block.
    pub fn predecessors(&self, id: usize) -> &[usize] {
        self.predecessors.get(&id).map_or(&[], |v| v.as_slice())
    }
}

//-----------------------------------------------------------------------------

/// Mutating the graph. These operations are used by the builder and the merger.
impl Graph {
    // Inserts a new block and returns its identifier.
    pub(crate) fn insert_block(&mut self, block: Block) -> usize {
        let id = self.next_block;
        self.next_block += 1;
        self.blocks.insert(id, block);
        id
    }

    // Inserts an edge, ignoring duplicates. Fails if either endpoint would
    // exceed the degree bound or if an endpoint does not exist.
    pub(crate) fn insert_edge(&mut self, from: usize, to: usize) -> Result<(), GraphError> {
        if !self.blocks.contains_key(&from) || !self.blocks.contains_key(&to) {
            return Err(GraphError::InvariantViolation(
                format!("edge ({}, {}) refers to a missing block", from, to)
            ));
        }
        if from == to {
            return Err(GraphError::InvariantViolation(format!("self-loop on block {}", from)));
        }
        let successors = self.successors.entry(from).or_default();
        if successors.contains(&to) {
            return Ok(());
        }
        if successors.len() >= Self::MAX_DEGREE {
            return Err(GraphError::InvariantViolation(
                format!("block {} would have more than {} successors", from, Self::MAX_DEGREE)
            ));
        }
        successors.push(to);
        let predecessors = self.predecessors.entry(to).or_default();
        if predecessors.len() >= Self::MAX_DEGREE {
            self.successors.get_mut(&from).unwrap().pop();
            return Err(GraphError::InvariantViolation(
                format!("block {} would have more than {} predecessors", to, Self::MAX_DEGREE)
            ));
        }
        predecessors.push(from);
        Ok(())
    }

    // Removes a block and all edges incident to it.
    // Returns the removed block, or `None` if it did not exist.
    pub(crate) fn remove_block(&mut self, id: usize) -> Option<Block> {
        let block = self.blocks.remove(&id)?;
        if let Some(successors) = self.successors.remove(&id) {
            for succ in successors {
                if let Some(preds) = self.predecessors.get_mut(&succ) {
                    preds.retain(|x| *x != id);
                }
            }
        }
        if let Some(predecessors) = self.predecessors.remove(&id) {
            for pred in predecessors {
                if let Some(succs) = self.successors.get_mut(&pred) {
                    succs.retain(|x| *x != id);
                }
            }
        }
        Some(block)
    }
}

//-----------------------------------------------------------------------------

/// Validation and subgraphs.
impl Graph {
    /// Checks all structural invariants of the graph.
    ///
    /// * Every block is non-empty, and the two frames of a shared block have
    ///   the same length and refer to a chromosome and a distinct alt locus.
    /// * Every block has at most [`Self::MAX_DEGREE`] successors and at most
    ///   [`Self::MAX_DEGREE`] predecessors, and the two edge maps mirror
    ///   each other.
    /// * The blocks of every source tile its covered range exactly:
    ///   no gaps, no overlaps.
    ///
    /// Returns [`GraphError::InvariantViolation`] describing the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<(), GraphError> {
        // Blocks.
        for (id, block) in self.blocks.iter() {
            if block.is_empty() {
                return Err(GraphError::InvariantViolation(format!("block {} is empty", id)));
            }
            for iv in block.intervals() {
                let source = self.source(iv.source).ok_or(GraphError::InvariantViolation(
                    format!("block {} refers to a missing source", id)
                ))?;
                if iv.start < source.covered.start || iv.end > source.covered.end {
                    return Err(GraphError::InvariantViolation(
                        format!("block {} extends outside the covered range of {}", id, source.name)
                    ));
                }
            }
            if let Block::Shared { reference, alt } = block {
                if reference.len() != alt.len() {
                    return Err(GraphError::InvariantViolation(
                        format!("shared block {} has frames of different lengths", id)
                    ));
                }
                let ref_kind = self.sources[reference.source].kind;
                let alt_kind = self.sources[alt.source].kind;
                if ref_kind != SourceKind::Chromosome || alt_kind == SourceKind::Chromosome {
                    return Err(GraphError::InvariantViolation(
                        format!("shared block {} does not pair a chromosome with an alt locus", id)
                    ));
                }
            }
        }

        // Edges.
        for (from, successors) in self.successors.iter() {
            if successors.len() > Self::MAX_DEGREE {
                return Err(GraphError::InvariantViolation(
                    format!("block {} has {} successors", from, successors.len())
                ));
            }
            for to in successors.iter() {
                if !self.blocks.contains_key(from) || !self.blocks.contains_key(to) {
                    return Err(GraphError::InvariantViolation(
                        format!("edge ({}, {}) refers to a missing block", from, to)
                    ));
                }
                if !self.predecessors(*to).contains(from) {
                    return Err(GraphError::InvariantViolation(
                        format!("edge ({}, {}) is missing from the predecessor map", from, to)
                    ));
                }
            }
        }
        for (to, predecessors) in self.predecessors.iter() {
            if predecessors.len() > Self::MAX_DEGREE {
                return Err(GraphError::InvariantViolation(
                    format!("block {} has {} predecessors", to, predecessors.len())
                ));
            }
            for from in predecessors.iter() {
                if !self.successors(*from).contains(to) {
                    return Err(GraphError::InvariantViolation(
                        format!("edge ({}, {}) is missing from the successor map", from, to)
                    ));
                }
            }
        }

        // Coverage.
        for (id, source) in self.sources() {
            let mut intervals: Vec<(usize, usize)> = Vec::new();
            for (_, block) in self.blocks.iter() {
                if let Some(iv) = block.interval_for(id) {
                    intervals.push((iv.start, iv.end));
                }
            }
            intervals.sort_unstable();
            let mut offset = source.covered.start;
            for (start, end) in intervals.iter() {
                if *start != offset {
                    return Err(GraphError::InvariantViolation(
                        format!("{} is not tiled at offset {}", source.name, offset)
                    ));
                }
                offset = *end;
            }
            if offset != source.covered.end {
                return Err(GraphError::InvariantViolation(
                    format!("{} is not tiled at offset {}", source.name, offset)
                ));
            }
        }

        Ok(())
    }

    /// Extracts the subgraph for a chromosome interval and one alt locus.
    ///
    /// The subgraph contains the blocks of the chromosome within the interval,
    /// clipped at the interval boundaries, plus all blocks of the locus.
    /// The interval must contain the placement region of the locus.
    /// Other sources remain in the source table with an empty covered range.
    /// Block identifiers are preserved.
    ///
    /// # Errors
    ///
    /// * [`GraphError::SourceNotFound`]: an unknown chromosome or locus name.
    /// * [`GraphError::OffsetOutOfRange`]: the interval is outside the
    ///   covered range of the chromosome.
    /// * [`GraphError::InvalidMetadata`]: the locus is not placed on the
    ///   chromosome, or its placement is not contained in the interval.
    pub fn subgraph(&self, chrom: &str, range: Range<usize>, locus: &str) -> Result<Graph, GraphError> {
        let chrom_id = self.source_id(chrom).ok_or(GraphError::SourceNotFound(chrom.to_string()))?;
        let locus_id = self.source_id(locus).ok_or(GraphError::SourceNotFound(locus.to_string()))?;
        let covered = self.sources[chrom_id].covered.clone();
        if range.start >= range.end || range.start < covered.start || range.end > covered.end {
            return Err(GraphError::OffsetOutOfRange {
                source: chrom.to_string(),
                offset: range.end,
                len: covered.end,
            });
        }
        let (host, start, end) = match self.sources[locus_id].kind {
            SourceKind::AltLocus { host, start, end } => (host, start, end),
            SourceKind::Chromosome => {
                return Err(GraphError::InvalidMetadata(format!("{} is not an alt locus", locus)));
            },
        };
        if host != chrom_id {
            return Err(GraphError::InvalidMetadata(
                format!("locus {} is not placed on {}", locus, chrom)
            ));
        }
        if start < range.start || end > range.end {
            return Err(GraphError::InvalidMetadata(
                format!("the placement of locus {} is not contained in the interval", locus)
            ));
        }

        let mut sources = self.sources.clone();
        for (id, source) in sources.iter_mut().enumerate() {
            if id == chrom_id {
                source.covered = range.clone();
            } else if id != locus_id {
                source.covered = 0..0;
            }
        }

        let mut blocks: Vec<(usize, Block)> = Vec::new();
        for (id, block) in self.blocks.iter() {
            if block.interval_for(locus_id).is_some() {
                blocks.push((*id, block.clone()));
                continue;
            }
            // Blocks shared with other loci keep only their chromosome frame.
            let iv = match block {
                Block::Reference(iv) => iv,
                Block::Shared { reference, .. } => reference,
                Block::Alt(_) => continue,
            };
            if iv.source == chrom_id && iv.start < range.end && iv.end > range.start {
                let clipped = SourceInterval::new(
                    chrom_id,
                    iv.start.max(range.start),
                    iv.end.min(range.end),
                );
                blocks.push((*id, Block::Reference(clipped)));
            }
        }
        let retained: BTreeSet<usize> = blocks.iter().map(|(id, _)| *id).collect();
        let edges: Vec<(usize, usize)> = self.edges()
            .filter(|(from, to)| retained.contains(from) && retained.contains(to))
            .collect();

        Graph::from_parts(sources, blocks, edges)
    }
}

//-----------------------------------------------------------------------------
