//! Folding alt loci into the primary path using alignment evidence.
//!
//! The merger consumes alignment records between an alt locus and the
//! placement region of its host chromosome.
//! The records come from an external aligner and are treated as untrusted
//! evidence: they are thresholded, deduplicated into a non-overlapping
//! co-linear chain, and only then applied to the graph.
//! Each aligned pair of sub-intervals becomes a single shared block, while the
//! unaligned gaps on either side remain as divergent private blocks.
//!
//! A merge is a pure graph transformation.
//! It preserves the total coordinate coverage of every source, and a failed or
//! rejected merge leaves the graph exactly as it was.

use crate::graph::{Block, Graph, GraphError, SourceInterval, SourceKind};

use std::fmt::Display;
use std::ops::Range;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// An alignment between an interval of an alt locus and an interval of its
/// host chromosome.
///
/// Coordinates are 0-based and half-open.
/// The chromosome interval is in absolute chromosome coordinates, not relative
/// to the placement region.
/// The merger can only collapse aligned intervals of equal length into a
/// shared block, so records where the two intervals disagree in length are
/// discarded during filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignmentRecord {
    /// Aligned interval start on the alt locus.
    pub locus_start: usize,
    /// Aligned interval end on the alt locus.
    pub locus_end: usize,
    /// Aligned interval start on the host chromosome.
    pub target_start: usize,
    /// Aligned interval end on the host chromosome.
    pub target_end: usize,
    /// Identity percentage reported by the aligner.
    pub identity: f64,
    /// Alignment length reported by the aligner.
    pub length: usize,
}

impl AlignmentRecord {
    /// Creates a new alignment record.
    pub fn new(locus: Range<usize>, target: Range<usize>, identity: f64, length: usize) -> Self {
        AlignmentRecord {
            locus_start: locus.start,
            locus_end: locus.end,
            target_start: target.start,
            target_end: target.end,
            identity,
            length,
        }
    }

    /// Returns the length of the aligned interval on the alt locus.
    #[inline]
    pub fn locus_len(&self) -> usize {
        self.locus_end - self.locus_start
    }

    /// Returns the length of the aligned interval on the host chromosome.
    #[inline]
    pub fn target_len(&self) -> usize {
        self.target_end - self.target_start
    }

    /// Returns the score of the record: the approximate number of matching bases.
    #[inline]
    pub fn score(&self) -> f64 {
        self.identity * (self.length as f64) / 100.0
    }

    // True if the two records overlap on the host chromosome.
    fn overlaps_target(&self, other: &AlignmentRecord) -> bool {
        self.target_start < other.target_end && other.target_start < self.target_end
    }
}

//-----------------------------------------------------------------------------

/// Filtering thresholds for alignment records.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeParams {
    /// Minimum identity percentage.
    pub min_identity: f64,
    /// Minimum alignment length.
    pub min_length: usize,
}

impl MergeParams {
    /// Default minimum identity percentage.
    pub const DEFAULT_MIN_IDENTITY: f64 = 95.0;

    /// Default minimum alignment length.
    pub const DEFAULT_MIN_LENGTH: usize = 300;
}

impl Default for MergeParams {
    fn default() -> Self {
        MergeParams {
            min_identity: Self::DEFAULT_MIN_IDENTITY,
            min_length: Self::DEFAULT_MIN_LENGTH,
        }
    }
}

/// Filters alignment records into a non-overlapping co-linear chain.
///
/// Records below the identity or length thresholds and records whose two
/// intervals disagree in length are discarded.
/// Overlaps on the host chromosome are resolved by keeping the highest-scoring
/// record; ties prefer the earlier start, then the longer record.
/// The survivors are ordered by host position, and records that step backwards
/// on the locus side are dropped to keep the chain co-linear.
///
/// # Examples
///
/// ```
/// use obg_base::{AlignmentRecord, MergeParams};
/// use obg_base::merge::filter_alignments;
///
/// let params = MergeParams { min_identity: 95.0, min_length: 100 };
/// let records = vec![
///     AlignmentRecord::new(10..190, 310..490, 99.0, 180),
///     AlignmentRecord::new(20..200, 320..500, 99.0, 180), // overlap, equal score
///     AlignmentRecord::new(0..150, 100..250, 80.0, 150),  // identity below threshold
/// ];
/// let chain = filter_alignments(&records, &params);
/// assert_eq!(chain.len(), 1);
/// assert_eq!(chain[0].target_start, 310); // earlier start wins the tie
/// ```
pub fn filter_alignments(records: &[AlignmentRecord], params: &MergeParams) -> Vec<AlignmentRecord> {
    let mut candidates: Vec<&AlignmentRecord> = records.iter()
        .filter(|record| {
            record.identity >= params.min_identity &&
            record.length >= params.min_length &&
            record.target_len() > 0 &&
            record.locus_len() == record.target_len()
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.score().total_cmp(&a.score())
            .then_with(|| a.target_start.cmp(&b.target_start))
            .then_with(|| b.length.cmp(&a.length))
            .then_with(|| a.locus_start.cmp(&b.locus_start))
    });

    let mut kept: Vec<&AlignmentRecord> = Vec::new();
    for candidate in candidates {
        if !kept.iter().any(|record| record.overlaps_target(candidate)) {
            kept.push(candidate);
        }
    }
    kept.sort_by_key(|record| record.target_start);

    let mut chain: Vec<AlignmentRecord> = Vec::new();
    let mut locus_offset = 0;
    for record in kept {
        if record.locus_start >= locus_offset {
            locus_offset = record.locus_end;
            chain.push(record.clone());
        }
    }
    chain
}

//-----------------------------------------------------------------------------

/// Statistics from a successful merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeSummary {
    /// Name of the merged locus.
    pub locus: String,
    /// Number of shared blocks created.
    pub shared_blocks: usize,
    /// Total length of the shared blocks.
    pub shared_bases: usize,
    /// Number of alignment records in the filtered chain.
    pub records_used: usize,
    /// Number of alignment records discarded by filtering.
    pub records_dropped: usize,
}

impl Display for MergeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f, "locus {}: {} shared blocks ({} bp), {} of {} records used",
            self.locus, self.shared_blocks, self.shared_bases,
            self.records_used, self.records_used + self.records_dropped
        )
    }
}

//-----------------------------------------------------------------------------

// One piece of the replacement partition for a placement region and its locus.
#[derive(Clone, Debug)]
enum Piece {
    // A divergent run of the host chromosome.
    Primary(usize, usize),
    // A divergent run of the alt locus.
    Private(usize, usize),
    // An aligned run present in both frames.
    Shared { target: (usize, usize), locus: (usize, usize) },
}

// The validated replacement for one locus: pieces plus the two chains through
// them, as indexes into `pieces`.
struct MergePlan {
    pieces: Vec<Piece>,
    primary_chain: Vec<usize>,
    alt_chain: Vec<usize>,
}

impl MergePlan {
    // Builds the alternating private/shared partition from a filtered chain.
    fn new(chain: &[AlignmentRecord], region: Range<usize>, locus_len: usize) -> Result<Self, GraphError> {
        let mut plan = MergePlan {
            pieces: Vec::new(),
            primary_chain: Vec::new(),
            alt_chain: Vec::new(),
        };
        let mut target_offset = region.start;
        let mut locus_offset = 0;
        for record in chain {
            if record.target_start < target_offset || record.locus_start < locus_offset {
                return Err(GraphError::InvariantViolation(
                    String::from("the filtered alignment chain is not co-linear")
                ));
            }
            if record.target_start > target_offset {
                plan.primary_chain.push(plan.pieces.len());
                plan.pieces.push(Piece::Primary(target_offset, record.target_start));
            }
            if record.locus_start > locus_offset {
                plan.alt_chain.push(plan.pieces.len());
                plan.pieces.push(Piece::Private(locus_offset, record.locus_start));
            }
            plan.primary_chain.push(plan.pieces.len());
            plan.alt_chain.push(plan.pieces.len());
            plan.pieces.push(Piece::Shared {
                target: (record.target_start, record.target_end),
                locus: (record.locus_start, record.locus_end),
            });
            target_offset = record.target_end;
            locus_offset = record.locus_end;
        }
        if target_offset < region.end {
            plan.primary_chain.push(plan.pieces.len());
            plan.pieces.push(Piece::Primary(target_offset, region.end));
        }
        if locus_offset < locus_len {
            plan.alt_chain.push(plan.pieces.len());
            plan.pieces.push(Piece::Private(locus_offset, locus_len));
        }
        Ok(plan)
    }

    // Checks that the external edges of the replaced blocks can be attached to
    // the chain endpoints without exceeding the degree bound.
    fn check_degrees(
        &self,
        region_edges: &BlockEdges,
        locus_edges: &BlockEdges
    ) -> Result<(), GraphError> {
        let corners = [
            (self.primary_chain[0], self.alt_chain[0], &region_edges.predecessors, &locus_edges.predecessors),
            (
                *self.primary_chain.last().unwrap(),
                *self.alt_chain.last().unwrap(),
                &region_edges.successors,
                &locus_edges.successors,
            ),
        ];
        for (primary, alt, from_region, from_locus) in corners {
            let mut attached = from_region.clone();
            if primary == alt {
                for block in from_locus.iter() {
                    if !attached.contains(block) {
                        attached.push(*block);
                    }
                }
            }
            if attached.len() > Graph::MAX_DEGREE {
                return Err(GraphError::InvariantViolation(
                    String::from("merging would exceed the edge bound at a placement boundary")
                ));
            }
        }
        Ok(())
    }
}

// The external edges of a block about to be replaced.
struct BlockEdges {
    predecessors: Vec<usize>,
    successors: Vec<usize>,
}

impl BlockEdges {
    fn capture(graph: &Graph, block: usize) -> Self {
        BlockEdges {
            predecessors: graph.predecessors(block).to_vec(),
            successors: graph.successors(block).to_vec(),
        }
    }
}

//-----------------------------------------------------------------------------

/// Merging alt loci into the graph.
impl Graph {
    /// Merges the given alt locus into the primary path of its host chromosome.
    ///
    /// The records are filtered with [`filter_alignments`]; the surviving
    /// chain drives the merge.
    /// Records outside the locus or its placement region are discarded first.
    /// The placement region and the locus are re-partitioned into alternating
    /// private and shared blocks, and the replacement is spliced into the
    /// graph in a single step: a failed merge leaves the graph unchanged.
    ///
    /// # Errors
    ///
    /// * [`GraphError::SourceNotFound`] / [`GraphError::InvalidMetadata`]:
    ///   the name does not refer to an alt locus in the graph.
    /// * [`GraphError::NoAlignmentEvidence`]: no records survived filtering.
    ///   The builder diamond for the locus stands.
    /// * [`GraphError::AlreadyMerged`]: the locus has shared blocks already.
    /// * [`GraphError::InvariantViolation`]: the merge would break a
    ///   structural invariant. The graph is left untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use obg_base::{AltLocus, AlignmentRecord, Graph, MergeParams};
    ///
    /// let chromosomes = vec![("chr1".to_string(), 1000)];
    /// let loci = vec![AltLocus {
    ///     name: "altA".to_string(),
    ///     host: "chr1".to_string(),
    ///     start: 300, end: 500, length: 200,
    /// }];
    /// let mut graph = Graph::create(&chromosomes, &loci).unwrap();
    ///
    /// let records = vec![AlignmentRecord::new(10..190, 310..490, 99.0, 180)];
    /// let params = MergeParams { min_identity: 95.0, min_length: 100 };
    /// let summary = graph.merge_alt_locus("altA", &records, &params).unwrap();
    ///
    /// assert_eq!(summary.shared_blocks, 1);
    /// assert_eq!(summary.shared_bases, 180);
    /// assert!(graph.check_invariants().is_ok());
    /// ```
    pub fn merge_alt_locus(
        &mut self,
        locus: &str,
        records: &[AlignmentRecord],
        params: &MergeParams
    ) -> Result<MergeSummary, GraphError> {
        let locus_id = self.source_id(locus).ok_or(GraphError::SourceNotFound(locus.to_string()))?;
        let (host, region) = match self.source(locus_id).unwrap().kind {
            SourceKind::AltLocus { host, start, end } => (host, start..end),
            SourceKind::Chromosome => {
                return Err(GraphError::InvalidMetadata(format!("{} is not an alt locus", locus)));
            },
        };
        let locus_range = self.source(locus_id).unwrap().covered.clone();

        // The locus must still be the single private block from the builder.
        let mut locus_block: Option<usize> = None;
        for (id, block) in self.blocks() {
            if block.interval_for(locus_id).is_none() {
                continue;
            }
            if block.is_shared() {
                return Err(GraphError::AlreadyMerged(locus.to_string()));
            }
            if locus_block.is_some() {
                return Err(GraphError::AlreadyMerged(locus.to_string()));
            }
            locus_block = Some(id);
        }
        let locus_block = locus_block.ok_or(GraphError::InvariantViolation(
            format!("locus {} has no blocks", locus)
        ))?;

        // The placement region must be a single reference block.
        let region_block = self.blocks()
            .find(|(_, block)| match block {
                Block::Reference(iv) => {
                    iv.source == host && iv.start == region.start && iv.end == region.end
                },
                _ => false,
            })
            .map(|(id, _)| id)
            .ok_or(GraphError::InvariantViolation(
                format!("the placement region of locus {} is fragmented", locus)
            ))?;

        // Filter the evidence down to a usable chain.
        let in_bounds: Vec<AlignmentRecord> = records.iter()
            .filter(|record| {
                record.locus_start >= locus_range.start && record.locus_end <= locus_range.end &&
                record.target_start >= region.start && record.target_end <= region.end
            })
            .cloned()
            .collect();
        let chain = filter_alignments(&in_bounds, params);
        if chain.is_empty() {
            return Err(GraphError::NoAlignmentEvidence(locus.to_string()));
        }

        // Plan the replacement and validate it before touching the graph.
        let plan = MergePlan::new(&chain, region.clone(), locus_range.end)?;
        let region_edges = BlockEdges::capture(self, region_block);
        let locus_edges = BlockEdges::capture(self, locus_block);
        plan.check_degrees(&region_edges, &locus_edges)?;

        // Splice: replace the two blocks with the new partition.
        self.remove_block(region_block);
        self.remove_block(locus_block);
        let mut ids: Vec<usize> = Vec::with_capacity(plan.pieces.len());
        let mut shared_blocks = 0;
        let mut shared_bases = 0;
        for piece in plan.pieces.iter() {
            let block = match piece {
                Piece::Primary(start, end) => {
                    Block::Reference(SourceInterval::new(host, *start, *end))
                },
                Piece::Private(start, end) => {
                    Block::Alt(SourceInterval::new(locus_id, *start, *end))
                },
                Piece::Shared { target, locus: aligned } => {
                    shared_blocks += 1;
                    shared_bases += target.1 - target.0;
                    Block::Shared {
                        reference: SourceInterval::new(host, target.0, target.1),
                        alt: SourceInterval::new(locus_id, aligned.0, aligned.1),
                    }
                },
            };
            ids.push(self.insert_block(block));
        }
        for window in plan.primary_chain.windows(2) {
            self.insert_edge(ids[window[0]], ids[window[1]])?;
        }
        for window in plan.alt_chain.windows(2) {
            self.insert_edge(ids[window[0]], ids[window[1]])?;
        }
        for pred in region_edges.predecessors.iter() {
            self.insert_edge(*pred, ids[plan.primary_chain[0]])?;
        }
        for succ in region_edges.successors.iter() {
            self.insert_edge(ids[*plan.primary_chain.last().unwrap()], *succ)?;
        }
        for pred in locus_edges.predecessors.iter() {
            self.insert_edge(*pred, ids[plan.alt_chain[0]])?;
        }
        for succ in locus_edges.successors.iter() {
            self.insert_edge(ids[*plan.alt_chain.last().unwrap()], *succ)?;
        }

        Ok(MergeSummary {
            locus: locus.to_string(),
            shared_blocks,
            shared_bases,
            records_used: chain.len(),
            records_dropped: records.len() - chain.len(),
        })
    }

    /// Merges a batch of alt loci, isolating per-locus failures.
    ///
    /// Returns the outcome for each locus in input order.
    /// A failed merge leaves the graph unchanged for the remaining loci.
    /// The block index and translation must be rebuilt after the batch.
    pub fn merge_all<I>(
        &mut self,
        batch: I,
        params: &MergeParams
    ) -> Vec<(String, Result<MergeSummary, GraphError>)>
    where
        I: IntoIterator<Item = (String, Vec<AlignmentRecord>)>,
    {
        let mut outcomes = Vec::new();
        for (locus, records) in batch {
            let result = self.merge_alt_locus(&locus, &records, params);
            outcomes.push((locus, result));
        }
        outcomes
    }
}

//-----------------------------------------------------------------------------
