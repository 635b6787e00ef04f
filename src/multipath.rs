//! Classification of genes crossing divergent regions of the graph.
//!
//! A divergent region is a stretch where the primary path of a chromosome and
//! the path of one of its alt loci run through different blocks: the whole
//! placement region for an unmerged locus, or the unaligned gaps between
//! shared blocks for a merged one.
//! A gene whose projection enters a divergent region can be projected onto
//! more than one path through the graph and is therefore multipath.
//!
//! The classification distinguishes genes where a divergence boundary falls
//! inside an exon (critical: the ambiguity affects coding sequence) from genes
//! where only intronic span is affected (fuzzy).

use crate::block_index::BlockIndex;
use crate::graph::{Block, Graph, GraphError, SourceKind};
use crate::translate::{GraphInterval, LinearInterval, Strand, Translation};

use std::fmt::Display;
use std::ops::Range;


//-----------------------------------------------------------------------------

/// The multipath status of a gene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Classification {
    /// The projection stays on a single path.
    SinglePath,
    /// The projection enters a divergent region, but every divergence boundary
    /// inside the gene falls within intronic span.
    MultipathFuzzy,
    /// A divergence boundary inside the gene falls within an exon.
    MultipathCritical,
}

impl Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Classification::SinglePath => write!(f, "single-path"),
            Classification::MultipathFuzzy => write!(f, "multipath-fuzzy"),
            Classification::MultipathCritical => write!(f, "multipath-critical"),
        }
    }
}

//-----------------------------------------------------------------------------

/// One gene annotation in flat coordinates.
///
/// The source sequence may be a chromosome or an alt locus.
/// Genes without exon annotation are classified as if the whole transcript
/// were a single exon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneRecord {
    /// Gene identifier.
    pub name: String,
    /// Display name, if distinct from the identifier.
    pub display_name: Option<String>,
    /// Name of the source sequence the gene is annotated on.
    pub chrom: String,
    /// Strand of the transcript.
    pub strand: Strand,
    /// Transcript start.
    pub tx_start: usize,
    /// Transcript end.
    pub tx_end: usize,
    /// Exon intervals in transcript order. May be empty.
    pub exons: Vec<(usize, usize)>,
}

impl GeneRecord {
    /// Returns the transcript as a linear interval.
    pub fn transcript(&self) -> LinearInterval {
        LinearInterval::new(&self.chrom, self.tx_start, self.tx_end).with_strand(self.strand)
    }
}

//-----------------------------------------------------------------------------

/// A stretch where the primary path and one alt locus path diverge.
///
/// One side may be empty: an insertion or deletion bubble diverges at a single
/// point of the other frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivergentRegion {
    /// Identifier of the host chromosome.
    pub host: usize,
    /// Identifier of the alt locus.
    pub locus: usize,
    /// The divergent interval on the host chromosome. May be empty.
    pub host_range: Range<usize>,
    /// The divergent interval on the alt locus. May be empty.
    pub locus_range: Range<usize>,
    /// The divergent blocks of the primary path, in offset order.
    pub host_blocks: Vec<usize>,
    /// The divergent blocks of the alt locus path, in offset order.
    pub locus_blocks: Vec<usize>,
}

impl DivergentRegion {
    /// Returns the divergent interval in the frame of the given source.
    pub fn range_for(&self, source: usize) -> Option<&Range<usize>> {
        if source == self.host {
            Some(&self.host_range)
        } else if source == self.locus {
            Some(&self.locus_range)
        } else {
            None
        }
    }

    /// Returns the divergent blocks on the path of the given source.
    pub fn blocks_for(&self, source: usize) -> Option<&[usize]> {
        if source == self.host {
            Some(&self.host_blocks)
        } else if source == self.locus {
            Some(&self.locus_blocks)
        } else {
            None
        }
    }

    /// Returns the divergent blocks on the sibling path of the given source.
    pub fn sibling_blocks(&self, source: usize) -> Option<&[usize]> {
        if source == self.host {
            Some(&self.locus_blocks)
        } else if source == self.locus {
            Some(&self.host_blocks)
        } else {
            None
        }
    }

    // True if the interval `[start, end)` of the source enters this region.
    // An empty region is entered only if its position is strictly inside
    // the interval.
    fn entered_by(&self, source: usize, start: usize, end: usize) -> bool {
        match self.range_for(source) {
            Some(range) if range.start < range.end => start < range.end && range.start < end,
            Some(range) => start < range.start && range.start < end,
            None => false,
        }
    }
}

//-----------------------------------------------------------------------------

/// All divergent regions of a graph, computed by pairing the private runs
/// between shared anchors on the host and locus sides of every alt locus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DivergentRegions {
    regions: Vec<DivergentRegion>,
}

impl DivergentRegions {
    /// Computes the divergent regions of the graph.
    ///
    /// Loci with an empty covered range (excluded from a subgraph) are
    /// skipped.
    ///
    /// Returns [`GraphError::InvariantViolation`] if the shared blocks of
    /// some locus do not appear in the same order in both frames.
    pub fn new(graph: &Graph, index: &BlockIndex) -> Result<Self, GraphError> {
        let mut regions: Vec<DivergentRegion> = Vec::new();
        for (locus_id, source) in graph.sources() {
            let (host, start, end) = match source.kind {
                SourceKind::AltLocus { host, start, end } => (host, start, end),
                SourceKind::Chromosome => continue,
            };
            if source.covered.is_empty() {
                continue;
            }

            let host_side = gap_runs(graph, index, host, start..end, locus_id)?;
            let locus_side = gap_runs(graph, index, locus_id, source.covered.clone(), locus_id)?;
            if host_side.anchors != locus_side.anchors {
                return Err(GraphError::InvariantViolation(
                    format!("the shared blocks of {} are inconsistent between frames", source.name)
                ));
            }

            for (host_gap, locus_gap) in host_side.gaps.into_iter().zip(locus_side.gaps) {
                if host_gap.blocks.is_empty() && locus_gap.blocks.is_empty() {
                    continue;
                }
                regions.push(DivergentRegion {
                    host,
                    locus: locus_id,
                    host_range: host_gap.range,
                    locus_range: locus_gap.range,
                    host_blocks: host_gap.blocks,
                    locus_blocks: locus_gap.blocks,
                });
            }
        }
        Ok(DivergentRegions { regions })
    }

    /// Returns the number of divergent regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if the graph has no divergent regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Returns an iterator over the regions.
    pub fn iter(&self) -> impl Iterator<Item = &DivergentRegion> {
        self.regions.iter()
    }

    /// Returns the regions entered by the interval `[start, end)` of the
    /// given source.
    pub fn entered_by(&self, source: usize, start: usize, end: usize) -> Vec<&DivergentRegion> {
        self.regions.iter()
            .filter(|region| region.entered_by(source, start, end))
            .collect()
    }
}

// A private run between two shared anchors.
struct GapRun {
    blocks: Vec<usize>,
    range: Range<usize>,
}

// The private runs of one source within `range`, split at the blocks shared
// with the given locus, plus the anchors themselves in offset order.
struct AnchoredRuns {
    gaps: Vec<GapRun>,
    anchors: Vec<usize>,
}

fn gap_runs(
    graph: &Graph,
    index: &BlockIndex,
    source: usize,
    range: Range<usize>,
    locus: usize
) -> Result<AnchoredRuns, GraphError> {
    let mut gaps: Vec<GapRun> = Vec::new();
    let mut anchors: Vec<usize> = Vec::new();
    let mut run: Vec<usize> = Vec::new();
    let mut run_start = range.start;
    for (block_range, id) in index.blocks_for(source) {
        if block_range.end <= range.start || block_range.start >= range.end {
            continue;
        }
        let block = graph.block(id).ok_or(GraphError::InvariantViolation(
            format!("block {} is not in the graph", id)
        ))?;
        let shared_with_locus = match block {
            Block::Shared { alt, .. } => alt.source == locus,
            _ => false,
        };
        if shared_with_locus {
            gaps.push(GapRun { blocks: run, range: run_start..block_range.start });
            anchors.push(id);
            run = Vec::new();
            run_start = block_range.end;
        } else {
            run.push(id);
        }
    }
    gaps.push(GapRun { blocks: run, range: run_start..range.end });
    Ok(AnchoredRuns { gaps, anchors })
}

//-----------------------------------------------------------------------------

/// A gene with its projection and multipath classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifiedGene {
    /// Gene identifier.
    pub name: String,
    /// Display name, if distinct from the identifier.
    pub display_name: Option<String>,
    /// The transcript interval.
    pub interval: LinearInterval,
    /// The multipath status.
    pub classification: Classification,
    /// The projection of the transcript onto the graph.
    pub projection: GraphInterval,
    /// The block sequences the gene could be projected onto.
    /// The first path is the gene's own projection.
    pub paths: Vec<Vec<usize>>,
}

/// Classifies one gene against the divergent regions of the graph.
///
/// The gene is translated into graph coordinates; if its projection enters a
/// divergent region, the gene is multipath and every alternative block path
/// is reported.
/// A divergence boundary strictly inside the transcript that falls within an
/// exon makes the gene critical; otherwise a multipath gene is fuzzy.
/// Genes without exon annotation are treated as a single exon spanning the
/// transcript.
///
/// # Errors
///
/// Translation errors ([`GraphError::SourceNotFound`],
/// [`GraphError::OffsetOutOfRange`]) are passed through.
pub fn classify_gene(
    graph: &Graph,
    translation: &Translation,
    regions: &DivergentRegions,
    gene: &GeneRecord
) -> Result<ClassifiedGene, GraphError> {
    let projection = translation.translate(&gene.chrom, gene.tx_start, gene.tx_end)?;
    let source = translation.index().source_id(&gene.chrom).unwrap();
    let primary: Vec<usize> = projection.blocks().collect();

    let entered = regions.entered_by(source, gene.tx_start, gene.tx_end);
    if entered.is_empty() {
        return Ok(ClassifiedGene {
            name: gene.name.clone(),
            display_name: gene.display_name.clone(),
            interval: gene.transcript(),
            classification: Classification::SinglePath,
            projection,
            paths: vec![primary],
        });
    }

    // Divergence boundaries strictly inside the transcript.
    let mut crossings: Vec<usize> = Vec::new();
    for region in entered.iter() {
        let range = region.range_for(source).unwrap();
        for boundary in [range.start, range.end] {
            if gene.tx_start < boundary && boundary < gene.tx_end && !crossings.contains(&boundary) {
                crossings.push(boundary);
            }
        }
    }
    let exons: Vec<(usize, usize)> = if gene.exons.is_empty() {
        vec![(gene.tx_start, gene.tx_end)]
    } else {
        gene.exons.clone()
    };
    let critical = crossings.iter().any(|boundary| {
        exons.iter().any(|(start, end)| start < boundary && boundary < end)
    });

    // The alternative paths: substitute the sibling run of every entered
    // region, in every combination.
    let mut paths: Vec<Vec<usize>> = vec![primary];
    for region in entered.iter().copied() {
        let mut variants: Vec<Vec<usize>> = Vec::new();
        for path in paths.iter() {
            if let Some(variant) = substitute(graph, path, region, source) {
                if !paths.contains(&variant) && !variants.contains(&variant) {
                    variants.push(variant);
                }
            }
        }
        paths.extend(variants);
    }

    Ok(ClassifiedGene {
        name: gene.name.clone(),
        display_name: gene.display_name.clone(),
        interval: gene.transcript(),
        classification: if critical {
            Classification::MultipathCritical
        } else {
            Classification::MultipathFuzzy
        },
        projection,
        paths,
    })
}

// Replaces the touched run of `region` in `path` with the sibling run.
// For a point divergence, the sibling run is inserted at the junction.
// Returns `None` if the path does not touch the region.
fn substitute(
    graph: &Graph,
    path: &[usize],
    region: &DivergentRegion,
    source: usize
) -> Option<Vec<usize>> {
    let own = region.blocks_for(source)?;
    let sibling = region.sibling_blocks(source)?;

    if own.is_empty() {
        // The divergence is a single point of this frame: find the junction
        // and insert the sibling run there.
        let position = region.range_for(source)?.start;
        let junction = path.windows(2).position(|pair| {
            graph.block(pair[0])
                .and_then(|block| block.interval_for(source))
                .map_or(false, |iv| iv.end == position)
        })?;
        let mut result: Vec<usize> = path[..=junction].to_vec();
        result.extend_from_slice(sibling);
        result.extend_from_slice(&path[junction + 1..]);
        return Some(result);
    }

    let first = path.iter().position(|block| own.contains(block))?;
    let mut last = first;
    while last + 1 < path.len() && own.contains(&path[last + 1]) {
        last += 1;
    }
    let mut result: Vec<usize> = path[..first].to_vec();
    result.extend_from_slice(sibling);
    result.extend_from_slice(&path[last + 1..]);
    Some(result)
}

/// Classifies a batch of genes, isolating per-gene failures.
///
/// Genes that cannot be translated (unknown source, out-of-range
/// coordinates) are reported separately and do not abort the batch.
pub fn classify_genes(
    graph: &Graph,
    translation: &Translation,
    regions: &DivergentRegions,
    genes: &[GeneRecord]
) -> (Vec<ClassifiedGene>, Vec<(String, GraphError)>) {
    let mut classified: Vec<ClassifiedGene> = Vec::new();
    let mut anomalies: Vec<(String, GraphError)> = Vec::new();
    for gene in genes {
        match classify_gene(graph, translation, regions, gene) {
            Ok(result) => classified.push(result),
            Err(error) => anomalies.push((gene.name.clone(), error)),
        }
    }
    (classified, anomalies)
}

//-----------------------------------------------------------------------------
