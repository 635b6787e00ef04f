use super::*;

//-----------------------------------------------------------------------------

// Test data: chr1 of length 1000 with a 200 bp locus placed at [300, 500).

fn single_chromosome() -> Vec<(String, usize)> {
    vec![("chr1".to_string(), 1000)]
}

fn single_locus() -> Vec<AltLocus> {
    vec![AltLocus {
        name: "altA".to_string(),
        host: "chr1".to_string(),
        start: 300, end: 500, length: 200,
    }]
}

fn build_graph(chromosomes: &[(String, usize)], loci: &[AltLocus]) -> Graph {
    let graph = Graph::create(chromosomes, loci);
    assert!(graph.is_ok(), "Failed to build the graph: {}", graph.unwrap_err());
    let graph = graph.unwrap();
    assert!(graph.check_invariants().is_ok(), "The graph does not satisfy its invariants");
    graph
}

fn coverage(graph: &Graph, source: usize) -> usize {
    graph.blocks()
        .filter_map(|(_, block)| block.interval_for(source))
        .map(|iv| iv.len())
        .sum()
}

//-----------------------------------------------------------------------------

#[test]
fn empty_graph() {
    let graph = build_graph(&[], &[]);
    assert_eq!(graph.source_count(), 0, "Wrong number of sources");
    assert_eq!(graph.block_count(), 0, "Wrong number of blocks");
    assert_eq!(graph.edge_count(), 0, "Wrong number of edges");
}

#[test]
fn single_diamond() {
    let graph = build_graph(&single_chromosome(), &single_locus());
    assert_eq!(graph.source_count(), 2, "Wrong number of sources");
    assert_eq!(graph.block_count(), 4, "Wrong number of blocks");
    assert_eq!(graph.edge_count(), 4, "Wrong number of edges");

    let chr1 = graph.source_id("chr1").unwrap();
    let alt = graph.source_id("altA").unwrap();
    assert_eq!(coverage(&graph, chr1), 1000, "Wrong coverage for the chromosome");
    assert_eq!(coverage(&graph, alt), 200, "Wrong coverage for the locus");

    // The left flank branches into the region and the locus.
    let (flank, _) = graph.blocks()
        .find(|(_, block)| block.interval_for(chr1).map_or(false, |iv| iv.end == 300))
        .unwrap();
    assert_eq!(graph.successors(flank).len(), 2, "The left flank should branch");

    // Both paths rejoin at the right flank.
    let (rejoin, _) = graph.blocks()
        .find(|(_, block)| block.interval_for(chr1).map_or(false, |iv| iv.start == 500))
        .unwrap();
    assert_eq!(graph.predecessors(rejoin).len(), 2, "Both paths should rejoin at the right flank");
}

#[test]
fn construction_is_deterministic() {
    let first = build_graph(&single_chromosome(), &single_locus());
    let second = build_graph(&single_chromosome(), &single_locus());
    assert_eq!(first, second, "Graph construction is not deterministic");
}

#[test]
fn every_coordinate_maps_to_one_block() {
    let chromosomes = vec![("chr1".to_string(), 1000), ("chr2".to_string(), 800)];
    let loci = vec![
        AltLocus { name: "altA".to_string(), host: "chr1".to_string(), start: 300, end: 500, length: 200 },
        AltLocus { name: "altB".to_string(), host: "chr1".to_string(), start: 600, end: 900, length: 250 },
        AltLocus { name: "altC".to_string(), host: "chr2".to_string(), start: 0, end: 400, length: 500 },
    ];
    let graph = build_graph(&chromosomes, &loci);

    // The coverage invariant is part of check_invariants; verify the totals
    // and the per-endpoint edge bound explicitly.
    for (id, source) in graph.sources() {
        assert_eq!(coverage(&graph, id), source.len, "Wrong coverage for {}", source.name);
    }
    for (id, _) in graph.blocks() {
        assert!(graph.successors(id).len() <= Graph::MAX_DEGREE, "Too many successors for block {}", id);
        assert!(graph.predecessors(id).len() <= Graph::MAX_DEGREE, "Too many predecessors for block {}", id);
    }
}

#[test]
fn touching_placements() {
    let loci = vec![
        AltLocus { name: "altA".to_string(), host: "chr1".to_string(), start: 100, end: 200, length: 150 },
        AltLocus { name: "altB".to_string(), host: "chr1".to_string(), start: 200, end: 300, length: 150 },
    ];
    let graph = build_graph(&single_chromosome(), &loci);

    // The block between the placements anchors both the rejoin of altA and
    // the branch of altB, but the edge bound still holds.
    let chr1 = graph.source_id("chr1").unwrap();
    let (middle, _) = graph.blocks()
        .find(|(_, block)| block.interval_for(chr1).map_or(false, |iv| iv.start == 100 && iv.end == 200))
        .unwrap();
    assert_eq!(graph.successors(middle).len(), 2, "The middle block should branch into altB");
    assert_eq!(graph.predecessors(middle).len(), 1, "Wrong predecessors for the middle block");
}

#[test]
fn whole_chromosome_placement() {
    let loci = vec![AltLocus {
        name: "altA".to_string(),
        host: "chr1".to_string(),
        start: 0, end: 1000, length: 900,
    }];
    let graph = build_graph(&single_chromosome(), &loci);
    assert_eq!(graph.block_count(), 2, "Wrong number of blocks");
    assert_eq!(graph.edge_count(), 0, "A placement covering the chromosome has no anchors");
}

//-----------------------------------------------------------------------------

#[test]
fn overlapping_placements_fail() {
    let loci = vec![
        AltLocus { name: "altA".to_string(), host: "chr1".to_string(), start: 300, end: 500, length: 200 },
        AltLocus { name: "altB".to_string(), host: "chr1".to_string(), start: 400, end: 600, length: 200 },
    ];
    let result = Graph::create(&single_chromosome(), &loci);
    assert_eq!(result, Err(GraphError::OverlappingAltLoci {
        chrom: "chr1".to_string(),
        first: "altA".to_string(),
        second: "altB".to_string(),
    }), "Overlapping placements should be rejected");
}

#[test]
fn invalid_metadata_fails() {
    let mut locus = single_locus();
    locus[0].host = "chr2".to_string();
    let result = Graph::create(&single_chromosome(), &locus);
    assert_eq!(result, Err(GraphError::SourceNotFound("chr2".to_string())), "Unknown host should be rejected");

    let mut locus = single_locus();
    locus[0].end = 1200;
    let result = Graph::create(&single_chromosome(), &locus);
    assert!(
        matches!(result, Err(GraphError::OffsetOutOfRange { .. })),
        "A placement past the end of the host should be rejected"
    );

    let mut locus = single_locus();
    locus[0].start = 500;
    locus[0].end = 500;
    let result = Graph::create(&single_chromosome(), &locus);
    assert!(
        matches!(result, Err(GraphError::InvalidMetadata(_))),
        "An empty placement region should be rejected"
    );

    let mut locus = single_locus();
    locus[0].length = 0;
    let result = Graph::create(&single_chromosome(), &locus);
    assert!(
        matches!(result, Err(GraphError::InvalidMetadata(_))),
        "A locus of length 0 should be rejected"
    );

    let chromosomes = vec![("chr1".to_string(), 1000), ("chr1".to_string(), 500)];
    let result = Graph::create(&chromosomes, &[]);
    assert!(
        matches!(result, Err(GraphError::InvalidMetadata(_))),
        "Duplicate source names should be rejected"
    );
}

//-----------------------------------------------------------------------------

#[test]
fn from_parts_validates() {
    let graph = build_graph(&single_chromosome(), &single_locus());
    let sources: Vec<Source> = graph.sources().map(|(_, source)| source.clone()).collect();
    let blocks: Vec<(usize, Block)> = graph.blocks().map(|(id, block)| (id, block.clone())).collect();
    let edges: Vec<(usize, usize)> = graph.edges().collect();

    // The round trip preserves the graph.
    let rebuilt = Graph::from_parts(sources.clone(), blocks.clone(), edges.clone());
    assert_eq!(rebuilt, Ok(graph), "Rebuilding from parts changed the graph");

    // A missing block breaks the tiling.
    let mut broken = blocks.clone();
    broken.remove(0);
    let result = Graph::from_parts(sources.clone(), broken, Vec::new());
    assert!(
        matches!(result, Err(GraphError::InvariantViolation(_))),
        "A gap in the tiling should be rejected"
    );

    // A third edge at one endpoint breaks the degree bound.
    let mut too_many = edges.clone();
    too_many.push((1, 3));
    too_many.push((2, 3));
    let result = Graph::from_parts(sources, blocks, too_many);
    assert!(
        matches!(result, Err(GraphError::InvariantViolation(_))),
        "More than 2 edges at an endpoint should be rejected"
    );
}

//-----------------------------------------------------------------------------

#[test]
fn subgraph_clips_flanks() {
    let graph = build_graph(&single_chromosome(), &single_locus());
    let subgraph = graph.subgraph("chr1", 200..600, "altA");
    assert!(subgraph.is_ok(), "Failed to extract the subgraph: {}", subgraph.unwrap_err());
    let subgraph = subgraph.unwrap();

    assert_eq!(subgraph.block_count(), 4, "Wrong number of blocks in the subgraph");
    assert_eq!(subgraph.edge_count(), 4, "Wrong number of edges in the subgraph");
    let chr1 = subgraph.source_id("chr1").unwrap();
    assert_eq!(subgraph.source(chr1).unwrap().covered, 200..600, "Wrong covered range");
    assert_eq!(coverage(&subgraph, chr1), 400, "Wrong clipped coverage");

    // Block identifiers are preserved.
    for (id, block) in subgraph.blocks() {
        let original = graph.block(id);
        assert!(original.is_some(), "Subgraph block {} is not in the original graph", id);
        if !block.interval_for(chr1).map_or(false, |iv| iv.start == 200 || iv.end == 600) {
            assert_eq!(block, original.unwrap(), "Interior block {} changed", id);
        }
    }
}

#[test]
fn subgraph_requires_contained_placement() {
    let graph = build_graph(&single_chromosome(), &single_locus());
    let result = graph.subgraph("chr1", 350..600, "altA");
    assert!(
        matches!(result, Err(GraphError::InvalidMetadata(_))),
        "The interval must contain the placement region"
    );
    let result = graph.subgraph("chr1", 200..1200, "altA");
    assert!(
        matches!(result, Err(GraphError::OffsetOutOfRange { .. })),
        "The interval must be within the chromosome"
    );
}

//-----------------------------------------------------------------------------
