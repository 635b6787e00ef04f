use super::*;

use crate::graph::AltLocus;

//-----------------------------------------------------------------------------

// Test data: chr1 of length 1000 with a 200 bp locus placed at [300, 500).

fn scenario_graph() -> Graph {
    let chromosomes = vec![("chr1".to_string(), 1000)];
    let loci = vec![AltLocus {
        name: "altA".to_string(),
        host: "chr1".to_string(),
        start: 300, end: 500, length: 200,
    }];
    Graph::create(&chromosomes, &loci).unwrap()
}

fn relaxed_params() -> MergeParams {
    MergeParams { min_identity: 95.0, min_length: 100 }
}

fn coverage(graph: &Graph, source: usize) -> usize {
    graph.blocks()
        .filter_map(|(_, block)| block.interval_for(source))
        .map(|iv| iv.len())
        .sum()
}

fn merge(graph: &mut Graph, locus: &str, records: &[AlignmentRecord], params: &MergeParams) -> MergeSummary {
    let result = graph.merge_alt_locus(locus, records, params);
    assert!(result.is_ok(), "Failed to merge {}: {}", locus, result.unwrap_err());
    assert!(graph.check_invariants().is_ok(), "The merged graph does not satisfy its invariants");
    result.unwrap()
}

//-----------------------------------------------------------------------------

#[test]
fn filter_thresholds() {
    let params = MergeParams { min_identity: 95.0, min_length: 100 };
    let records = vec![
        AlignmentRecord::new(10..190, 310..490, 99.0, 180),
        AlignmentRecord::new(10..190, 310..490, 80.0, 180), // identity too low
        AlignmentRecord::new(10..60, 310..360, 99.0, 50),   // too short
        AlignmentRecord::new(10..190, 310..500, 99.0, 190), // frames disagree in length
    ];
    let chain = filter_alignments(&records, &params);
    assert_eq!(chain.len(), 1, "Wrong number of surviving records");
    assert_eq!(chain[0], records[0], "Wrong surviving record");
}

#[test]
fn filter_tie_breaks_are_deterministic() {
    let params = relaxed_params();

    // Equal score: the earlier start wins.
    let records = vec![
        AlignmentRecord::new(20..200, 320..500, 99.0, 180),
        AlignmentRecord::new(10..190, 310..490, 99.0, 180),
    ];
    let chain = filter_alignments(&records, &params);
    assert_eq!(chain.len(), 1, "Overlapping records should be resolved to one");
    assert_eq!(chain[0].target_start, 310, "The earlier start should win the tie");

    // Equal score and start: the longer record wins.
    let records = vec![
        AlignmentRecord::new(10..172, 310..472, 100.0, 162),
        AlignmentRecord::new(10..190, 310..490, 90.0, 180),
    ];
    assert_eq!(records[0].score(), records[1].score(), "The records should tie on score");
    let chain = filter_alignments(&records, &params);
    assert_eq!(chain.len(), 1, "Overlapping records should be resolved to one");
    assert_eq!(chain[0].length, 180, "The longer record should win the tie");
}

#[test]
fn filter_keeps_highest_score() {
    let params = relaxed_params();
    let records = vec![
        AlignmentRecord::new(10..190, 310..490, 96.0, 180),
        AlignmentRecord::new(20..140, 320..440, 99.9, 120),
    ];
    let chain = filter_alignments(&records, &params);
    assert_eq!(chain.len(), 1, "Overlapping records should be resolved to one");
    assert_eq!(chain[0].identity, 96.0, "The higher-scoring record should be kept");
}

#[test]
fn filter_enforces_co_linearity() {
    let params = relaxed_params();
    let records = vec![
        AlignmentRecord::new(100..190, 310..400, 99.0, 100),
        AlignmentRecord::new(10..80, 420..490, 99.0, 100), // steps backwards on the locus
    ];
    let chain = filter_alignments(&records, &params);
    assert_eq!(chain.len(), 1, "Records breaking co-linearity should be dropped");
    assert_eq!(chain[0].target_start, 310, "Wrong surviving record");
}

//-----------------------------------------------------------------------------

#[test]
fn merge_single_record() {
    let mut graph = scenario_graph();
    let records = vec![AlignmentRecord::new(10..190, 310..490, 99.0, 180)];
    let summary = merge(&mut graph, "altA", &records, &relaxed_params());

    assert_eq!(summary.shared_blocks, 1, "Wrong number of shared blocks");
    assert_eq!(summary.shared_bases, 180, "Wrong number of shared bases");
    assert_eq!(summary.records_used, 1, "Wrong number of records used");
    assert_eq!(summary.records_dropped, 0, "Wrong number of records dropped");

    // Coverage is preserved in both frames.
    let chr1 = graph.source_id("chr1").unwrap();
    let alt = graph.source_id("altA").unwrap();
    assert_eq!(coverage(&graph, chr1), 1000, "The merge changed chromosome coverage");
    assert_eq!(coverage(&graph, alt), 200, "The merge changed locus coverage");

    // The shared block spans chr1[310, 490) and altA[10, 190).
    let shared: Vec<(usize, &Block)> = graph.blocks().filter(|(_, block)| block.is_shared()).collect();
    assert_eq!(shared.len(), 1, "Wrong number of shared blocks in the graph");
    let (id, block) = shared[0];
    assert_eq!(
        block.interval_for(chr1),
        Some(&SourceInterval::new(chr1, 310, 490)),
        "Wrong chromosome frame for the shared block"
    );
    assert_eq!(
        block.interval_for(alt),
        Some(&SourceInterval::new(alt, 10, 190)),
        "Wrong locus frame for the shared block"
    );

    // Divergent blocks chr1[300, 310) / altA[0, 10) before the shared block
    // and chr1[490, 500) / altA[190, 200) after it.
    let mut before = (false, false);
    let mut after = (false, false);
    for pred in graph.predecessors(id) {
        match graph.block(*pred).unwrap() {
            Block::Reference(iv) => before.0 = *iv == SourceInterval::new(chr1, 300, 310),
            Block::Alt(iv) => before.1 = *iv == SourceInterval::new(alt, 0, 10),
            Block::Shared { .. } => panic!("Unexpected shared predecessor"),
        }
    }
    for succ in graph.successors(id) {
        match graph.block(*succ).unwrap() {
            Block::Reference(iv) => after.0 = *iv == SourceInterval::new(chr1, 490, 500),
            Block::Alt(iv) => after.1 = *iv == SourceInterval::new(alt, 190, 200),
            Block::Shared { .. } => panic!("Unexpected shared successor"),
        }
    }
    assert_eq!(before, (true, true), "Wrong divergent blocks before the shared block");
    assert_eq!(after, (true, true), "Wrong divergent blocks after the shared block");
}

#[test]
fn merge_without_evidence_fails() {
    let mut graph = scenario_graph();
    let original = graph.clone();

    // The only record is below the identity threshold.
    let records = vec![AlignmentRecord::new(10..190, 310..490, 80.0, 180)];
    let params = MergeParams { min_identity: 95.0, min_length: 100 };
    let result = graph.merge_alt_locus("altA", &records, &params);
    assert_eq!(
        result, Err(GraphError::NoAlignmentEvidence("altA".to_string())),
        "Filtering should discard the record"
    );
    assert_eq!(graph, original, "A failed merge should leave the graph unchanged");
}

#[test]
fn merge_drops_out_of_bounds_records() {
    let mut graph = scenario_graph();
    let original = graph.clone();

    // High identity, but outside the placement region.
    let records = vec![AlignmentRecord::new(10..190, 510..690, 99.0, 180)];
    let result = graph.merge_alt_locus("altA", &records, &relaxed_params());
    assert_eq!(
        result, Err(GraphError::NoAlignmentEvidence("altA".to_string())),
        "Out-of-bounds records should not count as evidence"
    );
    assert_eq!(graph, original, "A failed merge should leave the graph unchanged");
}

#[test]
fn merge_twice_fails() {
    let mut graph = scenario_graph();
    let records = vec![AlignmentRecord::new(10..190, 310..490, 99.0, 180)];
    let _ = merge(&mut graph, "altA", &records, &relaxed_params());
    let snapshot = graph.clone();

    let result = graph.merge_alt_locus("altA", &records, &relaxed_params());
    assert_eq!(
        result, Err(GraphError::AlreadyMerged("altA".to_string())),
        "A locus can be merged at most once"
    );
    assert_eq!(graph, snapshot, "A rejected merge should leave the graph unchanged");
}

#[test]
fn merge_aligned_ends_collapse_the_diamond() {
    let mut graph = scenario_graph();

    // Two records, both starting exactly at the placement boundary.
    let records = vec![
        AlignmentRecord::new(0..50, 300..350, 99.0, 120),
        AlignmentRecord::new(60..110, 360..410, 99.0, 120),
    ];
    let params = MergeParams { min_identity: 95.0, min_length: 50 };
    let summary = merge(&mut graph, "altA", &records, &params);
    assert_eq!(summary.shared_blocks, 2, "Wrong number of shared blocks");
    assert_eq!(summary.shared_bases, 100, "Wrong number of shared bases");

    // Both paths enter the first shared block, so the left flank no longer
    // branches.
    let chr1 = graph.source_id("chr1").unwrap();
    let (flank, _) = graph.blocks()
        .find(|(_, block)| block.interval_for(chr1).map_or(false, |iv| iv.end == 300))
        .unwrap();
    assert_eq!(graph.successors(flank).len(), 1, "The left flank should not branch after the merge");
}

#[test]
fn merge_whole_region() {
    let mut graph = scenario_graph();
    let records = vec![AlignmentRecord::new(0..200, 300..500, 99.0, 200)];
    let summary = merge(&mut graph, "altA", &records, &relaxed_params());
    assert_eq!(summary.shared_blocks, 1, "Wrong number of shared blocks");

    // The locus is fully folded into the primary path.
    assert_eq!(graph.block_count(), 3, "Wrong number of blocks");
    assert_eq!(graph.edge_count(), 2, "Wrong number of edges");
}

#[test]
fn merge_insertion_bubble() {
    // The locus has 20 bp the chromosome does not have.
    let chromosomes = vec![("chr1".to_string(), 1000)];
    let loci = vec![AltLocus {
        name: "altA".to_string(),
        host: "chr1".to_string(),
        start: 300, end: 500, length: 220,
    }];
    let mut graph = Graph::create(&chromosomes, &loci).unwrap();
    let records = vec![
        AlignmentRecord::new(0..100, 300..400, 99.0, 100),
        AlignmentRecord::new(120..220, 400..500, 99.0, 100),
    ];
    let summary = merge(&mut graph, "altA", &records, &relaxed_params());
    assert_eq!(summary.shared_blocks, 2, "Wrong number of shared blocks");

    // The locus-private block is a detour between the two shared blocks.
    let alt = graph.source_id("altA").unwrap();
    let (insertion, _) = graph.blocks()
        .find(|(_, block)| !block.is_shared() && block.interval_for(alt).is_some())
        .unwrap();
    let preds = graph.predecessors(insertion);
    let succs = graph.successors(insertion);
    assert_eq!(preds.len(), 1, "Wrong predecessors for the insertion");
    assert_eq!(succs.len(), 1, "Wrong successors for the insertion");
    assert!(graph.block(preds[0]).unwrap().is_shared(), "The insertion should leave a shared block");
    assert!(graph.block(succs[0]).unwrap().is_shared(), "The insertion should rejoin a shared block");

    // The first shared block branches into the insertion and the next
    // shared block.
    assert_eq!(graph.successors(preds[0]).len(), 2, "The first shared block should branch");
}

//-----------------------------------------------------------------------------

#[test]
fn merge_all_isolates_failures() {
    let chromosomes = vec![("chr1".to_string(), 1000)];
    let loci = vec![
        AltLocus { name: "altA".to_string(), host: "chr1".to_string(), start: 300, end: 500, length: 200 },
        AltLocus { name: "altB".to_string(), host: "chr1".to_string(), start: 600, end: 900, length: 300 },
    ];
    let mut graph = Graph::create(&chromosomes, &loci).unwrap();

    let batch = vec![
        ("altA".to_string(), vec![AlignmentRecord::new(10..190, 310..490, 99.0, 180)]),
        ("altB".to_string(), vec![AlignmentRecord::new(0..300, 600..900, 80.0, 300)]),
    ];
    let outcomes = graph.merge_all(batch, &relaxed_params());
    assert_eq!(outcomes.len(), 2, "Wrong number of outcomes");
    assert!(outcomes[0].1.is_ok(), "The merge of altA should succeed");
    assert_eq!(
        outcomes[1].1,
        Err(GraphError::NoAlignmentEvidence("altB".to_string())),
        "The merge of altB should fail"
    );

    // The failure left altB as the builder diamond while altA is merged.
    assert!(graph.check_invariants().is_ok(), "The graph does not satisfy its invariants");
    let alt_b = graph.source_id("altB").unwrap();
    let diamond: Vec<(usize, &Block)> = graph.blocks()
        .filter(|(_, block)| block.interval_for(alt_b).is_some())
        .collect();
    assert_eq!(diamond.len(), 1, "altB should still be a single block");
    assert!(!diamond[0].1.is_shared(), "altB should not have shared blocks");
}

//-----------------------------------------------------------------------------
