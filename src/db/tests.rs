use super::*;

use crate::graph::AltLocus;
use crate::merge::{AlignmentRecord, MergeParams};

use std::fs;
use std::path::PathBuf;

//-----------------------------------------------------------------------------

// Test data: chr1 of length 1000 with a 200 bp locus placed at [300, 500),
// merged over chr1[310, 490) = altA[10, 190).

fn merged_graph() -> Graph {
    let chromosomes = vec![("chr1".to_string(), 1000)];
    let loci = vec![AltLocus {
        name: "altA".to_string(),
        host: "chr1".to_string(),
        start: 300, end: 500, length: 200,
    }];
    let mut graph = Graph::create(&chromosomes, &loci).unwrap();
    let records = vec![AlignmentRecord::new(10..190, 310..490, 99.0, 180)];
    let params = MergeParams { min_identity: 95.0, min_length: 100 };
    graph.merge_alt_locus("altA", &records, &params).unwrap();
    graph
}

fn create_database(graph: &Graph) -> PathBuf {
    let db_file = utils::temp_file_name("obg-base");
    assert!(!GraphBase::exists(&db_file), "Database {} already exists", db_file.display());
    let result = GraphBase::create(graph, &db_file);
    assert!(result.is_ok(), "Failed to create the database: {}", result.unwrap_err());
    db_file
}

fn open_database(filename: &PathBuf) -> GraphBase {
    let database = GraphBase::open(filename);
    assert!(database.is_ok(), "Failed to open the database: {}", database.unwrap_err());
    database.unwrap()
}

fn create_interface(database: &GraphBase) -> GraphInterface {
    let interface = GraphInterface::new(database);
    assert!(interface.is_ok(), "Failed to create a graph interface: {}", interface.unwrap_err());
    interface.unwrap()
}

//-----------------------------------------------------------------------------

#[test]
fn create_open_load() {
    let graph = merged_graph();
    let db_file = create_database(&graph);
    let database = open_database(&db_file);

    // Header.
    assert_eq!(database.version(), GraphBase::VERSION, "Wrong database version");
    assert_eq!(database.sources(), graph.source_count(), "Wrong number of sources");
    assert_eq!(database.blocks(), graph.block_count(), "Wrong number of blocks");
    assert_eq!(database.edges(), graph.edge_count(), "Wrong number of edges");

    // The loaded graph is the original.
    let loaded = database.load_graph();
    assert!(loaded.is_ok(), "Failed to load the graph: {}", loaded.unwrap_err());
    assert_eq!(loaded.unwrap(), graph, "The loaded graph differs from the original");

    drop(database);
    let _ = fs::remove_file(&db_file);
}

#[test]
fn create_requires_a_new_file() {
    let graph = merged_graph();
    let db_file = create_database(&graph);
    let result = GraphBase::create(&graph, &db_file);
    assert!(result.is_err(), "Creating over an existing database should fail");
    let _ = fs::remove_file(&db_file);
}

#[test]
fn open_requires_a_database() {
    let db_file = utils::temp_file_name("obg-base");
    assert!(GraphBase::open(&db_file).is_err(), "Opening a missing database should fail");
}

//-----------------------------------------------------------------------------

#[test]
fn interface_queries() {
    let graph = merged_graph();
    let db_file = create_database(&graph);
    let database = open_database(&db_file);
    let mut interface = create_interface(&database);

    // Sources.
    let result = interface.find_source("chr1");
    assert!(result.is_ok(), "Failed to find chr1: {}", result.unwrap_err());
    let (chr1, source) = result.unwrap().expect("chr1 is missing");
    assert_eq!(source, *graph.source(chr1).unwrap(), "Wrong source record for chr1");
    let result = interface.find_source("chr2").unwrap();
    assert!(result.is_none(), "Found a record for a missing source");

    // Blocks by source offset: chr1:400 and altA:100 are the same base of
    // the shared block.
    let alt = graph.source_id("altA").unwrap();
    let from_chromosome = interface.find_block(chr1, 400).unwrap().expect("chr1:400 is missing");
    let from_locus = interface.find_block(alt, 100).unwrap().expect("altA:100 is missing");
    assert_eq!(from_chromosome.0, from_locus.0, "The two frames disagree on the shared block");
    assert!(from_chromosome.1.is_shared(), "The block at chr1:400 should be shared");
    assert_eq!(from_chromosome.2, 90, "Wrong local offset at chr1:400");
    assert_eq!(from_locus.2, 90, "Wrong local offset at altA:100");
    let result = interface.find_block(chr1, 1500).unwrap();
    assert!(result.is_none(), "Found a block past the end of chr1");

    // Blocks by identifier and their edges.
    let shared = from_chromosome.0;
    let block = interface.get_block(shared).unwrap().expect("The shared block is missing");
    assert_eq!(block, *graph.block(shared).unwrap(), "Wrong record for the shared block");
    let successors = interface.successors(shared).unwrap();
    assert_eq!(successors, graph.successors(shared), "Wrong successors for the shared block");
    assert_eq!(successors.len(), 2, "The shared block should branch at its end");
    let predecessors = interface.predecessors(shared).unwrap();
    assert_eq!(predecessors, graph.predecessors(shared), "Wrong predecessors for the shared block");

    drop(interface);
    drop(database);
    let _ = fs::remove_file(&db_file);
}

//-----------------------------------------------------------------------------
