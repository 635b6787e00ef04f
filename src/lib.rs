//! # OBG-base: an offset-based sequence graph for alternate loci.
//!
//! This is a prototype for merging the alternate locus scaffolds of a
//! reference assembly into the primary chromosome sequences, producing a
//! unified coordinate space.
//! Regions supported by alignment evidence become single shared blocks, while
//! divergent regions remain as parallel paths.
//! Linear annotations can then be translated into graph coordinates, and
//! genes whose span crosses a divergence point are classified as multipath.
//!
//! ### Basic concepts
//!
//! The [`Graph`] partitions every source sequence (chromosome or alt locus)
//! into [`Block`]s connected by edges.
//! [`Graph::create`] builds the initial graph from chromosome sizes and alt
//! locus placements; each locus forms a simple diamond around its placement
//! region.
//! [`Graph::merge_alt_locus`] folds a locus into the primary path using a
//! filtered chain of alignment records from an external aligner.
//!
//! The [`BlockIndex`] maps flat source offsets to blocks with a binary
//! search per lookup; it is rebuilt from the graph after every merge batch.
//! The [`Translation`] built on top of it projects linear intervals onto
//! block slices and back.
//! The [`multipath`] module classifies gene annotations against the
//! divergent regions of the graph.
//!
//! Merges mutate the graph and are serialized through `&mut Graph`;
//! translation and classification only read a frozen graph and its
//! translation, so they can run concurrently across genes.
//!
//! ### Persistence
//!
//! A graph is stored in a SQLite database together with its source table.
//! See [`GraphBase`] for creating and loading databases and
//! [`GraphInterface`] for querying one without loading the graph.

pub mod block_index;
pub mod db;
pub mod formats;
pub mod graph;
pub mod merge;
pub mod multipath;
pub mod translate;
pub mod utils;

pub use block_index::BlockIndex;
pub use db::{GraphBase, GraphInterface};
pub use graph::{AltLocus, Block, Graph, GraphError, Source, SourceInterval, SourceKind};
pub use merge::{AlignmentRecord, MergeParams, MergeSummary};
pub use multipath::{Classification, ClassifiedGene, DivergentRegions, GeneRecord};
pub use translate::{BlockSlice, GraphInterval, LinearInterval, Strand, Translation};
