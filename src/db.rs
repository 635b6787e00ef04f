//! A SQLite database storing an offset-based sequence graph.
//!
//! The database persists the graph object: the source table, the blocks, and
//! the edges.
//! The translation is derived data and is rebuilt from the loaded graph
//! rather than stored.
//!
//! Batch operations should load the entire graph into memory with
//! [`GraphBase::load_graph`].
//! Interactive applications that need a few lookups can query the database
//! directly through [`GraphInterface`] without loading the graph.

use crate::graph::{Block, Graph, Source, SourceInterval, SourceKind};
use crate::utils;

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, Statement};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A database connection to a graph database.
///
/// This structure stores a database connection and some header information.
/// In multi-threaded applications, each thread should have its own connection.
/// Queries are supported through the [`GraphInterface`] structure.
///
/// # Examples
///
/// ```
/// use obg_base::{AltLocus, Graph, GraphBase, utils};
/// use std::fs;
///
/// let chromosomes = vec![("chr1".to_string(), 1000)];
/// let loci = vec![AltLocus {
///     name: "altA".to_string(),
///     host: "chr1".to_string(),
///     start: 300, end: 500, length: 200,
/// }];
/// let graph = Graph::create(&chromosomes, &loci).unwrap();
///
/// // Create the database.
/// let db_file = utils::temp_file_name("obg-base");
/// assert!(!GraphBase::exists(&db_file));
/// GraphBase::create(&graph, &db_file).unwrap();
///
/// // Open it and load the graph back.
/// let database = GraphBase::open(&db_file).unwrap();
/// assert_eq!(database.sources(), 2);
/// assert_eq!(database.blocks(), 4);
/// assert_eq!(database.edges(), 4);
/// let loaded = database.load_graph().unwrap();
/// assert_eq!(loaded, graph);
///
/// // Clean up.
/// drop(database);
/// fs::remove_file(&db_file).unwrap();
/// ```
#[derive(Debug)]
pub struct GraphBase {
    connection: Connection,
    version: String,
    sources: usize,
    blocks: usize,
    edges: usize,
}

/// Using the database.
impl GraphBase {
    // Key for database version.
    const KEY_VERSION: &'static str = "version";

    /// Current database version.
    pub const VERSION: &'static str = "OBG-base v0.1.0";

    // Key for source count.
    const KEY_SOURCES: &'static str = "sources";

    // Key for block count.
    const KEY_BLOCKS: &'static str = "blocks";

    // Key for edge count.
    const KEY_EDGES: &'static str = "edges";

    /// Opens a connection to the database in the given file.
    ///
    /// Reads the header information and passes through any database errors.
    pub fn open<P: AsRef<Path>>(filename: P) -> Result<Self, String> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(filename, flags).map_err(|x| x.to_string())?;

        let mut get_tag = connection.prepare(
            "SELECT value FROM Tags WHERE key = ?1"
        ).map_err(|x| x.to_string())?;
        let version = get_string_value(&mut get_tag, Self::KEY_VERSION)?;
        if version != Self::VERSION {
            return Err(format!("Unsupported database version: {} (expected {})", version, Self::VERSION));
        }
        let sources = get_numeric_value(&mut get_tag, Self::KEY_SOURCES)?;
        let blocks = get_numeric_value(&mut get_tag, Self::KEY_BLOCKS)?;
        let edges = get_numeric_value(&mut get_tag, Self::KEY_EDGES)?;
        drop(get_tag);

        Ok(GraphBase { connection, version, sources, blocks, edges })
    }

    /// Returns `true` if the database file exists.
    pub fn exists<P: AsRef<Path>>(filename: P) -> bool {
        utils::file_exists(filename)
    }

    /// Returns the filename of the database or an error if there is no filename.
    pub fn filename(&self) -> Option<&str> {
        self.connection.path()
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        utils::file_size(self.filename()?)
    }

    /// Returns the version of the database.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the number of source sequences in the graph.
    pub fn sources(&self) -> usize {
        self.sources
    }

    /// Returns the number of blocks in the graph.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Returns the number of edges in the graph.
    pub fn edges(&self) -> usize {
        self.edges
    }
}

//-----------------------------------------------------------------------------

/// Creating the database.
impl GraphBase {
    /// Creates a new database from the given graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the database already exists or if the graph does
    /// not satisfy its structural invariants.
    /// Passes through any database errors.
    pub fn create<P: AsRef<Path>>(graph: &Graph, filename: P) -> Result<(), String> {
        eprintln!("Creating database {}", filename.as_ref().display());
        if Self::exists(&filename) {
            return Err(format!("Database {} already exists", filename.as_ref().display()));
        }
        graph.check_invariants().map_err(|x| x.to_string())?;

        let mut connection = Connection::open(filename).map_err(|x| x.to_string())?;
        Self::insert_tags(graph, &mut connection).map_err(|x| x.to_string())?;
        Self::insert_sources(graph, &mut connection).map_err(|x| x.to_string())?;
        Self::insert_blocks(graph, &mut connection).map_err(|x| x.to_string())?;
        Self::insert_edges(graph, &mut connection).map_err(|x| x.to_string())?;
        Ok(())
    }

    fn insert_tags(graph: &Graph, connection: &mut Connection) -> rusqlite::Result<()> {
        connection.execute(
            "CREATE TABLE Tags (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            ) STRICT",
            (),
        )?;

        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Tags(key, value) VALUES (?1, ?2)"
            )?;
            insert.execute((Self::KEY_VERSION, Self::VERSION))?;
            insert.execute((Self::KEY_SOURCES, graph.source_count().to_string()))?;
            insert.execute((Self::KEY_BLOCKS, graph.block_count().to_string()))?;
            insert.execute((Self::KEY_EDGES, graph.edge_count().to_string()))?;
        }
        transaction.commit()
    }

    fn insert_sources(graph: &Graph, connection: &mut Connection) -> rusqlite::Result<()> {
        connection.execute(
            "CREATE TABLE Sources (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                len INTEGER NOT NULL,
                kind INTEGER NOT NULL,
                host INTEGER,
                placement_start INTEGER,
                placement_end INTEGER,
                covered_start INTEGER NOT NULL,
                covered_end INTEGER NOT NULL
            ) STRICT",
            (),
        )?;

        let mut inserted = 0;
        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO
                    Sources(id, name, len, kind, host, placement_start, placement_end, covered_start, covered_end)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            )?;
            for (id, source) in graph.sources() {
                let (kind, host, start, end) = match source.kind {
                    SourceKind::Chromosome => (0, None, None, None),
                    SourceKind::AltLocus { host, start, end } => {
                        (1, Some(host), Some(start), Some(end))
                    },
                };
                insert.execute((
                    id, &source.name, source.len, kind, host, start, end,
                    source.covered.start, source.covered.end,
                ))?;
                inserted += 1;
            }
        }
        transaction.commit()?;

        eprintln!("Inserted {} source records", inserted);
        Ok(())
    }

    fn insert_blocks(graph: &Graph, connection: &mut Connection) -> rusqlite::Result<()> {
        connection.execute(
            "CREATE TABLE Blocks (
                id INTEGER PRIMARY KEY,
                ref_source INTEGER,
                ref_start INTEGER,
                ref_end INTEGER,
                alt_source INTEGER,
                alt_start INTEGER,
                alt_end INTEGER
            ) STRICT",
            (),
        )?;

        let mut inserted = 0;
        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO
                    Blocks(id, ref_source, ref_start, ref_end, alt_source, alt_start, alt_end)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            )?;
            for (id, block) in graph.blocks() {
                let (reference, alt) = match block {
                    Block::Reference(iv) => (Some(iv), None),
                    Block::Alt(iv) => (None, Some(iv)),
                    Block::Shared { reference, alt } => (Some(reference), Some(alt)),
                };
                insert.execute((
                    id,
                    reference.map(|iv| iv.source),
                    reference.map(|iv| iv.start),
                    reference.map(|iv| iv.end),
                    alt.map(|iv| iv.source),
                    alt.map(|iv| iv.start),
                    alt.map(|iv| iv.end),
                ))?;
                inserted += 1;
            }
        }
        transaction.commit()?;

        eprintln!("Inserted {} block records", inserted);
        Ok(())
    }

    fn insert_edges(graph: &Graph, connection: &mut Connection) -> rusqlite::Result<()> {
        connection.execute(
            "CREATE TABLE Edges (
                from_block INTEGER NOT NULL,
                to_block INTEGER NOT NULL,
                PRIMARY KEY (from_block, to_block)
            ) STRICT",
            (),
        )?;

        let mut inserted = 0;
        let transaction = connection.transaction()?;
        {
            let mut insert = transaction.prepare(
                "INSERT INTO Edges(from_block, to_block) VALUES (?1, ?2)"
            )?;
            for (from, to) in graph.edges() {
                insert.execute((from, to))?;
                inserted += 1;
            }
        }
        transaction.commit()?;

        eprintln!("Inserted {} edge records", inserted);
        Ok(())
    }
}

//-----------------------------------------------------------------------------

/// Loading the graph.
impl GraphBase {
    /// Loads the entire graph from the database.
    ///
    /// The loaded graph is validated against all structural invariants.
    pub fn load_graph(&self) -> Result<Graph, String> {
        // Sources.
        let mut sources: Vec<Source> = Vec::with_capacity(self.sources);
        let mut statement = self.connection.prepare(
            "SELECT id, name, len, kind, host, placement_start, placement_end, covered_start, covered_end
            FROM Sources ORDER BY id"
        ).map_err(|x| x.to_string())?;
        let mut rows = statement.query(()).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            let id: usize = row.get(0).map_err(|x| x.to_string())?;
            if id != sources.len() {
                return Err(format!("Source identifiers are not dense at {}", id));
            }
            sources.push(source_from_row(row).map_err(|x| x.to_string())?);
        }
        drop(rows);
        drop(statement);

        // Blocks.
        let mut blocks: Vec<(usize, Block)> = Vec::with_capacity(self.blocks);
        let mut statement = self.connection.prepare(
            "SELECT id, ref_source, ref_start, ref_end, alt_source, alt_start, alt_end
            FROM Blocks ORDER BY id"
        ).map_err(|x| x.to_string())?;
        let mut rows = statement.query(()).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            blocks.push(block_from_row(row).map_err(|x| x.to_string())??);
        }
        drop(rows);
        drop(statement);

        // Edges.
        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(self.edges);
        let mut statement = self.connection.prepare(
            "SELECT from_block, to_block FROM Edges ORDER BY from_block, to_block"
        ).map_err(|x| x.to_string())?;
        let mut rows = statement.query(()).map_err(|x| x.to_string())?;
        while let Some(row) = rows.next().map_err(|x| x.to_string())? {
            let from: usize = row.get(0).map_err(|x| x.to_string())?;
            let to: usize = row.get(1).map_err(|x| x.to_string())?;
            edges.push((from, to));
        }
        drop(rows);
        drop(statement);

        Graph::from_parts(sources, blocks, edges).map_err(|x| x.to_string())
    }
}

//-----------------------------------------------------------------------------

// Decodes a source from a database row starting at column 1.
fn source_from_row(row: &Row) -> rusqlite::Result<Source> {
    let name: String = row.get(1)?;
    let len: usize = row.get(2)?;
    let kind: usize = row.get(3)?;
    let covered_start: usize = row.get(7)?;
    let covered_end: usize = row.get(8)?;
    let kind = if kind == 0 {
        SourceKind::Chromosome
    } else {
        SourceKind::AltLocus {
            host: row.get(4)?,
            start: row.get(5)?,
            end: row.get(6)?,
        }
    };
    Ok(Source { name, len, kind, covered: covered_start..covered_end })
}

// Decodes a block from a database row.
// The outer result is a database error; the inner result reports an invalid row.
fn block_from_row(row: &Row) -> rusqlite::Result<Result<(usize, Block), String>> {
    let id: usize = row.get(0)?;
    let ref_source: Option<usize> = row.get(1)?;
    let alt_source: Option<usize> = row.get(4)?;
    let block = match (ref_source, alt_source) {
        (Some(source), None) => {
            Block::Reference(SourceInterval::new(source, row.get(2)?, row.get(3)?))
        },
        (None, Some(source)) => {
            Block::Alt(SourceInterval::new(source, row.get(5)?, row.get(6)?))
        },
        (Some(reference), Some(alt)) => Block::Shared {
            reference: SourceInterval::new(reference, row.get(2)?, row.get(3)?),
            alt: SourceInterval::new(alt, row.get(5)?, row.get(6)?),
        },
        (None, None) => {
            return Ok(Err(format!("Block {} has no source intervals", id)));
        },
    };
    Ok(Ok((id, block)))
}

//-----------------------------------------------------------------------------

/// Database queries without loading the graph.
///
/// The interface owns prepared statements for the queries.
/// In multi-threaded applications, each thread should have its own interface.
#[derive(Debug)]
pub struct GraphInterface<'a> {
    find_source: Statement<'a>,
    find_block: Statement<'a>,
    get_block: Statement<'a>,
    successors: Statement<'a>,
    predecessors: Statement<'a>,
}

impl<'a> GraphInterface<'a> {
    /// Creates a new interface to the given database.
    pub fn new(database: &'a GraphBase) -> Result<Self, String> {
        let find_source = database.connection.prepare(
            "SELECT id, name, len, kind, host, placement_start, placement_end, covered_start, covered_end
            FROM Sources WHERE name = ?1"
        ).map_err(|x| x.to_string())?;
        let find_block = database.connection.prepare(
            "SELECT id, ref_source, ref_start, ref_end, alt_source, alt_start, alt_end FROM Blocks
            WHERE (ref_source = ?1 AND ref_start <= ?2 AND ref_end > ?2)
                OR (alt_source = ?1 AND alt_start <= ?2 AND alt_end > ?2)"
        ).map_err(|x| x.to_string())?;
        let get_block = database.connection.prepare(
            "SELECT id, ref_source, ref_start, ref_end, alt_source, alt_start, alt_end
            FROM Blocks WHERE id = ?1"
        ).map_err(|x| x.to_string())?;
        let successors = database.connection.prepare(
            "SELECT to_block FROM Edges WHERE from_block = ?1 ORDER BY to_block"
        ).map_err(|x| x.to_string())?;
        let predecessors = database.connection.prepare(
            "SELECT from_block FROM Edges WHERE to_block = ?1 ORDER BY from_block"
        ).map_err(|x| x.to_string())?;
        Ok(GraphInterface { find_source, find_block, get_block, successors, predecessors })
    }

    /// Returns the identifier and the metadata of the source with the given name.
    pub fn find_source(&mut self, name: &str) -> Result<Option<(usize, Source)>, String> {
        self.find_source.query_row((name,), |row| {
            let id: usize = row.get(0)?;
            let source = source_from_row(row)?;
            Ok((id, source))
        }).optional().map_err(|x| x.to_string())
    }

    /// Returns the block with the given identifier.
    pub fn get_block(&mut self, id: usize) -> Result<Option<Block>, String> {
        let result = self.get_block.query_row((id,), block_from_row).optional().map_err(|x| x.to_string())?;
        match result {
            Some(block) => Ok(Some(block?.1)),
            None => Ok(None),
        }
    }

    /// Returns the block containing the given offset of the given source,
    /// along with its identifier and the block-local offset.
    pub fn find_block(&mut self, source: usize, offset: usize) -> Result<Option<(usize, Block, usize)>, String> {
        let result = self.find_block.query_row((source, offset), block_from_row).optional().map_err(|x| x.to_string())?;
        let (id, block) = match result {
            Some(block) => block?,
            None => return Ok(None),
        };
        let iv = block.interval_for(source).ok_or(
            format!("Block {} does not belong to source {}", id, source)
        )?;
        let local = offset - iv.start;
        Ok(Some((id, block, local)))
    }

    /// Returns the successors of the given block.
    pub fn successors(&mut self, id: usize) -> Result<Vec<usize>, String> {
        let rows = self.successors.query_map((id,), |row| row.get(0)).map_err(|x| x.to_string())?;
        rows.collect::<rusqlite::Result<Vec<usize>>>().map_err(|x| x.to_string())
    }

    /// Returns the predecessors of the given block.
    pub fn predecessors(&mut self, id: usize) -> Result<Vec<usize>, String> {
        let rows = self.predecessors.query_map((id,), |row| row.get(0)).map_err(|x| x.to_string())?;
        rows.collect::<rusqlite::Result<Vec<usize>>>().map_err(|x| x.to_string())
    }
}

//-----------------------------------------------------------------------------

// Reads a string value from the tags table.
fn get_string_value(statement: &mut Statement, key: &str) -> Result<String, String> {
    let result = statement.query_row((key,), |row| row.get(0)).optional().map_err(|x| x.to_string())?;
    result.ok_or(format!("Missing tag: {}", key))
}

// Reads a numeric value from the tags table.
fn get_numeric_value(statement: &mut Statement, key: &str) -> Result<usize, String> {
    let value = get_string_value(statement, key)?;
    value.parse().map_err(|_| format!("Invalid value for tag {}: {}", key, value))
}

//-----------------------------------------------------------------------------
