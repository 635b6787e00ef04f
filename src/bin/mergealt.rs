use obg_base::{formats, utils, GraphBase, GraphError, MergeParams, SourceKind};

use std::{env, process};

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let config = Config::new()?;

    let database = GraphBase::open(&config.input)?;
    let mut graph = database.load_graph()?;
    drop(database);

    let mut merged = 0;
    let mut skipped = 0;
    for (locus, filename) in config.merges.iter() {
        // The placement tells us how to lift the alignment coordinates.
        let placement = graph.source_id(locus)
            .and_then(|id| graph.source(id))
            .map(|source| source.kind);
        let offset = match placement {
            Some(SourceKind::AltLocus { start, .. }) => start,
            _ => {
                eprintln!("Skipping locus {}: not an alt locus in the graph", locus);
                skipped += 1;
                continue;
            },
        };
        let records = match utils::open_file(filename)
            .and_then(|mut reader| formats::read_alignments(&mut reader, locus, offset)) {
            Ok(records) => records,
            Err(message) => {
                eprintln!("Skipping locus {}: {}", locus, message);
                skipped += 1;
                continue;
            },
        };

        match graph.merge_alt_locus(locus, &records, &config.params) {
            Ok(summary) => {
                eprintln!("Merged {}", summary);
                merged += 1;
            },
            Err(error @ GraphError::NoAlignmentEvidence(_)) |
            Err(error @ GraphError::AlreadyMerged(_)) => {
                eprintln!("Skipping locus {}: {}", locus, error);
                skipped += 1;
            },
            // The graph can no longer be trusted.
            Err(error) => return Err(error.to_string()),
        }
    }
    eprintln!("Merged {} loci, skipped {}", merged, skipped);

    GraphBase::create(&graph, &config.output)?;
    Ok(())
}

//-----------------------------------------------------------------------------

pub struct Config {
    pub input: String,
    pub output: String,
    pub merges: Vec<(String, String)>,
    pub params: MergeParams,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optmulti("a", "alignments", "merge LOCUS using alignment FILE (repeatable)", "LOCUS=FILE");
        opts.optopt("", "min-identity", "minimum identity percentage (default 95)", "FLOAT");
        opts.optopt("", "min-length", "minimum alignment length (default 300)", "INT");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let header = format!("Usage: {} [options] in.db out.db", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        if matches.free.len() != 2 {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        }

        let mut merges: Vec<(String, String)> = Vec::new();
        for value in matches.opt_strs("a") {
            let (locus, filename) = value.split_once('=').ok_or(
                format!("--alignments: expected LOCUS=FILE, got {}", value)
            )?;
            merges.push((locus.to_string(), filename.to_string()));
        }
        if merges.is_empty() {
            return Err(String::from("No loci to merge; use --alignments"));
        }

        let mut params = MergeParams::default();
        if let Some(s) = matches.opt_str("min-identity") {
            params.min_identity = s.parse::<f64>().map_err(|x| format!("--min-identity: {}", x))?;
        }
        if let Some(s) = matches.opt_str("min-length") {
            params.min_length = s.parse::<usize>().map_err(|x| format!("--min-length: {}", x))?;
        }

        Ok(Config {
            input: matches.free[0].clone(),
            output: matches.free[1].clone(),
            merges,
            params,
        })
    }
}

//-----------------------------------------------------------------------------
