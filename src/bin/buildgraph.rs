use obg_base::{formats, utils, Graph, GraphBase};

use std::{env, process};

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let config = Config::new()?;

    eprintln!("Reading chromosome sizes from {}", config.chrom_sizes);
    let mut reader = utils::open_file(&config.chrom_sizes)?;
    let chromosomes = formats::read_chrom_sizes(&mut reader)?;
    eprintln!("Reading alt locus placements from {}", config.alt_loci);
    let mut reader = utils::open_file(&config.alt_loci)?;
    let loci = formats::read_alt_loci(&mut reader)?;

    let graph = Graph::create(&chromosomes, &loci)?;
    eprintln!(
        "Built a graph with {} sources, {} blocks, and {} edges",
        graph.source_count(), graph.block_count(), graph.edge_count()
    );

    GraphBase::create(&graph, &config.output)?;
    let database = GraphBase::open(&config.output)?;
    eprintln!("Database size: {}", database.file_size().unwrap_or(String::from("unknown")));

    Ok(())
}

//-----------------------------------------------------------------------------

pub struct Config {
    pub chrom_sizes: String,
    pub alt_loci: String,
    pub output: String,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let header = format!("Usage: {} [options] chrom.sizes alt_loci.txt graph.db", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        if matches.free.len() != 3 {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        }

        Ok(Config {
            chrom_sizes: matches.free[0].clone(),
            alt_loci: matches.free[1].clone(),
            output: matches.free[2].clone(),
        })
    }
}

//-----------------------------------------------------------------------------
