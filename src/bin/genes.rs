use obg_base::multipath::{self, Classification};
use obg_base::{formats, utils, DivergentRegions, GraphBase, Translation};

use std::io::{self, Write};
use std::{env, process};

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let config = Config::new()?;

    let database = GraphBase::open(&config.input)?;
    let graph = database.load_graph()?;
    drop(database);
    let translation = Translation::new(&graph)?;
    let regions = DivergentRegions::new(&graph, translation.index())?;
    eprintln!("The graph has {} divergent regions", regions.len());

    let mut reader = utils::open_file(&config.genes)?;
    let mut genes = formats::read_genes(&mut reader)?;
    if let Some(name) = &config.gene {
        genes.retain(|gene| {
            gene.name == *name || gene.display_name.as_deref() == Some(name.as_str())
        });
        if genes.is_empty() {
            return Err(format!("Gene {} is not in the annotation", name));
        }
    }

    let (classified, anomalies) = multipath::classify_genes(&graph, &translation, &regions, &genes);
    for (name, error) in anomalies.iter() {
        eprintln!("Skipping gene {}: {}", name, error);
    }

    let mut output = io::stdout();
    let mut multipath_count = 0;
    for gene in classified.iter() {
        if gene.classification != Classification::SinglePath {
            multipath_count += 1;
        }
        let paths: Vec<String> = gene.paths.iter().map(|path| {
            path.iter().map(|block| block.to_string()).collect::<Vec<String>>().join(">")
        }).collect();
        writeln!(
            output, "{}\t{}\t{}\t{}\t{}",
            gene.name,
            gene.display_name.as_deref().unwrap_or(&gene.name),
            gene.interval,
            gene.classification,
            paths.join(",")
        ).map_err(|x| x.to_string())?;
    }
    eprintln!(
        "Classified {} genes: {} multipath, {} skipped",
        classified.len(), multipath_count, anomalies.len()
    );

    Ok(())
}

//-----------------------------------------------------------------------------

pub struct Config {
    pub input: String,
    pub genes: String,
    pub gene: Option<String>,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("g", "gene", "classify only the named gene", "NAME");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let header = format!("Usage: {} [options] graph.db genes.txt", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        if matches.free.len() != 2 {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        }

        Ok(Config {
            input: matches.free[0].clone(),
            genes: matches.free[1].clone(),
            gene: matches.opt_str("g"),
        })
    }
}

//-----------------------------------------------------------------------------
