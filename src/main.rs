//! Packing coloring number of graphs given in graph6 format

use std::io::Read;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{App, load_yaml};

use packing_search::generator::is_admissible;
use packing_search::graph6::read_graph6_lines;
use packing_search::oracle::{checker, CheckerResult};
use packing_search::util::{init_logging, read_oracle};


/**
reads graph6 lines (from a file or the standard input) and prints the packing coloring number
of each graph, with an optimal coloring.
*/
pub fn main() -> Result<()> {
    // parse arguments
    let yaml = load_yaml!("main_args.yml");
    let main_args = App::from_yaml(yaml).get_matches();
    init_logging(&main_args);
    let oracle = read_oracle(&main_args)?;
    // read graphs
    let content = match main_args.value_of("input") {
        Some(filename) => {
            println!("reading graphs: {}...", filename);
            std::fs::read_to_string(filename).with_context(|| format!("unable to read {}", filename))?
        },
        None => {
            let mut res = String::new();
            std::io::stdin().read_to_string(&mut res).context("unable to read the standard input")?;
            res
        }
    };
    let graphs = read_graph6_lines(&content)?;
    println!("{} graphs read", graphs.len());
    println!("=======================");
    // score them
    for (i,g) in graphs.iter().enumerate() {
        println!("graph {}:", i);
        g.display_statistics();
        if !is_admissible(g) {
            println!("\t(not planar, subcubic and connected)");
        }
        let t_start = Instant::now();
        match oracle.solve(g) {
            Err(e) => println!("\tno packing coloring number: {}", e),
            Ok(coloring) => {
                let duration = t_start.elapsed().as_secs_f32();
                match checker(g, &coloring.classes) {
                    CheckerResult::Ok(_) => {},
                    res => println!("\tinvalid coloring (reason: {:?})", res),
                }
                println!("\tpacking coloring number: {} ({:.3} seconds)", coloring.number, duration);
                for (label,class) in coloring.classes.iter().enumerate() {
                    println!("\t\tlabel {}: {:?}", label+1, class);
                }
            }
        }
    }
    Ok(())
}
