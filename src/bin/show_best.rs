use std::path::Path;

use anyhow::{Context, Result};
use clap::{App, load_yaml};

use packing_search::checkpoint::{CheckpointStore, JsonCheckpointStore};
use packing_search::graph6::to_graph6;
use packing_search::oracle::{checker, CheckerResult};
use packing_search::util::{init_logging, read_oracle};


/// name of the exported file of the idx-th best graph (numbered from 1)
fn export_filename(idx:usize, value:usize) -> String {
    format!("best_graph_{}_color_{}.g6", idx, value)
}

/** displays the best graphs of a checkpoint, with an optimal packing coloring of each */
pub fn main() -> Result<()> {
    // parse arguments
    let yaml = load_yaml!("show_best.yml");
    let main_args = App::from_yaml(yaml).get_matches();
    init_logging(&main_args);
    let checkpoint = main_args.value_of("checkpoint").context("missing checkpoint file")?;
    let oracle = read_oracle(&main_args)?;
    let store = JsonCheckpointStore::new(checkpoint);
    let state = store.load().with_context(|| format!("unable to load {}", checkpoint))?;
    println!("=======================");
    println!("search mode:     {}", state.cursor.mode());
    println!("highest value:   {}", state.highest_value);
    println!("nb best graphs:  {}", state.best_graphs.len());

    // display graphs
    for (i,g) in state.best_graphs.iter().enumerate() {
        println!("=======================");
        println!("graph {}: {}", i+1, to_graph6(g));
        g.display_statistics();
        println!("\tedges: {:?}", g.edges());
        match oracle.solve(g) {
            Err(e) => println!("\tunable to compute a witness: {}", e),
            Ok(coloring) => {
                match checker(g, &coloring.classes) {
                    CheckerResult::Ok(_) => {},
                    res => println!("\tinvalid witness (reason: {:?})", res),
                }
                if coloring.number != state.highest_value {
                    println!("\twarning: recomputed value {} differs from the checkpoint", coloring.number);
                }
                for (label,class) in coloring.classes.iter().enumerate() {
                    println!("\t\tlabel {}: {:?}", label+1, class);
                }
            }
        }
    }

    // export graphs
    if let Some(dir) = main_args.value_of("export") {
        std::fs::create_dir_all(dir).with_context(|| format!("unable to create {}", dir))?;
        for (i,g) in state.best_graphs.iter().enumerate() {
            let filename = Path::new(dir).join(export_filename(i+1, state.highest_value));
            std::fs::write(&filename, format!("{}\n", to_graph6(g)))
                .with_context(|| format!("couldn't write {}", filename.display()))?;
        }
        println!("=======================");
        println!("{} graphs written in {}", state.best_graphs.len(), dir);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename(1, 5), "best_graph_1_color_5.g6");
        assert_eq!(export_filename(12, 4), "best_graph_12_color_4.g6");
    }
}
