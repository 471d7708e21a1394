use anyhow::{Context, Result};
use clap::{App, load_yaml};

use packing_search::checkpoint::JsonCheckpointStore;
use packing_search::search::random_walk::{RandomWalk, RandomWalkParams};
use packing_search::util::{
    export_report, init_logging, install_interrupt_handler, parse_arg, parse_required,
    print_report, read_geng, read_oracle,
};


/** random walk through planar subcubic connected graphs of a given order (Ctrl-C saves and stops) */
pub fn main() -> Result<()> {
    // parse arguments
    let yaml = load_yaml!("random_walk.yml");
    let main_args = App::from_yaml(yaml).get_matches();
    init_logging(&main_args);
    let params = RandomWalkParams {
        initial_vertices: parse_required(&main_args, "initial")?,
        iterations: parse_required(&main_args, "iterations")?,
        save_interval: parse_required(&main_args, "interval")?,
        seed: parse_arg(&main_args, "seed")?.unwrap_or(0),
    };
    let checkpoint = main_args.value_of("checkpoint").context("missing checkpoint file")?;
    println!("{} vertices, {} iterations, seed {}", params.initial_vertices, params.iterations, params.seed);
    println!("checkpoint every {} iterations in: {}", params.save_interval, checkpoint);
    let geng = read_geng(&main_args);
    let oracle = read_oracle(&main_args)?;
    let cancel = install_interrupt_handler()?;
    println!("=======================");

    // search
    let mut store = JsonCheckpointStore::new(checkpoint);
    let report = RandomWalk::new(&geng, &oracle, &mut store, params)
        .with_cancellation(cancel)
        .run()
        .with_context(|| format!("random walk failed (state saved in {})", checkpoint))?;

    // export results
    print_report(&report);
    export_report(&report, main_args.value_of("perf"))?;
    Ok(())
}
