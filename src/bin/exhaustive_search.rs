use anyhow::{Context, Result};
use clap::{App, load_yaml};

use packing_search::checkpoint::JsonCheckpointStore;
use packing_search::search::exhaustive::{ExhaustiveParams, ExhaustiveSearch};
use packing_search::util::{
    export_report, init_logging, install_interrupt_handler, parse_arg, parse_required,
    print_report, read_geng, read_oracle,
};


/** scores every planar subcubic connected graph up to a number of vertices (Ctrl-C saves and stops) */
pub fn main() -> Result<()> {
    // parse arguments
    let yaml = load_yaml!("exhaustive_search.yml");
    let main_args = App::from_yaml(yaml).get_matches();
    init_logging(&main_args);
    let params = ExhaustiveParams {
        max_vertices: parse_required(&main_args, "max")?,
        save_frequency: parse_arg(&main_args, "frequency")?
            .unwrap_or(ExhaustiveParams::default().save_frequency),
    };
    let checkpoint = main_args.value_of("checkpoint").context("missing checkpoint file")?;
    println!("max vertices: {}", params.max_vertices);
    println!("checkpoint every {} graphs in: {}", params.save_frequency, checkpoint);
    let geng = read_geng(&main_args);
    let oracle = read_oracle(&main_args)?;
    let cancel = install_interrupt_handler()?;
    println!("=======================");

    // search
    let mut store = JsonCheckpointStore::new(checkpoint);
    let report = ExhaustiveSearch::new(&geng, &oracle, &mut store, params)
        .with_cancellation(cancel)
        .run()
        .with_context(|| format!("exhaustive search failed (state saved in {})", checkpoint))?;

    // export results
    print_report(&report);
    export_report(&report, main_args.value_of("perf"))?;
    Ok(())
}
