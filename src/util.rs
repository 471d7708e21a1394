use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use tracing_subscriber::{fmt, EnvFilter};

use crate::generator::Geng;
use crate::oracle::{IlpOracle, LabelBound};
use crate::search::{CancellationToken, SearchReport};

/** installs the log subscriber on stderr.
RUST_LOG takes precedence, otherwise the level depends on the number of -v flags (info by default).
*/
pub fn init_logging(main_args:&ArgMatches) {
    let filter = match main_args.occurrences_of("verbose") {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// parses an optional argument
pub fn parse_arg<T>(main_args:&ArgMatches, name:&str) -> Result<Option<T>>
where T:FromStr, T::Err:std::fmt::Display {
    match main_args.value_of(name) {
        None => Ok(None),
        Some(s) => s.parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid value {} for --{}: {}", s, name, e)),
    }
}

/// parses a required argument
pub fn parse_required<T>(main_args:&ArgMatches, name:&str) -> Result<T>
where T:FromStr, T::Err:std::fmt::Display {
    parse_arg(main_args, name)?.ok_or_else(|| anyhow!("missing argument --{}", name))
}

/** reads the oracle parameters (--bound, --time-limit in seconds) */
pub fn read_oracle(main_args:&ArgMatches) -> Result<IlpOracle> {
    let bound:LabelBound = parse_arg(main_args, "bound")?.unwrap_or_default();
    let time_limit = parse_arg::<f32>(main_args, "time-limit")?
        .map(Duration::try_from_secs_f32)
        .transpose()
        .context("invalid time limit")?;
    println!("label bound: {:?}", bound);
    if let Some(t) = time_limit { println!("oracle time limit: {:?}", t); }
    Ok(IlpOracle::new().with_bound(bound).with_time_limit(time_limit))
}

/** reads the geng executable (--geng, "geng" from the PATH by default) */
pub fn read_geng(main_args:&ArgMatches) -> Geng {
    match main_args.value_of("geng") {
        None => Geng::default(),
        Some(path) => {
            println!("using geng: {}", path);
            Geng::new(path)
        }
    }
}

/** cancellation token set by Ctrl-C */
pub fn install_interrupt_handler() -> Result<CancellationToken> {
    let cancel = CancellationToken::new();
    let handler_side = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("interrupted, saving the search state...");
        handler_side.cancel();
    }).context("unable to install the Ctrl-C handler")?;
    Ok(cancel)
}

/// prints a summary of a search run
pub fn print_report(report:&SearchReport) {
    println!("=======================");
    println!("outcome:            {:?}", report.outcome);
    println!("highest value:      {}", report.highest_value);
    println!("nb best graphs:     {}", report.nb_best_graphs);
    println!("nb candidates:      {}", report.nb_candidates);
    println!("nb scored:          {}", report.nb_scored);
    println!("nb rejected:        {}", report.nb_rejected);
    println!("nb duplicates:      {}", report.nb_duplicates);
    println!("nb oracle failures: {}", report.nb_oracle_failures);
    println!("time searched:      {:.3} seconds", report.time_searched);
}

/// exports the statistics of a search run (--perf) as JSON
pub fn export_report(report:&SearchReport, perf_file:Option<&str>) -> Result<()> {
    if let Some(filename) = perf_file {
        let content = serde_json::to_string(report)?;
        std::fs::write(Path::new(filename), content)
            .with_context(|| format!("couldn't write {}", filename))?;
        println!("statistics written to {}", filename);
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    use clap::{App, Arg};
    use tempfile::tempdir;

    use crate::search::SearchOutcome;

    fn app() -> App<'static, 'static> {
        App::new("test")
            .arg(Arg::with_name("bound").long("bound").takes_value(true))
            .arg(Arg::with_name("time-limit").long("time-limit").takes_value(true))
            .arg(Arg::with_name("iterations").short("i").takes_value(true))
    }

    #[test]
    fn test_read_oracle() {
        let args = app().get_matches_from(vec!["test", "--bound", "greedy", "--time-limit", "2.5"]);
        let oracle = read_oracle(&args).unwrap();
        assert_eq!(oracle.bound(), LabelBound::Greedy);
        let args = app().get_matches_from(vec!["test"]);
        assert_eq!(read_oracle(&args).unwrap().bound(), LabelBound::DiameterThenGreedy);
        let args = app().get_matches_from(vec!["test", "--bound", "tight"]);
        assert!(read_oracle(&args).is_err());
        let args = app().get_matches_from(vec!["test", "--time-limit", "NaN"]);
        assert!(read_oracle(&args).is_err());
    }

    #[test]
    fn test_parse_required() {
        let args = app().get_matches_from(vec!["test", "-i", "1500"]);
        assert_eq!(parse_required::<usize>(&args, "iterations").unwrap(), 1500);
        let args = app().get_matches_from(vec!["test", "-i", "many"]);
        assert!(parse_required::<usize>(&args, "iterations").is_err());
        let args = app().get_matches_from(vec!["test"]);
        assert!(parse_required::<usize>(&args, "iterations").is_err());
    }

    #[test]
    fn test_export_report() {
        let tmp = tempdir().expect("create temp dir");
        let path = tmp.path().join("perf.json");
        let report = SearchReport {
            outcome: SearchOutcome::Cancelled,
            highest_value: 4,
            nb_best_graphs: 2,
            nb_candidates: 10,
            nb_scored: 7,
            nb_rejected: 0,
            nb_duplicates: 3,
            nb_oracle_failures: 0,
            time_searched: 1.5,
        };
        export_report(&report, path.to_str()).unwrap();
        let value:serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["outcome"], "cancelled");
        assert_eq!(value["highest_value"], 4);
        assert_eq!(value["nb_duplicates"], 3);
    }
}
