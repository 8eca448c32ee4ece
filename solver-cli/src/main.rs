mod cli;

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use log::error;

use solver::{Formula, Propagator, SatResult, SimplePropagator, SolverCore, WatchedPropagator};

use cli::Config;

const EXIT_OK: u8 = 0;
const EXIT_GENERIC_ERROR: u8 = 1;
const EXIT_ARG_ERROR: u8 = 2;
const EXIT_SAT: u8 = 10;
const EXIT_UNSAT: u8 = 20;
const EXIT_UNDEFINED: u8 = 30;
const EXIT_TIMEOUT: u8 = 40;

fn read_input(path: &str) -> io::Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(path)
    }
}

fn write_output(path: &str, text: &str) -> io::Result<()> {
    if path == "-" {
        io::stdout().write_all(text.as_bytes())
    } else {
        fs::write(path, text)
    }
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();
}

/// Drives a single `SolverCore<P>` to completion and renders the result.
/// Generic over the propagator so both variants share one code path,
/// monomorphized once per branch at the call site in `main`.
fn run<P: Propagator>(formula: Formula, config: &Config) -> (ExitCode, String) {
    let num_variables = formula.num_variables();
    let num_clauses = formula.num_clauses();
    let mut solver: SolverCore<P> = SolverCore::new(formula);
    if let Some(secs) = config.max_time {
        solver.set_max_time(secs);
    }

    let mut report = String::new();
    if config.print_formula {
        report.push_str(&solver.formula().to_string());
    }

    if config.no_solve {
        return (ExitCode::from(EXIT_OK), report);
    }

    let result = match solver.query() {
        Ok(result) => result,
        Err(e) => {
            error!("{}", e);
            return (ExitCode::from(EXIT_GENERIC_ERROR), report);
        }
    };

    report.push_str(&result.to_dimacs(num_variables, num_clauses));
    if config.print_map {
        for v in 1..=num_variables {
            if let Some(truth) = solver.assignment().entry(v).truth() {
                report.push_str(&format!("m {} {}\n", v, truth));
            }
        }
    }

    let code = if solver.has_timeout() {
        EXIT_TIMEOUT
    } else {
        match result {
            SatResult::Satisfiable(_) => EXIT_SAT,
            SatResult::Unsatisfiable => EXIT_UNSAT,
            SatResult::Undefined => EXIT_UNDEFINED,
        }
    };
    (ExitCode::from(code), report)
}

fn main() -> ExitCode {
    let matches = cli::parse_args();
    let config = match Config::from_matches(&matches) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(EXIT_ARG_ERROR);
        }
    };

    init_logging(config.verbosity);

    let text = match read_input(&config.input) {
        Ok(text) => text,
        Err(e) => {
            error!("failed to read {}: {}", config.input, e);
            return ExitCode::from(EXIT_GENERIC_ERROR);
        }
    };

    let formula = match Formula::from_dimacs(&text) {
        Ok(formula) => formula,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_GENERIC_ERROR);
        }
    };

    let (code, report) = if config.disable_watched_literals {
        run::<SimplePropagator>(formula, &config)
    } else {
        run::<WatchedPropagator>(formula, &config)
    };

    if let Err(e) = write_output(&config.output, &report) {
        error!("failed to write {}: {}", config.output, e);
        return ExitCode::from(EXIT_GENERIC_ERROR);
    }

    code
}
