use clap::{App, Arg, ArgMatches};

/// Parsed `solver-cli` invocation (§4.7).
pub struct Config {
    pub input: String,
    pub output: String,
    pub verbosity: u64,
    pub max_time: Option<f64>,
    pub disable_watched_literals: bool,
    pub print_formula: bool,
    pub print_map: bool,
    pub no_solve: bool,
}

pub fn parse_args() -> ArgMatches<'static> {
    App::new("solver-cli")
        .version("0.1.0")
        .about("DPLL SAT solver over DIMACS CNF input")
        .arg(Arg::with_name("INPUT").required(true).index(1).help("CNF input file, or - for stdin"))
        .arg(Arg::with_name("OUTPUT").required(true).index(2).help("solution output file, or - for stdout"))
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("increase logging verbosity (repeatable)"),
        )
        .arg(
            Arg::with_name("max-time")
                .short("t")
                .long("max-time")
                .takes_value(true)
                .help("solver deadline in seconds"),
        )
        .arg(
            Arg::with_name("disable-watched-literals")
                .short("d")
                .long("disable-watched-literals")
                .help("use the simple-propagation variant instead of watched literals"),
        )
        .arg(
            Arg::with_name("print-formula")
                .short("f")
                .long("print-formula")
                .help("print the parsed formula before solving"),
        )
        .arg(
            Arg::with_name("print-map")
                .short("m")
                .long("print-map")
                .help("print the final assignment map"),
        )
        .arg(
            Arg::with_name("no-solve")
                .short("n")
                .long("no-solve")
                .help("parse (and optionally print) without calling query()"),
        )
        .get_matches()
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Result<Config, String> {
        let max_time = match matches.value_of("max-time") {
            Some(text) => Some(text.parse::<f64>().map_err(|_| format!("invalid --max-time value: {:?}", text))?),
            None => None,
        };
        Ok(Config {
            input: matches.value_of("INPUT").unwrap().to_string(),
            output: matches.value_of("OUTPUT").unwrap().to_string(),
            verbosity: matches.occurrences_of("verbose"),
            max_time,
            disable_watched_literals: matches.is_present("disable-watched-literals"),
            print_formula: matches.is_present("print-formula"),
            print_map: matches.is_present("print-map"),
            no_solve: matches.is_present("no-solve"),
        })
    }
}
