use clap::{App, Arg, ArgMatches};
use dpll_oracle::formula::dimacs::{parse, parse_file, DimacsParseError};
use dpll_oracle::formula::Formula;
use dpll_oracle::*;
use log::info;
use std::fs;

fn main() {
    env_logger::init();

    let matches = App::new("dpll-oracle")
        .about("DPLL search with propagation delegated to an oracle")
        .arg(Arg::with_name("INPUT").help("input file (in CNF)").index(1))
        .arg(
            Arg::with_name("oracle")
                .long("oracle")
                .value_name("COMMAND")
                .takes_value(true)
                .help("external propagation engine, run once per trigger (built-in unit propagation otherwise)"),
        )
        .arg(
            Arg::with_name("exchange-dir")
                .long("exchange-dir")
                .value_name("DIR")
                .takes_value(true)
                .requires("oracle")
                .help("exchange triggers and responses through files in DIR instead of stdin/stdout"),
        )
        .arg(
            Arg::with_name("trace")
                .long("trace")
                .value_name("FILE")
                .takes_value(true)
                .help("write the execution trace to FILE"),
        )
        .get_matches();

    let f = match read_formula(&matches) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("parse error: {}", e);
            std::process::exit(-1);
        }
    };
    info!("{} variables, {} clauses", f.num_variables(), f.num_clauses());

    let result = match matches.value_of("oracle") {
        Some(line) => match CommandOracle::from_command_line(line) {
            Some(oracle) => match matches.value_of("exchange-dir") {
                Some(dir) => solve(&f, oracle.with_exchange_dir(dir)),
                None => solve(&f, oracle),
            },
            None => {
                eprintln!("--oracle needs a command");
                std::process::exit(-1);
            }
        },
        None => solve(&f, UnitPropagator::new(&f)),
    };

    match result {
        Ok(result) => {
            if let Some(path) = matches.value_of("trace") {
                if let Err(e) = fs::write(path, &result.trace) {
                    eprintln!("cannot write trace to {}: {}", path, e);
                    std::process::exit(-1);
                }
            }
            print_result(&result);
            let exit_code = match result.status {
                SatResult::Satisfiable => 0,
                SatResult::Unsatisfiable => 1,
            };
            std::process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("solver error: {}", e);
            std::process::exit(-1);
        }
    }
}

fn read_formula(matches: &ArgMatches) -> Result<Formula, DimacsParseError> {
    match matches.value_of("INPUT") {
        Some(path) => parse_file(path),
        None => parse(std::io::stdin()),
    }
}

fn print_result(result: &SolveResult) {
    if let Some(id) = &result.final_conflict_id {
        println!("c last conflict {}", id);
    }
    match &result.model {
        Some(model) => {
            println!("s SATISFIABLE");
            let literals: Vec<String> = model.literals().iter().map(|l| l.to_string()).collect();
            println!("v {} 0", literals.join(" "));
        }
        None => println!("s UNSATISFIABLE"),
    }
}
