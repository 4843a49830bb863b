//! `cog-tester` command-line entry point

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use cog_tester::logging::init_logging;
use cog_tester::{run_simulator, CogTester, SimulatorConfig, TesterConfig};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

fn cli() -> Command {
    Command::new("cog-tester")
        .version(cog_core::VERSION)
        .about("Drive the Cog rewrite engine from scripts or random simulation")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Tracing filter, e.g. 'debug' or 'cog_core=trace'"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("run")
                .about("Execute a command script")
                .arg(
                    Arg::new("script")
                        .value_parser(value_parser!(PathBuf))
                        .help("Script file (reads stdin when absent)"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run the randomized rewrite simulator")
                .arg(
                    Arg::new("operations")
                        .long("ops")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Number of operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .value_parser(value_parser!(u64))
                        .help("Random seed (defaults to the configured seed)"),
                )
                .arg(
                    Arg::new("max-records")
                        .long("max-records")
                        .default_value("512")
                        .value_parser(value_parser!(usize))
                        .help("Upper bound on records in the initial tree"),
                )
                .arg(
                    Arg::new("keep-going")
                        .long("keep-going")
                        .action(ArgAction::SetTrue)
                        .help("Keep running after the first violation"),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<TesterConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => TesterConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(TesterConfig::default()),
    }
}

fn run_script(config: TesterConfig, script: Option<&PathBuf>) -> anyhow::Result<()> {
    let stdout = io::stdout().lock();
    let mut tester = CogTester::new(config, stdout)?;
    match script {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            tester.run(BufReader::new(file))?;
        }
        None => tester.run(io::stdin().lock())?,
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;

    let filter = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .or(config.log_filter.as_deref());
    init_logging(filter, matches.get_flag("log-json"))?;

    match matches.subcommand() {
        Some(("simulate", args)) => {
            let seed = args.get_one::<u64>("seed").copied().unwrap_or(config.seed);
            let sim = SimulatorConfig {
                seed,
                total_operations: args.get_one::<u64>("operations").copied().unwrap_or(1_000),
                max_records: args.get_one::<usize>("max-records").copied().unwrap_or(512),
                cracker_min_size: config.cracker_min_size,
                stop_on_first_violation: !args.get_flag("keep-going"),
                ..Default::default()
            };

            println!("Running Cog Simulator...");
            println!("Operations: {}", sim.total_operations);
            println!("Seed: {}", sim.seed);
            println!();

            let report = run_simulator(sim);
            println!("{}", report.generate_text());

            std::process::exit(if report.passed() { 0 } else { 1 });
        }
        Some(("run", args)) => run_script(config, args.get_one::<PathBuf>("script")),
        _ => run_script(config, None),
    }
}
