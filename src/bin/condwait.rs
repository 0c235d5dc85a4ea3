use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{error, info};
use std::process;

use condwait::{
    create_sample_config, load_config, Probe, Waiter, EXIT_ERROR, EXIT_SATISFIED, EXIT_TIMED_OUT,
};

fn cli() -> Command {
    Command::new("condwait")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Wait until a condition holds or a timeout elapses")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("condwait.toml"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECS")
                .help("Maximum time to wait, in seconds")
                .value_parser(value_parser!(f64))
                .allow_negative_numbers(true),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("MS")
                .help("Delay between condition checks, in milliseconds")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("connect-timeout")
                .long("connect-timeout")
                .value_name("MS")
                .help("Per-attempt TCP connect timeout, in milliseconds")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (error, warn, info, debug, trace)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the wait outcome as JSON"),
        )
        .arg(
            Arg::new("write-sample-config")
                .long("write-sample-config")
                .value_name("FILE")
                .help("Write a sample configuration file and exit"),
        )
        .arg(
            Arg::new("kind")
                .value_name("KIND")
                .value_parser(["file", "tcp", "cmd"])
                .help("Condition to wait for")
                .required_unless_present("write-sample-config"),
        )
        .arg(
            Arg::new("target")
                .value_name("TARGET")
                .help("Path, host:port or program, depending on KIND")
                .required_unless_present("write-sample-config"),
        )
        .arg(
            Arg::new("args")
                .value_name("ARGS")
                .help("Arguments passed to the program for KIND=cmd")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true),
        )
}

fn init_logging(level: Option<&str>) {
    let default_level = level.unwrap_or("info");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn run(matches: &ArgMatches) -> Result<i32> {
    if let Some(path) = matches.get_one::<String>("write-sample-config") {
        create_sample_config(path)?;
        println!("Sample configuration written to: {path}");
        return Ok(EXIT_SATISFIED);
    }

    let config_path = matches.get_one::<String>("config");
    let config = load_config(config_path.map(|s| s.as_str()), matches)?;
    init_logging(config.log_level.as_deref());

    let kind = matches
        .get_one::<String>("kind")
        .context("Missing condition kind")?;
    let target = matches
        .get_one::<String>("target")
        .context("Missing condition target")?;
    let args: Vec<String> = matches
        .get_many::<String>("args")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let probe =
        Probe::parse(kind, target, &args)?.with_connect_timeout(config.connect_timeout())?;
    let waiter = Waiter::new(config.wait_spec()?);

    info!(
        "Waiting for {probe} (timeout: {:?}, interval: {:?})",
        waiter.spec().timeout(),
        waiter.spec().poll_interval()
    );

    // A single check never outlives the interval it would otherwise sleep.
    let budget = waiter.spec().poll_interval();
    let outcome = waiter
        .try_wait_for_outcome(|| probe.check(budget))
        .with_context(|| format!("Failed while waiting for {probe}"))?;

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string(&outcome)?);
    }

    if outcome.satisfied {
        info!("Condition met: {probe} after {:?}", outcome.elapsed);
        Ok(EXIT_SATISFIED)
    } else {
        info!("Timed out waiting for {probe} after {:?}", outcome.elapsed);
        Ok(EXIT_TIMED_OUT)
    }
}

fn main() {
    let matches = cli().get_matches();

    let code = match run(&matches) {
        Ok(code) => code,
        Err(e) => {
            // Logging may not be initialized yet if config loading failed.
            if log::max_level() == log::LevelFilter::Off {
                eprintln!("condwait: {e:#}");
            } else {
                error!("{e:#}");
            }
            EXIT_ERROR
        }
    };

    process::exit(code);
}
