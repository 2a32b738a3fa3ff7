#[macro_use]
extern crate log;

use clap::{App, Arg, ArgMatches};
use std::process;
use vmsim::{logging, sim, ReplacementPolicy, Request, VmConfig, VmError, VmResult};

fn main() {
    let matches = App::new("vmsim")
        .about("Simulates an MMU and a pager resolving its page faults")
        .arg(
            Arg::with_name("pages")
                .value_name("PAGES")
                .help("Number of virtual pages")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("frames")
                .value_name("FRAMES")
                .help("Number of frames in RAM")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("policy")
                .value_name("POLICY")
                .help("Page replacement algorithm: random, nfu or aging")
                .required(true)
                .index(3),
        )
        .arg(
            Arg::with_name("requests")
                .value_name("REQUESTS")
                .help("Page accesses such as R0 W2 R1")
                .required(true)
                .multiple(true)
                .index(4),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .takes_value(true)
                .help("Seed for the disk content and the random algorithm"),
        )
        .arg(
            Arg::with_name("log")
                .long("log")
                .takes_value(true)
                .help("Log level: OFF, ERROR, WARN, INFO, DEBUG or TRACE (overrides LOG)"),
        )
        .get_matches();

    if let Err(err) = logging::init(matches.value_of("log")) {
        eprintln!("{}", err);
        process::exit(1);
    }
    if let Err(err) = run(&matches) {
        error!("{}", err);
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn parse_count(matches: &ArgMatches, name: &str) -> VmResult<usize> {
    let value = matches
        .value_of(name)
        .ok_or_else(|| VmError::InvalidArgument(format!("missing {}", name)))?;
    value.parse().map_err(|_| {
        VmError::InvalidArgument(format!(
            "{} must be a positive number, got `{}`",
            name, value
        ))
    })
}

fn run(matches: &ArgMatches) -> VmResult<()> {
    let pages = parse_count(matches, "pages")?;
    let frames = parse_count(matches, "frames")?;
    let policy: ReplacementPolicy = matches.value_of("policy").unwrap_or_default().parse()?;
    let mut config = VmConfig::new(pages, frames, policy)?;
    if let Some(seed) = matches.value_of("seed") {
        let seed = seed
            .parse()
            .map_err(|_| VmError::InvalidArgument(format!("invalid seed `{}`", seed)))?;
        config = config.with_seed(seed);
    }
    let requests = Request::parse_all(matches.values_of("requests").into_iter().flatten())?;

    let report = sim::run(&config, requests)?;
    println!("The hit ratio is: {:.2}%", report.hit_ratio());
    println!("{} disk accesses in total", report.disk_accesses);
    Ok(())
}
