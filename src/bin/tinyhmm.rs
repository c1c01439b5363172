use clap::{value_t, App, Arg};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;
use std::io::{BufWriter, Write};
use tinyhmm::observations;
use tinyhmm::{Model, Sequence};
#[macro_use]
extern crate log;

// Slack allowed when checking that each table row sums to one.
const TOLERANCE: f64 = 1e-6;

fn app() -> App<'static, 'static> {
    App::new("tinyhmm")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Sampling, forward prediction, and Viterbi decoding on a discrete HMM.")
        .setting(clap::AppSettings::ArgRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Debug mode"),
        )
        .arg(
            Arg::with_name("domain")
                .index(1)
                .value_name("DOMAIN")
                .required(true)
                .help("Basename of the tables. Reads [DOMAIN].trans and [DOMAIN].emit."),
        )
        .arg(
            Arg::with_name("generate")
                .long("generate")
                .value_name("N")
                .takes_value(true)
                .help("Sample a sequence of at most N steps."),
        )
        .arg(
            Arg::with_name("output_file")
                .long("output_file")
                .value_name("PATH")
                .takes_value(true)
                .default_value(observations::DEFAULT_OUTPUT)
                .help("Where to write the sampled observations."),
        )
        .arg(
            Arg::with_name("forward")
                .long("forward")
                .value_name("FILE")
                .takes_value(true)
                .help("Predict the final state of each line of observations."),
        )
        .arg(
            Arg::with_name("viterbi")
                .long("viterbi")
                .value_name("FILE")
                .takes_value(true)
                .help("Decode the most probable states of each line of observations."),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .help("Seed. Drawn from the OS if not given."),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .short("t")
                .takes_value(true)
                .default_value("1")
                .help("Number of threads"),
        )
        .arg(
            Arg::with_name("strict")
                .long("strict")
                .help("Abort if a table row does not sum to one."),
        )
}

fn generate(model: &Model, matches: &clap::ArgMatches) -> tinyhmm::Result<()> {
    let len = value_t!(matches, "generate", usize).unwrap_or_else(|e| e.exit());
    let mut rng: Xoshiro256StarStar = match matches.value_of("seed") {
        Some(_) => {
            let seed = value_t!(matches, "seed", u64).unwrap_or_else(|e| e.exit());
            SeedableRng::seed_from_u64(seed)
        }
        None => SeedableRng::from_entropy(),
    };
    let seq = tinyhmm::generate(model, len, &mut rng)?;
    print!("{}", seq);
    let path = matches
        .value_of("output_file")
        .unwrap_or(observations::DEFAULT_OUTPUT);
    let mut wtr = std::fs::File::create(path).map(BufWriter::new)?;
    observations::write_observations(&mut wtr, &seq.outputs, &mut rng)?;
    wtr.flush()?;
    info!("Wrote {} observations to {}", seq.len(), path);
    Ok(())
}

fn forward(model: &Model, file: &str) -> tinyhmm::Result<()> {
    let records = observations::read_observations(file)?;
    debug!("FWD\t{}\t{} lines", file, records.len());
    let predictions = records
        .par_iter()
        .map(|obs| model.forward(obs))
        .collect::<tinyhmm::Result<Vec<_>>>()?;
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    for (state, weight) in predictions {
        writeln!(wtr, "{}\t{}", state, weight)?;
    }
    wtr.flush()?;
    Ok(())
}

fn viterbi(model: &Model, file: &str) -> tinyhmm::Result<()> {
    let records = observations::read_observations(file)?;
    debug!("VIT\t{}\t{} lines", file, records.len());
    let paths = records
        .par_iter()
        .map(|obs| model.viterbi(obs))
        .collect::<tinyhmm::Result<Vec<_>>>()?;
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    for (path, obs) in paths.into_iter().zip(records.iter()) {
        let states = path.into_iter().map(String::from).collect();
        write!(wtr, "{}", Sequence::new(states, obs.clone()))?;
    }
    wtr.flush()?;
    Ok(())
}

fn run(matches: &clap::ArgMatches) -> tinyhmm::Result<()> {
    let domain = matches.value_of("domain").unwrap_or_default();
    let model = tinyhmm::load(domain)?;
    if let Err(why) = model.validate(TOLERANCE) {
        if matches.is_present("strict") {
            return Err(why);
        }
        warn!("{}", why);
    }
    if matches.is_present("generate") {
        generate(&model, matches)?;
    }
    if let Some(file) = matches.value_of("forward") {
        forward(&model, file)?;
    }
    if let Some(file) = matches.value_of("viterbi") {
        viterbi(&model, file)?;
    }
    Ok(())
}

fn main() {
    let matches = app().get_matches();
    let level = match matches.occurrences_of("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    let threads = value_t!(matches, "threads", usize).unwrap_or_else(|e| e.exit());
    if let Err(why) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        debug!("{:?}", why);
    }
    debug!("Start");
    if let Err(why) = run(&matches) {
        error!("{}", why);
        std::process::exit(1);
    }
}
