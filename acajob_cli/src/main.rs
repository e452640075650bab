#[macro_use] extern crate clap;
#[macro_use] extern crate log;

use acajob::*;
use clap::{App, AppSettings, Arg, ArgMatches};
use std::process;

fn print_error_debug(e: &Error) {
    // unwind the error chain
    for e in e.iter().skip(1) {
        warn!("caused by: {}", e);
    }
}

#[tokio::main]
async fn main() {
    let app = App::new("acajob")
        .version(crate_version!())
        .setting(AppSettings::ColoredHelp)
        .setting(AppSettings::DeriveDisplayOrder)
        .about("Run a container apps job as a pipeline step")
        .after_help("Job inputs are read from INPUT_* environment variables (e.g. INPUT_IMAGE)")
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .help("Increase verbosity"))
        .arg(Arg::with_name("debug")
            .short("d")
            .long("debug")
            .help("Adds line numbers to log statements"))
        .arg(Arg::with_name("dry-run")
            .long("dry-run")
            .help("Print the job document without calling azure"));

    let args = app.get_matches();
    // always show INFO messages (+1)
    loggerv::Logger::new()
        .verbosity(args.occurrences_of("verbose") + 1)
        .module_path(true)
        .line_numbers(args.is_present("debug"))
        .init()
        .unwrap();

    match run_step(&args).await {
        Ok(outcome) => info!("Done: {}", outcome),
        Err(e) => {
            error!("acajob error: {}", e);
            print_error_debug(&e);
            process::exit(1);
        }
    }
}

async fn run_step(args: &ArgMatches<'_>) -> Result<Outcome> {
    let mut conf = Config::from_env()?;
    if args.is_present("dry-run") {
        conf.inputs.spec.mode.dryRun = true;
    }
    let mut outputs = Outputs::new(conf.output_file.clone());
    run::run(&conf, &mut outputs).await
}
