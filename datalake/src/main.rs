use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use common::config::{Overrides, Settings};
use common::logging::{LogFormat, init_tracing};
use std::process;
use tracing::error;

fn cli() -> Command {
    Command::new("datalake-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds the song-play star schema from JSON logs in object storage")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Read song and log data, write the five star schema tables")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Sets a custom config file"),
                )
                .arg(
                    Arg::new("input")
                        .long("input")
                        .value_name("URL")
                        .help("Base location holding song_data/ and log_data/"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_name("URL")
                        .help("Base location the tables are written under"),
                )
                .arg(
                    Arg::new("log-format")
                        .long("log-format")
                        .value_name("FORMAT")
                        .value_parser(["text", "json"])
                        .default_value("text")
                        .help("Log output format"),
                ),
        )
}

async fn run(matches: &ArgMatches) -> anyhow::Result<bool> {
    let overrides = Overrides {
        input_url: matches.get_one::<String>("input").cloned(),
        output_url: matches.get_one::<String>("output").cloned(),
    };
    let config_path = matches.get_one::<String>("config").map(String::as_str);

    let settings =
        Settings::load(config_path, &overrides).context("failed to load pipeline settings")?;
    let report = datalake::run_pipeline(&settings).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report.is_success())
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let result = match matches.subcommand() {
        Some(("run", run_matches)) => {
            let format = run_matches
                .get_one::<String>("log-format")
                .and_then(|value| LogFormat::parse(value))
                .unwrap_or_default();
            init_tracing(format);
            run(run_matches).await
        }
        _ => Err(anyhow::anyhow!("no subcommand specified, use --help")),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            error!("pipeline aborted: {:#}", e);
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
