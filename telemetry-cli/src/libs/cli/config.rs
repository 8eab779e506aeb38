//! Program configurations.

use std::env;

use clap::{Arg, ArgMatches, Command};
use validators::prelude::*;

use super::Config;

#[derive(Validator)]
#[validator(http_ftp_url(local(Allow)))]
struct HttpFtpURL {
    url: url::Url,
    protocol: validators::models::Protocol,
}

pub const DEF_ENDPOINT: &'static str = "http://localhost:8777";

/// To register Clap arguments.
pub fn reg_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("telemetry-cli.endpoint")
            .long("telemetry-cli.endpoint")
            .help("telemetry API endpoint")
            .num_args(1),
    )
    .arg(
        Arg::new("telemetry-cli.token")
            .long("telemetry-cli.token")
            .help("token for the X-Auth-Token header")
            .num_args(1),
    )
}

/// To read input arguments from command-line arguments and environment variables.
pub fn read_args(args: &ArgMatches) -> Result<Config, String> {
    let endpoint = match args.get_one::<String>("telemetry-cli.endpoint") {
        None => match env::var("TELEMETRYCLI_ENDPOINT") {
            Err(_) => DEF_ENDPOINT.to_string(),
            Ok(v) => v,
        },
        Some(v) => v.clone(),
    };
    if HttpFtpURL::parse_string(endpoint.as_str()).is_err() {
        return Err(format!("invalid `telemetry-cli.endpoint`: {}", endpoint));
    }
    let token = match args.get_one::<String>("telemetry-cli.token") {
        None => match env::var("TELEMETRYCLI_TOKEN") {
            Err(_) => None,
            Ok(v) => match v.len() {
                0 => None,
                _ => Some(v),
            },
        },
        Some(v) => Some(v.clone()),
    };
    Ok(Config { endpoint, token })
}
