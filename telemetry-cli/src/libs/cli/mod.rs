use std::{error::Error as StdError, str::FromStr};

use clap::{ArgMatches, Command};
use serde::Deserialize;

use telemetry_sdk::api::{
    http::{Client, ClientOptions},
    meters::OptsKind,
};

pub mod config;
pub mod meter;

/// Application configurations.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Telemetry API endpoint with scheme. For example: `http://localhost:8777`.
    pub endpoint: String,
    /// Token for the `X-Auth-Token` header.
    pub token: Option<String>,
}

/// To register Clap arguments.
pub fn reg_args(cmd: Command) -> Command {
    cmd.subcommand(meter::reg_args(Command::new("meter")))
}

pub async fn run(conf: &Config, args: &ArgMatches) -> Result<Option<()>, Box<dyn StdError>> {
    match args.subcommand() {
        Some(("meter", args)) => meter::run(conf, args).await,
        _ => Ok(None),
    }
}

fn new_client(conf: &Config) -> Client {
    Client::new(ClientOptions {
        endpoint: conf.endpoint.clone(),
        token: conf.token.clone(),
    })
}

fn validate_kind(kind_str: &str) -> Result<OptsKind, String> {
    match OptsKind::from_str(kind_str) {
        Err(e) => Err(e.to_string()),
        Ok(kind) => Ok(kind),
    }
}

fn validate_name(name_str: &str) -> Result<String, String> {
    match name_str {
        "" => Err("should not be empty".to_string()),
        "." | ".." => Err("should not be a relative path".to_string()),
        _ => Ok(name_str.to_string()),
    }
}
