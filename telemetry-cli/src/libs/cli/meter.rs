use std::error::Error as StdError;

use clap::{Arg, ArgMatches, Command, builder::RangedU64ValueParser};
use log::info;

use telemetry_sdk::api::{
    http::Error,
    meters::{
        self, ListOpts, Meter, MeterStatisticsBodyOpts, MeterStatisticsOpts, OptsKind, Statistics,
    },
};

use super::{Config, new_client, validate_kind, validate_name};

pub fn reg_args(cmd: Command) -> Command {
    cmd.about("Meter queries")
        .subcommand(Command::new("list").about("Get meter list"))
        .subcommand(
            Command::new("stats")
                .about("Get meter statistics")
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .help("Meter name")
                        .num_args(1)
                        .required(true)
                        .value_parser(validate_name),
                )
                .arg(
                    Arg::new("field")
                        .long("field")
                        .help("Query field")
                        .num_args(1),
                )
                .arg(
                    Arg::new("op")
                        .long("op")
                        .help("Query operator")
                        .num_args(1)
                        .value_parser(["lt", "le", "eq", "ne", "ge", "gt"]),
                )
                .arg(
                    Arg::new("value")
                        .long("value")
                        .help("Query value")
                        .num_args(1),
                )
                .arg(
                    Arg::new("groupby")
                        .short('g')
                        .long("groupby")
                        .help("Group by fields")
                        .num_args(1..),
                )
                .arg(
                    Arg::new("period")
                        .short('p')
                        .long("period")
                        .help("Seconds of a period")
                        .num_args(1)
                        .value_parser(RangedU64ValueParser::<u64>::new().range(0..)),
                )
                .arg(
                    Arg::new("kind")
                        .long("kind")
                        .help("Send options as `query` string (default) or JSON `body`")
                        .num_args(1)
                        .value_parser(validate_kind),
                ),
        )
}

pub async fn run(conf: &Config, args: &ArgMatches) -> Result<Option<()>, Box<dyn StdError>> {
    match args.subcommand() {
        Some(("list", _)) => {
            let data = list(conf).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(Some(()))
        }
        Some(("stats", args)) => {
            let data = stats(conf, args).await?;
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(Some(()))
        }
        _ => Ok(None),
    }
}

/// To build statistics options from `stats` arguments.
pub fn stats_opts(args: &ArgMatches) -> MeterStatisticsOpts {
    MeterStatisticsOpts {
        query_field: args.get_one::<String>("field").cloned(),
        query_op: args.get_one::<String>("op").cloned(),
        query_value: args.get_one::<String>("value").cloned(),
        group_by: match args.get_many::<String>("groupby") {
            None => None,
            Some(v) => {
                let values: Vec<String> = v.map(|x| x.clone()).collect();
                Some(values.join(","))
            }
        },
        period: args.get_one::<u64>("period").copied(),
    }
}

/// The options kind of `stats` arguments. Default is [`OptsKind::Query`].
pub fn stats_kind(args: &ArgMatches) -> OptsKind {
    match args.get_one::<OptsKind>("kind") {
        None => OptsKind::default(),
        Some(kind) => *kind,
    }
}

async fn list(config: &Config) -> Result<Vec<Meter>, Error> {
    const FN_NAME: &'static str = "list";

    let client = new_client(config);
    let opts = ListOpts::default();
    let data = meters::list(&client, Some(&opts)).await.extract()?;
    info!("[{}] got {} meters", FN_NAME, data.len());
    Ok(data)
}

async fn stats(config: &Config, args: &ArgMatches) -> Result<Vec<Statistics>, Error> {
    const FN_NAME: &'static str = "stats";

    let client = new_client(config);
    let name = match args.get_one::<String>("name") {
        None => return Err(Error::Url("missing meter name".to_string())),
        Some(name) => name.as_str(),
    };
    let opts = stats_opts(args);
    let result = match stats_kind(args) {
        OptsKind::Query => meters::meter_statistics(&client, name, Some(&opts)).await,
        OptsKind::Body => {
            let opts = MeterStatisticsBodyOpts(opts);
            meters::meter_statistics(&client, name, Some(&opts)).await
        }
    };
    let data = result.extract()?;
    info!("[{}] got {} statistics of {}", FN_NAME, data.len(), name);
    Ok(data)
}
