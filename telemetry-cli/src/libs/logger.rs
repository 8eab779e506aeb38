//! To configure the logger.
//!
//! Logs are written to stderr so that the command output on stdout stays parsable.

use std::{env, error::Error as StdError};

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use clap::{Arg, ArgMatches, Command};
use log::{LevelFilter, Record};
use log4rs::{
    self,
    append::console::{ConsoleAppender, Target},
    config::{Appender, Root},
    encode::{Encode, Write},
};
use serde::{Deserialize, Serialize};

/// Logger configuration object.
#[derive(Default, Deserialize)]
pub struct Config {
    /// Log level. Can be `off`, `error`, `warn`, `info`, `debug`.
    ///
    /// Default is `warn`.
    pub level: Option<String>,
    /// Log style. Can be `json`, `log4j`.
    ///
    /// Default is `json`.
    pub style: Option<String>,
}

/// The log4rs encoder for JSON format.
#[derive(Debug)]
struct JsonEncoder {
    proj_name: String,
}

/// The log4rs encoder for log4j format.
#[derive(Debug)]
struct Log4jEncoder;

#[derive(Serialize)]
struct JsonEncoderMsg<'a> {
    ts: String,
    level: String,
    proj: &'a str,
    module: String,
    msg: String,
}

pub const LEVEL_OFF: &'static str = "off";
pub const LEVEL_ERROR: &'static str = "error";
pub const LEVEL_WARN: &'static str = "warn";
pub const LEVEL_INFO: &'static str = "info";
pub const LEVEL_DEBUG: &'static str = "debug";

pub const STYLE_JSON: &'static str = "json";
pub const STYLE_LOG4J: &'static str = "log4j";

pub const DEF_LEVEL: &'static str = LEVEL_WARN;
pub const DEF_STYLE: &'static str = STYLE_JSON;

const LEVELS: [&'static str; 5] = [LEVEL_OFF, LEVEL_ERROR, LEVEL_WARN, LEVEL_INFO, LEVEL_DEBUG];
const STYLES: [&'static str; 2] = [STYLE_JSON, STYLE_LOG4J];

impl Encode for Log4jEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record<'_>) -> Result<()> {
        let module = match get_module_name(record) {
            None => return Ok(()),
            Some(module) => module,
        };
        let str = format!(
            "{} {} [{}] {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            record.level(),
            module,
            record.args().to_string().replace("\n", "\\n")
        );
        w.write_all(str.as_bytes())?;
        Ok(())
    }
}

impl Encode for JsonEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record<'_>) -> Result<()> {
        let module = match get_module_name(record) {
            None => return Ok(()),
            Some(module) => module,
        };
        let msg = JsonEncoderMsg {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: record.level().to_string().to_lowercase(),
            proj: self.proj_name.as_str(),
            module,
            msg: record.args().to_string(),
        };
        let str = serde_json::to_string(&msg)? + "\n";
        w.write_all(str.as_bytes())?;
        Ok(())
    }
}

/// To initialize the logger with configurations.
pub fn init(proj_name: &str, conf: &Config) -> Result<(), Box<dyn StdError>> {
    let conf = apply_default(conf);

    let level = match conf.level.as_deref() {
        Some(LEVEL_OFF) => LevelFilter::Off,
        Some(LEVEL_ERROR) => LevelFilter::Error,
        Some(LEVEL_INFO) => LevelFilter::Info,
        Some(LEVEL_DEBUG) => LevelFilter::Debug,
        _ => LevelFilter::Warn,
    };
    let style = match conf.style.as_deref() {
        Some(STYLE_LOG4J) => STYLE_LOG4J,
        _ => STYLE_JSON,
    };

    let log4j_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(Log4jEncoder))
        .build();
    let json_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(JsonEncoder {
            proj_name: proj_name.to_string(),
        }))
        .build();
    let config = log4rs::Config::builder()
        .appender(Appender::builder().build(STYLE_LOG4J, Box::new(log4j_appender)))
        .appender(Appender::builder().build(STYLE_JSON, Box::new(json_appender)))
        .build(Root::builder().appender(style).build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

/// To register Clap arguments.
pub fn reg_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("log.level")
            .long("log.level")
            .help("log level")
            .num_args(1)
            .value_parser(LEVELS),
    )
    .arg(
        Arg::new("log.style")
            .long("log.style")
            .help("log style")
            .num_args(1)
            .value_parser(STYLES),
    )
}

/// To read input arguments from command-line arguments and environment variables.
///
/// This function will call [`apply_default()`] to fill missing values so you do not need call it
/// again.
pub fn read_args(args: &ArgMatches) -> Config {
    let level = match args.get_one::<String>("log.level") {
        None => env::var("LOG_LEVEL").ok(),
        Some(v) => Some(v.clone()),
    };
    let style = match args.get_one::<String>("log.style") {
        None => env::var("LOG_STYLE").ok(),
        Some(v) => Some(v.clone()),
    };
    apply_default(&Config { level, style })
}

/// Fill missing or invalid configuration with default values.
pub fn apply_default(config: &Config) -> Config {
    Config {
        level: match config.level.as_deref() {
            Some(v) if LEVELS.contains(&v) => Some(v.to_string()),
            _ => Some(DEF_LEVEL.to_string()),
        },
        style: match config.style.as_deref() {
            Some(v) if STYLES.contains(&v) => Some(v.to_string()),
            _ => Some(DEF_STYLE.to_string()),
        },
    }
}

/// To skip dependency logs and get `file:line` (or the module name) for printing logs.
fn get_module_name(record: &Record<'_>) -> Option<String> {
    match record.file() {
        None => record.module_path().map(|x| x.to_string()),
        Some(file) => match file.contains("/.cargo/") {
            true => None,
            false => match record.line() {
                None => Some(file.to_string()),
                Some(line) => Some(format!("{}:{}", file, line)),
            },
        },
    }
}
