use crate::cloudwatch::MAX_LOOKBACK_SECS;
use crate::errors::DriverError;
use getopts::Options;
use std::path::PathBuf;
use std::time::Duration;

const PROGRAM_NAME: &'static str = "cloudwatch-measure";
const DEFAULT_CATALOGUE: &'static str = "config.json";
const DEFAULT_LOG_LEVEL: usize = 1;

#[derive(Debug, PartialEq)]
pub enum RunMode {
  Info,
  Describe,
  Measure { interval: Duration },
  Help(String),
}

#[derive(Debug, PartialEq)]
pub struct Invocation {
  pub mode: RunMode,
  pub catalogue: PathBuf,
  pub log_level: usize,
}

fn options() -> Options {
  let mut opts = Options::new();
  opts.optflag("", "info", "Print driver capabilities as JSON and exit");
  opts.optflag("", "describe", "Print a description of the driver and its metrics and exit");
  opts.optopt(
    "c",
    "config",
    &format!("JSON file mapping metric names to CloudWatch queries (default {})", DEFAULT_CATALOGUE),
    "PATH");
  opts.optopt(
    "l",
    "log-level",
    "Increase logging verbosity (0 = error, 4 = trace)",
    "NUM");
  opts.optflag("h", "help", "Print this help and exit");
  opts
}

pub fn usage() -> String {
  options().usage(&format!("Usage: {} [options] INTERVAL", PROGRAM_NAME))
}

/// Parses a full argument vector, program name included.
pub fn parse_args(args: &Vec<String>) -> Result<Invocation, DriverError> {
  let matches = options()
    .parse(args.iter().skip(1))
    .map_err(|err| DriverError::Usage(err.to_string()))?;

  if matches.free.len() > 1 {
    return Err(DriverError::Usage(format!("expected one INTERVAL argument, got {:?}", matches.free)));
  }

  let mode = match (matches.opt_present("help"), matches.opt_present("info"), matches.opt_present("describe")) {
    (true, _, _) => RunMode::Help(usage()),
    (false, true, true) => return Err(DriverError::Usage("--info and --describe are mutually exclusive".to_owned())),
    (false, true, false) => RunMode::Info,
    (false, false, true) => RunMode::Describe,
    (false, false, false) => RunMode::Measure { interval: parse_interval(matches.free.first())? },
  };

  let log_level = match matches.opt_str("log-level") {
    Some(level) => level.parse::<usize>()
      .map_err(|_| DriverError::Usage(format!("invalid log level {:?}", level)))?,
    None => DEFAULT_LOG_LEVEL,
  };

  Ok(Invocation {
    mode: mode,
    catalogue: PathBuf::from(matches.opt_str("config").unwrap_or_else(|| DEFAULT_CATALOGUE.to_owned())),
    log_level: log_level,
  })
}

fn parse_interval(arg: Option<&String>) -> Result<Duration, DriverError> {
  let arg = arg.ok_or_else(|| DriverError::Usage("missing INTERVAL argument".to_owned()))?;
  match arg.parse::<u64>() {
    Ok(secs) if secs > 0 && secs <= MAX_LOOKBACK_SECS => Ok(Duration::from_secs(secs)),
    _ => Err(DriverError::Usage(
      format!("INTERVAL must be between 1 and {} seconds, got {:?}", MAX_LOOKBACK_SECS, arg))),
  }
}
