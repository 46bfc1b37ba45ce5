extern crate chrono;
extern crate failure;
extern crate getopts;
extern crate log;
extern crate rusoto_cloudwatch;
extern crate rusoto_core;
extern crate serde;
extern crate serde_json;
extern crate stderrlog;

use failure::Error;
use log::error;
use rusoto_cloudwatch::CloudWatchClient;
use std::env::args;
use std::io::{self, Write};
use std::process::exit;

pub mod catalogue;
pub mod cloudwatch;
pub mod config;
pub mod driver;
pub mod errors;
pub mod request;
#[cfg(test)] pub mod tests;

const DESC: &'static str = "Measure driver reporting AWS CloudWatch metrics to servo.";
const HAS_CANCEL: bool = false;
const VERSION: &'static str = env!("CARGO_PKG_VERSION");

fn setup_logging(log_level: usize) -> Result<(), errors::DriverError> {
  stderrlog::new()
    .module(module_path!())
    .verbosity(log_level)
    .init()
    .map_err(|err| errors::DriverError::Logging(err.to_string()))
}

fn fail(output: &mut impl Write, err: errors::DriverError) -> ! {
  error!("{}", err);
  if let Err(io_err) = driver::report_failure(output, &err) {
    eprintln!("Could not report failure to servo: {}", io_err);
  }
  exit(err.exit_code())
}

fn main() -> Result<(), Error> {
  let driver = driver::Driver::new(DESC, HAS_CANCEL, VERSION);
  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut output = stdout.lock();

  let invocation = match config::parse_args(&args().collect()) {
    Ok(invocation) => invocation,
    Err(err) => fail(&mut output, err),
  };
  if let Err(err) = setup_logging(invocation.log_level) {
    fail(&mut output, err);
  }

  match driver.run(&invocation, &mut stdin.lock(), &mut output, |region| CloudWatchClient::new(region)) {
    Ok(driver::Outcome::Exit(code)) => exit(code),
    Ok(driver::Outcome::Return) => Ok(()),
    Err(err) => fail(&mut output, err),
  }
}
