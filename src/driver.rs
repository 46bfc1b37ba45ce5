use crate::catalogue::Catalogue;
use crate::cloudwatch::{self, Window};
use crate::config::{Invocation, RunMode};
use crate::errors::DriverError;
use crate::request::{self, Control};
use chrono::Utc;
use log::{info, warn};
use rusoto_cloudwatch::CloudWatch;
use rusoto_core::Region;
use serde_json::{json, Map, Value};
use std::cmp::min;
use std::io::{self, Read, Write};
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

const PROGRESS_INTERVAL_SECS: u64 = 30;

/// How `run` wants the process to end.
#[derive(Debug, PartialEq)]
pub enum Outcome {
  /// Terminate immediately with this status.
  Exit(i32),
  /// Return from `main` normally.
  Return,
}

#[derive(Debug)]
pub struct Driver {
  cli_desc: String,
  supports_cancel: bool,
  version: String,
  pause: fn(Duration),
}

fn emit(output: &mut impl Write, payload: &Value) -> Result<(), DriverError> {
  writeln!(output, "{}", payload)?;
  output.flush()?;
  Ok(())
}

pub fn report_failure(output: &mut impl Write, err: &DriverError) -> io::Result<()> {
  writeln!(output, "{}", json!({"status": "failed", "reason": err.to_string()}))?;
  output.flush()
}

fn progress_message(control: &Control, elapsed: u64) -> &'static str {
  if elapsed <= control.delay {
    "waiting for delay"
  } else if elapsed <= control.delay.saturating_add(control.warmup) {
    "warming up"
  } else {
    "measuring"
  }
}

impl Driver {
  pub fn new(cli_desc: &str, supports_cancel: bool, version: &str) -> Driver {
    Driver {
      cli_desc: cli_desc.to_owned(),
      supports_cancel: supports_cancel,
      version: version.to_owned(),
      pause: sleep,
    }
  }

  /// Replaces how the driver waits out `control` delays.
  pub fn with_pause(mut self, pause: fn(Duration)) -> Driver {
    self.pause = pause;
    self
  }

  pub fn info(&self) -> Value {
    json!({"has_cancel": self.supports_cancel, "version": self.version})
  }

  /// Dispatches on the invocation mode. `connect` is only called when there is something to measure.
  pub fn run<C, F>(&self, invocation: &Invocation, input: &mut impl Read, output: &mut impl Write, connect: F) -> Result<Outcome, DriverError>
    where C: CloudWatch, F: FnOnce(Region) -> C {
    match invocation.mode {
      RunMode::Help(ref usage) => {
        writeln!(output, "{}\n\n{}", self.cli_desc, usage)?;
        Ok(Outcome::Exit(0))
      },
      RunMode::Info => {
        emit(output, &self.info())?;
        Ok(Outcome::Exit(0))
      },
      RunMode::Describe => {
        emit(output, &self.describe(&invocation.catalogue)?)?;
        Ok(Outcome::Exit(0))
      },
      RunMode::Measure { interval } => {
        let measured = self.measure(interval, &invocation.catalogue, input, output, connect)?;
        info!("Reported {} metrics", measured);
        Ok(Outcome::Return)
      },
    }
  }

  fn describe(&self, catalogue_path: &Path) -> Result<Value, DriverError> {
    let catalogue = Catalogue::load(catalogue_path)?;
    let metrics: Map<String, Value> = catalogue.metrics.iter()
      .map(|(name, spec)| (name.clone(), json!({"unit": spec.unit})))
      .collect();
    Ok(json!({"status": "ok", "description": self.cli_desc, "metrics": metrics}))
  }

  fn wait(&self, control: &Control, output: &mut impl Write) -> Result<(), DriverError> {
    let total = control.wait_secs();
    let mut elapsed = 0;
    while elapsed < total {
      let step = min(PROGRESS_INTERVAL_SECS, total - elapsed);
      (self.pause)(Duration::from_secs(step));
      elapsed += step;
      emit(output, &json!({
        "progress": elapsed.saturating_mul(100) / total,
        "message": progress_message(control, elapsed),
      }))?;
    }
    Ok(())
  }

  fn measure<C, F>(&self, interval: Duration, catalogue_path: &Path, input: &mut impl Read, output: &mut impl Write, connect: F) -> Result<usize, DriverError>
    where C: CloudWatch, F: FnOnce(Region) -> C {
    let request = request::read_request(input)?;
    if request.metric_names().is_empty() {
      info!("Nothing to measure");
      emit(output, &json!({"status": "ok", "metrics": {}, "annotations": {}}))?;
      return Ok(0);
    }

    let catalogue = Catalogue::load(catalogue_path)?;
    let queries = request.metric_names().iter()
      .map(|name| catalogue.resolve(name))
      .collect::<Result<Vec<_>, _>>()?;
    let region = catalogue.region()?;

    self.wait(&request.control, output)?;
    let length = match request.control.duration {
      0 => interval,
      secs => Duration::from_secs(secs),
    };
    let window = Window::ending_at(Utc::now(), length)?;

    let client = connect(region);
    let mut metrics = Map::new();
    for query in queries.iter() {
      match cloudwatch::fetch_measurement(&client, query, &window)? {
        Some(measurement) => {
          metrics.insert(query.name.clone(), json!(measurement));
        },
        None => warn!("No value for {} between {} and {}", query.name, window.start, window.end),
      }
    }

    let measured = metrics.len();
    emit(output, &json!({
      "status": "ok",
      "metrics": metrics,
      "annotations": {
        "window_start": window.start.to_rfc3339(),
        "window_end": window.end.to_rfc3339(),
      },
    }))?;
    Ok(measured)
  }
}
