use crate::cloudwatch::MAX_LOOKBACK_SECS;
use crate::errors::DriverError;
use log::debug;
use serde::Deserialize;
use std::io::Read;

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
pub struct Control {
  #[serde(default)]
  pub delay: u64,
  #[serde(default)]
  pub warmup: u64,
  #[serde(default)]
  pub duration: u64,
}

impl Control {
  /// Seconds to wait before querying; zero unless a measurement duration was asked for.
  pub fn wait_secs(&self) -> u64 {
    if self.duration == 0 {
      0
    } else {
      self.delay.saturating_add(self.warmup).saturating_add(self.duration)
    }
  }

  fn validate(&self) -> Result<(), DriverError> {
    let fields = [("delay", self.delay), ("warmup", self.warmup), ("duration", self.duration)];
    match fields.iter().find(|(_, secs)| *secs > MAX_LOOKBACK_SECS) {
      Some((name, secs)) => Err(DriverError::Configuration(
        format!("control.{} of {}s exceeds {}s", name, secs, MAX_LOOKBACK_SECS))),
      None => Ok(()),
    }
  }
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct MeasureRequest {
  #[serde(default)]
  metrics: Option<Vec<String>>,
  #[serde(default)]
  pub control: Control,
}

impl MeasureRequest {
  pub fn metric_names(&self) -> &[String] {
    self.metrics.as_ref().map(|m| m.as_slice()).unwrap_or(&[])
  }
}

pub fn read_request(input: &mut impl Read) -> Result<MeasureRequest, DriverError> {
  let mut body = String::new();
  input.read_to_string(&mut body)?;
  debug!("Received request {}", body);
  let request: MeasureRequest = serde_json::from_str(&body)
    .map_err(|err| DriverError::Configuration(format!("invalid metrics request on stdin: {}", err)))?;
  request.control.validate()?;
  Ok(request)
}
