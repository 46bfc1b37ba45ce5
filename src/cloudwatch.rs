use crate::catalogue::{MetricQuery, Statistic};
use crate::errors::DriverError;
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use rusoto_cloudwatch::{CloudWatch, Datapoint, Dimension, GetMetricStatisticsError, GetMetricStatisticsInput};
use rusoto_core::RusotoError;
use serde::Serialize;
use std::cmp::max;
use std::thread::sleep;
use std::time::Duration as StdDuration;

const MAX_ATTEMPTS: usize = 3;
const RETRY_DELAY_MS: u64 = 200;

/// CloudWatch keeps datapoints for 455 days; no window or wait may exceed that.
pub const MAX_LOOKBACK_SECS: u64 = 455 * 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Measurement {
  pub value: f64,
  pub unit: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl Window {
  pub fn ending_at(end: DateTime<Utc>, length: StdDuration) -> Result<Window, DriverError> {
    let too_long = || DriverError::Configuration(
      format!("window of {}s exceeds the {}s CloudWatch retention", length.as_secs(), MAX_LOOKBACK_SECS));
    if length.as_secs() > MAX_LOOKBACK_SECS {
      return Err(too_long());
    }
    let start = Duration::from_std(length).ok()
      .and_then(|span| end.checked_sub_signed(span))
      .ok_or_else(too_long)?;
    Ok(Window {
      start: start,
      end: end,
    })
  }

  /// Window length rounded up to whole minutes, as CloudWatch requires.
  pub fn period(&self) -> i64 {
    let secs = (self.end - self.start).num_seconds();
    max(60, (secs + 59) / 60 * 60)
  }
}

fn timestamp(time: &DateTime<Utc>) -> String {
  format!("{}", time.format("%FT%T%.3f%:z"))
}

pub fn statistic_value(statistic: Statistic, datapoint: &Datapoint) -> Option<f64> {
  match statistic {
    Statistic::Average => datapoint.average,
    Statistic::Sum => datapoint.sum,
    Statistic::Minimum => datapoint.minimum,
    Statistic::Maximum => datapoint.maximum,
    Statistic::SampleCount => datapoint.sample_count,
  }
}

fn datapoint_time(datapoint: &Datapoint) -> Option<DateTime<Utc>> {
  datapoint.timestamp.as_ref()
    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    .map(|t| t.with_timezone(&Utc))
}

pub fn latest_datapoint(datapoints: Vec<Datapoint>) -> Option<Datapoint> {
  datapoints.into_iter().max_by_key(|d| datapoint_time(d))
}

pub fn statistics_input(query: &MetricQuery, window: &Window) -> GetMetricStatisticsInput {
  GetMetricStatisticsInput {
    dimensions: Some(query.dimensions.iter().map(|(name, value)|
      Dimension {
        name: name.clone(),
        value: value.clone(),
      }
    ).collect()),
    end_time: timestamp(&window.end),
    metric_name: query.metric_name.clone(),
    namespace: query.namespace.clone(),
    period: window.period(),
    start_time: timestamp(&window.start),
    statistics: Some(vec![query.statistic.as_str().to_owned()]),
    unit: query.unit.clone(),
    ..Default::default()
  }
}

/// Fetches the most recent value of one metric; `None` when CloudWatch has no datapoints in the window.
pub fn fetch_measurement(client: &impl CloudWatch, query: &MetricQuery, window: &Window) -> Result<Option<Measurement>, DriverError> {
  let mut attempt = 1;
  loop {
    match client.get_metric_statistics(statistics_input(query, window)).sync() {
      Ok(output) => {
        debug!("Received {:?} for {}", output, query.name);
        let datapoint = match latest_datapoint(output.datapoints.unwrap_or_default()) {
          Some(d) => d,
          None => return Ok(None),
        };
        return match statistic_value(query.statistic, &datapoint) {
          Some(value) => Ok(Some(Measurement {
            value: value,
            unit: datapoint.unit.clone().or_else(|| query.unit.clone()),
          })),
          None => {
            warn!("Latest datapoint for {} carries no {} statistic", query.name, query.statistic.as_str());
            Ok(None)
          },
        };
      },
      Err(err) => match classify_cloudwatch_error(err) {
        Action::Retry(cause) if attempt < MAX_ATTEMPTS => {
          warn!("Retrying {} after error {}", query.name, cause);
          attempt += 1;
          sleep(StdDuration::from_millis(RETRY_DELAY_MS));
        },
        Action::Retry(cause) => return Err(DriverError::Backend(
          format!("{} failed after {} attempts: {}", query.name, attempt, cause))),
        Action::Fail(err) => return Err(err),
      }
    }
  }
}

pub enum Action {
  Retry(String),
  Fail(DriverError),
}

pub fn classify_cloudwatch_error(error: RusotoError<GetMetricStatisticsError>) -> Action {
  match error {
    RusotoError::HttpDispatch(err) => Action::Retry(format!("{:?}", err)),
    RusotoError::Service(GetMetricStatisticsError::InternalServiceFault(message)) => Action::Retry(message),
    RusotoError::Unknown(response) => Action::Retry(String::from_utf8_lossy(&response.body).into_owned()),
    err => Action::Fail(DriverError::Backend(format!("{}", err))),
  }
}
