use crate::errors::DriverError;
use log::warn;
use rusoto_core::Region;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub enum Statistic {
  Average,
  Sum,
  Minimum,
  Maximum,
  SampleCount,
}

impl Default for Statistic {
  fn default() -> Statistic {
    Statistic::Average
  }
}

impl Statistic {
  pub fn as_str(&self) -> &'static str {
    match self {
      Statistic::Average => "Average",
      Statistic::Sum => "Sum",
      Statistic::Minimum => "Minimum",
      Statistic::Maximum => "Maximum",
      Statistic::SampleCount => "SampleCount",
    }
  }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct MetricSpec {
  #[serde(default)]
  pub namespace: Option<String>,
  pub metric_name: String,
  #[serde(default)]
  pub dimensions: BTreeMap<String, String>,
  #[serde(default)]
  pub statistic: Statistic,
  #[serde(default)]
  pub unit: Option<String>,
}

/// Maps the metric names servo asks for onto CloudWatch queries.
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Catalogue {
  #[serde(default)]
  pub region: Option<String>,
  #[serde(default)]
  pub namespace: Option<String>,
  #[serde(default)]
  pub metrics: BTreeMap<String, MetricSpec>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetricQuery {
  pub name: String,
  pub namespace: String,
  pub metric_name: String,
  pub dimensions: Vec<(String, String)>,
  pub statistic: Statistic,
  pub unit: Option<String>,
}

impl Catalogue {
  pub fn load(path: &Path) -> Result<Catalogue, DriverError> {
    if !path.exists() {
      warn!("No metric catalogue at {}, no metrics configured", path.display());
      return Ok(Catalogue::default());
    }
    let body = fs::read_to_string(path)
      .map_err(|err| DriverError::Configuration(format!("{}: {}", path.display(), err)))?;
    Catalogue::parse(&body)
      .map_err(|err| DriverError::Configuration(format!("{}: {}", path.display(), err)))
  }

  pub fn parse(body: &str) -> Result<Catalogue, serde_json::Error> {
    serde_json::from_str(body)
  }

  pub fn region(&self) -> Result<Region, DriverError> {
    match self.region {
      Some(ref name) => Region::from_str(name)
        .map_err(|err| DriverError::Configuration(format!("region {:?}: {}", name, err))),
      None => Ok(Region::default()),
    }
  }

  pub fn resolve(&self, name: &str) -> Result<MetricQuery, DriverError> {
    let spec = self.metrics.get(name)
      .ok_or_else(|| DriverError::Configuration(format!("unknown metric {:?}", name)))?;
    let namespace = spec.namespace.as_ref()
      .or(self.namespace.as_ref())
      .ok_or_else(|| DriverError::Configuration(format!("metric {:?} has no namespace", name)))?;
    Ok(MetricQuery {
      name: name.to_owned(),
      namespace: namespace.clone(),
      metric_name: spec.metric_name.clone(),
      dimensions: spec.dimensions.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
      statistic: spec.statistic,
      unit: spec.unit.clone(),
    })
  }
}
