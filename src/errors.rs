use failure::Fail;
use std::io;

#[derive(Debug, Fail)]
pub enum DriverError {
  #[fail(display = "usage error: {}", _0)]
  Usage(String),
  #[fail(display = "configuration error: {}", _0)]
  Configuration(String),
  #[fail(display = "backend error: {}", _0)]
  Backend(String),
  #[fail(display = "logging setup failed: {}", _0)]
  Logging(String),
  #[fail(display = "i/o error: {}", _0)]
  Io(#[cause] io::Error),
}

impl DriverError {
  /// Process exit code reported to servo for this failure.
  pub fn exit_code(&self) -> i32 {
    match self {
      DriverError::Usage(_) => 2,
      DriverError::Configuration(_) => 3,
      DriverError::Backend(_) | DriverError::Logging(_) | DriverError::Io(_) => 1,
    }
  }
}

impl From<io::Error> for DriverError {
  fn from(err: io::Error) -> DriverError {
    DriverError::Io(err)
  }
}
