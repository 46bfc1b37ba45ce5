extern crate rusoto_mock;
extern crate serde_urlencoded;
extern crate tempfile;


use rusoto_cloudwatch::CloudWatchClient;
use rusoto_core::DispatchSignedRequest;
use rusoto_core::param::Params;
use rusoto_core::signature::{SignedRequest, SignedRequestPayload};
use rusoto_mock::{MockCredentialsProvider, MockRequestDispatcher};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::NamedTempFile;

const DATAPOINTS: &str = r#"<GetMetricStatisticsResponse xmlns="http://monitoring.amazonaws.com/doc/2010-08-01/">
  <GetMetricStatisticsResult>
    <Datapoints>
      <member>
        <Timestamp>2019-01-07T23:10:00Z</Timestamp>
        <Average>10.5</Average>
        <Unit>Count</Unit>
      </member>
      <member>
        <Timestamp>2019-01-07T23:15:00Z</Timestamp>
        <Average>12.5</Average>
        <Sum>25</Sum>
        <Maximum>14</Maximum>
        <Unit>Count</Unit>
      </member>
    </Datapoints>
    <Label>NetworkPacketsIn</Label>
  </GetMetricStatisticsResult>
  <ResponseMetadata>
    <RequestId>uuid</RequestId>
  </ResponseMetadata>
</GetMetricStatisticsResponse>"#;

const NO_DATAPOINTS: &str = r#"<GetMetricStatisticsResponse xmlns="http://monitoring.amazonaws.com/doc/2010-08-01/">
  <GetMetricStatisticsResult>
    <Datapoints/>
    <Label>NetworkPacketsIn</Label>
  </GetMetricStatisticsResult>
  <ResponseMetadata>
    <RequestId>uuid</RequestId>
  </ResponseMetadata>
</GetMetricStatisticsResponse>"#;

const CATALOGUE: &str = r#"{
  "region": "us-east-1",
  "namespace": "AWS/EC2",
  "metrics": {
    "networkPacketsIn_ws2012_sandbox_asg": {
      "metric_name": "NetworkPacketsIn",
      "dimensions": {"AutoScalingGroupName": "ws2012-sandbox-asg"},
      "unit": "Count"
    },
    "networkPacketsIn_ws2012_sandbox_asg_PerInstance": {
      "metric_name": "NetworkPacketsIn",
      "dimensions": {"AutoScalingGroupName": "ws2012-sandbox-asg"},
      "statistic": "Sum",
      "unit": "Count"
    },
    "networkPacketsOut_ws2012_sandbox_asg": {
      "metric_name": "NetworkPacketsOut",
      "dimensions": {"AutoScalingGroupName": "ws2012-sandbox-asg"},
      "unit": "Count"
    },
    "networkPacketsOut_ws2012_sandbox_asg_PerInstance": {
      "namespace": "Custom/Sandbox",
      "metric_name": "NetworkPacketsOut",
      "dimensions": {"AutoScalingGroupName": "ws2012-sandbox-asg"},
      "statistic": "Maximum"
    }
  }
}"#;

fn client_with_body(status: u16, body: &str) -> CloudWatchClient {
  CloudWatchClient::new_with(
    MockRequestDispatcher::with_status(status).with_body(body),
    MockCredentialsProvider,
    Default::default()
  )
}

/// Answers each request with the next dispatcher in line.
struct SequenceDispatcher {
  replies: Mutex<VecDeque<MockRequestDispatcher>>,
}

impl DispatchSignedRequest for SequenceDispatcher {
  type Future = <MockRequestDispatcher as DispatchSignedRequest>::Future;

  fn dispatch(&self, request: SignedRequest, timeout: Option<Duration>) -> Self::Future {
    let reply = self.replies.lock().unwrap().pop_front().expect("Unexpected extra request");
    reply.dispatch(request, timeout)
  }
}

fn client_with_replies(replies: Vec<MockRequestDispatcher>) -> CloudWatchClient {
  CloudWatchClient::new_with(
    SequenceDispatcher { replies: Mutex::new(replies.into_iter().collect()) },
    MockCredentialsProvider,
    Default::default()
  )
}

fn client_with_checker<F>(body: &str, checker: F) -> CloudWatchClient where F: Fn(Params) + Send + Sync + 'static {
  CloudWatchClient::new_with(
    MockRequestDispatcher::with_status(200).with_body(body).with_request_checker(move |req: &SignedRequest|
      if let Some(SignedRequestPayload::Buffer(ref buffer)) = req.payload {
        let params: Params = serde_urlencoded::from_bytes(buffer).unwrap();
        checker(params);
      } else {
        panic!("Unexpected request.payload: {:?}", req.payload);
      }
    ),
    MockCredentialsProvider,
    Default::default()
  )
}

fn catalogue_file(body: &str) -> NamedTempFile {
  let mut file = NamedTempFile::new().unwrap();
  file.write_all(body.as_bytes()).unwrap();
  file.flush().unwrap();
  file
}

fn argv(args: &[&str]) -> Vec<String> {
  let mut argv = vec!["".to_owned()];
  argv.extend(args.iter().map(|a| a.to_string()));
  argv
}
