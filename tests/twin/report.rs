use super::mock::{MockCloud, take_calls};
use libtwin::twin::reported::format_reported_state;
use libtwin::twin::{
    DEVICE_TWIN_REPORT_LEN, DeviceTwinBinding, DeviceTwinSet, Error, MAX_PENDING_REPORTS,
    ReportId, ReportOutcome, ReportTracker, TwinState, TwinType, TwinValue,
};

static TWINS: [DeviceTwinBinding; 4] = [
    DeviceTwinBinding::new("LedBrightness", TwinType::Int).with_handler(super::mock::record),
    DeviceTwinBinding::new("Setpoint", TwinType::Float),
    DeviceTwinBinding::new("Heating", TwinType::Bool),
    DeviceTwinBinding::new("DisplayText", TwinType::String),
];

#[test]
fn test_format_scalars() {
    assert_eq!(
        format_reported_state("temp", &TwinValue::Int(42)).unwrap(),
        r#"{"temp":42}"#
    );
    assert_eq!(
        format_reported_state("temp", &TwinValue::Int(-2147483648)).unwrap(),
        r#"{"temp":-2147483648}"#
    );
    assert_eq!(
        format_reported_state("Setpoint", &TwinValue::Float(0.5)).unwrap(),
        r#"{"Setpoint":0.500000}"#
    );
    assert_eq!(
        format_reported_state("Heating", &TwinValue::Bool(false)).unwrap(),
        r#"{"Heating":false}"#
    );
    assert_eq!(
        format_reported_state("DisplayText", &TwinValue::Str("hi there")).unwrap(),
        r#"{"DisplayText":"hi there"}"#
    );
}

#[test]
fn test_format_strings_are_not_escaped() {
    let report = format_reported_state("DisplayText", &TwinValue::Str(r#"say "hi""#)).unwrap();
    assert_eq!(report, r#"{"DisplayText":"say "hi""}"#);
}

#[test]
fn test_format_overflow() {
    let long = "x".repeat(DEVICE_TWIN_REPORT_LEN);
    assert_eq!(
        format_reported_state("DisplayText", &TwinValue::Str(&long)),
        Err(Error::ReportOverflow)
    );
}

#[test]
fn test_report_state_round_trip() {
    let mut twins = DeviceTwinSet::open(&TWINS);
    let mut cloud = MockCloud::new();

    twins
        .report_state(&mut cloud, "LedBrightness", TwinValue::Int(17))
        .unwrap();
    twins
        .report_state(&mut cloud, "Setpoint", TwinValue::Float(-1.25))
        .unwrap();
    twins
        .report_state(&mut cloud, "DisplayText", TwinValue::Str("ready"))
        .unwrap();

    assert_eq!(twins.value("LedBrightness"), Ok(TwinState::Int(17)));
    assert_eq!(twins.value("Setpoint"), Ok(TwinState::Float(-1.25)));
    assert_eq!(
        cloud.sent,
        vec![
            r#"{"LedBrightness":17}"#,
            r#"{"Setpoint":-1.250000}"#,
            r#"{"DisplayText":"ready"}"#,
        ]
    );
    // Local changes do not call the change handler.
    assert!(take_calls().is_empty());
}

#[test]
fn test_report_state_not_connected() {
    let mut twins = DeviceTwinSet::open(&TWINS);
    let mut cloud = MockCloud::disconnected();

    assert_eq!(
        twins.report_state(&mut cloud, "Heating", TwinValue::Bool(true)),
        Err(Error::NotConnected)
    );
    assert_eq!(twins.value("Heating"), Ok(TwinState::Bool(false)));
    assert_eq!(cloud.connect_checks, 1);
    assert!(cloud.sent.is_empty());
    assert!(twins.reports().is_empty());
}

#[test]
fn test_report_state_after_close() {
    let mut twins = DeviceTwinSet::open(&TWINS);
    let mut cloud = MockCloud::new();
    twins.close();

    assert_eq!(
        twins.report_state(&mut cloud, "Heating", TwinValue::Bool(true)),
        Err(Error::NotOpen)
    );
    assert_eq!(cloud.connect_checks, 0);
    assert!(cloud.sent.is_empty());
}

#[test]
fn test_report_state_send_failure() {
    let mut twins = DeviceTwinSet::open(&TWINS);
    let mut cloud = MockCloud::new();
    cloud.fail_sends = true;

    assert_eq!(
        twins.report_state(&mut cloud, "LedBrightness", TwinValue::Int(3)),
        Err(Error::SendFailed)
    );
    assert!(twins.reports().is_empty());
}

#[test]
fn test_report_state_type_mismatch_publishes_nothing() {
    let mut twins = DeviceTwinSet::open(&TWINS);
    let mut cloud = MockCloud::new();

    assert_eq!(
        twins.report_state(&mut cloud, "Heating", TwinValue::Int(1)),
        Err(Error::TypeMismatch)
    );
    assert_eq!(
        twins.report_state(&mut cloud, "Nope", TwinValue::Int(1)),
        Err(Error::PropertyNotFound)
    );
    assert_eq!(cloud.connect_checks, 0);
    assert!(cloud.sent.is_empty());
}

#[test]
fn test_report_current_value() {
    let mut twins = DeviceTwinSet::open(&TWINS);
    let mut cloud = MockCloud::new();

    twins.set("Setpoint", TwinValue::Float(20.0)).unwrap();
    let id = twins.report(&mut cloud, "Setpoint").unwrap();

    assert_eq!(id, ReportId(1));
    assert_eq!(cloud.sent, vec![r#"{"Setpoint":20.000000}"#]);
    assert_eq!(
        twins.report(&mut cloud, "DisplayText"),
        Err(Error::NoLocalValue)
    );

    twins.close();
    assert_eq!(twins.report(&mut cloud, "Setpoint"), Err(Error::NotOpen));
}

#[test]
fn test_report_completion_outcomes() {
    let mut twins = DeviceTwinSet::open(&TWINS);
    let mut cloud = MockCloud::new();

    let ok = twins
        .report_state(&mut cloud, "Heating", TwinValue::Bool(true))
        .unwrap();
    let bad = twins
        .report_state(&mut cloud, "LedBrightness", TwinValue::Int(9))
        .unwrap();

    assert_eq!(twins.report_outcome(ok), ReportOutcome::Pending);
    assert_eq!(twins.report_completed(ok, 200), ReportOutcome::Accepted(200));
    assert_eq!(twins.report_completed(bad, 400), ReportOutcome::Rejected(400));
    assert_eq!(twins.report_outcome(bad), ReportOutcome::Rejected(400));
    assert_eq!(twins.report_outcome(ReportId(99)), ReportOutcome::Unknown);
}

#[test]
fn test_tracker_evicts_oldest() {
    let mut tracker = ReportTracker::new();
    for id in 0..=MAX_PENDING_REPORTS as u32 {
        tracker.track(ReportId(id));
    }

    assert_eq!(tracker.len(), MAX_PENDING_REPORTS);
    assert_eq!(tracker.outcome(ReportId(0)), ReportOutcome::Unknown);
    assert_eq!(
        tracker.outcome(ReportId(MAX_PENDING_REPORTS as u32)),
        ReportOutcome::Pending
    );
}

#[test]
fn test_tracker_completion_for_untracked_id() {
    let mut tracker = ReportTracker::default();
    assert_eq!(tracker.complete(ReportId(5), 500), ReportOutcome::Rejected(500));
    assert!(tracker.is_empty());
}

#[cfg(feature = "async")]
mod async_tests {
    use super::*;
    use futures::executor::block_on;
    use libtwin::twin::AsyncReportedStateClient;

    struct AsyncCloud {
        connected: bool,
        status: u16,
        sent: Vec<String>,
    }

    impl AsyncReportedStateClient for AsyncCloud {
        type Error = ();

        async fn is_connected(&mut self) -> bool {
            self.connected
        }

        async fn send_reported_state(&mut self, report: &[u8]) -> Result<u16, Self::Error> {
            self.sent.push(String::from_utf8_lossy(report).into_owned());
            Ok(self.status)
        }
    }

    #[test]
    fn test_report_state_async_awaits_status() {
        block_on(async {
            let mut twins = DeviceTwinSet::open(&TWINS);
            let mut cloud = AsyncCloud {
                connected: true,
                status: 200,
                sent: Vec::new(),
            };

            let outcome = twins
                .report_state_async(&mut cloud, "LedBrightness", TwinValue::Int(8))
                .await
                .unwrap();

            assert_eq!(outcome, ReportOutcome::Accepted(200));
            assert_eq!(twins.value("LedBrightness"), Ok(TwinState::Int(8)));
            assert_eq!(cloud.sent, vec![r#"{"LedBrightness":8}"#]);

            cloud.status = 412;
            let outcome = twins
                .report_state_async(&mut cloud, "Heating", TwinValue::Bool(true))
                .await
                .unwrap();
            assert_eq!(outcome, ReportOutcome::Rejected(412));
        });
    }

    #[test]
    fn test_report_state_async_not_connected() {
        block_on(async {
            let mut twins = DeviceTwinSet::open(&TWINS);
            let mut cloud = AsyncCloud {
                connected: false,
                status: 200,
                sent: Vec::new(),
            };

            assert_eq!(
                twins
                    .report_state_async(&mut cloud, "LedBrightness", TwinValue::Int(8))
                    .await,
                Err(Error::NotConnected)
            );
            assert_eq!(twins.value("LedBrightness"), Ok(TwinState::Int(0)));
            assert!(cloud.sent.is_empty());
        });
    }
}
