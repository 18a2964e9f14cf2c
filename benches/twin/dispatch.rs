use criterion::{Criterion, Throughput};
use libtwin::twin::{
    DeviceTwinBinding, DeviceTwinSet, ReportId, ReportedStateClient, TwinType, TwinValue,
};
use std::hint::black_box;

static TWINS: [DeviceTwinBinding; 4] = [
    DeviceTwinBinding::new("LedBrightness", TwinType::Int),
    DeviceTwinBinding::new("Setpoint", TwinType::Float),
    DeviceTwinBinding::new("Heating", TwinType::Bool),
    DeviceTwinBinding::new("Thermostat.Mode", TwinType::String),
];

const PATCH: &[u8] = br#"{"LedBrightness":{"value":80},"Heating":{"value":true},"$version":42}"#;

const FULL_DOCUMENT: &[u8] = br#"{
    "desired": {
        "LedBrightness": {"value": 80},
        "Setpoint": {"value": 21.5},
        "Heating": {"value": true},
        "Thermostat": {"Mode": {"value": "eco"}, "Schedule": [1, 2, 3]},
        "$version": 42
    },
    "reported": {
        "LedBrightness": 10,
        "Setpoint": 19.0,
        "$version": 40
    }
}"#;

/// Client that accepts every report without doing I/O.
struct NullCloud {
    next_id: u32,
}

impl ReportedStateClient for NullCloud {
    type Error = ();

    fn is_connected(&mut self) -> bool {
        true
    }

    fn send_reported_state(&mut self, report: &[u8]) -> Result<ReportId, Self::Error> {
        black_box(report);
        self.next_id = self.next_id.wrapping_add(1);
        Ok(ReportId(self.next_id))
    }
}

pub fn bench_dispatch_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_patch");
    group.throughput(Throughput::Bytes(PATCH.len() as u64));
    group.bench_function("dispatch_patch", |b| {
        let mut twins = DeviceTwinSet::open(&TWINS);
        let mut cloud = NullCloud { next_id: 0 };
        b.iter(|| twins.dispatch(black_box(PATCH), &mut cloud))
    });
    group.finish();
}

pub fn bench_dispatch_full_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_full_document");
    group.throughput(Throughput::Bytes(FULL_DOCUMENT.len() as u64));
    group.bench_function("dispatch_full_document", |b| {
        let mut twins = DeviceTwinSet::open(&TWINS);
        let mut cloud = NullCloud { next_id: 0 };
        b.iter(|| twins.dispatch(black_box(FULL_DOCUMENT), &mut cloud))
    });
    group.finish();
}

pub fn bench_report_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_state");
    group.bench_function("report_state", |b| {
        let mut twins = DeviceTwinSet::open(&TWINS);
        let mut cloud = NullCloud { next_id: 0 };
        b.iter(|| {
            twins
                .report_state(&mut cloud, "Setpoint", black_box(TwinValue::Float(21.5)))
                .expect("report accepted")
        })
    });
    group.finish();
}
