//! Water monitor polling against the mock gateway.

use std::rc::Rc;
use std::time::Duration;

use chrono::TimeDelta;
use petfeeder::adapters::clock::ManualClock;
use petfeeder::adapters::memory_store::MemoryStore;
use petfeeder::app::ports::{GatewayError, Reporter, SensorId};
use petfeeder::routine::DispenseRoutine;
use petfeeder::water::{WaterMonitor, WaterMonitorService};
use tokio::task::LocalSet;
use tokio::time::sleep;

use crate::mock_hw::{GatewayCall, MockGateway, RecordingReporter, at};

type Monitor = WaterMonitor<Rc<MockGateway>, Rc<MemoryStore>, Rc<ManualClock>>;

fn setup(weight: f32) -> (Monitor, Rc<MockGateway>, Rc<ManualClock>) {
    let gw = Rc::new(MockGateway::new());
    gw.set_reading(SensorId::WeightB, weight);
    let clock = Rc::new(ManualClock::new(at(2026, 10, 19, 12, 0)));
    let monitor = WaterMonitor::new(
        DispenseRoutine::new(gw.clone(), Duration::from_secs(1)),
        Rc::new(MemoryStore::new()),
        clock.clone(),
    );
    (monitor, gw, clock)
}

#[tokio::test(start_paused = true)]
async fn refill_runs_pump_then_water_sensors() {
    let (m, gw, _) = setup(40.0);
    let reporter = RecordingReporter::new();

    assert!(m.check_and_dispense_if_needed(&reporter).await);
    assert_eq!(
        gw.hardware_calls(),
        [
            GatewayCall::ReadSensor(SensorId::WeightB),
            GatewayCall::ActivatePump,
            GatewayCall::ReadSensor(SensorId::WeightB),
            GatewayCall::ReadSensor(SensorId::DistanceB),
        ]
    );
    assert_eq!(gw.count(&GatewayCall::ActivateMotor), 0);
}

#[tokio::test(start_paused = true)]
async fn disabled_monitor_touches_nothing() {
    let (m, gw, _) = setup(0.0);
    m.set_enabled(false).unwrap();
    let before = m.status();

    for _ in 0..5 {
        assert!(!m.check_and_dispense_if_needed(&RecordingReporter::new()).await);
    }
    assert!(gw.calls.borrow().is_empty());
    assert_eq!(m.status(), before);
}

#[tokio::test(start_paused = true)]
async fn re_enabling_resumes_checks() {
    let (m, gw, _) = setup(10.0);
    m.set_enabled(false).unwrap();
    assert!(!m.check_and_dispense_if_needed(&RecordingReporter::new()).await);
    m.set_enabled(true).unwrap();
    assert!(m.check_and_dispense_if_needed(&RecordingReporter::new()).await);
    assert_eq!(gw.count(&GatewayCall::ActivatePump), 1);
}

#[tokio::test(start_paused = true)]
async fn threshold_boundary_is_strict() {
    let (m, gw, _) = setup(100.0);
    assert!(!m.check_and_dispense_if_needed(&RecordingReporter::new()).await);
    gw.set_reading(SensorId::WeightB, 99.9);
    assert!(m.check_and_dispense_if_needed(&RecordingReporter::new()).await);
    assert_eq!(gw.count(&GatewayCall::ActivatePump), 1);
}

#[tokio::test(start_paused = true)]
async fn pump_failure_records_check_but_not_dispense() {
    let (m, gw, clock) = setup(5.0);
    gw.set_pump(Err(GatewayError::Timeout));
    clock.advance(TimeDelta::minutes(3));

    assert!(!m.check_and_dispense_if_needed(&RecordingReporter::new()).await);
    let s = m.status();
    assert_eq!(s.last_checked, Some(at(2026, 10, 19, 12, 3)));
    assert_eq!(s.last_weight, Some(5.0));
    assert_eq!(s.last_dispense_time, None);
}

#[tokio::test(start_paused = true)]
async fn weight_read_failure_keeps_enabled_and_timestamps() {
    let (m, gw, _) = setup(5.0);
    gw.fail_reading(SensorId::WeightB, GatewayError::EmptyResponse);

    assert!(!m.check_and_dispense_if_needed(&RecordingReporter::new()).await);
    let s = m.status();
    assert!(s.enabled);
    assert_eq!(s.last_checked, Some(at(2026, 10, 19, 12, 0)));
    assert_eq!(s.last_weight, None);
    assert_eq!(gw.count(&GatewayCall::ActivatePump), 0);
}

#[tokio::test(start_paused = true)]
async fn service_checks_immediately_then_every_period() {
    LocalSet::new()
        .run_until(async {
            let (m, gw, _) = setup(500.0);
            let reporter: Rc<dyn Reporter> = Rc::new(RecordingReporter::new());
            let mut svc = WaterMonitorService::new(m, reporter, Duration::from_secs(60));

            assert!(svc.start());
            assert!(!svc.start(), "second start is a no-op");
            sleep(Duration::from_millis(1)).await;
            assert_eq!(gw.count(&GatewayCall::ReadSensor(SensorId::WeightB)), 1);

            sleep(Duration::from_secs(60)).await;
            assert_eq!(gw.count(&GatewayCall::ReadSensor(SensorId::WeightB)), 2);

            assert!(svc.stop());
            assert!(!svc.is_running());
            sleep(Duration::from_secs(300)).await;
            assert_eq!(gw.count(&GatewayCall::ReadSensor(SensorId::WeightB)), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn service_refills_low_plate_in_background() {
    LocalSet::new()
        .run_until(async {
            let (m, gw, _) = setup(20.0);
            let reporter = Rc::new(RecordingReporter::new());
            let mut svc =
                WaterMonitorService::new(m, reporter.clone(), Duration::from_secs(60));

            svc.start();
            sleep(Duration::from_secs(3)).await;
            assert_eq!(gw.count(&GatewayCall::ActivatePump), 1);
            assert_eq!(*reporter.busy_changes.borrow(), [true, false]);
            assert!(svc.monitor().status().last_dispense_time.is_some());
            svc.stop();
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn stopping_mid_refill_still_persists_status() {
    LocalSet::new()
        .run_until(async {
            let (m, gw, _) = setup(10.0);
            let reporter: Rc<dyn Reporter> = Rc::new(RecordingReporter::new());
            let mut svc = WaterMonitorService::new(m, reporter, Duration::from_secs(60));

            svc.start();
            sleep(Duration::from_millis(500)).await;
            assert_eq!(gw.count(&GatewayCall::ActivatePump), 1);
            assert!(svc.stop());

            sleep(Duration::from_secs(10)).await;
            assert_eq!(
                gw.hardware_calls(),
                [
                    GatewayCall::ReadSensor(SensorId::WeightB),
                    GatewayCall::ActivatePump,
                    GatewayCall::ReadSensor(SensorId::WeightB),
                    GatewayCall::ReadSensor(SensorId::DistanceB),
                ]
            );
            let s = svc.monitor().status();
            assert_eq!(s.last_checked, Some(at(2026, 10, 19, 12, 0)));
            assert_eq!(s.last_weight, Some(10.0));
            assert_eq!(s.last_dispense_time, Some(at(2026, 10, 19, 12, 0)));
        })
        .await;
}
