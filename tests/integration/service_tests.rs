//! `FeederService` end-to-end: manual triggers, polling timers, ledger view.

use std::rc::Rc;
use std::time::Duration;

use chrono::TimeDelta;
use petfeeder::adapters::clock::ManualClock;
use petfeeder::adapters::memory_store::MemoryStore;
use petfeeder::app::ports::{GatewayError, MessageKind, Reporter, SensorId};
use petfeeder::app::service::{FeederService, LevelSnapshot};
use petfeeder::config::FeederConfig;
use petfeeder::routine::{DispenseKind, Stage};
use tokio::task::LocalSet;
use tokio::time::sleep;

use crate::mock_hw::{GatewayCall, MockGateway, RecordingReporter, at, schedule};

type Service = FeederService<Rc<MockGateway>, Rc<MemoryStore>, Rc<ManualClock>>;

struct Rig {
    svc: Service,
    gw: Rc<MockGateway>,
    clock: Rc<ManualClock>,
    background: Rc<RecordingReporter>,
}

fn rig() -> Rig {
    let config = FeederConfig {
        user_id: 7,
        settle_delay_ms: 10,
        schedule_poll_interval_secs: 30,
        water_check_interval_secs: 60,
        ..FeederConfig::default()
    };
    let gw = Rc::new(MockGateway::new());
    let clock = Rc::new(ManualClock::new(at(2026, 10, 19, 8, 0)));
    let background = Rc::new(RecordingReporter::new());
    let svc = FeederService::new(
        config,
        gw.clone(),
        Rc::new(MemoryStore::new()),
        clock.clone(),
        background.clone() as Rc<dyn Reporter>,
    );
    Rig {
        svc,
        gw,
        clock,
        background,
    }
}

#[tokio::test(start_paused = true)]
async fn manual_food_dispense_reports_readings() {
    let r = rig();
    r.gw.set_reading(SensorId::WeightA, 0.0);
    r.gw.set_reading(SensorId::DistanceA, 12.5);
    let reporter = RecordingReporter::new();

    let report = r.svc.dispense_food(&reporter).await.unwrap();
    assert_eq!(report.kind, DispenseKind::Food);
    assert_eq!(report.activation_message, "Motor activado");
    assert_eq!(report.weight_g, 0.0);
    assert_eq!(report.distance_cm, 12.5);

    let messages = reporter.messages.borrow();
    assert_eq!(messages.first().unwrap().0, MessageKind::Info);
    assert_eq!(messages.last().unwrap().0, MessageKind::Success);
}

#[tokio::test(start_paused = true)]
async fn manual_water_dispense_fails_at_distance_read() {
    let r = rig();
    r.gw.fail_reading(SensorId::DistanceB, GatewayError::Timeout);
    let reporter = RecordingReporter::new();

    let failure = r.svc.dispense_water(&reporter).await.unwrap_err();
    assert_eq!(failure.kind, DispenseKind::Water);
    assert_eq!(failure.stage, Stage::ReadDistance);
    assert_eq!(failure.error, GatewayError::Timeout);
    assert_eq!(reporter.last().unwrap().0, MessageKind::Error);
    assert_eq!(*reporter.busy_changes.borrow(), [true, false]);
}

#[tokio::test(start_paused = true)]
async fn empty_pump_message_is_a_failure() {
    let r = rig();
    r.gw.set_pump(Ok("   ".into()));

    let failure = r.svc.dispense_water(&RecordingReporter::new()).await.unwrap_err();
    assert_eq!(failure.stage, Stage::ActivatePump);
    assert_eq!(r.gw.sensor_reads(), 0);
}

#[tokio::test]
async fn read_levels_tolerates_partial_failure() {
    let r = rig();
    r.gw.set_reading(SensorId::WeightA, 320.0);
    r.gw.fail_reading(SensorId::WeightB, GatewayError::Status(502));
    r.gw.set_reading(SensorId::DistanceA, 4.0);
    r.gw.set_reading(SensorId::DistanceB, 9.0);

    assert_eq!(
        r.svc.read_levels().await,
        LevelSnapshot {
            food_weight_g: Some(320.0),
            water_weight_g: None,
            food_distance_cm: Some(4.0),
            water_distance_cm: Some(9.0),
        }
    );
    assert_eq!(r.gw.sensor_reads(), 4);
}

#[tokio::test(start_paused = true)]
async fn poll_uses_configured_user_and_clock() {
    let r = rig();
    r.gw.set_schedules(vec![schedule(4, &["08:30"])]);
    let reporter = RecordingReporter::new();

    assert!(!r.svc.poll_schedules(&reporter).await);
    r.clock.advance(TimeDelta::minutes(31));
    assert!(r.svc.poll_schedules(&reporter).await);
    assert!(!r.svc.poll_schedules(&reporter).await);

    assert_eq!(r.gw.count(&GatewayCall::FetchSchedules(7)), 3);
    assert_eq!(r.svc.executed_today(), ["4_08:30_2026-10-19"]);

    r.svc.clear_ledger().unwrap();
    assert!(r.svc.executed_today().is_empty());
}

#[tokio::test(start_paused = true)]
async fn executed_today_follows_the_clock_date() {
    let r = rig();
    r.gw.set_schedules(vec![schedule(1, &["08:00"])]);
    assert!(r.svc.poll_schedules(&RecordingReporter::new()).await);
    assert_eq!(r.svc.executed_today().len(), 1);

    r.clock.set(at(2026, 10, 20, 7, 0));
    assert!(r.svc.executed_today().is_empty());
}

#[tokio::test(start_paused = true)]
async fn schedule_timer_dispatches_in_background() {
    LocalSet::new()
        .run_until(async {
            let mut r = rig();
            r.gw.set_schedules(vec![schedule(1, &["08:00"])]);

            assert!(r.svc.start_schedule_polling());
            assert!(!r.svc.start_schedule_polling());
            assert!(r.svc.is_schedule_polling());

            // Immediate tick claims the slot; the routine takes two settle waits.
            sleep(Duration::from_millis(50)).await;
            assert_eq!(r.gw.count(&GatewayCall::ActivateMotor), 1);
            assert_eq!(r.background.last().unwrap().0, MessageKind::Success);

            // Further ticks inside the window fetch but do not re-fire.
            r.clock.advance(TimeDelta::minutes(1));
            sleep(Duration::from_secs(30)).await;
            assert_eq!(r.gw.count(&GatewayCall::FetchSchedules(7)), 2);
            assert_eq!(r.gw.count(&GatewayCall::ActivateMotor), 1);

            assert!(r.svc.stop_schedule_polling());
            assert!(!r.svc.is_schedule_polling());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_both_timers() {
    LocalSet::new()
        .run_until(async {
            let mut r = rig();
            r.svc.start_schedule_polling();
            r.svc.start_water_monitor();
            assert!(r.svc.is_water_monitoring());

            sleep(Duration::from_millis(1)).await;
            r.svc.shutdown();
            // The refill already under way is allowed to finish.
            sleep(Duration::from_secs(1)).await;
            assert_eq!(r.gw.count(&GatewayCall::ActivatePump), 1);
            let calls = r.gw.calls.borrow().len();

            sleep(Duration::from_secs(600)).await;
            assert!(!r.svc.is_schedule_polling());
            assert!(!r.svc.is_water_monitoring());
            assert_eq!(r.gw.calls.borrow().len(), calls);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn water_settings_round_trip_through_service() {
    let r = rig();
    r.gw.set_reading(SensorId::WeightB, 150.0);
    let m = r.svc.water_monitor();

    m.set_threshold_str("200").unwrap();
    assert!(r.svc.check_water(&RecordingReporter::new()).await);

    m.set_enabled(false).unwrap();
    assert!(!m.status().enabled);
    assert!(!r.svc.check_water(&RecordingReporter::new()).await);
    assert_eq!(r.gw.count(&GatewayCall::ActivatePump), 1);
}

#[tokio::test(start_paused = true)]
async fn stopping_schedule_poll_mid_dispense_completes_routine() {
    LocalSet::new()
        .run_until(async {
            let mut r = rig();
            r.gw.set_schedules(vec![schedule(1, &["08:00"])]);

            r.svc.start_schedule_polling();
            sleep(Duration::from_millis(5)).await;
            assert_eq!(r.gw.count(&GatewayCall::ActivateMotor), 1);
            r.svc.stop_schedule_polling();

            sleep(Duration::from_secs(120)).await;
            assert_eq!(
                r.gw.hardware_calls(),
                [
                    GatewayCall::ActivateMotor,
                    GatewayCall::ReadSensor(SensorId::WeightA),
                    GatewayCall::ReadSensor(SensorId::DistanceA),
                ]
            );
            assert_eq!(r.background.last().unwrap().0, MessageKind::Success);
            assert_eq!(*r.background.busy_changes.borrow(), [true, false]);
            assert_eq!(r.gw.count(&GatewayCall::FetchSchedules(7)), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn drain_returns_after_dispense_in_progress() {
    LocalSet::new()
        .run_until(async {
            let mut r = rig();
            r.gw.set_schedules(vec![schedule(1, &["08:00"])]);
            r.svc.start_schedule_polling();
            r.svc.start_water_monitor();
            sleep(Duration::from_millis(5)).await;

            r.svc.drain().await;
            assert!(!r.svc.is_schedule_polling());
            assert!(!r.svc.is_water_monitoring());
            assert_eq!(r.gw.count(&GatewayCall::ReadSensor(SensorId::DistanceA)), 1);
            assert_eq!(r.gw.count(&GatewayCall::ReadSensor(SensorId::DistanceB)), 1);
            assert!(r.svc.water_monitor().status().last_dispense_time.is_some());
        })
        .await;
}
