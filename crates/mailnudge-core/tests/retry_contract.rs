//! Contract Test: Controller-Owned Retry Logic
//!
//! Constraints verified:
//! - The Mailer is called at most `retry_count` times
//! - The first success stops the loop
//! - Waits between attempts grow linearly (2, 4, ... units), none after the last
//! - The final failure is reported unchanged
//! - No event is lost, however many attempts are configured

mod common;

use common::*;
use mailnudge_core::{EngineEvent, FailureKind, RetryController, RetryPolicy};
use mailnudge_core::DeliveryFailure;
use std::time::Duration;
use tokio::sync::mpsc;

fn drain(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn scheduled_delays(events: &[EngineEvent]) -> Vec<Duration> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::RetryScheduled { delay, .. } => Some(*delay),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn always_failing_mailer_is_called_retry_count_times() {
    let mailer = ScriptedMailer::always_failing(FailureKind::Connect);
    let observer = ScriptedMailer::sharing_counters_with(&mailer);

    let settings = ready_settings();
    let policy = RetryPolicy::from_settings(&settings);
    assert_eq!(policy.max_attempts, 3);

    let (controller, mut event_rx) = RetryController::new(Box::new(mailer), policy);

    let started = tokio::time::Instant::now();
    let report = controller.send(&settings, &envelope_for(&settings)).await;
    let elapsed = started.elapsed();

    assert_eq!(observer.send_call_count(), 3);
    assert_eq!(report.attempts, 3);
    assert!(!report.is_success());

    // 2s after the first failure, 4s after the second, nothing after the third
    let events = drain(&mut event_rx);
    assert_eq!(
        scheduled_delays(&events),
        vec![Duration::from_secs(2), Duration::from_secs(4)]
    );
    assert!(
        elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7),
        "expected 6s of backoff, slept {:?}",
        elapsed
    );
    assert_eq!(events.last(), Some(&EngineEvent::GaveUp { attempts: 3 }));
}

#[tokio::test(start_paused = true)]
async fn first_success_short_circuits() {
    let mailer = ScriptedMailer::new(vec![
        Err(DeliveryFailure::new(FailureKind::Timeout, "timed out")),
        Ok(()),
        Err(DeliveryFailure::new(FailureKind::Auth, "never reached")),
    ]);
    let observer = ScriptedMailer::sharing_counters_with(&mailer);

    let settings = ready_settings();
    let (controller, mut event_rx) =
        RetryController::new(Box::new(mailer), RetryPolicy::from_settings(&settings));

    let report = controller.send(&settings, &envelope_for(&settings)).await;

    assert!(report.is_success());
    assert_eq!(report.attempts, 2);
    assert_eq!(observer.send_call_count(), 2);

    let events = drain(&mut event_rx);
    assert_eq!(scheduled_delays(&events), vec![Duration::from_secs(2)]);
    assert_eq!(events.last(), Some(&EngineEvent::Delivered { attempt: 2 }));
}

#[tokio::test(start_paused = true)]
async fn final_failure_is_reported_unchanged() {
    let mailer = ScriptedMailer::new(vec![
        Err(DeliveryFailure::new(FailureKind::Dns, "lookup failed")),
        Err(DeliveryFailure::new(FailureKind::Auth, "535 5.7.8 bad credentials")),
    ]);

    let settings = ready_settings();
    let policy = RetryPolicy {
        max_attempts: 2,
        backoff_unit: Duration::from_secs(1),
    };
    let (controller, _event_rx) = RetryController::new(Box::new(mailer), policy);

    let report = controller.send(&settings, &envelope_for(&settings)).await;

    assert_eq!(
        report.last_failure,
        Some(DeliveryFailure::new(FailureKind::Auth, "535 5.7.8 bad credentials"))
    );
}

#[tokio::test]
async fn zero_retry_count_makes_no_attempt() {
    let mailer = ScriptedMailer::new(vec![Ok(())]);
    let observer = ScriptedMailer::sharing_counters_with(&mailer);

    let settings = ready_settings();
    let policy = RetryPolicy {
        max_attempts: 0,
        backoff_unit: Duration::ZERO,
    };
    let (controller, _event_rx) = RetryController::new(Box::new(mailer), policy);

    let report = controller.send(&settings, &envelope_for(&settings)).await;

    assert_eq!(observer.send_call_count(), 0);
    assert!(!report.is_success());
}

#[tokio::test]
async fn every_event_of_a_long_run_is_kept() {
    let mailer = ScriptedMailer::always_failing(FailureKind::Connect);
    let observer = ScriptedMailer::sharing_counters_with(&mailer);

    let settings = ready_settings();
    let policy = RetryPolicy {
        max_attempts: 25,
        backoff_unit: Duration::ZERO,
    };
    let (controller, mut event_rx) = RetryController::new(Box::new(mailer), policy);

    let report = controller.send(&settings, &envelope_for(&settings)).await;

    assert_eq!(observer.send_call_count(), 25);
    assert_eq!(report.attempts, 25);

    // 25 started + 25 failed + 24 scheduled + 1 gave up
    let events = drain(&mut event_rx);
    assert_eq!(events.len(), 75);
    assert_eq!(events.last(), Some(&EngineEvent::GaveUp { attempts: 25 }));
}
