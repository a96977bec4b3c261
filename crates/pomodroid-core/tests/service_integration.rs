//! Integration tests for the countdown service, its driver and the display.
//!
//! All tests run on a paused tokio clock, so whole countdowns complete in
//! virtual time.

use std::time::Duration;

use pomodroid_core::notify::NotifierCall;
use pomodroid_core::{
    spawn_service, Display, Event, Listening, MemoryNotifier, NotificationId, StartPolicy,
    TimerError, TimerService, TimerSettings, TimerState, SUBSCRIBER_CAPACITY,
};

fn settings(pomodoro: u64, brk: u64, start_policy: StartPolicy) -> TimerSettings {
    TimerSettings {
        pomodoro_minutes: pomodoro,
        break_minutes: brk,
        start_policy,
    }
}

#[tokio::test(start_paused = true)]
async fn display_follows_ticks_while_visible() {
    let recorder = MemoryNotifier::new();
    let service = TimerService::new(settings(1, 1, StartPolicy::Replace), Box::new(recorder));
    let handle = spawn_service(service);

    let mut display = Display::new();
    display.resume(handle.bus());
    handle.start(TimerState::Pomodoro).await.unwrap();

    let mut rendered = Vec::new();
    while let Some(event) = display.next_event().await {
        if let Event::Tick(_) = event {
            rendered.push(display.text().to_string());
        }
        if event.is_terminal() {
            break;
        }
    }

    assert_eq!(rendered.len(), 60);
    assert_eq!(rendered[0], "Time remaining: 00:59");
    assert_eq!(rendered.last().unwrap(), "Time remaining: 00:00");
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn paused_display_misses_ticks_without_replay() {
    let service = TimerService::new(
        settings(1, 1, StartPolicy::Replace),
        Box::new(MemoryNotifier::new()),
    );
    let handle = spawn_service(service);
    let mut display = Display::new();
    display.resume(handle.bus());
    handle.start(TimerState::Pomodoro).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2_500)).await;
    display.pause(handle.bus());
    assert_eq!(display.listening(), Listening::Unsubscribed);

    tokio::time::sleep(Duration::from_secs(10)).await;
    display.resume(handle.bus());
    assert!(display.pump().is_empty());

    // Next live tick arrives at the 13 s mark.
    tokio::time::sleep(Duration::from_secs(1)).await;
    let events = display.pump();
    assert_eq!(events.len(), 1);
    assert_eq!(display.text(), "Time remaining: 00:47");

    display.pause(handle.bus());
    let service = handle.shutdown().await.unwrap();
    assert_eq!(service.state(), TimerState::Ready);
}

#[tokio::test(start_paused = true)]
async fn unsubscribing_before_completion_is_harmless() {
    let recorder = MemoryNotifier::new();
    let service = TimerService::new(settings(1, 1, StartPolicy::Replace), Box::new(recorder.clone()));
    let handle = spawn_service(service);
    let mut display = Display::new();
    display.resume(handle.bus());
    handle.start(TimerState::Pomodoro).await.unwrap();
    display.pause(handle.bus());

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(handle.snapshot().await.unwrap().state, TimerState::Finished);
    assert_eq!(recorder.post_count(NotificationId::Finished), 1);
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reject_policy_guards_second_start() {
    let service = TimerService::new(
        settings(1, 1, StartPolicy::Reject),
        Box::new(MemoryNotifier::new()),
    );
    let handle = spawn_service(service);
    handle.start(TimerState::Pomodoro).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let err = handle.start(TimerState::Break).await.unwrap_err();
    assert!(matches!(
        err,
        TimerError::AlreadyRunning {
            state: TimerState::Pomodoro,
            ..
        }
    ));
    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn replace_policy_restarts_with_new_length() {
    let recorder = MemoryNotifier::new();
    let service = TimerService::new(settings(25, 5, StartPolicy::Replace), Box::new(recorder.clone()));
    let handle = spawn_service(service);
    let mut sub = handle.subscribe();

    handle.start(TimerState::Pomodoro).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    handle.start(TimerState::Break).await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, TimerState::Break);
    assert_eq!(snapshot.remaining_ms, 5 * 60_000);

    let kinds: Vec<&'static str> = sub
        .drain()
        .iter()
        .map(|e| match e {
            Event::TimerStarted { .. } => "started",
            Event::Tick(_) => "tick",
            Event::TimerStopped { .. } => "stopped",
            Event::TimerFinished { .. } => "finished",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["started", "tick", "tick", "tick", "stopped", "started"]
    );

    // Ongoing slot was cleared once for the replaced run and reposted.
    let calls = recorder.calls();
    assert!(calls.contains(&NotifierCall::Cancel(NotificationId::Ongoing)));
    assert!(recorder.visible(NotificationId::Ongoing).is_some());
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_without_start_leaves_no_subscribers() {
    let handle = spawn_service(TimerService::new(
        TimerSettings::default(),
        Box::new(MemoryNotifier::new()),
    ));
    let bus = handle.bus().clone();
    handle.shutdown().await.unwrap();
    assert_eq!(bus.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn stalled_subscriber_does_not_hold_back_a_run() {
    let service = TimerService::new(
        settings(2, 1, StartPolicy::Replace),
        Box::new(MemoryNotifier::new()),
    );
    let handle = spawn_service(service);
    let mut stalled = handle.subscribe();
    let mut display = Display::new();
    display.resume(handle.bus());
    handle.start(TimerState::Pomodoro).await.unwrap();

    let mut ticks = 0;
    while let Some(event) = display.next_event().await {
        if event.as_tick().is_some() {
            ticks += 1;
        }
        if event.is_terminal() {
            break;
        }
    }
    assert_eq!(ticks, 120);
    assert_eq!(handle.bus().subscriber_count(), 2);

    let held = stalled.drain();
    assert_eq!(held.len(), SUBSCRIBER_CAPACITY);
    assert!(matches!(held[0], Event::TimerStarted { .. }));

    display.pause(handle.bus());
    handle.shutdown().await.unwrap();
}
