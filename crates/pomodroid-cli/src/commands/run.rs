use clap::Args;
use std::io::Write;

use pomodroid_core::{
    spawn_service, Config, DesktopNotifier, Display, Event, Notifier, NullNotifier, TimerService,
    TimerSettings, TimerState,
};

#[derive(Args)]
pub struct RunArgs {
    /// State to start in: pomodoro or break
    #[arg(long, default_value = "pomodoro")]
    pub state: TimerState,
    /// Override the configured pomodoro length (minutes)
    #[arg(long)]
    pub pomodoro_minutes: Option<u64>,
    /// Override the configured break length (minutes)
    #[arg(long)]
    pub break_minutes: Option<u64>,
    /// Do not show desktop notifications
    #[arg(long)]
    pub no_notify: bool,
    /// Print every event as a JSON line instead of a live display
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(minutes) = args.pomodoro_minutes {
        config.timer.pomodoro_minutes = minutes;
    }
    if let Some(minutes) = args.break_minutes {
        config.timer.break_minutes = minutes;
    }
    let settings = config.timer_settings()?;

    let notifier: Box<dyn Notifier> = if args.no_notify || !config.notifications.enabled {
        Box::new(NullNotifier)
    } else {
        Box::new(DesktopNotifier::new(config.notifications.app_name.clone())?)
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(countdown(args.state, settings, notifier, args.json))
}

async fn countdown(
    state: TimerState,
    settings: TimerSettings,
    notifier: Box<dyn Notifier>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let handle = spawn_service(TimerService::new(settings, notifier));
    let mut display = Display::new();
    display.resume(handle.bus());

    // JSON output gets `TimerStarted` from the display subscription.
    if let Err(e) = handle.start(state).await {
        handle.shutdown().await?;
        return Err(e.into());
    }

    let mut out = std::io::stdout().lock();
    if !json {
        writeln!(out, "{}", state.title())?;
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            event = display.next_event() => {
                let Some(event) = event else { break };
                if json {
                    writeln!(out, "{}", serde_json::to_string(&event)?)?;
                } else {
                    match &event {
                        Event::Tick(_) => {
                            write!(out, "\r{}", display.text())?;
                            out.flush()?;
                        }
                        Event::TimerFinished { state, .. } => {
                            writeln!(out, "\n{}", state.title())?;
                        }
                        Event::TimerStopped { .. } | Event::TimerStarted { .. } => {}
                    }
                }
                if event.is_terminal() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                if !json {
                    writeln!(out)?;
                }
                break;
            }
        }
    }

    display.pause(handle.bus());
    let service = handle.shutdown().await?;
    tracing::debug!(state = %service.state(), "service finished");
    Ok(())
}
