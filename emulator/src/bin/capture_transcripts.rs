use std::path::Path;
use std::time::Duration;

use alert_core::actuator::ToneMode;
use alert_core::config::{ControllerConfig, ExecutionModel, FeatureFlags};
use anyhow::Result;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use session::{Session, SessionVisitor, TRANSCRIPT_DIR, TracedRunner, TranscriptLogger, with_session};

const SETTLE_INTERVAL: Duration = Duration::from_millis(2);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Scenario {
    Startup,
    OriginAlerts,
    Preemption,
    OriginOnly,
    Diagnostics,
}

impl Scenario {
    const ALL: [Scenario; 5] = [
        Scenario::Startup,
        Scenario::OriginAlerts,
        Scenario::Preemption,
        Scenario::OriginOnly,
        Scenario::Diagnostics,
    ];

    fn file_name(self) -> &'static str {
        match self {
            Scenario::Startup => "startup.log",
            Scenario::OriginAlerts => "origin-alerts.log",
            Scenario::Preemption => "preemption.log",
            Scenario::OriginOnly => "origin-only.log",
            Scenario::Diagnostics => "diagnostics.log",
        }
    }

    fn header(self) -> &'static str {
        match self {
            Scenario::Startup => "Transit alert emulator startup transcript",
            Scenario::OriginAlerts => "Transit alert emulator blocking origin alerts transcript",
            Scenario::Preemption => "Transit alert emulator preemption transcript",
            Scenario::OriginOnly => "Transit alert emulator origin-only transcript",
            Scenario::Diagnostics => "Transit alert emulator diagnostics transcript",
        }
    }

    fn config(self) -> ControllerConfig {
        let config = ControllerConfig::new();
        match self {
            Scenario::Startup => config,
            Scenario::OriginAlerts => config
                .with_model(ExecutionModel::Blocking)
                .with_self_test(false),
            Scenario::Preemption | Scenario::Diagnostics => config.with_self_test(false),
            Scenario::OriginOnly => config
                .with_self_test(false)
                .with_flags(FeatureFlags::new().with_destination_alerts(false)),
        }
    }
}

impl SessionVisitor for Scenario {
    fn visit<R: TracedRunner>(self, session: Session<R>) -> Result<()> {
        let mut session = session.quiet();
        session.start()?;
        session.settle(SETTLE_INTERVAL)?;

        match self {
            Scenario::Startup => {}
            Scenario::OriginAlerts => {
                session.feed(b"ORIGIN_NEARBY\r\n")?;
                session.feed(b"STATUS_UPDATE\r\n")?;
                session.feed(b"IDLE\r\n")?;
            }
            Scenario::Preemption => {
                session.feed(b"ORIGIN_STOP\r\n")?;
                wait(&mut session, Duration::from_millis(700))?;
                session.note("urgent request arrives mid-alert")?;
                session.feed(b"URGENT\r\n")?;
                session.settle(SETTLE_INTERVAL)?;
                session.feed(b"LED_STATUS_ORIGIN\r\n")?;
                wait(&mut session, Duration::from_millis(300))?;
                session.feed(b"LED_STATUS_NONE\r\n")?;
            }
            Scenario::OriginOnly => {
                session.feed(b"DEST_APPROACH\r\n")?;
                session.feed(b"LED_STATUS_DEST\r\n")?;
                session.feed(b"ORIGIN_APPROACH\r\n")?;
                wait(&mut session, Duration::from_millis(400))?;
                session.feed(b"IDLE\r\n")?;
            }
            Scenario::Diagnostics => {
                session.feed(b"ping\r\n")?;
                session.feed(b"BUZZ 440 250\r\n")?;
                session.settle(SETTLE_INTERVAL)?;
                session.feed(b"BUZZ 440\r\n")?;
                session.feed(b"BUZZ 440 0\r\n")?;
                session.feed(b"TONE 440\r\n")?;
                session.feed(b"PI\x07NG\r\n")?;
            }
        }

        session.settle(SETTLE_INTERVAL)?;
        if let Some(path) = session.transcript_path() {
            println!("{self:?}: {}", path.display());
        }
        Ok(())
    }
}

/// Polls the session for `span` without sending input.
fn wait<R: TracedRunner>(session: &mut Session<R>, span: Duration) -> Result<()> {
    let deadline = std::time::Instant::now() + span;
    while std::time::Instant::now() < deadline {
        session.poll()?;
        std::thread::sleep(SETTLE_INTERVAL);
    }
    Ok(())
}

fn main() -> Result<()> {
    let dir = Path::new(TRANSCRIPT_DIR);
    for scenario in Scenario::ALL {
        let transcript = TranscriptLogger::create(&dir.join(scenario.file_name()), scenario.header())?;
        with_session(&scenario.config(), ToneMode::NonBlocking, Some(transcript), scenario)?;
    }
    Ok(())
}
