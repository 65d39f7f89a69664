mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use alert_core::actuator::ToneMode;
use alert_core::config::{ControllerConfig, ExecutionModel, FeatureFlags};
use anyhow::{Context, Result, bail};
use log::{LevelFilter, info};

use session::{Session, SessionVisitor, TracedRunner, TranscriptLogger, with_session};

/// Interval between polls of an in-flight alert while waiting for input.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

const USAGE: &str = "Usage: alert-emulator [--model <blocking|incremental>] \
[--tone <blocking|non-blocking>] [--no-destination] [--transcript <path>] [--verbose]";

#[derive(Debug)]
struct Options {
    model: ExecutionModel,
    tone: ToneMode,
    destination_alerts: bool,
    transcript: Option<PathBuf>,
    verbose: bool,
}

fn main() -> Result<()> {
    let options = parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });
    init_logging(options.verbose)?;

    let config = ControllerConfig::new()
        .with_model(options.model)
        .with_flags(FeatureFlags::new().with_destination_alerts(options.destination_alerts));
    let transcript = options
        .transcript
        .as_deref()
        .map(|path| TranscriptLogger::create(path, "Transit alert emulator session"))
        .transpose()?;

    with_session(&config, options.tone, transcript, Interactive)
}

/// Installs the stderr logger; `RUST_LOG` overrides the `--verbose` level.
fn init_logging(verbose: bool) -> Result<()> {
    let started_at = Instant::now();
    env_logger::Builder::new()
        .filter_level(log_level(verbose))
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format(move |buf, record| {
            writeln!(
                buf,
                "[+{} ms] {:<5} {}: {}",
                started_at.elapsed().as_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .context("failed to install logger")
}

fn log_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Serial console on stdin/stdout.
struct Interactive;

impl SessionVisitor for Interactive {
    fn visit<R: TracedRunner>(self, mut session: Session<R>) -> Result<()> {
        session.start()?;
        if let Some(path) = session.transcript_path() {
            info!("recording transcript to {}", path.display());
        }

        let input = spawn_reader();
        loop {
            match input.recv_timeout(POLL_INTERVAL) {
                Ok(bytes) => {
                    if should_terminate(&bytes) {
                        break;
                    }
                    session.feed(&bytes)?;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    // Input closed: let a running alert finish before exiting.
                    session.settle(POLL_INTERVAL)?;
                    break;
                }
            }
            session.poll()?;
        }

        info!("session closed");
        Ok(())
    }
}

/// Forwards stdin lines, terminators included, to the controller thread.
fn spawn_reader() -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut reader = stdin.lock();
        loop {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    log::warn!("stdin read failed: {err}");
                    break;
                }
            }
        }
    });
    rx
}

fn should_terminate(input: &[u8]) -> bool {
    let input = input.trim_ascii();
    input.eq_ignore_ascii_case(b"exit") || input.eq_ignore_ascii_case(b"quit")
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<Options> {
    let mut options = Options {
        model: ExecutionModel::default(),
        tone: ToneMode::NonBlocking,
        destination_alerts: true,
        transcript: None,
        verbose: false,
    };

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) => (flag.to_owned(), Some(value.to_owned())),
            None => (arg, None),
        };
        let mut value = |name: &str| {
            inline
                .clone()
                .or_else(|| args.next())
                .with_context(|| format!("Expected value after {name}"))
        };

        match flag.as_str() {
            "--model" => {
                let label = value("--model")?;
                options.model = ExecutionModel::from_label(&label)
                    .with_context(|| format!("Unknown execution model `{label}`"))?;
            }
            "--tone" => options.tone = parse_tone_mode(&value("--tone")?)?,
            "--transcript" => options.transcript = Some(PathBuf::from(value("--transcript")?)),
            "--no-destination" => options.destination_alerts = false,
            "--verbose" | "-v" => options.verbose = true,
            other => bail!("Unknown argument `{other}`"),
        }
    }

    Ok(options)
}

fn parse_tone_mode(label: &str) -> Result<ToneMode> {
    if label.eq_ignore_ascii_case("blocking") {
        Ok(ToneMode::Blocking)
    } else if label.eq_ignore_ascii_case("non-blocking") {
        Ok(ToneMode::NonBlocking)
    } else {
        bail!("Unknown tone mode `{label}`")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options> {
        parse_options(args.iter().map(|arg| (*arg).to_owned()))
    }

    #[test]
    fn defaults_to_incremental_with_destination_alerts() {
        let options = parse(&[]).expect("defaults");
        assert_eq!(options.model, ExecutionModel::Incremental);
        assert_eq!(options.tone, ToneMode::NonBlocking);
        assert!(options.destination_alerts);
        assert!(options.transcript.is_none());
    }

    #[test]
    fn accepts_separate_and_inline_values() {
        let options = parse(&[
            "--model",
            "blocking",
            "--tone=blocking",
            "--no-destination",
            "--transcript",
            "out.log",
        ])
        .expect("valid arguments");
        assert_eq!(options.model, ExecutionModel::Blocking);
        assert_eq!(options.tone, ToneMode::Blocking);
        assert!(!options.destination_alerts);
        assert_eq!(options.transcript, Some(PathBuf::from("out.log")));
    }

    #[test]
    fn rejects_unknown_values() {
        assert!(parse(&["--model", "threaded"]).is_err());
        assert!(parse(&["--tone"]).is_err());
        assert!(parse(&["--loud"]).is_err());
    }

    #[test]
    fn verbose_lowers_the_log_threshold() {
        let options = parse(&["-v"]).expect("verbose flag");
        assert_eq!(log_level(options.verbose), LevelFilter::Debug);
        assert_eq!(log_level(false), LevelFilter::Info);
    }

    #[test]
    fn exit_words_end_the_session() {
        assert!(should_terminate(b"exit\n"));
        assert!(should_terminate(b" QUIT\r\n"));
        assert!(!should_terminate(b"IDLE\n"));
    }
}
