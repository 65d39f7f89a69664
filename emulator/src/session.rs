use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant as HostInstant};

use alert_core::actuator::{Actuator, ToneMode};
use alert_core::alerts::LedChannel;
use alert_core::config::{ControllerConfig, ExecutionModel};
use alert_core::controller::{Controller, LINE_ENDING};
use alert_core::sequencer::{AlertRunner, BlockingRunner, IncrementalRunner, SequencerState};
use alert_core::telemetry::{ActuatorTrace, EventId, TracingActuator};
use alert_core::time::TimeSource;
use anyhow::{Context, Result};
use embedded_hal::delay::DelayNs;
use log::{debug, trace};

/// Events retained between two transcript flushes; a full closest-level
/// alert records roughly a hundred.
pub const HOST_TRACE_CAPACITY: usize = 1024;

/// Default directory for transcripts written by `capture_transcripts`.
pub const TRANSCRIPT_DIR: &str = "transcripts";

pub type HostTraced = TracingActuator<HostActuator, HostClock, HOST_TRACE_CAPACITY>;
pub type HostTrace = ActuatorTrace<Duration, HOST_TRACE_CAPACITY>;
pub type HostBlockingRunner = BlockingRunner<HostTraced, StdDelay>;
pub type HostIncrementalRunner = IncrementalRunner<HostTraced, HostClock>;

/// Monotonic host clock measured from emulator start.
#[derive(Clone, Copy, Debug)]
pub struct HostClock {
    origin: HostInstant,
}

impl HostClock {
    pub fn new() -> Self {
        Self {
            origin: HostInstant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for HostClock {
    type Instant = Duration;

    fn now(&self) -> Duration {
        self.elapsed()
    }
}

/// Delay backed by `thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Simulated board: outputs only exist as log lines and trace records.
///
/// A blocking tone sleeps for its duration the way a blocking buzzer
/// primitive would stall the MCU.
#[derive(Debug)]
pub struct HostActuator {
    mode: ToneMode,
    delay: StdDelay,
}

impl HostActuator {
    pub fn new(mode: ToneMode) -> Self {
        Self {
            mode,
            delay: StdDelay,
        }
    }
}

impl Actuator for HostActuator {
    fn tone_mode(&self) -> ToneMode {
        self.mode
    }

    fn set_tone(&mut self, frequency_hz: u32, duration_ms: u32) {
        trace!("buzzer {frequency_hz} Hz for {duration_ms} ms");
        if self.mode == ToneMode::Blocking {
            self.delay.delay_ms(duration_ms);
        }
    }

    fn stop_tone(&mut self) {
        trace!("buzzer off");
    }

    fn set_led(&mut self, channel: LedChannel, on: bool) {
        trace!("led {} {}", channel.label(), if on { "on" } else { "off" });
    }
}

pub fn traced_actuator(mode: ToneMode, clock: HostClock) -> HostTraced {
    TracingActuator::new(HostActuator::new(mode), clock)
}

/// Runners whose actuator keeps a host trace.
pub trait TracedRunner: AlertRunner {
    fn trace(&self) -> &HostTrace;
}

impl TracedRunner for HostBlockingRunner {
    fn trace(&self) -> &HostTrace {
        self.sequencer().actuator().trace()
    }
}

impl TracedRunner for HostIncrementalRunner {
    fn trace(&self) -> &HostTrace {
        self.sequencer().actuator().trace()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TranscriptRole {
    Host,
    Device,
    Output,
    Note,
}

impl TranscriptRole {
    fn prefix(self) -> &'static str {
        match self {
            TranscriptRole::Host => ">>",
            TranscriptRole::Device => "<<",
            TranscriptRole::Output => "##",
            TranscriptRole::Note => "--",
        }
    }
}

/// Timestamped record of serial traffic and actuator events.
pub struct TranscriptLogger {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl TranscriptLogger {
    pub fn create(path: &Path, header: &str) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating transcript directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("creating transcript {}", path.display()))?;
        let mut logger = Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        };
        writeln!(logger.writer, "# {header}")?;
        logger.writer.flush()?;
        Ok(logger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, elapsed: Duration, role: TranscriptRole, text: &str) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>7.3}s] {} {text}",
            elapsed.as_secs_f64(),
            role.prefix()
        )?;
        self.writer.flush()
    }
}

/// `fmt::Write` sink standing in for the UART transmit path.
///
/// Text is forwarded to stdout as it arrives so that an echo written
/// before a blocking alert shows up before the alert plays.
struct SerialOut<'a> {
    echo: bool,
    pending: String,
    lines: &'a mut Vec<String>,
    transcript: Option<&'a mut TranscriptLogger>,
    clock: HostClock,
    error: Option<io::Error>,
}

impl<'a> SerialOut<'a> {
    fn new(
        echo: bool,
        lines: &'a mut Vec<String>,
        transcript: Option<&'a mut TranscriptLogger>,
        clock: HostClock,
    ) -> Self {
        Self {
            echo,
            pending: String::new(),
            lines,
            transcript,
            clock,
            error: None,
        }
    }

    fn emit_complete_lines(&mut self) -> io::Result<()> {
        while let Some(end) = self.pending.find(LINE_ENDING) {
            let line: String = self.pending.drain(..end + LINE_ENDING.len()).collect();
            let line = line.trim_end_matches(LINE_ENDING).to_owned();
            if self.echo {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{line}")?;
                stdout.flush()?;
            }
            if let Some(transcript) = self.transcript.as_deref_mut() {
                transcript.append(self.clock.elapsed(), TranscriptRole::Device, &line)?;
            }
            self.lines.push(line);
        }
        Ok(())
    }

    fn finish(self) -> Result<()> {
        if let Some(err) = self.error {
            return Err(anyhow::Error::new(err).context("writing controller output"));
        }
        Ok(())
    }
}

impl fmt::Write for SerialOut<'_> {
    fn write_str(&mut self, text: &str) -> fmt::Result {
        self.pending.push_str(text);
        self.emit_complete_lines().map_err(|err| {
            self.error = Some(err);
            fmt::Error
        })
    }
}

/// Host-side controller session: a core [`Controller`] plus the transcript
/// plumbing around it.
pub struct Session<R> {
    controller: Controller<R>,
    transcript: Option<TranscriptLogger>,
    clock: HostClock,
    echo: bool,
    next_event: EventId,
}

impl<R> Session<R>
where
    R: TracedRunner,
{
    pub fn new(runner: R, config: &ControllerConfig, clock: HostClock) -> Self {
        Self {
            controller: Controller::new(runner, config),
            transcript: None,
            clock,
            echo: true,
            next_event: 0,
        }
    }

    #[must_use]
    pub fn with_transcript(mut self, transcript: TranscriptLogger) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// Disables forwarding of controller output to stdout.
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn transcript_path(&self) -> Option<&Path> {
        self.transcript.as_ref().map(TranscriptLogger::path)
    }

    pub fn state(&self) -> SequencerState {
        self.controller.state()
    }

    pub fn start(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        let mut out = SerialOut::new(self.echo, &mut lines, self.transcript.as_mut(), self.clock);
        let written = self.controller.start(&mut out);
        out.finish()?;
        written.context("writing startup banner")?;
        self.flush_events()?;
        Ok(lines)
    }

    /// Feeds raw serial bytes and returns the complete lines written back.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.trim_end_matches(['\r', '\n']);
        if !text.trim().is_empty()
            && let Some(transcript) = self.transcript.as_mut()
        {
            transcript.append(self.clock.elapsed(), TranscriptRole::Host, text)?;
        }

        let mut lines = Vec::new();
        let mut out = SerialOut::new(self.echo, &mut lines, self.transcript.as_mut(), self.clock);
        let written = self.controller.feed(bytes, &mut out);
        out.finish()?;
        written.context("writing controller response")?;
        self.flush_events()?;
        Ok(lines)
    }

    pub fn poll(&mut self) -> Result<SequencerState> {
        let state = self.controller.poll();
        self.flush_events()?;
        Ok(state)
    }

    /// Polls every `interval` until no alert is in flight.
    pub fn settle(&mut self, interval: Duration) -> Result<()> {
        while self.poll()?.is_active() {
            thread::sleep(interval);
        }
        Ok(())
    }

    pub fn note(&mut self, text: &str) -> Result<()> {
        if let Some(transcript) = self.transcript.as_mut() {
            transcript.append(self.clock.elapsed(), TranscriptRole::Note, text)?;
        }
        Ok(())
    }

    /// Copies actuator events recorded since the last flush into the log and
    /// transcript.
    fn flush_events(&mut self) -> Result<()> {
        let trace = self.controller.runner().trace();
        let dropped = trace
            .total_recorded()
            .saturating_sub(self.next_event)
            .saturating_sub(u32::try_from(trace.len()).unwrap_or(u32::MAX));
        if dropped > 0 {
            log::warn!("{dropped} actuator events fell out of the trace");
        }

        for record in trace.oldest_first().filter(|record| record.id >= self.next_event) {
            debug!("[+{} ms] {}", record.timestamp.as_millis(), record.event);
            if let Some(transcript) = self.transcript.as_mut() {
                transcript.append(
                    record.timestamp,
                    TranscriptRole::Output,
                    &record.event.to_string(),
                )?;
            }
        }
        self.next_event = trace.total_recorded();
        Ok(())
    }
}

/// Builds a session for `config.model` and hands it to `run`.
///
/// Each execution model has its own runner type, so callers supply a
/// visitor instead of receiving a boxed session.
pub fn with_session<V>(
    config: &ControllerConfig,
    tone: ToneMode,
    transcript: Option<TranscriptLogger>,
    visitor: V,
) -> Result<()>
where
    V: SessionVisitor,
{
    let clock = HostClock::new();
    let actuator = traced_actuator(tone, clock);
    match config.model {
        ExecutionModel::Blocking => {
            let runner = BlockingRunner::new(actuator, config.profile, StdDelay);
            visitor.visit(attach(Session::new(runner, config, clock), transcript))
        }
        ExecutionModel::Incremental => {
            let runner = IncrementalRunner::new(actuator, config.profile, clock);
            visitor.visit(attach(Session::new(runner, config, clock), transcript))
        }
    }
}

fn attach<R: TracedRunner>(session: Session<R>, transcript: Option<TranscriptLogger>) -> Session<R> {
    match transcript {
        Some(transcript) => session.with_transcript(transcript),
        None => session,
    }
}

/// Work to run against a session of either execution model.
pub trait SessionVisitor {
    fn visit<R: TracedRunner>(self, session: Session<R>) -> Result<()>;
}
