//! Serial session that ties framing, dispatch and the alert runner together.
//!
//! The controller is transport-agnostic: callers feed it received bytes and
//! hand it a [`core::fmt::Write`] sink for outbound text. Every non-blank line
//! produces an `RX: <line>` echo followed by exactly one response line.

use core::fmt::{self, Write};

use log::{debug, info};

use crate::config::ControllerConfig;
use crate::protocol::grammar::Rejection;
use crate::protocol::{CommandExecutor, LineAssembler, Response};
use crate::sequencer::{AlertRequest, AlertRunner, SequencerState};

/// Terminator appended to every outbound line.
pub const LINE_ENDING: &str = "\r\n";

/// Token host software waits for before sending commands.
pub const READY_TOKEN: &str = "READY";

/// Serial controller owning the dispatcher and line assembler.
pub struct Controller<R> {
    executor: CommandExecutor<R>,
    assembler: LineAssembler,
    banner: &'static str,
    self_test: bool,
}

impl<R> Controller<R> {
    pub fn new(runner: R, config: &ControllerConfig) -> Self {
        Self {
            executor: CommandExecutor::new(runner, config.flags),
            assembler: LineAssembler::new(),
            banner: config.banner,
            self_test: config.self_test,
        }
    }

    pub fn executor(&self) -> &CommandExecutor<R> {
        &self.executor
    }

    pub fn runner(&self) -> &R {
        self.executor.runner()
    }

    pub fn runner_mut(&mut self) -> &mut R {
        self.executor.runner_mut()
    }

    pub fn into_runner(self) -> R {
        self.executor.into_inner()
    }
}

impl<R> Controller<R>
where
    R: AlertRunner,
{
    /// Silences all outputs, prints the banner and `READY`, then starts the
    /// self-test sweep.
    ///
    /// Under the blocking model the sweep has finished when this returns.
    pub fn start<W: Write + ?Sized>(&mut self, out: &mut W) -> fmt::Result {
        let runner = self.executor.runner_mut();
        runner.silence();
        let model = runner.model();

        write_line(out, format_args!("{}", self.banner))?;
        write_line(
            out,
            format_args!(
                "baud {} | {} alerts | {} model",
                crate::config::BAUD_RATE,
                if self.executor.flags().destination_alerts {
                    "origin+dest"
                } else {
                    "origin-only"
                },
                model.label()
            ),
        )?;
        write_line(out, format_args!("{READY_TOKEN}"))?;
        info!("controller ready ({} model)", model.label());

        if self.self_test {
            debug!("running self-test sweep");
            self.executor.runner_mut().begin(AlertRequest::SelfTest);
        }
        Ok(())
    }

    /// Feeds received bytes, answering every completed line.
    pub fn feed<W: Write + ?Sized>(&mut self, bytes: &[u8], out: &mut W) -> fmt::Result {
        for byte in bytes {
            if let Some(line) = self.assembler.push(*byte) {
                // Echo before dispatch: blocking alerts play before the response.
                write_line(out, format_args!("RX: {}", line.text))?;
                let response = match line.error {
                    Some(error) => {
                        debug!("rejecting framed line: {}", error);
                        Response::Err(Rejection::Unknown)
                    }
                    None => self.executor.execute(line.text),
                };
                write_line(out, format_args!("{response}"))?;
            }
        }
        Ok(())
    }

    /// Advances an in-flight alert; a no-op under the blocking model.
    pub fn poll(&mut self) -> SequencerState {
        self.executor.runner_mut().poll()
    }

    pub fn state(&self) -> SequencerState {
        self.executor.runner().state()
    }
}

fn write_line<W: Write + ?Sized>(out: &mut W, args: fmt::Arguments<'_>) -> fmt::Result {
    out.write_fmt(args)?;
    out.write_str(LINE_ENDING)
}
