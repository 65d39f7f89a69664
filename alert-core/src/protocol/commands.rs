//! Command dispatcher.
//!
//! This module glues parsed commands to the alert runner: it applies the
//! destination feature flag, makes at most one runner call per command and
//! produces the single response line. It stays `no_std` friendly so the
//! firmware and emulator crates share the same implementation.

use log::info;

use crate::alerts::{AlertLevel, Site};
use crate::config::FeatureFlags;
use crate::sequencer::{AlertRequest, AlertRunner};

use super::grammar::{self, Command, LedTarget};
use super::response::{AckTag, Response};

/// Dispatches serial commands into the alert runner.
pub struct CommandExecutor<R> {
    runner: R,
    flags: FeatureFlags,
}

impl<R> CommandExecutor<R> {
    /// Creates a new executor around the provided runner.
    pub const fn new(runner: R, flags: FeatureFlags) -> Self {
        Self { runner, flags }
    }

    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    /// Returns an immutable reference to the underlying runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Returns a mutable reference to the underlying runner.
    pub fn runner_mut(&mut self) -> &mut R {
        &mut self.runner
    }

    /// Consumes the executor and yields the inner runner.
    pub fn into_inner(self) -> R {
        self.runner
    }
}

impl<R> CommandExecutor<R>
where
    R: AlertRunner,
{
    /// Parses and executes one command line.
    pub fn execute(&mut self, line: &str) -> Response {
        self.dispatch(grammar::parse(line))
    }

    /// Executes a parsed command. The response is produced only after the
    /// runner call returns.
    pub fn dispatch(&mut self, command: Command) -> Response {
        if command.site() == Some(Site::Destination) && !self.flags.destination_alerts {
            info!("destination alerts disabled; ignoring {:?}", command);
            return Response::Ok(match command {
                Command::LedStatus(_) => AckTag::LedDestIgnored,
                _ => AckTag::DestIgnored,
            });
        }

        match command {
            Command::Ping => Response::Pong,
            Command::Idle => {
                self.runner.silence();
                Response::Ok(AckTag::Idle)
            }
            Command::SimpleAlert(site, level) => {
                self.runner.begin(AlertRequest::Level(level));
                Response::Ok(AckTag::Alert(site, level))
            }
            Command::Urgent => {
                self.runner.begin(AlertRequest::Level(AlertLevel::Urgent));
                Response::Ok(AckTag::Urgent)
            }
            Command::StatusUpdate => {
                self.runner.ping();
                Response::Ok(AckTag::Status)
            }
            Command::LedStatus(LedTarget::Site(site)) => {
                self.runner.begin(AlertRequest::Indicator(site));
                Response::Ok(match site {
                    Site::Origin => AckTag::LedOrigin,
                    Site::Destination => AckTag::LedDest,
                })
            }
            Command::LedStatus(LedTarget::Off) => {
                self.runner.silence();
                Response::Ok(AckTag::LedNone)
            }
            Command::RawBuzz {
                frequency_hz,
                duration_ms,
            } => {
                self.runner.begin(AlertRequest::RawBuzz {
                    frequency_hz,
                    duration_ms,
                });
                Response::Ok(AckTag::Buzz)
            }
            Command::Unrecognized(reason) => Response::Err(reason),
        }
    }
}
