//! Command grammar for the serial link.
//!
//! Parsing is total: every input maps to exactly one [`Command`], with
//! malformed input folded into [`Command::Unrecognized`]. Fixed-form keywords
//! come from [`catalog`](super::catalog); the one parameterised command,
//! `BUZZ <freqHz> <durationMs>`, is parsed with `winnow`.

use core::fmt;

use winnow::ascii::{Caseless, dec_uint, space0, space1};
use winnow::combinator::{alt, eof, peek, preceded, terminated};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::literal;

use crate::alerts::{AlertLevel, Site};

use super::catalog::{self, BUZZ_KEYWORD};

/// Target of an `LED_STATUS_*` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedTarget {
    Site(Site),
    /// `LED_STATUS_NONE`: every indicator off.
    Off,
}

/// Reason a line was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// `BUZZ` with missing, extra, or non-numeric arguments.
    BuzzSyntax,
    Unknown,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rejection::BuzzSyntax => "BUZZ SYNTAX",
            Rejection::Unknown => "UNKNOWN",
        })
    }
}

/// Parsed serial command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Ping,
    Idle,
    SimpleAlert(Site, AlertLevel),
    Urgent,
    StatusUpdate,
    LedStatus(LedTarget),
    RawBuzz { frequency_hz: u32, duration_ms: u32 },
    Unrecognized(Rejection),
}

impl Command {
    /// Site addressed by the command, used for destination gating.
    pub const fn site(&self) -> Option<Site> {
        match self {
            Command::SimpleAlert(site, _) | Command::LedStatus(LedTarget::Site(site)) => {
                Some(*site)
            }
            _ => None,
        }
    }
}

/// Parses one line into a [`Command`]. Surrounding whitespace and ASCII case are ignored.
pub fn parse(line: &str) -> Command {
    let line = line.trim();

    if let Some(command) = catalog::lookup(line) {
        return command;
    }

    let mut input = line;
    if buzz_keyword(&mut input).is_err() {
        return Command::Unrecognized(Rejection::Unknown);
    }

    match terminated(buzz_arguments, (space0, eof)).parse(input) {
        Ok((frequency_hz, duration_ms)) => Command::RawBuzz {
            frequency_hz,
            duration_ms,
        },
        Err(_) => Command::Unrecognized(Rejection::BuzzSyntax),
    }
}

/// `BUZZ` as a whole token: followed by whitespace or the end of the line.
fn buzz_keyword(input: &mut &str) -> Result<(), ContextError> {
    terminated(
        literal(Caseless(BUZZ_KEYWORD)),
        peek(alt((space1.void(), eof.void()))),
    )
    .void()
    .parse_next(input)
}

/// Exactly two whitespace-separated unsigned integers.
fn buzz_arguments(input: &mut &str) -> Result<(u32, u32), ContextError> {
    (
        preceded(space1, dec_uint::<_, u32, _>),
        preceded(space1, dec_uint::<_, u32, _>),
    )
        .parse_next(input)
}
