//! Acknowledgement lines sent back over the serial link.

use core::fmt;

use crate::alerts::{AlertLevel, Site};

use super::catalog;
use super::grammar::Rejection;

/// Tag carried by an `OK` acknowledgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckTag {
    Idle,
    /// Proximity alert executed; rendered as its command keyword.
    Alert(Site, AlertLevel),
    /// Destination alert dropped because destination alerts are disabled.
    DestIgnored,
    Urgent,
    Status,
    LedOrigin,
    LedDest,
    LedDestIgnored,
    LedNone,
    Buzz,
}

impl AckTag {
    /// Returns `true` when the command was acknowledged without being executed.
    pub const fn is_ignored(self) -> bool {
        matches!(self, AckTag::DestIgnored | AckTag::LedDestIgnored)
    }
}

impl fmt::Display for AckTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            AckTag::Idle => "IDLE",
            AckTag::Alert(site, level) => catalog::alert_keyword(*site, *level).unwrap_or("ALERT"),
            AckTag::DestIgnored => "DEST_IGNORED",
            AckTag::Urgent => "URGENT",
            AckTag::Status => "STATUS",
            AckTag::LedOrigin => "LED_ORIGIN",
            AckTag::LedDest => "LED_DEST",
            AckTag::LedDestIgnored => "LED_DEST_IGNORED",
            AckTag::LedNone => "LED_NONE",
            AckTag::Buzz => "BUZZ",
        };
        f.write_str(tag)
    }
}

/// The single line emitted for every dispatched command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    Pong,
    Ok(AckTag),
    Err(Rejection),
}

impl Response {
    pub const fn is_error(self) -> bool {
        matches!(self, Response::Err(_))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Pong => f.write_str("PONG"),
            Response::Ok(tag) => write!(f, "OK {tag}"),
            Response::Err(reason) => write!(f, "ERR {reason}"),
        }
    }
}
