//! Keyword table for the fixed-form commands.
//!
//! The parser and the acknowledgement renderer read the same table so a
//! command's spelling and its `OK <TAG>` never drift apart.

use crate::alerts::{AlertLevel, Site};

use super::grammar::{Command, LedTarget};

/// Keyword that introduces a raw tone command.
pub const BUZZ_KEYWORD: &str = "BUZZ";

/// One fixed-form command and the keyword that selects it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub keyword: &'static str,
    pub command: Command,
}

const fn spec(keyword: &'static str, command: Command) -> CommandSpec {
    CommandSpec { keyword, command }
}

/// Every argument-free command accepted on the serial link.
pub const COMMANDS: [CommandSpec; 13] = [
    spec("PING", Command::Ping),
    spec("IDLE", Command::Idle),
    spec(
        "ORIGIN_NEARBY",
        Command::SimpleAlert(Site::Origin, AlertLevel::Far),
    ),
    spec(
        "ORIGIN_APPROACH",
        Command::SimpleAlert(Site::Origin, AlertLevel::Middle),
    ),
    spec(
        "ORIGIN_STOP",
        Command::SimpleAlert(Site::Origin, AlertLevel::Closest),
    ),
    spec(
        "DEST_NEARBY",
        Command::SimpleAlert(Site::Destination, AlertLevel::Far),
    ),
    spec(
        "DEST_APPROACH",
        Command::SimpleAlert(Site::Destination, AlertLevel::Middle),
    ),
    spec(
        "DEST_STOP",
        Command::SimpleAlert(Site::Destination, AlertLevel::Closest),
    ),
    spec("URGENT", Command::Urgent),
    spec("STATUS_UPDATE", Command::StatusUpdate),
    spec(
        "LED_STATUS_ORIGIN",
        Command::LedStatus(LedTarget::Site(Site::Origin)),
    ),
    spec(
        "LED_STATUS_DEST",
        Command::LedStatus(LedTarget::Site(Site::Destination)),
    ),
    spec("LED_STATUS_NONE", Command::LedStatus(LedTarget::Off)),
];

/// Finds the fixed-form command spelled by `word`, ignoring ASCII case.
pub fn lookup(word: &str) -> Option<Command> {
    COMMANDS
        .iter()
        .find(|spec| spec.keyword.eq_ignore_ascii_case(word))
        .map(|spec| spec.command)
}

/// Keyword of the proximity alert for `site` at `level`.
pub fn alert_keyword(site: Site, level: AlertLevel) -> Option<&'static str> {
    let wanted = Command::SimpleAlert(site, level);
    COMMANDS
        .iter()
        .find(|spec| spec.command == wanted)
        .map(|spec| spec.keyword)
}
