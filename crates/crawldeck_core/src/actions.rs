use std::fmt;

use crate::model::CrawlStatus;

/// A state-changing command the service accepts for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    Start,
    Stop,
    Delete,
    /// Re-trigger analysis of a settled job; the service treats it as a start.
    Rerun,
}

impl Command {
    pub const ALL: [Command; 4] = [Command::Start, Command::Stop, Command::Delete, Command::Rerun];

    pub fn label(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stop => "stop",
            Command::Delete => "delete",
            Command::Rerun => "rerun",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The status-dependent half of a row's controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    Startable,
    Stoppable,
    Rerunnable,
}

impl PrimaryAction {
    pub fn command(self) -> Command {
        match self {
            PrimaryAction::Startable => Command::Start,
            PrimaryAction::Stoppable => Command::Stop,
            PrimaryAction::Rerunnable => Command::Rerun,
        }
    }
}

/// Controls offered on a single row: one primary action, and delete is always available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowActions {
    pub primary: PrimaryAction,
    pub deletable: bool,
}

impl RowActions {
    pub fn for_status(status: CrawlStatus) -> Self {
        let primary = match status {
            CrawlStatus::Queued | CrawlStatus::Error => PrimaryAction::Startable,
            CrawlStatus::Running => PrimaryAction::Stoppable,
            CrawlStatus::Completed => PrimaryAction::Rerunnable,
        };
        Self {
            primary,
            deletable: true,
        }
    }

    pub fn allows(&self, command: Command) -> bool {
        command == self.primary.command() || (command == Command::Delete && self.deletable)
    }
}
