//! Line commands read from stdin, mapped onto table messages.

use std::str::FromStr;

use crawldeck_core::{Command, CrawlStatus, JobId, Msg, SortField, StatusFilter};
use thiserror::Error;

pub(crate) const HELP: &str = "\
commands:
  add <url>                 submit a URL for analysis
  search [text]             filter by URL or title (empty clears)
  filter <all|queued|running|completed|error>
  sort <url|title|status|crawled|links>   click a column header
  select <id>|all           toggle a row, or the header checkbox
  clear                     clear the selection
  run <id>                  the row's status-dependent action
  delete <id>               delete one job
  bulk <start|stop|delete|rerun>   apply to the selection
  detail <id>               fetch one job from the service
  show                      print the table
  logout                    drop the credential
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Input {
    Msgs(Vec<Msg>),
    Detail(JobId),
    Show,
    Help,
    Logout,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum InputError {
    #[error("unknown command `{0}`; try `help`")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("`{value}` is not a valid {what}")]
    Invalid { what: &'static str, value: String },
}

pub(crate) fn parse(line: &str) -> Result<Input, InputError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word.to_ascii_lowercase().as_str() {
        "" | "show" => Input::Show,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        "logout" => Input::Logout,
        "add" => Input::Msgs(vec![Msg::InputChanged(rest.to_string()), Msg::UrlSubmitted]),
        "search" => Input::Msgs(vec![Msg::SearchChanged(rest.to_string())]),
        "filter" => Input::Msgs(vec![Msg::StatusFilterChanged(parse_filter(rest)?)]),
        "sort" => Input::Msgs(vec![Msg::SortClicked(parse_sort(rest)?)]),
        "select" if rest.eq_ignore_ascii_case("all") => Input::Msgs(vec![Msg::SelectAllClicked]),
        "select" => Input::Msgs(vec![Msg::RowToggled(job_id("select", rest)?)]),
        "clear" => Input::Msgs(vec![Msg::SelectionCleared]),
        "run" => Input::Msgs(vec![Msg::RowActionClicked(job_id("run", rest)?)]),
        "delete" => Input::Msgs(vec![Msg::DeleteClicked(job_id("delete", rest)?)]),
        "bulk" => Input::Msgs(vec![Msg::BulkClicked(parse_command(rest)?)]),
        "detail" => Input::Detail(job_id("detail", rest)?),
        other => return Err(InputError::Unknown(other.to_string())),
    };
    Ok(input)
}

fn job_id(command: &'static str, raw: &str) -> Result<JobId, InputError> {
    if raw.is_empty() {
        return Err(InputError::MissingArgument(command));
    }
    Ok(JobId::from(raw))
}

fn parse_filter(raw: &str) -> Result<StatusFilter, InputError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
        return Ok(StatusFilter::All);
    }
    CrawlStatus::from_str(raw)
        .map(StatusFilter::Only)
        .map_err(|_| InputError::Invalid {
            what: "status",
            value: raw.to_string(),
        })
}

fn parse_sort(raw: &str) -> Result<SortField, InputError> {
    let field = match raw.to_ascii_lowercase().as_str() {
        "" => return Err(InputError::MissingArgument("sort")),
        "url" => SortField::Url,
        "title" => SortField::Title,
        "status" => SortField::Status,
        "crawled" | "crawledat" | "date" => SortField::CrawledAt,
        "links" | "totallinks" => SortField::TotalLinks,
        _ => {
            return Err(InputError::Invalid {
                what: "sort column",
                value: raw.to_string(),
            })
        }
    };
    Ok(field)
}

fn parse_command(raw: &str) -> Result<Command, InputError> {
    if raw.is_empty() {
        return Err(InputError::MissingArgument("bulk"));
    }
    Command::ALL
        .into_iter()
        .find(|command| command.label().eq_ignore_ascii_case(raw))
        .ok_or_else(|| InputError::Invalid {
            what: "command",
            value: raw.to_string(),
        })
}
