pub mod cards;
pub mod config;
pub mod decks;
pub mod scan;
pub mod settings;

use anyhow::Result;

use crate::{cli::Command, AppState};

pub async fn dispatch(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Scan(args) => scan::handle(state, args).await,
        Command::Cards { command } => cards::handle(state, command).await,
        Command::Decks { command } => decks::handle(state, command).await,
        Command::Settings { command } => settings::handle(state, command).await,
        Command::Config { command } => config::handle(state, command),
    }
}

/// Full id, or a prefix that matches exactly one id.
pub(crate) fn resolve_id<'a, I>(wanted: &str, ids: I, what: &str) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut matches = Vec::new();
    for id in ids {
        if id == wanted {
            return Ok(id.to_string());
        }
        if id.starts_with(wanted) {
            matches.push(id);
        }
    }

    match matches.as_slice() {
        [only] => Ok(only.to_string()),
        [] => anyhow::bail!("no {what} matches '{wanted}'"),
        _ => anyhow::bail!("'{wanted}' matches {} {what}s; use more characters", matches.len()),
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_must_be_unique() {
        let ids = ["abc123", "abd456", "xyz"];
        assert_eq!(resolve_id("abc", ids, "card").unwrap(), "abc123");
        assert_eq!(resolve_id("xyz", ids, "card").unwrap(), "xyz");
        assert!(resolve_id("ab", ids, "card").is_err());
        assert!(resolve_id("q", ids, "card").is_err());
    }

    #[test]
    fn exact_match_wins_over_longer_ids() {
        let ids = ["ab", "abc"];
        assert_eq!(resolve_id("ab", ids, "deck").unwrap(), "ab");
    }
}
