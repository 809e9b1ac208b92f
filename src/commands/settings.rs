use anyhow::Result;

use crate::{cli::SettingsCommand, AppState};

pub async fn handle(state: &AppState, command: SettingsCommand) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            let settings = state.store.settings().await;
            let key = state.store.api_key().await;
            println!("API key:       {}", mask_key(&key));
            println!("Auto-scan:     {}", if settings.auto_scan { "on" } else { "off" });
            println!("Scan interval: {} ms", settings.scan_interval);
        }
        SettingsCommand::SetKey { key } => {
            state.store.set_api_key(key.trim()).await?;
            println!("API key saved.");
        }
        SettingsCommand::ToggleAuto => {
            let enabled = state.store.toggle_auto_scan().await?;
            println!("Auto-scan {}", if enabled { "enabled" } else { "disabled" });
        }
        SettingsCommand::SetInterval { ms } => {
            state.store.set_scan_interval(ms).await?;
            println!("Scan interval set to {ms} ms");
        }
    }
    Ok(())
}

/// Shows only the last four characters of the key.
pub fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "(not set)".to_string();
    }
    let chars: Vec<char> = key.chars().collect();
    let visible: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{visible}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_masked() {
        assert_eq!(mask_key(""), "(not set)");
        assert_eq!(mask_key("AIzaSyExample1234"), "****1234");
        assert_eq!(mask_key("ab"), "****ab");
    }
}
