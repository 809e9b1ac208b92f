use anyhow::{bail, Result};

use crate::{
    cli::{ConfigCommand, Switch},
    AppState,
};

pub fn handle(state: &AppState, command: ConfigCommand) -> Result<()> {
    let config = &state.config;
    match command {
        ConfigCommand::Show => {
            println!("# {}", config.path().display());
            println!("{}", serde_json::to_string_pretty(&config.current())?);
        }
        ConfigCommand::SetModel { model } => {
            let model = model.trim();
            if model.is_empty() {
                bail!("model name cannot be empty");
            }
            let mut recognition = config.recognition();
            recognition.model = model.to_string();
            config.update_recognition(recognition)?;
            println!("Model set to {model}");
        }
        ConfigCommand::SetEndpoint { url } => {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("endpoint must be an http(s) URL");
            }
            let mut recognition = config.recognition();
            recognition.endpoint = url.trim_end_matches('/').to_string();
            config.update_recognition(recognition)?;
            println!("Endpoint set to {url}");
        }
        ConfigCommand::SetTimeout { secs } => {
            let mut recognition = config.recognition();
            recognition.request_timeout_secs = (secs > 0).then_some(secs);
            config.update_recognition(recognition)?;
            match secs {
                0 => println!("Request timeout removed"),
                secs => println!("Request timeout set to {secs}s"),
            }
        }
        ConfigCommand::Thumbnails { state: switch } => {
            let mut capture = config.capture();
            capture.attach_thumbnail = switch == Switch::On;
            config.update_capture(capture)?;
            println!(
                "Thumbnails {}",
                if capture.attach_thumbnail { "on" } else { "off" }
            );
        }
    }
    Ok(())
}
