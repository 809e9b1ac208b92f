use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::{
    cli::DecksCommand,
    export::{export_deck, ExportFormat},
    models::Deck,
    AppState,
};

use super::{cards::resolve_card_id, resolve_id, short_id};

pub async fn handle(state: &AppState, command: DecksCommand) -> Result<()> {
    match command {
        DecksCommand::List => {
            let decks = state.store.decks().await;
            if decks.is_empty() {
                println!("No decks yet.");
            }
            for deck in &decks {
                println!(
                    "{}  {}  ({} cards, created {})",
                    short_id(&deck.id),
                    deck.name,
                    deck.cards.len(),
                    deck.created_at.format("%Y-%m-%d")
                );
            }
        }
        DecksCommand::Create { name } => {
            let deck = create_deck(state, &name).await?;
            println!("Created deck {} ({})", deck.name, deck.id);
        }
        DecksCommand::Delete { id } => {
            let deck = find_deck(state, &id).await?;
            state.store.delete_deck(&deck.id).await?;
            println!("Deleted deck {}", deck.name);
        }
        DecksCommand::Add { deck, card } => {
            let deck = find_deck(state, &deck).await?;
            let card_id = resolve_card_id(state, &card).await?;
            state.store.add_card_to_deck(&deck.id, &card_id).await?;
            println!("Added {} to {}", short_id(&card_id), deck.name);
        }
        DecksCommand::Remove { deck, card } => {
            let deck = find_deck(state, &deck).await?;
            let card_id = resolve_id(&card, deck.cards.iter().map(String::as_str), "card")?;
            state.store.remove_card_from_deck(&deck.id, &card_id).await?;
            println!("Removed {} from {}", short_id(&card_id), deck.name);
        }
        DecksCommand::Export { deck, format, out } => {
            for path in export(state, &deck, &format.formats(), &out).await? {
                println!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}

pub async fn create_deck(state: &AppState, name: &str) -> Result<Deck> {
    let name = name.trim();
    if name.is_empty() {
        bail!("deck name cannot be empty");
    }
    state.store.create_deck(name).await
}

/// Looks a deck up by id, unique id prefix, or exact name.
pub async fn find_deck(state: &AppState, wanted: &str) -> Result<Deck> {
    let decks = state.store.decks().await;

    let by_id = resolve_id(wanted, decks.iter().map(|deck| deck.id.as_str()), "deck");
    let id = match by_id {
        Ok(id) => id,
        Err(err) => {
            let mut named = decks.iter().filter(|deck| deck.name == wanted);
            match (named.next(), named.next()) {
                (Some(deck), None) => deck.id.clone(),
                (Some(_), Some(_)) => bail!("several decks are named '{wanted}'; use the id"),
                (None, _) => return Err(err),
            }
        }
    };

    decks
        .into_iter()
        .find(|deck| deck.id == id)
        .with_context(|| format!("deck {id} disappeared"))
}

pub async fn export(
    state: &AppState,
    wanted: &str,
    formats: &[ExportFormat],
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let deck = find_deck(state, wanted).await?;
    let cards = state
        .store
        .deck_cards(&deck.id)
        .await
        .with_context(|| format!("deck {} disappeared", deck.id))?;

    formats
        .iter()
        .map(|format| export_deck(&deck.name, &cards, *format, out_dir))
        .collect()
}
