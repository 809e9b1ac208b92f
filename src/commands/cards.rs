use anyhow::{bail, Context, Result};

use crate::{
    cli::{CardFields, CardsCommand},
    models::{split_tags, Card, CardField, CardPatch},
    AppState,
};

use super::{resolve_id, short_id};

pub async fn handle(state: &AppState, command: CardsCommand) -> Result<()> {
    match command {
        CardsCommand::List => {
            let cards = state.store.cards().await;
            if cards.is_empty() {
                println!("No cards scanned yet.");
            }
            for card in &cards {
                println!("{}", summary_line(card));
            }
        }
        CardsCommand::Show { id } => {
            let card = find_card(state, &id).await?;
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        CardsCommand::Edit { id, fields } => {
            let card = edit_card(state, &id, fields.into()).await?;
            println!("Updated {}", summary_line(&card));
        }
        CardsCommand::Remove { id } => {
            let card = remove_card(state, &id).await?;
            println!("Removed {} ({})", card.name, short_id(&card.id));
        }
    }
    Ok(())
}

pub async fn resolve_card_id(state: &AppState, wanted: &str) -> Result<String> {
    let cards = state.store.cards().await;
    resolve_id(wanted, cards.iter().map(|card| card.id.as_str()), "card")
}

pub async fn find_card(state: &AppState, wanted: &str) -> Result<Card> {
    let id = resolve_card_id(state, wanted).await?;
    state
        .store
        .card(&id)
        .await
        .with_context(|| format!("card {id} disappeared"))
}

pub async fn edit_card(state: &AppState, wanted: &str, patch: CardPatch) -> Result<Card> {
    if patch.is_empty() {
        bail!("nothing to change; pass at least one field");
    }
    if let Some(field) = patch.conflict() {
        bail!("{field:?} is both set and cleared");
    }
    let id = resolve_card_id(state, wanted).await?;
    state.store.update_card(&id, patch).await?;
    find_card(state, &id).await
}

/// Deletes the card; decks lose every reference to it.
pub async fn remove_card(state: &AppState, wanted: &str) -> Result<Card> {
    let card = find_card(state, wanted).await?;
    state.store.remove_card(&card.id).await?;
    Ok(card)
}

pub fn summary_line(card: &Card) -> String {
    let mut line = format!("{}  {}", short_id(&card.id), card.name);
    for detail in [&card.set_code, &card.color, &card.card_type].into_iter().flatten() {
        line.push_str("  ");
        line.push_str(detail);
    }
    if let Some(power) = card.power {
        line.push_str(&format!("  P{power}"));
    }
    if let Some(cost) = card.cost {
        line.push_str(&format!("  C{cost}"));
    }
    line.push_str(&format!("  {}", card.timestamp.format("%Y-%m-%d %H:%M")));
    line
}

impl From<CardFields> for CardPatch {
    fn from(fields: CardFields) -> Self {
        CardPatch {
            name: fields.name,
            power: fields.power,
            cost: fields.cost,
            attribute: fields.attribute,
            card_type: fields.card_type,
            color: fields.color,
            effect_text: fields.effect,
            set_code: fields.set_code,
            rarity: fields.rarity,
            counter: fields.counter,
            life: fields.life,
            tags: fields.tags.as_deref().map(split_tags),
            clear: fields.clear.into_iter().map(CardField::from).collect(),
        }
    }
}
