//! The persisted application snapshot and the pure operations over it.
//!
//! Every operation mutates a snapshot in place; [`super::CollectionStore`] applies
//! them to a copy and swaps the copy in, so no half-applied state is ever visible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Card, CardPatch, Deck, ScanSettings};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSnapshot {
    pub api_key: String,
    pub scanned_cards: Vec<Card>,
    pub decks: Vec<Deck>,
    pub settings: ScanSettings,
}

impl AppSnapshot {
    /// Decodes a stored snapshot. Anything unreadable yields `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn card(&self, id: &str) -> Option<&Card> {
        self.scanned_cards.iter().find(|card| card.id == id)
    }

    pub fn deck(&self, id: &str) -> Option<&Deck> {
        self.decks.iter().find(|deck| deck.id == id)
    }

    /// Cards of a deck in deck order. Identifiers without a card are skipped.
    pub fn deck_cards(&self, deck_id: &str) -> Option<Vec<Card>> {
        let deck = self.deck(deck_id)?;
        Some(
            deck.cards
                .iter()
                .filter_map(|card_id| self.card(card_id).cloned())
                .collect(),
        )
    }

    /// Prepends `card`. Returns `false` and leaves the list alone when the id is taken.
    pub fn add_card(&mut self, card: Card) -> bool {
        if self.card(&card.id).is_some() {
            return false;
        }
        self.scanned_cards.insert(0, card);
        true
    }

    pub fn update_card(&mut self, id: &str, patch: &CardPatch) -> bool {
        match self.scanned_cards.iter_mut().find(|card| card.id == id) {
            Some(card) => {
                patch.apply_to(card);
                true
            }
            None => false,
        }
    }

    /// Deletes the card and strips its id from every deck.
    pub fn remove_card(&mut self, id: &str) -> bool {
        let before = self.scanned_cards.len();
        self.scanned_cards.retain(|card| card.id != id);
        for deck in &mut self.decks {
            deck.cards.retain(|card_id| card_id != id);
        }
        self.scanned_cards.len() != before
    }

    pub fn create_deck(&mut self, name: &str, now: DateTime<Utc>) -> Deck {
        let deck = Deck {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            cards: Vec::new(),
            created_at: now,
        };
        self.decks.push(deck.clone());
        deck
    }

    pub fn delete_deck(&mut self, id: &str) -> bool {
        let before = self.decks.len();
        self.decks.retain(|deck| deck.id != id);
        self.decks.len() != before
    }

    /// Appends without a duplicate check.
    pub fn add_card_to_deck(&mut self, deck_id: &str, card_id: &str) -> bool {
        match self.decks.iter_mut().find(|deck| deck.id == deck_id) {
            Some(deck) => {
                deck.cards.push(card_id.to_string());
                true
            }
            None => false,
        }
    }

    /// Removes every occurrence of `card_id` from the deck.
    pub fn remove_card_from_deck(&mut self, deck_id: &str, card_id: &str) -> bool {
        match self.decks.iter_mut().find(|deck| deck.id == deck_id) {
            Some(deck) => {
                let before = deck.cards.len();
                deck.cards.retain(|id| id != card_id);
                deck.cards.len() != before
            }
            None => false,
        }
    }

    pub fn set_api_key(&mut self, key: &str) {
        self.api_key = key.to_string();
    }

    pub fn toggle_auto_scan(&mut self) -> bool {
        self.settings.auto_scan = !self.settings.auto_scan;
        self.settings.auto_scan
    }

    pub fn set_scan_interval(&mut self, ms: u64) {
        self.settings.scan_interval = ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn card(id: &str, name: &str) -> Card {
        Card {
            id: id.into(),
            name: name.into(),
            power: None,
            cost: None,
            attribute: None,
            card_type: None,
            color: None,
            effect_text: None,
            set_code: None,
            rarity: None,
            counter: None,
            life: None,
            tags: None,
            timestamp: Utc::now(),
            image_url: None,
        }
    }

    fn ids(snapshot: &AppSnapshot) -> Vec<&str> {
        snapshot.scanned_cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn add_prepends_most_recent_first() {
        let mut snapshot = AppSnapshot::default();
        snapshot.add_card(card("a", "Luffy"));
        snapshot.add_card(card("b", "Zoro"));
        assert_eq!(ids(&snapshot), vec!["b", "a"]);
    }

    #[test]
    fn ids_stay_unique_across_add_remove_sequences() {
        let mut snapshot = AppSnapshot::default();
        let script = ["a", "b", "a", "c", "-a", "a", "b", "-b", "-b", "c", "b", "a"];

        for step in script {
            match step.strip_prefix('-') {
                Some(id) => {
                    snapshot.remove_card(id);
                }
                None => {
                    snapshot.add_card(card(step, step));
                }
            }
            let unique: HashSet<&str> = ids(&snapshot).into_iter().collect();
            assert_eq!(unique.len(), snapshot.scanned_cards.len());
        }
        assert_eq!(ids(&snapshot), vec!["b", "a", "c"]);
    }

    #[test]
    fn remove_cascades_through_every_deck_preserving_order() {
        let mut snapshot = AppSnapshot::default();
        for id in ["x", "y", "z"] {
            snapshot.add_card(card(id, id));
        }
        let now = Utc::now();
        let first = snapshot.create_deck("Red Aggro", now).id;
        let second = snapshot.create_deck("Blue Control", now).id;
        let third = snapshot.create_deck("Unrelated", now).id;

        for card_id in ["y", "x", "z", "x"] {
            snapshot.add_card_to_deck(&first, card_id);
        }
        for card_id in ["x", "z"] {
            snapshot.add_card_to_deck(&second, card_id);
        }
        snapshot.add_card_to_deck(&third, "z");

        assert!(snapshot.remove_card("x"));

        assert_eq!(snapshot.deck(&first).unwrap().cards, vec!["y", "z"]);
        assert_eq!(snapshot.deck(&second).unwrap().cards, vec!["z"]);
        assert_eq!(snapshot.deck(&third).unwrap().cards, vec!["z"]);
        assert!(snapshot.card("x").is_none());
    }

    #[test]
    fn deleting_a_deck_leaves_cards_alone() {
        let mut snapshot = AppSnapshot::default();
        snapshot.add_card(card("a", "Luffy"));
        snapshot.add_card(card("b", "Zoro"));
        let deck = snapshot.create_deck("Main", Utc::now());
        snapshot.add_card_to_deck(&deck.id, "a");
        let cards_before = snapshot.scanned_cards.clone();

        assert!(snapshot.delete_deck(&deck.id));
        assert!(!snapshot.delete_deck(&deck.id));
        assert_eq!(snapshot.scanned_cards, cards_before);
    }

    #[test]
    fn deck_cards_skip_dangling_ids_and_keep_duplicates() {
        let mut snapshot = AppSnapshot::default();
        snapshot.add_card(card("a", "Luffy"));
        let deck = snapshot.create_deck("Main", Utc::now());
        for card_id in ["a", "ghost", "a"] {
            snapshot.add_card_to_deck(&deck.id, card_id);
        }

        let names: Vec<String> = snapshot
            .deck_cards(&deck.id)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Luffy", "Luffy"]);
        assert!(snapshot.deck_cards("missing").is_none());
    }

    #[test]
    fn update_of_unknown_card_is_a_noop() {
        let mut snapshot = AppSnapshot::default();
        snapshot.add_card(card("a", "Luffy"));
        let before = snapshot.clone();
        let patch = CardPatch {
            name: Some("Shanks".into()),
            ..Default::default()
        };
        assert!(!snapshot.update_card("b", &patch));
        assert_eq!(snapshot, before);
    }

    #[test]
    fn remove_from_deck_drops_every_occurrence() {
        let mut snapshot = AppSnapshot::default();
        let deck = snapshot.create_deck("Main", Utc::now());
        for card_id in ["a", "b", "a"] {
            snapshot.add_card_to_deck(&deck.id, card_id);
        }
        assert!(snapshot.remove_card_from_deck(&deck.id, "a"));
        assert_eq!(snapshot.deck(&deck.id).unwrap().cards, vec!["b"]);
        assert!(!snapshot.remove_card_from_deck("nope", "b"));
    }

    #[test]
    fn partial_documents_merge_with_defaults() {
        let snapshot = AppSnapshot::decode(r#"{"apiKey":"k","settings":{"autoScan":true}}"#)
            .expect("partial snapshot should decode");
        assert_eq!(snapshot.api_key, "k");
        assert!(snapshot.settings.auto_scan);
        assert_eq!(snapshot.settings.scan_interval, 3000);
        assert!(snapshot.scanned_cards.is_empty());

        assert!(AppSnapshot::decode("{not json").is_none());
        assert!(AppSnapshot::decode(r#"{"scannedCards":[{"id":1}]}"#).is_none());
    }
}
