mod snapshot;

pub use snapshot::AppSnapshot;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use tokio::sync::Mutex;

use crate::{
    db::Database,
    models::{Card, CardPatch, Deck, ScanSettings},
};

/// Key of the slot holding the serialized snapshot.
pub const STORAGE_KEY: &str = "op-tcg-scanner-storage";

/// Single source of truth for cards, decks, the credential and scan settings.
///
/// Mutations run one at a time: each is applied to a copy of the current snapshot,
/// the copy is written back to [`STORAGE_KEY`], and only then replaces the
/// snapshot. A failed write leaves the collection as it was.
#[derive(Clone)]
pub struct CollectionStore {
    snapshot: Arc<Mutex<AppSnapshot>>,
    db: Database,
}

impl CollectionStore {
    /// Loads the snapshot from the database. A missing, unreadable or corrupt slot
    /// yields the default snapshot.
    pub async fn load(db: Database) -> Self {
        let snapshot = match db.read_slot(STORAGE_KEY).await {
            Ok(Some(slot)) => match AppSnapshot::decode(&slot.value) {
                Some(snapshot) => {
                    info!(
                        "Loaded {} cards and {} decks (saved {})",
                        snapshot.scanned_cards.len(),
                        snapshot.decks.len(),
                        slot.updated_at
                    );
                    snapshot
                }
                None => {
                    warn!("Stored snapshot is not readable; starting from defaults");
                    AppSnapshot::default()
                }
            },
            Ok(None) => AppSnapshot::default(),
            Err(err) => {
                warn!("Failed to read stored snapshot, starting from defaults: {err:?}");
                AppSnapshot::default()
            }
        };

        Self {
            snapshot: Arc::new(Mutex::new(snapshot)),
            db,
        }
    }

    pub async fn snapshot(&self) -> AppSnapshot {
        self.snapshot.lock().await.clone()
    }

    pub async fn cards(&self) -> Vec<Card> {
        self.snapshot.lock().await.scanned_cards.clone()
    }

    pub async fn card(&self, id: &str) -> Option<Card> {
        self.snapshot.lock().await.card(id).cloned()
    }

    pub async fn decks(&self) -> Vec<Deck> {
        self.snapshot.lock().await.decks.clone()
    }

    pub async fn deck(&self, id: &str) -> Option<Deck> {
        self.snapshot.lock().await.deck(id).cloned()
    }

    pub async fn deck_cards(&self, deck_id: &str) -> Option<Vec<Card>> {
        self.snapshot.lock().await.deck_cards(deck_id)
    }

    pub async fn api_key(&self) -> String {
        self.snapshot.lock().await.api_key.clone()
    }

    pub async fn settings(&self) -> ScanSettings {
        self.snapshot.lock().await.settings
    }

    pub async fn add_card(&self, card: Card) -> Result<bool> {
        self.mutate(move |snapshot| snapshot.add_card(card)).await
    }

    pub async fn update_card(&self, id: &str, patch: CardPatch) -> Result<bool> {
        self.mutate(|snapshot| snapshot.update_card(id, &patch)).await
    }

    pub async fn remove_card(&self, id: &str) -> Result<bool> {
        self.mutate(|snapshot| snapshot.remove_card(id)).await
    }

    pub async fn create_deck(&self, name: &str) -> Result<Deck> {
        self.mutate(|snapshot| snapshot.create_deck(name, Utc::now()))
            .await
    }

    pub async fn delete_deck(&self, id: &str) -> Result<bool> {
        self.mutate(|snapshot| snapshot.delete_deck(id)).await
    }

    pub async fn add_card_to_deck(&self, deck_id: &str, card_id: &str) -> Result<bool> {
        self.mutate(|snapshot| snapshot.add_card_to_deck(deck_id, card_id))
            .await
    }

    pub async fn remove_card_from_deck(&self, deck_id: &str, card_id: &str) -> Result<bool> {
        self.mutate(|snapshot| snapshot.remove_card_from_deck(deck_id, card_id))
            .await
    }

    pub async fn set_api_key(&self, key: &str) -> Result<()> {
        self.mutate(|snapshot| snapshot.set_api_key(key)).await
    }

    /// Flips the auto-scan flag and returns the new value.
    pub async fn toggle_auto_scan(&self) -> Result<bool> {
        self.mutate(|snapshot| snapshot.toggle_auto_scan()).await
    }

    /// Stores the interval as given; positivity is the caller's concern.
    pub async fn set_scan_interval(&self, ms: u64) -> Result<()> {
        self.mutate(|snapshot| snapshot.set_scan_interval(ms)).await
    }

    async fn mutate<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut AppSnapshot) -> T,
    {
        let mut guard = self.snapshot.lock().await;
        let mut next = guard.clone();
        let output = op(&mut next);
        // The in-memory snapshot only moves once the write has landed.
        self.persist(&next).await?;
        *guard = next;
        Ok(output)
    }

    async fn persist(&self, snapshot: &AppSnapshot) -> Result<()> {
        let serialized =
            serde_json::to_string(snapshot).context("failed to serialize snapshot")?;
        self.db
            .write_slot(STORAGE_KEY, serialized)
            .await
            .context("failed to persist snapshot")
    }
}
