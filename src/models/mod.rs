pub mod card;
pub mod deck;
pub mod settings;

pub use card::{split_tags, Card, CardField, CardPatch};
pub use deck::Deck;
pub use settings::{ScanSettings, DEFAULT_SCAN_INTERVAL_MS};
