use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::{export::ExportFormat, models::CardField};

#[derive(Parser, Debug)]
#[command(
    name = "card-scanner",
    version,
    about = "Scan trading cards from camera frames into a local collection."
)]
pub struct Cli {
    /// Directory holding the database and configuration.
    #[arg(long, global = true, env = "CARD_SCANNER_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Path to the configuration file (defaults to config.json in the data directory).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Capture and identify cards.
    Scan(ScanArgs),
    /// Browse and edit scanned cards.
    Cards {
        #[command(subcommand)]
        command: CardsCommand,
    },
    /// Manage decks and export them.
    Decks {
        #[command(subcommand)]
        command: DecksCommand,
    },
    /// API key and auto-scan settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Recognition and capture configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Snapshot file refreshed in place by the camera tool.
    #[arg(long, value_name = "FILE", conflicts_with = "inbox")]
    pub frame: Option<PathBuf>,

    /// Directory of frames to drain in name order.
    #[arg(long, value_name = "DIR")]
    pub inbox: Option<PathBuf>,

    /// Keep scanning on the configured interval until Ctrl-C.
    #[arg(long, conflicts_with = "once")]
    pub auto: bool,

    /// Scan a single frame even when auto-scan is enabled.
    #[arg(long)]
    pub once: bool,
}

#[derive(Subcommand, Debug)]
pub enum CardsCommand {
    /// List cards, most recent first.
    List,
    /// Show every field of one card.
    Show { id: String },
    /// Overwrite fields of a card.
    Edit {
        id: String,
        #[command(flatten)]
        fields: CardFields,
    },
    /// Delete a card and drop it from every deck.
    Remove { id: String },
}

#[derive(Args, Debug, Default)]
pub struct CardFields {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub power: Option<i64>,
    #[arg(long)]
    pub cost: Option<i64>,
    #[arg(long)]
    pub counter: Option<i64>,
    #[arg(long)]
    pub life: Option<i64>,
    #[arg(long)]
    pub attribute: Option<String>,
    #[arg(long = "type")]
    pub card_type: Option<String>,
    #[arg(long)]
    pub color: Option<String>,
    #[arg(long)]
    pub rarity: Option<String>,
    #[arg(long)]
    pub set_code: Option<String>,
    #[arg(long)]
    pub effect: Option<String>,
    /// Comma-separated list.
    #[arg(long)]
    pub tags: Option<String>,
    /// Empty a field; repeat for several.
    #[arg(long, value_enum, value_name = "FIELD")]
    pub clear: Vec<FieldArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldArg {
    Power,
    Cost,
    Counter,
    Life,
    Attribute,
    Type,
    Color,
    Rarity,
    SetCode,
    Effect,
    Tags,
}

impl From<FieldArg> for CardField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Power => CardField::Power,
            FieldArg::Cost => CardField::Cost,
            FieldArg::Counter => CardField::Counter,
            FieldArg::Life => CardField::Life,
            FieldArg::Attribute => CardField::Attribute,
            FieldArg::Type => CardField::CardType,
            FieldArg::Color => CardField::Color,
            FieldArg::Rarity => CardField::Rarity,
            FieldArg::SetCode => CardField::SetCode,
            FieldArg::Effect => CardField::EffectText,
            FieldArg::Tags => CardField::Tags,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum DecksCommand {
    List,
    Create { name: String },
    Delete { id: String },
    /// Append a card to a deck.
    Add { deck: String, card: String },
    /// Remove every copy of a card from a deck.
    Remove { deck: String, card: String },
    Export {
        deck: String,
        #[arg(long, value_enum, default_value_t = FormatArg::All)]
        format: FormatArg,
        /// Output directory (defaults to the current directory).
        #[arg(long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Xlsx,
    Json,
    Csv,
    All,
}

impl FormatArg {
    pub fn formats(self) -> Vec<ExportFormat> {
        match self {
            FormatArg::Xlsx => vec![ExportFormat::Xlsx],
            FormatArg::Json => vec![ExportFormat::Json],
            FormatArg::Csv => vec![ExportFormat::Csv],
            FormatArg::All => ExportFormat::ALL.to_vec(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,
    SetKey { key: String },
    ToggleAuto,
    SetInterval {
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        ms: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    SetModel { model: String },
    SetEndpoint { url: String },
    /// Request timeout in seconds; 0 removes it.
    SetTimeout { secs: u64 },
    Thumbnails {
        #[arg(value_enum)]
        state: Switch,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}
