//! Permissive decoding of the model's free-text answer.
//!
//! The model is told to answer with raw JSON but regularly wraps it in code fences
//! or prose. Anything that does not decode to a named card is treated as
//! "no card in frame" rather than an error.

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::Card;

/// Card fields as extracted by the recognition service.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RecognizedCard {
    #[serde(default, alias = "name", deserialize_with = "lenient_string")]
    pub card_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub power: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub cost: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub attribute: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub card_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub effect_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub set_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub rarity: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub counter: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub life: Option<i64>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Option<Vec<String>>,
}

impl RecognizedCard {
    pub fn name(&self) -> &str {
        self.card_name.as_deref().unwrap_or_default()
    }

    /// Turns the extraction into a stored card record.
    pub fn into_card(
        self,
        id: String,
        timestamp: DateTime<Utc>,
        image_url: Option<String>,
    ) -> Card {
        Card {
            id,
            name: self.card_name.unwrap_or_default(),
            power: self.power,
            cost: self.cost,
            attribute: self.attribute,
            card_type: self.card_type,
            color: self.color,
            effect_text: self.effect_text,
            set_code: self.set_code,
            rarity: self.rarity,
            counter: self.counter,
            life: self.life,
            tags: self.tags,
            timestamp,
            image_url,
        }
    }
}

/// Strips code fences and cuts the text down to its outermost `{...}` span.
pub fn extract_json(text: &str) -> String {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(open), Some(close)) if open < close => cleaned[open..=close].to_string(),
        _ => cleaned.to_string(),
    }
}

/// Decodes a model answer into a card. Returns `None` for `null`, noise, or a
/// JSON object without a card name.
pub fn parse_card_response(text: &str) -> Option<RecognizedCard> {
    let candidate = extract_json(text);

    match serde_json::from_str::<Option<RecognizedCard>>(&candidate) {
        Ok(Some(card)) if !card.name().trim().is_empty() => Some(card),
        Ok(Some(_)) => {
            warn!("Recognition response has no card name: {text}");
            None
        }
        Ok(None) => None,
        Err(err) => {
            warn!("Failed to parse recognition response ({err}): {text}");
            None
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(int_from_value))
}

fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite() && float.fract() == 0.0)
                .map(|float| float as i64)
        }),
        Value::String(text) => text
            .trim()
            .trim_start_matches('+')
            .replace(',', "")
            .parse()
            .ok(),
        _ => None,
    }
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(tag) if !tag.trim().is_empty() => Some(tag.trim().to_string()),
                    _ => None,
                })
                .collect(),
        ),
        Some(Value::String(joined)) => Some(crate::models::split_tags(&joined)),
        _ => None,
    })
}
