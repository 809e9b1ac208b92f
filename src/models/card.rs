//! Card records and the patch used by the edit operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scanned trading card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
    /// JPEG data URL of the captured frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Optional card fields an edit can empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardField {
    Power,
    Cost,
    Attribute,
    #[serde(rename = "type")]
    CardType,
    Color,
    EffectText,
    SetCode,
    Rarity,
    Counter,
    Life,
    Tags,
}

/// Field-level overwrite for an existing card. `None` leaves the field alone and
/// fields listed in `clear` are emptied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    pub name: Option<String>,
    pub power: Option<i64>,
    pub cost: Option<i64>,
    pub attribute: Option<String>,
    pub card_type: Option<String>,
    pub color: Option<String>,
    pub effect_text: Option<String>,
    pub set_code: Option<String>,
    pub rarity: Option<String>,
    pub counter: Option<i64>,
    pub life: Option<i64>,
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clear: Vec<CardField>,
}

impl CardPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.power.is_none()
            && self.cost.is_none()
            && self.attribute.is_none()
            && self.card_type.is_none()
            && self.color.is_none()
            && self.effect_text.is_none()
            && self.set_code.is_none()
            && self.rarity.is_none()
            && self.counter.is_none()
            && self.life.is_none()
            && self.tags.is_none()
            && self.clear.is_empty()
    }

    /// Whether the patch writes a new value into `field`.
    pub fn sets(&self, field: CardField) -> bool {
        match field {
            CardField::Power => self.power.is_some(),
            CardField::Cost => self.cost.is_some(),
            CardField::Attribute => self.attribute.is_some(),
            CardField::CardType => self.card_type.is_some(),
            CardField::Color => self.color.is_some(),
            CardField::EffectText => self.effect_text.is_some(),
            CardField::SetCode => self.set_code.is_some(),
            CardField::Rarity => self.rarity.is_some(),
            CardField::Counter => self.counter.is_some(),
            CardField::Life => self.life.is_some(),
            CardField::Tags => self.tags.is_some(),
        }
    }

    /// First field that is both set and cleared, if any.
    pub fn conflict(&self) -> Option<CardField> {
        self.clear.iter().copied().find(|field| self.sets(*field))
    }

    /// Overwrites the fields present in the patch, then empties the cleared ones.
    /// `id` and `timestamp` are never touched.
    pub fn apply_to(&self, card: &mut Card) {
        if let Some(name) = &self.name {
            card.name = name.clone();
        }
        overwrite(&mut card.power, self.power);
        overwrite(&mut card.cost, self.cost);
        overwrite(&mut card.counter, self.counter);
        overwrite(&mut card.life, self.life);
        overwrite(&mut card.attribute, self.attribute.clone());
        overwrite(&mut card.card_type, self.card_type.clone());
        overwrite(&mut card.color, self.color.clone());
        overwrite(&mut card.effect_text, self.effect_text.clone());
        overwrite(&mut card.set_code, self.set_code.clone());
        overwrite(&mut card.rarity, self.rarity.clone());
        overwrite(&mut card.tags, self.tags.clone());

        for field in &self.clear {
            match field {
                CardField::Power => card.power = None,
                CardField::Cost => card.cost = None,
                CardField::Attribute => card.attribute = None,
                CardField::CardType => card.card_type = None,
                CardField::Color => card.color = None,
                CardField::EffectText => card.effect_text = None,
                CardField::SetCode => card.set_code = None,
                CardField::Rarity => card.rarity = None,
                CardField::Counter => card.counter = None,
                CardField::Life => card.life = None,
                CardField::Tags => card.tags = None,
            }
        }
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Splits the comma separated tag input of the edit form.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Card {
        Card {
            id: "c1".into(),
            name: "Nami".into(),
            power: Some(1000),
            cost: Some(1),
            attribute: None,
            card_type: Some("Character".into()),
            color: Some("Red".into()),
            effect_text: None,
            set_code: Some("OP01-016".into()),
            rarity: None,
            counter: None,
            life: None,
            tags: None,
            timestamp: Utc::now(),
            image_url: None,
        }
    }

    #[test]
    fn patch_keeps_identity_and_untouched_fields() {
        let mut card = sample();
        let before = card.clone();
        let patch = CardPatch {
            name: Some("Nami (Alt Art)".into()),
            power: Some(2000),
            tags: Some(split_tags("Straw Hat Crew, East Blue ,")),
            ..Default::default()
        };

        patch.apply_to(&mut card);

        assert_eq!(card.id, before.id);
        assert_eq!(card.timestamp, before.timestamp);
        assert_eq!(card.name, "Nami (Alt Art)");
        assert_eq!(card.power, Some(2000));
        assert_eq!(card.cost, Some(1));
        assert_eq!(card.color.as_deref(), Some("Red"));
        assert_eq!(
            card.tags,
            Some(vec!["Straw Hat Crew".to_string(), "East Blue".to_string()])
        );
    }

    #[test]
    fn cleared_fields_are_emptied() {
        let mut card = sample();
        let patch = CardPatch {
            cost: Some(2),
            clear: vec![CardField::Power, CardField::Color],
            ..Default::default()
        };
        assert!(!patch.is_empty());
        assert_eq!(patch.conflict(), None);

        patch.apply_to(&mut card);

        assert_eq!(card.power, None);
        assert_eq!(card.color, None);
        assert_eq!(card.cost, Some(2));
        assert_eq!(card.set_code.as_deref(), Some("OP01-016"));
    }

    #[test]
    fn setting_and_clearing_one_field_conflicts() {
        let patch = CardPatch {
            life: Some(4),
            clear: vec![CardField::Tags, CardField::Life],
            ..Default::default()
        };
        assert_eq!(patch.conflict(), Some(CardField::Life));
    }

    #[test]
    fn type_field_serializes_as_type() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "Character");
        assert_eq!(json["setCode"], "OP01-016");
        assert!(json.get("effectText").is_none());
    }
}
