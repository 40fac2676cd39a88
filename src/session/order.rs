//! Coffee order accumulator for the barista persona.

use super::{clean_value, lenient, split_list, SessionState, UpdateOutcome};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

/// Cup sizes on the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum DrinkSize {
    #[strum(to_string = "small", serialize = "tall")]
    Small,
    #[strum(to_string = "medium", serialize = "grande")]
    Medium,
    #[strum(to_string = "large", serialize = "venti")]
    Large,
}

/// Names the order fields may be addressed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum OrderField {
    #[strum(to_string = "drinkType", serialize = "drink_type", serialize = "drink")]
    DrinkType,
    #[strum(to_string = "size")]
    Size,
    #[strum(to_string = "milk")]
    Milk,
    #[strum(to_string = "extras", serialize = "extra")]
    Extras,
    #[strum(
        to_string = "customerName",
        serialize = "customer_name",
        serialize = "name"
    )]
    CustomerName,
}

/// Order being collected during one barista conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderState {
    pub drink_type: Option<String>,
    pub size: Option<DrinkSize>,
    pub milk: Option<String>,
    pub extras: Vec<String>,
    pub customer_name: Option<String>,
}

/// Finalized order as written to `order_<timestamp>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub drink_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::keyword")]
    pub size: Option<DrinkSize>,
    pub milk: Option<String>,
    #[serde(default)]
    pub extras: Vec<String>,
    #[serde(rename = "name")]
    pub customer_name: Option<String>,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub timestamp: DateTime<Local>,
}

static DRINKS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    keyword_table(&[
        ("latte", "Latte"),
        ("cappuccino", "Cappuccino"),
        ("espresso", "Espresso"),
        ("americano", "Americano"),
        ("mocha", "Mocha"),
        ("macchiato", "Macchiato"),
        ("flat white", "Flat White"),
    ])
});

static MILKS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    keyword_table(&[
        ("whole", "whole milk"),
        ("skim", "skim milk"),
        ("oat", "oat milk"),
        ("almond", "almond milk"),
        ("soy", "soy milk"),
        ("coconut", "coconut milk"),
        ("no milk", "no milk"),
    ])
});

static EXTRAS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    keyword_table(&[
        ("whipped cream", "whipped cream"),
        ("extra shot", "extra shot"),
        ("vanilla", "vanilla syrup"),
        ("caramel", "caramel syrup"),
        ("hazelnut", "hazelnut syrup"),
        ("sugar", "sugar"),
        ("honey", "honey"),
    ])
});

static SIZES: Lazy<Vec<(Regex, DrinkSize)>> = Lazy::new(|| {
    [
        (r"(?i)\b(small|tall)\b", DrinkSize::Small),
        (r"(?i)\b(medium|grande)\b", DrinkSize::Medium),
        (r"(?i)\b(large|venti)\b", DrinkSize::Large),
    ]
    .into_iter()
    .filter_map(|(pattern, size)| Regex::new(pattern).ok().map(|re| (re, size)))
    .collect()
});

fn assign(slot: &mut Option<String>, field: OrderField, value: &str) -> UpdateOutcome {
    match clean_value(value) {
        Some(value) => {
            *slot = Some(value);
            UpdateOutcome::Applied
        }
        None => UpdateOutcome::Ignored(format!("empty value for {}", field)),
    }
}

/// Spoken form of a milk choice: "oat" reads as "oat milk"
fn milk_phrase(milk: &str) -> String {
    if milk.to_lowercase().contains("milk") {
        return milk.to_string();
    }
    match MILKS.iter().find(|(re, _)| re.is_match(milk)) {
        Some((_, phrase)) => phrase.to_string(),
        None => milk.to_string(),
    }
}

fn keyword_table(entries: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    entries
        .iter()
        .filter_map(|(keyword, value)| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
                .ok()
                .map(|re| (re, *value))
        })
        .collect()
}

impl OrderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a typed field update
    pub fn set(&mut self, field: OrderField, value: &str) -> UpdateOutcome {
        match field {
            OrderField::Extras => {
                let items = split_list(value);
                if items.is_empty() {
                    return UpdateOutcome::Ignored("no extras given".to_string());
                }
                for item in items {
                    self.add_extra(item);
                }
                UpdateOutcome::Applied
            }
            OrderField::Size => match DrinkSize::from_str(value.trim()) {
                Ok(size) => {
                    self.size = Some(size);
                    UpdateOutcome::Applied
                }
                Err(_) => UpdateOutcome::Ignored(format!(
                    "'{}' is not a size we serve (small, medium or large)",
                    value.trim()
                )),
            },
            OrderField::DrinkType => assign(&mut self.drink_type, field, value),
            OrderField::Milk => assign(&mut self.milk, field, value),
            OrderField::CustomerName => assign(&mut self.customer_name, field, value),
        }
    }

    /// Replace the extras list wholesale
    pub fn set_extras(&mut self, extras: &str) {
        self.extras.clear();
        for item in split_list(extras) {
            self.add_extra(item);
        }
    }

    fn add_extra(&mut self, item: String) {
        if !self
            .extras
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(&item))
        {
            self.extras.push(item);
        }
    }

    /// Pull menu keywords out of a transcribed utterance.
    ///
    /// Returns the fields that changed, in the order they were detected.
    pub fn update_from_text(&mut self, text: &str) -> Vec<OrderField> {
        let mut updated = Vec::new();

        if let Some((_, drink)) = DRINKS.iter().find(|(re, _)| re.is_match(text)) {
            self.drink_type = Some(drink.to_string());
            updated.push(OrderField::DrinkType);
        }

        if let Some((_, size)) = SIZES.iter().find(|(re, _)| re.is_match(text)) {
            self.size = Some(*size);
            updated.push(OrderField::Size);
        }

        if let Some((_, milk)) = MILKS.iter().find(|(re, _)| re.is_match(text)) {
            self.milk = Some(milk.to_string());
            updated.push(OrderField::Milk);
        }

        let before = self.extras.len();
        for (_, extra) in EXTRAS.iter().filter(|(re, _)| re.is_match(text)) {
            self.add_extra(extra.to_string());
        }
        if self.extras.len() > before {
            updated.push(OrderField::Extras);
        }

        updated
    }

    /// Snapshot stamped with an explicit time
    pub fn to_record_at(&self, timestamp: DateTime<Local>) -> OrderRecord {
        OrderRecord {
            drink_type: self.drink_type.clone(),
            size: self.size,
            milk: self.milk.clone(),
            extras: self.extras.clone(),
            customer_name: self.customer_name.clone(),
            timestamp,
        }
    }
}

impl SessionState for OrderState {
    type Record = OrderRecord;

    fn update(&mut self, field: &str, value: &str) -> UpdateOutcome {
        match OrderField::from_str(field.trim()) {
            Ok(field) => self.set(field, value),
            Err(_) => UpdateOutcome::Ignored(format!("unknown order field '{}'", field)),
        }
    }

    fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.drink_type.is_none() {
            missing.push("drink type");
        }
        if self.size.is_none() {
            missing.push("size");
        }
        if self.customer_name.is_none() {
            missing.push("name");
        }
        missing
    }

    fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(size) = self.size {
            parts.push(size.to_string());
        }
        if let Some(ref drink) = self.drink_type {
            parts.push(drink.clone());
        }
        if let Some(ref milk) = self.milk {
            parts.push(format!("with {}", milk_phrase(milk)));
        }
        if !self.extras.is_empty() {
            parts.push(format!("and {}", self.extras.join(", ")));
        }

        let summary = parts.join(" ");
        match self.customer_name {
            Some(ref name) => format!("{} for {}", summary, name),
            None => summary,
        }
    }

    fn to_record(&self) -> OrderRecord {
        self.to_record_at(Local::now())
    }
}

impl OrderRecord {
    /// Stem of the file this record is saved under
    pub fn file_stem(&self) -> String {
        format!("order_{}", self.timestamp.format("%Y%m%d_%H%M%S_%6f"))
    }
}
