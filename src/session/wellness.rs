//! Daily check-in accumulator for the wellness companion persona.

use super::{clean_value, lenient, split_list, SessionState, UpdateOutcome};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

/// Objectives beyond this count are still kept, but the persona is prompted for 1-3
pub const SUGGESTED_MAX_OBJECTIVES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, Serialize, Deserialize)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum WellnessField {
    #[strum(to_string = "mood")]
    Mood,
    #[strum(to_string = "energyLevel", serialize = "energy_level", serialize = "energy")]
    EnergyLevel,
    #[strum(
        to_string = "stressFactors",
        serialize = "stress_factors",
        serialize = "stress"
    )]
    StressFactors,
    #[strum(to_string = "objectives", serialize = "objective")]
    Objectives,
    #[strum(
        to_string = "selfCareIntentions",
        serialize = "self_care_intentions",
        serialize = "self_care"
    )]
    SelfCareIntentions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WellnessState {
    pub mood: Option<String>,
    pub energy_level: Option<EnergyLevel>,
    pub stress_factors: Option<String>,
    pub objectives: Vec<String>,
    pub self_care_intentions: Option<String>,
}

/// One entry of the check-in history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessEntry {
    pub mood: Option<String>,
    #[serde(default, deserialize_with = "lenient::keyword")]
    pub energy_level: Option<EnergyLevel>,
    #[serde(default)]
    pub stress_factors: Option<String>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub self_care_intentions: Option<String>,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub timestamp: DateTime<Local>,
    pub date: NaiveDate,
    #[serde(default)]
    pub agent_summary: String,
}

impl WellnessState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: WellnessField, value: &str) -> UpdateOutcome {
        match field {
            WellnessField::Objectives => {
                let items = split_list(value);
                if items.is_empty() {
                    return UpdateOutcome::Ignored("no objectives given".to_string());
                }
                self.objectives.extend(items);
                if self.objectives.len() > SUGGESTED_MAX_OBJECTIVES {
                    log::debug!(
                        "Check-in now has {} objectives (suggested at most {})",
                        self.objectives.len(),
                        SUGGESTED_MAX_OBJECTIVES
                    );
                }
                UpdateOutcome::Applied
            }
            WellnessField::EnergyLevel => match EnergyLevel::from_str(value.trim()) {
                Ok(level) => {
                    self.energy_level = Some(level);
                    UpdateOutcome::Applied
                }
                Err(_) => UpdateOutcome::Ignored(format!(
                    "'{}' is not an energy level (high, medium or low)",
                    value.trim()
                )),
            },
            WellnessField::Mood => assign(&mut self.mood, field, value),
            WellnessField::StressFactors => assign(&mut self.stress_factors, field, value),
            WellnessField::SelfCareIntentions => {
                assign(&mut self.self_care_intentions, field, value)
            }
        }
    }

    /// Replace the objectives wholesale
    pub fn set_objectives(&mut self, objectives: &str) {
        self.objectives = split_list(objectives);
    }

    /// Short recap stored alongside the entry
    pub fn agent_summary(&self) -> String {
        let mood = self.mood.as_deref().unwrap_or("unspecified");
        let energy = self
            .energy_level
            .map(|level| level.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let mut summary = format!("User feeling {} with {} energy.", mood, energy);
        if let Some(ref stress) = self.stress_factors {
            summary.push_str(&format!(" Stressed about: {}.", stress));
        }
        summary
    }

    pub fn to_record_at(&self, timestamp: DateTime<Local>) -> WellnessEntry {
        WellnessEntry {
            mood: self.mood.clone(),
            energy_level: self.energy_level,
            stress_factors: self.stress_factors.clone(),
            objectives: self.objectives.clone(),
            self_care_intentions: self.self_care_intentions.clone(),
            date: timestamp.date_naive(),
            timestamp,
            agent_summary: self.agent_summary(),
        }
    }
}

fn assign(slot: &mut Option<String>, field: WellnessField, value: &str) -> UpdateOutcome {
    match clean_value(value) {
        Some(value) => {
            *slot = Some(value);
            UpdateOutcome::Applied
        }
        None => UpdateOutcome::Ignored(format!("empty value for {}", field)),
    }
}

impl SessionState for WellnessState {
    type Record = WellnessEntry;

    fn update(&mut self, field: &str, value: &str) -> UpdateOutcome {
        match WellnessField::from_str(field.trim()) {
            Ok(field) => self.set(field, value),
            Err(_) => UpdateOutcome::Ignored(format!("unknown check-in field '{}'", field)),
        }
    }

    fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.mood.is_none() {
            missing.push("mood");
        }
        if self.energy_level.is_none() {
            missing.push("energy level");
        }
        if self.objectives.is_empty() {
            missing.push("daily objectives");
        }
        missing
    }

    fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(ref mood) = self.mood {
            parts.push(format!("Mood: {}", mood));
        }
        if let Some(level) = self.energy_level {
            parts.push(format!("Energy: {}", level));
        }
        if let Some(ref stress) = self.stress_factors {
            parts.push(format!("Stress: {}", stress));
        }
        if !self.objectives.is_empty() {
            parts.push(format!("Objectives: {}", self.objectives.join(", ")));
        }
        if let Some(ref self_care) = self.self_care_intentions {
            parts.push(format!("Self-care: {}", self_care));
        }

        parts.join(" | ")
    }

    fn to_record(&self) -> WellnessEntry {
        self.to_record_at(Local::now())
    }
}
