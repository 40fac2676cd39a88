//! Prospect details collected by the sales development persona.

use super::{clean_value, lenient, split_list, SessionState, UpdateOutcome};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};

/// Written to every lead so sales can tell where it came from
pub const LEAD_SOURCE: &str = "Nero voice agent";

static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum LeadField {
    #[strum(to_string = "name")]
    Name,
    #[strum(to_string = "company")]
    Company,
    #[strum(to_string = "email")]
    Email,
    #[strum(to_string = "role", serialize = "title")]
    Role,
    #[strum(to_string = "useCase", serialize = "use_case")]
    UseCase,
    #[strum(to_string = "teamSize", serialize = "team_size")]
    TeamSize,
    #[strum(to_string = "timeline")]
    Timeline,
    #[strum(
        to_string = "questionsAsked",
        serialize = "questions_asked",
        serialize = "question"
    )]
    QuestionsAsked,
    #[strum(
        to_string = "answersProvided",
        serialize = "answers_provided",
        serialize = "answer"
    )]
    AnswersProvided,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadState {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub use_case: Option<String>,
    pub team_size: Option<String>,
    pub timeline: Option<String>,
    pub questions_asked: Vec<String>,
    pub answers_provided: Vec<String>,
}

/// Captured lead as written to `lead_<timestamp>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRecord {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub use_case: Option<String>,
    pub team_size: Option<String>,
    pub timeline: Option<String>,
    #[serde(default)]
    pub questions_asked: Vec<String>,
    #[serde(default)]
    pub answers_provided: Vec<String>,
    #[serde(deserialize_with = "lenient::timestamp")]
    pub timestamp: DateTime<Local>,
    pub source: String,
}

fn assign(slot: &mut Option<String>, field: LeadField, value: &str) -> UpdateOutcome {
    match clean_value(value) {
        Some(value) => {
            *slot = Some(value);
            UpdateOutcome::Applied
        }
        None => UpdateOutcome::Ignored(format!("empty value for {}", field)),
    }
}

fn append(list: &mut Vec<String>, field: LeadField, value: &str) -> UpdateOutcome {
    let items = split_list(value);
    if items.is_empty() {
        return UpdateOutcome::Ignored(format!("empty value for {}", field));
    }
    list.extend(items);
    UpdateOutcome::Applied
}

impl LeadState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: LeadField, value: &str) -> UpdateOutcome {
        match field {
            LeadField::Email => {
                let email = value.trim();
                let valid = EMAIL.as_ref().map(|re| re.is_match(email)).unwrap_or(false);
                if valid {
                    self.email = Some(email.to_string());
                    UpdateOutcome::Applied
                } else {
                    UpdateOutcome::Ignored(format!(
                        "'{}' doesn't look like an email address",
                        email
                    ))
                }
            }
            LeadField::Name => assign(&mut self.name, field, value),
            LeadField::Company => assign(&mut self.company, field, value),
            LeadField::Role => assign(&mut self.role, field, value),
            LeadField::UseCase => assign(&mut self.use_case, field, value),
            LeadField::TeamSize => assign(&mut self.team_size, field, value),
            LeadField::Timeline => assign(&mut self.timeline, field, value),
            LeadField::QuestionsAsked => append(&mut self.questions_asked, field, value),
            LeadField::AnswersProvided => append(&mut self.answers_provided, field, value),
        }
    }

    pub fn to_record_at(&self, timestamp: DateTime<Local>) -> LeadRecord {
        LeadRecord {
            name: self.name.clone(),
            company: self.company.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            use_case: self.use_case.clone(),
            team_size: self.team_size.clone(),
            timeline: self.timeline.clone(),
            questions_asked: self.questions_asked.clone(),
            answers_provided: self.answers_provided.clone(),
            timestamp,
            source: LEAD_SOURCE.to_string(),
        }
    }
}

impl SessionState for LeadState {
    type Record = LeadRecord;

    fn update(&mut self, field: &str, value: &str) -> UpdateOutcome {
        match LeadField::from_str(field.trim()) {
            Ok(field) => self.set(field, value),
            Err(_) => UpdateOutcome::Ignored(format!("unknown lead field '{}'", field)),
        }
    }

    fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        [
            (self.name.is_none(), "name"),
            (self.company.is_none(), "company"),
            (self.email.is_none(), "email"),
            (self.role.is_none(), "role"),
            (self.use_case.is_none(), "use case"),
        ]
        .into_iter()
        .filter_map(|(missing, name)| missing.then_some(name))
        .collect()
    }

    fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(ref name) = self.name {
            parts.push(name.clone());
        }
        match (&self.role, &self.company) {
            (Some(role), Some(company)) => parts.push(format!("{} at {}", role, company)),
            (None, Some(company)) => parts.push(format!("from {}", company)),
            _ => {}
        }
        if let Some(ref use_case) = self.use_case {
            parts.push(format!("interested in {}", use_case));
        }
        if let Some(ref team_size) = self.team_size {
            parts.push(format!("with a team of {}", team_size));
        }
        if let Some(ref timeline) = self.timeline {
            parts.push(format!("looking to start {}", timeline));
        }

        if parts.is_empty() {
            "prospect".to_string()
        } else {
            parts.join(", ")
        }
    }

    fn to_record(&self) -> LeadRecord {
        self.to_record_at(Local::now())
    }
}

impl LeadRecord {
    /// Stem of the file this record is saved under
    pub fn file_stem(&self) -> String {
        format!("lead_{}", self.timestamp.format("%Y%m%d_%H%M%S_%6f"))
    }
}
