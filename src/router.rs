//! Maps a connection's service tag to the persona that handles it.

use serde::Deserialize;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Services a caller can ask for when connecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Service {
    #[strum(to_string = "chat", serialize = "general")]
    Chat,
    #[strum(to_string = "coffee", serialize = "barista")]
    Coffee,
    #[strum(to_string = "wellness")]
    Wellness,
    #[strum(to_string = "sdr", serialize = "sales")]
    Sales,
}

impl Service {
    /// Parse a free-form tag, tolerating case and surrounding whitespace
    pub fn parse(tag: &str) -> Option<Self> {
        Service::from_str(tag.trim()).ok()
    }

    /// Canonical tags of every service, in menu order
    pub fn tags() -> Vec<String> {
        Service::iter().map(|service| service.to_string()).collect()
    }
}

/// Conversational profile active for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    /// No service chosen yet; asks the caller which one they want
    Receptionist,
    Chat,
    Barista,
    WellnessCompanion,
    /// Sales development rep qualifying a prospect
    SalesRep,
}

/// Which accumulator a persona fills in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Stateless,
    Order,
    Wellness,
    Lead,
}

impl Persona {
    pub fn state_kind(&self) -> StateKind {
        match self {
            Persona::Receptionist | Persona::Chat => StateKind::Stateless,
            Persona::Barista => StateKind::Order,
            Persona::WellnessCompanion => StateKind::Wellness,
            Persona::SalesRep => StateKind::Lead,
        }
    }

    pub fn service(&self) -> Option<Service> {
        match self {
            Persona::Receptionist => None,
            Persona::Chat => Some(Service::Chat),
            Persona::Barista => Some(Service::Coffee),
            Persona::WellnessCompanion => Some(Service::Wellness),
            Persona::SalesRep => Some(Service::Sales),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Persona::Receptionist => "receptionist",
            Persona::Chat => "chat",
            Persona::Barista => "barista",
            Persona::WellnessCompanion => "wellness companion",
            Persona::SalesRep => "sales representative",
        }
    }
}

impl From<Service> for Persona {
    fn from(service: Service) -> Self {
        match service {
            Service::Chat => Persona::Chat,
            Service::Coffee => Persona::Barista,
            Service::Wellness => Persona::WellnessCompanion,
            Service::Sales => Persona::SalesRep,
        }
    }
}

/// Pick the persona for a connection-time service tag
pub fn route(tag: Option<&str>) -> Persona {
    match tag.map(Service::parse) {
        Some(Some(service)) => {
            log::info!("🧭 Service selected: {}", service);
            Persona::from(service)
        }
        Some(None) => {
            log::warn!(
                "Unknown service tag {:?}, asking the caller to choose",
                tag.unwrap_or_default()
            );
            Persona::Receptionist
        }
        None => {
            log::info!("No service specified, asking the caller to choose");
            Persona::Receptionist
        }
    }
}

#[derive(Debug, Deserialize)]
struct RoomMetadata {
    service: Option<String>,
}

/// Pull the `service` tag out of room metadata JSON
pub fn service_from_metadata(metadata: &str) -> Option<String> {
    if metadata.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<RoomMetadata>(metadata) {
        Ok(parsed) => parsed.service.filter(|s| !s.trim().is_empty()),
        Err(e) => {
            log::warn!("Could not parse room metadata: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_table() {
        assert_eq!(route(Some("coffee")), Persona::Barista);
        assert_eq!(route(Some("wellness")), Persona::WellnessCompanion);
        assert_eq!(route(Some("chat")), Persona::Chat);
        assert_eq!(route(Some("sdr")), Persona::SalesRep);
        assert_eq!(route(Some("xyz")), Persona::Receptionist);
        assert_eq!(route(None), Persona::Receptionist);
    }

    #[test]
    fn test_state_kinds() {
        assert_eq!(route(Some("coffee")).state_kind(), StateKind::Order);
        assert_eq!(route(Some("wellness")).state_kind(), StateKind::Wellness);
        assert_eq!(route(Some("sales")).state_kind(), StateKind::Lead);
        assert_eq!(route(Some("xyz")).state_kind(), StateKind::Stateless);
    }

    #[test]
    fn test_tag_normalisation_and_aliases() {
        assert_eq!(route(Some("  Coffee ")), Persona::Barista);
        assert_eq!(route(Some("BARISTA")), Persona::Barista);
        assert_eq!(route(Some("general")), Persona::Chat);
    }

    #[test]
    fn test_every_service_round_trips_through_persona() {
        for service in Service::iter() {
            let persona = route(Some(&service.to_string()));
            assert_eq!(persona.service(), Some(service));
        }
    }

    #[test]
    fn test_service_tags() {
        assert_eq!(Service::tags(), vec!["chat", "coffee", "wellness", "sdr"]);
    }

    #[test]
    fn test_service_from_metadata() {
        assert_eq!(
            service_from_metadata(r#"{"service": "wellness", "room": "abc"}"#),
            Some("wellness".to_string())
        );
        assert_eq!(service_from_metadata(r#"{"room": "abc"}"#), None);
        assert_eq!(service_from_metadata(r#"{"service": ""}"#), None);
        assert_eq!(service_from_metadata("not json"), None);
        assert_eq!(service_from_metadata(""), None);
    }
}
