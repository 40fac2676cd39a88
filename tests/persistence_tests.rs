use nero_agent::config::StoreConfig;
use nero_agent::history::{self, FIRST_CHECKIN};
use nero_agent::router::{self, Persona, StateKind};
use nero_agent::session::{OrderRecord, OrderState, SessionState, WellnessState};
use nero_agent::{ConfirmOutcome, Conversation, RecordStore};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> RecordStore {
    RecordStore::new(StoreConfig::rooted_at(dir.path()))
}

#[test]
fn test_example_order_is_written_with_exact_fields() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut order = OrderState::new();
    order.update("drinkType", "Latte");
    order.update("size", "medium");
    order.update("milk", "oat");
    order.update("customerName", "Alex");
    assert!(order.is_complete());

    let record = order.to_record();
    let path = store.save_order(&record).unwrap();

    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("order_"));
    assert!(file_name.ends_with(".json"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let object = json.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(
        keys,
        vec!["drinkType", "extras", "milk", "name", "size", "timestamp"]
    );
    assert_eq!(json["drinkType"], "Latte");
    assert_eq!(json["size"], "medium");
    assert_eq!(json["milk"], "oat");
    assert_eq!(json["extras"], serde_json::json!([]));
    assert_eq!(json["name"], "Alex");
    assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
}

#[test]
fn test_two_orders_produce_two_files() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut first = OrderState::new();
    first.update("drinkType", "Americano");
    first.update("size", "large");
    first.update("name", "Robin");

    let mut second = OrderState::new();
    second.update("drinkType", "Macchiato");
    second.update("size", "small");
    second.update("name", "Noor");
    second.update("extras", "caramel syrup");

    let first_record = first.to_record();
    let second_record = second.to_record();
    let first_path = store.save_order(&first_record).unwrap();
    let second_path = store.save_order(&second_record).unwrap();

    assert_ne!(first_path.file_name(), second_path.file_name());

    let read = |path: &std::path::Path| -> OrderRecord {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    };
    assert_eq!(read(&first_path), first_record);
    assert_eq!(read(&second_path), second_record);
}

#[test]
fn test_wellness_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut state = WellnessState::new();
    state.update("mood", "hopeful");
    state.update("energyLevel", "medium");
    state.update("objectives", "write tests, water plants");
    state.update("selfCareIntentions", "walk at lunch");

    let entry = state.to_record();
    store.save_checkin(&entry).unwrap();

    assert_eq!(store.load_history().last(), Some(&entry));
    assert_eq!(store.load_last(), Some(entry));
}

#[test]
fn test_empty_store_has_no_history() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(store.load_history().is_empty());
    assert!(store.load_last().is_none());
    assert_eq!(history::build_context(store.load_last().as_ref(), 0), FIRST_CHECKIN);
    assert_eq!(history::context_from_store(&store), FIRST_CHECKIN);
}

#[test]
fn test_context_quotes_last_entry() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    for (mood, energy) in [("stressed", "low"), ("energised", "high")] {
        let mut state = WellnessState::new();
        state.update("mood", mood);
        state.update("energy", energy);
        state.update("objectives", "plan the week");
        store.save_checkin(&state.to_record()).unwrap();
    }

    let context = history::context_from_store(&store);
    assert!(context.contains("2 previous check-in(s)"));
    assert!(context.contains("energised"));
    assert!(context.contains("high"));
    assert!(!context.contains("stressed"));
}

#[test]
fn test_concurrent_checkins_are_not_lost() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(store_in(&dir));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                let mut state = WellnessState::new();
                state.update("mood", &format!("mood {}", i));
                state.update("energy", "medium");
                state.update("objectives", "breathe");
                store.save_checkin(&state.to_record()).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let history = store.load_history();
    assert_eq!(history.len(), 8);
    for i in 0..8 {
        let mood = format!("mood {}", i);
        assert!(history.iter().any(|e| e.mood.as_deref() == Some(mood.as_str())));
    }
}

#[test]
fn test_router_dispatch() {
    assert_eq!(router::route(Some("coffee")).state_kind(), StateKind::Order);
    assert_eq!(
        router::route(Some("wellness")).state_kind(),
        StateKind::Wellness
    );
    assert_eq!(router::route(Some("sdr")).state_kind(), StateKind::Lead);
    assert_eq!(router::route(Some("xyz")), Persona::Receptionist);
}

#[test]
fn test_conversation_survives_failed_save_and_retries() {
    let dir = TempDir::new().unwrap();
    let log_dir = dir.path().join("logs");
    fs::write(&log_dir, "blocking file").unwrap();

    let store = Arc::new(RecordStore::new(StoreConfig::new(
        dir.path().join("orders"),
        log_dir.join("wellness_log.json"),
    )));

    let mut conversation = Conversation::start(Some("wellness"), store.clone(), 20);
    conversation.update("mood", "calm");
    conversation.update("energy", "high");
    conversation.update("objectives", "read");

    let err = conversation.confirm().unwrap_err();
    assert!(err.is_persistence());
    assert!(conversation.is_complete());

    fs::remove_file(&log_dir).unwrap();
    let outcome = conversation.confirm().unwrap();
    assert!(matches!(outcome, ConfirmOutcome::Saved { .. }));
    assert_eq!(store.load_history().len(), 1);
}

#[test]
fn test_history_written_by_earlier_versions_survives_new_checkin() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::write(
        &store.config().wellness_log,
        r#"[{"mood": "hopeful", "energy_level": "Medium", "stress_factors": null,
             "objectives": ["apply for jobs", "walk"], "self_care_intentions": "tea",
             "timestamp": "2025-11-24T09:15:30.123456", "date": "2025-11-24",
             "agent_summary": "User feeling hopeful with Medium energy."}]"#,
    )
    .unwrap();

    assert_eq!(store.load_history().len(), 1);
    let context = history::context_from_store(&store);
    assert!(context.contains("Last check-in was on 2025-11-24."));
    assert!(context.contains("Last energy level: medium."));

    let mut conversation = Conversation::start(Some("wellness"), Arc::new(store), 20);
    conversation.update("mood", "steady");
    conversation.update("energy", "high");
    conversation.update("objectives", "interview prep");
    assert!(matches!(
        conversation.confirm().unwrap(),
        ConfirmOutcome::Saved { .. }
    ));

    let reread = store_in(&dir).load_history();
    assert_eq!(reread.len(), 2);
    assert_eq!(reread[0].mood.as_deref(), Some("hopeful"));
    assert_eq!(reread[1].mood.as_deref(), Some("steady"));
}

#[test]
fn test_sales_lead_lands_in_leads_dir() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(store_in(&dir));

    let mut conversation = Conversation::start(Some("sales"), store.clone(), 20);
    for (field, value) in [
        ("name", "Jordan Lee"),
        ("company", "Globex"),
        ("email", "jordan@globex.example"),
        ("role", "VP Engineering"),
        ("use_case", "support automation"),
    ] {
        assert!(conversation.update(field, value).is_applied());
    }

    let ConfirmOutcome::Saved { path, .. } = conversation.confirm().unwrap() else {
        panic!("expected the lead to be saved");
    };
    assert_eq!(path.parent().unwrap(), store.config().leads_dir.as_path());

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["company"], "Globex");
    assert_eq!(json["useCase"], "support automation");
}
