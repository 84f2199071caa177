//! Integration tests for sessions against the faked HMC.

use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use zhmc_core::{HmcClient, Operation, Properties, ResourceClass, CONSOLE_URI};
use zhmc_session::{parse_hmc_host, FakedHmc, HmcAuth, HmcDefinition, SessionFactory};

fn props(value: serde_json::Value) -> Properties {
    value.as_object().unwrap().clone()
}

#[test]
fn test_faked_session_round_trip() {
    let hmc = Arc::new(FakedHmc::new());
    let factory = SessionFactory::faked(hmc.clone());
    assert!(factory.is_faked());

    let hosts = parse_hmc_host(&json!("10.11.12.13")).unwrap();
    let session = factory.open(&hosts, &HmcAuth::default()).unwrap();
    let client = session.client();

    let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
    let part = client
        .create(
            ResourceClass::Partition,
            Some(&cpc),
            &props(json!({"name": "p1", "boot-device": "ftp"})),
        )
        .unwrap();
    client.invoke(&part.uri, &Operation::StartPartition).unwrap();
    assert_eq!(
        client.get(&part.uri).unwrap().str_prop("status"),
        Some("active")
    );

    session.close().unwrap();
    assert_eq!(hmc.logoff_count(), 0);
    assert_eq!(hmc.mutations().len(), 2);
}

#[test]
fn test_os_messages_reach_other_threads() {
    let hmc = Arc::new(FakedHmc::new());
    let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
    let part = hmc
        .add(ResourceClass::Partition, Some(&cpc), props(json!({"name": "p1"})))
        .unwrap();
    hmc.set_os_command_response(&part, vec!["ok".into()]);

    let mut receiver = hmc.open_os_message_channel(&part).unwrap();
    let reader = thread::spawn(move || {
        let mut texts = Vec::new();
        while let Ok(Some(batch)) = receiver.receive(Duration::from_millis(500)) {
            texts.extend(batch);
        }
        texts
    });

    hmc.invoke(
        &part,
        &Operation::SendOsCommand {
            command: "date".into(),
            is_priority: true,
        },
    )
    .unwrap();

    assert_eq!(reader.join().unwrap(), vec!["date", "ok"]);
}

#[test]
fn test_definition_console_override() {
    let def = HmcDefinition::from_json(
        r#"{"console": {"ec-mcl-description": {}}, "api_version": {"api-major-version": 3}}"#,
    )
    .unwrap();
    let hmc = FakedHmc::from_definition(&def).unwrap();
    let console = hmc.get(CONSOLE_URI).unwrap();
    assert_eq!(console.prop("ec-mcl-description"), Some(&json!({})));
    assert_eq!(hmc.query_api_version().unwrap()["api-major-version"], 3);
}
