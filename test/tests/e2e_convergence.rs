/// End-to-end convergence between a client context and a session manager
///
/// Requests travel as encoded text through the session manager and every
/// reply and packet travels back the same way.

use serde_json::json;

use replicant_client::{shared::Filter, AreaOfInterestStatus};
use replicant_test::{
    address, assert_area_status, assert_not_subscribed, assert_subscribed,
    converge_and_exchange, exchange_packets, hidden, person, TestClient, TestServer, FILTERED,
    PERSON_TYPE,
};
use replicant_shared::ChannelAddress;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn subscribe_loads_channel_and_its_links() {
    init_logging();
    let server = TestServer::new();
    server.loader().add_person(1, "ann");
    let mut client = TestClient::new();
    let key = server.connect(&mut client);

    client.declare(&person(1), None);
    converge_and_exchange(&server, &mut client).unwrap();

    assert_area_status!(client, person(1), AreaOfInterestStatus::Loaded);
    assert_subscribed!(server, &key, person(1));
    assert_subscribed!(server, &key, address(1));

    let implicit = client.converger().subscriptions().find(&address(1)).unwrap();
    assert!(!implicit.is_explicit_subscription());
    let types: Vec<u32> = client
        .entity_changes()
        .iter()
        .map(|change| change.key().type_id())
        .collect();
    assert!(types.contains(&PERSON_TYPE));
    assert_eq!(client.connection().pending_request_count(), 0);
}

#[test]
fn release_unsubscribes_with_cascade() {
    init_logging();
    let server = TestServer::new();
    server.loader().add_person(1, "ann");
    let mut client = TestClient::new();
    let key = server.connect(&mut client);
    client.declare(&person(1), None);
    converge_and_exchange(&server, &mut client).unwrap();

    client.release(&person(1));
    converge_and_exchange(&server, &mut client).unwrap();

    assert!(!client.converger().areas().contains(&person(1)));
    assert_not_subscribed!(server, &key, person(1));
    assert_not_subscribed!(server, &key, address(1));
    assert!(client.converger().subscriptions().is_empty());
}

#[test]
fn grouped_instances_arrive_in_one_request() {
    init_logging();
    let server = TestServer::new();
    for id in [1, 2, 3] {
        server.loader().add_person(id, "p");
    }
    let mut client = TestClient::new();
    let key = server.connect(&mut client);

    client.converger_mut().pause_and_run(|converger| {
        for id in [1, 2, 3] {
            converger.add_area_of_interest(&person(id), None);
        }
    });
    client.converger_mut().converge();

    let outgoing = client.connection_mut().take_outgoing();
    assert_eq!(outgoing.len(), 1);
    assert!(outgoing[0].starts_with(r#"{"type":"bulk-sub""#));

    for text in &outgoing {
        server.manager().process_message(&key, text);
    }
    for id in [1, 2, 3] {
        assert_subscribed!(server, &key, person(id));
        assert_subscribed!(server, &key, address(id));
    }
}

#[test]
fn converging_twice_sends_nothing_new() {
    init_logging();
    let server = TestServer::new();
    server.loader().add_person(1, "ann");
    let mut client = TestClient::new();
    server.connect(&mut client);
    client.declare(&person(1), None);
    converge_and_exchange(&server, &mut client).unwrap();

    client.converger_mut().converge();
    client.converger_mut().converge();

    assert!(client.connection_mut().take_outgoing().is_empty());
}

#[test]
fn filter_change_updates_live_subscription() {
    init_logging();
    let server = TestServer::new();
    let mut client = TestClient::new();
    let key = server.connect(&mut client);
    let channel = ChannelAddress::instance_channel(FILTERED, 7);

    client.declare(&channel, Some(Filter::new(json!({"k": "a"}))));
    converge_and_exchange(&server, &mut client).unwrap();
    assert_area_status!(client, channel, AreaOfInterestStatus::Loaded);

    client.declare(&channel, Some(Filter::new(json!({"k": "b"}))));
    converge_and_exchange(&server, &mut client).unwrap();

    assert_area_status!(client, channel, AreaOfInterestStatus::Updated);
    let entry = server
        .manager()
        .session(&key)
        .unwrap()
        .subscription_entry(&channel)
        .unwrap();
    assert_eq!(entry.filter(), Some(&Filter::new(json!({"k": "b"}))));
}

#[test]
fn rejected_subscribe_fails_area() {
    init_logging();
    let server = TestServer::new();
    let mut client = TestClient::new();
    let key = server.connect(&mut client);

    client.declare(&hidden(), None);
    converge_and_exchange(&server, &mut client).unwrap();

    assert_area_status!(client, hidden(), AreaOfInterestStatus::LoadFailed);
    let area = client.converger().areas().find(&hidden()).unwrap();
    assert_eq!(area.error().unwrap().address, hidden());
    assert_not_subscribed!(server, &key, hidden());
}

#[test]
fn two_clients_stay_isolated() {
    init_logging();
    let server = TestServer::new();
    server.loader().add_person(1, "ann");
    server.loader().add_person(2, "bob");
    let mut first = TestClient::new();
    let mut second = TestClient::new();
    let first_key = server.connect(&mut first);
    let second_key = server.connect(&mut second);

    first.declare(&person(1), None);
    second.declare(&person(2), None);
    converge_and_exchange(&server, &mut first).unwrap();
    converge_and_exchange(&server, &mut second).unwrap();

    assert_subscribed!(server, &first_key, person(1));
    assert_not_subscribed!(server, &first_key, person(2));
    assert_subscribed!(server, &second_key, person(2));
    assert_not_subscribed!(server, &second_key, person(1));
}

#[test]
fn reconnect_resubscribes_in_the_new_session() {
    init_logging();
    let server = TestServer::new();
    server.loader().add_person(1, "ann");
    let mut client = TestClient::new();
    let old_key = server.connect(&mut client);
    client.declare(&person(1), None);
    converge_and_exchange(&server, &mut client).unwrap();
    assert_area_status!(client, person(1), AreaOfInterestStatus::Loaded);

    server.manager().invalidate_session(&old_key).unwrap();
    let new_key = server.connect(&mut client);
    exchange_packets(&server, &mut client).unwrap();

    assert_area_status!(client, person(1), AreaOfInterestStatus::NotAsked);
    assert!(client.converger().subscriptions().is_empty());

    converge_and_exchange(&server, &mut client).unwrap();

    assert_area_status!(client, person(1), AreaOfInterestStatus::Loaded);
    assert_subscribed!(server, &new_key, person(1));
    assert_subscribed!(server, &new_key, address(1));
    assert!(client
        .converger()
        .subscriptions()
        .find(&person(1))
        .unwrap()
        .is_explicit_subscription());
}
