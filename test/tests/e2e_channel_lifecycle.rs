/// End-to-end behavior of channels changing underneath live subscriptions:
/// pushed entity changes, deleted instance roots and cached content.

use replicant_client::AreaOfInterestStatus;
use replicant_server::shared::ServerMessage;
use replicant_test::{
    address, assert_area_status, assert_not_subscribed, catalog, converge_and_exchange,
    exchange_packets, person, person_delete, person_update, TestClient, TestServer,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn loaded_client(server: &TestServer, ids: &[i64]) -> TestClient {
    let mut client = TestClient::new();
    server.connect(&mut client);
    for id in ids {
        server.loader().add_person(*id, "p");
        client.declare(&person(*id), None);
    }
    converge_and_exchange(server, &mut client).unwrap();
    client.clear_entity_changes();
    client
}

#[test]
fn committed_change_reaches_subscriber() {
    init_logging();
    let server = TestServer::new();
    let mut subscriber = loaded_client(&server, &[1]);
    let mut bystander = loaded_client(&server, &[2]);

    server.commit(vec![person_update(1, "renamed")]).unwrap();
    exchange_packets(&server, &mut subscriber).unwrap();
    exchange_packets(&server, &mut bystander).unwrap();

    let change = &subscriber.entity_changes()[0];
    assert_eq!(change.attribute_values().unwrap()["name"], "renamed");
    assert!(change.channels().contains(&person(1)));
    assert!(bystander.entity_changes().is_empty());
}

#[test]
fn deleted_root_unloads_area_for_good() {
    init_logging();
    let server = TestServer::new();
    let mut client = loaded_client(&server, &[1]);
    let key = client.session().cloned().unwrap();

    server.commit(vec![person_delete(1)]).unwrap();
    exchange_packets(&server, &mut client).unwrap();

    assert_area_status!(client, person(1), AreaOfInterestStatus::Unloaded);
    assert!(client.converger().subscriptions().is_deleted(&person(1)));
    assert_not_subscribed!(server, &key, person(1));
    assert_not_subscribed!(server, &key, address(1));
    assert!(server.manager().is_instance_deleted(&person(1)));

    converge_and_exchange(&server, &mut client).unwrap();
    assert!(client.connection_mut().take_outgoing().is_empty());
    assert_area_status!(client, person(1), AreaOfInterestStatus::Unloaded);
}

#[test]
fn cached_channel_is_not_sent_again() {
    init_logging();
    let server = TestServer::new();
    server.loader().set_catalog("v1", &["hammer", "saw"]);
    let mut client = TestClient::new();
    server.connect(&mut client);

    client.declare(&catalog(), None);
    converge_and_exchange(&server, &mut client).unwrap();
    assert_eq!(client.entity_changes().len(), 2);
    assert_eq!(client.connection().cached_etag(&catalog()), Some("v1"));

    client.release(&catalog());
    converge_and_exchange(&server, &mut client).unwrap();
    client.connection_mut().send_etags().unwrap();
    exchange_packets(&server, &mut client).unwrap();
    client.clear_entity_changes();

    client.declare(&catalog(), None);
    let sequence_before = client.connection().last_sequence_acked();
    converge_and_exchange(&server, &mut client).unwrap();

    assert_area_status!(client, catalog(), AreaOfInterestStatus::Loaded);
    assert_eq!(client.connection().last_sequence_acked(), sequence_before);
    // replayed from the client cache
    assert_eq!(client.entity_changes().len(), 2);
}

#[test]
fn stale_cache_is_replaced() {
    init_logging();
    let server = TestServer::new();
    server.loader().set_catalog("v1", &["hammer"]);
    let mut client = TestClient::new();
    server.connect(&mut client);
    client.declare(&catalog(), None);
    converge_and_exchange(&server, &mut client).unwrap();
    client.release(&catalog());
    converge_and_exchange(&server, &mut client).unwrap();
    client.connection_mut().send_etags().unwrap();
    exchange_packets(&server, &mut client).unwrap();

    server.loader().set_catalog("v2", &["hammer", "saw", "drill"]);
    client.clear_entity_changes();
    client.declare(&catalog(), None);
    converge_and_exchange(&server, &mut client).unwrap();

    assert_area_status!(client, catalog(), AreaOfInterestStatus::Loaded);
    assert_eq!(client.entity_changes().len(), 3);
    assert_eq!(client.connection().cached_etag(&catalog()), Some("v2"));
}

#[test]
fn invalidated_session_answers_with_errors() {
    init_logging();
    let server = TestServer::new();
    let mut client = loaded_client(&server, &[1]);
    let key = client.session().cloned().unwrap();

    server.manager().invalidate_session(&key).unwrap();
    client.release(&person(1));
    client.converger_mut().converge();
    for text in client.connection_mut().take_outgoing() {
        let reply = server.manager().process_message(&key, &text);
        assert!(matches!(
            reply,
            ServerMessage::Error {
                request_id: None,
                ..
            }
        ));
        client.connection_mut().receive(reply).unwrap();
    }
    assert!(exchange_packets(&server, &mut client).is_err());

    // an unknown session cannot correlate the request
    assert_area_status!(client, person(1), AreaOfInterestStatus::Unloading);
    assert_eq!(client.connection().pending_request_count(), 1);

    client.connection_mut().disconnect();
    client.converger_mut().update();
    assert_area_status!(client, person(1), AreaOfInterestStatus::Loaded);
    assert!(client
        .converger()
        .areas()
        .find(&person(1))
        .and_then(|area| area.error())
        .is_some());
}
