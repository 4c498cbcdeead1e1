/// PROPERTY-BASED TESTS: packet ordering
///
/// Packets may reach a client in any order; they must be applied in
/// sequence and a request may only complete once every packet up to the
/// one carrying its id has been applied.

use proptest::prelude::*;

use replicant_client::{Connection, Connector, ConnectorEvent};
use replicant_shared::{
    encode_packet, Change, ChangeSet, ChannelAddress, EntityKey, Packet, PacketQueue,
    ServerMessage,
};

fn shuffled_sequences(max: u64) -> impl Strategy<Value = Vec<u64>> {
    (1..=max).prop_flat_map(|n| Just((1..=n).collect::<Vec<u64>>()).prop_shuffle())
}

fn packet_for(sequence: u64, request_id: Option<&str>) -> Packet {
    let mut change_set = ChangeSet::new();
    change_set.merge_change(Change::delete(EntityKey::new(1, sequence as i64)));
    Packet::new(
        sequence,
        request_id.map(str::to_string),
        None,
        None,
        change_set,
    )
}

fn connected() -> Connection {
    let mut connection = Connection::new();
    connection
        .receive(ServerMessage::SessionCreated {
            session_id: "s".to_string(),
        })
        .unwrap();
    connection
}

proptest! {
    /// Whatever the insertion order, the queue hands out 1..n in order
    #[test]
    fn prop_queue_delivers_in_sequence(order in shuffled_sequences(24)) {
        let mut queue = PacketQueue::new();
        for sequence in &order {
            queue.insert_packet(packet_for(*sequence, None));
        }

        let mut delivered = Vec::new();
        while let Some(packet) = queue.next_packet_to_process() {
            let sequence = packet.sequence();
            delivered.push(sequence);
            queue.ack(sequence);
        }

        prop_assert_eq!(delivered, (1..=order.len() as u64).collect::<Vec<_>>());
        prop_assert!(queue.is_empty());
    }

    /// A connection applies entity changes in sequence order whatever the
    /// arrival order
    #[test]
    fn prop_connection_applies_in_sequence(order in shuffled_sequences(16)) {
        let mut connection = connected();
        for sequence in &order {
            connection.receive(encode_packet(&packet_for(*sequence, None))).unwrap();
        }

        let applied: Vec<i64> = connection
            .take_entity_changes()
            .iter()
            .map(|change| change.key().entity_id())
            .collect();
        prop_assert_eq!(applied, (1..=order.len() as i64).collect::<Vec<_>>());
        prop_assert_eq!(connection.last_sequence_acked(), order.len() as u64);
    }

    /// The request completes exactly when its packet and everything before
    /// it has been applied, whether its `ok` arrives early or late
    #[test]
    fn prop_completion_waits_for_preceding_packets(
        order in shuffled_sequences(8),
        ok_position in 0usize..9,
    ) {
        let mut connection = connected();
        let address = ChannelAddress::type_channel(1);
        connection.request_unsubscribe(&address).unwrap();
        let carrier = order.len() as u64;

        let ok_position = ok_position.min(order.len());
        let mut completed_at = None;
        for (index, sequence) in order.iter().enumerate() {
            if index == ok_position {
                connection.receive(ServerMessage::Ok { request_id: "1".to_string() }).unwrap();
            }
            let request_id = (*sequence == carrier).then_some("1");
            connection.receive(encode_packet(&packet_for(*sequence, request_id))).unwrap();

            let completed = connection
                .drain_events()
                .iter()
                .any(|event| matches!(event, ConnectorEvent::Completed { .. }));
            if completed {
                completed_at = Some(index);
            }
        }
        if ok_position == order.len() {
            connection.receive(ServerMessage::Ok { request_id: "1".to_string() }).unwrap();
            let completed = connection
                .drain_events()
                .iter()
                .any(|event| matches!(event, ConnectorEvent::Completed { .. }));
            if completed {
                completed_at = Some(order.len());
            }
        }

        // all packets are in by the last index, so completion happens at the
        // later of the last packet and the ok
        let expected = (order.len() - 1).max(ok_position);
        prop_assert_eq!(completed_at, Some(expected));
        prop_assert_eq!(connection.pending_request_count(), 0);
    }
}
