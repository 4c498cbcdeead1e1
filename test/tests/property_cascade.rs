/// PROPERTY-BASED TESTS: cascading unsubscribe
///
/// Implicit subscriptions live exactly as long as some explicitly
/// subscribed channel still links to them.

use std::collections::BTreeSet;

use proptest::prelude::*;

use replicant_server::{ChannelContent, ChannelLink};
use replicant_test::{address, person, TestServer};

proptest! {
    #[test]
    fn prop_implicit_entries_follow_their_sources(
        people in prop::collection::btree_set(1i64..16, 1..8),
        dropped in prop::collection::btree_set(1i64..16, 0..8),
        shared_addresses in 1i64..4,
    ) {
        let server = TestServer::new();
        for id in &people {
            server.loader().set_content(
                person(*id),
                ChannelContent::new()
                    .with_link(ChannelLink::new(person(*id), address(id % shared_addresses))),
            );
        }
        let manager = server.manager();
        let session = manager.create_session();
        let key = session.key().clone();

        for id in &people {
            manager.subscribe(&key, "s", &person(*id), None).unwrap();
        }
        for id in people.intersection(&dropped) {
            manager.unsubscribe(&key, "u", &person(*id)).unwrap();
        }

        let remaining: BTreeSet<i64> = people.difference(&dropped).cloned().collect();
        let linked: BTreeSet<i64> = remaining.iter().map(|id| id % shared_addresses).collect();
        for id in &people {
            prop_assert_eq!(session.is_subscribed(&person(*id)), remaining.contains(id));
        }
        for target in 0..shared_addresses {
            prop_assert_eq!(session.is_subscribed(&address(target)), linked.contains(&target));
        }
        prop_assert_eq!(
            session.subscription_entries().len(),
            remaining.len() + linked.len()
        );
    }
}
