use log::trace;
use serde_json::Value;

use crate::{ChangeSet, ETag, Packet, PacketSequence, RequestId};

/// Ordered, acknowledged buffer of packets for a single session.
///
/// Packets stay buffered until acknowledged. Only the packet directly
/// following the last acknowledged sequence is ever handed out, so a
/// receiver never observes packet N+2 before N+1 has been applied.
pub struct PacketQueue {
    packets: Vec<Packet>,
    next_sequence: PacketSequence,
    last_sequence_acked: PacketSequence,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self {
            packets: Vec::new(),
            next_sequence: 1,
            last_sequence_acked: 0,
        }
    }

    /// Creates the next packet in sequence and buffers it
    pub fn add_packet(
        &mut self,
        request_id: Option<RequestId>,
        etag: Option<ETag>,
        response: Option<Value>,
        change_set: ChangeSet,
    ) -> Packet {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let packet = Packet::new(sequence, request_id, etag, response, change_set);
        trace!("queued packet {}", sequence);
        self.packets.push(packet.clone());
        self.sort();

        packet
    }

    /// Buffers a packet that was sequenced elsewhere, e.g. one received from
    /// the remote end. Packets already acknowledged are dropped; a packet
    /// with a sequence that is already buffered replaces it.
    pub fn insert_packet(&mut self, packet: Packet) {
        let sequence = packet.sequence();
        if sequence <= self.last_sequence_acked {
            trace!("dropping already acked packet {}", sequence);
            return;
        }

        if sequence >= self.next_sequence {
            self.next_sequence = sequence + 1;
        }

        match self
            .packets
            .binary_search_by_key(&sequence, |existing| existing.sequence())
        {
            Ok(index) => self.packets[index] = packet,
            Err(index) => self.packets.insert(index, packet),
        }
    }

    /// Drops every buffered packet up to and including `sequence`.
    /// Acking the same or an older sequence again changes nothing.
    pub fn ack(&mut self, sequence: PacketSequence) {
        self.packets.retain(|packet| packet.sequence() > sequence);
        if sequence > self.last_sequence_acked {
            trace!("acked packets up to {}", sequence);
            self.last_sequence_acked = sequence;
        }
    }

    /// The head packet, but only if it directly follows the last ack
    pub fn next_packet_to_process(&self) -> Option<&Packet> {
        let packet = self.packets.first()?;
        if packet.sequence() == self.last_sequence_acked + 1 {
            Some(packet)
        } else {
            None
        }
    }

    pub fn get_packet(&self, sequence: PacketSequence) -> Option<&Packet> {
        self.packets
            .binary_search_by_key(&sequence, |packet| packet.sequence())
            .ok()
            .map(|index| &self.packets[index])
    }

    pub fn last_sequence_acked(&self) -> PacketSequence {
        self.last_sequence_acked
    }

    pub fn size(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Packet> {
        self.packets.iter()
    }

    pub fn clear(&mut self) {
        self.packets.clear();
    }

    fn sort(&mut self) {
        self.packets.sort_by_key(|packet| packet.sequence());
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}
