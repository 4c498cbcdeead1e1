use replicant_shared::{Change, Channel, ChannelAddress, ETag, Filter};

use crate::{ChannelLink, EntityMessage};

/// What a channel holds at the moment a session subscribes to it
#[derive(Debug, Clone, Default)]
pub struct ChannelContent {
    /// Current state of every entity in the channel
    pub changes: Vec<Change>,
    /// Channels a subscriber of this channel must also receive
    pub links: Vec<ChannelLink>,
    /// Cache token for channels with an internal cache
    pub etag: Option<ETag>,
}

impl ChannelContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_change(mut self, change: Change) -> Self {
        self.changes.push(change);
        self
    }

    pub fn with_link(mut self, link: ChannelLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_etag(mut self, etag: &str) -> Self {
        self.etag = Some(etag.to_string());
        self
    }
}

/// Application seam through which the server reads channel content. The
/// server never knows how entities are persisted.
pub trait ChannelLoader: Send + Sync {
    /// Loads the whole content of `channel`. An `Err` carries the reason the
    /// channel cannot be subscribed.
    fn load(&self, channel: &Channel) -> Result<ChannelContent, String>;

    /// Loads content after a subscription's filter changed from `previous`
    fn load_update(
        &self,
        address: &ChannelAddress,
        previous: Option<&Filter>,
        filter: Option<&Filter>,
    ) -> Result<ChannelContent, String> {
        let _ = previous;
        self.load(&Channel::new(address.clone(), filter.cloned()))
    }

    /// Whether a committed entity change passes the filter of `channel`
    fn accepts_entity(&self, channel: &Channel, message: &EntityMessage) -> bool {
        let _ = (channel, message);
        true
    }
}
