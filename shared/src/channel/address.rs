use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{channel::error::ChannelDescriptorError, Filter};

/// Identifies the root entity of an instance channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RootId {
    Int(i64),
    Str(String),
}

impl RootId {
    /// Inverse of `Display`. A root wrapped in double quotes is always a
    /// string, so string roots that look like integers keep their type.
    fn parse(text: &str) -> Self {
        if let Some(inner) = text
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
        {
            return RootId::Str(inner.to_string());
        }
        match text.parse::<i64>() {
            Ok(value) => RootId::Int(value),
            Err(_) => RootId::Str(text.to_string()),
        }
    }

    fn needs_quotes(text: &str) -> bool {
        text.is_empty() || text.starts_with('"') || text.parse::<i64>().is_ok()
    }
}

impl From<i64> for RootId {
    fn from(value: i64) -> Self {
        RootId::Int(value)
    }
}

impl From<&str> for RootId {
    fn from(value: &str) -> Self {
        RootId::Str(value.to_string())
    }
}

impl From<String> for RootId {
    fn from(value: String) -> Self {
        RootId::Str(value)
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootId::Int(value) => write!(f, "{}", value),
            RootId::Str(value) if RootId::needs_quotes(value) => write!(f, "\"{}\"", value),
            RootId::Str(value) => write!(f, "{}", value),
        }
    }
}

/// Address of a pub/sub topic: a channel id within the replicated system,
/// plus the root entity for instance channels.
///
/// Filters are deliberately not part of the address, so two requests for the
/// same channel with different filters share one identity. Ordering is by
/// channel id, then root id, which keeps every list put on the wire in a
/// deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelAddress {
    channel_id: u32,
    root_id: Option<RootId>,
}

impl ChannelAddress {
    pub fn new(channel_id: u32, root_id: Option<RootId>) -> Self {
        Self {
            channel_id,
            root_id,
        }
    }

    /// Address of a channel that spans every instance of its type
    pub fn type_channel(channel_id: u32) -> Self {
        Self::new(channel_id, None)
    }

    /// Address of a channel rooted at a single entity
    pub fn instance_channel<R: Into<RootId>>(channel_id: u32, root_id: R) -> Self {
        Self::new(channel_id, Some(root_id.into()))
    }

    pub fn channel_id(&self) -> u32 {
        self.channel_id
    }

    pub fn root_id(&self) -> Option<&RootId> {
        self.root_id.as_ref()
    }

    pub fn is_instance_channel(&self) -> bool {
        self.root_id.is_some()
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root_id {
            Some(root_id) => write!(f, "{}.{}", self.channel_id, root_id),
            None => write!(f, "{}", self.channel_id),
        }
    }
}

impl FromStr for ChannelAddress {
    type Err = ChannelDescriptorError;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        if descriptor.is_empty() {
            return Err(ChannelDescriptorError::Empty);
        }

        let (channel_part, root_part) = match descriptor.split_once('.') {
            Some((channel_part, root_part)) => (channel_part, Some(root_part)),
            None => (descriptor, None),
        };

        let channel_id = channel_part.parse::<u32>().map_err(|_| {
            ChannelDescriptorError::InvalidChannelId {
                descriptor: descriptor.to_string(),
            }
        })?;

        let root_id = match root_part {
            Some("") => {
                return Err(ChannelDescriptorError::EmptyRootId {
                    descriptor: descriptor.to_string(),
                })
            }
            Some(root_part) => Some(RootId::parse(root_part)),
            None => None,
        };

        Ok(Self::new(channel_id, root_id))
    }
}

impl Serialize for ChannelAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChannelAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let descriptor = String::deserialize(deserializer)?;
        descriptor.parse().map_err(serde::de::Error::custom)
    }
}

/// A channel address together with the filter an application asked for
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    address: ChannelAddress,
    filter: Option<Filter>,
}

impl Channel {
    pub fn new(address: ChannelAddress, filter: Option<Filter>) -> Self {
        Self { address, filter }
    }

    pub fn address(&self) -> &ChannelAddress {
        &self.address
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Replaces the filter, returning whether it changed
    pub fn replace_filter(&mut self, filter: Option<Filter>) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        true
    }

    pub fn into_parts(self) -> (ChannelAddress, Option<Filter>) {
        (self.address, self.filter)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{} Filter: {}", self.address, filter),
            None => write!(f, "{}", self.address),
        }
    }
}
