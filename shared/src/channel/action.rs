use std::fmt;

use crate::{channel::error::ChannelDescriptorError, ChannelAddress, Filter};

/// What happened to a channel, from the receiving session's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelActionType {
    Add,
    Remove,
    Update,
    /// The channel's root was deleted; the channel can never be subscribed again
    Delete,
}

impl ChannelActionType {
    /// Single character prefix used by compact wire descriptors
    pub fn code(&self) -> char {
        match self {
            ChannelActionType::Add => '+',
            ChannelActionType::Remove => '-',
            ChannelActionType::Update => '=',
            ChannelActionType::Delete => '!',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            '+' => Some(ChannelActionType::Add),
            '-' => Some(ChannelActionType::Remove),
            '=' => Some(ChannelActionType::Update),
            '!' => Some(ChannelActionType::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChannelActionType::Add => "ADD",
            ChannelActionType::Remove => "REMOVE",
            ChannelActionType::Update => "UPDATE",
            ChannelActionType::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelAction {
    address: ChannelAddress,
    action: ChannelActionType,
    filter: Option<Filter>,
}

impl ChannelAction {
    pub fn new(address: ChannelAddress, action: ChannelActionType, filter: Option<Filter>) -> Self {
        Self {
            address,
            action,
            filter,
        }
    }

    pub fn add(address: ChannelAddress, filter: Option<Filter>) -> Self {
        Self::new(address, ChannelActionType::Add, filter)
    }

    pub fn update(address: ChannelAddress, filter: Option<Filter>) -> Self {
        Self::new(address, ChannelActionType::Update, filter)
    }

    pub fn remove(address: ChannelAddress) -> Self {
        Self::new(address, ChannelActionType::Remove, None)
    }

    pub fn delete(address: ChannelAddress) -> Self {
        Self::new(address, ChannelActionType::Delete, None)
    }

    pub fn address(&self) -> &ChannelAddress {
        &self.address
    }

    pub fn action(&self) -> ChannelActionType {
        self.action
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Compact form, e.g. `=1.7`
    pub fn descriptor(&self) -> String {
        format!("{}{}", self.action.code(), self.address)
    }

    /// Parses a compact descriptor back into its action and address
    pub fn parse_descriptor(
        descriptor: &str,
    ) -> Result<(ChannelActionType, ChannelAddress), ChannelDescriptorError> {
        let mut chars = descriptor.chars();
        let Some(code) = chars.next() else {
            return Err(ChannelDescriptorError::Empty);
        };
        let Some(action) = ChannelActionType::from_code(code) else {
            return Err(ChannelDescriptorError::UnknownActionCode {
                descriptor: descriptor.to_string(),
                code,
            });
        };
        let address = chars.as_str().parse::<ChannelAddress>()?;

        Ok((action, address))
    }
}
