use replicant_shared::{ChannelAction, ChannelActionType, ChannelAddress, Filter};

use crate::ConnectorError;

/// Outcome of a request, reported once the server has answered it and every
/// packet belonging to it has been applied
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectorEvent {
    Completed {
        address: ChannelAddress,
        action: ChannelActionType,
        filter: Option<Filter>,
    },
    Failed {
        address: ChannelAddress,
        action: ChannelActionType,
        error: ConnectorError,
    },
    /// Channel actions of a processed packet, in packet order
    ChannelActions(Vec<ChannelAction>),
    /// The server started a new session. Nothing subscribed before is
    /// subscribed any more.
    SessionReset,
}

/// Issues subscription requests to a server. Requests are asynchronous:
/// their outcome arrives later through `drain_events`.
pub trait Connector {
    fn is_connected(&self) -> bool;

    fn request_subscribe(
        &mut self,
        address: &ChannelAddress,
        filter: Option<&Filter>,
    ) -> Result<(), ConnectorError>;

    /// Subscribes several instances of one channel sharing a filter
    fn request_bulk_subscribe(
        &mut self,
        addresses: &[ChannelAddress],
        filter: Option<&Filter>,
    ) -> Result<(), ConnectorError> {
        for address in addresses {
            self.request_subscribe(address, filter)?;
        }
        Ok(())
    }

    fn request_subscription_update(
        &mut self,
        address: &ChannelAddress,
        filter: Option<&Filter>,
    ) -> Result<(), ConnectorError>;

    fn request_unsubscribe(&mut self, address: &ChannelAddress) -> Result<(), ConnectorError>;

    fn request_bulk_unsubscribe(
        &mut self,
        addresses: &[ChannelAddress],
    ) -> Result<(), ConnectorError> {
        for address in addresses {
            self.request_unsubscribe(address)?;
        }
        Ok(())
    }

    fn drain_events(&mut self) -> Vec<ConnectorEvent>;
}
