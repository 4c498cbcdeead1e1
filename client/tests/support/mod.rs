#![allow(dead_code)]

use std::time::Duration;

use replicant_client::{
    shared::{ChannelAction, ChannelActionType, ChannelAddress, Filter},
    ClientConfig, Connector, ConnectorError, ConnectorEvent, ContextConverger,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Subscribe(ChannelAddress, Option<Filter>),
    BulkSubscribe(Vec<ChannelAddress>, Option<Filter>),
    Update(ChannelAddress, Option<Filter>),
    Unsubscribe(ChannelAddress),
    BulkUnsubscribe(Vec<ChannelAddress>),
}

/// Records requests instead of sending them; outcomes are scripted by the
/// test
pub struct RecordingConnector {
    pub connected: bool,
    pub refuse_with: Option<ConnectorError>,
    requests: Vec<Request>,
    events: Vec<ConnectorEvent>,
}

impl RecordingConnector {
    pub fn new() -> Self {
        Self {
            connected: true,
            refuse_with: None,
            requests: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn take_requests(&mut self) -> Vec<Request> {
        std::mem::take(&mut self.requests)
    }

    pub fn complete(
        &mut self,
        address: &ChannelAddress,
        action: ChannelActionType,
        filter: Option<Filter>,
    ) {
        self.events.push(ConnectorEvent::Completed {
            address: address.clone(),
            action,
            filter,
        });
    }

    pub fn fail(&mut self, address: &ChannelAddress, action: ChannelActionType, message: &str) {
        self.events.push(ConnectorEvent::Failed {
            address: address.clone(),
            action,
            error: ConnectorError::Rejected {
                message: message.to_string(),
            },
        });
    }

    pub fn channel_actions(&mut self, actions: Vec<ChannelAction>) {
        self.events.push(ConnectorEvent::ChannelActions(actions));
    }

    pub fn reset_session(&mut self) {
        self.events.push(ConnectorEvent::SessionReset);
    }

    fn record(&mut self, request: Request) -> Result<(), ConnectorError> {
        if let Some(error) = &self.refuse_with {
            return Err(error.clone());
        }
        self.requests.push(request);
        Ok(())
    }
}

impl Connector for RecordingConnector {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn request_subscribe(
        &mut self,
        address: &ChannelAddress,
        filter: Option<&Filter>,
    ) -> Result<(), ConnectorError> {
        self.record(Request::Subscribe(address.clone(), filter.cloned()))
    }

    fn request_bulk_subscribe(
        &mut self,
        addresses: &[ChannelAddress],
        filter: Option<&Filter>,
    ) -> Result<(), ConnectorError> {
        self.record(Request::BulkSubscribe(addresses.to_vec(), filter.cloned()))
    }

    fn request_subscription_update(
        &mut self,
        address: &ChannelAddress,
        filter: Option<&Filter>,
    ) -> Result<(), ConnectorError> {
        self.record(Request::Update(address.clone(), filter.cloned()))
    }

    fn request_unsubscribe(&mut self, address: &ChannelAddress) -> Result<(), ConnectorError> {
        self.record(Request::Unsubscribe(address.clone()))
    }

    fn request_bulk_unsubscribe(
        &mut self,
        addresses: &[ChannelAddress],
    ) -> Result<(), ConnectorError> {
        self.record(Request::BulkUnsubscribe(addresses.to_vec()))
    }

    fn drain_events(&mut self) -> Vec<ConnectorEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Active converger whose timer never rings during a test
pub fn converger() -> ContextConverger<RecordingConnector> {
    converger_with(ClientConfig {
        converge_interval: Duration::from_secs(3600),
        ..ClientConfig::default()
    })
}

pub fn converger_with(config: ClientConfig) -> ContextConverger<RecordingConnector> {
    let mut converger = ContextConverger::new(RecordingConnector::new(), config);
    converger.activate();
    converger
}

pub fn instance(channel_id: u32, root_id: i64) -> ChannelAddress {
    ChannelAddress::instance_channel(channel_id, root_id)
}

/// Declares `address` and drives it to LOADED
pub fn load(
    converger: &mut ContextConverger<RecordingConnector>,
    address: &ChannelAddress,
    filter: Option<Filter>,
) {
    converger.add_area_of_interest(address, filter.clone());
    converger.converge();
    converger.connector_mut().take_requests();
    converger
        .connector_mut()
        .complete(address, ChannelActionType::Add, filter);
    converger.update();
}
