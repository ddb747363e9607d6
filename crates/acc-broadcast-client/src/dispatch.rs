//! Delivery of decoded messages to the application.

use acc_broadcast_protocol::{
    BroadcastingEvent, EntryList, EntryListCar, InboundMessage, RealtimeCarUpdate,
    RealtimeUpdate, RegistrationResult, TrackData,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::trace;

/// Application callbacks, one per message type.
///
/// Every method defaults to a no-op, so a handler only implements what it
/// cares about. Calls happen on the client's read loop; a handler that blocks
/// delays every later message and can make the connection look dead.
pub trait BroadcastHandler: Send {
    /// Registration accepted.
    fn on_connected(&mut self, _result: &RegistrationResult) {}

    /// A registered session ended, by request or by failure.
    fn on_disconnected(&mut self) {}

    fn on_realtime_update(&mut self, _update: &RealtimeUpdate) {}

    /// Only called for cars whose entry-list metadata has been received.
    fn on_realtime_car_update(&mut self, _update: &RealtimeCarUpdate) {}

    fn on_entry_list(&mut self, _list: &EntryList) {}

    fn on_entry_list_car(&mut self, _car: &EntryListCar) {}

    fn on_track_data(&mut self, _track: &TrackData) {}

    fn on_broadcasting_event(&mut self, _event: &BroadcastingEvent) {}
}

/// Handler that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl BroadcastHandler for NoopHandler {}

/// Routes inbound messages to a [`BroadcastHandler`].
#[derive(Debug)]
pub struct Dispatcher<H> {
    handler: H,
}

impl<H: BroadcastHandler> Dispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Deliver one message synchronously.
    ///
    /// A registration result is delivered through
    /// [`BroadcastHandler::on_connected`] only when it succeeded.
    pub fn dispatch(&mut self, message: &InboundMessage) {
        trace!(message_type = %message.kind(), "dispatching");
        match message {
            InboundMessage::RegistrationResult(result) => {
                if result.success {
                    self.handler.on_connected(result);
                }
            }
            InboundMessage::RealtimeUpdate(update) => self.handler.on_realtime_update(update),
            InboundMessage::RealtimeCarUpdate(update) => {
                self.handler.on_realtime_car_update(update);
            }
            InboundMessage::EntryList(list) => self.handler.on_entry_list(list),
            InboundMessage::EntryListCar(car) => self.handler.on_entry_list_car(car),
            InboundMessage::TrackData(track) => self.handler.on_track_data(track),
            InboundMessage::BroadcastingEvent(event) => self.handler.on_broadcasting_event(event),
        }
    }

    pub fn disconnected(&mut self) {
        self.handler.on_disconnected();
    }
}

/// Everything a handler can observe, as a single value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Connected(RegistrationResult),
    Disconnected,
    RealtimeUpdate(RealtimeUpdate),
    RealtimeCarUpdate(RealtimeCarUpdate),
    EntryList(EntryList),
    EntryListCar(EntryListCar),
    TrackData(TrackData),
    BroadcastingEvent(BroadcastingEvent),
}

/// Forwards every callback into a channel. A closed receiver drops events.
impl BroadcastHandler for mpsc::UnboundedSender<ClientEvent> {
    fn on_connected(&mut self, result: &RegistrationResult) {
        forward(self, ClientEvent::Connected(result.clone()));
    }

    fn on_disconnected(&mut self) {
        forward(self, ClientEvent::Disconnected);
    }

    fn on_realtime_update(&mut self, update: &RealtimeUpdate) {
        forward(self, ClientEvent::RealtimeUpdate(update.clone()));
    }

    fn on_realtime_car_update(&mut self, update: &RealtimeCarUpdate) {
        forward(self, ClientEvent::RealtimeCarUpdate(update.clone()));
    }

    fn on_entry_list(&mut self, list: &EntryList) {
        forward(self, ClientEvent::EntryList(list.clone()));
    }

    fn on_entry_list_car(&mut self, car: &EntryListCar) {
        forward(self, ClientEvent::EntryListCar(car.clone()));
    }

    fn on_track_data(&mut self, track: &TrackData) {
        forward(self, ClientEvent::TrackData(track.clone()));
    }

    fn on_broadcasting_event(&mut self, event: &BroadcastingEvent) {
        forward(self, ClientEvent::BroadcastingEvent(event.clone()));
    }
}

fn forward(sender: &mpsc::UnboundedSender<ClientEvent>, event: ClientEvent) {
    if sender.send(event).is_err() {
        trace!("event receiver dropped");
    }
}
