//! Notification pipeline.
//!
//! A notification is filtered synchronously inside the stack callback by the
//! characteristic's handler. Accepted payloads are copied into a [`Notification`] and
//! queued; updating the cached value and calling `on_data` runs later, when the
//! application drains the queue.
//!
//! Queueing and waiting only borrow the sensor shared, so a task can wait in
//! [`Sensor::next_notification`] while the stack callback delivers the value.
use alloc::boxed::Box;

use bt_hci::param::ConnHandle;

use crate::attribute::{CharacteristicId, NotificationAction};
use crate::config::MAX_NOTIFICATION_LEN;
use crate::pool::ValuePool;
use crate::stack::GattStack;
use crate::types::gatt::{AttributeValue, GattStatus};
use crate::{Error, Sensor};

/// An accepted notification waiting for deferred processing.
#[derive(Debug)]
pub struct Notification {
    characteristic: CharacteristicId,
    value: Box<[u8]>,
}

impl Notification {
    /// Characteristic the notification was resolved to.
    pub fn characteristic(&self) -> CharacteristicId {
        self.characteristic
    }

    /// Copied payload.
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl<S: GattStack, P: ValuePool> Sensor<S, P> {
    /// A value notification arrived from the stack.
    ///
    /// Returns an error only when an accepted notification had to be dropped.
    pub fn on_notification(&self, conn: ConnHandle, attribute: &AttributeValue<'_>) -> Result<(), Error> {
        if !self.is_current(conn) {
            trace!("[notify] ignoring notification for {:?}", conn);
            return Ok(());
        }
        let found = self
            .tree
            .characteristic_ids()
            .find(|id| {
                self.data
                    .characteristic(*id)
                    .is_some_and(|data| data.value_handle() == Some(attribute.handle))
            });
        let Some(id) = found else {
            trace!("[notify] no characteristic at {:#x}", attribute.handle);
            return Ok(());
        };
        let Some(handler) = self.tree.characteristic(id).and_then(|c| c.callbacks()) else {
            return Ok(());
        };
        if handler.on_notification(id, attribute.value) == NotificationAction::Discard {
            return Ok(());
        }

        let len = attribute.value.len().min(MAX_NOTIFICATION_LEN);
        if len < attribute.value.len() {
            warn!("[notify] truncating {} byte notification", attribute.value.len());
        }
        let Some(mut value) = self.pool.alloc(len) else {
            warn!("[notify] no memory for notification of {:?}, dropped", id);
            return Err(Error::OutOfMemory);
        };
        value.copy_from_slice(&attribute.value[..len]);
        self.notifications
            .try_send(Notification {
                characteristic: id,
                value,
            })
            .map_err(|_| {
                warn!("[notify] queue full, notification of {:?} dropped", id);
                Error::QueueFull
            })
    }

    /// Process every queued notification. Returns how many were processed.
    pub fn process_notifications(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(notification) = self.notifications.try_receive() {
            self.process_notification(notification);
            processed += 1;
        }
        processed
    }

    /// Wait until a notification is queued and take it off the queue.
    ///
    /// Hand it to [`Sensor::process_notification`] to update the cache.
    pub async fn next_notification(&self) -> Notification {
        self.notifications.receive().await
    }

    /// Store the payload of `notification` and call the characteristic's `on_data`.
    pub fn process_notification(&mut self, notification: Notification) -> CharacteristicId {
        let id = notification.characteristic;
        let Some(data) = self.data.characteristic_mut(id) else {
            return id;
        };
        trace!("[notify] processing {} bytes for {:?}", notification.value.len(), id);
        if let Err(e) = data.value.store(&self.pool, &notification.value) {
            warn!("[notify] keeping previous value of {:?}: {:?}", id, e);
        }
        if let Some(handler) = self.tree.characteristic(id).and_then(|c| c.callbacks()) {
            handler.on_data(id, data, GattStatus::SUCCESS);
        }
        id
    }
}
