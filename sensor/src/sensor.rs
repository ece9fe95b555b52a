//! Sensor ownership and connection lifecycle.
use alloc::rc::Rc;

use bt_hci::param::ConnHandle;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;

use crate::attribute::{AttributeTree, TreeData};
use crate::config::NOTIFICATION_QUEUE_SIZE;
use crate::cursor::Cursor;
use crate::discovery::Phase;
use crate::notification::Notification;
use crate::pool::{HeapPool, ValuePool};
use crate::stack::GattStack;
use crate::{Address, Error, SensorError};

/// Sensor-level application callbacks.
pub trait SensorHandler {
    /// Discovery and the initial reads are done; the sensor is live.
    fn on_ready(&self) {}

    /// The link went down. Runs before any state is reset.
    fn on_disconnected(&self) {}
}

/// A remote sensor described by an [`AttributeTree`], driven over a [`GattStack`].
///
/// The stack reports everything back through the `on_*` methods. All of them expect
/// the connection handle the event belongs to; events for any other connection, or
/// which arrive in a phase that does not expect them, are ignored.
pub struct Sensor<S: GattStack, P: ValuePool = HeapPool> {
    pub(crate) stack: S,
    pub(crate) pool: P,
    pub(crate) tree: AttributeTree,
    pub(crate) data: TreeData,
    pub(crate) handler: Option<Rc<dyn SensorHandler>>,
    pub(crate) phase: Phase,
    pub(crate) connection: Option<ConnHandle>,
    pub(crate) address: Option<Address>,
    pub(crate) notifications: Channel<NoopRawMutex, Notification, NOTIFICATION_QUEUE_SIZE>,
}

impl<S: GattStack> Sensor<S, HeapPool> {
    /// Create a sensor storing values on the heap.
    pub fn new(stack: S, tree: AttributeTree) -> Self {
        Self::with_pool(stack, HeapPool, tree)
    }
}

impl<S: GattStack, P: ValuePool> Sensor<S, P> {
    /// Create a sensor storing values in buffers from `pool`.
    pub fn with_pool(stack: S, pool: P, tree: AttributeTree) -> Self {
        let data = TreeData::new(&tree);
        Self {
            stack,
            pool,
            tree,
            data,
            handler: None,
            phase: Phase::Idle,
            connection: None,
            address: None,
            notifications: Channel::new(),
        }
    }

    /// Install the sensor-level callbacks.
    pub fn with_handler(mut self, handler: Rc<dyn SensorHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Declared attribute tree.
    pub fn tree(&self) -> &AttributeTree {
        &self.tree
    }

    /// Handles, properties and cached values learned from the peer.
    pub fn data(&self) -> &TreeData {
        &self.data
    }

    /// The underlying Bluetooth stack.
    pub fn stack(&self) -> &S {
        &self.stack
    }

    /// Mutable access to the underlying Bluetooth stack.
    pub fn stack_mut(&mut self) -> &mut S {
        &mut self.stack
    }

    /// Pool cached values and notification payloads are allocated from.
    pub fn pool(&self) -> &P {
        &self.pool
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Traversal position of the running phase; reset outside the phases that walk the tree.
    pub fn cursor(&self) -> Cursor {
        self.phase.cursor().unwrap_or_default()
    }

    /// Handle of the current link, if any.
    pub fn connection(&self) -> Option<ConnHandle> {
        self.connection
    }

    /// Peer address of the current link, if any.
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    /// Discovery has finished and application requests are accepted.
    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready)
    }

    /// Number of accepted notifications waiting to be processed.
    pub fn pending_notifications(&self) -> usize {
        self.notifications.len()
    }

    /// Release every cached value.
    pub fn clear_cache(&mut self) {
        self.data.clear_values();
    }

    /// Ask the stack to open a link to `address`.
    ///
    /// Discovery starts once the stack reports the link through [`Sensor::on_connected`].
    pub fn connect(&mut self, address: Address) -> Result<ConnHandle, SensorError<S::Error>> {
        if !matches!(self.phase, Phase::Idle) {
            warn!("[sensor] connect refused in phase {:?}", self.phase);
            return Err(Error::InvalidState.into());
        }
        let conn = self.stack.connect(&address).map_err(SensorError::Stack)?;
        info!("[sensor] connecting to {:?} on {:?}", address, conn);
        self.phase = Phase::Connecting;
        self.connection = Some(conn);
        self.address = Some(address);
        Ok(conn)
    }

    /// Ask the stack to tear down the link.
    ///
    /// State is reset when the stack confirms through [`Sensor::on_disconnected`].
    pub fn disconnect(&mut self) -> Result<(), SensorError<S::Error>> {
        let conn = self.connection.ok_or(Error::NotConnected)?;
        info!("[sensor] disconnecting {:?}", conn);
        self.stack.disconnect(conn).map_err(SensorError::Stack)
    }

    /// The link attempt started by [`Sensor::connect`] failed.
    pub fn on_connection_failed(&mut self, conn: ConnHandle) {
        if !self.is_current(conn) || !matches!(self.phase, Phase::Connecting) {
            trace!("[sensor] ignoring connection failure for {:?}", conn);
            return;
        }
        warn!("[sensor] connection to {:?} failed", self.address);
        self.reset();
    }

    /// The link went down, whatever the phase.
    pub fn on_disconnected(&mut self, conn: ConnHandle) {
        if !self.is_current(conn) {
            trace!("[sensor] ignoring disconnect of {:?}", conn);
            return;
        }
        info!("[sensor] disconnected {:?} in phase {:?}", conn, self.phase);
        if let Some(handler) = self.handler.as_ref() {
            handler.on_disconnected();
        }
        self.reset();
    }

    pub(crate) fn is_current(&self, conn: ConnHandle) -> bool {
        self.connection == Some(conn)
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.connection = None;
        self.address = None;
        self.data.forget_handles();
        let mut dropped = 0;
        while self.notifications.try_receive().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            debug!("[sensor] dropped {} pending notifications", dropped);
        }
    }
}
