#![allow(dead_code)]
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ble_sensor::attribute::consts::{CHARACTERISTIC_CCCD_UUID16, CHARACTERISTIC_USER_DESCRIPTION_UUID16};
use ble_sensor::prelude::*;
use ble_sensor::types::gatt::{CharacteristicRange, ServiceRange};

pub fn init() {
    let _ = env_logger::try_init();
}

pub fn address() -> Address {
    Address::random([0xff, 0x8f, 0x1a, 0x05, 0xe4, 0xff])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect(Address),
    Disconnect(ConnHandle),
    RegisterNotifications(ConnHandle),
    DiscoverServices(ConnHandle),
    DiscoverCharacteristics(ServiceRange),
    DiscoverDescriptors(CharacteristicRange),
    Read(u16, Context),
    Write(u16, Vec<u8>, Context),
}

/// Stack recording every request instead of talking to a controller.
#[derive(Default)]
pub struct MockStack {
    pub calls: Vec<Call>,
    pub next_conn: u16,
    pub refuse_connect: bool,
    pub refuse_discovery: bool,
    pub refuse_io: bool,
    /// Last read issued by the discovery engine and not answered yet.
    pub pending_read: Option<u16>,
}

impl MockStack {
    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    fn discovery(&self) -> Result<(), MockError> {
        if self.refuse_discovery {
            Err(MockError)
        } else {
            Ok(())
        }
    }
}

impl GattStack for MockStack {
    type Error = MockError;

    fn connect(&mut self, address: &Address) -> Result<ConnHandle, MockError> {
        self.calls.push(Call::Connect(*address));
        if self.refuse_connect {
            return Err(MockError);
        }
        self.next_conn += 1;
        Ok(ConnHandle::new(0x40 + self.next_conn))
    }

    fn disconnect(&mut self, conn: ConnHandle) -> Result<(), MockError> {
        self.calls.push(Call::Disconnect(conn));
        Ok(())
    }

    fn register_notifications(&mut self, conn: ConnHandle) -> Result<(), MockError> {
        self.calls.push(Call::RegisterNotifications(conn));
        Ok(())
    }

    fn discover_primary_services(&mut self, conn: ConnHandle) -> Result<(), MockError> {
        self.calls.push(Call::DiscoverServices(conn));
        self.discovery()
    }

    fn discover_characteristics(&mut self, _conn: ConnHandle, service: &ServiceRange) -> Result<(), MockError> {
        self.calls.push(Call::DiscoverCharacteristics(service.clone()));
        self.discovery()
    }

    fn discover_descriptors(
        &mut self,
        _conn: ConnHandle,
        characteristic: &CharacteristicRange,
    ) -> Result<(), MockError> {
        self.calls.push(Call::DiscoverDescriptors(characteristic.clone()));
        self.discovery()
    }

    fn read(&mut self, _conn: ConnHandle, handle: u16, context: Context) -> Result<(), MockError> {
        self.calls.push(Call::Read(handle, context));
        if self.refuse_io {
            return Err(MockError);
        }
        if context == Context::Discovery {
            self.pending_read = Some(handle);
        }
        Ok(())
    }

    fn write(&mut self, _conn: ConnHandle, handle: u16, value: &[u8], context: Context) -> Result<(), MockError> {
        self.calls.push(Call::Write(handle, value.to_vec(), context));
        if self.refuse_io {
            return Err(MockError);
        }
        Ok(())
    }
}

/// Pool recording every allocation, refusing all of them once `fail` is set.
#[derive(Default)]
pub struct CountingPool {
    pub sizes: RefCell<Vec<usize>>,
    pub fail: Cell<bool>,
}

impl ValuePool for CountingPool {
    fn alloc(&self, len: usize) -> Option<Box<[u8]>> {
        if self.fail.get() {
            return None;
        }
        self.sizes.borrow_mut().push(len);
        HeapPool.alloc(len)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Data(CharacteristicId, Option<Vec<u8>>, GattStatus),
    Written(CharacteristicId, GattStatus),
    Notified(CharacteristicId, Vec<u8>),
    DescriptorData(DescriptorId, Option<Vec<u8>>, GattStatus),
    DescriptorWritten(DescriptorId, GattStatus),
    Ready,
    Disconnected,
}

/// Handler recording every callback it receives.
pub struct Recorder {
    events: RefCell<Vec<Event>>,
    pub action: Cell<NotificationAction>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            action: Cell::new(NotificationAction::Process),
        }
    }
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

impl CharacteristicHandler for Recorder {
    fn on_data(&self, id: CharacteristicId, data: &CharacteristicData, status: GattStatus) {
        self.push(Event::Data(id, data.value().get().map(|v| v.to_vec()), status));
    }

    fn on_write(&self, id: CharacteristicId, status: GattStatus) {
        self.push(Event::Written(id, status));
    }

    fn on_notification(&self, id: CharacteristicId, value: &[u8]) -> NotificationAction {
        self.push(Event::Notified(id, value.to_vec()));
        self.action.get()
    }
}

impl DescriptorHandler for Recorder {
    fn on_data(&self, id: DescriptorId, data: &DescriptorData, status: GattStatus) {
        self.push(Event::DescriptorData(id, data.value().get().map(|v| v.to_vec()), status));
    }

    fn on_write(&self, id: DescriptorId, status: GattStatus) {
        self.push(Event::DescriptorWritten(id, status));
    }
}

impl SensorHandler for Recorder {
    fn on_ready(&self) {
        self.push(Event::Ready);
    }

    fn on_disconnected(&self) {
        self.push(Event::Disconnected);
    }
}

/// Battery and environmental sensing services of the test peer, with their handles.
pub mod peer {
    use super::*;

    pub const BATTERY: Uuid = Uuid::new_short(0x180f);
    pub const BATTERY_LEVEL: Uuid = Uuid::new_short(0x2a19);
    pub const BATTERY_STATE: Uuid = Uuid::new_short(0x2a1a);
    pub const ENVIRONMENT: Uuid = Uuid::new_short(0x181a);
    pub const TEMPERATURE: Uuid = Uuid::new_short(0x2a6e);
    pub const HUMIDITY: Uuid = Uuid::new_short(0x2a6f);

    pub const LEVEL_HANDLE: u16 = 3;
    pub const LEVEL_CCC_HANDLE: u16 = 4;
    pub const STATE_HANDLE: u16 = 6;
    pub const STATE_DESCRIPTION_HANDLE: u16 = 7;
    pub const TEMPERATURE_HANDLE: u16 = 10;
    pub const TEMPERATURE_CCC_HANDLE: u16 = 11;
    pub const HUMIDITY_HANDLE: u16 = 13;

    pub fn tree(recorder: &Rc<Recorder>) -> AttributeTree {
        AttributeTree::builder()
            .service(
                Service::new(BATTERY)
                    .characteristic(
                        Characteristic::new(BATTERY_LEVEL)
                            .handler(recorder.clone())
                            .descriptor(Descriptor::new(CHARACTERISTIC_CCCD_UUID16).handler(recorder.clone())),
                    )
                    .characteristic(
                        Characteristic::new(BATTERY_STATE)
                            .handler(recorder.clone())
                            .descriptor(Descriptor::new(CHARACTERISTIC_USER_DESCRIPTION_UUID16).handler(recorder.clone())),
                    ),
            )
            .service(
                Service::new(ENVIRONMENT)
                    .characteristic(
                        Characteristic::new(TEMPERATURE)
                            .handler(recorder.clone())
                            .descriptor(Descriptor::new(CHARACTERISTIC_CCCD_UUID16).handler(recorder.clone())),
                    )
                    .characteristic(Characteristic::new(HUMIDITY).handler(recorder.clone())),
            )
            .build()
    }

    pub fn services() -> [DiscoveredService; 2] {
        [
            DiscoveredService {
                uuid: BATTERY,
                group: GroupHandle::new(1, 7),
            },
            DiscoveredService {
                uuid: ENVIRONMENT,
                group: GroupHandle::new(8, 13),
            },
        ]
    }

    pub fn battery_characteristics() -> [DiscoveredCharacteristic; 2] {
        [
            DiscoveredCharacteristic {
                uuid: BATTERY_LEVEL,
                group: GroupHandle::new(2, 4),
                value_handle: LEVEL_HANDLE,
                properties: CharacteristicProps::new(&[CharacteristicProp::Read, CharacteristicProp::Notify]),
            },
            DiscoveredCharacteristic {
                uuid: BATTERY_STATE,
                group: GroupHandle::new(5, 7),
                value_handle: STATE_HANDLE,
                properties: CharacteristicProps::new(&[CharacteristicProp::Read, CharacteristicProp::Write]),
            },
        ]
    }

    pub fn environment_characteristics() -> [DiscoveredCharacteristic; 2] {
        [
            DiscoveredCharacteristic {
                uuid: TEMPERATURE,
                group: GroupHandle::new(9, 11),
                value_handle: TEMPERATURE_HANDLE,
                properties: CharacteristicProps::new(&[CharacteristicProp::Notify]),
            },
            DiscoveredCharacteristic {
                uuid: HUMIDITY,
                group: GroupHandle::new(12, 13),
                value_handle: HUMIDITY_HANDLE,
                properties: CharacteristicProps::new(&[CharacteristicProp::Read]),
            },
        ]
    }

    pub fn descriptor(uuid: Uuid, handle: u16) -> DiscoveredDescriptor {
        DiscoveredDescriptor { uuid, handle }
    }

    /// Value the peer answers reads of `handle` with.
    pub fn value(handle: u16) -> &'static [u8] {
        match handle {
            LEVEL_HANDLE => &[0x64],
            LEVEL_CCC_HANDLE => &[0x00, 0x00],
            STATE_HANDLE => &[0x01],
            STATE_DESCRIPTION_HANDLE => b"main",
            TEMPERATURE_CCC_HANDLE => &[0x00, 0x00],
            HUMIDITY_HANDLE => &[0x10, 0x27],
            _ => &[],
        }
    }

    /// Replay the discovery of every attribute of the peer.
    pub fn discover<P: ValuePool>(sensor: &mut Sensor<MockStack, P>, conn: ConnHandle) {
        sensor.on_connected(conn).unwrap();
        for service in services() {
            sensor.on_service(conn, Some(&service)).unwrap();
        }
        sensor.on_service(conn, None).unwrap();

        for characteristic in battery_characteristics() {
            sensor.on_characteristic(conn, Some(&characteristic)).unwrap();
        }
        sensor.on_characteristic(conn, None).unwrap();
        for characteristic in environment_characteristics() {
            sensor.on_characteristic(conn, Some(&characteristic)).unwrap();
        }
        sensor.on_characteristic(conn, None).unwrap();

        sensor
            .on_descriptor(conn, Some(&descriptor(CHARACTERISTIC_CCCD_UUID16, LEVEL_CCC_HANDLE)))
            .unwrap();
        sensor.on_descriptor(conn, None).unwrap();
        sensor
            .on_descriptor(
                conn,
                Some(&descriptor(CHARACTERISTIC_USER_DESCRIPTION_UUID16, STATE_DESCRIPTION_HANDLE)),
            )
            .unwrap();
        sensor.on_descriptor(conn, None).unwrap();
        sensor
            .on_descriptor(conn, Some(&descriptor(CHARACTERISTIC_CCCD_UUID16, TEMPERATURE_CCC_HANDLE)))
            .unwrap();
        sensor.on_descriptor(conn, None).unwrap();

        answer_reads(sensor, conn);
    }

    /// Answer discovery reads until none is outstanding.
    pub fn answer_reads<P: ValuePool>(sensor: &mut Sensor<MockStack, P>, conn: ConnHandle) {
        while let Some(handle) = sensor.stack_mut().pending_read.take() {
            sensor
                .on_read(conn, Context::Discovery, GattStatus::SUCCESS, value(handle))
                .unwrap();
        }
    }

    /// A sensor connected to the peer and fully discovered.
    pub fn ready<P: ValuePool>(pool: P, recorder: &Rc<Recorder>) -> (Sensor<MockStack, P>, ConnHandle) {
        let mut sensor = Sensor::with_pool(MockStack::default(), pool, tree(recorder)).with_handler(recorder.clone());
        let conn = sensor.connect(address()).unwrap();
        discover(&mut sensor, conn);
        assert!(sensor.is_ready());
        sensor.stack_mut().take_calls();
        recorder.take();
        (sensor, conn)
    }
}
