// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level client for the `OrionBLE` server.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::listener::{ListenerKey, NotificationListenerManager};
use crate::protocol::{Endpoint, HttpClient, ServerConfig};
use crate::response::{
    parse_characteristics, parse_connection_status, parse_devices, parse_notifications,
    parse_services,
};
use crate::types::{BleDevice, DeviceFilter, GattCharacteristic, GattNotification, GattService};

/// Client for BLE operations performed by a local `OrionBLE` server.
///
/// The client performs no Bluetooth communication itself: every call is a
/// REST request against the server, which must already be running (or be
/// about to start, see [`wait_for_connection`](Self::wait_for_connection)).
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use orion_ble::{OrionBle, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> orion_ble::Result<()> {
///     let orion = OrionBle::new(ServerConfig::new())?;
///     orion.wait_for_connection(5).await?;
///
///     for device in orion.discover_devices(None).await? {
///         println!("{device}");
///         for service in orion.discover_services(&device).await? {
///             println!("  {service}");
///         }
///     }
///     Ok(())
/// }
/// ```
///
/// # Notification Listeners
///
/// ```no_run
/// use std::time::Duration;
/// use orion_ble::{OrionBle, ServerConfig};
/// use orion_ble::types::{BleDevice, CharacteristicProperty, GattCharacteristic, GattService};
///
/// # async fn example() -> orion_ble::Result<()> {
/// let orion = OrionBle::new(ServerConfig::new())?;
/// let device = BleDevice::new("CODE V02034E45U", "B0B1139AF459", false);
/// let service = GattService::new("14839ac4-7d7e-415c-9a42-167340cf2339", true);
/// let characteristic = GattCharacteristic::new(
///     "0734594a-a8e7-4b1a-a6b1-cd5243059a57",
///     "",
///     [CharacteristicProperty::Notify],
/// );
///
/// // The server only buffers notifications for registered characteristics
/// orion.register_notify_event(&device, &service, &characteristic).await?;
/// orion.start_notification_listener(
///     &device,
///     &service,
///     &characteristic,
///     |notification| println!("Received {notification}"),
///     Duration::from_millis(500),
/// )?;
///
/// tokio::time::sleep(Duration::from_secs(10)).await;
///
/// orion.stop_notification_listener(&device, &service, &characteristic).await;
/// orion.unregister_notify_event(&device, &service, &characteristic).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OrionBle {
    http: HttpClient,
    retry_delay: Duration,
    listeners: NotificationListenerManager,
}

impl OrionBle {
    /// Creates a client for the server described by `config`.
    ///
    /// No request is made; use [`wait_for_connection`](Self::wait_for_connection)
    /// to make sure the server is up.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let retry_delay = config.retry_delay();
        let http = config.into_client()?;
        Ok(Self {
            http,
            retry_delay,
            listeners: NotificationListenerManager::new(),
        })
    }

    /// Sets a callback invoked whenever a listener fails to fetch notifications.
    ///
    /// Fetch failures are always logged; this is for applications that want
    /// to surface them (e.g. to mark data as stale).
    #[must_use]
    pub fn with_error_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&ListenerKey, &Error) + Send + Sync + 'static,
    {
        self.listeners = self.listeners.with_error_observer(observer);
        self
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Returns the notification listener manager.
    #[must_use]
    pub fn listeners(&self) -> &NotificationListenerManager {
        &self.listeners
    }

    // =========================================================================
    // Server
    // =========================================================================

    /// Returns true if the server answers on its root endpoint.
    pub async fn is_server_reachable(&self) -> bool {
        self.http.get(&Endpoint::Root).await.is_ok()
    }

    /// Waits until the server answers, trying up to `max_retries` times.
    ///
    /// Attempts are spaced by the configured retry delay. At least one attempt
    /// is always made.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServerUnavailable`] if no attempt succeeded.
    pub async fn wait_for_connection(&self, max_retries: u32) -> Result<()> {
        let attempts = max_retries.max(1);
        for attempt in 1..=attempts {
            match self.http.get(&Endpoint::Root).await {
                Ok(_) => {
                    tracing::info!(url = %self.http.base_url(), attempt, "Connected to server");
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "Server not reachable yet");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        Err(Error::ServerUnavailable { attempts })
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Discovers nearby BLE devices, optionally filtered by name.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn discover_devices(&self, filter: Option<&DeviceFilter>) -> Result<Vec<BleDevice>> {
        let body = match filter {
            Some(filter) => {
                self.http
                    .get_with_query(&Endpoint::DiscoverDevices, &filter.to_query())
                    .await?
            }
            None => self.http.get(&Endpoint::DiscoverDevices).await?,
        };
        Ok(parse_devices(&body)?)
    }

    /// Returns whether the server currently holds a connection to `address`.
    ///
    /// An unreadable status reads as `false`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn is_device_connected(&self, address: &str) -> Result<bool> {
        let endpoint = Endpoint::DeviceConnection {
            address: address.to_string(),
        };
        let body = self.http.get(&endpoint).await?;
        Ok(parse_connection_status(&body))
    }

    /// Discovers the GATT services of a device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn discover_services(&self, device: &BleDevice) -> Result<Vec<GattService>> {
        let endpoint = Endpoint::Services {
            address: device.address().to_string(),
        };
        let body = self.http.get(&endpoint).await?;
        Ok(parse_services(&body)?)
    }

    /// Discovers the characteristics of a service.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn discover_characteristics(
        &self,
        device: &BleDevice,
        service: &GattService,
    ) -> Result<Vec<GattCharacteristic>> {
        let endpoint = Endpoint::Characteristics {
            address: device.address().to_string(),
            service: service.uuid().to_string(),
        };
        let body = self.http.get(&endpoint).await?;
        Ok(parse_characteristics(&body)?)
    }

    // =========================================================================
    // Characteristic access
    // =========================================================================

    /// Reads a characteristic and returns the raw value as sent by the server.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn read_characteristic(
        &self,
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
    ) -> Result<String> {
        let (address, service, characteristic) = ids(device, service, characteristic);
        let endpoint = Endpoint::Read {
            address,
            service,
            characteristic,
        };
        Ok(self.http.get(&endpoint).await?)
    }

    /// Writes bytes to a characteristic.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn write_characteristic(
        &self,
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
        data: &[u8],
    ) -> Result<()> {
        let (address, service, characteristic) = ids(device, service, characteristic);
        let endpoint = Endpoint::Write {
            address,
            service,
            characteristic,
        };
        self.http
            .post_json(&endpoint, &serde_json::json!({ "message": data }))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Asks the server to start buffering notifications for a characteristic.
    ///
    /// Must be called before [`get_notifications`](Self::get_notifications) or
    /// a listener can receive anything.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn register_notify_event(
        &self,
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
    ) -> Result<()> {
        let (address, service, characteristic) = ids(device, service, characteristic);
        let endpoint = Endpoint::RegisterNotify {
            address,
            service,
            characteristic,
        };
        self.http
            .post_json(&endpoint, &serde_json::json!({}))
            .await?;
        Ok(())
    }

    /// Asks the server to stop buffering notifications for a characteristic.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn unregister_notify_event(
        &self,
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
    ) -> Result<()> {
        let (address, service, characteristic) = ids(device, service, characteristic);
        let endpoint = Endpoint::UnregisterNotify {
            address,
            service,
            characteristic,
        };
        self.http
            .post_json(&endpoint, &serde_json::json!({}))
            .await?;
        Ok(())
    }

    /// Fetches the notifications received since the previous fetch.
    ///
    /// An empty or unreadable payload yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn get_notifications(
        &self,
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
    ) -> Result<Vec<GattNotification>> {
        let endpoint = notifications_endpoint(device, service, characteristic);
        let body = self.http.get(&endpoint).await?;
        Ok(parse_notifications(&body))
    }

    /// Starts delivering a characteristic's notifications to `handler`, polling
    /// every `interval`.
    ///
    /// Call [`register_notify_event`](Self::register_notify_event) first;
    /// otherwise the listener runs but never receives anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Listener`] if a listener is already active for this
    /// characteristic, if `interval` is zero, or if called outside a tokio
    /// runtime.
    pub fn start_notification_listener<H>(
        &self,
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
        handler: H,
        interval: Duration,
    ) -> Result<()>
    where
        H: FnMut(GattNotification) + Send + 'static,
    {
        let key = ListenerKey::for_characteristic(device, service, characteristic);
        let http = self.http.clone();
        let endpoint = notifications_endpoint(device, service, characteristic);

        let fetch = move || {
            let http = http.clone();
            let endpoint = endpoint.clone();
            async move {
                let body = http.get(&endpoint).await?;
                Ok::<_, Error>(parse_notifications(&body))
            }
        };

        self.listeners.start(key, fetch, handler, interval)?;
        Ok(())
    }

    /// Pauses a listener. Returns `true` if it was running.
    pub fn pause_notification_listener(
        &self,
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
    ) -> bool {
        self.listeners.pause(&ListenerKey::for_characteristic(
            device,
            service,
            characteristic,
        ))
    }

    /// Resumes a paused listener. Returns `true` if it was paused.
    pub fn resume_notification_listener(
        &self,
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
    ) -> bool {
        self.listeners.resume(&ListenerKey::for_characteristic(
            device,
            service,
            characteristic,
        ))
    }

    /// Stops a listener and waits for its task to end.
    ///
    /// Returns `true` if a listener was registered.
    pub async fn stop_notification_listener(
        &self,
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
    ) -> bool {
        let key = ListenerKey::for_characteristic(device, service, characteristic);
        self.listeners.stop(&key).await
    }

    /// Returns true if a listener is running or paused for the characteristic.
    #[must_use]
    pub fn is_listener_active(
        &self,
        device: &BleDevice,
        service: &GattService,
        characteristic: &GattCharacteristic,
    ) -> bool {
        self.listeners.is_active(&ListenerKey::for_characteristic(
            device,
            service,
            characteristic,
        ))
    }

    /// Stops every listener.
    pub async fn shutdown(&self) {
        let stopped = self.listeners.stop_all().await;
        tracing::info!(stopped, "Client shut down");
    }
}

fn ids(
    device: &BleDevice,
    service: &GattService,
    characteristic: &GattCharacteristic,
) -> (String, String, String) {
    (
        device.address().to_string(),
        service.uuid().to_string(),
        characteristic.uuid().to_string(),
    )
}

fn notifications_endpoint(
    device: &BleDevice,
    service: &GattService,
    characteristic: &GattCharacteristic,
) -> Endpoint {
    let (address, service, characteristic) = ids(device, service, characteristic);
    Endpoint::Notifications {
        address,
        service,
        characteristic,
    }
}
