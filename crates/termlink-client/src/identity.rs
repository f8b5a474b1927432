//! In-process device identities.
//!
//! A persisted identity lives in `termlink-core`; these two cover tests and
//! callers that manage the identifier themselves.

use termlink_abstraction::DeviceIdentity;
use uuid::Uuid;

/// A fixed device identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticDeviceId(String);

impl StaticDeviceId {
    /// Creates an identity that always reports `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl DeviceIdentity for StaticDeviceId {
    fn device_id(&self) -> String {
        self.0.clone()
    }
}

/// Generates a fresh random identifier on every call.
///
/// Nothing is stored, so two sessions created through this identity carry
/// different owners. Use `termlink_core::DeviceIdStore` for a stable id.
#[derive(Debug, Clone, Copy, Default)]
pub struct EphemeralDeviceId;

impl DeviceIdentity for EphemeralDeviceId {
    fn device_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
