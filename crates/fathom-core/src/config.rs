//! Predictor creation settings.

use std::ffi::c_void;
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::OnceLock;

use crate::buf;
use crate::error::{CoreError, Result};

/// Compute units a predictor is allowed to schedule work on.
///
/// Flags combine with `|`; [`Acceleration::DEFAULT`] leaves the choice to
/// the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Acceleration(u32);

impl Acceleration {
    /// Backend chooses the compute units.
    pub const DEFAULT: Acceleration = Acceleration(0);
    /// Allow CPU execution.
    pub const CPU: Acceleration = Acceleration(1);
    /// Allow GPU execution.
    pub const GPU: Acceleration = Acceleration(2);
    /// Allow neural-processor execution.
    pub const NPU: Acceleration = Acceleration(4);
    /// Allow every compute unit.
    pub const ALL: Acceleration = Acceleration(1 | 2 | 4);

    /// The raw flag bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Reconstruct from raw bits, rejecting unknown flags.
    pub fn from_bits(bits: u32) -> Result<Self> {
        if bits & !Self::ALL.0 != 0 {
            return Err(CoreError::InvalidArgument(format!(
                "unknown acceleration flags: {bits:#x}"
            )));
        }
        Ok(Acceleration(bits))
    }

    /// Whether every flag in `other` is set in `self`.
    pub fn contains(self, other: Acceleration) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for Acceleration {
    fn default() -> Self {
        Acceleration::DEFAULT
    }
}

impl BitOr for Acceleration {
    type Output = Acceleration;

    fn bitor(self, rhs: Acceleration) -> Acceleration {
        Acceleration(self.0 | rhs.0)
    }
}

impl BitOrAssign for Acceleration {
    fn bitor_assign(&mut self, rhs: Acceleration) {
        self.0 |= rhs.0;
    }
}

/// An opaque platform compute-device handle.
///
/// The pointer is a loan from the platform layer (a Metal device, a D3D
/// adapter, a CUDA context); the runtime never dereferences it, only hands
/// it through to the backend that loaded the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device(NonNull<c_void>);

impl Device {
    /// Wrap a platform device pointer. Returns `None` for a null pointer,
    /// which callers should express as an absent device instead.
    pub fn new(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Device)
    }

    /// The raw platform pointer.
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

// The handle is an opaque token owned by the platform layer; the runtime
// only stores and forwards it, so moving it across threads is sound.
unsafe impl Send for Device {}
unsafe impl Sync for Device {}

/// A file resource attached to a configuration, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Resource kind, e.g. `"model"` or `"weights"`.
    pub kind: String,
    /// Path to the resource on disk.
    pub path: PathBuf,
}

/// Settings consumed when a predictor is created.
///
/// A mutable bag the caller fills in, then passes to the creation path;
/// creation snapshots it with `Clone` and retains no reference past return.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    token: Option<String>,
    resources: Vec<(String, Resource)>,
    acceleration: Acceleration,
    device: Option<Device>,
    fingerprint: Option<String>,
}

impl Configuration {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// The client session token, if set.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Set or clear the client session token.
    pub fn set_token(&mut self, token: Option<&str>) {
        self.token = token.map(str::to_owned);
    }

    /// Required destination size for [`Configuration::copy_token`].
    pub fn token_size(&self) -> usize {
        buf::required_size(self.token.as_deref().unwrap_or(""))
    }

    /// Copy the token into `dst` (negotiated-size convention). An unset
    /// token copies as the empty string.
    pub fn copy_token(&self, dst: &mut [u8]) -> Result<usize> {
        buf::fill(self.token.as_deref().unwrap_or(""), dst)
    }

    /// Look up an attached resource by id.
    pub fn resource(&self, id: &str) -> Result<&Resource> {
        self.resources
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, resource)| resource)
            .ok_or_else(|| {
                CoreError::InvalidArgument(format!("no resource with id \"{id}\""))
            })
    }

    /// Attach, replace, or remove a resource.
    ///
    /// `Some(path)` attaches or replaces the resource under `id` in place;
    /// `None` removes it. Attachment order is preserved.
    pub fn set_resource(&mut self, id: &str, kind: &str, path: Option<&Path>) {
        match path {
            Some(path) => {
                let resource = Resource {
                    kind: kind.to_owned(),
                    path: path.to_owned(),
                };
                match self.resources.iter_mut().find(|(key, _)| key == id) {
                    Some((_, slot)) => *slot = resource,
                    None => self.resources.push((id.to_owned(), resource)),
                }
            }
            None => self.resources.retain(|(key, _)| key != id),
        }
    }

    /// Iterate attached resources in attachment order.
    pub fn resources(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources
            .iter()
            .map(|(id, resource)| (id.as_str(), resource))
    }

    /// Required destination size for [`Configuration::copy_resource_path`].
    pub fn resource_path_size(&self, id: &str) -> Result<usize> {
        let resource = self.resource(id)?;
        Ok(buf::required_size(&resource.path.to_string_lossy()))
    }

    /// Copy a resource path into `dst` (negotiated-size convention).
    pub fn copy_resource_path(&self, id: &str, dst: &mut [u8]) -> Result<usize> {
        let resource = self.resource(id)?;
        buf::fill(&resource.path.to_string_lossy(), dst)
    }

    /// The allowed compute units.
    pub fn acceleration(&self) -> Acceleration {
        self.acceleration
    }

    /// Set the allowed compute units.
    pub fn set_acceleration(&mut self, acceleration: Acceleration) {
        self.acceleration = acceleration;
    }

    /// The platform compute device, if pinned.
    pub fn device(&self) -> Option<Device> {
        self.device
    }

    /// Pin or unpin the platform compute device.
    pub fn set_device(&mut self, device: Option<Device>) {
        self.device = device;
    }

    /// The client fingerprint, if set.
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    /// Set or clear the client fingerprint.
    pub fn set_fingerprint(&mut self, fingerprint: Option<&str>) {
        self.fingerprint = fingerprint.map(str::to_owned);
    }

    /// A stable identifier for this device, independent of any
    /// configuration instance.
    ///
    /// Derived from `/etc/machine-id` where available, otherwise a
    /// process-lifetime random id. Computed once and cached.
    pub fn unique_id() -> &'static str {
        static UNIQUE_ID: OnceLock<String> = OnceLock::new();
        UNIQUE_ID.get_or_init(|| {
            std::fs::read_to_string("/etc/machine-id")
                .map(|id| id.trim().to_owned())
                .ok()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| {
                    tracing::debug!("no machine id found, generating a process-lifetime id");
                    uuid::Uuid::new_v4().simple().to_string()
                })
        })
    }

    /// Required destination size for [`Configuration::copy_unique_id`].
    pub fn unique_id_size() -> usize {
        buf::required_size(Self::unique_id())
    }

    /// Copy the device identifier into `dst` (negotiated-size convention).
    pub fn copy_unique_id(dst: &mut [u8]) -> Result<usize> {
        buf::fill(Self::unique_id(), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acceleration_algebra() {
        let all = Acceleration::CPU | Acceleration::GPU | Acceleration::NPU;
        assert_eq!(all, Acceleration::ALL);
        assert!(all.contains(Acceleration::GPU));
        assert!(!Acceleration::CPU.contains(Acceleration::GPU));
        assert!(Acceleration::DEFAULT.contains(Acceleration::DEFAULT));
        assert_eq!(Acceleration::from_bits(3).unwrap(), Acceleration::CPU | Acceleration::GPU);
        assert!(Acceleration::from_bits(8).is_err());
    }

    #[test]
    fn test_configuration_round_trip() {
        let mut config = Configuration::new();
        config.set_token(Some("tok_123"));
        config.set_acceleration(Acceleration::CPU | Acceleration::GPU);
        config.set_resource("model", "model", Some(Path::new("/tmp/m.json")));

        assert_eq!(config.token(), Some("tok_123"));
        assert!(config.acceleration().contains(Acceleration::GPU));
        let resource = config.resource("model").unwrap();
        assert_eq!(resource.kind, "model");
        assert_eq!(resource.path, PathBuf::from("/tmp/m.json"));

        // Creation snapshots the bag; mutating the original afterwards must
        // not affect the snapshot.
        let snapshot = config.clone();
        config.set_token(None);
        assert_eq!(snapshot.token(), Some("tok_123"));
    }

    #[test]
    fn test_token_and_fingerprint_clear_with_bare_none() {
        let mut config = Configuration::new();
        config.set_token(Some("tok"));
        config.set_fingerprint(Some("fp"));
        config.set_token(None);
        config.set_fingerprint(None);
        assert!(config.token().is_none());
        assert!(config.fingerprint().is_none());
    }

    #[test]
    fn test_resource_removal() {
        let mut config = Configuration::new();
        config.set_resource("model", "model", Some(Path::new("/a")));
        config.set_resource("weights", "weights", Some(Path::new("/b")));
        config.set_resource("model", "model", None);
        assert!(config.resource("model").is_err());
        assert!(config.resource("weights").is_ok());
    }

    #[test]
    fn test_resource_replacement_preserves_order() {
        let mut config = Configuration::new();
        config.set_resource("a", "model", Some(Path::new("/1")));
        config.set_resource("b", "weights", Some(Path::new("/2")));
        config.set_resource("a", "model", Some(Path::new("/3")));
        let ids: Vec<&str> = config.resources().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(config.resource("a").unwrap().path, PathBuf::from("/3"));
    }

    #[test]
    fn test_unique_id_stable() {
        let first = Configuration::unique_id();
        let second = Configuration::unique_id();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_token_buffer_protocol() {
        let mut config = Configuration::new();
        config.set_token(Some("abc"));
        let size = config.token_size();
        let mut dst = vec![0u8; size];
        assert_eq!(config.copy_token(&mut dst).unwrap(), 4);
        assert_eq!(&dst, b"abc\0");
    }
}
