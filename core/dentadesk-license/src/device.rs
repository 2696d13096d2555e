//! Device fingerprinting for license binding.
//!
//! Reduces a stable hardware identifier to a 32-character device id. Sources
//! are tried in a fixed order and the first usable one wins:
//!
//! 1. Platform UUID (machine-id, IOPlatformUUID, MachineGuid)
//! 2. Hardware address of the primary network interface
//! 3. `os-arch-hostname` composite
//!
//! The last source is far weaker than the first two (hostnames are neither
//! unique nor stable), so fingerprints remember which source produced them.

use crate::error::{LicenseError, LicenseResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};
use uuid::Uuid;

/// Salt mixed into every device id. Keeps raw hardware identifiers out of the
/// id and keeps ids from colliding with other products hashing the same data.
pub const DEVICE_SALT: &str = "dental-clinic-license-salt-2025";

/// Length of a device id in hex characters.
pub const DEVICE_ID_LEN: usize = 32;

/// A 32-character lowercase hex device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Parses a device id, accepting exactly 32 lowercase hex characters.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidDeviceId`] for any other shape.
    pub fn parse(s: &str) -> LicenseResult<Self> {
        if s.len() != DEVICE_ID_LEN {
            return Err(LicenseError::InvalidDeviceId(format!(
                "expected {DEVICE_ID_LEN} characters, got {}",
                s.len()
            )));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(LicenseError::InvalidDeviceId(
                "only lowercase hex characters are allowed".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Derives the device id for a raw hardware identifier.
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update(DEVICE_SALT.as_bytes());
        let hash = hasher.finalize();

        let id = hash[..DEVICE_ID_LEN / 2]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        Self(id)
    }

    /// Fingerprints the current machine and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::FingerprintUnavailable`] when no source can be read.
    pub fn collect() -> LicenseResult<Self> {
        Collector::new().collect().map(|fp| fp.id)
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = LicenseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

/// Which hardware source produced a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintSource {
    /// Platform-reported system UUID.
    PlatformUuid,
    /// Primary network interface hardware address.
    MacAddress,
    /// OS name, architecture and hostname.
    PlatformString,
}

impl FingerprintSource {
    /// Returns how strongly this source identifies a single machine.
    #[must_use]
    pub fn strength(&self) -> SourceStrength {
        match self {
            Self::PlatformUuid | Self::MacAddress => SourceStrength::Strong,
            Self::PlatformString => SourceStrength::Weak,
        }
    }
}

impl fmt::Display for FingerprintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PlatformUuid => "platform uuid",
            Self::MacAddress => "mac address",
            Self::PlatformString => "platform string",
        };
        f.write_str(name)
    }
}

/// Uniqueness guarantee of a fingerprint source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStrength {
    /// Hardware-backed, unique per machine.
    Strong,
    /// Shared by identically configured machines.
    Weak,
}

/// A device id together with the source it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    id: DeviceId,
    source: FingerprintSource,
}

impl DeviceFingerprint {
    /// Fingerprints the current machine.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::FingerprintUnavailable`] when no source can be read.
    pub fn generate() -> LicenseResult<Self> {
        Collector::new().collect()
    }

    /// Returns the device id.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Returns the source the id was derived from.
    #[must_use]
    pub fn source(&self) -> FingerprintSource {
        self.source
    }

    /// Returns the uniqueness guarantee of this fingerprint.
    #[must_use]
    pub fn strength(&self) -> SourceStrength {
        self.source.strength()
    }

    /// Validates that this fingerprint matches the current device.
    #[must_use]
    pub fn matches_current(&self) -> bool {
        Self::generate().is_ok_and(|current| self.id == current.id)
    }
}

/// Read access to the machine identifiers used for fingerprinting.
///
/// Each method returns `None` when its source is absent or unreadable.
pub trait HardwareProbe {
    /// Platform-reported system UUID.
    fn platform_uuid(&self) -> Option<String>;

    /// Hardware address of the primary network interface.
    fn mac_address(&self) -> Option<String>;

    /// OS name, architecture and hostname composite.
    fn platform_string(&self) -> Option<String>;
}

/// Reduces hardware identifiers to a [`DeviceFingerprint`].
#[derive(Debug, Clone, Default)]
pub struct Collector<P = SystemProbe> {
    probe: P,
}

impl Collector<SystemProbe> {
    /// Creates a collector reading the current machine.
    #[must_use]
    pub fn new() -> Self {
        Self { probe: SystemProbe }
    }
}

impl<P: HardwareProbe> Collector<P> {
    /// Creates a collector over a custom probe.
    #[must_use]
    pub fn with_probe(probe: P) -> Self {
        Self { probe }
    }

    /// Fingerprints the machine behind the probe.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::FingerprintUnavailable`] when every source is
    /// absent or empty.
    pub fn collect(&self) -> LicenseResult<DeviceFingerprint> {
        let sources = [
            FingerprintSource::PlatformUuid,
            FingerprintSource::MacAddress,
            FingerprintSource::PlatformString,
        ];

        for source in sources {
            let value = match source {
                FingerprintSource::PlatformUuid => self.probe.platform_uuid(),
                FingerprintSource::MacAddress => self.probe.mac_address(),
                FingerprintSource::PlatformString => self.probe.platform_string(),
            };
            let Some(raw) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
            else {
                debug!(source = %source, "fingerprint source unavailable");
                continue;
            };

            if source.strength() == SourceStrength::Weak {
                warn!(source = %source, "falling back to weak fingerprint source");
            }

            return Ok(DeviceFingerprint {
                id: DeviceId::from_source(&raw),
                source,
            });
        }

        Err(LicenseError::FingerprintUnavailable)
    }
}

/// Reads identifiers from the running operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl HardwareProbe for SystemProbe {
    fn platform_uuid(&self) -> Option<String> {
        read_platform_uuid().as_deref().and_then(normalize_uuid)
    }

    fn mac_address(&self) -> Option<String> {
        read_mac_address().as_deref().and_then(normalize_mac)
    }

    fn platform_string(&self) -> Option<String> {
        let hostname = hostname::get().ok()?.into_string().ok()?;
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return None;
        }
        Some(format!(
            "{}-{}-{}",
            std::env::consts::OS,
            std::env::consts::ARCH,
            hostname
        ))
    }
}

/// Normalizes a platform UUID to hyphenated lowercase, rejecting nil and max.
///
/// Accepts the 32-hex form used by `/etc/machine-id` as well.
pub fn normalize_uuid(raw: &str) -> Option<String> {
    let uuid = Uuid::parse_str(raw.trim()).ok()?;
    if uuid.is_nil() || uuid.as_bytes().iter().all(|&b| b == 0xff) {
        return None;
    }
    Some(uuid.hyphenated().to_string())
}

/// Normalizes a hardware address to lowercase colon-separated form.
///
/// Accepts `:` or `-` separators; all-zero addresses are rejected.
pub fn normalize_mac(raw: &str) -> Option<String> {
    let octets: Vec<u8> = raw
        .trim()
        .split([':', '-'])
        .map(|part| u8::from_str_radix(part, 16).ok().filter(|_| part.len() == 2))
        .collect::<Option<_>>()?;

    if octets.len() != 6 || octets.iter().all(|&b| b == 0) {
        return None;
    }

    Some(
        octets
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(":"),
    )
}

/// Gets the platform UUID (platform-specific unique identifier).
fn read_platform_uuid() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(target_os = "linux")]
    {
        ["/etc/machine-id", "/var/lib/dbus/machine-id", "/sys/class/dmi/id/product_uuid"]
            .iter()
            .filter_map(|path| std::fs::read_to_string(path).ok())
            .map(|s| s.trim().to_string())
            .find(|s| normalize_uuid(s).is_some())
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("reg")
            .args([
                "query",
                r"HKLM\SOFTWARE\Microsoft\Cryptography",
                "/v",
                "MachineGuid",
            ])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("MachineGuid"))
                    .and_then(|l| l.split_whitespace().last())
                    .map(String::from)
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

/// Interfaces that never belong to the physical machine.
#[cfg(target_os = "linux")]
const VIRTUAL_IFACE_PREFIXES: &[&str] = &["lo", "docker", "veth", "virbr", "br-", "tun", "tap"];

/// Gets the hardware address of the primary network interface.
fn read_mac_address() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let mut names: Vec<String> = std::fs::read_dir("/sys/class/net")
            .ok()?
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| !VIRTUAL_IFACE_PREFIXES.iter().any(|p| name.starts_with(p)))
            .collect();
        names.sort();

        names.iter().find_map(|name| {
            std::fs::read_to_string(format!("/sys/class/net/{name}/address"))
                .ok()
                .filter(|addr| normalize_mac(addr).is_some())
        })
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ifconfig")
            .arg("en0")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .map(str::trim)
                    .find(|l| l.starts_with("ether "))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(String::from)
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("getmac")
            .args(["/fo", "csv", "/nh"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output.lines().find_map(|l| {
                    l.split(',')
                        .next()
                        .map(|mac| mac.trim_matches('"').to_string())
                        .filter(|mac| normalize_mac(mac).is_some())
                })
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}
