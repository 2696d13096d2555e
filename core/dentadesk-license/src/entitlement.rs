//! Entitlements granted by a license key: tier, region and optional expiry.

use crate::error::{LicenseError, LicenseResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel written in place of an expiry date for perpetual licenses.
pub const PERPETUAL: &str = "PERPETUAL";

/// The license tier. Variants are declared in ascending rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Standard,
    Professional,
    Enterprise,
    Premium,
    Ultimate,
}

impl Tier {
    /// All tiers in ascending rank.
    pub const ALL: [Tier; 5] = [
        Self::Standard,
        Self::Professional,
        Self::Enterprise,
        Self::Premium,
        Self::Ultimate,
    ];

    /// Returns the canonical uppercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Professional => "PROFESSIONAL",
            Self::Enterprise => "ENTERPRISE",
            Self::Premium => "PREMIUM",
            Self::Ultimate => "ULTIMATE",
        }
    }

    /// Returns true if this tier unlocks features gated at `required`.
    #[must_use]
    pub fn includes(&self, required: Tier) -> bool {
        *self >= required
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| LicenseError::InvalidEntitlement(format!("unknown tier {s:?}")))
    }
}

/// The sales region a license is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Global,
    Saudi,
    Uae,
    Kuwait,
    Qatar,
    Bahrain,
    Oman,
    Gcc,
    Mena,
}

impl Region {
    /// All regions in declaration order.
    pub const ALL: [Region; 9] = [
        Self::Global,
        Self::Saudi,
        Self::Uae,
        Self::Kuwait,
        Self::Qatar,
        Self::Bahrain,
        Self::Oman,
        Self::Gcc,
        Self::Mena,
    ];

    /// Returns the canonical uppercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "GLOBAL",
            Self::Saudi => "SAUDI",
            Self::Uae => "UAE",
            Self::Kuwait => "KUWAIT",
            Self::Qatar => "QATAR",
            Self::Bahrain => "BAHRAIN",
            Self::Oman => "OMAN",
            Self::Gcc => "GCC",
            Self::Mena => "MENA",
        }
    }

    /// Returns true for the six Gulf Cooperation Council member states.
    #[must_use]
    pub fn is_gcc_member(&self) -> bool {
        matches!(
            self,
            Self::Saudi | Self::Uae | Self::Kuwait | Self::Qatar | Self::Bahrain | Self::Oman
        )
    }

    /// Returns true if a license for this region is usable in `other`.
    #[must_use]
    pub fn covers(&self, other: Region) -> bool {
        match self {
            Self::Global => true,
            Self::Mena => matches!(other, Self::Mena | Self::Gcc) || other.is_gcc_member(),
            Self::Gcc => other == Self::Gcc || other.is_gcc_member(),
            _ => *self == other,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|region| region.as_str() == s)
            .ok_or_else(|| LicenseError::InvalidEntitlement(format!("unknown region {s:?}")))
    }
}

/// What a license key grants. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entitlement {
    tier: Tier,
    region: Region,
    expiry: Option<NaiveDate>,
}

impl Entitlement {
    /// Creates a perpetual entitlement.
    #[must_use]
    pub fn new(tier: Tier, region: Region) -> Self {
        Self {
            tier,
            region,
            expiry: None,
        }
    }

    /// Returns a copy of this entitlement that lapses after `expiry`.
    #[must_use]
    pub fn with_expiry(self, expiry: NaiveDate) -> Self {
        Self {
            expiry: Some(expiry),
            ..self
        }
    }

    /// Parses tier and region names, case-sensitively.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidEntitlement`] if either name is unknown.
    pub fn parse(tier: &str, region: &str) -> LicenseResult<Self> {
        Ok(Self::new(tier.parse()?, region.parse()?))
    }

    /// Returns the tier.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Returns the region.
    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    /// Returns the last day the license is valid, or None for perpetual.
    #[must_use]
    pub fn expiry(&self) -> Option<NaiveDate> {
        self.expiry
    }

    /// Returns true if the entitlement has lapsed as of `today`.
    ///
    /// The expiry day itself is still valid.
    #[must_use]
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.expiry.is_some_and(|expiry| today > expiry)
    }

    /// Returns the fixed-order form fed into key derivation:
    /// `TIER|REGION|YYYY-MM-DD` or `TIER|REGION|PERPETUAL`.
    #[must_use]
    pub fn canonical(&self) -> String {
        let expiry = self
            .expiry
            .map_or_else(|| PERPETUAL.to_string(), |d| d.format("%Y-%m-%d").to_string());
        format!("{}|{}|{}", self.tier, self.region, expiry)
    }
}
