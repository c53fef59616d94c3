use alloc::string::{String, ToString};
use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseDeviceTypeError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Mobile,
    Desktop,
    Tablet,
}

/// Where a normalized pointer event came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerSource {
    Mouse,
    Touch,
}

const MOBILE_MARKERS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

impl DeviceType {
    pub const ALL: [DeviceType; 3] = [DeviceType::Mobile, DeviceType::Desktop, DeviceType::Tablet];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
            Self::Tablet => "tablet",
        }
    }

    /// Classify a browser user agent. Android without a `mobile` token after
    /// it is a tablet.
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        let android_tablet = ua
            .rfind("android")
            .is_some_and(|idx| !ua[idx..].contains("mobile"));
        if ua.contains("ipad") || android_tablet {
            return Self::Tablet;
        }
        if MOBILE_MARKERS.iter().any(|marker| ua.contains(marker)) {
            return Self::Mobile;
        }
        Self::Desktop
    }

    /// Desktop play follows the mouse; mobile and tablet play follow touch.
    pub fn accepts(self, source: PointerSource) -> bool {
        match self {
            Self::Desktop => source == PointerSource::Mouse,
            Self::Mobile | Self::Tablet => source == PointerSource::Touch,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = ParseDeviceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mobile" => Ok(Self::Mobile),
            "desktop" => Ok(Self::Desktop),
            "tablet" => Ok(Self::Tablet),
            other => Err(ParseDeviceTypeError {
                value: other.to_string(),
            }),
        }
    }
}

/// Leaderboard device filter; `all` (or nothing) means global.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeviceFilter {
    #[default]
    All,
    Only(DeviceType),
}

impl DeviceFilter {
    pub fn device(self) -> Option<DeviceType> {
        match self {
            Self::All => None,
            Self::Only(device) => Some(device),
        }
    }

    pub fn matches(self, device: DeviceType) -> bool {
        self.device().map_or(true, |only| only == device)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(device) => device.as_str(),
        }
    }
}

impl FromStr for DeviceFilter {
    type Err = ParseDeviceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only).map_err(|_| ParseDeviceTypeError {
            value: String::from(s),
        })
    }
}
