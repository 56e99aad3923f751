//! Device platform classification
//!
//! The single place where a `User-Agent` string is turned into a
//! [`Platform`]. Classification is a pure function over the input; anything
//! unrecognized ends up as [`Platform::Other`].

use core::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// The platform of a requesting device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// iPhone, iPad, iPod, and iOS browser shells
    Ios,

    /// Android phones and tablets
    Android,

    /// Everything else: desktop, bots, unknown devices
    Other,
}

/// Ordered classification rules, evaluated top to bottom against the
/// lowercased user agent
///
/// iOS markers come first: browser shells on iOS (`crios`, `fxios`) and some
/// WebViews carry a generic "mobile" token next to the platform token. The
/// `windows phone` guard sits before `android` because old Windows Phone
/// browsers spoofed an Android token.
///
/// New markers are additive entries, each covered by its own test case.
const RULES: &[(&str, Platform)] = &[
    ("iphone", Platform::Ios),
    ("ipad", Platform::Ios),
    ("ipod", Platform::Ios),
    ("crios", Platform::Ios),
    ("fxios", Platform::Ios),
    ("windows phone", Platform::Other),
    ("android", Platform::Android),
];

/// Classify a user agent string into a [`Platform`]
///
/// Total and deterministic: any input, including the empty string, maps to
/// exactly one platform. Never fails.
pub fn classify(user_agent: &str) -> Platform {
    let user_agent = user_agent.to_lowercase();

    RULES
        .iter()
        .find(|(marker, _)| user_agent.contains(marker))
        .map_or(Platform::Other, |(_, platform)| *platform)
}

impl Platform {
    /// Stable lowercase name, used as the storage representation
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Other => "other",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            "other" => Ok(Platform::Other),
            _ => Err(UnknownPlatform),
        }
    }
}

/// A stored platform name that is not one of the known variants
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown platform name")]
pub struct UnknownPlatform;
