//! Coarse device classification used to tune thresholds and voices.

use serde::{Deserialize, Serialize};

/// Mobile vs. desktop.  Mobile gets shorter speech chunks, a different voice
/// preference list and an extra voice-loading retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    #[default]
    Desktop,
}

/// Operating system family, only needed for synthesis quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    #[default]
    Other,
}

/// Device class plus platform, resolved once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub class: DeviceClass,
    pub platform: Platform,
}

impl DeviceProfile {
    pub fn new(class: DeviceClass, platform: Platform) -> Self {
        Self { class, platform }
    }

    /// Classify a browser-style user-agent string.
    ///
    /// ```
    /// use voice_turn_engine::device::{DeviceClass, DeviceProfile, Platform};
    ///
    /// let p = DeviceProfile::from_user_agent(
    ///     "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15",
    /// );
    /// assert_eq!(p.class, DeviceClass::Mobile);
    /// assert_eq!(p.platform, Platform::Ios);
    /// ```
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();

        let platform = if ["iphone", "ipad", "ipod"].iter().any(|k| ua.contains(k)) {
            Platform::Ios
        } else if ua.contains("android") {
            Platform::Android
        } else {
            Platform::Other
        };

        let mobile = platform != Platform::Other
            || ua.contains("blackberry")
            || ua.contains("windows phone");

        let class = if mobile {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        };

        Self { class, platform }
    }

    pub fn is_mobile(&self) -> bool {
        self.class == DeviceClass::Mobile
    }
}
