//! Init-time controller configuration.
//!
//! Built once by the front-end (firmware `main`, emulator argument parser) and
//! handed to the controller by value; nothing here changes after startup.

use crate::alerts::AlertProfile;

/// Serial line rate expected by host software.
pub const BAUD_RATE: u32 = 115_200;

/// First banner line printed before `READY`.
pub const DEFAULT_BANNER: &str = "Transit alert controller";

/// Build/init-time toggles read by the dispatcher.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FeatureFlags {
    /// When cleared, `DEST_*` and `LED_STATUS_DEST` are acknowledged but not executed.
    pub destination_alerts: bool,
}

impl FeatureFlags {
    pub const fn new() -> Self {
        Self {
            destination_alerts: true,
        }
    }

    #[must_use]
    pub const fn with_destination_alerts(mut self, enabled: bool) -> Self {
        self.destination_alerts = enabled;
        self
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// How alert execution shares the timeline with command intake.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExecutionModel {
    /// Dispatch owns the timeline until the alert finishes, then acknowledges.
    Blocking,
    /// Dispatch starts the alert and acknowledges; polling advances it.
    #[default]
    Incremental,
}

impl ExecutionModel {
    pub const fn label(self) -> &'static str {
        match self {
            ExecutionModel::Blocking => "blocking",
            ExecutionModel::Incremental => "incremental",
        }
    }

    /// Parses the lower-case label used on command lines.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "blocking" => Some(ExecutionModel::Blocking),
            "incremental" => Some(ExecutionModel::Incremental),
            _ => None,
        }
    }
}

/// Everything the controller needs at startup.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ControllerConfig {
    pub flags: FeatureFlags,
    pub model: ExecutionModel,
    pub profile: AlertProfile,
    pub banner: &'static str,
    /// Run the channel sweep after `READY`.
    pub self_test: bool,
}

impl ControllerConfig {
    pub const fn new() -> Self {
        Self {
            flags: FeatureFlags::new(),
            model: ExecutionModel::Incremental,
            profile: AlertProfile::canonical(),
            banner: DEFAULT_BANNER,
            self_test: true,
        }
    }

    #[must_use]
    pub const fn with_flags(mut self, flags: FeatureFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub const fn with_model(mut self, model: ExecutionModel) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub const fn with_profile(mut self, profile: AlertProfile) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub const fn with_banner(mut self, banner: &'static str) -> Self {
        self.banner = banner;
        self
    }

    #[must_use]
    pub const fn with_self_test(mut self, enabled: bool) -> Self {
        self.self_test = enabled;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::new()
    }
}
