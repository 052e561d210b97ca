use std::time::Duration;

use bon::Builder;
use clap::ValueEnum;
use serde::Serialize;

pub(crate) const DEFAULT_FIRMWARE_NAME: &str = "Marlin mock";
pub(crate) const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(1);
pub(crate) const DEFAULT_TEMPERATURE_INTERVAL: Duration = Duration::from_secs(1);
pub(crate) const AMBIENT_TEMPERATURE: u16 = 20;

/// What a session reset does to the selected and open-for-write files.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResetPolicy {
    /// Forget both the print selection and any open write.
    #[default]
    ClearSelection,
    /// Keep the print selection and any open write across the reset.
    PreserveSelection,
}

/// Static settings of a virtual firmware instance.
#[derive(Debug, Clone, Builder)]
pub struct FirmwareConfig {
    /// Identity reported by `M115`.
    #[builder(into, default = String::from(DEFAULT_FIRMWARE_NAME))]
    firmware_name: String,
    /// Print progress interval used until `M27 S<seconds>` overrides it.
    #[builder(default = DEFAULT_STATUS_INTERVAL)]
    status_interval: Duration,
    /// Interval of temperature reports while a target is set.
    #[builder(default = DEFAULT_TEMPERATURE_INTERVAL)]
    temperature_interval: Duration,
    #[builder(default)]
    reset_policy: ResetPolicy,
    /// Temperature reported for both the hotend and the bed.
    #[builder(default = AMBIENT_TEMPERATURE)]
    ambient_temperature: u16,
}

impl FirmwareConfig {
    #[must_use]
    pub fn firmware_name(&self) -> &str {
        &self.firmware_name
    }

    #[must_use]
    pub fn status_interval(&self) -> Duration {
        self.status_interval
    }

    #[must_use]
    pub fn temperature_interval(&self) -> Duration {
        self.temperature_interval
    }

    #[must_use]
    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset_policy
    }

    #[must_use]
    pub fn ambient_temperature(&self) -> u16 {
        self.ambient_temperature
    }
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
