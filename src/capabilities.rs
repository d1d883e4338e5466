//! Optional capabilities of the surrounding application.
//!
//! The analytics never depend on these; collaborators ask before doing
//! chart rendering or routing tabular input.

use crate::settings::Settings;
use serde::Serialize;

pub trait Capabilities {
    fn supports_charts(&self) -> bool;
    fn supports_tabular_input(&self) -> bool;

    fn snapshot(&self) -> CapabilitySnapshot {
        CapabilitySnapshot { charts: self.supports_charts(), tabular_input: self.supports_tabular_input() }
    }
}

/// Point-in-time view recorded on a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitySnapshot {
    pub charts: bool,
    pub tabular_input: bool,
}

impl Capabilities for CapabilitySnapshot {
    fn supports_charts(&self) -> bool {
        self.charts
    }

    fn supports_tabular_input(&self) -> bool {
        self.tabular_input
    }
}

/// Fixed capabilities. The built-in CSV reader is always present; charts
/// follow [`Settings::enable_charts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCapabilities {
    charts: bool,
    tabular_input: bool,
}

impl StaticCapabilities {
    pub fn new(charts: bool, tabular_input: bool) -> Self {
        Self { charts, tabular_input }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self { charts: settings.enable_charts, tabular_input: true }
    }
}

impl Capabilities for StaticCapabilities {
    fn supports_charts(&self) -> bool {
        self.charts
    }

    fn supports_tabular_input(&self) -> bool {
        self.tabular_input
    }
}
