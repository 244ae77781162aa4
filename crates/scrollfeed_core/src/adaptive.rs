use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, EntitySchema};

/// Viewports narrower than this many logical pixels count as narrow.
pub const NARROW_VIEWPORT_MAX_WIDTH: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Campaigns,
    History,
    Dashboard,
    Employees,
    Evaluations,
    Search,
    Mobile,
}

impl ContentType {
    pub const ALL: [ContentType; 7] = [
        ContentType::Campaigns,
        ContentType::History,
        ContentType::Dashboard,
        ContentType::Employees,
        ContentType::Evaluations,
        ContentType::Search,
        ContentType::Mobile,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Campaigns => "campaigns",
            ContentType::History => "history",
            ContentType::Dashboard => "dashboard",
            ContentType::Employees => "employees",
            ContentType::Evaluations => "evaluations",
            ContentType::Search => "search",
            ContentType::Mobile => "mobile",
        }
    }

    /// Unadjusted values for this list type.
    pub fn base_config(self) -> AdaptiveConfig {
        let (page_size, threshold, root_margin, batch_size, debounce_ms) = match self {
            ContentType::Campaigns => (6, 200, 100, 3, 300),
            ContentType::History => (10, 300, 150, 5, 500),
            ContentType::Dashboard => (4, 100, 50, 2, 200),
            ContentType::Employees => (12, 250, 100, 6, 400),
            ContentType::Evaluations => (8, 150, 75, 4, 300),
            ContentType::Search => (15, 200, 100, 5, 500),
            ContentType::Mobile => (5, 150, 75, 2, 400),
        };
        AdaptiveConfig {
            page_size,
            threshold,
            root_margin: RootMargin(root_margin),
            debounce_ms,
            batch_size,
        }
    }

    /// Normalization schema for the records this list type returns.
    pub fn default_schema(self) -> EntitySchema {
        match self {
            ContentType::Campaigns
            | ContentType::History
            | ContentType::Dashboard
            | ContentType::Mobile => EntitySchema::campaign(),
            ContentType::Employees | ContentType::Search => EntitySchema::employee(),
            ContentType::Evaluations => EntitySchema::evaluation(),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        ContentType::ALL
            .into_iter()
            .find(|content_type| content_type.as_str() == wanted)
            .ok_or_else(|| ConfigError::UnknownContentType(value.to_string()))
    }
}

/// Effective connection class, mirroring the browser's `effectiveType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionClass {
    Slow2g,
    TwoG,
    ThreeG,
    FourG,
    #[default]
    Unknown,
}

impl ConnectionClass {
    pub fn is_slow(self) -> bool {
        matches!(self, ConnectionClass::Slow2g | ConnectionClass::TwoG)
    }
}

impl FromStr for ConnectionClass {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "slow-2g" | "slow2g" => Ok(ConnectionClass::Slow2g),
            "2g" => Ok(ConnectionClass::TwoG),
            "3g" => Ok(ConnectionClass::ThreeG),
            "4g" => Ok(ConnectionClass::FourG),
            "unknown" => Ok(ConnectionClass::Unknown),
            _ => Err(ConfigError::UnknownConnectionClass(value.to_string())),
        }
    }
}

/// Host environment readings the resolver depends on.
pub trait EnvironmentProbe {
    fn is_narrow_viewport(&self) -> bool;
    fn connection_class(&self) -> ConnectionClass;
}

impl<P: EnvironmentProbe + ?Sized> EnvironmentProbe for &P {
    fn is_narrow_viewport(&self) -> bool {
        (**self).is_narrow_viewport()
    }

    fn connection_class(&self) -> ConnectionClass {
        (**self).connection_class()
    }
}

/// Fixed readings, for hosts that learn them once and for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticProbe {
    pub viewport_width: u32,
    pub connection: ConnectionClass,
}

impl StaticProbe {
    pub fn narrow() -> Self {
        Self {
            viewport_width: 375,
            ..Self::default()
        }
    }

    pub fn with_connection(mut self, connection: ConnectionClass) -> Self {
        self.connection = connection;
        self
    }
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self {
            viewport_width: 1280,
            connection: ConnectionClass::Unknown,
        }
    }
}

impl EnvironmentProbe for StaticProbe {
    fn is_narrow_viewport(&self) -> bool {
        self.viewport_width < NARROW_VIEWPORT_MAX_WIDTH
    }

    fn connection_class(&self) -> ConnectionClass {
        self.connection
    }
}

/// Margin around the viewport used when observing the sentinel, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootMargin(pub u32);

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.0)
    }
}

impl FromStr for RootMargin {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
        digits
            .parse()
            .map(RootMargin)
            .map_err(|_| ConfigError::InvalidRootMargin(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    pub page_size: usize,
    /// Distance from the list end, in pixels, that counts as "near the end".
    pub threshold: u32,
    pub root_margin: RootMargin,
    pub debounce_ms: u64,
    pub batch_size: usize,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        ContentType::Campaigns.base_config()
    }
}

/// Caller-supplied values that replace the resolved ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub page_size: Option<usize>,
    pub threshold: Option<u32>,
    pub root_margin: Option<RootMargin>,
    pub debounce_ms: Option<u64>,
    pub batch_size: Option<usize>,
}

/// Resolves paging parameters from a content type and environment readings.
///
/// Resolution happens when `resolve` is called; later environment changes only
/// take effect on the next call.
#[derive(Debug, Clone)]
pub struct AdaptiveConfigResolver<P> {
    probe: P,
}

impl<P: EnvironmentProbe> AdaptiveConfigResolver<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn resolve(
        &self,
        content_type: ContentType,
        overrides: &ConfigOverrides,
    ) -> Result<AdaptiveConfig, ConfigError> {
        let mut config = content_type.base_config();

        if self.probe.is_narrow_viewport() {
            config.page_size = (config.page_size * 6 / 10).max(3);
            config.threshold = config.threshold * 8 / 10;
            config.batch_size = (config.batch_size / 2).max(1);
        }

        if self.probe.connection_class().is_slow() {
            config.page_size = (config.page_size * 4 / 10).max(2);
            config.threshold = config.threshold * 15 / 10;
            config.debounce_ms *= 2;
        }

        apply_overrides(&mut config, overrides);
        if config.page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }
        Ok(config)
    }
}

fn apply_overrides(config: &mut AdaptiveConfig, overrides: &ConfigOverrides) {
    if let Some(page_size) = overrides.page_size {
        config.page_size = page_size;
    }
    if let Some(threshold) = overrides.threshold {
        config.threshold = threshold;
    }
    if let Some(root_margin) = overrides.root_margin {
        config.root_margin = root_margin;
    }
    if let Some(debounce_ms) = overrides.debounce_ms {
        config.debounce_ms = debounce_ms;
    }
    if let Some(batch_size) = overrides.batch_size {
        config.batch_size = batch_size;
    }
}
