use serde::{Deserialize, Serialize};

use crate::core::{
    CanonicalConstraintId, DEFAULT_FLOW_LIMIT_SENTINEL, DEFAULT_RAW_LIMIT_SENTINEL, DateWindow,
    LimitSentinels, PoolId, ScenarioName, TOTAL_LOAD_ZONE,
};
use crate::error::{PostMortemError, PostMortemResult};

/// Inputs of one post-mortem dashboard build.
///
/// Serializable so notebooks and CLIs can keep dashboard setups as JSON
/// files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub pool: PoolId,
    pub constraint: CanonicalConstraintId,
    /// Window of the hourly panels, both ends included.
    pub window: DateWindow,
    /// Months of the historical shadow-price panel; `None` reads the full
    /// history.
    #[serde(default)]
    pub history_window: Option<DateWindow>,
    /// FTR window of the binding-hours summary; no summary without one.
    #[serde(default)]
    pub ftr_window: Option<DateWindow>,
    pub flow_scenarios: Vec<ScenarioName>,
    #[serde(default)]
    pub shadow_price_factor_scenarios: Vec<ScenarioName>,
    #[serde(default)]
    pub history_scenarios: Vec<ScenarioName>,
    pub first_priority: ScenarioName,
    /// Breakdown scenario selected when the dashboard opens.
    #[serde(default)]
    pub default_breakdown: Option<ScenarioName>,
    #[serde(default)]
    pub query_tag: Option<String>,
    #[serde(default = "default_flow_limit_sentinel")]
    pub flow_limit_sentinel: f64,
    #[serde(default = "default_raw_limit_sentinel")]
    pub raw_limit_sentinel: f64,
    /// Adds the demand and wind figures of the flow scenarios.
    #[serde(default)]
    pub grid_context: bool,
    /// Load zone of the demand figure.
    #[serde(default = "default_load_zone")]
    pub load_zone: String,
    /// Scenarios of the pool-wide post-mortem table; no table without any.
    #[serde(default)]
    pub post_mortem_scenarios: Vec<ScenarioName>,
}

impl DashboardConfig {
    /// Minimal config: flows only, no breakdown or history scenarios.
    #[must_use]
    pub fn new(
        pool: PoolId,
        constraint: CanonicalConstraintId,
        window: DateWindow,
        flow_scenarios: Vec<ScenarioName>,
        first_priority: ScenarioName,
    ) -> Self {
        Self {
            pool,
            constraint,
            window,
            history_window: None,
            ftr_window: None,
            flow_scenarios,
            shadow_price_factor_scenarios: Vec::new(),
            history_scenarios: Vec::new(),
            first_priority,
            default_breakdown: None,
            query_tag: None,
            flow_limit_sentinel: default_flow_limit_sentinel(),
            raw_limit_sentinel: default_raw_limit_sentinel(),
            grid_context: false,
            load_zone: default_load_zone(),
            post_mortem_scenarios: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_shadow_price_factor_scenarios(mut self, scenarios: Vec<ScenarioName>) -> Self {
        self.shadow_price_factor_scenarios = scenarios;
        self
    }

    #[must_use]
    pub fn with_history_scenarios(mut self, scenarios: Vec<ScenarioName>) -> Self {
        self.history_scenarios = scenarios;
        self
    }

    #[must_use]
    pub fn with_history_window(mut self, window: Option<DateWindow>) -> Self {
        self.history_window = window;
        self
    }

    #[must_use]
    pub fn with_ftr_window(mut self, window: Option<DateWindow>) -> Self {
        self.ftr_window = window;
        self
    }

    #[must_use]
    pub fn with_default_breakdown(mut self, scenario: Option<ScenarioName>) -> Self {
        self.default_breakdown = scenario;
        self
    }

    #[must_use]
    pub fn with_query_tag(mut self, tag: Option<String>) -> Self {
        self.query_tag = tag;
        self
    }

    #[must_use]
    pub fn with_limit_sentinels(mut self, sentinels: LimitSentinels) -> Self {
        self.flow_limit_sentinel = sentinels.flow_limit;
        self.raw_limit_sentinel = sentinels.raw_limit;
        self
    }

    #[must_use]
    pub fn with_grid_context(mut self, enabled: bool) -> Self {
        self.grid_context = enabled;
        self
    }

    #[must_use]
    pub fn with_load_zone(mut self, zone: impl Into<String>) -> Self {
        self.load_zone = zone.into();
        self
    }

    #[must_use]
    pub fn with_post_mortem_scenarios(mut self, scenarios: Vec<ScenarioName>) -> Self {
        self.post_mortem_scenarios = scenarios;
        self
    }

    #[must_use]
    pub fn limit_sentinels(&self) -> LimitSentinels {
        LimitSentinels {
            raw_limit: self.raw_limit_sentinel,
            flow_limit: self.flow_limit_sentinel,
        }
    }

    pub fn validate(&self) -> PostMortemResult<()> {
        self.window.validate()?;
        for window in [self.history_window, self.ftr_window].into_iter().flatten() {
            window.validate()?;
        }
        if !self.flow_scenarios.contains(&self.first_priority) {
            return Err(PostMortemError::InvalidConfig(format!(
                "first-priority scenario {} is not a flow scenario",
                self.first_priority
            )));
        }
        for (name, value) in [
            ("flow limit sentinel", self.flow_limit_sentinel),
            ("raw limit sentinel", self.raw_limit_sentinel),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PostMortemError::InvalidConfig(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if self.load_zone.trim().is_empty() {
            return Err(PostMortemError::InvalidConfig(
                "load zone must not be empty".to_owned(),
            ));
        }
        if let Some(scenario) = &self.default_breakdown {
            if !self.shadow_price_factor_scenarios.contains(scenario) {
                return Err(PostMortemError::InvalidConfig(format!(
                    "default breakdown scenario {scenario} is not a shadow-price-factor scenario"
                )));
            }
        }
        Ok(())
    }

    /// Serializes config to pretty JSON.
    pub fn to_json_pretty(&self) -> PostMortemResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PostMortemError::InvalidData(format!("failed to serialize config: {e}")))
    }

    /// Deserializes config from JSON. Does not validate.
    pub fn from_json_str(input: &str) -> PostMortemResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| PostMortemError::InvalidData(format!("failed to parse config: {e}")))
    }
}

fn default_flow_limit_sentinel() -> f64 {
    DEFAULT_FLOW_LIMIT_SENTINEL
}

fn default_raw_limit_sentinel() -> f64 {
    DEFAULT_RAW_LIMIT_SENTINEL
}

fn default_load_zone() -> String {
    TOTAL_LOAD_ZONE.to_owned()
}
