//! Gate configuration: priced routes, recipient and facilitator bindings

use crate::types::{
    amount::to_minor_units, FacilitatorBinding, FacilitatorBindings, PaymentClaim, PaymentOption,
};
use crate::{Result, X402Error};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

fn default_failure_threshold() -> u16 {
    400
}

/// Configuration for the payment gate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateConfig {
    /// Recipient wallet address, unless an option overrides it
    pub pay_to: String,
    /// Handler statuses at or above this are failures and never settled
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u16,
    /// Exact request path to the options offered for it, in declaration order
    #[serde(default)]
    pub routes: HashMap<String, Vec<PaymentOption>>,
    /// Facilitator(s) used for verify and settle
    pub facilitators: FacilitatorBindings,
}

impl GateConfig {
    /// Create a new gate config
    pub fn new(pay_to: impl Into<String>, facilitators: impl Into<FacilitatorBindings>) -> Self {
        Self {
            pay_to: pay_to.into(),
            failure_threshold: default_failure_threshold(),
            routes: HashMap::new(),
            facilitators: facilitators.into(),
        }
    }

    /// Protect `path` with the given options
    pub fn with_route(mut self, path: impl Into<String>, options: Vec<PaymentOption>) -> Self {
        self.routes.insert(path.into(), options);
        self
    }

    /// Set the handler failure threshold
    pub fn with_failure_threshold(mut self, status: StatusCode) -> Self {
        self.failure_threshold = status.as_u16();
        self
    }

    /// Use a dedicated facilitator for one network
    pub fn with_network_facilitator(
        mut self,
        network: impl Into<String>,
        binding: FacilitatorBinding,
    ) -> Self {
        let mut map = match self.facilitators {
            FacilitatorBindings::PerNetwork(map) => map,
            FacilitatorBindings::Single(_) => HashMap::new(),
        };
        map.insert(network.into(), binding);
        self.facilitators = FacilitatorBindings::PerNetwork(map);
        self
    }

    /// Parse a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| X402Error::config(format!("Invalid gate config: {}", e)))
    }

    /// Load a JSON config file, fill signed credentials from the environment
    /// where the file leaves them out, and validate the result
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            X402Error::config(format!("Cannot read gate config {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_json(&json)?;
        config.facilitators.load_env_credentials()?;
        config.validate()?;

        tracing::info!(
            path = %path.display(),
            routes = config.routes.len(),
            "Loaded gate config"
        );
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.pay_to.trim().is_empty() {
            return Err(X402Error::config("payTo cannot be empty"));
        }

        self.failure_status()?;

        for (path, options) in &self.routes {
            if !path.starts_with('/') {
                return Err(X402Error::config(format!(
                    "Route {:?} must start with '/'",
                    path
                )));
            }
            if options.is_empty() {
                return Err(X402Error::config(format!(
                    "Route {} has no payment options",
                    path
                )));
            }

            let mut networks = HashSet::new();
            for option in options {
                if !networks.insert(option.network.as_str()) {
                    return Err(X402Error::config(format!(
                        "Route {} offers network {} more than once",
                        path, option.network
                    )));
                }
                to_minor_units(&option.price)?;
            }
        }

        for (_, binding) in self.facilitators.iter() {
            binding.validate()?;
        }

        Ok(())
    }

    /// Handler failure threshold as a status code
    pub fn failure_status(&self) -> Result<StatusCode> {
        StatusCode::from_u16(self.failure_threshold).map_err(|_| {
            X402Error::config(format!(
                "Invalid failure threshold {}",
                self.failure_threshold
            ))
        })
    }

    /// Options offered for a request path; exact match only
    pub fn options_for(&self, path: &str) -> Option<&[PaymentOption]> {
        self.routes.get(path).map(Vec::as_slice)
    }
}

/// Pick the option the claim's `network` selects
pub fn select_option<'a>(
    options: &'a [PaymentOption],
    claim: &PaymentClaim,
) -> Result<&'a PaymentOption> {
    options
        .iter()
        .find(|option| option.network == claim.network())
        .ok_or_else(|| X402Error::unsupported_network(claim.network()))
}
