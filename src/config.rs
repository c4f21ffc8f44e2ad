// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::ops::Index;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// The number of weights in the FSRS parameter vector.
pub const WEIGHT_COUNT: usize = 17;

/// The FSRS weight vector.
///
/// Weights 0-3 are the initial stabilities for each grade, the rest
/// parameterize the difficulty and stability update formulas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weights([f64; WEIGHT_COUNT]);

impl Weights {
    pub fn new(weights: [f64; WEIGHT_COUNT]) -> Self {
        Self(weights)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self([
            0.4, 0.6, 2.4, 5.8, 4.93, 0.94, 0.86, 0.01, 1.49, 0.14, 0.94, 2.18, 0.05, 0.34, 1.26,
            0.29, 2.61,
        ])
    }
}

impl Index<usize> for Weights {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

/// Scheduler parameters.
///
/// Always passed to the scheduler explicitly: the weights are tunable per
/// deployment, so they live in a config value rather than in constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// The FSRS weight vector.
    pub weights: Weights,
    /// The recall probability the scheduler aims for at review time.
    pub desired_retention: f64,
    /// The longest interval, in days, the scheduler will ever assign.
    pub maximum_interval: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            desired_retention: 0.9,
            maximum_interval: 36500,
        }
    }
}

impl SchedulerConfig {
    /// Parse a config from a TOML document. Missing fields take their
    /// default values.
    pub fn from_toml_str(content: &str) -> Fallible<Self> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Fallible<()> {
        for (index, weight) in self.weights.as_slice().iter().enumerate() {
            if !weight.is_finite() {
                return Err(ErrorReport::invalid_argument(format!(
                    "weight {index} is not finite"
                )));
            }
        }
        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return Err(ErrorReport::invalid_argument(
                "desired retention must be strictly between 0 and 1",
            ));
        }
        if self.maximum_interval < 1 {
            return Err(ErrorReport::invalid_argument(
                "maximum interval must be at least one day",
            ));
        }
        Ok(())
    }
}
