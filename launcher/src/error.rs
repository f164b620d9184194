//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Errors raised while loading configuration or standing up listeners,
//! converging here from every other crate boundary (7, Taxonomy).

use thiserror::Error;

/// Malformed configuration, a missing handler factory, or a validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("no handler registered for identifier `{0}`")]
    UnknownHandler(String),

    #[error("`use_ssl` is set but `{0}` is missing")]
    IncompleteTls(&'static str),

    #[error("{0}")]
    Invalid(String),
}

/// The top-level error `main` maps to an exit code. A listener bind failure
/// and a later accept-loop fault both surface as `ServiceError::TransportFault`
/// from the supervisor (6.1, exit code 2 covers both).
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Service(#[from] telehub_service::ServiceError),
}

impl LauncherError {
    /// Whether this failure belongs to listener setup/accept rather than
    /// configuration, per the exit-code table in 6.1.
    pub fn is_bind_failure(&self) -> bool {
        matches!(
            self,
            LauncherError::Service(telehub_service::ServiceError::TransportFault(_))
        )
    }
}
