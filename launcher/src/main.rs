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

use clap::Parser;
use telehub_launcher::cli::{exit_code, Cli};
use telehub_launcher::error::LauncherError;
use telehub_launcher::run;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let log_level = cli
        .log_level
        .map(|level| level.as_directive().to_string())
        .unwrap_or_else(|| "info".to_string());
    run::install_tracing(&log_level);

    match run::run(&cli).await {
        Ok(()) => std::process::exit(exit_code::CLEAN),
        Err(LauncherError::Config(err)) => {
            tracing::error!(error = %err, "configuration error");
            std::process::exit(exit_code::CONFIG_ERROR);
        }
        Err(err) if err.is_bind_failure() => {
            tracing::error!(error = %err, "bind failure");
            std::process::exit(exit_code::BIND_FAILURE);
        }
        Err(err) => {
            tracing::error!(error = %err, "server exited with an error");
            std::process::exit(exit_code::CONFIG_ERROR);
        }
    }
}
