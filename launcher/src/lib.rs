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

//! CLI, configuration, handler registry, and process wiring for the
//! `telehub` binary.

pub mod bridge;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod run;

pub use cli::Cli;
pub use error::{ConfigError, LauncherError};
