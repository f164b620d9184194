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

//! Session pipeline and server runtime.
//!
//! Binds a byte [`transport::Transport`] (TCP, Telnet-over-TCP, or
//! WebSocket) to an application [`handler::ServerHandler`] through a
//! [`line::LineEditor`], under the control of one [`server::Server`] per
//! transport and an optional [`supervisor::Supervisor`] across several.

pub mod config;
pub mod error;
pub mod handler;
pub mod line;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod session;
pub mod supervisor;
pub mod transport;
pub mod types;

pub use config::ServerConfig;
pub use error::{Result, ServiceError};
pub use handler::{HandlerFactory, ServerHandler};
pub use line::{LineEditor, LineEvent};
pub use metrics::{MetricsSnapshot, ServerMetrics};
pub use registry::Registry;
pub use server::Server;
pub use session::{SessionEvent, SessionHandle};
pub use supervisor::Supervisor;
pub use transport::Transport;
pub use types::{now_unix_millis, ServerSnapshot, SessionId, SessionInfo, SessionState, TransportKind};
