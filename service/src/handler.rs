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

//! The application extension point: [`ServerHandler`].
//!
//! A session owns a Telnet codec, a line editor, and one `Arc<dyn
//! ServerHandler>` obtained fresh from a handler factory on accept.
//! Behavioral variation across applications (echo, stock feed, MUD) lives
//! entirely in handler implementations; the pipeline itself never varies.

use crate::error::ServiceError;
use crate::session::SessionHandle;
use crate::types::SessionId;
use async_trait::async_trait;
use std::sync::Arc;

/// Event handler trait implemented by applications built on this framework.
///
/// All methods have default no-op implementations; implement only the ones
/// your application needs.
#[async_trait]
pub trait ServerHandler: Send + Sync + 'static {
    /// Called once the session has finished welcome + negotiation and enters `Running`.
    async fn on_connect(&self, _id: SessionId, _session: &SessionHandle) {}

    /// Called with each line the character handler assembles, after built-in
    /// pre-processing (whitespace trim, `quit`/`exit`/`q` handling) has run.
    async fn on_line(&self, _id: SessionId, _session: &SessionHandle, _line: &str) {}

    /// Called when an error terminates the session. The session closes after this returns.
    async fn on_error(&self, _id: SessionId, _session: &SessionHandle, _error: &ServiceError) {}

    /// Called when the handler callback itself exceeded its deadline.
    async fn on_timeout(&self, _id: SessionId, _session: &SessionHandle) {}

    /// Called when the session has been idle past `connection_timeout`.
    async fn on_idle_timeout(&self, _id: SessionId, _session: &SessionHandle) {}

    /// Called once, as the session transitions to `Closed`.
    async fn on_disconnect(&self, _id: SessionId, _session: &SessionHandle) {}
}

/// Constructs a fresh handler instance for each accepted session.
///
/// Kept as a boxed closure rather than a trait so the launcher's handler
/// registry (a `HashMap<String, HandlerFactory>`) can be populated with
/// ordinary function items and closures alike.
pub type HandlerFactory = Arc<dyn Fn() -> Arc<dyn ServerHandler> + Send + Sync>;
