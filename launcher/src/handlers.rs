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

//! Handler factory registry (9, "Dynamic handler class resolution").
//!
//! The YAML `handler_class` field is just a lookup key into this table,
//! populated at process start with ordinary constructors; there is no
//! runtime code loading.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use telehub_service::{HandlerFactory, ServerHandler, SessionHandle, SessionId};

/// Minimal reference handler exercising scenario 1: echoes each line back
/// prefixed with `Echo: `.
pub struct EchoHandler;

#[async_trait]
impl ServerHandler for EchoHandler {
    async fn on_line(&self, _id: SessionId, session: &SessionHandle, line: &str) {
        session.write_line(format!("Echo: {line}"));
    }
}

/// Builds the handler factory registry available to configuration. Callers
/// embedding this crate as a library can extend the returned map before
/// passing it to `run`.
pub fn default_registry() -> HashMap<String, HandlerFactory> {
    let mut registry = HashMap::new();
    registry.insert(
        "echo".to_string(),
        Arc::new(|| Arc::new(EchoHandler) as Arc<dyn ServerHandler>) as HandlerFactory,
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_the_echo_handler() {
        let registry = default_registry();
        assert!(registry.contains_key("echo"));
    }

    #[test]
    fn factory_produces_independent_instances() {
        let registry = default_registry();
        let factory = registry.get("echo").unwrap();
        let a = factory();
        let b = factory();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
