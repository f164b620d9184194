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

//! Process-wide publish/subscribe bus for session activity.
//!
//! A [`MonitorBus`] owns the subscriber set; servers publish lifecycle and
//! traffic events into it, independent observers subscribe over the same
//! WebSocket transport machinery the session pipeline uses for clients.
//! Deliberately has no dependency on `telehub-service`'s types: the
//! conversion from a session snapshot to a [`SessionSummary`] happens at the
//! call site, keeping this crate usable by anything that wants a pub/sub
//! event bus shaped like this one.

pub mod bus;
pub mod endpoint;
pub mod event;

pub use bus::{MonitorBus, SessionPublisher, SubscriberId};
pub use endpoint::serve;
pub use event::{
    BusEvent, ClientInfo, SessionRef, SessionSummary, SubscriberCommand, TrafficData, WatchStatus,
};
