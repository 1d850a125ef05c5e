// Copyright 2025 eraflo
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

//! Notification plumbing that decouples the simulation core from any view.
//!
//! Two complementary mechanisms:
//! * [`channel::EventChannel`] — synchronous observer callbacks, fired on
//!   the caller's thread in registration order.
//! * [`bus::EventBus`] — a queued channel an external consumer (a view
//!   layer on another thread) drains at its own pace.

pub mod bus;
pub mod channel;

pub use bus::EventBus;
pub use channel::{EventChannel, Subscription};
