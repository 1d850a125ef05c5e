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

use std::rc::Rc;

/// Handle returned by [`EventChannel::subscribe`]; pass it back to
/// [`EventChannel::unsubscribe`] to remove the callback.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// A synchronous, ordered registry of observer callbacks.
///
/// Callbacks are invoked on the emitting thread in registration order.
/// `emit` snapshots the subscriber list before iterating, so a callback may
/// subscribe or unsubscribe reentrantly without corrupting the iteration;
/// changes take effect from the next emission.
pub struct EventChannel<E> {
    subscribers: Vec<(u64, Rc<dyn Fn(&E)>)>,
    next_id: u64,
}

impl<E> EventChannel<E> {
    /// Creates an empty channel.
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers a callback and returns its subscription handle.
    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        let id = self.next_id;
        self.next_id += 1;
        self.subscribers.push((id, Rc::new(callback)));
        Subscription(id)
    }

    /// Removes a previously registered callback. Unknown handles are ignored.
    pub fn unsubscribe(&mut self, subscription: Subscription) {
        self.subscribers.retain(|(id, _)| *id != subscription.0);
    }

    /// Number of currently registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// `true` when no subscribers are registered.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Fires `event` at every subscriber, in registration order.
    ///
    /// The subscriber list is snapshotted first; a misbehaving or reentrant
    /// callback cannot disturb the delivery of this emission.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Rc<dyn Fn(&E)>> = self
            .subscribers
            .iter()
            .map(|(_, cb)| Rc::clone(cb))
            .collect();
        for callback in snapshot {
            callback(event);
        }
    }
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
