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

//! The fixed-timestep simulation clock.
//!
//! The clock is deliberately decoupled from wall time: every tick advances
//! simulated time by exactly the configured `dt`, so a run is a pure
//! function of its initial conditions no matter how fast the host drives
//! the loop. The host calls [`SimulationClock::tick`] at whatever cadence
//! it likes; a paused or stopped clock simply declines to advance.

/// Lifecycle state of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockState {
    /// Created or reset; simulated time is at zero.
    #[default]
    Stopped,
    /// Ticks advance time.
    Running,
    /// Time is frozen but not rewound; `start` resumes.
    Paused,
}

/// Receives one callback per advancing tick.
pub trait TickListener {
    fn on_tick(&mut self, dt: f64);
}

/// Drives a [`TickListener`] in fixed increments of simulated time.
#[derive(Debug)]
pub struct SimulationClock {
    state: ClockState,
    dt: f64,
    time: f64,
}

impl SimulationClock {
    /// Creates a stopped clock with the given fixed timestep.
    pub fn new(dt: f64) -> Self {
        Self {
            state: ClockState::Stopped,
            dt,
            time: 0.0,
        }
    }

    #[inline]
    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Simulated time elapsed since the last reset.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Starts (or resumes) the clock.
    pub fn start(&mut self) {
        if self.state != ClockState::Running {
            log::debug!("clock started at t = {:.4}", self.time);
            self.state = ClockState::Running;
        }
    }

    /// Freezes time without rewinding. Only a running clock can pause.
    pub fn pause(&mut self) {
        if self.state == ClockState::Running {
            log::debug!("clock paused at t = {:.4}", self.time);
            self.state = ClockState::Paused;
        }
    }

    /// Stops the clock and rewinds simulated time to zero.
    pub fn reset(&mut self) {
        self.state = ClockState::Stopped;
        self.time = 0.0;
    }

    /// Advances one fixed step if the clock is running.
    ///
    /// ## Returns
    /// `true` when the listener was ticked, `false` when the clock declined
    /// (paused or stopped).
    pub fn tick(&mut self, listener: &mut dyn TickListener) -> bool {
        if self.state != ClockState::Running {
            return false;
        }
        self.advance(listener);
        true
    }

    /// Advances exactly one step regardless of state: manual single-step
    /// while paused. Does not change the lifecycle state.
    pub fn step_once(&mut self, listener: &mut dyn TickListener) {
        self.advance(listener);
    }

    fn advance(&mut self, listener: &mut dyn TickListener) {
        self.time += self.dt;
        listener.on_tick(self.dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingListener {
        ticks: u32,
        total: f64,
    }

    impl TickListener for CountingListener {
        fn on_tick(&mut self, dt: f64) {
            self.ticks += 1;
            self.total += dt;
        }
    }

    fn listener() -> CountingListener {
        CountingListener {
            ticks: 0,
            total: 0.0,
        }
    }

    #[test]
    fn stopped_clock_does_not_tick() {
        let mut clock = SimulationClock::new(0.02);
        let mut l = listener();
        assert!(!clock.tick(&mut l));
        assert_eq!(l.ticks, 0);
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn running_clock_advances_in_fixed_steps() {
        let mut clock = SimulationClock::new(0.02);
        let mut l = listener();
        clock.start();
        for _ in 0..5 {
            assert!(clock.tick(&mut l));
        }
        assert_eq!(l.ticks, 5);
        assert!((clock.time() - 0.1).abs() < 1e-12);
        assert!((l.total - 0.1).abs() < 1e-12);
    }

    #[test]
    fn pause_freezes_without_rewinding() {
        let mut clock = SimulationClock::new(0.1);
        let mut l = listener();
        clock.start();
        clock.tick(&mut l);
        clock.pause();
        assert_eq!(clock.state(), ClockState::Paused);
        assert!(!clock.tick(&mut l));
        assert!((clock.time() - 0.1).abs() < 1e-12);

        clock.start();
        assert!(clock.tick(&mut l));
        assert_eq!(l.ticks, 2);
    }

    #[test]
    fn pause_on_non_running_clock_is_a_no_op() {
        let mut clock = SimulationClock::new(0.1);
        clock.pause();
        assert_eq!(clock.state(), ClockState::Stopped);
    }

    #[test]
    fn step_once_works_while_paused() {
        let mut clock = SimulationClock::new(0.25);
        let mut l = listener();
        clock.start();
        clock.pause();
        clock.step_once(&mut l);
        clock.step_once(&mut l);
        assert_eq!(l.ticks, 2);
        assert_eq!(clock.state(), ClockState::Paused);
        assert!((clock.time() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn reset_rewinds_time_and_stops() {
        let mut clock = SimulationClock::new(0.1);
        let mut l = listener();
        clock.start();
        clock.tick(&mut l);
        clock.reset();
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.time(), 0.0);
    }
}
