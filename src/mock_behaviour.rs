//! Scripted failures for the mocked task service
//!
//! Each [`GatewayCall`] gets a [`Countdown`]: it succeeds `successes` times, then fails `failures` times, then
//! succeeds again for good. Calls without a countdown always succeed.

use std::collections::HashMap;

use crate::traits::GatewayError;

/// The calls of a [`TaskGateway`](crate::traits::TaskGateway)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatewayCall {
    List,
    Create,
    Update,
    Delete,
    ToggleComplete,
}

impl GatewayCall {
    pub const ALL: [GatewayCall; 5] = [
        GatewayCall::List, GatewayCall::Create, GatewayCall::Update, GatewayCall::Delete, GatewayCall::ToggleComplete,
    ];
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Countdown {
    pub successes: u32,
    pub failures: u32,
}

impl Countdown {
    /// Consume one call of the countdown, and tell whether it should succeed
    fn tick(&mut self) -> bool {
        if self.successes > 0 {
            self.successes -= 1;
            true
        } else if self.failures > 0 {
            self.failures -= 1;
            false
        } else {
            true
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockBehaviour {
    suspended: bool,
    countdowns: HashMap<GatewayCall, Countdown>,
}

impl MockBehaviour {
    /// Every call succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails, `n_fails` times each
    pub fn fail_now(n_fails: u32) -> Self {
        GatewayCall::ALL.iter()
            .fold(Self::new(), |behaviour, &call| behaviour.with_countdown(call, 0, n_fails))
    }

    /// `call` will succeed `successes` times, then fail `failures` times
    pub fn with_countdown(mut self, call: GatewayCall, successes: u32, failures: u32) -> Self {
        self.countdowns.insert(call, Countdown { successes, failures });
        self
    }

    /// The next `n_fails` times `call` is made, it fails
    pub fn failing(self, call: GatewayCall, n_fails: u32) -> Self {
        self.with_countdown(call, 0, n_fails)
    }

    /// What is left of the countdown of `call`
    pub fn countdown(&self, call: GatewayCall) -> Countdown {
        self.countdowns.get(&call).copied().unwrap_or_default()
    }

    /// While suspended, every call succeeds and no countdown moves
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    /// Called by the mocked service before it serves `call`
    pub fn check(&mut self, call: GatewayCall) -> Result<(), GatewayError> {
        if self.suspended {
            return Ok(());
        }
        let countdown = match self.countdowns.get_mut(&call) {
            None => return Ok(()),
            Some(countdown) => countdown,
        };

        if countdown.tick() {
            log::debug!("Mock behaviour: {:?} succeeds ({:?} left)", call, countdown);
            Ok(())
        } else {
            log::debug!("Mock behaviour: {:?} fails ({:?} left)", call, countdown);
            Err(format!("mocked {:?} failure", call).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_without_a_countdown_succeed() {
        let mut behaviour = MockBehaviour::new().failing(GatewayCall::Create, 1);
        for call in GatewayCall::ALL.iter().filter(|&&c| c != GatewayCall::Create) {
            assert!(behaviour.check(*call).is_ok());
        }
        assert_eq!(behaviour.countdown(GatewayCall::List), Countdown::default());
    }

    #[test]
    fn countdowns_run_successes_then_failures() {
        let mut behaviour = MockBehaviour::new().with_countdown(GatewayCall::Update, 1, 2);
        let outcomes: Vec<bool> = (0..4).map(|_| behaviour.check(GatewayCall::Update).is_ok()).collect();
        assert_eq!(outcomes, vec![true, false, false, true]);
        assert_eq!(behaviour.countdown(GatewayCall::Update), Countdown::default());
    }

    #[test]
    fn fail_now_is_per_call() {
        let mut behaviour = MockBehaviour::fail_now(1);
        assert!(behaviour.check(GatewayCall::List).is_err());
        assert!(behaviour.check(GatewayCall::Delete).is_err());
        assert!(behaviour.check(GatewayCall::List).is_ok());
        assert_eq!(behaviour.countdown(GatewayCall::ToggleComplete), Countdown { successes: 0, failures: 1 });
    }

    #[test]
    fn suspended_behaviour_lets_everything_through() {
        let mut behaviour = MockBehaviour::fail_now(1);
        behaviour.suspend();
        assert!(behaviour.check(GatewayCall::Delete).is_ok());
        assert_eq!(behaviour.countdown(GatewayCall::Delete).failures, 1);

        behaviour.resume();
        assert!(behaviour.check(GatewayCall::Delete).is_err());
    }
}
