// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Enumeration lifecycle of the device.
//!
//! ```text
//! Uninitialized --session valid--> Powered --bus reset--> ResettingBus
//!     --enumeration done--> DefaultAddress --SET_ADDRESS--> Addressed
//! ```
//!
//! `DefaultAddress` and `Addressed` may be suspended by the host; wakeup
//! returns to the state that was suspended. A trigger that arrives in any
//! other state is not honored and leaves the state as it is.

/// Where the device is in enumeration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeviceState {
    Uninitialized,
    Powered,
    ResettingBus,
    DefaultAddress,
    Addressed,
    Suspended,
}

/// Hardware and protocol events that move the state machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// B-session valid was seen with a session request.
    SessionValid,
    BusReset,
    EnumerationDone,
    /// SET_ADDRESS with the given address.
    AddressAssigned(u8),
    Suspend,
}

impl DeviceState {
    /// The state `trigger` leads to from `self`, or `None` if `trigger` is
    /// not honored in `self`.
    pub fn next(self, trigger: Trigger) -> Option<DeviceState> {
        match (self, trigger) {
            (DeviceState::Uninitialized, Trigger::SessionValid) => Some(DeviceState::Powered),
            (DeviceState::Powered, Trigger::BusReset) => Some(DeviceState::ResettingBus),
            (DeviceState::ResettingBus, Trigger::EnumerationDone) => {
                Some(DeviceState::DefaultAddress)
            }
            // Address 0 returns an addressed device to the default state
            (DeviceState::DefaultAddress | DeviceState::Addressed, Trigger::AddressAssigned(0)) => {
                Some(DeviceState::DefaultAddress)
            }
            (DeviceState::DefaultAddress | DeviceState::Addressed, Trigger::AddressAssigned(_)) => {
                Some(DeviceState::Addressed)
            }
            (DeviceState::DefaultAddress | DeviceState::Addressed, Trigger::Suspend) => {
                Some(DeviceState::Suspended)
            }
            _ => None,
        }
    }

    /// Whether endpoint 0 has its default configuration and can take
    /// standard requests.
    pub fn accepts_requests(self) -> bool {
        matches!(self, DeviceState::DefaultAddress | DeviceState::Addressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    const STATES: [DeviceState; 6] = [
        DeviceState::Uninitialized,
        DeviceState::Powered,
        DeviceState::ResettingBus,
        DeviceState::DefaultAddress,
        DeviceState::Addressed,
        DeviceState::Suspended,
    ];

    const ENUMERATION_TRIGGERS: [Trigger; 3] = [
        Trigger::SessionValid,
        Trigger::BusReset,
        Trigger::EnumerationDone,
    ];

    fn rank(state: DeviceState) -> usize {
        STATES.iter().position(|s| *s == state).unwrap()
    }

    #[test]
    fn enumeration_in_order() {
        let mut state = DeviceState::Uninitialized;
        for trigger in ENUMERATION_TRIGGERS {
            state = state.next(trigger).unwrap();
        }
        assert_eq!(state, DeviceState::DefaultAddress);
        assert_eq!(state.next(Trigger::AddressAssigned(5)), Some(DeviceState::Addressed));
    }

    #[test]
    fn triggers_only_honored_in_source_state() {
        let sources = [
            (Trigger::SessionValid, DeviceState::Uninitialized),
            (Trigger::BusReset, DeviceState::Powered),
            (Trigger::EnumerationDone, DeviceState::ResettingBus),
        ];
        for (trigger, source) in sources {
            for state in STATES {
                if state != source {
                    assert_eq!(state.next(trigger), None, "{:?} in {:?}", trigger, state);
                }
            }
        }
    }

    #[test]
    fn every_trigger_sequence_only_advances() {
        // All sequences of length 5 over the three enumeration triggers.
        let n = ENUMERATION_TRIGGERS.len();
        for mut code in 0..n.pow(5) {
            let mut sequence = Vec::new();
            for _ in 0..5 {
                sequence.push(ENUMERATION_TRIGGERS[code % n]);
                code /= n;
            }

            let mut state = DeviceState::Uninitialized;
            for trigger in sequence {
                let before = state;
                state = state.next(trigger).unwrap_or(state);
                assert!(rank(state) == rank(before) || rank(state) == rank(before) + 1);
                assert!(rank(state) <= rank(DeviceState::DefaultAddress));
            }
        }
    }

    #[test]
    fn address_and_suspend() {
        assert_eq!(
            DeviceState::Addressed.next(Trigger::AddressAssigned(0)),
            Some(DeviceState::DefaultAddress)
        );
        assert_eq!(DeviceState::Powered.next(Trigger::AddressAssigned(5)), None);
        // Suspend before enumeration would swallow the first bus reset
        assert_eq!(DeviceState::Powered.next(Trigger::Suspend), None);
        assert_eq!(
            DeviceState::Addressed.next(Trigger::Suspend),
            Some(DeviceState::Suspended)
        );
        assert!(!DeviceState::Suspended.accepts_requests());
    }
}
