//! Operational gate: the owner's pause switch.

use flight_surety_core::reducer::Events;
use flight_surety_core::smallvec;

use crate::error::SuretyError;
use crate::event::SuretyEvent;
use crate::types::Address;

/// Process-wide pause switch, owned by a single identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gate {
    owner: Address,
    operational: bool,
}

impl Gate {
    /// Creates an open gate controlled by `owner`
    #[must_use]
    pub const fn new(owner: Address) -> Self {
        Self {
            owner,
            operational: true,
        }
    }

    /// Whether mutating commands are accepted
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        self.operational
    }

    /// The identity allowed to flip the gate
    #[must_use]
    pub const fn owner(&self) -> &Address {
        &self.owner
    }

    /// Fails with [`SuretyError::ContractNotOperational`] while paused.
    ///
    /// # Errors
    ///
    /// Returns an error when the gate is closed.
    pub const fn ensure_open(&self) -> Result<(), SuretyError> {
        if self.operational {
            Ok(())
        } else {
            Err(SuretyError::ContractNotOperational)
        }
    }

    /// Sets the flag. Setting the current value is accepted and emits nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SuretyError::NotOwner`] if `caller` is not the owner.
    pub fn set_operating_status(
        &mut self,
        operational: bool,
        caller: &Address,
    ) -> Result<Events<SuretyEvent>, SuretyError> {
        if *caller != self.owner {
            return Err(SuretyError::NotOwner(caller.clone()));
        }
        if self.operational == operational {
            return Ok(Events::new());
        }
        self.operational = operational;
        Ok(smallvec![SuretyEvent::OperatingStatusChanged { operational }])
    }
}
