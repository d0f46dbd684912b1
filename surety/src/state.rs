//! The aggregate state owned by the store.

use crate::gate::Gate;
use crate::oracle::Oracles;
use crate::policy::Ledger;
use crate::registry::Registry;
use crate::types::Address;

/// Complete state of the insurance system.
///
/// One owned value holding every component; the store clones it for each
/// transition and swaps it in on commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuretyState {
    /// Pause switch
    pub gate: Gate,
    /// Airline membership, funding and votes
    pub registry: Registry,
    /// Policies and credit balances
    pub ledger: Ledger,
    /// Oracle registrations, requests and flight statuses
    pub oracles: Oracles,
}

impl SuretyState {
    /// Initial state: an open gate controlled by `owner` and a registry whose
    /// only member is `first_airline`, registered and unfunded.
    #[must_use]
    pub fn genesis(owner: Address, first_airline: Address) -> Self {
        Self {
            gate: Gate::new(owner),
            registry: Registry::genesis(first_airline),
            ledger: Ledger::default(),
            oracles: Oracles::default(),
        }
    }
}
