//! Policy ledger: passenger policies and credit balances.

use chrono::{DateTime, Utc};
use flight_surety_core::reducer::Events;
use flight_surety_core::smallvec;
use std::collections::HashMap;

use crate::error::SuretyError;
use crate::event::SuretyEvent;
use crate::types::{Address, Parameters, StatusCode, Wei};

/// A passenger's insurance on one flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Policy {
    /// Policy holder
    pub passenger: Address,
    /// Airline operating the flight
    pub airline: Address,
    /// Insured flight
    pub flight: String,
    /// Premium paid, fixed at purchase
    pub price_paid: Wei,
    /// Open until the flight's status is finalized
    pub open: bool,
    /// Finalized status, `Unknown` while open
    pub status: StatusCode,
    /// When the policy was bought
    pub purchased_at: DateTime<Utc>,
}

/// Policies and withdrawable credit per passenger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    /// Policies per passenger in purchase order
    policies: HashMap<Address, Vec<Policy>>,
    credits: HashMap<Address, Wei>,
}

impl Ledger {
    /// Policies held by `passenger` that are still open
    pub fn active_policies(&self, passenger: &Address) -> impl Iterator<Item = &Policy> {
        self.policies_of(passenger).iter().filter(|policy| policy.open)
    }

    /// Every policy `passenger` ever bought, in purchase order
    #[must_use]
    pub fn policies_of(&self, passenger: &Address) -> &[Policy] {
        self.policies.get(passenger).map_or(&[], Vec::as_slice)
    }

    /// Withdrawable balance of `passenger`
    #[must_use]
    pub fn credit(&self, passenger: &Address) -> Wei {
        self.credits.get(passenger).copied().unwrap_or_default()
    }

    /// Open a policy. The caller has already checked the airline.
    ///
    /// The premium is what was paid, capped at `premium_cap`. Anything paid
    /// above the cap is kept but not insured.
    ///
    /// # Errors
    ///
    /// - [`SuretyError::ZeroPremium`] if nothing was paid
    /// - [`SuretyError::DuplicatePolicy`] if the passenger already holds an
    ///   open policy on `flight`
    pub fn purchase(
        &mut self,
        passenger: Address,
        airline: Address,
        flight: String,
        paid: Wei,
        now: DateTime<Utc>,
        params: &Parameters,
    ) -> Result<Events<SuretyEvent>, SuretyError> {
        if paid.is_zero() {
            return Err(SuretyError::ZeroPremium);
        }
        let value = paid.min(params.premium_cap);
        if self
            .active_policies(&passenger)
            .any(|policy| policy.flight == flight)
        {
            return Err(SuretyError::DuplicatePolicy { passenger, flight });
        }

        self.policies
            .entry(passenger.clone())
            .or_default()
            .push(Policy {
                passenger: passenger.clone(),
                airline,
                flight: flight.clone(),
                price_paid: value,
                open: true,
                status: StatusCode::Unknown,
                purchased_at: now,
            });

        Ok(smallvec![SuretyEvent::PolicyPurchased {
            passenger,
            flight,
            value,
        }])
    }

    /// Close every open policy on (`airline`, `flight`) with `status`,
    /// crediting holders when the status pays out.
    ///
    /// Policies close in passenger order so the emitted events are
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns [`SuretyError::AmountOverflow`] if a payout overflows.
    pub fn settle(
        &mut self,
        airline: &Address,
        flight: &str,
        status: StatusCode,
        params: &Parameters,
    ) -> Result<Events<SuretyEvent>, SuretyError> {
        let mut holders: Vec<&Address> = self.policies.keys().collect();
        holders.sort();
        let holders: Vec<Address> = holders.into_iter().cloned().collect();

        let mut events = Events::new();
        for passenger in holders {
            let Some(policies) = self.policies.get_mut(&passenger) else {
                continue;
            };
            for policy in policies
                .iter_mut()
                .filter(|policy| policy.open && policy.airline == *airline && policy.flight == flight)
            {
                policy.open = false;
                policy.status = status;
                events.push(SuretyEvent::PolicyClosed {
                    passenger: passenger.clone(),
                    flight: flight.to_string(),
                    status,
                });

                if status.pays_out() {
                    let amount = policy
                        .price_paid
                        .scale(params.payout)
                        .ok_or(SuretyError::AmountOverflow)?;
                    let balance = self.credits.entry(passenger.clone()).or_default();
                    *balance = balance
                        .checked_add(amount)
                        .ok_or(SuretyError::AmountOverflow)?;
                    events.push(SuretyEvent::PassengerCredited {
                        passenger: passenger.clone(),
                        flight: flight.to_string(),
                        amount,
                    });
                }
            }
        }
        Ok(events)
    }

    /// Pay out and zero the passenger's balance.
    ///
    /// # Errors
    ///
    /// Returns [`SuretyError::InsufficientCredit`] if the balance is zero.
    pub fn withdraw(&mut self, passenger: Address) -> Result<Events<SuretyEvent>, SuretyError> {
        let amount = self
            .credits
            .remove(&passenger)
            .filter(|amount| !amount.is_zero())
            .ok_or_else(|| SuretyError::InsufficientCredit(passenger.clone()))?;

        tracing::info!(passenger = %passenger, %amount, "Credits withdrawn");
        Ok(smallvec![SuretyEvent::CreditsWithdrawn { passenger, amount }])
    }
}
