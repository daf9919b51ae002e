//! Two-step governance handoff.
//!
//! The current governor proposes a successor; the transfer only completes when
//! the successor itself calls [`GovernanceGate::accept_transfer`]. Until then
//! the current governor keeps full control and may re-propose.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// Observable state of a [`GovernanceGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceState {
    /// Governance is defined and no transfer is pending.
    Set,
    /// A successor has been proposed but has not accepted yet.
    PendingTransfer,
}

/// Holder of the privileged role guarding parameter changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceGate {
    governance: Address,
    pending: Option<Address>,
}

impl GovernanceGate {
    /// Create a gate owned by `governance` with no pending transfer.
    pub fn new(governance: Address) -> Self {
        Self {
            governance,
            pending: None,
        }
    }

    /// The current governor.
    pub fn governance(&self) -> Address {
        self.governance
    }

    /// The proposed successor, if a transfer is pending.
    pub fn pending_governance(&self) -> Option<Address> {
        self.pending
    }

    pub fn state(&self) -> GovernanceState {
        match self.pending {
            Some(_) => GovernanceState::PendingTransfer,
            None => GovernanceState::Set,
        }
    }

    /// Fail with `Unauthorized` unless `caller` is the current governor.
    pub fn ensure_governance(&self, caller: Address) -> Result<(), GovernanceError> {
        if caller == self.governance {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized { caller })
        }
    }

    /// Propose `new_governance` as successor. Only the current governor may call.
    ///
    /// A later proposal replaces an earlier one. The zero address and the
    /// current governor are rejected: neither could complete a real handoff.
    pub fn propose_transfer(
        &mut self,
        caller: Address,
        new_governance: Address,
    ) -> Result<(), GovernanceError> {
        self.ensure_governance(caller)?;
        if new_governance.is_zero() || new_governance == self.governance {
            return Err(GovernanceError::InvalidPending(new_governance));
        }
        self.pending = Some(new_governance);
        Ok(())
    }

    /// Complete a pending transfer. Only the proposed successor may call.
    ///
    /// Returns the previous governor.
    pub fn accept_transfer(&mut self, caller: Address) -> Result<Address, GovernanceError> {
        match self.pending {
            Some(pending) if pending == caller => {
                let previous = std::mem::replace(&mut self.governance, pending);
                self.pending = None;
                Ok(previous)
            }
            _ => Err(GovernanceError::Unauthorized { caller }),
        }
    }
}
