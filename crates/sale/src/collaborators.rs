//! Collaborator seams for credit issuance and value transport.
//!
//! The engine never holds credit or value itself beyond the escrow
//! bookkeeping in the ledger; everything else crosses these interfaces.

use anyhow::{bail, Result};
use parking_lot::Mutex;
use roundsale_types::{Address, AttoVal, CreditUnits};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Interface to the credit-issuing ledger.
pub trait CreditIssuer: Send + Sync {
    /// Mint `units` of credit to an address.
    fn mint(&mut self, to: &Address, units: CreditUnits) -> Result<()>;

    /// Burn previously minted credit (used to unwind a failed settlement).
    fn burn(&mut self, from: &Address, units: CreditUnits) -> Result<()>;

    /// Credit balance of an address.
    fn balance_of(&self, who: &Address) -> CreditUnits;

    /// Total credit minted and not burned.
    fn total_minted(&self) -> CreditUnits;

    /// Delegate minting authority to a new controller without moving balances.
    fn transfer_control(&mut self, new_controller: &Address) -> Result<()>;
}

/// Interface to the value transport between parties.
///
/// Both operations fail atomically: the enclosing engine operation aborts
/// and rolls back when the underlying transfer cannot complete.
pub trait ValueChannel: Send + Sync {
    /// Forward contributed value to a recipient (normally the beneficiary).
    fn forward(&mut self, to: &Address, amount: AttoVal) -> Result<()>;

    /// Return escrowed value to a contributor.
    fn return_to(&mut self, to: &Address, amount: AttoVal) -> Result<()>;
}

// -----------------------------------------------------------------------------
// In-memory implementations (for single-process runtime or testing)
// -----------------------------------------------------------------------------

/// Credit ledger held in process memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryCreditIssuer {
    balances: HashMap<Address, CreditUnits>,
    total_minted: CreditUnits,
    controller: Address,
}

impl InMemoryCreditIssuer {
    pub fn new(controller: Address) -> Self {
        Self {
            balances: HashMap::new(),
            total_minted: 0,
            controller,
        }
    }

    /// Current minting authority.
    pub fn controller(&self) -> &Address {
        &self.controller
    }
}

impl CreditIssuer for InMemoryCreditIssuer {
    fn mint(&mut self, to: &Address, units: CreditUnits) -> Result<()> {
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance.saturating_add(units);
        self.total_minted = self.total_minted.saturating_add(units);
        Ok(())
    }

    fn burn(&mut self, from: &Address, units: CreditUnits) -> Result<()> {
        let balance = self.balances.get(from).copied().unwrap_or(0);
        if balance < units {
            bail!("insufficient credit balance to burn");
        }
        self.balances.insert(*from, balance - units);
        self.total_minted = self.total_minted.saturating_sub(units);
        Ok(())
    }

    fn balance_of(&self, who: &Address) -> CreditUnits {
        self.balances.get(who).copied().unwrap_or(0)
    }

    fn total_minted(&self) -> CreditUnits {
        self.total_minted
    }

    fn transfer_control(&mut self, new_controller: &Address) -> Result<()> {
        self.controller = *new_controller;
        Ok(())
    }
}

/// Value transport held in process memory: tracks what each address has been
/// forwarded and returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryValueChannel {
    forwarded: HashMap<Address, AttoVal>,
    returned: HashMap<Address, AttoVal>,
}

impl InMemoryValueChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total value forwarded to an address.
    pub fn forwarded_to(&self, address: &Address) -> AttoVal {
        self.forwarded.get(address).copied().unwrap_or(0)
    }

    /// Total value returned to an address.
    pub fn returned_to(&self, address: &Address) -> AttoVal {
        self.returned.get(address).copied().unwrap_or(0)
    }
}

impl ValueChannel for InMemoryValueChannel {
    fn forward(&mut self, to: &Address, amount: AttoVal) -> Result<()> {
        let total = self.forwarded.entry(*to).or_insert(0);
        *total = total.saturating_add(amount);
        Ok(())
    }

    fn return_to(&mut self, to: &Address, amount: AttoVal) -> Result<()> {
        let total = self.returned.entry(*to).or_insert(0);
        *total = total.saturating_add(amount);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Mock implementations (for deterministic testing)
// -----------------------------------------------------------------------------

/// Mock issuer recording every call, with injectable failure.
#[derive(Debug, Clone, Default)]
pub struct MockCreditIssuer {
    balances: HashMap<Address, CreditUnits>,
    total_minted: CreditUnits,
    controller: Option<Address>,
    mint_calls: Vec<(Address, CreditUnits)>,
    burn_calls: Vec<(Address, CreditUnits)>,
    pub fail_mints: bool,
}

impl MockCreditIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint_calls(&self) -> &[(Address, CreditUnits)] {
        &self.mint_calls
    }

    pub fn burn_calls(&self) -> &[(Address, CreditUnits)] {
        &self.burn_calls
    }

    pub fn controller(&self) -> Option<&Address> {
        self.controller.as_ref()
    }
}

impl CreditIssuer for MockCreditIssuer {
    fn mint(&mut self, to: &Address, units: CreditUnits) -> Result<()> {
        if self.fail_mints {
            bail!("mint rejected by mock");
        }
        self.mint_calls.push((*to, units));
        let balance = self.balances.entry(*to).or_insert(0);
        *balance = balance.saturating_add(units);
        self.total_minted = self.total_minted.saturating_add(units);
        Ok(())
    }

    fn burn(&mut self, from: &Address, units: CreditUnits) -> Result<()> {
        self.burn_calls.push((*from, units));
        let balance = self.balances.get(from).copied().unwrap_or(0);
        if balance < units {
            bail!("insufficient credit balance to burn");
        }
        self.balances.insert(*from, balance - units);
        self.total_minted = self.total_minted.saturating_sub(units);
        Ok(())
    }

    fn balance_of(&self, who: &Address) -> CreditUnits {
        self.balances.get(who).copied().unwrap_or(0)
    }

    fn total_minted(&self) -> CreditUnits {
        self.total_minted
    }

    fn transfer_control(&mut self, new_controller: &Address) -> Result<()> {
        self.controller = Some(*new_controller);
        Ok(())
    }
}

/// Mock channel recording every call, with injectable failure per direction.
#[derive(Debug, Clone, Default)]
pub struct MockValueChannel {
    forward_calls: Vec<(Address, AttoVal)>,
    return_calls: Vec<(Address, AttoVal)>,
    pub fail_forwards: bool,
    pub fail_returns: bool,
}

impl MockValueChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward_calls(&self) -> &[(Address, AttoVal)] {
        &self.forward_calls
    }

    pub fn return_calls(&self) -> &[(Address, AttoVal)] {
        &self.return_calls
    }
}

impl ValueChannel for MockValueChannel {
    fn forward(&mut self, to: &Address, amount: AttoVal) -> Result<()> {
        if self.fail_forwards {
            bail!("forward rejected by mock");
        }
        self.forward_calls.push((*to, amount));
        Ok(())
    }

    fn return_to(&mut self, to: &Address, amount: AttoVal) -> Result<()> {
        if self.fail_returns {
            bail!("return rejected by mock");
        }
        self.return_calls.push((*to, amount));
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Shared handles
// -----------------------------------------------------------------------------

/// A collaborator behind `Arc<Mutex<_>>` is itself a collaborator, letting
/// the engine and the host observe the same instance.
impl<T: CreditIssuer> CreditIssuer for Arc<Mutex<T>> {
    fn mint(&mut self, to: &Address, units: CreditUnits) -> Result<()> {
        self.lock().mint(to, units)
    }

    fn burn(&mut self, from: &Address, units: CreditUnits) -> Result<()> {
        self.lock().burn(from, units)
    }

    fn balance_of(&self, who: &Address) -> CreditUnits {
        self.lock().balance_of(who)
    }

    fn total_minted(&self) -> CreditUnits {
        self.lock().total_minted()
    }

    fn transfer_control(&mut self, new_controller: &Address) -> Result<()> {
        self.lock().transfer_control(new_controller)
    }
}

impl<T: ValueChannel> ValueChannel for Arc<Mutex<T>> {
    fn forward(&mut self, to: &Address, amount: AttoVal) -> Result<()> {
        self.lock().forward(to, amount)
    }

    fn return_to(&mut self, to: &Address, amount: AttoVal) -> Result<()> {
        self.lock().return_to(to, amount)
    }
}
