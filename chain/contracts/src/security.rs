//! Access control and pause
//!
//! The admin commits committees and locker sets and is the only one who may
//! unpause. A `Pauser` may only pause.

use bridge_types::ids::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Committee commits, role grants, unpause
    Admin,
    /// Emergency pause only
    Pauser,
}

/// Address → role table with a single primary admin.
#[derive(Debug, Clone)]
pub struct AccessControl {
    roles: HashMap<Address, Role>,
    admin: Address,
}

impl AccessControl {
    /// Create a table with `admin` as primary admin.
    pub fn new(admin: Address) -> Self {
        let mut roles = HashMap::new();
        roles.insert(admin, Role::Admin);
        Self { roles, admin }
    }

    /// Check if `caller` holds exactly `role`.
    pub fn has_role(&self, caller: &Address, role: Role) -> bool {
        self.roles.get(caller).is_some_and(|r| *r == role)
    }

    /// Check if `caller` is an admin.
    pub fn is_admin(&self, caller: &Address) -> bool {
        self.has_role(caller, Role::Admin)
    }

    /// Admin or pauser.
    pub fn can_pause(&self, caller: &Address) -> bool {
        self.is_admin(caller) || self.has_role(caller, Role::Pauser)
    }

    /// Assign a role. Only admin can assign roles.
    pub fn grant_role(&mut self, admin_caller: &Address, target: Address, role: Role) -> bool {
        if !self.is_admin(admin_caller) {
            return false;
        }
        self.roles.insert(target, role);
        true
    }

    /// Remove a role. The primary admin cannot be revoked.
    pub fn revoke_role(&mut self, admin_caller: &Address, target: &Address) -> bool {
        if !self.is_admin(admin_caller) || *target == self.admin {
            return false;
        }
        self.roles.remove(target);
        true
    }

    /// Move the primary admin role. Rejects the zero address.
    pub fn transfer_admin(&mut self, current_admin: &Address, new_admin: Address) -> bool {
        if !self.is_admin(current_admin) || new_admin.is_zero() {
            return false;
        }
        self.roles.remove(current_admin);
        self.roles.insert(new_admin, Role::Admin);
        self.admin = new_admin;
        true
    }

    /// Current primary admin.
    pub fn admin(&self) -> Address {
        self.admin
    }
}

/// Pause flag.
#[derive(Debug, Clone, Default)]
pub struct PauseGuard {
    paused: bool,
}

impl PauseGuard {
    /// Create a new unpaused guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter paused state.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Leave paused state.
    pub fn unpause(&mut self) {
        self.paused = false;
    }

    /// Check if currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}
