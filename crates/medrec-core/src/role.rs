//! Role classification.
//!
//! Exactly one role holds per account at a time. The role is derived,
//! never stored, and is recomputed whenever the (account, contract)
//! pair changes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;

/// The three access levels the contract recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    /// Priority chain, short-circuiting: administrator first, then
    /// authorized doctor, then the Patient default. Address equality is
    /// byte-wise, so the administrator comparison is case-insensitive
    /// with respect to the original hex inputs.
    pub fn classify(account: Address, admin: Address, is_authorized_doctor: bool) -> Role {
        if account == admin {
            Role::Admin
        } else if is_authorized_doctor {
            Role::Doctor
        } else {
            Role::Patient
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Doctor => write!(f, "Doctor"),
            Role::Patient => write!(f, "Patient"),
        }
    }
}
