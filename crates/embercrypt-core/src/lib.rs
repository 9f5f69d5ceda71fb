//! Core library for Embercrypt.
//!
//! Holds the vault password model, the [`service::VaultPasswordService`]
//! contract the HTTP layer talks to, and the encryption barrier the default
//! service stores entries through. Depends on `embercrypt-storage` only for
//! the storage trait.

pub mod barrier;
pub mod crypto;
pub mod error;
pub mod password;
pub mod service;
