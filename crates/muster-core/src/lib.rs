//! Core types and operations for the muster field-organization subsystem.
//!
//! No HTTP or database code lives here. The operations in [`registry`],
//! [`ledger`], [`roster`], [`directory`] and [`consolidate`] are generic over
//! any [`store::FieldStore`] backend.

// `FieldStore` spells out `Send` on its futures, so the advisory lint is moot.
#![allow(async_fn_in_trait)]

pub mod attendee;
pub mod code;
pub mod consolidate;
pub mod directory;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod meeting;
pub mod registry;
pub mod roster;
pub mod scope;
pub mod store;
pub mod validate;
pub mod voter;

pub use error::{Error, Result};
