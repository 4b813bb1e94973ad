//! Account management functionality
//!
//! This module provides functionality for managing wallet accounts and
//! their addresses on both networks.

mod address;
mod wallet;

pub use address::*;
pub use wallet::*;
