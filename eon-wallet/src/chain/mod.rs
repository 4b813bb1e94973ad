//! Secondary-network chain access
//!
//! This module provides the JSON-RPC client for the secondary network and
//! the scanner that locates activation burn proofs in an address's
//! transaction history.

mod rpc;
mod scanner;

pub use rpc::*;
pub use scanner::*;
