//! Roles, errors, token plumbing and event tags shared by the sale contracts.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{authority::*, cis2::*, constants::*, errors::*, types::*};
use concordium_cis2::*;
use concordium_std::*;

pub mod test;

mod authority;
mod cis2;
mod constants;
mod errors;
mod types;
