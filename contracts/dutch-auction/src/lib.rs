//! A descending price (Dutch) auction selling a fixed lot of a CIS-2 fungible
//! token for CCD.
//!
//! # Description
//! The unit price falls linearly from a start price to a reserve price over the
//! sale window and then stays at the reserve. Buyers send CCD to `purchase` and
//! receive as many whole token units as the payment covers at the current price,
//! bounded by the unsold lot and by a per address maximum. Any unspent part of the
//! payment is refunded within the same transaction.
//!
//! The lot must be deposited into the contract through the CIS-2
//! `onReceivingCIS2` hook before purchases are admitted. Pausers may pause and
//! unpause purchases. Once the window has elapsed or the lot is sold out, an
//! admin finalizes the sale and withdraws the proceeds and any unsold tokens.
#![cfg_attr(not(feature = "std"), no_std)]

mod contract;
mod curve;
mod events;
mod external;
mod ledger;
mod state;
