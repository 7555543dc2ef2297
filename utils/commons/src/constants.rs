// Tags 255 to 251 are reserved for the standard CIS-2 events.

/// Tag for the Purchase event.
pub const PURCHASE_TAG: u8 = u8::MAX - 5;

/// Tag for the Pause event.
pub const PAUSE_TAG: u8 = u8::MAX - 6;

/// Tag for the Unpause event.
pub const UNPAUSE_TAG: u8 = u8::MAX - 7;

/// Tag for the Finalize event.
pub const FINALIZE_TAG: u8 = u8::MAX - 8;

/// Tag for the Withdraw Proceeds event.
pub const WITHDRAW_PROCEEDS_TAG: u8 = u8::MAX - 9;

/// Tag for the Withdraw Unsold event.
pub const WITHDRAW_UNSOLD_TAG: u8 = u8::MAX - 10;

/// Tag for the Deposit event.
pub const DEPOSIT_TAG: u8 = u8::MAX - 11;
