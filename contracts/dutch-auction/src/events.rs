use commons::{
    DEPOSIT_TAG, FINALIZE_TAG, PAUSE_TAG, PURCHASE_TAG, UNPAUSE_TAG, WITHDRAW_PROCEEDS_TAG,
    WITHDRAW_UNSOLD_TAG,
};
use concordium_std::*;

/// Purchase event data.
#[derive(Debug, Serial)]
pub struct PurchaseEvent {
    /// Buyer account address.
    pub buyer: AccountAddress,
    /// Tokens granted.
    pub tokens: u64,
    /// Unit price at the time of purchase.
    pub price: Amount,
    /// Retained part of the payment.
    pub cost: Amount,
    /// Returned part of the payment.
    pub refund: Amount,
    pub timestamp: Timestamp,
}

/// Pause and unpause event data.
#[derive(Debug, Serial)]
pub struct PauseEvent {
    /// Address that switched the flag.
    pub by: Address,
    pub timestamp: Timestamp,
}

/// Finalization event data.
#[derive(Debug, Serial)]
pub struct FinalizeEvent {
    pub tokens_sold: u64,
    pub proceeds: Amount,
    pub timestamp: Timestamp,
}

/// Proceeds withdrawal event data.
#[derive(Debug, Serial)]
pub struct WithdrawProceedsEvent {
    pub to: AccountAddress,
    pub amount: Amount,
}

/// Unsold tokens withdrawal event data.
#[derive(Debug, Serial)]
pub struct WithdrawUnsoldEvent {
    pub to: AccountAddress,
    pub tokens: u64,
}

/// Lot deposit event data.
#[derive(Debug, Serial)]
pub struct DepositEvent {
    /// Previous owner of the deposited tokens.
    pub from: Address,
    pub tokens: u64,
    /// Total deposited after this deposit.
    pub deposited: u64,
}

/// Tagged Custom event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvent {
    Purchase(PurchaseEvent),
    Pause(PauseEvent),
    Unpause(PauseEvent),
    Finalize(FinalizeEvent),
    WithdrawProceeds(WithdrawProceedsEvent),
    WithdrawUnsold(WithdrawUnsoldEvent),
    Deposit(DepositEvent),
}

impl Serial for AuctionEvent {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvent::Purchase(event) => {
                out.write_u8(PURCHASE_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Pause(event) => {
                out.write_u8(PAUSE_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Unpause(event) => {
                out.write_u8(UNPAUSE_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Finalize(event) => {
                out.write_u8(FINALIZE_TAG)?;
                event.serial(out)
            }
            AuctionEvent::WithdrawProceeds(event) => {
                out.write_u8(WITHDRAW_PROCEEDS_TAG)?;
                event.serial(out)
            }
            AuctionEvent::WithdrawUnsold(event) => {
                out.write_u8(WITHDRAW_UNSOLD_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Deposit(event) => {
                out.write_u8(DEPOSIT_TAG)?;
                event.serial(out)
            }
        }
    }
}
