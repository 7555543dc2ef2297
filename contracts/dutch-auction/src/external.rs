use commons::{ContractTokenId, CustomContractError};
use concordium_std::*;

use crate::curve::PriceCurve;

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct InitParams {
    /// CIS-2 contract of the token put up for sale.
    pub token_contract: ContractAddress,
    /// Sale token ID within `token_contract`.
    pub token_id: ContractTokenId,
    /// Lot size in the smallest token unit.
    pub total_tokens_offered: u64,
    /// Sale window opening time. Init slot time by default.
    pub start: Option<Timestamp>,
    /// Sale window length.
    pub duration: Duration,
    /// Unit price at the opening of the window.
    pub start_price: Amount,
    /// Unit price floor, reached at the end of the window.
    pub reserve_price: Amount,
    /// Default receiver of withdrawn proceeds and unsold tokens.
    pub treasury: AccountAddress,
    /// Cumulative purchase limit of a single buyer.
    pub max_per_address: u64,
}

/// Immutable auction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct AuctionConfig {
    pub token_contract: ContractAddress,
    pub token_id: ContractTokenId,
    pub total_tokens_offered: u64,
    pub max_per_address: u64,
    pub treasury: AccountAddress,
    pub curve: PriceCurve,
}

impl AuctionConfig {
    pub fn new(params: InitParams, slot_time: Timestamp) -> Result<Self, CustomContractError> {
        let config = Self {
            token_contract: params.token_contract,
            token_id: params.token_id,
            total_tokens_offered: params.total_tokens_offered,
            max_per_address: params.max_per_address,
            treasury: params.treasury,
            curve: PriceCurve {
                start: params.start.unwrap_or(slot_time),
                duration: params.duration,
                start_price: params.start_price,
                reserve_price: params.reserve_price,
            },
        };

        ensure!(
            config.total_tokens_offered > 0 && config.max_per_address > 0,
            CustomContractError::InvalidConfig
        );
        ensure!(config.curve.is_valid(), CustomContractError::InvalidConfig);

        Ok(config)
    }
}

/// Sale status derived from the slot time and the ledger flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub enum Phase {
    NotStarted,
    Active,
    /// Window elapsed or lot sold out, waiting for finalization.
    Ended,
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct AuctionStatus {
    pub tokens_sold: u64,
    pub remaining_supply: u64,
    pub current_price: Amount,
    pub paused: bool,
    pub phase: Phase,
    /// Whether the whole lot has been deposited.
    pub funded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct BuyerView {
    pub purchased: u64,
    pub remaining_allowance: u64,
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct WithdrawParams {
    /// Receiver account. Treasury by default.
    pub to: Option<AccountAddress>,
}
