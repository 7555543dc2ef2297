use super::*;

/// Token ID of the token put up for sale.
pub type ContractTokenId = TokenIdVec;

/// Fungible token amount, counted in the smallest token unit.
pub type ContractTokenAmount = TokenAmountU64;

/// Parameter of the CIS-2 `transfer` function specialized to the sale token.
pub type TransferParameter = TransferParams<ContractTokenId, ContractTokenAmount>;

/// Parameter a CIS-2 token contract passes to `onReceivingCIS2` hooks.
pub type OnReceivingParameter = OnReceivingCis2Params<ContractTokenId, ContractTokenAmount>;
