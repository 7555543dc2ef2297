use super::*;

/// The custom errors the sale contracts can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Failed to invoke a contract (Error code: -4).
    InvokeContractError,
    /// Failed to invoke a transfer (Error code: -5).
    InvokeTransferError,
    /// Called contract does not implement the expected entrypoint (Error code: -6).
    Incompatible,
    /// Sender lacks the role required by the operation (Error code: -7).
    Unauthorized,
    /// The last admin can not be removed (Error code: -8).
    LastAdmin,
    /// Only account addresses can buy tokens (Error code: -9).
    OnlyAccountAddress,
    /// This function must only be called by a contract (Error code: -10).
    ContractOnly,
    /// Token is not the one put up for sale (Error code: -11).
    UnknownToken,
    /// Auction parameters are inconsistent (Error code: -12).
    InvalidConfig,
    /// Purchase outside of the sale window or after finalization (Error code: -13).
    NotActive,
    /// Purchase while the sale is paused (Error code: -14).
    Paused,
    /// The lot has not been fully deposited yet (Error code: -15).
    NotFunded,
    /// Payment is below the current unit price (Error code: -16).
    ZeroAllocationDust,
    /// Buyer already holds the per address maximum (Error code: -17).
    ZeroAllocationCapReached,
    /// The whole lot has been sold (Error code: -18).
    ZeroAllocationSoldOut,
    /// Recorded sales would exceed the lot (Error code: -19).
    SupplyExceeded,
    /// Recorded sales would exceed the per address maximum (Error code: -20).
    AllowanceExceeded,
    /// Deposit would push the token balance above the lot (Error code: -21).
    ExcessDeposit,
    /// Finalization attempted before the window elapsed or the lot sold out (Error code: -22).
    AuctionNotOver,
    /// Withdrawal attempted before finalization (Error code: -23).
    NotFinalized,
    /// Auction was already finalized (Error code: -24).
    DoubleFinalize,
    /// Balance was already withdrawn (Error code: -25).
    DoubleWithdraw,
    /// Nothing was ever collected for this withdrawal (Error code: -26).
    NothingToWithdraw,
    /// Arithmetic overflow (Error code: -27).
    MathOverflow,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to contract invocations to CustomContractError.
impl<T> From<CallContractError<T>> for CustomContractError {
    fn from(cce: CallContractError<T>) -> Self {
        match cce {
            CallContractError::MissingEntrypoint | CallContractError::MessageFailed => {
                Self::Incompatible
            }
            _ => Self::InvokeContractError,
        }
    }
}

/// Mapping errors related to transfer invocations to CustomContractError.
impl From<TransferError> for CustomContractError {
    fn from(_te: TransferError) -> Self {
        Self::InvokeTransferError
    }
}
