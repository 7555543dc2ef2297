use commons::{
    AuthorityUpdateParams, AuthorityViewParams, CustomContractError, HostCis2Ext,
    OnReceivingParameter,
};
use concordium_cis2::TokenAmountU64;
use concordium_std::*;

use crate::events::*;
use crate::external::*;
use crate::state::State;

/// Initialize the auction. The init origin becomes the first admin.
///
/// It rejects if:
/// - Fails to parse `InitParams` parameters;
/// - The price curve, lot size or per address limit is inconsistent.
#[init(contract = "DutchAuction", parameter = "InitParams")]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params = InitParams::deserial(&mut ctx.parameter_cursor())?;
    let config = AuctionConfig::new(params, ctx.metadata().slot_time())?;

    Ok(State::new(state_builder, config, ctx.init_origin()))
}

/// Buy tokens with the attached CCD at the current price.
///
/// The sender receives as many tokens as the payment covers, limited by the
/// unsold lot and the per address maximum. The unspent part of the payment is
/// sent back.
///
/// It rejects if:
/// - Sender is a contract;
/// - The auction is paused, not active or not funded;
/// - No token can be granted, with the reason in the error code;
/// - The token transfer or the refund fails.
#[receive(
    mutable,
    payable,
    contract = "DutchAuction",
    name = "purchase",
    enable_logger
)]
fn contract_purchase<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let buyer = match ctx.sender() {
        Address::Account(buyer) => buyer,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };
    let now = ctx.metadata().slot_time();

    // Book the sale before calling out, the transaction is reverted on any later failure
    let admission = host.state_mut().purchase(&buyer, amount, now)?;

    let token_contract = host.state().config.token_contract;
    let token_id = host.state().config.token_id.clone();
    host.cis2_transfer(
        &token_contract,
        token_id,
        TokenAmountU64(admission.tokens),
        Address::Contract(ctx.self_address()),
        buyer,
    )
    .map_err(CustomContractError::from)?;

    if admission.refund != Amount::zero() {
        host.invoke_transfer(&buyer, admission.refund)
            .map_err(CustomContractError::from)?;
    }

    logger.log(&AuctionEvent::Purchase(PurchaseEvent {
        buyer,
        tokens: admission.tokens,
        price: admission.price,
        cost: admission.cost,
        refund: admission.refund,
        timestamp: now,
    }))?;

    Ok(())
}

/// Stop admitting purchases. Requires pauser rights.
#[receive(mutable, contract = "DutchAuction", name = "pause", enable_logger)]
fn contract_pause<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    set_paused(ctx, host, logger, true)
}

/// Resume admitting purchases. Requires pauser rights.
#[receive(mutable, contract = "DutchAuction", name = "unpause", enable_logger)]
fn contract_unpause<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    set_paused(ctx, host, logger, false)
}

// Setting the flag to its current value succeeds without logging.
fn set_paused<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
    paused: bool,
) -> ReceiveResult<()> {
    let by = ctx.sender();
    let state = host.state_mut();

    ensure!(
        state.authority.has_pauser_rights(&by),
        CustomContractError::Unauthorized.into()
    );
    ensure!(
        !state.ledger.finalized(),
        CustomContractError::NotActive.into()
    );

    if state.ledger.set_paused(paused) {
        let event = PauseEvent {
            by,
            timestamp: ctx.metadata().slot_time(),
        };
        if paused {
            logger.log(&AuctionEvent::Pause(event))?;
        } else {
            logger.log(&AuctionEvent::Unpause(event))?;
        }
    }

    Ok(())
}

/// Close the sale for good.
///
/// It rejects if:
/// - Sender does not have admin rights;
/// - The sale window is still open and the lot is not sold out;
/// - The auction was already finalized.
#[receive(mutable, contract = "DutchAuction", name = "finalize", enable_logger)]
fn contract_finalize<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let now = ctx.metadata().slot_time();
    let state = host.state_mut();

    ensure!(
        state.authority.has_admin_rights(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );

    state.finalize(now)?;

    logger.log(&AuctionEvent::Finalize(FinalizeEvent {
        tokens_sold: state.ledger.tokens_sold(),
        proceeds: state.ledger.proceeds_collected(),
        timestamp: now,
    }))?;

    Ok(())
}

/// Pay the collected proceeds out to the given account or the treasury.
///
/// It rejects if:
/// - Fails to parse `WithdrawParams` parameters;
/// - Sender does not have admin rights;
/// - The auction is not finalized or the proceeds were already withdrawn.
#[receive(
    mutable,
    contract = "DutchAuction",
    name = "withdrawProceeds",
    parameter = "WithdrawParams",
    enable_logger
)]
fn contract_withdraw_proceeds<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = WithdrawParams::deserial(&mut ctx.parameter_cursor())?;
    let state = host.state_mut();

    ensure!(
        state.authority.has_admin_rights(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );

    let to = params.to.unwrap_or(state.config.treasury);
    let amount = state.ledger.withdraw_proceeds()?;

    host.invoke_transfer(&to, amount)
        .map_err(CustomContractError::from)?;

    logger.log(&AuctionEvent::WithdrawProceeds(WithdrawProceedsEvent {
        to,
        amount,
    }))?;

    Ok(())
}

/// Return the tokens left unsold to the given account or the treasury.
///
/// It rejects if:
/// - Fails to parse `WithdrawParams` parameters;
/// - Sender does not have admin rights;
/// - The auction is not finalized, nothing is left or it was already returned;
/// - The token transfer fails.
#[receive(
    mutable,
    contract = "DutchAuction",
    name = "withdrawUnsold",
    parameter = "WithdrawParams",
    enable_logger
)]
fn contract_withdraw_unsold<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = WithdrawParams::deserial(&mut ctx.parameter_cursor())?;
    let state = host.state_mut();

    ensure!(
        state.authority.has_admin_rights(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );

    let to = params.to.unwrap_or(state.config.treasury);
    let tokens = state.ledger.withdraw_unsold()?;
    let token_contract = state.config.token_contract;
    let token_id = state.config.token_id.clone();

    host.cis2_transfer(
        &token_contract,
        token_id,
        TokenAmountU64(tokens),
        Address::Contract(ctx.self_address()),
        to,
    )
    .map_err(CustomContractError::from)?;

    logger.log(&AuctionEvent::WithdrawUnsold(WithdrawUnsoldEvent { to, tokens }))?;

    Ok(())
}

/// CIS-2 receive hook. Books sale tokens sent to the auction as part of the lot.
///
/// It rejects if:
/// - Fails to parse parameters;
/// - Sender is not the sale token contract or the token is not the sale token;
/// - The deposit would exceed the lot or the auction is finalized.
#[receive(
    mutable,
    contract = "DutchAuction",
    name = "onReceivingCIS2",
    parameter = "OnReceivingParameter",
    enable_logger
)]
fn contract_on_receiving_cis2<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = OnReceivingParameter::deserial(&mut ctx.parameter_cursor())?;

    let contract = if let Address::Contract(sender) = ctx.sender() {
        sender
    } else {
        bail!(CustomContractError::ContractOnly.into());
    };

    let state = host.state_mut();
    state.deposit(&contract, &params.token_id, params.amount.0)?;

    logger.log(&AuctionEvent::Deposit(DepositEvent {
        from: params.from,
        tokens: params.amount.0,
        deposited: state.ledger.tokens_deposited(),
    }))?;

    Ok(())
}

/// View the sale status at the current slot time.
#[receive(contract = "DutchAuction", name = "view", return_value = "AuctionStatus")]
fn contract_view<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<AuctionStatus> {
    Ok(host.state().status(ctx.metadata().slot_time()))
}

#[receive(
    contract = "DutchAuction",
    name = "viewConfig",
    return_value = "AuctionConfig"
)]
fn contract_view_config<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<AuctionConfig> {
    Ok(host.state().config.clone())
}

/// View how much an account bought and may still buy.
#[receive(
    contract = "DutchAuction",
    name = "viewBuyer",
    parameter = "AccountAddress",
    return_value = "BuyerView"
)]
fn contract_view_buyer<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<BuyerView> {
    let buyer = AccountAddress::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().buyer(&buyer))
}

/// Function to manage addresses that are allowed to administrate or pause the auction.
///
///  It rejects if:
///  - Fails to parse `AuthorityUpdateParams` parameters.
///  - If sender is not one of the admins.
///  - If the last admin would be removed.
#[receive(
    mutable,
    contract = "DutchAuction",
    name = "updateAuthority",
    parameter = "AuthorityUpdateParams"
)]
fn update_authority<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    let params = AuthorityUpdateParams::deserial(&mut ctx.parameter_cursor())?;
    let sender = ctx.sender();
    host.state_mut().authority.handle_update(sender, params)?;
    Ok(())
}

/// Function to view addresses that are allowed to administrate or pause the auction.
#[receive(
    contract = "DutchAuction",
    name = "viewAuthority",
    parameter = "AuthorityViewParams",
    return_value = "Vec<Address>"
)]
fn view_authority<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Vec<Address>> {
    let params = AuthorityViewParams::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().authority.handle_view(params))
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::test::*;
    use commons::{AuthorityField, AuthorityUpdateKind, ContractTokenId, TransferParameter};
    use concordium_cis2::{AdditionalData, Receiver, TokenIdVec};
    use concordium_std::test_infrastructure::*;

    const TOKEN_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const AUCTION: ContractAddress = ContractAddress {
        index: 5,
        subindex: 0,
    };

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const PAUSER: AccountAddress = AccountAddress([2; 32]);
    const TREASURY: AccountAddress = AccountAddress([3; 32]);
    const USER_1: AccountAddress = AccountAddress([16; 32]);
    const USER_2: AccountAddress = AccountAddress([17; 32]);

    const START_MILLIS: u64 = 1_000_000;
    const DURATION_SECONDS: u64 = 3600;
    const LOT: u64 = 1000;
    const MAX_PER_ADDRESS: u64 = 50;

    fn at(seconds: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(START_MILLIS + seconds * 1000)
    }

    fn micro(micro_ccd: u64) -> Amount {
        Amount::from_micro_ccd(micro_ccd)
    }

    fn sale_token() -> ContractTokenId {
        TokenIdVec(vec![0])
    }

    fn init_params() -> InitParams {
        InitParams {
            token_contract: TOKEN_CONTRACT,
            token_id: sale_token(),
            total_tokens_offered: LOT,
            start: Some(at(0)),
            duration: Duration::from_seconds(DURATION_SECONDS),
            start_price: micro(1000),
            reserve_price: micro(200),
            treasury: TREASURY,
            max_per_address: MAX_PER_ADDRESS,
        }
    }

    fn init_with(params: &InitParams) -> InitResult<State<TestStateApi>> {
        let mut ctx = TestInitContext::empty();
        let bytes = to_bytes(params);
        ctx.set_init_origin(ADMIN)
            .set_parameter(&bytes)
            .set_metadata_slot_time(Timestamp::from_timestamp_millis(START_MILLIS - 60_000));
        let mut state_builder = TestStateBuilder::new();
        contract_init(&ctx, &mut state_builder)
    }

    fn deposit(
        host: &mut TestHost<State<TestStateApi>>,
        sender: Address,
        token_id: ContractTokenId,
        tokens: u64,
    ) -> ReceiveResult<()> {
        let params = OnReceivingParameter {
            token_id,
            amount: TokenAmountU64(tokens),
            from: Address::Account(TREASURY),
            data: AdditionalData::empty(),
        };
        let bytes = to_bytes(&params);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(sender)
            .set_self_address(AUCTION)
            .set_parameter(&bytes)
            .set_metadata_slot_time(at(0));
        let mut logger = TestLogger::init();
        contract_on_receiving_cis2(&ctx, host, &mut logger)
    }

    /// Auction with a pauser and without the lot deposited.
    fn unfunded_host() -> TestHost<State<TestStateApi>> {
        let mut state_builder = TestStateBuilder::new();
        let mut ctx = TestInitContext::empty();
        let bytes = to_bytes(&init_params());
        ctx.set_init_origin(ADMIN)
            .set_parameter(&bytes)
            .set_metadata_slot_time(at(0));
        let state =
            contract_init(&ctx, &mut state_builder).expect_report("Failed during init_DutchAuction");

        let mut host = TestHost::new(state, state_builder);

        let mut ctx = TestReceiveContext::empty();
        let params = AuthorityUpdateParams {
            field: AuthorityField::Pauser,
            kind: AuthorityUpdateKind::Add,
            address: Address::Account(PAUSER),
        };
        let bytes = to_bytes(&params);
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        let result = update_authority(&ctx, &mut host);
        claim_eq!(result, Ok(()));

        host
    }

    fn default_host() -> TestHost<State<TestStateApi>> {
        let mut host = unfunded_host();
        let result = deposit(
            &mut host,
            Address::Contract(TOKEN_CONTRACT),
            sale_token(),
            LOT,
        );
        claim_eq!(result, Ok(()));
        host
    }

    fn mock_token_transfer(host: &mut TestHost<State<TestStateApi>>, to: AccountAddress, tokens: u64) {
        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParameter, _>(
                move |params| {
                    params.0.len() == 1
                        && params.0[0].token_id == TokenIdVec(vec![0])
                        && params.0[0].amount == TokenAmountU64(tokens)
                        && params.0[0].from == Address::Contract(AUCTION)
                        && matches!(params.0[0].to, Receiver::Account(account) if account == to)
                },
                (),
            ),
        );
    }

    fn receive_ctx<'a>(sender: Address, now: Timestamp) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(sender)
            .set_invoker(ADMIN)
            .set_self_address(AUCTION)
            .set_metadata_slot_time(now);
        ctx
    }

    fn purchase(
        host: &mut TestHost<State<TestStateApi>>,
        buyer: AccountAddress,
        payment: Amount,
        now: Timestamp,
    ) -> ReceiveResult<()> {
        let mut ctx = receive_ctx(Address::Account(buyer), now);
        ctx.set_invoker(buyer);
        let mut logger = TestLogger::init();
        contract_purchase(&ctx, host, payment, &mut logger)
    }

    type Entrypoint = fn(
        &TestReceiveContext<'static>,
        &mut TestHost<State<TestStateApi>>,
        &mut TestLogger,
    ) -> ReceiveResult<()>;

    fn call_as(
        entrypoint: Entrypoint,
        host: &mut TestHost<State<TestStateApi>>,
        sender: AccountAddress,
        now: Timestamp,
    ) -> ReceiveResult<()> {
        let ctx = receive_ctx(Address::Account(sender), now);
        let mut logger = TestLogger::init();
        entrypoint(&ctx, host, &mut logger)
    }

    fn withdraw_proceeds(
        host: &mut TestHost<State<TestStateApi>>,
        sender: AccountAddress,
        to: Option<AccountAddress>,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&WithdrawParams { to });
        let mut ctx = receive_ctx(Address::Account(sender), at(DURATION_SECONDS));
        ctx.set_parameter(&bytes);
        let mut logger = TestLogger::init();
        contract_withdraw_proceeds(&ctx, host, &mut logger)
    }

    fn withdraw_unsold(
        host: &mut TestHost<State<TestStateApi>>,
        sender: AccountAddress,
        to: Option<AccountAddress>,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(&WithdrawParams { to });
        let mut ctx = receive_ctx(Address::Account(sender), at(DURATION_SECONDS));
        ctx.set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = contract_withdraw_unsold(&ctx, host, &mut logger);
        if result.is_ok() {
            claim_eq!(logger.logs.len(), 1, "Withdrawal should be logged");
        }
        result
    }

    #[concordium_test]
    fn test_init() {
        let host = default_host();
        let state = host.state();

        claim_eq!(state.config.curve.start, at(0));
        claim_eq!(state.config.total_tokens_offered, LOT);
        claim!(state.authority.has_admin_rights(&Address::Account(ADMIN)));
        claim!(state.authority.has_pauser_rights(&Address::Account(PAUSER)));
        claim!(!state.authority.has_admin_rights(&Address::Account(PAUSER)));
        claim!(state.ledger.is_funded());
    }

    #[concordium_test]
    fn test_init_defaults_start_to_slot_time() {
        let mut params = init_params();
        params.start = None;

        let state = init_with(&params).expect_report("Failed during init_DutchAuction");

        claim_eq!(
            state.config.curve.start,
            Timestamp::from_timestamp_millis(START_MILLIS - 60_000)
        );
    }

    #[concordium_test]
    fn test_init_rejects_invalid_config() {
        let mut inverted = init_params();
        inverted.reserve_price = micro(1001);
        let mut empty_lot = init_params();
        empty_lot.total_tokens_offered = 0;
        let mut no_window = init_params();
        no_window.duration = Duration::from_millis(0);
        let mut no_allowance = init_params();
        no_allowance.max_per_address = 0;

        for params in [inverted, empty_lot, no_window, no_allowance].iter() {
            claim_eq!(
                init_with(params).err(),
                Some(CustomContractError::InvalidConfig.into())
            );
        }
    }

    #[concordium_test]
    fn test_purchase_delivers_tokens_and_refunds_excess() {
        let mut host = default_host();
        mock_token_transfer(&mut host, USER_1, 10);
        host.set_self_balance(micro(10_500));

        let mut ctx = receive_ctx(Address::Account(USER_1), at(0));
        ctx.set_invoker(USER_1);
        let mut logger = TestLogger::init();
        let result = contract_purchase(&ctx, &mut host, micro(10_500), &mut logger);

        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&USER_1, micro(500)));
        claim_eq!(host.self_balance(), micro(10_000));
        claim_eq!(host.state().ledger.remaining_supply(), 990);
        claim_eq!(host.state().ledger.purchased_by(&USER_1), 10);
        claim_eq!(logger.logs.len(), 1, "Only one event should be logged");
        claim_eq!(
            logger.logs[0],
            to_bytes(&AuctionEvent::Purchase(PurchaseEvent {
                buyer: USER_1,
                tokens: 10,
                price: micro(1000),
                cost: micro(10_000),
                refund: micro(500),
                timestamp: at(0),
            }))
        );
    }

    #[concordium_test]
    fn test_purchase_exact_payment_keeps_balance() {
        let mut host = default_host();
        mock_token_transfer(&mut host, USER_1, 10);
        host.set_self_balance(micro(10_000));

        let result = purchase(&mut host, USER_1, micro(10_000), at(0));

        claim_eq!(result, Ok(()));
        claim_eq!(host.self_balance(), micro(10_000));
    }

    #[concordium_test]
    fn test_purchase_clamped_by_allowance() {
        let mut host = default_host();
        mock_token_transfer(&mut host, USER_1, MAX_PER_ADDRESS);
        host.set_self_balance(micro(80_000));

        let result = purchase(&mut host, USER_1, micro(80_000), at(0));

        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&USER_1, micro(30_000)));

        host.set_self_balance(micro(1000));
        let result = purchase(&mut host, USER_1, micro(1000), at(1));
        claim_eq!(
            result,
            Err(CustomContractError::ZeroAllocationCapReached.into())
        );
    }

    #[concordium_test]
    fn test_purchase_rejections() {
        let mut host = default_host();
        mock_token_transfer(&mut host, USER_1, 1);
        host.set_self_balance(micro(1000));

        let result = purchase(&mut host, USER_1, micro(999), at(0));
        claim_eq!(result, Err(CustomContractError::ZeroAllocationDust.into()));

        let result = purchase(
            &mut host,
            USER_1,
            micro(1000),
            Timestamp::from_timestamp_millis(START_MILLIS - 1),
        );
        claim_eq!(result, Err(CustomContractError::NotActive.into()));

        let result = purchase(&mut host, USER_1, micro(1000), at(DURATION_SECONDS));
        claim_eq!(result, Err(CustomContractError::NotActive.into()));

        let mut ctx = receive_ctx(Address::Contract(TOKEN_CONTRACT), at(0));
        ctx.set_invoker(USER_1);
        let mut logger = TestLogger::init();
        let result = contract_purchase(&ctx, &mut host, micro(1000), &mut logger);
        claim_eq!(result, Err(CustomContractError::OnlyAccountAddress.into()));

        claim_eq!(host.state().ledger.tokens_sold(), 0);
        claim!(logger.logs.is_empty());
    }

    #[concordium_test]
    fn test_purchase_fails_when_token_transfer_fails() {
        let mut host = default_host();
        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            rejecting_mock(),
        );
        host.set_self_balance(micro(10_000));

        let result = purchase(&mut host, USER_1, micro(10_000), at(0));

        claim_eq!(result, Err(CustomContractError::InvokeContractError.into()));
    }

    #[concordium_test]
    fn test_purchase_fails_when_refund_fails() {
        let mut host = default_host();
        mock_token_transfer(&mut host, USER_1, 10);
        // Balance does not cover the refund
        host.set_self_balance(micro(100));

        let result = purchase(&mut host, USER_1, micro(10_500), at(0));

        claim_eq!(result, Err(CustomContractError::InvokeTransferError.into()));
    }

    #[concordium_test]
    fn test_unfunded_auction_rejects_purchases() {
        let mut host = unfunded_host();
        mock_token_transfer(&mut host, USER_1, 1);
        host.set_self_balance(micro(1000));

        let result = purchase(&mut host, USER_1, micro(1000), at(0));

        claim_eq!(result, Err(CustomContractError::NotFunded.into()));
    }

    #[concordium_test]
    fn test_deposits() {
        let mut host = unfunded_host();

        let result = deposit(&mut host, Address::Account(TREASURY), sale_token(), LOT);
        claim_eq!(result, Err(CustomContractError::ContractOnly.into()));

        let other_contract = ContractAddress {
            index: 9,
            subindex: 0,
        };
        let result = deposit(&mut host, Address::Contract(other_contract), sale_token(), LOT);
        claim_eq!(result, Err(CustomContractError::UnknownToken.into()));

        let result = deposit(
            &mut host,
            Address::Contract(TOKEN_CONTRACT),
            TokenIdVec(vec![7]),
            LOT,
        );
        claim_eq!(result, Err(CustomContractError::UnknownToken.into()));

        let result = deposit(&mut host, Address::Contract(TOKEN_CONTRACT), sale_token(), 400);
        claim_eq!(result, Ok(()));
        let result = deposit(&mut host, Address::Contract(TOKEN_CONTRACT), sale_token(), 601);
        claim_eq!(result, Err(CustomContractError::ExcessDeposit.into()));
        let result = deposit(&mut host, Address::Contract(TOKEN_CONTRACT), sale_token(), 600);
        claim_eq!(result, Ok(()));

        claim_eq!(host.state().ledger.tokens_deposited(), LOT);
        claim!(host.state().ledger.is_funded());
    }

    #[concordium_test]
    fn test_pause_and_unpause() {
        let mut host = default_host();
        mock_token_transfer(&mut host, USER_1, 5);
        host.set_self_balance(micro(5000));

        let result = call_as(contract_pause, &mut host, USER_1, at(10));
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let ctx = receive_ctx(Address::Account(PAUSER), at(10));
        let mut logger = TestLogger::init();
        let result = contract_pause(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim_eq!(
            logger.logs,
            vec![to_bytes(&AuctionEvent::Pause(PauseEvent {
                by: Address::Account(PAUSER),
                timestamp: at(10),
            }))]
        );

        // Pausing twice is accepted silently
        let mut logger = TestLogger::init();
        claim_eq!(contract_pause(&ctx, &mut host, &mut logger), Ok(()));
        claim!(logger.logs.is_empty());

        let result = purchase(&mut host, USER_1, micro(5000), at(20));
        claim_eq!(result, Err(CustomContractError::Paused.into()));

        let result = call_as(contract_unpause, &mut host, ADMIN, at(30));
        claim_eq!(result, Ok(()));

        // 1000 - 800 * 40 / 3600 rounds to 992
        let result = purchase(&mut host, USER_1, micro(5000), at(40));
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&USER_1, micro(40)));
    }

    #[concordium_test]
    fn test_finalize() {
        let mut host = default_host();

        let result = call_as(contract_finalize, &mut host, ADMIN, at(10));
        claim_eq!(result, Err(CustomContractError::AuctionNotOver.into()));

        let result = call_as(contract_finalize, &mut host, PAUSER, at(DURATION_SECONDS));
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let result = call_as(contract_finalize, &mut host, ADMIN, at(DURATION_SECONDS));
        claim_eq!(result, Ok(()));
        claim!(host.state().ledger.finalized());

        let result = call_as(contract_finalize, &mut host, ADMIN, at(DURATION_SECONDS + 1));
        claim_eq!(result, Err(CustomContractError::DoubleFinalize.into()));

        let result = call_as(contract_pause, &mut host, PAUSER, at(DURATION_SECONDS + 1));
        claim_eq!(result, Err(CustomContractError::NotActive.into()));
    }

    #[concordium_test]
    fn test_finalize_after_sell_out() {
        let mut host = default_host();
        for (index, buyer) in (40u8..60).map(|n| AccountAddress([n; 32])).enumerate() {
            mock_token_transfer(&mut host, buyer, MAX_PER_ADDRESS);
            host.set_self_balance(micro(50_000));
            let result = purchase(&mut host, buyer, micro(50_000), at(index as u64 / 10));
            claim_eq!(result, Ok(()));
        }
        claim!(host.state().ledger.is_sold_out());

        let result = call_as(contract_finalize, &mut host, ADMIN, at(10));
        claim_eq!(result, Ok(()));
    }

    #[concordium_test]
    fn test_withdraw_proceeds() {
        let mut host = default_host();
        mock_token_transfer(&mut host, USER_1, 10);
        host.set_self_balance(micro(10_500));
        claim_eq!(purchase(&mut host, USER_1, micro(10_500), at(0)), Ok(()));

        let result = withdraw_proceeds(&mut host, ADMIN, None);
        claim_eq!(result, Err(CustomContractError::NotFinalized.into()));

        claim_eq!(
            call_as(contract_finalize, &mut host, ADMIN, at(DURATION_SECONDS)),
            Ok(())
        );

        let result = withdraw_proceeds(&mut host, PAUSER, None);
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let result = withdraw_proceeds(&mut host, ADMIN, None);
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&TREASURY, micro(10_000)));
        claim_eq!(host.self_balance(), Amount::zero());

        let result = withdraw_proceeds(&mut host, ADMIN, Some(USER_2));
        claim_eq!(result, Err(CustomContractError::DoubleWithdraw.into()));
    }

    #[concordium_test]
    fn test_withdraw_unsold() {
        let mut host = default_host();
        mock_token_transfer(&mut host, USER_1, 10);
        host.set_self_balance(micro(10_000));
        claim_eq!(purchase(&mut host, USER_1, micro(10_000), at(0)), Ok(()));

        let result = withdraw_unsold(&mut host, ADMIN, Some(USER_2));
        claim_eq!(result, Err(CustomContractError::NotFinalized.into()));

        claim_eq!(
            call_as(contract_finalize, &mut host, ADMIN, at(DURATION_SECONDS)),
            Ok(())
        );

        mock_token_transfer(&mut host, USER_2, LOT - 10);
        let result = withdraw_unsold(&mut host, ADMIN, Some(USER_2));
        claim_eq!(result, Ok(()));

        let result = withdraw_unsold(&mut host, ADMIN, Some(USER_2));
        claim_eq!(result, Err(CustomContractError::DoubleWithdraw.into()));
    }

    #[concordium_test]
    fn test_withdraw_unsold_requires_admin() {
        let mut host = default_host();
        claim_eq!(
            call_as(contract_finalize, &mut host, ADMIN, at(DURATION_SECONDS)),
            Ok(())
        );
        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_ok_mock::<TransferParameter, _>(()),
        );

        for sender in [PAUSER, USER_1, TREASURY].iter() {
            let result = withdraw_unsold(&mut host, *sender, Some(*sender));
            claim_eq!(result, Err(CustomContractError::Unauthorized.into()));
        }

        let result = withdraw_unsold(&mut host, ADMIN, None);
        claim_eq!(result, Ok(()));
    }

    #[concordium_test]
    fn test_update_authority_requires_admin() {
        let mut host = default_host();
        let params = AuthorityUpdateParams {
            field: AuthorityField::Admin,
            kind: AuthorityUpdateKind::Add,
            address: Address::Account(USER_1),
        };
        let bytes = to_bytes(&params);

        for sender in [PAUSER, USER_1].iter() {
            let mut ctx = receive_ctx(Address::Account(*sender), at(0));
            ctx.set_parameter(&bytes);
            let result = update_authority(&ctx, &mut host);
            claim_eq!(result, Err(CustomContractError::Unauthorized.into()));
        }
        claim!(!host
            .state()
            .authority
            .has_admin_rights(&Address::Account(USER_1)));

        let mut ctx = receive_ctx(Address::Account(ADMIN), at(0));
        ctx.set_parameter(&bytes);
        claim_eq!(update_authority(&ctx, &mut host), Ok(()));
        claim!(host
            .state()
            .authority
            .has_admin_rights(&Address::Account(USER_1)));
    }

    #[concordium_test]
    fn test_view() {
        let mut host = default_host();
        mock_token_transfer(&mut host, USER_1, 10);
        host.set_self_balance(micro(10_000));
        claim_eq!(purchase(&mut host, USER_1, micro(10_000), at(0)), Ok(()));

        let ctx = receive_ctx(Address::Account(USER_2), at(DURATION_SECONDS / 2));
        let status = contract_view(&ctx, &host).expect_report("Failed to call view");
        claim_eq!(
            status,
            AuctionStatus {
                tokens_sold: 10,
                remaining_supply: 990,
                current_price: micro(600),
                paused: false,
                phase: Phase::Active,
                funded: true,
            }
        );

        let ctx = receive_ctx(Address::Account(USER_2), at(DURATION_SECONDS));
        let status = contract_view(&ctx, &host).expect_report("Failed to call view");
        claim_eq!(status.phase, Phase::Ended);
        claim_eq!(status.current_price, micro(200));

        let bytes = to_bytes(&USER_1);
        let mut ctx = receive_ctx(Address::Account(USER_2), at(0));
        ctx.set_parameter(&bytes);
        let buyer = contract_view_buyer(&ctx, &host).expect_report("Failed to call viewBuyer");
        claim_eq!(
            buyer,
            BuyerView {
                purchased: 10,
                remaining_allowance: MAX_PER_ADDRESS - 10,
            }
        );

        let ctx = receive_ctx(Address::Account(USER_2), at(0));
        let config =
            contract_view_config(&ctx, &host).expect_report("Failed to call viewConfig");
        claim_eq!(config.treasury, TREASURY);
        claim_eq!(config.token_id, sale_token());
    }

    #[concordium_test]
    fn test_view_authority() {
        let host = default_host();

        let params = AuthorityViewParams {
            field: AuthorityField::Pauser,
            skip: 0,
            show: 10,
        };
        let bytes = to_bytes(&params);
        let mut ctx = receive_ctx(Address::Account(USER_1), at(0));
        ctx.set_parameter(&bytes);

        let pausers = view_authority(&ctx, &host).expect_report("Failed to call viewAuthority");
        claim_eq!(pausers, vec![Address::Account(PAUSER)]);
    }
}
