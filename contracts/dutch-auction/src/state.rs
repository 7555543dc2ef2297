use commons::{Authority, ContractTokenId, CustomContractError};
use concordium_std::*;

use crate::external::{AuctionConfig, AuctionStatus, BuyerView, Phase};
use crate::ledger::Ledger;

/// Admitted purchase. The ledger already holds it; tokens and the refund
/// MUST be delivered to the buyer.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Tokens granted to the buyer.
    pub tokens: u64,
    /// Unit price the purchase was executed at.
    pub price: Amount,
    /// Part of the payment retained as proceeds.
    pub cost: Amount,
    /// Part of the payment returned to the buyer.
    pub refund: Amount,
}

/// The contract state.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Authority module for administrative rights management.
    pub authority: Authority<S>,
    /// Parameters fixed at init.
    pub config: AuctionConfig,
    /// Sales and funds bookkeeping.
    pub ledger: Ledger<S>,
}

impl<S: HasStateApi> State<S> {
    pub fn new(
        state_builder: &mut StateBuilder<S>,
        config: AuctionConfig,
        origin: AccountAddress,
    ) -> Self {
        let ledger = Ledger::new(
            state_builder,
            config.total_tokens_offered,
            config.max_per_address,
        );
        Self {
            authority: Authority::new(state_builder, Address::Account(origin)),
            config,
            ledger,
        }
    }

    pub fn phase(&self, now: Timestamp) -> Phase {
        if self.ledger.finalized() {
            Phase::Finalized
        } else if !self.config.curve.has_started(now) {
            Phase::NotStarted
        } else if self.config.curve.has_ended(now) || self.ledger.is_sold_out() {
            Phase::Ended
        } else {
            Phase::Active
        }
    }

    pub fn status(&self, now: Timestamp) -> AuctionStatus {
        AuctionStatus {
            tokens_sold: self.ledger.tokens_sold(),
            remaining_supply: self.ledger.remaining_supply(),
            current_price: self.config.curve.price_at(now),
            paused: self.ledger.paused(),
            phase: self.phase(now),
            funded: self.ledger.is_funded(),
        }
    }

    pub fn buyer(&self, buyer: &AccountAddress) -> BuyerView {
        BuyerView {
            purchased: self.ledger.purchased_by(buyer),
            remaining_allowance: self.ledger.remaining_allowance(buyer),
        }
    }

    /// Work out what `payment` buys for `buyer` at `now` without changing anything.
    pub fn admit(
        &self,
        buyer: &AccountAddress,
        payment: Amount,
        now: Timestamp,
    ) -> Result<Admission, CustomContractError> {
        let curve = &self.config.curve;

        ensure!(!self.ledger.paused(), CustomContractError::Paused);
        ensure!(
            !self.ledger.finalized() && curve.has_started(now) && !curve.has_ended(now),
            CustomContractError::NotActive
        );
        ensure!(self.ledger.is_funded(), CustomContractError::NotFunded);

        let price = curve.price_at(now);
        let affordable = match payment.micro_ccd.checked_div(price.micro_ccd) {
            Some(tokens) if tokens > 0 => tokens,
            _ => bail!(CustomContractError::ZeroAllocationDust),
        };

        let allowed_by_lot = self.ledger.remaining_supply();
        ensure!(allowed_by_lot > 0, CustomContractError::ZeroAllocationSoldOut);
        let allowed_by_address = self.ledger.remaining_allowance(buyer);
        ensure!(
            allowed_by_address > 0,
            CustomContractError::ZeroAllocationCapReached
        );

        let tokens = affordable.min(allowed_by_lot).min(allowed_by_address);
        let cost = tokens
            .checked_mul(price.micro_ccd)
            .map(Amount::from_micro_ccd)
            .ok_or(CustomContractError::MathOverflow)?;

        Ok(Admission {
            tokens,
            price,
            cost,
            refund: payment - cost,
        })
    }

    /// Admit a purchase and book it in the ledger.
    pub fn purchase(
        &mut self,
        buyer: &AccountAddress,
        payment: Amount,
        now: Timestamp,
    ) -> Result<Admission, CustomContractError> {
        let admission = self.admit(buyer, payment, now)?;
        self.ledger
            .record_purchase(buyer, admission.tokens, admission.cost)?;
        Ok(admission)
    }

    /// Close the sale once it can no longer accept purchases.
    pub fn finalize(&mut self, now: Timestamp) -> Result<(), CustomContractError> {
        match self.phase(now) {
            Phase::Finalized => Err(CustomContractError::DoubleFinalize),
            Phase::NotStarted | Phase::Active => Err(CustomContractError::AuctionNotOver),
            Phase::Ended => self.ledger.finalize(),
        }
    }

    /// Book sale tokens sent by `sender`, which must be the sale token contract.
    pub fn deposit(
        &mut self,
        sender: &ContractAddress,
        token_id: &ContractTokenId,
        tokens: u64,
    ) -> Result<(), CustomContractError> {
        ensure!(
            *sender == self.config.token_contract && *token_id == self.config.token_id,
            CustomContractError::UnknownToken
        );
        self.ledger.record_deposit(tokens)
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::curve::PriceCurve;
    use concordium_cis2::TokenIdVec;
    use concordium_std::test_infrastructure::*;

    const TOKEN_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const TREASURY: AccountAddress = AccountAddress([3; 32]);
    const BUYER_1: AccountAddress = AccountAddress([16; 32]);
    const BUYER_2: AccountAddress = AccountAddress([17; 32]);

    const START_MILLIS: u64 = 1_000_000;
    const DURATION_SECONDS: u64 = 3600;
    const LOT: u64 = 1000;

    fn at(seconds: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(START_MILLIS + seconds * 1000)
    }

    fn micro(micro_ccd: u64) -> Amount {
        Amount::from_micro_ccd(micro_ccd)
    }

    fn config(max_per_address: u64) -> AuctionConfig {
        AuctionConfig {
            token_contract: TOKEN_CONTRACT,
            token_id: TokenIdVec(vec![0]),
            total_tokens_offered: LOT,
            max_per_address,
            treasury: TREASURY,
            curve: PriceCurve {
                start: at(0),
                duration: Duration::from_seconds(DURATION_SECONDS),
                start_price: micro(1000),
                reserve_price: micro(200),
            },
        }
    }

    fn funded_state(max_per_address: u64) -> State<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(&mut state_builder, config(max_per_address), ADMIN);
        state
            .deposit(&TOKEN_CONTRACT, &TokenIdVec(vec![0]), LOT)
            .expect_report("Failed to deposit the lot");
        state
    }

    #[concordium_test]
    fn test_purchase_at_start() {
        let mut state = funded_state(50);

        let admission = state.purchase(&BUYER_1, micro(10_000), at(0));

        claim_eq!(
            admission,
            Ok(Admission {
                tokens: 10,
                price: micro(1000),
                cost: micro(10_000),
                refund: Amount::zero(),
            })
        );
        claim_eq!(state.ledger.remaining_supply(), 990);
        claim_eq!(state.ledger.proceeds_collected(), micro(10_000));
    }

    #[concordium_test]
    fn test_partial_unit_is_refunded() {
        let mut state = funded_state(50);

        // Price at half time is 600
        let admission = state
            .purchase(&BUYER_1, micro(2000), at(DURATION_SECONDS / 2))
            .expect_report("Purchase should be admitted");

        claim_eq!(admission.tokens, 3);
        claim_eq!(admission.cost, micro(1800));
        claim_eq!(admission.refund, micro(200));
        claim_eq!(admission.cost + admission.refund, micro(2000));
        claim_eq!(state.ledger.proceeds_collected(), micro(1800));
    }

    #[concordium_test]
    fn test_allowance_clamps_and_refunds() {
        let mut state = funded_state(50);

        let admission = state
            .purchase(&BUYER_1, micro(60_000), at(0))
            .expect_report("Purchase should be admitted");

        claim_eq!(admission.tokens, 50);
        claim_eq!(admission.refund, micro(10_000));

        let result = state.purchase(&BUYER_1, micro(1000), at(1));
        claim_eq!(result, Err(CustomContractError::ZeroAllocationCapReached));
        claim_eq!(state.ledger.purchased_by(&BUYER_1), 50);
    }

    #[concordium_test]
    fn test_dust_payment_is_rejected() {
        let mut state = funded_state(50);

        let result = state.purchase(&BUYER_1, micro(999), at(0));
        claim_eq!(result, Err(CustomContractError::ZeroAllocationDust));

        let result = state.purchase(&BUYER_1, Amount::zero(), at(0));
        claim_eq!(result, Err(CustomContractError::ZeroAllocationDust));
        claim_eq!(state.ledger.tokens_sold(), 0);
    }

    #[concordium_test]
    fn test_window_gating() {
        let mut state = funded_state(50);
        let before = Timestamp::from_timestamp_millis(START_MILLIS - 1);

        claim_eq!(
            state.purchase(&BUYER_1, micro(1000), before),
            Err(CustomContractError::NotActive)
        );
        claim_eq!(
            state.purchase(&BUYER_1, micro(1000), at(DURATION_SECONDS)),
            Err(CustomContractError::NotActive)
        );
        claim!(state
            .purchase(&BUYER_1, micro(1000), at(DURATION_SECONDS - 1))
            .is_ok());
    }

    #[concordium_test]
    fn test_pause_gating() {
        let mut state = funded_state(50);
        state.ledger.set_paused(true);

        // Paused wins over every other rejection reason
        for now in [at(0), at(DURATION_SECONDS * 2)].iter() {
            claim_eq!(
                state.purchase(&BUYER_1, micro(5000), *now),
                Err(CustomContractError::Paused)
            );
        }

        state.ledger.set_paused(false);
        claim!(state.purchase(&BUYER_1, micro(5000), at(10)).is_ok());
    }

    #[concordium_test]
    fn test_unfunded_auction_rejects() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(&mut state_builder, config(50), ADMIN);
        claim_eq!(
            state.deposit(&TOKEN_CONTRACT, &TokenIdVec(vec![0]), LOT - 1),
            Ok(())
        );

        claim_eq!(
            state.purchase(&BUYER_1, micro(1000), at(0)),
            Err(CustomContractError::NotFunded)
        );
    }

    #[concordium_test]
    fn test_deposit_of_unknown_token() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = State::new(&mut state_builder, config(50), ADMIN);
        let other_contract = ContractAddress {
            index: 9,
            subindex: 0,
        };

        claim_eq!(
            state.deposit(&other_contract, &TokenIdVec(vec![0]), LOT),
            Err(CustomContractError::UnknownToken)
        );
        claim_eq!(
            state.deposit(&TOKEN_CONTRACT, &TokenIdVec(vec![1]), LOT),
            Err(CustomContractError::UnknownToken)
        );
        claim_eq!(state.ledger.tokens_deposited(), 0);
    }

    #[concordium_test]
    fn test_race_for_last_tokens() {
        let mut state = funded_state(LOT);
        let filler = AccountAddress([30; 32]);
        claim!(state.purchase(&filler, micro(995_000), at(0)).is_ok());
        claim_eq!(state.ledger.remaining_supply(), 5);

        // Both buyers pay for the whole remainder within the same instant
        let first = state.purchase(&BUYER_1, micro(5000), at(1));
        let second = state.purchase(&BUYER_2, micro(5000), at(1));

        claim_eq!(first.map(|admission| admission.tokens), Ok(5));
        claim_eq!(second, Err(CustomContractError::ZeroAllocationSoldOut));
        claim_eq!(state.ledger.tokens_sold(), LOT);
        claim_eq!(state.phase(at(2)), Phase::Ended);
    }

    #[concordium_test]
    fn test_supply_clamps_and_refunds() {
        let mut state = funded_state(LOT);
        let filler = AccountAddress([30; 32]);
        claim!(state.purchase(&filler, micro(997_000), at(0)).is_ok());

        let admission = state
            .purchase(&BUYER_1, micro(10_000), at(0))
            .expect_report("Purchase should be admitted");

        claim_eq!(admission.tokens, 3);
        claim_eq!(admission.refund, micro(7000));
        claim!(state.ledger.is_sold_out());
    }

    #[concordium_test]
    fn test_phases() {
        let mut state = funded_state(50);

        claim_eq!(
            state.phase(Timestamp::from_timestamp_millis(START_MILLIS - 1)),
            Phase::NotStarted
        );
        claim_eq!(state.phase(at(0)), Phase::Active);
        claim_eq!(state.phase(at(DURATION_SECONDS)), Phase::Ended);

        claim_eq!(
            state.finalize(Timestamp::from_timestamp_millis(START_MILLIS - 1)),
            Err(CustomContractError::AuctionNotOver)
        );
        claim_eq!(
            state.finalize(at(1)),
            Err(CustomContractError::AuctionNotOver)
        );
        claim_eq!(state.finalize(at(DURATION_SECONDS)), Ok(()));
        claim_eq!(state.phase(at(0)), Phase::Finalized);
        claim_eq!(
            state.finalize(at(DURATION_SECONDS)),
            Err(CustomContractError::DoubleFinalize)
        );
        claim_eq!(
            state.purchase(&BUYER_1, micro(1000), at(10)),
            Err(CustomContractError::NotActive)
        );
    }

    #[concordium_test]
    fn test_status() {
        let mut state = funded_state(50);
        claim!(state.purchase(&BUYER_1, micro(10_000), at(0)).is_ok());
        state.ledger.set_paused(true);

        claim_eq!(
            state.status(at(DURATION_SECONDS / 2)),
            AuctionStatus {
                tokens_sold: 10,
                remaining_supply: 990,
                current_price: micro(600),
                paused: true,
                phase: Phase::Active,
                funded: true,
            }
        );
        claim_eq!(
            state.buyer(&BUYER_1),
            BuyerView {
                purchased: 10,
                remaining_allowance: 40,
            }
        );
    }
}
