use commons::CustomContractError;
use concordium_std::*;

/// Supply, funds and pause bookkeeping of the auction.
///
/// Every mutation either applies completely or returns an error without
/// touching any field.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct Ledger<S: HasStateApi> {
    /// Size of the lot.
    total_tokens_offered: u64,
    /// Cumulative purchase limit of a single buyer.
    max_per_address: u64,
    /// Sale tokens received from the token contract.
    tokens_deposited: u64,
    /// Tokens granted to buyers so far.
    tokens_sold: u64,
    /// Payments retained for sold tokens, refunds excluded.
    proceeds_collected: Amount,
    /// Part of `proceeds_collected` paid out to the treasury.
    proceeds_withdrawn: Amount,
    paused: bool,
    finalized: bool,
    unsold_withdrawn: bool,
    /// Cumulative tokens bought per buyer.
    purchased: StateMap<AccountAddress, u64, S>,
}

impl<S: HasStateApi> Ledger<S> {
    pub fn new(
        state_builder: &mut StateBuilder<S>,
        total_tokens_offered: u64,
        max_per_address: u64,
    ) -> Self {
        Self {
            total_tokens_offered,
            max_per_address,
            tokens_deposited: 0,
            tokens_sold: 0,
            proceeds_collected: Amount::zero(),
            proceeds_withdrawn: Amount::zero(),
            paused: false,
            finalized: false,
            unsold_withdrawn: false,
            purchased: state_builder.new_map(),
        }
    }

    pub fn tokens_sold(&self) -> u64 {
        self.tokens_sold
    }

    pub fn tokens_deposited(&self) -> u64 {
        self.tokens_deposited
    }

    pub fn proceeds_collected(&self) -> Amount {
        self.proceeds_collected
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn finalized(&self) -> bool {
        self.finalized
    }

    pub fn remaining_supply(&self) -> u64 {
        self.total_tokens_offered - self.tokens_sold
    }

    pub fn is_sold_out(&self) -> bool {
        self.remaining_supply() == 0
    }

    pub fn is_funded(&self) -> bool {
        self.tokens_deposited == self.total_tokens_offered
    }

    pub fn purchased_by(&self, buyer: &AccountAddress) -> u64 {
        self.purchased.get(buyer).map(|amount| *amount).unwrap_or(0)
    }

    pub fn remaining_allowance(&self, buyer: &AccountAddress) -> u64 {
        self.max_per_address.saturating_sub(self.purchased_by(buyer))
    }

    /// Book a purchase already clamped by the caller.
    ///
    /// Exceeding the lot or the buyer allowance here means the clamping upstream
    /// is broken, so the whole transaction must be rejected.
    pub fn record_purchase(
        &mut self,
        buyer: &AccountAddress,
        tokens: u64,
        cost: Amount,
    ) -> Result<(), CustomContractError> {
        ensure!(
            tokens <= self.remaining_supply(),
            CustomContractError::SupplyExceeded
        );
        ensure!(
            tokens <= self.remaining_allowance(buyer),
            CustomContractError::AllowanceExceeded
        );

        let tokens_sold = self.tokens_sold + tokens;
        let bought = self.purchased_by(buyer) + tokens;
        let proceeds = self
            .proceeds_collected
            .micro_ccd
            .checked_add(cost.micro_ccd)
            .ok_or(CustomContractError::MathOverflow)?;

        self.tokens_sold = tokens_sold;
        self.proceeds_collected = Amount::from_micro_ccd(proceeds);
        self.purchased.insert(*buyer, bought);

        Ok(())
    }

    /// Book sale tokens received from the token contract.
    pub fn record_deposit(&mut self, tokens: u64) -> Result<(), CustomContractError> {
        ensure!(!self.finalized, CustomContractError::NotActive);

        let deposited = self
            .tokens_deposited
            .checked_add(tokens)
            .ok_or(CustomContractError::ExcessDeposit)?;
        ensure!(
            deposited <= self.total_tokens_offered,
            CustomContractError::ExcessDeposit
        );

        self.tokens_deposited = deposited;
        Ok(())
    }

    /// Returns whether the flag changed.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        let changed = self.paused != paused;
        self.paused = paused;
        changed
    }

    pub fn finalize(&mut self) -> Result<(), CustomContractError> {
        ensure!(!self.finalized, CustomContractError::DoubleFinalize);
        self.finalized = true;
        Ok(())
    }

    /// Mark every collected but not yet withdrawn payment as paid out and return it.
    pub fn withdraw_proceeds(&mut self) -> Result<Amount, CustomContractError> {
        ensure!(self.finalized, CustomContractError::NotFinalized);

        let pending = self.proceeds_collected - self.proceeds_withdrawn;
        if pending == Amount::zero() {
            if self.proceeds_withdrawn == Amount::zero() {
                bail!(CustomContractError::NothingToWithdraw);
            }
            bail!(CustomContractError::DoubleWithdraw);
        }

        self.proceeds_withdrawn = self.proceeds_collected;
        Ok(pending)
    }

    /// Mark deposited tokens that were not sold as returned and return their amount.
    pub fn withdraw_unsold(&mut self) -> Result<u64, CustomContractError> {
        ensure!(self.finalized, CustomContractError::NotFinalized);
        ensure!(!self.unsold_withdrawn, CustomContractError::DoubleWithdraw);

        let unsold = self.tokens_deposited.saturating_sub(self.tokens_sold);
        ensure!(unsold > 0, CustomContractError::NothingToWithdraw);

        self.unsold_withdrawn = true;
        Ok(unsold)
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const BUYER_1: AccountAddress = AccountAddress([16; 32]);
    const BUYER_2: AccountAddress = AccountAddress([17; 32]);

    fn funded_ledger(total: u64, max_per_address: u64) -> Ledger<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        let mut ledger = Ledger::new(&mut state_builder, total, max_per_address);
        ledger
            .record_deposit(total)
            .expect_report("Failed to deposit the lot");
        ledger
    }

    #[concordium_test]
    fn test_record_purchase() {
        let mut ledger = funded_ledger(1000, 50);

        let result = ledger.record_purchase(&BUYER_1, 10, Amount::from_micro_ccd(10_000));
        claim_eq!(result, Ok(()));
        claim_eq!(ledger.tokens_sold(), 10);
        claim_eq!(ledger.remaining_supply(), 990);
        claim_eq!(ledger.proceeds_collected(), Amount::from_micro_ccd(10_000));
        claim_eq!(ledger.purchased_by(&BUYER_1), 10);
        claim_eq!(ledger.remaining_allowance(&BUYER_1), 40);
        claim_eq!(ledger.remaining_allowance(&BUYER_2), 50);
    }

    #[concordium_test]
    fn test_allowance_exceeded_leaves_state() {
        let mut ledger = funded_ledger(1000, 50);
        claim_eq!(
            ledger.record_purchase(&BUYER_1, 45, Amount::from_micro_ccd(45)),
            Ok(())
        );

        let result = ledger.record_purchase(&BUYER_1, 6, Amount::from_micro_ccd(6));
        claim_eq!(result, Err(CustomContractError::AllowanceExceeded));
        claim_eq!(ledger.tokens_sold(), 45);
        claim_eq!(ledger.purchased_by(&BUYER_1), 45);
        claim_eq!(ledger.proceeds_collected(), Amount::from_micro_ccd(45));
    }

    #[concordium_test]
    fn test_supply_exceeded_leaves_state() {
        let mut ledger = funded_ledger(5, 50);

        let result = ledger.record_purchase(&BUYER_1, 6, Amount::from_micro_ccd(6));
        claim_eq!(result, Err(CustomContractError::SupplyExceeded));
        claim_eq!(ledger.tokens_sold(), 0);
        claim_eq!(ledger.purchased_by(&BUYER_1), 0);

        claim_eq!(
            ledger.record_purchase(&BUYER_1, 5, Amount::from_micro_ccd(5)),
            Ok(())
        );
        claim!(ledger.is_sold_out());
    }

    #[concordium_test]
    fn test_deposits() {
        let mut state_builder = TestStateBuilder::new();
        let mut ledger = Ledger::new(&mut state_builder, 1000, 50);
        claim!(!ledger.is_funded());

        claim_eq!(ledger.record_deposit(600), Ok(()));
        claim!(!ledger.is_funded());
        claim_eq!(
            ledger.record_deposit(401),
            Err(CustomContractError::ExcessDeposit)
        );
        claim_eq!(
            ledger.record_deposit(u64::MAX),
            Err(CustomContractError::ExcessDeposit)
        );
        claim_eq!(ledger.record_deposit(400), Ok(()));
        claim!(ledger.is_funded());
        claim_eq!(ledger.tokens_deposited(), 1000);
    }

    #[concordium_test]
    fn test_pause_toggle() {
        let mut ledger = funded_ledger(1000, 50);

        claim!(ledger.set_paused(true));
        claim!(ledger.paused());
        claim!(!ledger.set_paused(true));
        claim!(ledger.set_paused(false));
        claim!(!ledger.paused());
    }

    #[concordium_test]
    fn test_finalize_once() {
        let mut ledger = funded_ledger(1000, 50);

        claim_eq!(ledger.finalize(), Ok(()));
        claim_eq!(ledger.finalize(), Err(CustomContractError::DoubleFinalize));
        claim!(ledger.finalized());
        claim_eq!(
            ledger.record_deposit(1),
            Err(CustomContractError::NotActive)
        );
    }

    #[concordium_test]
    fn test_withdraw_proceeds_once() {
        let mut ledger = funded_ledger(1000, 50);
        claim_eq!(
            ledger.record_purchase(&BUYER_1, 20, Amount::from_micro_ccd(20_000)),
            Ok(())
        );

        claim_eq!(
            ledger.withdraw_proceeds(),
            Err(CustomContractError::NotFinalized)
        );
        claim_eq!(ledger.finalize(), Ok(()));
        claim_eq!(
            ledger.withdraw_proceeds(),
            Ok(Amount::from_micro_ccd(20_000))
        );
        claim_eq!(
            ledger.withdraw_proceeds(),
            Err(CustomContractError::DoubleWithdraw)
        );
        // Withdrawal never reduces the recorded proceeds
        claim_eq!(ledger.proceeds_collected(), Amount::from_micro_ccd(20_000));
    }

    #[concordium_test]
    fn test_withdraw_without_sales() {
        let mut ledger = funded_ledger(1000, 50);
        claim_eq!(ledger.finalize(), Ok(()));

        claim_eq!(
            ledger.withdraw_proceeds(),
            Err(CustomContractError::NothingToWithdraw)
        );
        claim_eq!(ledger.withdraw_unsold(), Ok(1000));
        claim_eq!(
            ledger.withdraw_unsold(),
            Err(CustomContractError::DoubleWithdraw)
        );
    }

    #[concordium_test]
    fn test_withdraw_unsold_after_sell_out() {
        let mut ledger = funded_ledger(50, 50);
        claim_eq!(
            ledger.record_purchase(&BUYER_1, 50, Amount::from_micro_ccd(50)),
            Ok(())
        );
        claim_eq!(ledger.finalize(), Ok(()));

        claim_eq!(
            ledger.withdraw_unsold(),
            Err(CustomContractError::NothingToWithdraw)
        );
    }

    #[concordium_test]
    fn test_caps_hold_for_purchase_sequences() {
        let total = 97;
        let max_per_address = 13;
        let mut ledger = funded_ledger(total, max_per_address);
        let buyers = [
            AccountAddress([20; 32]),
            AccountAddress([21; 32]),
            AccountAddress([22; 32]),
            AccountAddress([23; 32]),
            AccountAddress([24; 32]),
            AccountAddress([25; 32]),
            AccountAddress([26; 32]),
            AccountAddress([27; 32]),
            AccountAddress([28; 32]),
        ];

        for round in 0u64..40 {
            let buyer = &buyers[(round as usize * 7) % buyers.len()];
            let wanted = (round * 5) % 17 + 1;
            let granted = core::cmp::min(
                wanted,
                core::cmp::min(ledger.remaining_supply(), ledger.remaining_allowance(buyer)),
            );
            if granted > 0 {
                claim_eq!(
                    ledger.record_purchase(buyer, granted, Amount::from_micro_ccd(granted)),
                    Ok(())
                );
            }
            // Unclamped requests are always refused
            let over = ledger.remaining_supply() + 1;
            claim!(ledger
                .record_purchase(buyer, over, Amount::from_micro_ccd(over))
                .is_err());

            claim!(ledger.tokens_sold() <= total);
            for buyer in buyers.iter() {
                claim!(ledger.purchased_by(buyer) <= max_per_address);
            }
        }
        claim_eq!(
            ledger.tokens_sold(),
            buyers.iter().map(|buyer| ledger.purchased_by(buyer)).sum::<u64>()
        );
    }
}
