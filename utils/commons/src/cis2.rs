use concordium_cis2::{AdditionalData, Receiver, Transfer, TransferParams};
use concordium_std::*;

use crate::{ContractTokenAmount, ContractTokenId};

/// Calls into the external CIS-2 token ledger.
pub trait HostCis2Ext<S>: HasHost<S> {
    /// Move `amount` of `token_id` held by `from` to the account `to`.
    fn cis2_transfer(
        &mut self,
        contract: &ContractAddress,
        token_id: ContractTokenId,
        amount: ContractTokenAmount,
        from: Address,
        to: AccountAddress,
    ) -> Result<(), CallContractError<Self::ReturnValueType>> {
        self.invoke_contract(
            contract,
            &TransferParams(vec![Transfer {
                token_id,
                amount,
                from,
                to: Receiver::Account(to),
                data: AdditionalData::empty(),
            }]),
            EntrypointName::new_unchecked("transfer"),
            Amount::zero(),
        )?;

        Ok(())
    }
}

impl<S, H: HasHost<S>> HostCis2Ext<S> for H {}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::test::*;
    use crate::TransferParameter;
    use concordium_cis2::{TokenAmountU64, TokenIdVec};
    use concordium_std::test_infrastructure::*;

    const TOKEN_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const AUCTION: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };

    const BUYER: AccountAddress = AccountAddress([16; 32]);

    #[concordium_test]
    fn test_transfer_builds_single_account_transfer() {
        let state_builder = TestStateBuilder::new();
        let mut host = TestHost::new((), state_builder);

        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParameter, _>(
                |params| {
                    params.0.len() == 1
                        && params.0[0].amount == TokenAmountU64(25)
                        && params.0[0].from == Address::Contract(AUCTION)
                        && matches!(params.0[0].to, Receiver::Account(to) if to == BUYER)
                },
                (),
            ),
        );

        let result = host.cis2_transfer(
            &TOKEN_CONTRACT,
            TokenIdVec(vec![0]),
            TokenAmountU64(25),
            Address::Contract(AUCTION),
            BUYER,
        );

        claim!(result.is_ok());
    }

    #[concordium_test]
    fn test_transfer_reports_rejection() {
        let state_builder = TestStateBuilder::new();
        let mut host = TestHost::new((), state_builder);

        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            rejecting_mock(),
        );

        let result = host
            .cis2_transfer(
                &TOKEN_CONTRACT,
                TokenIdVec(vec![0]),
                TokenAmountU64(25),
                Address::Contract(AUCTION),
                BUYER,
            )
            .map_err(crate::CustomContractError::from);

        claim_eq!(result, Err(crate::CustomContractError::InvokeContractError));
    }
}
