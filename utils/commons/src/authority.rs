use crate::CustomContractError;
use concordium_std::*;

/// Addresses holding administrative roles on a sale contract.
#[derive(Debug, Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct Authority<S: HasStateApi> {
    /// Trusted addresses that finalize the sale, withdraw funds and manage both role lists.
    admins: StateSet<Address, S>,
    /// Addresses that may only pause and unpause purchases.
    pausers: StateSet<Address, S>,
}

impl<S: HasStateApi> Authority<S> {
    pub fn new(state_builder: &mut StateBuilder<S>, admin: Address) -> Self {
        let mut admins = state_builder.new_set();
        admins.insert(admin);
        Self {
            admins,
            pausers: state_builder.new_set(),
        }
    }

    pub fn has_admin_rights(&self, address: &Address) -> bool {
        self.admins.contains(address)
    }

    /// Admins are implicitly pausers.
    pub fn has_pauser_rights(&self, address: &Address) -> bool {
        self.pausers.contains(address) || self.has_admin_rights(address)
    }

    /// Only admins may edit either list, and the last admin can not be removed.
    pub fn handle_update(
        &mut self,
        sender: Address,
        update: AuthorityUpdateParams,
    ) -> Result<(), CustomContractError> {
        ensure!(
            self.has_admin_rights(&sender),
            CustomContractError::Unauthorized
        );

        match (update.field, update.kind) {
            (AuthorityField::Admin, AuthorityUpdateKind::Add) => {
                self.admins.insert(update.address);
            }
            (AuthorityField::Admin, AuthorityUpdateKind::Remove) => {
                let is_last = self.admins.contains(&update.address)
                    && self.admins.iter().nth(1).is_none();
                ensure!(!is_last, CustomContractError::LastAdmin);
                self.admins.remove(&update.address);
            }
            (AuthorityField::Pauser, AuthorityUpdateKind::Add) => {
                self.pausers.insert(update.address);
            }
            (AuthorityField::Pauser, AuthorityUpdateKind::Remove) => {
                self.pausers.remove(&update.address);
            }
        }

        Ok(())
    }

    pub fn handle_view(&self, view: AuthorityViewParams) -> Vec<Address> {
        let address_list = match view.field {
            AuthorityField::Pauser => &self.pausers,
            AuthorityField::Admin => &self.admins,
        };

        address_list
            .iter()
            .skip(view.skip as usize)
            .take(view.show as usize)
            .map(|a| *a)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, SchemaType, Serialize)]
pub enum AuthorityField {
    Pauser,
    Admin,
}

#[derive(Debug, Clone, Copy, SchemaType, Serialize)]
pub enum AuthorityUpdateKind {
    Remove,
    Add,
}

#[derive(Debug, SchemaType, Serialize)]
pub struct AuthorityUpdateParams {
    pub field: AuthorityField,
    pub kind: AuthorityUpdateKind,
    pub address: Address,
}

#[derive(Debug, SchemaType, Serialize)]
pub struct AuthorityViewParams {
    pub field: AuthorityField,
    pub skip: u32,
    pub show: u32,
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const PAUSER: AccountAddress = AccountAddress([2; 32]);
    const USER: AccountAddress = AccountAddress([16; 32]);
    const OPERATOR_CONTRACT: ContractAddress = ContractAddress {
        index: 16,
        subindex: 0,
    };

    fn default_authority() -> Authority<TestStateApi> {
        let mut state_builder = TestStateBuilder::new();
        let mut authority = Authority::new(&mut state_builder, Address::Account(ADMIN));
        authority.pausers.insert(Address::Account(PAUSER));
        authority
    }

    fn update(
        field: AuthorityField,
        kind: AuthorityUpdateKind,
        address: Address,
    ) -> AuthorityUpdateParams {
        AuthorityUpdateParams {
            field,
            kind,
            address,
        }
    }

    #[concordium_test]
    fn test_roles_after_init() {
        let authority = default_authority();

        claim!(authority.has_admin_rights(&Address::Account(ADMIN)));
        claim!(authority.has_pauser_rights(&Address::Account(ADMIN)));
        claim!(!authority.has_admin_rights(&Address::Account(PAUSER)));
        claim!(authority.has_pauser_rights(&Address::Account(PAUSER)));
        claim!(!authority.has_pauser_rights(&Address::Account(USER)));
    }

    #[concordium_test]
    fn test_admin_adds_pauser_and_admin() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(ADMIN),
            update(
                AuthorityField::Pauser,
                AuthorityUpdateKind::Add,
                Address::Contract(OPERATOR_CONTRACT),
            ),
        );
        claim_eq!(result, Ok(()));
        claim!(authority.has_pauser_rights(&Address::Contract(OPERATOR_CONTRACT)));
        claim!(!authority.has_admin_rights(&Address::Contract(OPERATOR_CONTRACT)));

        let result = authority.handle_update(
            Address::Account(ADMIN),
            update(
                AuthorityField::Admin,
                AuthorityUpdateKind::Add,
                Address::Account(USER),
            ),
        );
        claim_eq!(result, Ok(()));
        claim!(authority.has_admin_rights(&Address::Account(USER)));
    }

    #[concordium_test]
    fn test_pauser_can_not_edit_roles() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(PAUSER),
            update(
                AuthorityField::Pauser,
                AuthorityUpdateKind::Add,
                Address::Account(USER),
            ),
        );
        claim_eq!(result, Err(CustomContractError::Unauthorized));
        claim!(!authority.has_pauser_rights(&Address::Account(USER)));

        let result = authority.handle_update(
            Address::Account(PAUSER),
            update(
                AuthorityField::Admin,
                AuthorityUpdateKind::Remove,
                Address::Account(ADMIN),
            ),
        );
        claim_eq!(result, Err(CustomContractError::Unauthorized));
        claim!(authority.has_admin_rights(&Address::Account(ADMIN)));
    }

    #[concordium_test]
    fn test_remove_pauser() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(ADMIN),
            update(
                AuthorityField::Pauser,
                AuthorityUpdateKind::Remove,
                Address::Account(PAUSER),
            ),
        );
        claim_eq!(result, Ok(()));
        claim!(!authority.has_pauser_rights(&Address::Account(PAUSER)));

        // Removing a missing entry is not an error
        let result = authority.handle_update(
            Address::Account(ADMIN),
            update(
                AuthorityField::Pauser,
                AuthorityUpdateKind::Remove,
                Address::Account(USER),
            ),
        );
        claim_eq!(result, Ok(()));
    }

    #[concordium_test]
    fn test_last_admin_is_kept() {
        let mut authority = default_authority();

        let result = authority.handle_update(
            Address::Account(ADMIN),
            update(
                AuthorityField::Admin,
                AuthorityUpdateKind::Remove,
                Address::Account(ADMIN),
            ),
        );
        claim_eq!(result, Err(CustomContractError::LastAdmin));
        claim!(authority.has_admin_rights(&Address::Account(ADMIN)));

        authority.admins.insert(Address::Account(USER));
        let result = authority.handle_update(
            Address::Account(USER),
            update(
                AuthorityField::Admin,
                AuthorityUpdateKind::Remove,
                Address::Account(ADMIN),
            ),
        );
        claim_eq!(result, Ok(()));
        claim!(!authority.has_admin_rights(&Address::Account(ADMIN)));
        claim!(authority.has_admin_rights(&Address::Account(USER)));
    }

    #[concordium_test]
    fn test_view_pausers_paged() {
        let mut authority = default_authority();

        let mut pauser_set = (32u8..=96u8)
            .map(|n| Address::Account(AccountAddress([n; 32])))
            .chain([Address::Account(PAUSER)])
            .collect::<HashSet<_>>();

        for pauser in pauser_set.iter() {
            authority.pausers.insert(*pauser);
        }

        let mut num_seen = 0;
        let increment = 20;
        loop {
            let returned_addresses = authority.handle_view(AuthorityViewParams {
                field: AuthorityField::Pauser,
                skip: num_seen,
                show: increment,
            });

            for addr in returned_addresses.iter() {
                claim!(pauser_set.remove(addr));
            }

            if returned_addresses.len() != increment as usize {
                break;
            }
            num_seen += increment;
        }

        claim!(pauser_set.is_empty());
    }
}
