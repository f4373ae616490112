use serde::{Deserialize, Serialize};

use super::{institutions::Institutions, plaid_auth::DbPlaidAuth};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct DatabaseV1 {
    pub plaid_auth: DbPlaidAuth,
    pub institutions: Institutions,
}

impl DatabaseV1 {
    pub fn new(plaid_auth: DbPlaidAuth) -> Self {
        Self {
            plaid_auth,
            institutions: Institutions::default(),
        }
    }
}
