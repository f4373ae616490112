use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

const PLAID_VERSION: &str = "2020-09-14";

/// Plaid API client credentials.
#[derive(Serialize, Deserialize, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct DbPlaidAuth {
    client_id: String,
    secret: String,
}

impl DbPlaidAuth {
    pub fn new(client_id: String, secret: String) -> Self {
        Self { client_id, secret }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn to_api_auth(&self) -> plaid::PlaidAuth {
        plaid::PlaidAuth::ClientId {
            client_id: self.client_id.clone(),
            secret: self.secret.clone(),
            plaid_version: PLAID_VERSION.to_string(),
        }
    }
}

impl Debug for DbPlaidAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbPlaidAuth")
            .field("client_id", &self.client_id)
            .field("secret", &"*****")
            .finish()
    }
}
