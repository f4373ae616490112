use serde::{Deserialize, Serialize};

mod access_token;
mod crypto;
mod database;
mod file;
mod institutions;
mod plaid_auth;

#[derive(Serialize, Deserialize)]
#[cfg_attr(test, derive(PartialEq, Eq, Debug))]
pub enum Database {
    V1(DatabaseV1),
}

pub use access_token::AccessToken;
pub use crypto::DbCipher;
pub use database::DatabaseV1;
pub use file::{load, save};
pub use institutions::{Institution, Institutions};
pub use plaid_auth::DbPlaidAuth;
