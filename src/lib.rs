pub mod args;
pub mod cli;
pub mod date_format;
pub mod db;
pub mod download;
pub mod plaid_api;
pub mod qif;
mod terminal;
