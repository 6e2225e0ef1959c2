#![allow(clippy::module_inception)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub mod authority_check;
pub mod compound;
pub mod database;
pub mod db;
pub mod error;
pub mod evaluator;
pub mod fork;
pub mod genesis;
pub mod object;
pub mod witness_schedule;

pub use database::Database;
pub use error::BlockchainError;
