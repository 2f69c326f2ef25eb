//! Application services: listings, mutations and access rules.

pub mod auth;
pub mod clients;
pub mod customers;
pub mod error;
pub mod listing;
pub mod pagination;
pub mod phones;
pub mod repos;
