// Library root for the storefront's shared domain layer: product and bid
// types, form validation, configuration, the local SQLite store and the
// featured catalog.

pub mod account;
pub mod bid;
pub mod catalog;
pub mod config;
pub mod db;
pub mod form;
pub mod listing;
pub mod product;
