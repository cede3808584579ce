//! Agora Server
//!
//! Community platform backend: accounts, communities, a role catalog and a
//! membership ledger whose built-in roles decide who may manage members.

pub mod api;
pub mod auth;
pub mod community;
pub mod config;
pub mod db;
pub mod member;
pub mod pagination;
pub mod permissions;
pub mod roles;
