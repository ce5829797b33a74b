//! Core functionality: document tree, edit session, seed data and configuration

pub mod config;
pub mod seed;
pub mod session;
pub mod tree;
