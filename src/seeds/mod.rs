//! Database seeding functionality
//!
//! This module provides functionality to seed the database with initial
//! data: the base permission matrix, the built-in system roles, and the
//! bootstrap administrator account.

pub mod bootstrap;
pub mod rbac;

pub use bootstrap::seed_admin;
pub use rbac::seed_rbac;
