//! # Kontor API Library
//!
//! This library provides the core functionality for the Kontor ERP core
//! service: approval workflows, HR leave management, RBAC, and the audit
//! and notification layer.

pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod docno;
pub mod error;
pub mod handlers;
pub mod models;
pub mod rbac;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod telemetry;
pub mod workflow;
pub use migration;
