//! Signalgen Verifier
//!
//! This crate provides the backend-verification harness: it queries the
//! ClickHouse and Prometheus datasources through the Grafana dashboard API
//! to confirm that the signals produced by the emitter arrived and are
//! queryable, tolerating ingestion lag with bounded exponential backoff.
//!
//! # Modules
//!
//! - [`config`] - Dashboard connection settings from the environment
//! - [`client`] - reqwest client for the Grafana HTTP API
//! - [`queries`] - Query payload builders per verification target
//! - [`checks`] - The named check suite and its runner

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod checks;
pub mod client;
pub mod config;
pub mod queries;

pub use checks::{Check, CheckRunner, CheckSummary};
pub use client::{DatasourceHealth, DatasourceInfo, GrafanaClient, GrafanaClientError, HealthInfo};
pub use config::{Credentials, GrafanaConfig};
