//! In-memory password hash store served over HTTP.
//!
//! Every read and write of the stored hashes goes through one actor task that
//! owns the data, so no locks guard it. Writes happen in two phases: the caller
//! gets an identifier back right away, and the hashed value is committed a few
//! seconds later by a detached task.
//!
//! - [`store`] owns the record map, the request counter and the timing
//!   accumulator, and exposes [`store::StoreHandle`] for talking to it.
//! - [`pipeline`] delays, digests and commits submitted passwords.
//! - [`shutdown`] rejects new work and drains the queue before exit.
//! - [`service`] puts the reject check in front of every store operation.
//! - [`server`] maps the service onto HTTP routes.
//! - [`cli`] and [`config`] turn command-line flags into a [`config::ServiceConfig`].

mod command;

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod server;
pub mod service;
pub mod shutdown;
pub mod store;
