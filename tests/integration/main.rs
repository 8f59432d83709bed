//! End-to-end tests against a provider bound to an ephemeral port.

mod bootstrap;
mod http_api;
