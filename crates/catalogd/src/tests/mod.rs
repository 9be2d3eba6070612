//! Test suites for the catalog daemon.

mod behaviour;
mod support;
