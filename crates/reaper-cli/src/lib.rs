//! Invocation surface for the sandbox reaper: argument parsing, layered
//! configuration, logging setup and summary rendering.

pub mod app;
pub mod cli;
pub mod config;
pub mod event;
pub mod observability;
pub mod output;
