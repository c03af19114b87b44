// Library root: the admin command surface and configuration, shared by the
// `tipper` binary and its tests.

pub mod cli;
pub mod config;
