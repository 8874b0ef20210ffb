//! tcpclipboard: keeps the clipboard text of several machines in sync over
//! persistent TCP connections.
//!
//! The binary is a thin shell around [`bootstrap`], which turns command line
//! flags and the configuration file into a running node.

pub mod bootstrap;
