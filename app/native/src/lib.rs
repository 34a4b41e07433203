//! Walltaker - a desktop agent that lets someone else pick your wallpaper.
//!
//! The agent polls a remote feed for the current wallpaper assignment, applies
//! every new one to the desktop with a few side effects (notification,
//! Discord presence, a saved copy) and restores the original wallpaper on exit.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod integrations;
pub mod platform;
pub mod wallpaper;
