//! # Jetson Clocks
//!
//! A Rust library for reading and pinning the power states of NVIDIA Jetson
//! boards: CPU frequencies and governors, GPU frequency range, external
//! memory controller (EMC) rate and fan PWM.
//!
//! Every control is a file under `/sys` or `/proc`. Which file backs a given
//! control depends on the Tegra generation, so the board is identified once
//! and all path lookups go through a single family table.
//!
//! ## Features
//!
//! - **Board identification**: tegra186 (TX2), tegra194 (Xavier) and
//!   tegra210 (Nano/TX1) from `soc0` or the device tree
//! - **Validated writes**: frequencies and governors are checked against what
//!   the board advertises before anything is written
//! - **Snapshots**: capture every value, store it as TOML and restore it
//! - **Testable**: the filesystem root and privilege check are injectable
//!
//! ## Quick Start
//!
//! ```no_run
//! use jetson_clocks::{ClockState, JetsonClocks};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clocks = JetsonClocks::new();
//!
//! let state = ClockState::capture(&clocks)?;
//! println!("{}", state);
//!
//! // Run everything flat out
//! jetson_clocks::maximize(&clocks)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Privileges
//!
//! All control operations, reads included, require an effective user id of
//! 0. Without it they fail with [`Error::PrivilegeDenied`] and touch nothing.

pub mod board; // SoC family and machine detection
pub mod clocks; // CPU, GPU, EMC and fan controls
pub mod config; // Stored settings with TOML persistence
pub mod error;
pub mod paths; // Family to control file table
pub mod privilege; // Effective user checks
pub mod state; // Whole-board snapshots, restore and maximize
pub mod sysfs;

#[cfg(test)]
mod testing;

pub use board::{BoardInfo, SocFamily};
pub use clocks::JetsonClocks;
pub use config::ClocksConfig;
pub use error::{Error, Result};
pub use state::{apply_config, maximize, ClockState};
pub use sysfs::Sysfs;
