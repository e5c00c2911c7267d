//! Jetson clock and fan controls
//!
//! [`JetsonClocks`] bundles the three things every control operation needs:
//! the filesystem the control files live on, the board identity resolved once
//! at construction, and the privilege probe consulted on every call.
//!
//! # Example
//!
//! ```no_run
//! use jetson_clocks::JetsonClocks;
//!
//! let clocks = JetsonClocks::new();
//! println!("SoC family: {:?}", clocks.board().family);
//!
//! // Pin the GPU to its highest frequency
//! let freqs = clocks.gpu_available_freqs().unwrap();
//! if let Some(&max) = freqs.last() {
//!     clocks.set_gpu_freq_range(max, max).unwrap();
//! }
//!
//! for cpu in clocks.cpu_ids().unwrap() {
//!     println!("CPU{}: {} kHz", cpu, clocks.cpu_cur_freq(cpu).unwrap());
//! }
//! ```
//!
//! Operations are blocking and perform no locking. Two handles writing the
//! same control race with last-write-wins semantics.

mod cpu;
mod emc;
mod fan;
mod gpu;

use crate::board::{BoardInfo, SocFamily};
use crate::error::Result;
use crate::paths::{self, Control};
use crate::privilege::{self, EffectiveUser, Privilege};
use crate::sysfs::Sysfs;
use std::path::{Path, PathBuf};

/// Handle on a Jetson board's power controls
#[derive(Debug)]
pub struct JetsonClocks {
    sysfs: Sysfs,
    board: BoardInfo,
    privilege: Box<dyn Privilege>,
}

impl Default for JetsonClocks {
    fn default() -> Self {
        Self::new()
    }
}

impl JetsonClocks {
    /// Open the live board, identifying it from sysfs and checking the
    /// effective user on every call
    pub fn new() -> Self {
        let sysfs = Sysfs::system();
        let board = BoardInfo::detect(&sysfs);
        Self::with_parts(sysfs, board, EffectiveUser)
    }

    /// Assemble a handle from explicit parts
    pub fn with_parts<P: Privilege + 'static>(sysfs: Sysfs, board: BoardInfo, privilege: P) -> Self {
        Self {
            sysfs,
            board,
            privilege: Box::new(privilege),
        }
    }

    /// Board identity this handle was created with
    pub fn board(&self) -> &BoardInfo {
        &self.board
    }

    /// Filesystem the control files are read from
    pub fn sysfs(&self) -> &Sysfs {
        &self.sysfs
    }

    fn require_root(&self, operation: &str) -> Result<()> {
        privilege::require(self.privilege.as_ref(), operation)
    }

    fn family(&self) -> Result<SocFamily> {
        self.board.soc_family()
    }

    fn resolve(&self, control: Control) -> Result<PathBuf> {
        paths::resolve_one(control, self.family()?)
    }

    /// Write a side-effect control file, skipping it if this board lacks it
    fn write_auxiliary(&self, path: &Path, value: &str) -> Result<()> {
        if !self.sysfs.exists(path) {
            log::debug!("skipping {}: not present", path.display());
            return Ok(());
        }
        self.sysfs.write(path, value)
    }

    /// Turn off QoS throttling and cluster idle states ahead of a CPU change
    fn disable_cpu_throttling(&self) -> Result<()> {
        for path in paths::throttle_paths(self.board.family)? {
            self.write_auxiliary(&path, "0")?;
        }
        Ok(())
    }
}
