//! GPU devfreq controls

use super::JetsonClocks;
use crate::error::{Error, Result};
use crate::paths::Control;

impl JetsonClocks {
    /// GPU frequencies the board advertises, ascending
    pub fn gpu_available_freqs(&self) -> Result<Vec<i64>> {
        self.require_root("read gpu available frequencies")?;

        let path = self.resolve(Control::GpuAvailableFrequencies)?;
        let mut freqs = self.sysfs.read_i64_list(&path)?;
        freqs.sort_unstable();
        Ok(freqs)
    }

    /// Bound the GPU clock to `[min_freq, max_freq]` and disable rail-gating
    ///
    /// Both bounds must be advertised frequencies with `min_freq <= max_freq`.
    /// Nothing is written if either is rejected. The ceiling is raised first
    /// when the new floor would sit above the current ceiling.
    pub fn set_gpu_freq_range(&self, min_freq: i64, max_freq: i64) -> Result<()> {
        self.require_root("set gpu frequency range")?;
        Error::check_range("gpu frequency", min_freq, max_freq)?;

        let available = self.gpu_available_freqs()?;
        if !available.contains(&min_freq) {
            return Err(Error::not_available("gpu minimum frequency", min_freq, &available));
        }
        if !available.contains(&max_freq) {
            return Err(Error::not_available("gpu maximum frequency", max_freq, &available));
        }

        let min_path = self.resolve(Control::GpuMinFreqSetting)?;
        let max_path = self.resolve(Control::GpuMaxFreqSetting)?;
        let rail_gate = self.resolve(Control::GpuRailGate)?;

        if min_freq > self.sysfs.read_i64(&max_path)? {
            self.sysfs.write(&max_path, &max_freq.to_string())?;
            self.sysfs.write(&min_path, &min_freq.to_string())?;
        } else {
            self.sysfs.write(&min_path, &min_freq.to_string())?;
            self.sysfs.write(&max_path, &max_freq.to_string())?;
        }
        self.write_auxiliary(&rail_gate, "0")
    }

    /// Current GPU clock
    pub fn gpu_cur_freq(&self) -> Result<i64> {
        self.require_root("read gpu current frequency")?;
        self.sysfs.read_i64(self.resolve(Control::GpuCurFreq)?)
    }

    /// Current GPU clock floor
    pub fn gpu_min_freq(&self) -> Result<i64> {
        self.require_root("read gpu min frequency")?;
        self.sysfs.read_i64(self.resolve(Control::GpuMinFreq)?)
    }

    /// Current GPU clock ceiling
    pub fn gpu_max_freq(&self) -> Result<i64> {
        self.require_root("read gpu max frequency")?;
        self.sysfs.read_i64(self.resolve(Control::GpuMaxFreq)?)
    }

    /// GPU load in tenths of a percent
    pub fn gpu_load(&self) -> Result<i64> {
        self.require_root("read gpu load")?;
        self.sysfs.read_i64(self.resolve(Control::GpuLoad)?)
    }
}
