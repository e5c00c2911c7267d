//! Per-core cpufreq controls

use super::JetsonClocks;
use crate::error::{Error, Result};
use crate::paths::{cpu_path, parse_cpu_dir, CpuLeaf, CPU_SYSFS_DIR};

impl JetsonClocks {
    /// Ids of every CPU with a `cpu<N>` node, ascending
    pub fn cpu_ids(&self) -> Result<Vec<u32>> {
        self.require_root("look up cpu ids")?;

        let mut ids: Vec<u32> = self
            .sysfs
            .list_subdirectories(CPU_SYSFS_DIR)
            .iter()
            .filter_map(|name| parse_cpu_dir(name))
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Frequencies `cpu_id` can run at, ascending
    pub fn cpu_available_freqs(&self, cpu_id: u32) -> Result<Vec<i64>> {
        self.require_root("read cpu available frequencies")?;

        let mut freqs = self
            .sysfs
            .read_i64_list(cpu_path(cpu_id, CpuLeaf::AvailableFrequencies))?;
        freqs.sort_unstable();
        Ok(freqs)
    }

    /// Governors `cpu_id` can use, in the order the kernel lists them
    pub fn cpu_available_governors(&self, cpu_id: u32) -> Result<Vec<String>> {
        self.require_root("read cpu available governors")?;
        self.sysfs
            .read_words(cpu_path(cpu_id, CpuLeaf::AvailableGovernors))
    }

    /// Current governor of `cpu_id`
    pub fn cpu_governor(&self, cpu_id: u32) -> Result<String> {
        self.require_root("read cpu governor")?;
        self.sysfs.read_trimmed(cpu_path(cpu_id, CpuLeaf::Governor))
    }

    /// Current frequency floor of `cpu_id`
    pub fn cpu_min_freq(&self, cpu_id: u32) -> Result<i64> {
        self.require_root("read cpu min frequency")?;
        self.sysfs.read_i64(cpu_path(cpu_id, CpuLeaf::MinFreq))
    }

    /// Current frequency ceiling of `cpu_id`
    pub fn cpu_max_freq(&self, cpu_id: u32) -> Result<i64> {
        self.require_root("read cpu max frequency")?;
        self.sysfs.read_i64(cpu_path(cpu_id, CpuLeaf::MaxFreq))
    }

    /// Current frequency of `cpu_id`
    pub fn cpu_cur_freq(&self, cpu_id: u32) -> Result<i64> {
        self.require_root("read cpu current frequency")?;
        self.sysfs.read_i64(cpu_path(cpu_id, CpuLeaf::CurFreq))
    }

    /// Switch `cpu_id` to `governor`, which must be one it advertises
    pub fn set_cpu_governor(&self, cpu_id: u32, governor: &str) -> Result<()> {
        self.require_root("set cpu governor")?;

        let path = cpu_path(cpu_id, CpuLeaf::Governor);
        self.require_writable(cpu_id, &path, "governor")?;

        let available = self.cpu_available_governors(cpu_id)?;
        if !available.iter().any(|g| g == governor) {
            return Err(Error::not_available("governor", governor, &available));
        }

        self.disable_cpu_throttling()?;
        self.sysfs.write(&path, governor)
    }

    /// Set the frequency floor of `cpu_id`
    pub fn set_cpu_min_freq(&self, cpu_id: u32, min_freq: i64) -> Result<()> {
        self.require_root("set cpu min frequency")?;
        self.set_cpu_freq_limit(cpu_id, CpuLeaf::MinFreq, min_freq)
    }

    /// Set the frequency ceiling of `cpu_id`
    pub fn set_cpu_max_freq(&self, cpu_id: u32, max_freq: i64) -> Result<()> {
        self.require_root("set cpu max frequency")?;
        self.set_cpu_freq_limit(cpu_id, CpuLeaf::MaxFreq, max_freq)
    }

    /// Set both frequency limits of `cpu_id`
    ///
    /// `min_freq` must not exceed `max_freq`. The ceiling is raised first when
    /// the new floor would sit above the current ceiling, so the limits never
    /// cross in between.
    pub fn set_cpu_freq_range(&self, cpu_id: u32, min_freq: i64, max_freq: i64) -> Result<()> {
        self.require_root("set cpu frequency range")?;
        Error::check_range(&format!("cpu{} frequency", cpu_id), min_freq, max_freq)?;

        let available = self.cpu_available_freqs(cpu_id)?;
        for freq in [min_freq, max_freq] {
            if !available.contains(&freq) {
                return Err(Error::not_available("cpu frequency", freq, &available));
            }
        }

        if min_freq > self.cpu_max_freq(cpu_id)? {
            self.set_cpu_max_freq(cpu_id, max_freq)?;
            self.set_cpu_min_freq(cpu_id, min_freq)
        } else {
            self.set_cpu_min_freq(cpu_id, min_freq)?;
            self.set_cpu_max_freq(cpu_id, max_freq)
        }
    }

    fn set_cpu_freq_limit(&self, cpu_id: u32, leaf: CpuLeaf, freq: i64) -> Result<()> {
        let path = cpu_path(cpu_id, leaf);
        let what = match leaf {
            CpuLeaf::MinFreq => "min frequency",
            _ => "max frequency",
        };
        self.require_writable(cpu_id, &path, what)?;

        let available = self.cpu_available_freqs(cpu_id)?;
        if !available.contains(&freq) {
            return Err(Error::not_available(&format!("cpu {}", what), freq, &available));
        }

        self.disable_cpu_throttling()?;
        self.sysfs.write(&path, &freq.to_string())
    }

    fn require_writable(&self, cpu_id: u32, path: &std::path::Path, what: &str) -> Result<()> {
        if self.sysfs.writable(path) {
            return Ok(());
        }
        Err(Error::ResourceUnavailable(format!(
            "cannot set cpu{} {} because {} is not writable",
            cpu_id,
            what,
            path.display()
        )))
    }
}
