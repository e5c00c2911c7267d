//! External memory controller (EMC) clock controls

use super::JetsonClocks;
use crate::error::{Error, Result};
use crate::paths::Control;
use std::path::PathBuf;

impl JetsonClocks {
    /// File holding the effective EMC maximum
    ///
    /// On families with an nvpmodel iso-capacity cap, the cap file takes over
    /// from the nominal maximum whenever the cap is positive and below it.
    pub fn emc_max_rate_source(&self) -> Result<PathBuf> {
        self.require_root("resolve emc max rate")?;

        let family = self.family()?;
        let nominal = self.resolve(Control::EmcMaxRate)?;
        let Ok(iso_cap) = crate::paths::resolve_one(Control::EmcIsoCap, family) else {
            return Ok(nominal);
        };
        if !self.sysfs.exists(&iso_cap) {
            log::debug!("no emc iso cap at {}", iso_cap.display());
            return Ok(nominal);
        }

        let cap = self.sysfs.read_i64(&iso_cap)?;
        let fmax = self.sysfs.read_i64(&nominal)?;
        if cap > 0 && cap < fmax {
            log::debug!("emc max capped to {} (nominal {})", cap, fmax);
            Ok(iso_cap)
        } else {
            Ok(nominal)
        }
    }

    /// Lowest and highest EMC rates the board allows
    pub fn emc_available_freq_range(&self) -> Result<(i64, i64)> {
        self.require_root("read emc available frequencies")?;

        let min = self.sysfs.read_i64(self.resolve(Control::EmcMinRate)?)?;
        let max = self.sysfs.read_i64(self.emc_max_rate_source()?)?;
        Ok((min, max))
    }

    /// EMC rate bounds as a two-element list, `[min, max]`
    pub fn emc_available_freqs(&self) -> Result<Vec<i64>> {
        let (min, max) = self.emc_available_freq_range()?;
        Ok(vec![min, max])
    }

    /// Current EMC rate
    pub fn emc_freq(&self) -> Result<i64> {
        self.require_root("read emc frequency")?;
        self.sysfs.read_i64(self.resolve(Control::EmcUpdateRate)?)
    }

    /// Lock the EMC to `freq`, which must lie within the available range
    pub fn set_emc_freq(&self, freq: i64) -> Result<()> {
        self.require_root("set emc frequency")?;

        let (min, max) = self.emc_available_freq_range()?;
        if freq < min || freq > max {
            return Err(Error::not_available(
                "emc frequency",
                freq,
                [format!("{}..={}", min, max)],
            ));
        }

        let rate = self.resolve(Control::EmcUpdateRate)?;
        let lock = self.resolve(Control::EmcRateOverride)?;
        self.sysfs.write(&rate, &freq.to_string())?;
        self.sysfs.write(&lock, "1")
    }
}
