//! Whole-board snapshots
//!
//! [`ClockState`] gathers every control value a board reports in one pass.
//! It backs the show, store and restore actions and the maximize preset.
//!
//! The GPU floor and ceiling can only be read back on tegra194. On other
//! families a snapshot carries the GPU frequency table but no range, so the
//! stored settings have no `[gpu]` section and a restore leaves the GPU range
//! as it finds it.

use crate::board::BoardInfo;
use crate::clocks::JetsonClocks;
use crate::config::{ClocksConfig, CpuConfig, EmcConfig, FanConfig, GpuConfig};
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Governor selected by [`maximize`]
pub const PERFORMANCE_GOVERNOR: &str = "performance";

/// Snapshot of a board's clocks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClockState {
    /// Board the snapshot was taken on
    pub board: BoardInfo,
    /// Fan PWM target, if the board has a fan control
    pub fan_speed: Option<u8>,
    /// GPU clocks, if the family has a GPU devfreq node
    pub gpu: Option<GpuState>,
    /// EMC clocks, if the family has EMC controls
    pub emc: Option<EmcState>,
    /// One entry per CPU, ascending by id
    pub cpus: Vec<CpuState>,
}

/// GPU devfreq values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuState {
    /// Advertised frequencies, ascending
    pub available_freqs: Vec<i64>,
    /// Current floor (tegra194 only)
    pub min_freq: Option<i64>,
    /// Current ceiling (tegra194 only)
    pub max_freq: Option<i64>,
    /// Current clock (tegra194 only)
    pub cur_freq: Option<i64>,
    /// Load in tenths of a percent (tegra210 only)
    pub load: Option<i64>,
}

/// External memory controller rates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmcState {
    /// Lowest allowed rate
    pub min_freq: i64,
    /// Effective highest rate, after any iso-capacity cap
    pub max_freq: i64,
    /// Current rate
    pub cur_freq: i64,
}

/// Per-core cpufreq values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuState {
    /// CPU id from the `cpu<N>` node name
    pub id: u32,
    /// Active governor
    pub governor: Option<String>,
    /// Governors the core advertises, in kernel order
    pub available_governors: Vec<String>,
    /// Frequencies the core advertises, ascending
    pub available_freqs: Vec<i64>,
    /// Current floor
    pub min_freq: Option<i64>,
    /// Current ceiling
    pub max_freq: Option<i64>,
    /// Current frequency
    pub cur_freq: Option<i64>,
}

/// Turn "this board has no such control" into `None`
///
/// Every other failure, including a refused privilege check, still aborts.
fn optional<T>(what: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e @ (Error::UnsupportedPlatform(_) | Error::ResourceUnavailable(_))) => {
            log::debug!("skipping {}: {}", what, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn skip_missing(what: &str, result: Result<()>) -> Result<()> {
    optional(what, result).map(drop)
}

impl ClockState {
    /// Read every control the board supports
    pub fn capture(clocks: &JetsonClocks) -> Result<Self> {
        let fan_speed = optional("fan speed", clocks.fan_speed())?;

        let gpu = match optional("gpu frequencies", clocks.gpu_available_freqs())? {
            Some(available_freqs) => Some(GpuState {
                available_freqs,
                min_freq: optional("gpu min frequency", clocks.gpu_min_freq())?,
                max_freq: optional("gpu max frequency", clocks.gpu_max_freq())?,
                cur_freq: optional("gpu current frequency", clocks.gpu_cur_freq())?,
                load: optional("gpu load", clocks.gpu_load())?,
            }),
            None => None,
        };

        let emc = match optional("emc range", clocks.emc_available_freq_range())? {
            Some((min_freq, max_freq)) => optional("emc frequency", clocks.emc_freq())?.map(
                |cur_freq| EmcState {
                    min_freq,
                    max_freq,
                    cur_freq,
                },
            ),
            None => None,
        };

        let mut cpus = Vec::new();
        for id in clocks.cpu_ids()? {
            cpus.push(CpuState {
                id,
                governor: optional("cpu governor", clocks.cpu_governor(id))?,
                available_governors: optional(
                    "cpu governors",
                    clocks.cpu_available_governors(id),
                )?
                .unwrap_or_default(),
                available_freqs: optional("cpu frequencies", clocks.cpu_available_freqs(id))?
                    .unwrap_or_default(),
                min_freq: optional("cpu min frequency", clocks.cpu_min_freq(id))?,
                max_freq: optional("cpu max frequency", clocks.cpu_max_freq(id))?,
                cur_freq: optional("cpu current frequency", clocks.cpu_cur_freq(id))?,
            });
        }

        Ok(Self {
            board: clocks.board().clone(),
            fan_speed,
            gpu,
            emc,
            cpus,
        })
    }

    /// Settings that would bring a board back to this state
    ///
    /// A GPU whose range could not be read is left out, with a warning.
    pub fn to_config(&self) -> ClocksConfig {
        let gpu = self.gpu.as_ref().and_then(|gpu| match (gpu.min_freq, gpu.max_freq) {
            (Some(min_freq), Some(max_freq)) => Some(GpuConfig { min_freq, max_freq }),
            _ => {
                log::warn!(
                    "gpu frequency range cannot be read on {}; it will not be stored",
                    self.board
                        .family
                        .map(|family| family.as_str())
                        .unwrap_or("this board")
                );
                None
            }
        });

        ClocksConfig {
            family: self.board.family,
            fan: self.fan_speed.map(|speed| FanConfig { speed }),
            gpu,
            emc: self.emc.as_ref().map(|emc| EmcConfig { freq: emc.cur_freq }),
            cpus: self
                .cpus
                .iter()
                .map(|cpu| CpuConfig {
                    id: cpu.id,
                    governor: cpu.governor.clone(),
                    min_freq: cpu.min_freq,
                    max_freq: cpu.max_freq,
                })
                .collect(),
        }
    }
}

/// Write stored settings back to the board
///
/// Sections for controls this board does not have are skipped. A value the
/// board does not advertise aborts the restore.
pub fn apply_config(clocks: &JetsonClocks, config: &ClocksConfig) -> Result<()> {
    if let (Some(stored), Some(current)) = (config.family, clocks.board().family) {
        if stored != current {
            log::warn!(
                "settings were captured on {} but this board is {}",
                stored,
                current
            );
        }
    }

    if let Some(fan) = config.fan {
        skip_missing("fan speed", clocks.set_fan_speed(fan.speed))?;
    }
    if let Some(gpu) = config.gpu {
        skip_missing(
            "gpu frequency range",
            clocks.set_gpu_freq_range(gpu.min_freq, gpu.max_freq),
        )?;
    }
    if let Some(emc) = config.emc {
        skip_missing("emc frequency", clocks.set_emc_freq(emc.freq))?;
    }

    for cpu in &config.cpus {
        if let Some(governor) = &cpu.governor {
            skip_missing("cpu governor", clocks.set_cpu_governor(cpu.id, governor))?;
        }
        let result = match (cpu.min_freq, cpu.max_freq) {
            (Some(min), Some(max)) => clocks.set_cpu_freq_range(cpu.id, min, max),
            (Some(min), None) => clocks.set_cpu_min_freq(cpu.id, min),
            (None, Some(max)) => clocks.set_cpu_max_freq(cpu.id, max),
            (None, None) => Ok(()),
        };
        skip_missing("cpu frequency range", result)?;
    }

    Ok(())
}

/// Run every control at its highest setting
///
/// The fan goes to full speed, the GPU and each CPU are pinned to their top
/// advertised frequency and the EMC is locked at its effective maximum.
pub fn maximize(clocks: &JetsonClocks) -> Result<()> {
    skip_missing("fan speed", clocks.set_fan_speed(u8::MAX))?;

    if let Some(freqs) = optional("gpu frequencies", clocks.gpu_available_freqs())? {
        if let Some(&max) = freqs.last() {
            clocks.set_gpu_freq_range(max, max)?;
        }
    }

    if let Some((_, max)) = optional("emc range", clocks.emc_available_freq_range())? {
        clocks.set_emc_freq(max)?;
    }

    for id in clocks.cpu_ids()? {
        let governors = optional("cpu governors", clocks.cpu_available_governors(id))?
            .unwrap_or_default();
        if governors.iter().any(|g| g == PERFORMANCE_GOVERNOR) {
            skip_missing("cpu governor", clocks.set_cpu_governor(id, PERFORMANCE_GOVERNOR))?;
        }

        let freqs = optional("cpu frequencies", clocks.cpu_available_freqs(id))?;
        if let Some(&max) = freqs.as_ref().and_then(|f| f.last()) {
            skip_missing("cpu frequency range", clocks.set_cpu_freq_range(id, max, max))?;
        }
    }

    log::info!("all clocks set to maximum");
    Ok(())
}

fn or_na<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Jetson Clocks ===")?;
        writeln!(f, "SoC family: {}", or_na(&self.board.family))?;
        writeln!(f, "Machine: {}", self.board.machine())?;
        writeln!(f, "Fan: PWM {}", or_na(&self.fan_speed))?;

        if let Some(gpu) = &self.gpu {
            writeln!(
                f,
                "GPU: MinFreq={} MaxFreq={} CurrentFreq={}",
                or_na(&gpu.min_freq),
                or_na(&gpu.max_freq),
                or_na(&gpu.cur_freq)
            )?;
            if let Some(load) = gpu.load {
                writeln!(f, "GPU load: {}.{}%", load / 10, load % 10)?;
            }
        }

        if let Some(emc) = &self.emc {
            writeln!(
                f,
                "EMC: MinFreq={} MaxFreq={} CurrentFreq={}",
                emc.min_freq, emc.max_freq, emc.cur_freq
            )?;
        }

        for cpu in &self.cpus {
            writeln!(
                f,
                "cpu{}: Governor={} MinFreq={} MaxFreq={} CurrentFreq={}",
                cpu.id,
                or_na(&cpu.governor),
                or_na(&cpu.min_freq),
                or_na(&cpu.max_freq),
                or_na(&cpu.cur_freq)
            )?;
        }
        Ok(())
    }
}
