//! Control path table
//!
//! Every family-specific sysfs location lives here. Control operations ask
//! for a [`Control`] and get back the concrete file(s) for the board's
//! [`SocFamily`], or `UnsupportedPlatform` when the family has no such file.

use crate::board::SocFamily;
use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;

/// Directory holding the per-core `cpu<N>` nodes
pub const CPU_SYSFS_DIR: &str = "/sys/devices/system/cpu";

/// Fan PWM target files, tried in order
pub const FAN_TARGET_PATHS: &[&str] = &[
    "/sys/kernel/debug/tegra_fan/target_pwm",
    "/sys/devices/pwm-fan/target_pwm",
];

const QOS_ENABLE_PATH: &str = "/sys/module/qos/parameters/enable";
const TEGRA186_CLUSTER_IDLE_PATHS: &[&str] = &[
    "/sys/kernel/debug/tegra_cpufreq/M_CLUSTER/cc3/enable",
    "/sys/kernel/debug/tegra_cpufreq/B_CLUSTER/cc3/enable",
];

const BPMP_EMC_DIR: &str = "/sys/kernel/debug/bpmp/debug/clk/emc";
const EMC_ISO_CAP_PATH: &str = "/sys/kernel/nvpmodel_emc_cap/emc_iso_cap";
const BWMGR_DIR: &str = "/sys/kernel/debug/tegra_bwmgr";
const CLK_OVERRIDE_EMC_DIR: &str = "/sys/kernel/debug/clk/override.emc";
const TEGRA210_GPU_LOAD_PATH: &str = "/sys/devices/gpu.0/load";

/// Power controls reachable through sysfs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// GPU devfreq frequency table
    GpuAvailableFrequencies,
    /// GPU devfreq floor, as written by the range setter
    GpuMinFreqSetting,
    /// GPU devfreq ceiling, as written by the range setter
    GpuMaxFreqSetting,
    /// GPU devfreq floor, as read back
    GpuMinFreq,
    /// GPU devfreq ceiling, as read back
    GpuMaxFreq,
    /// GPU current clock
    GpuCurFreq,
    /// GPU rail-gate enable flag
    GpuRailGate,
    /// GPU load (per mille)
    GpuLoad,
    /// EMC minimum rate
    EmcMinRate,
    /// EMC nominal maximum rate
    EmcMaxRate,
    /// EMC iso-capacity cap set by nvpmodel
    EmcIsoCap,
    /// EMC rate to apply
    EmcUpdateRate,
    /// EMC rate lock / override state
    EmcRateOverride,
    /// Per-cluster cc3 idle state enables
    ClusterIdleEnable,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Control::GpuAvailableFrequencies => "gpu available frequencies",
            Control::GpuMinFreqSetting | Control::GpuMinFreq => "gpu min frequency",
            Control::GpuMaxFreqSetting | Control::GpuMaxFreq => "gpu max frequency",
            Control::GpuCurFreq => "gpu current frequency",
            Control::GpuRailGate => "gpu rail-gate",
            Control::GpuLoad => "gpu load",
            Control::EmcMinRate => "emc min rate",
            Control::EmcMaxRate => "emc max rate",
            Control::EmcIsoCap => "emc iso cap",
            Control::EmcUpdateRate => "emc rate",
            Control::EmcRateOverride => "emc rate override",
            Control::ClusterIdleEnable => "cluster idle enable",
        };
        f.write_str(name)
    }
}

/// Leaf files under `cpu<N>/cpufreq/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuLeaf {
    AvailableFrequencies,
    AvailableGovernors,
    Governor,
    MinFreq,
    MaxFreq,
    CurFreq,
}

impl CpuLeaf {
    fn file_name(&self) -> &'static str {
        match self {
            CpuLeaf::AvailableFrequencies => "scaling_available_frequencies",
            CpuLeaf::AvailableGovernors => "scaling_available_governors",
            CpuLeaf::Governor => "scaling_governor",
            CpuLeaf::MinFreq => "scaling_min_freq",
            CpuLeaf::MaxFreq => "scaling_max_freq",
            CpuLeaf::CurFreq => "scaling_cur_freq",
        }
    }
}

/// devfreq node name of the GPU on each family
fn gpu_node(family: SocFamily) -> &'static str {
    match family {
        SocFamily::Tegra186 => "17000000.gp10b",
        SocFamily::Tegra194 => "17000000.gv11b",
        SocFamily::Tegra210 => "57000000.gpu",
    }
}

fn gpu_devfreq(family: SocFamily, leaf: &str) -> PathBuf {
    let node = gpu_node(family);
    PathBuf::from(format!("/sys/devices/{node}/devfreq/{node}/{leaf}"))
}

/// Resolve the file(s) backing `control` on `family`
///
/// Most controls map to exactly one file. `ClusterIdleEnable` maps to one file
/// per CPU cluster, or to none on families without cluster idle controls.
pub fn resolve(control: Control, family: SocFamily) -> Result<Vec<PathBuf>> {
    use Control::*;
    use SocFamily::*;

    let paths: Vec<PathBuf> = match (control, family) {
        (GpuAvailableFrequencies, _) => vec![gpu_devfreq(family, "available_frequencies")],
        (GpuMinFreqSetting, _) => vec![gpu_devfreq(family, "min_freq")],
        (GpuMaxFreqSetting, _) => vec![gpu_devfreq(family, "max_freq")],
        (GpuRailGate, _) => vec![gpu_devfreq(family, "device/railgate_enable")],
        (GpuMinFreq, Tegra194) => vec![gpu_devfreq(family, "min_freq")],
        (GpuMaxFreq, Tegra194) => vec![gpu_devfreq(family, "max_freq")],
        (GpuCurFreq, Tegra194) => vec![gpu_devfreq(family, "cur_freq")],
        (GpuLoad, Tegra210) => vec![PathBuf::from(TEGRA210_GPU_LOAD_PATH)],

        (EmcMinRate, Tegra186 | Tegra194) => vec![PathBuf::from(BPMP_EMC_DIR).join("min_rate")],
        (EmcMaxRate, Tegra186 | Tegra194) => vec![PathBuf::from(BPMP_EMC_DIR).join("max_rate")],
        (EmcIsoCap, Tegra186 | Tegra194) => vec![PathBuf::from(EMC_ISO_CAP_PATH)],
        (EmcUpdateRate, Tegra186 | Tegra194) => vec![PathBuf::from(BPMP_EMC_DIR).join("rate")],
        (EmcRateOverride, Tegra186 | Tegra194) => {
            vec![PathBuf::from(BPMP_EMC_DIR).join("mrq_rate_locked")]
        }
        (EmcMinRate, Tegra210) => vec![PathBuf::from(BWMGR_DIR).join("emc_min_rate")],
        (EmcMaxRate, Tegra210) => vec![PathBuf::from(BWMGR_DIR).join("emc_max_rate")],
        (EmcUpdateRate, Tegra210) => {
            vec![PathBuf::from(CLK_OVERRIDE_EMC_DIR).join("clk_update_rate")]
        }
        (EmcRateOverride, Tegra210) => vec![PathBuf::from(CLK_OVERRIDE_EMC_DIR).join("clk_state")],

        (ClusterIdleEnable, Tegra186) => TEGRA186_CLUSTER_IDLE_PATHS
            .iter()
            .map(PathBuf::from)
            .collect(),
        (ClusterIdleEnable, _) => Vec::new(),

        (GpuMinFreq | GpuMaxFreq | GpuCurFreq | GpuLoad | EmcIsoCap, _) => {
            return Err(Error::UnsupportedPlatform(format!(
                "{} is not supported on {}",
                control, family
            )));
        }
    };

    log::debug!("resolved {} on {} to {:?}", control, family, paths);
    Ok(paths)
}

/// Resolve a control that maps to exactly one file
pub fn resolve_one(control: Control, family: SocFamily) -> Result<PathBuf> {
    resolve(control, family)?.into_iter().next().ok_or_else(|| {
        Error::UnsupportedPlatform(format!("{} is not supported on {}", control, family))
    })
}

/// Fan PWM target files, in the order they should be tried
pub fn fan_target_paths() -> Vec<PathBuf> {
    FAN_TARGET_PATHS.iter().map(PathBuf::from).collect()
}

/// Files that must be written `0` before changing CPU frequency or governor:
/// the QoS throttling module, plus the cluster idle states on families that
/// have them
pub fn throttle_paths(family: Option<SocFamily>) -> Result<Vec<PathBuf>> {
    let mut paths = vec![PathBuf::from(QOS_ENABLE_PATH)];
    if let Some(family) = family {
        paths.extend(resolve(Control::ClusterIdleEnable, family)?);
    }
    Ok(paths)
}

/// Resolve a per-core cpufreq file
pub fn cpu_path(cpu_id: u32, leaf: CpuLeaf) -> PathBuf {
    PathBuf::from(format!(
        "{}/cpu{}/cpufreq/{}",
        CPU_SYSFS_DIR,
        cpu_id,
        leaf.file_name()
    ))
}

/// Parse a `cpu<N>` directory name into its CPU id
pub fn parse_cpu_dir(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("cpu")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE_PATH_CONTROLS: [Control; 8] = [
        Control::GpuAvailableFrequencies,
        Control::GpuMinFreqSetting,
        Control::GpuMaxFreqSetting,
        Control::GpuRailGate,
        Control::EmcMinRate,
        Control::EmcMaxRate,
        Control::EmcUpdateRate,
        Control::EmcRateOverride,
    ];

    #[test]
    fn test_every_family_resolves_common_controls() {
        for family in SocFamily::ALL {
            for control in SINGLE_PATH_CONTROLS {
                let paths = resolve(control, family).unwrap();
                assert_eq!(paths.len(), 1, "{control} on {family}");
                assert!(paths[0].is_absolute());
            }
        }
    }

    #[test]
    fn test_gpu_paths_are_family_specific() {
        assert_eq!(
            resolve_one(Control::GpuAvailableFrequencies, SocFamily::Tegra186).unwrap(),
            PathBuf::from("/sys/devices/17000000.gp10b/devfreq/17000000.gp10b/available_frequencies")
        );
        assert_eq!(
            resolve_one(Control::GpuAvailableFrequencies, SocFamily::Tegra194).unwrap(),
            PathBuf::from("/sys/devices/17000000.gv11b/devfreq/17000000.gv11b/available_frequencies")
        );
        assert_eq!(
            resolve_one(Control::GpuRailGate, SocFamily::Tegra210).unwrap(),
            PathBuf::from("/sys/devices/57000000.gpu/devfreq/57000000.gpu/device/railgate_enable")
        );
    }

    #[test]
    fn test_gpu_readback_only_on_tegra194() {
        for control in [Control::GpuCurFreq, Control::GpuMinFreq, Control::GpuMaxFreq] {
            assert!(resolve(control, SocFamily::Tegra194).is_ok());
            for family in [SocFamily::Tegra186, SocFamily::Tegra210] {
                assert!(matches!(
                    resolve(control, family),
                    Err(Error::UnsupportedPlatform(_))
                ));
            }
        }
    }

    #[test]
    fn test_emc_paths() {
        assert_eq!(
            resolve_one(Control::EmcUpdateRate, SocFamily::Tegra194).unwrap(),
            PathBuf::from("/sys/kernel/debug/bpmp/debug/clk/emc/rate")
        );
        assert_eq!(
            resolve_one(Control::EmcUpdateRate, SocFamily::Tegra210).unwrap(),
            PathBuf::from("/sys/kernel/debug/clk/override.emc/clk_update_rate")
        );
        assert!(resolve(Control::EmcIsoCap, SocFamily::Tegra186).is_ok());
        assert!(matches!(
            resolve(Control::EmcIsoCap, SocFamily::Tegra210),
            Err(Error::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn test_cluster_idle_only_on_tegra186() {
        assert_eq!(
            resolve(Control::ClusterIdleEnable, SocFamily::Tegra186)
                .unwrap()
                .len(),
            2
        );
        assert!(resolve(Control::ClusterIdleEnable, SocFamily::Tegra194)
            .unwrap()
            .is_empty());
        assert!(matches!(
            resolve_one(Control::ClusterIdleEnable, SocFamily::Tegra210),
            Err(Error::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn test_throttle_paths() {
        assert_eq!(
            throttle_paths(Some(SocFamily::Tegra186)).unwrap(),
            vec![
                PathBuf::from("/sys/module/qos/parameters/enable"),
                PathBuf::from("/sys/kernel/debug/tegra_cpufreq/M_CLUSTER/cc3/enable"),
                PathBuf::from("/sys/kernel/debug/tegra_cpufreq/B_CLUSTER/cc3/enable"),
            ]
        );
        assert_eq!(throttle_paths(Some(SocFamily::Tegra194)).unwrap().len(), 1);
        assert_eq!(throttle_paths(None).unwrap().len(), 1);
        assert_eq!(fan_target_paths().len(), 2);
    }

    #[test]
    fn test_cpu_path() {
        assert_eq!(
            cpu_path(3, CpuLeaf::Governor),
            PathBuf::from("/sys/devices/system/cpu/cpu3/cpufreq/scaling_governor")
        );
        assert_eq!(
            cpu_path(0, CpuLeaf::AvailableFrequencies),
            PathBuf::from("/sys/devices/system/cpu/cpu0/cpufreq/scaling_available_frequencies")
        );
    }

    #[test]
    fn test_parse_cpu_dir() {
        assert_eq!(parse_cpu_dir("cpu0"), Some(0));
        assert_eq!(parse_cpu_dir("cpu11"), Some(11));
        assert_eq!(parse_cpu_dir("cpufreq"), None);
        assert_eq!(parse_cpu_dir("cpuidle"), None);
        assert_eq!(parse_cpu_dir("cpu"), None);
        assert_eq!(parse_cpu_dir("cpu+1"), None);
    }
}
