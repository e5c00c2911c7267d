//! Board identification
//!
//! Works out which Tegra generation the board is built on and which machine
//! it reports itself as. Both are read from the SoC identification files in
//! sysfs, with the device tree as a fallback.

use crate::error::{Error, Result};
use crate::sysfs::Sysfs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const SOC_FAMILY_PATH: &str = "/sys/devices/soc0/family";
const SOC_MACHINE_PATH: &str = "/sys/devices/soc0/machine";
const DT_COMPATIBLE_PATH: &str = "/proc/device-tree/compatible";
const DT_MODEL_PATH: &str = "/proc/device-tree/model";

/// Machine whose CPU fan is hardwired on
pub const JETSON_TK1: &str = "jetson-tk1";

/// Tegra SoC generations with known control paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocFamily {
    /// Jetson TX2 (Parker)
    Tegra186,
    /// Jetson AGX Xavier
    Tegra194,
    /// Jetson Nano / TX1
    Tegra210,
}

impl SocFamily {
    /// All supported families
    pub const ALL: [SocFamily; 3] = [
        SocFamily::Tegra186,
        SocFamily::Tegra194,
        SocFamily::Tegra210,
    ];

    /// Device tree compatible strings, in match priority order
    const COMPATIBLE: [(&'static str, SocFamily); 3] = [
        ("nvidia,tegra210", SocFamily::Tegra210),
        ("nvidia,tegra186", SocFamily::Tegra186),
        ("nvidia,tegra194", SocFamily::Tegra194),
    ];

    /// Codename as it appears in sysfs
    pub fn as_str(&self) -> &'static str {
        match self {
            SocFamily::Tegra186 => "tegra186",
            SocFamily::Tegra194 => "tegra194",
            SocFamily::Tegra210 => "tegra210",
        }
    }

    /// Find the first known family named in a device tree compatible list
    pub fn from_compatible(compatible: &str) -> Option<Self> {
        Self::COMPATIBLE
            .iter()
            .find(|(needle, _)| compatible.contains(needle))
            .map(|(_, family)| *family)
    }
}

impl fmt::Display for SocFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "tegra186" => Ok(SocFamily::Tegra186),
            "tegra194" => Ok(SocFamily::Tegra194),
            "tegra210" => Ok(SocFamily::Tegra210),
            other => Err(Error::UnsupportedPlatform(format!(
                "unknown SoC family '{}'",
                other
            ))),
        }
    }
}

/// Identity of the board, resolved once per session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardInfo {
    /// SoC family, `None` when the board could not be identified
    pub family: Option<SocFamily>,
    /// Machine model string
    pub machine: String,
}

impl BoardInfo {
    /// Build board info from known values
    pub fn new(family: Option<SocFamily>, machine: impl Into<String>) -> Self {
        Self {
            family,
            machine: machine.into(),
        }
    }

    /// Probe the identification files. Never fails; an unidentified board has
    /// no family and an empty machine string.
    pub fn detect(sysfs: &Sysfs) -> Self {
        let info = Self {
            family: detect_family(sysfs),
            machine: detect_machine(sysfs),
        };
        log::debug!(
            "detected board: family={} machine='{}'",
            info.family.map(|f| f.as_str()).unwrap_or("unknown"),
            info.machine
        );
        info
    }

    /// SoC family, or `UnsupportedPlatform` when unknown
    pub fn soc_family(&self) -> Result<SocFamily> {
        self.family.ok_or_else(|| {
            Error::UnsupportedPlatform("SoC family cannot be determined".to_string())
        })
    }

    /// Machine model string
    pub fn machine(&self) -> &str {
        &self.machine
    }

    /// Whether this board's fan cannot be controlled because it is always on
    pub fn fan_always_on(&self) -> bool {
        self.machine == JETSON_TK1
    }
}

fn detect_family(sysfs: &Sysfs) -> Option<SocFamily> {
    if sysfs.exists(SOC_FAMILY_PATH) {
        let family = strip_identifier(&sysfs.read(SOC_FAMILY_PATH));
        if let Ok(family) = family.parse() {
            return Some(family);
        }
        log::debug!("{} reports '{}', checking device tree", SOC_FAMILY_PATH, family);
    }

    if sysfs.exists(DT_COMPATIBLE_PATH) {
        return SocFamily::from_compatible(&sysfs.read(DT_COMPATIBLE_PATH));
    }

    None
}

fn detect_machine(sysfs: &Sysfs) -> String {
    let raw = if sysfs.exists(SOC_FAMILY_PATH) {
        sysfs.read(SOC_MACHINE_PATH)
    } else {
        sysfs.read(DT_MODEL_PATH)
    };
    strip_identifier(&raw)
}

/// Device tree strings are NUL terminated; sysfs ones end in a newline
fn strip_identifier(raw: &str) -> String {
    raw.trim_end_matches(['\0', '\n', '\r'])
        .trim()
        .to_string()
}
