//! Fake Jetson sysfs trees for unit tests

use crate::board::{BoardInfo, SocFamily};
use crate::clocks::JetsonClocks;
use crate::privilege::Fixed;
use crate::sysfs::Sysfs;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub(crate) const GPU_FREQS: &str = "100 900 500\n";
pub(crate) const CPU_FREQS: &str = "345600 2035200 1420800\n";
pub(crate) const CPU_GOVERNORS: &str = "interactive\npowersave\nperformance\n";

/// Scratch directory laid out like the root of a Jetson filesystem
pub(crate) struct FakeTree {
    dir: TempDir,
}

impl FakeTree {
    pub(crate) fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Tree populated with every control file of `family`, and two CPUs
    pub(crate) fn jetson(family: SocFamily) -> Self {
        let tree = Self::new();
        tree.file("/sys/devices/soc0/family", &format!("{}\n", family));
        tree.file("/sys/devices/soc0/machine", "jetson-test\n");

        tree.file("/sys/devices/pwm-fan/target_pwm", "0\n");
        tree.file("/sys/module/qos/parameters/enable", "1\n");

        let node = match family {
            SocFamily::Tegra186 => "17000000.gp10b",
            SocFamily::Tegra194 => "17000000.gv11b",
            SocFamily::Tegra210 => "57000000.gpu",
        };
        let gpu = format!("/sys/devices/{node}/devfreq/{node}");
        tree.file(&format!("{gpu}/available_frequencies"), GPU_FREQS);
        tree.file(&format!("{gpu}/min_freq"), "100\n");
        tree.file(&format!("{gpu}/max_freq"), "900\n");
        tree.file(&format!("{gpu}/cur_freq"), "500\n");
        tree.file(&format!("{gpu}/device/railgate_enable"), "1\n");

        match family {
            SocFamily::Tegra186 | SocFamily::Tegra194 => {
                let emc = "/sys/kernel/debug/bpmp/debug/clk/emc";
                tree.file(&format!("{emc}/min_rate"), "204000000\n");
                tree.file(&format!("{emc}/max_rate"), "1866000000\n");
                tree.file(&format!("{emc}/rate"), "1600000000\n");
                tree.file(&format!("{emc}/mrq_rate_locked"), "0\n");
                tree.file("/sys/kernel/nvpmodel_emc_cap/emc_iso_cap", "0\n");
            }
            SocFamily::Tegra210 => {
                tree.file("/sys/kernel/debug/tegra_bwmgr/emc_min_rate", "204000000\n");
                tree.file("/sys/kernel/debug/tegra_bwmgr/emc_max_rate", "1600000000\n");
                tree.file(
                    "/sys/kernel/debug/clk/override.emc/clk_update_rate",
                    "1331200000\n",
                );
                tree.file("/sys/kernel/debug/clk/override.emc/clk_state", "0\n");
                tree.file("/sys/devices/gpu.0/load", "250\n");
            }
        }

        if family == SocFamily::Tegra186 {
            tree.file("/sys/kernel/debug/tegra_cpufreq/M_CLUSTER/cc3/enable", "1\n");
            tree.file("/sys/kernel/debug/tegra_cpufreq/B_CLUSTER/cc3/enable", "1\n");
        }

        tree.file("/sys/devices/system/cpu/online", "0-1\n");
        fs::create_dir_all(tree.path("/sys/devices/system/cpu/cpufreq")).unwrap();
        fs::create_dir_all(tree.path("/sys/devices/system/cpu/cpuidle")).unwrap();
        for id in [1, 0] {
            let cpufreq = format!("/sys/devices/system/cpu/cpu{id}/cpufreq");
            tree.file(&format!("{cpufreq}/scaling_available_frequencies"), CPU_FREQS);
            tree.file(&format!("{cpufreq}/scaling_available_governors"), CPU_GOVERNORS);
            tree.file(&format!("{cpufreq}/scaling_governor"), "interactive\n");
            tree.file(&format!("{cpufreq}/scaling_min_freq"), "345600\n");
            tree.file(&format!("{cpufreq}/scaling_max_freq"), "2035200\n");
            tree.file(&format!("{cpufreq}/scaling_cur_freq"), "1420800\n");
        }

        tree
    }

    /// Host path backing the absolute board path `path`
    pub(crate) fn path(&self, path: &str) -> PathBuf {
        self.sysfs().locate(path)
    }

    /// Create (or overwrite) a file, creating parent directories
    pub(crate) fn file(&self, path: &str, content: &str) {
        let target = self.path(path);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(target, content).unwrap();
    }

    pub(crate) fn remove(&self, path: &str) {
        fs::remove_file(self.path(path)).unwrap();
    }

    pub(crate) fn read(&self, path: &str) -> String {
        fs::read_to_string(self.path(path)).unwrap()
    }

    pub(crate) fn sysfs(&self) -> Sysfs {
        Sysfs::rooted(self.dir.path())
    }

    /// Content of every file in the tree, keyed by board path
    pub(crate) fn contents(&self) -> BTreeMap<PathBuf, String> {
        walk_files(self.dir.path())
            .into_iter()
            .map(|file| {
                let content = fs::read_to_string(&file).unwrap();
                let relative = file.strip_prefix(self.dir.path()).unwrap();
                (Path::new("/").join(relative), content)
            })
            .collect()
    }

    /// Handle detecting the board from this tree, running as root or not
    pub(crate) fn clocks(&self, root: bool) -> JetsonClocks {
        let sysfs = self.sysfs();
        let board = BoardInfo::detect(&sysfs);
        JetsonClocks::with_parts(sysfs, board, Fixed(root))
    }
}

fn walk_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).unwrap().flatten() {
        let path = entry.path();
        let kind = entry.file_type().unwrap();
        if kind.is_dir() {
            files.extend(walk_files(&path));
        } else if kind.is_file() {
            files.push(path);
        }
    }
    files
}
