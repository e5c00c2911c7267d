//! Sysfs access primitives
//!
//! Every control path handed out by [`crate::paths`] is absolute. A [`Sysfs`]
//! re-anchors those paths under its root, which is `/` on a real board and a
//! scratch directory when driving the controls against a fake tree.

use crate::error::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Handle on the virtual filesystem that holds the Jetson control files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sysfs {
    root: PathBuf,
}

impl Default for Sysfs {
    fn default() -> Self {
        Self::system()
    }
}

impl Sysfs {
    /// The live filesystem
    pub fn system() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }

    /// A filesystem tree mounted somewhere other than `/`
    pub fn rooted<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Root every path is resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an absolute control path onto this filesystem
    pub fn locate<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        self.root.join(path.strip_prefix("/").unwrap_or(path))
    }

    /// Check if file/directory exists
    pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
        self.locate(path).exists()
    }

    /// Check that a file exists and can be opened for writing
    ///
    /// The file is opened without truncation, so probing leaves its contents
    /// untouched.
    pub fn writable<P: AsRef<Path>>(&self, path: P) -> bool {
        let target = self.locate(path);
        target.is_file() && OpenOptions::new().write(true).open(&target).is_ok()
    }

    /// Read a whole file, or an empty string if it cannot be read
    pub fn read<P: AsRef<Path>>(&self, path: P) -> String {
        fs::read_to_string(self.locate(path)).unwrap_or_default()
    }

    /// Write a value to a control file
    pub fn write<P: AsRef<Path>>(&self, path: P, value: &str) -> Result<()> {
        let path = path.as_ref();
        if !self.writable(path) {
            return Err(Error::ResourceUnavailable(format!(
                "{} is not writable",
                path.display()
            )));
        }

        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(self.locate(path))?;
        file.write_all(value.as_bytes())?;
        log::info!("wrote '{}' to {}", value, path.display());
        Ok(())
    }

    /// Names of the immediate child directories of `path`, sorted
    ///
    /// Symlinks and plain files are skipped. Returns an empty list when `path`
    /// is not a readable directory.
    pub fn list_subdirectories<P: AsRef<Path>>(&self, path: P) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.locate(path)) else {
            return Vec::new();
        };

        let mut dirs: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|kind| kind.is_dir()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        dirs.sort();
        dirs
    }

    /// Read an existing file and parse its leading integer
    pub fn read_i64<P: AsRef<Path>>(&self, path: P) -> Result<i64> {
        let path = path.as_ref();
        self.require(path)?;
        parse_leading_i64(&self.read(path)).ok_or_else(|| {
            Error::ParseFailure(format!("{} does not hold an integer", path.display()))
        })
    }

    /// Read an existing file as a whitespace-separated list of integers
    ///
    /// Every token must be an integer. A blank file is an empty list.
    pub fn read_i64_list<P: AsRef<Path>>(&self, path: P) -> Result<Vec<i64>> {
        let path = path.as_ref();
        self.require(path)?;
        self.read(path)
            .split_whitespace()
            .map(|token| {
                token.parse().map_err(|_| {
                    Error::ParseFailure(format!(
                        "{} holds '{}', which is not an integer",
                        path.display(),
                        token
                    ))
                })
            })
            .collect()
    }

    /// Read an existing file as a whitespace-separated list of words
    pub fn read_words<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>> {
        let path = path.as_ref();
        self.require(path)?;
        Ok(self
            .read(path)
            .split_whitespace()
            .map(str::to_string)
            .collect())
    }

    /// Read an existing file with surrounding whitespace trimmed
    pub fn read_trimmed<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        let path = path.as_ref();
        self.require(path)?;
        Ok(self.read(path).trim().to_string())
    }

    fn require(&self, path: &Path) -> Result<()> {
        if self.exists(path) {
            Ok(())
        } else {
            Err(Error::ResourceUnavailable(format!(
                "{} does not exist",
                path.display()
            )))
        }
    }
}

/// Parse the integer at the start of `content`
///
/// Leading whitespace and an optional sign are accepted; anything after the
/// digits is ignored. Returns `None` when no digits are present.
pub fn parse_leading_i64(content: &str) -> Option<i64> {
    let trimmed = content.trim_start();
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    let sign_len = trimmed.len() - unsigned.len();
    if sign_len > 1 {
        return None;
    }

    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }

    trimmed[..sign_len + digits].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_i64() {
        assert_eq!(parse_leading_i64("1300000\n"), Some(1300000));
        assert_eq!(parse_leading_i64("  42 rest"), Some(42));
        assert_eq!(parse_leading_i64("-7"), Some(-7));
        assert_eq!(parse_leading_i64("+7"), Some(7));
        assert_eq!(parse_leading_i64("128abc"), Some(128));
        assert_eq!(parse_leading_i64("abc"), None);
        assert_eq!(parse_leading_i64(""), None);
        assert_eq!(parse_leading_i64("--1"), None);
    }

    #[test]
    fn test_locate_reanchors_absolute_paths() {
        let sysfs = Sysfs::rooted("/tmp/fake");
        assert_eq!(
            sysfs.locate("/sys/devices/soc0/family"),
            PathBuf::from("/tmp/fake/sys/devices/soc0/family")
        );
        assert_eq!(
            Sysfs::system().locate("/proc/device-tree/model"),
            PathBuf::from("/proc/device-tree/model")
        );
    }

    #[test]
    fn test_read_write() {
        let dir = tempfile::tempdir().unwrap();
        let sysfs = Sysfs::rooted(dir.path());
        let file = sysfs.locate("/sys/module/qos/parameters/enable");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "1\n").unwrap();

        assert!(sysfs.exists("/sys/module/qos/parameters/enable"));
        assert!(sysfs.writable("/sys/module/qos/parameters/enable"));
        assert_eq!(sysfs.read("/sys/module/qos/parameters/enable"), "1\n");

        sysfs.write("/sys/module/qos/parameters/enable", "0").unwrap();
        assert_eq!(sysfs.read_i64("/sys/module/qos/parameters/enable").unwrap(), 0);
    }

    #[test]
    fn test_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let sysfs = Sysfs::rooted(dir.path());

        assert!(!sysfs.exists("/missing"));
        assert!(!sysfs.writable("/missing"));
        assert_eq!(sysfs.read("/missing"), "");
        assert!(matches!(
            sysfs.write("/missing", "1"),
            Err(Error::ResourceUnavailable(_))
        ));
        assert!(matches!(
            sysfs.read_i64("/missing"),
            Err(Error::ResourceUnavailable(_))
        ));
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_read_i64_rejects_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("rate"), "fast\n").unwrap();
        let sysfs = Sysfs::rooted(dir.path());

        assert!(matches!(
            sysfs.read_i64("/rate"),
            Err(Error::ParseFailure(_))
        ));
    }

    #[test]
    fn test_read_lists() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("freqs"), "100 900\n500\n").unwrap();
        fs::write(dir.path().join("empty"), "\n").unwrap();
        fs::write(dir.path().join("govs"), "interactive\npowersave\nperformance\n").unwrap();
        let sysfs = Sysfs::rooted(dir.path());

        assert_eq!(sysfs.read_i64_list("/freqs").unwrap(), vec![100, 900, 500]);
        assert!(sysfs.read_i64_list("/empty").unwrap().is_empty());
        assert_eq!(
            sysfs.read_words("/govs").unwrap(),
            vec!["interactive", "powersave", "performance"]
        );
    }

    #[test]
    fn test_read_i64_list_rejects_text() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("na"), "N/A\n").unwrap();
        fs::write(dir.path().join("mixed"), "100 900 x 7\n").unwrap();
        let sysfs = Sysfs::rooted(dir.path());

        for path in ["/na", "/mixed"] {
            assert!(matches!(
                sysfs.read_i64_list(path),
                Err(Error::ParseFailure(_))
            ));
        }
    }

    #[test]
    fn test_list_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("cpu/cpu1")).unwrap();
        fs::create_dir_all(dir.path().join("cpu/cpu0")).unwrap();
        fs::create_dir_all(dir.path().join("cpu/cpufreq")).unwrap();
        fs::write(dir.path().join("cpu/online"), "0-1\n").unwrap();
        std::os::unix::fs::symlink(dir.path().join("cpu/cpu0"), dir.path().join("cpu/alias"))
            .unwrap();
        let sysfs = Sysfs::rooted(dir.path());

        assert_eq!(
            sysfs.list_subdirectories("/cpu"),
            vec!["cpu0", "cpu1", "cpufreq"]
        );
        assert!(sysfs.list_subdirectories("/cpu/online").is_empty());
        assert!(sysfs.list_subdirectories("/nowhere").is_empty());
    }
}
