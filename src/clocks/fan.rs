//! Fan PWM control

use super::JetsonClocks;
use crate::error::{Error, Result};
use crate::paths;
use std::path::PathBuf;

impl JetsonClocks {
    /// Set the fan PWM target (0-255)
    ///
    /// On boards whose fan is hardwired on this succeeds without writing.
    pub fn set_fan_speed(&self, speed: u8) -> Result<()> {
        self.require_root("set fan speed")?;

        if self.board.fan_always_on() {
            log::debug!("fan on {} is always on, ignoring speed", self.board.machine);
            return Ok(());
        }

        let path = self.fan_target()?;
        self.sysfs.write(&path, &speed.to_string())
    }

    /// Read the fan PWM target (0-255)
    ///
    /// Boards whose fan is hardwired on always report full speed.
    pub fn fan_speed(&self) -> Result<u8> {
        self.require_root("read fan speed")?;

        if self.board.fan_always_on() {
            return Ok(u8::MAX);
        }

        let path = self.fan_target()?;
        let value = self.sysfs.read_i64(&path)?;
        u8::try_from(value).map_err(|_| {
            Error::ParseFailure(format!(
                "{} holds {}, outside the 0-255 PWM range",
                path.display(),
                value
            ))
        })
    }

    /// First writable fan target file
    fn fan_target(&self) -> Result<PathBuf> {
        paths::fan_target_paths()
            .into_iter()
            .find(|path| self.sysfs.writable(path))
            .ok_or_else(|| Error::ResourceUnavailable("fan speed file not found".to_string()))
    }
}
