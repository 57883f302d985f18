/*
    FloppyBay
    https://github.com/dbalsom/floppybay

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/config.rs

    Host policy settings for the floppy subsystem.
    
*/

//! Host policy for a [Catalog](crate::Catalog). A frontend builds one of these from its own
//! option strings and hands it to the catalog at construction; most values may also be changed
//! while running with [Catalog::set_config](crate::Catalog::set_config).

use crate::DEFAULT_TRANSITION_DELAY;

/// Global write protection applied to both drives.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WriteProtection {
    #[default]
    Off,
    On,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloppyConfig {
    /// Refuse all sector writes when `On`, regardless of per-drive settings.
    pub write_protection: WriteProtection,
    /// Allow modified images to be written to the host save store when ejected.
    pub save_enabled: bool,
    /// Allow bulk loads to place a second image into drive B.
    pub drive_b_enabled: bool,
    /// Allow the ejects performed while restoring a snapshot to persist modified images.
    pub persist_on_restore: bool,
    /// Length of each write-protect transition phase, in vertical blank ticks.
    pub transition_delay: u32,
}

impl Default for FloppyConfig {
    fn default() -> Self {
        FloppyConfig {
            write_protection: WriteProtection::Off,
            save_enabled: true,
            drive_b_enabled: true,
            persist_on_restore: false,
            transition_delay: DEFAULT_TRANSITION_DELAY,
        }
    }
}

impl FloppyConfig {
    pub fn new() -> FloppyConfig {
        Default::default()
    }

    pub fn with_write_protection(mut self, protection: WriteProtection) -> FloppyConfig {
        self.write_protection = protection;
        self
    }

    pub fn with_save_enabled(mut self, state: bool) -> FloppyConfig {
        self.save_enabled = state;
        self
    }

    pub fn with_drive_b(mut self, state: bool) -> FloppyConfig {
        self.drive_b_enabled = state;
        self
    }

    pub fn with_persist_on_restore(mut self, state: bool) -> FloppyConfig {
        self.persist_on_restore = state;
        self
    }

    /// Set the transition phase length. A delay of zero disables the write-protect transition
    /// entirely.
    pub fn with_transition_delay(mut self, ticks: u32) -> FloppyConfig {
        self.transition_delay = ticks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = FloppyConfig::new()
            .with_write_protection(WriteProtection::On)
            .with_save_enabled(false)
            .with_drive_b(false)
            .with_transition_delay(5);

        assert_eq!(config.write_protection, WriteProtection::On);
        assert!(!config.save_enabled);
        assert!(!config.drive_b_enabled);
        assert!(!config.persist_on_restore);
        assert_eq!(config.transition_delay, 5);
        assert_eq!(FloppyConfig::default().transition_delay, DEFAULT_TRANSITION_DELAY);
    }
}
