use crate::types::HardwareIdentity;
use std::path::PathBuf;
use tracing::{debug, warn};

pub const DEFAULT_INTERFACES: [&str; 3] = ["eth0", "wlan0", "wwan0"];

/// Something that can name the device this process runs on.
pub trait IdentitySource {
    fn resolve(&self) -> HardwareIdentity;
}

/// MAC address of the first network interface present under a sysfs root.
#[derive(Debug, Clone)]
pub struct SysfsMacIdentity {
    root: PathBuf,
    interfaces: Vec<String>,
}

impl Default for SysfsMacIdentity {
    fn default() -> Self {
        Self::new("/sys/class/net", DEFAULT_INTERFACES)
    }
}

impl SysfsMacIdentity {
    #[must_use]
    pub fn new<I, S>(root: impl Into<PathBuf>, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.into(),
            interfaces: interfaces.into_iter().map(Into::into).collect(),
        }
    }
}

impl IdentitySource for SysfsMacIdentity {
    fn resolve(&self) -> HardwareIdentity {
        self.interfaces
            .iter()
            .map(|name| self.root.join(name).join("address"))
            .filter(|path| path.exists())
            .find_map(|path| match std::fs::read_to_string(&path) {
                Ok(contents) => {
                    debug!("Read hardware identity from {}", path.display());
                    Some(HardwareIdentity::new(contents.trim()))
                }
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    None
                }
            })
            .filter(HardwareIdentity::is_available)
            .unwrap_or_else(HardwareIdentity::unavailable)
    }
}

/// Identity supplied by configuration or the command line.
#[derive(Debug, Clone)]
pub struct FixedIdentity(HardwareIdentity);

impl FixedIdentity {
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self(HardwareIdentity::new(identity))
    }
}

impl IdentitySource for FixedIdentity {
    fn resolve(&self) -> HardwareIdentity {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::{FixedIdentity, IdentitySource, SysfsMacIdentity};
    use crate::types::HardwareIdentity;
    use std::fs;

    fn write_address(root: &std::path::Path, interface: &str, contents: &str) {
        let dir = root.join(interface);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("address"), contents).unwrap();
    }

    #[test]
    fn first_present_interface_wins() {
        let root = tempfile::tempdir().unwrap();
        write_address(root.path(), "wlan0", "b8:27:eb:00:00:02\n");
        write_address(root.path(), "wwan0", "b8:27:eb:00:00:03\n");

        let source = SysfsMacIdentity::new(root.path(), ["eth0", "wlan0", "wwan0"]);

        assert_eq!(source.resolve(), HardwareIdentity::new("b8:27:eb:00:00:02"));
    }

    #[test]
    fn no_interfaces_yields_sentinel() {
        let root = tempfile::tempdir().unwrap();
        let source = SysfsMacIdentity::new(root.path(), ["eth0"]);

        let identity = source.resolve();

        assert_eq!(identity.value(), HardwareIdentity::UNAVAILABLE);
        assert!(!identity.is_available());
    }

    #[test]
    fn fixed_identity_is_returned_verbatim() {
        assert_eq!(
            FixedIdentity::new("aa:bb:cc:dd:ee:ff").resolve().value(),
            "aa:bb:cc:dd:ee:ff"
        );
    }
}
