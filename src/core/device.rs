//! Best-effort device identifier sent during onboarding.
//!
//! The id is derived from a handful of environment traits and hashed with
//! CRC-32 (IEEE). It is stable for a given machine setup, but it is neither
//! unique nor secret, and must never be treated as a credential.

use chrono::Local;
use ratatui::crossterm::terminal;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintInputs {
    pub os: String,
    pub arch: String,
    pub locale: String,
    pub terminal_size: String,
    pub utc_offset_minutes: i32,
    pub parallelism: String,
}

impl FingerprintInputs {
    pub fn collect() -> Self {
        let locale = ["LC_ALL", "LANG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find(|value| !value.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());

        let terminal_size = terminal::size()
            .map(|(w, h)| format!("{w}x{h}"))
            .unwrap_or_else(|_| UNKNOWN.to_string());

        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get().to_string())
            .unwrap_or_else(|_| UNKNOWN.to_string());

        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            locale,
            terminal_size,
            utc_offset_minutes: Local::now().offset().local_minus_utc() / 60,
            parallelism,
        }
    }

    pub fn fingerprint(&self) -> String {
        [
            self.os.as_str(),
            self.arch.as_str(),
            self.locale.as_str(),
            self.terminal_size.as_str(),
            &self.utc_offset_minutes.to_string(),
            self.parallelism.as_str(),
        ]
        .join("|")
    }

    pub fn device_id(&self) -> String {
        let hash = crc32fast::hash(self.fingerprint().as_bytes());
        format!("device_{}", to_base36(hash))
    }
}

pub fn generate_device_id() -> String {
    FingerprintInputs::collect().device_id()
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FingerprintInputs {
        FingerprintInputs {
            os: "linux".into(),
            arch: "x86_64".into(),
            locale: "en_US.UTF-8".into(),
            terminal_size: "120x40".into(),
            utc_offset_minutes: 180,
            parallelism: "8".into(),
        }
    }

    #[test]
    fn fingerprint_joins_fields_with_pipes() {
        assert_eq!(sample().fingerprint(), "linux|x86_64|en_US.UTF-8|120x40|180|8");
    }

    #[test]
    fn device_id_is_stable_for_identical_inputs() {
        let id = sample().device_id();
        assert!(id.starts_with("device_"));
        assert_eq!(id, sample().device_id());
    }

    #[test]
    fn device_id_changes_with_environment() {
        let mut other = sample();
        other.terminal_size = "80x24".into();
        assert_ne!(sample().device_id(), other.device_id());
    }

    #[test]
    fn base36_digits() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u32::MAX), "1z141z3");
    }
}
