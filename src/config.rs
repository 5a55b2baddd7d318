use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for the reorg engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorgConfig {
	/// Extension that marks a file as a source unit (including the dot)
	pub source_extension: String,
	/// Compliance level assumed for projects that do not declare one
	pub default_compliance: ComplianceLevel,
	/// Whether Move updates references unless told otherwise
	pub update_references: bool,
	/// Name of the workspace descriptor inside a workspace directory
	pub descriptor_file: String,
	/// Where the undo history is kept, relative to the workspace directory
	pub history_file: PathBuf,
}

impl Default for ReorgConfig {
	fn default() -> Self {
		Self {
			source_extension: ".java".to_string(),
			default_compliance: ComplianceLevel::new(8, 0),
			update_references: true,
			descriptor_file: "reorg.json".to_string(),
			history_file: PathBuf::from(".reorg").join("history.json"),
		}
	}
}

impl ReorgConfig {
	/// Create a configuration for a different source extension
	pub fn with_source_extension(extension: &str) -> Self {
		Self {
			source_extension: extension.to_string(),
			..Default::default()
		}
	}

	/// Validate the configuration and return errors if invalid
	pub fn validate(&self) -> Result<(), String> {
		if !self.source_extension.starts_with('.') || self.source_extension.len() < 2 {
			return Err(format!(
				"source_extension must start with '.' and name an extension, got '{}'",
				self.source_extension
			));
		}

		if self.source_extension.contains('/') {
			return Err("source_extension must not contain '/'".to_string());
		}

		if self.descriptor_file.is_empty() {
			return Err("descriptor_file must not be empty".to_string());
		}

		if self.history_file.as_os_str().is_empty() {
			return Err("history_file must not be empty".to_string());
		}

		Ok(())
	}
}

/// Source compliance level of a project
///
/// Legacy `1.x` spellings are normalized: `1.3` and `1.4` stay as they are,
/// `1.5` through `1.8` map to `5` through `8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComplianceLevel {
	major: u32,
	minor: u32,
}

impl ComplianceLevel {
	pub const fn new(major: u32, minor: u32) -> Self {
		Self { major, minor }
	}

	/// Before 1.4 a single-type import could name a type of the default package
	pub fn allows_default_package_imports(&self) -> bool {
		*self < ComplianceLevel::new(1, 4)
	}
}

impl FromStr for ComplianceLevel {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		let mut parts = trimmed.splitn(2, '.');
		let major: u32 = parts
			.next()
			.and_then(|p| p.parse().ok())
			.ok_or_else(|| format!("invalid compliance level '{trimmed}'"))?;
		let minor: u32 = match parts.next() {
			Some(p) => p.parse().map_err(|_| format!("invalid compliance level '{trimmed}'"))?,
			None => 0,
		};

		if major == 0 {
			return Err(format!("invalid compliance level '{trimmed}'"));
		}

		if major == 1 && minor >= 5 {
			return Ok(Self::new(minor, 0));
		}

		if major == 1 && minor == 0 {
			return Err(format!("invalid compliance level '{trimmed}'"));
		}

		Ok(Self::new(major, minor))
	}
}

impl TryFrom<String> for ComplianceLevel {
	type Error = String;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<ComplianceLevel> for String {
	fn from(level: ComplianceLevel) -> Self {
		level.to_string()
	}
}

impl fmt::Display for ComplianceLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.major == 1 {
			write!(f, "1.{}", self.minor)
		} else {
			write!(f, "{}", self.major)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_config_is_valid() {
		let config = ReorgConfig::default();
		assert!(config.validate().is_ok());
		assert_eq!(config.source_extension, ".java");
		assert!(config.update_references);
	}

	#[test]
	fn test_invalid_extension_rejected() {
		let config = ReorgConfig::with_source_extension("java");
		assert!(config.validate().is_err());

		let config = ReorgConfig::with_source_extension(".");
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_compliance_parsing_and_ordering() {
		let legacy: ComplianceLevel = "1.3".parse().unwrap();
		let four: ComplianceLevel = "1.4".parse().unwrap();
		let eight: ComplianceLevel = "1.8".parse().unwrap();
		let modern: ComplianceLevel = "17".parse().unwrap();

		assert!(legacy < four);
		assert!(four < eight);
		assert!(eight < modern);
		assert_eq!(eight, ComplianceLevel::new(8, 0));
		assert_eq!(eight.to_string(), "8");
		assert_eq!(legacy.to_string(), "1.3");

		assert!(legacy.allows_default_package_imports());
		assert!(!four.allows_default_package_imports());
		assert!("x".parse::<ComplianceLevel>().is_err());
		assert!("1.0".parse::<ComplianceLevel>().is_err());
	}

	#[test]
	fn test_compliance_serde() {
		let level: ComplianceLevel = serde_json::from_str("\"1.3\"").unwrap();
		assert_eq!(level, ComplianceLevel::new(1, 3));
		assert_eq!(serde_json::to_string(&level).unwrap(), "\"1.3\"");
	}
}
