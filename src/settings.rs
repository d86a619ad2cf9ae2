// Settings loaded from JSON, every field is optional and falls back to its default
use std::{fs, path::Path};
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::prelude::*;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendulumSettings {
	pub params: Params,
	pub initial_state: State,
	pub delta: Float,// Integration time step
	pub preview_steps: usize,// Length of the phase portrait preview
	pub impulse_scale: Float,// Impulse per unit of drag length
	pub portrait: PortraitSettings
}

impl Default for PendulumSettings {
	fn default() -> Self {
		Self {
			params: Params::default(),
			initial_state: State::new(0.5, 0.0),
			delta: 0.01,
			preview_steps: 2000,
			impulse_scale: 0.01,
			portrait: PortraitSettings::default()
		}
	}
}

impl PendulumSettings {
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path)?;
		let settings: Self = serde_json::from_str(&raw)?;
		settings.validate()?;
		debug!(path = %path.display(), "loaded settings");
		Ok(settings)
	}
	pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
		fs::write(path, serde_json::to_string_pretty(self)?)?;
		Ok(())
	}
	pub fn validate(&self) -> Result<()> {
		self.params.validate()?;
		if !(self.delta.is_finite() && self.delta > 0.0) {
			return Err(PendulumError::InvalidParameter{name: "delta", value: self.delta});
		}
		if !self.impulse_scale.is_finite() {
			return Err(PendulumError::InvalidParameter{name: "impulse_scale", value: self.impulse_scale});
		}
		self.portrait.validate()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn partial_json() {
		let settings: PendulumSettings = serde_json::from_str(r#"{"params": {"damping": 0.0}, "delta": 0.005}"#).unwrap();
		assert_eq!(settings.params, Params{damping: 0.0, ..Params::default()});
		assert_eq!(settings.delta, 0.005);
		assert_eq!(settings.initial_state, PendulumSettings::default().initial_state);
		assert!(settings.validate().is_ok());
	}
	#[test]
	fn save_and_load() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("settings.json");
		let mut settings = PendulumSettings::default();
		settings.params.length = 3.5;
		settings.preview_steps = 42;
		settings.save(&path).unwrap();
		assert_eq!(PendulumSettings::load(&path).unwrap(), settings);
	}
	#[test]
	fn load_rejects_invalid() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("settings.json");
		fs::write(&path, r#"{"params": {"length": 0.0}}"#).unwrap();
		assert!(matches!(PendulumSettings::load(&path), Err(PendulumError::InvalidParameter{name: "length", ..})));
		fs::write(&path, r#"{"delta": -0.01}"#).unwrap();
		assert!(matches!(PendulumSettings::load(&path), Err(PendulumError::InvalidParameter{name: "delta", ..})));
		fs::write(&path, r#"{"portrait": {"width": 64, "height": 64, "margin": 3000000000}}"#).unwrap();
		assert!(matches!(PendulumSettings::load(&path), Err(PendulumError::InvalidParameter{name: "portrait margin", ..})));
		fs::write(&path, r#"{"portrait": {"width": 4000000000, "height": 4000000000}}"#).unwrap();
		assert!(matches!(PendulumSettings::load(&path), Err(PendulumError::InvalidParameter{name: "portrait width", ..})));
		fs::write(&path, r#"{"portrait": {"height": 0}}"#).unwrap();
		assert!(matches!(PendulumSettings::load(&path), Err(PendulumError::InvalidParameter{name: "portrait height", ..})));
		fs::write(&path, "not json").unwrap();
		assert!(matches!(PendulumSettings::load(&path), Err(PendulumError::Json(_))));
		assert!(matches!(PendulumSettings::load(dir.path().join("missing.json")), Err(PendulumError::Io(_))));
	}
}
