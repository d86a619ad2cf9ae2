// Error types
use thiserror::Error;

use crate::prelude::*;

#[derive(Debug, Error)]
pub enum PendulumError {
	#[error("invalid parameter `{name}`: {value}")]
	InvalidParameter {
		name: &'static str,
		value: Float
	},
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error("failed to parse settings: {0}")]
	Json(#[from] serde_json::Error),
	#[error("failed to write image: {0}")]
	Image(#[from] image::ImageError)
}

pub type Result<T> = std::result::Result<T, PendulumError>;
