/* Damped pendulum simulator: RK4 integration of the pendulum ODE, live sessions with
user-injected impulses, and phase portrait rendering.
*/

pub mod error;
pub mod pendulum;
pub mod simulation;
pub mod portrait;
pub mod settings;
#[cfg(feature = "gui")]
pub mod gui;

pub mod prelude {
	pub const APP_NAME: &str = "Damped pendulum";
	pub const EPSILON: Float = 1e-9;
	pub type Float = f64;
	pub type V2 = nalgebra::Vector2<Float>;
	pub type ImgV2 = nalgebra::Vector2<u32>;
	pub type IntV2 = nalgebra::Vector2<i64>;
	pub use crate::{
		error::{PendulumError, Result},
		pendulum::{
			State,
			Params,
			Derivative,
			PendulumDerivative,
			IntegrationResult,
			Integrator,
			Trajectory,
			configure_derivative,
			rk4,
			propagate,
			propagate_while,
			DECELERATION_RATE
		},
		simulation::Simulation,
		portrait::{Bounds, ImagePosTranslater, PortraitSettings, render_trajectory, render_phase_portrait},
		settings::PendulumSettings
	};
}
