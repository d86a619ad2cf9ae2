// Damped pendulum equation of motion and 4th order Runge-Kutta integration
use serde::{Serialize, Deserialize};
use tracing::{debug, trace, warn};

use crate::prelude::*;

/// Factor the injected perturbation is multiplied by after every integration step
pub const DECELERATION_RATE: Float = 0.5;
/// Samples reserved up front by `propagate_while`, larger budgets grow as needed
const MAX_RESERVED_POINTS: usize = 4096;

/// Angular position (radians) and angular velocity (radians / time unit) of the pendulum
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
	pub angle: Float,
	pub velocity: Float
}

impl State {
	pub fn new(angle: Float, velocity: Float) -> Self {
		Self {
			angle,
			velocity
		}
	}
	/// Mechanical energy per unit mass and length squared: KE - (g/L)cos(angle)
	pub fn energy(&self, params: &Params) -> Float {
		0.5 * self.velocity.powi(2) - (params.gravity / params.length) * self.angle.cos()
	}
	pub fn phase_point(&self) -> (Float, Float) {
		(self.angle, self.velocity)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
	pub gravity: Float,
	pub length: Float,// Must be > 0
	pub damping: Float
}

impl Params {
	pub fn validate(&self) -> Result<()> {
		if !self.gravity.is_finite() {
			return Err(PendulumError::InvalidParameter{name: "gravity", value: self.gravity});
		}
		if !(self.length.is_finite() && self.length > 0.0) {
			return Err(PendulumError::InvalidParameter{name: "length", value: self.length});
		}
		if !self.damping.is_finite() {
			return Err(PendulumError::InvalidParameter{name: "damping", value: self.damping});
		}
		Ok(())
	}
}

impl Default for Params {
	fn default() -> Self {
		Self {
			gravity: 9.8,
			length: 2.0,
			damping: 0.1
		}
	}
}

/// Angular acceleration as a function of state
pub trait Derivative {
	fn acceleration(&self, state: &State) -> Float;
}

impl<F> Derivative for F
where F: Fn(&State) -> Float {
	fn acceleration(&self, state: &State) -> Float {
		self(state)
	}
}

/// angle'' = -b * angle' - (g / L) * sin(angle)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendulumDerivative {
	params: Params
}

impl PendulumDerivative {
	/// Skips validation, a length of 0 will produce infinite accelerations
	pub fn unchecked(params: Params) -> Self {
		Self {
			params
		}
	}
	pub fn params(&self) -> &Params {
		&self.params
	}
}

impl Derivative for PendulumDerivative {
	fn acceleration(&self, state: &State) -> Float {
		let Params{gravity, length, damping} = self.params;
		-damping * state.velocity - (gravity / length) * state.angle.sin()
	}
}

pub fn configure_derivative(params: Params) -> Result<PendulumDerivative> {
	params.validate()?;
	debug!(gravity = params.gravity, length = params.length, damping = params.damping, "configured pendulum derivative");
	Ok(PendulumDerivative::unchecked(params))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegrationResult {
	pub angle: Float,
	pub velocity: Float,
	pub acceleration: Float// Velocity increment of the step, not fed back into the state
}

impl IntegrationResult {
	pub fn state(&self) -> State {
		State::new(self.angle, self.velocity)
	}
}

/// One RK4 step of the system (angle' = velocity, velocity' = derivative), no perturbation
pub fn rk4<D: Derivative + ?Sized>(state: &State, derivative: &D, delta: Float) -> IntegrationResult {
	// Evaluates (angle', velocity') at `state` offset by `offset`
	let k = |offset: V2| -> V2 {
		let angle = state.angle + offset.x;
		let velocity = state.velocity + offset.y;
		V2::new(velocity, derivative.acceleration(&State{angle, velocity}))
	};
	let k1 = k(V2::zeros()) * delta;
	let k2 = k(k1 / 2.0) * delta;
	let k3 = k(k2 / 2.0) * delta;
	let k4 = k(k3) * delta;
	let increment = (k1 + k2 * 2.0 + k3 * 2.0 + k4) / 6.0;
	// Done
	IntegrationResult {
		angle: state.angle + increment.x,
		velocity: state.velocity + increment.y,
		acceleration: increment.y
	}
}

/// Ordered (angle, velocity) samples for a phase portrait
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory(
	pub Vec<(Float, Float)>
);

impl Trajectory {
	pub fn len(&self) -> usize {
		self.0.len()
	}
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
	pub fn first(&self) -> Option<(Float, Float)> {
		self.0.first().copied()
	}
	pub fn last(&self) -> Option<(Float, Float)> {
		self.0.last().copied()
	}
	pub fn points(&self) -> &[(Float, Float)] {
		&self.0
	}
}

/// RK4 stepper carrying its own decaying impulse, so independent pendulums never share one
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Integrator {
	perturbation: Float
}

impl Integrator {
	pub fn new() -> Self {
		Self::default()
	}
	/// Remaining impulse that the next step will add to velocity
	pub fn perturbation(&self) -> Float {
		self.perturbation
	}
	pub fn apply_impulse(&mut self, magnitude: Float) {
		self.perturbation += magnitude;
		trace!(magnitude, total = self.perturbation, "impulse applied");
	}
	pub fn clear_impulse(&mut self) {
		self.perturbation = 0.0;
	}
	pub fn integrate<D: Derivative + ?Sized>(&mut self, state: &State, derivative: &D, delta: Float) -> IntegrationResult {
		let mut result = rk4(state, derivative, delta);
		// Impulse is added after the RK4 stages, then decays
		result.velocity += self.perturbation;
		self.perturbation *= DECELERATION_RATE;
		if state.angle.is_finite() && state.velocity.is_finite() && !(result.angle.is_finite() && result.velocity.is_finite()) {
			warn!(angle = result.angle, velocity = result.velocity, delta, "integration produced a non-finite state");
		}
		result
	}
	/// Samples up to `steps` states, the initial one first
	pub fn propagate<D: Derivative + ?Sized>(&mut self, initial: State, derivative: &D, delta: Float, steps: usize) -> Trajectory {
		self.propagate_while(initial, derivative, delta, steps, |_| true)
	}
	/// Like `propagate`, but stops (without recording) at the first state for which `condition` returns false
	pub fn propagate_while<D, C>(&mut self, initial: State, derivative: &D, delta: Float, steps: usize, mut condition: C) -> Trajectory
	where
		D: Derivative + ?Sized,
		C: FnMut(&State) -> bool
	{
		let mut points = Vec::<(Float, Float)>::with_capacity(steps.min(MAX_RESERVED_POINTS));
		let mut state = initial;
		for step in 0..steps {
			if !condition(&state) {
				trace!(step, angle = state.angle, velocity = state.velocity, "propagation stopped by condition");
				break;
			}
			points.push(state.phase_point());
			state = self.integrate(&state, derivative, delta).state();
		}
		// Done
		Trajectory(points)
	}
}

/// Propagates on a fresh integrator, unaffected by any live impulse
pub fn propagate<D: Derivative + ?Sized>(initial: State, derivative: &D, delta: Float, steps: usize) -> Trajectory {
	Integrator::new().propagate(initial, derivative, delta, steps)
}

pub fn propagate_while<D, C>(initial: State, derivative: &D, delta: Float, steps: usize, condition: C) -> Trajectory
where
	D: Derivative + ?Sized,
	C: FnMut(&State) -> bool
{
	Integrator::new().propagate_while(initial, derivative, delta, steps, condition)
}
