// Live pendulum session, advanced once per animation frame
use tracing::{debug, trace};

use crate::prelude::*;

/// Upper bound on sub-steps run by a single `advance`, the rest of the backlog is dropped
pub const MAX_STEPS_PER_ADVANCE: usize = 1000;

#[derive(Clone, Debug)]
pub struct Simulation {
	settings: PendulumSettings,
	derivative: PendulumDerivative,
	state: State,
	integrator: Integrator,
	accumulator: Float,// Frame time not yet consumed by whole steps
	time: Float,
	last: Option<IntegrationResult>
}

impl Simulation {
	pub fn new(settings: PendulumSettings) -> Result<Self> {
		settings.validate()?;
		let derivative = configure_derivative(settings.params)?;
		Ok(Self {
			state: settings.initial_state,
			settings,
			derivative,
			integrator: Integrator::new(),
			accumulator: 0.0,
			time: 0.0,
			last: None
		})
	}
	pub fn state(&self) -> State {
		self.state
	}
	pub fn params(&self) -> &Params {
		self.derivative.params()
	}
	pub fn settings(&self) -> &PendulumSettings {
		&self.settings
	}
	pub fn time(&self) -> Float {
		self.time
	}
	/// Result of the most recent step, None before the first one
	pub fn last_result(&self) -> Option<IntegrationResult> {
		self.last
	}
	pub fn perturbation(&self) -> Float {
		self.integrator.perturbation()
	}
	pub fn energy(&self) -> Float {
		self.state.energy(self.params())
	}
	pub fn step(&mut self) -> IntegrationResult {
		let result = self.integrator.integrate(&self.state, &self.derivative, self.settings.delta);
		self.state = result.state();
		self.time += self.settings.delta;
		self.last = Some(result);
		result
	}
	/// Runs as many whole steps as fit into the elapsed time plus the carried remainder, returns the step count
	pub fn advance(&mut self, elapsed: Float) -> usize {
		if !(elapsed.is_finite() && elapsed > 0.0) {
			return 0;
		}
		self.accumulator += elapsed;
		let mut steps: usize = 0;
		while self.accumulator >= self.settings.delta {
			if steps == MAX_STEPS_PER_ADVANCE {
				debug!(dropped = self.accumulator, "simulation fell behind, dropping backlog");
				self.accumulator = 0.0;
				break;
			}
			self.step();
			self.accumulator -= self.settings.delta;
			steps += 1;
		}
		steps
	}
	pub fn apply_impulse(&mut self, magnitude: Float) {
		self.integrator.apply_impulse(magnitude);
	}
	/// Converts a pointer drag into an impulse, signed by its horizontal direction
	pub fn drag(&mut self, from: V2, to: V2) -> Float {
		let direction: Float = if to.x > from.x {1.0} else {-1.0};
		let impulse = direction * (to - from).magnitude() * self.settings.impulse_scale;
		trace!(impulse, "drag converted to impulse");
		self.apply_impulse(impulse);
		impulse
	}
	/// Swaps the physical constants, the current state is kept
	pub fn set_params(&mut self, params: Params) -> Result<()> {
		self.derivative = configure_derivative(params)?;
		self.settings.params = params;
		Ok(())
	}
	pub fn set_state(&mut self, state: State) {
		self.state = state;
	}
	/// Back to the initial state, with no pending impulse
	pub fn reset(&mut self) {
		self.state = self.settings.initial_state;
		self.integrator.clear_impulse();
		self.accumulator = 0.0;
		self.time = 0.0;
		self.last = None;
	}
	/// Phase portrait from the current state on a fresh integrator, so the live impulse does not leak in
	pub fn preview(&self, steps: usize) -> Trajectory {
		propagate(self.state, &self.derivative, self.settings.delta, steps)
	}
}
