// Command line front end: phase portrait images, trajectory dumps and the interactive viewer
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pendulum::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Damped pendulum simulator
#[derive(Parser)]
#[command(name = "pendulum")]
#[command(version, about, long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// JSON settings file, defaults are used for anything missing
	#[arg(short, long, global = true)]
	config: Option<PathBuf>
}

#[derive(Subcommand)]
enum Commands {
	/// Render a phase portrait (angle vs velocity) to an image
	Portrait {
		/// Output image file
		#[arg(short, long, default_value = "phase_portrait.png")]
		output: PathBuf,

		/// Number of integration steps, overrides the settings file
		#[arg(short, long)]
		steps: Option<usize>
	},
	/// Print `step angle velocity energy` rows
	Trace {
		/// Number of integration steps
		#[arg(short, long, default_value = "100")]
		steps: usize
	},
	/// Interactive 3D viewer, drag with the left mouse button to push the pendulum
	#[cfg(feature = "gui")]
	Gui
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<PendulumSettings> {
	Ok(match path {
		Some(path) => PendulumSettings::load(path)?,
		None => PendulumSettings::default()
	})
}

fn create_image(settings: &PendulumSettings, output: &Path, steps: usize) -> anyhow::Result<()> {
	let simulation = Simulation::new(settings.clone())?;
	let trajectory = simulation.preview(steps);
	let image = render_phase_portrait(&trajectory, &settings.portrait);
	image.save(output).map_err(PendulumError::from)?;
	info!(points = trajectory.len(), output = %output.display(), "saved phase portrait");
	Ok(())
}

fn trace(settings: &PendulumSettings, steps: usize) -> anyhow::Result<()> {
	let mut simulation = Simulation::new(settings.clone())?;
	for i in 0..steps {
		let state = simulation.state();
		println!("{} {} {} {}", i, state.angle, state.velocity, simulation.energy());
		simulation.step();
	}
	Ok(())
}

fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(std::io::stderr)
		.init();
	let cli = Cli::parse();
	let settings = load_settings(cli.config.as_deref())?;
	match cli.command {
		Commands::Portrait{output, steps} => create_image(&settings, &output, steps.unwrap_or(settings.preview_steps))?,
		Commands::Trace{steps} => trace(&settings, steps)?,
		#[cfg(feature = "gui")]
		Commands::Gui => pendulum::gui::main(Simulation::new(settings)?)
	}
	Ok(())
}
