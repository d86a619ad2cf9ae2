// Uses bevy for GUI
use bevy::{prelude::*, window::PrimaryWindow};
use crate::prelude::*;

struct MainPlugin;

const ARM_OFFSETS_DEG: [f32; 3] = [0.0, 120.0, 240.0];

// Resources
#[derive(Resource)]
pub struct SimulationResource(pub Simulation);

#[derive(Resource, Default)]
struct DragStart(Option<Vec2>);

// Components
#[derive(Component)]
pub struct CameraComponent;

/// Rotates about the pivot with the pendulum angle, parent of the arm and bob
#[derive(Component)]
pub struct PendulumComponent;

/// Local transforms of the arms relative to the rotating pendulum parent
fn arm_offsets() -> [Transform; 3] {
	ARM_OFFSETS_DEG.map(|offset| Transform::from_rotation(Quat::from_rotation_z(offset.to_radians())))
}

// Systems
fn render_setup(
	mut commands: Commands,
	mut meshes: ResMut<Assets<Mesh>>,
	mut materials: ResMut<Assets<StandardMaterial>>,
	simulation: Res<SimulationResource>
) {
	let length = simulation.0.params().length as f32;
	commands.spawn((
		Camera3dBundle {
			transform: Transform::from_xyz(0.0, -length / 2.0, length * 4.0).looking_at(Vec3::new(0.0, -length / 2.0, 0.0), Vec3::Y),
			..default()
		},
		CameraComponent
	));
	commands.spawn(PointLightBundle {
		transform: Transform::from_xyz(4.0, 8.0, 6.0),
		..default()
	});
	// Pivot
	commands.spawn(PbrBundle {
		mesh: meshes.add(shape::UVSphere{radius: 0.1, sectors: 16, stacks: 16}.into()),
		material: materials.add(Color::rgb(0.1, 0.1, 0.1).into()),
		..default()
	});
	let arm_mesh = meshes.add(shape::Box::new(0.04, length, 0.04).into());
	let arm_material = materials.add(Color::rgb(0.2, 0.2, 0.2).into());
	let bob_mesh = meshes.add(shape::UVSphere{radius: 0.3, sectors: 32, stacks: 32}.into());
	let bob_material = materials.add(Color::rgb(0.0, 0.48, 0.53).into());
	commands.spawn((SpatialBundle::default(), PendulumComponent)).with_children(|parent| {
		// Three arms 120 degrees apart, all driven by the same angle
		for transform in arm_offsets() {
			parent.spawn(SpatialBundle {
				transform,
				..default()
			}).with_children(|arm| {
				arm.spawn(PbrBundle {
					mesh: arm_mesh.clone(),
					material: arm_material.clone(),
					transform: Transform::from_xyz(0.0, -length / 2.0, 0.0),
					..default()
				});
				// Bob
				arm.spawn(PbrBundle {
					mesh: bob_mesh.clone(),
					material: bob_material.clone(),
					transform: Transform::from_xyz(0.0, -length, 0.0),
					..default()
				});
			});
		}
	});
}

fn step_simulation(
	time: Res<Time>,
	mut simulation: ResMut<SimulationResource>,
	mut pendulums: Query<&mut Transform, With<PendulumComponent>>
) {
	simulation.0.advance(time.delta_seconds() as Float);
	let angle = simulation.0.state().angle as f32;
	for mut transform in &mut pendulums {
		transform.rotation = Quat::from_rotation_z(angle);
	}
}

fn drag_impulse(
	buttons: Res<Input<MouseButton>>,
	windows: Query<&Window, With<PrimaryWindow>>,
	mut drag_start: ResMut<DragStart>,
	mut simulation: ResMut<SimulationResource>
) {
	let cursor = windows.get_single().ok().and_then(|window| window.cursor_position());
	if buttons.just_pressed(MouseButton::Left) {
		drag_start.0 = cursor;
	}
	if buttons.just_released(MouseButton::Left) {
		if let (Some(start), Some(end)) = (drag_start.0.take(), cursor) {
			simulation.0.drag(
				V2::new(start.x as Float, start.y as Float),
				V2::new(end.x as Float, end.y as Float)
			);
		}
	}
}

impl Plugin for MainPlugin {
	fn build(&self, app: &mut App) {
		app.init_resource::<DragStart>();
		app.add_systems(Startup, render_setup);
		app.add_systems(Update, (drag_impulse, step_simulation).chain());
	}
}

pub fn main(simulation: Simulation) {
	let mut app = App::new();
	app.add_plugins((
		DefaultPlugins.set(WindowPlugin {
			primary_window: Some(Window {
				title: APP_NAME.to_string(),
				..Default::default()
			}),
			..Default::default()
		}),
		MainPlugin
	));
	app.insert_resource(SimulationResource(simulation));
	tracing::info!("Starting bevy app");
	app.run();
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn arms_evenly_spaced() {
		let parent = Quat::from_rotation_z(0.3);
		let tips: Vec<Vec3> = arm_offsets().iter().map(|offset| parent * offset.rotation * Vec3::NEG_Y).collect();
		assert_eq!(tips.len(), 3);
		// First arm follows the pendulum angle exactly
		assert!((tips[0] - parent * Vec3::NEG_Y).length() < 1e-5);
		for i in 0..3 {
			let angle = tips[i].angle_between(tips[(i + 1) % 3]);
			assert!((angle - 120f32.to_radians()).abs() < 1e-4);
		}
	}
}
