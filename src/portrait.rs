// Phase portrait rendering (angle on X, velocity on Y)
use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Serialize, Deserialize};

use crate::prelude::*;

/// Largest accepted image side, in pixels
pub const MAX_IMAGE_SIDE: u32 = 16384;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortraitSettings {
	pub width: u32,
	pub height: u32,
	pub margin: u32,// Pixels kept free around the fitted trajectory
	pub background: [u8; 3],
	pub line_color: [u8; 3],
	pub axis_color: [u8; 3],
	pub draw_axes: bool
}

impl PortraitSettings {
	pub fn validate(&self) -> Result<()> {
		for (name, side) in [("portrait width", self.width), ("portrait height", self.height)] {
			if side == 0 || side > MAX_IMAGE_SIDE {
				return Err(PendulumError::InvalidParameter{name, value: side as Float});
			}
		}
		// Margins must leave some drawable area
		if self.margin.saturating_mul(2) >= self.width.min(self.height) {
			return Err(PendulumError::InvalidParameter{name: "portrait margin", value: self.margin as Float});
		}
		Ok(())
	}
}

impl Default for PortraitSettings {
	fn default() -> Self {
		Self {
			width: 500,
			height: 500,
			margin: 20,
			background: [0; 3],
			line_color: [255; 3],
			axis_color: [0, 122, 136],
			draw_axes: true
		}
	}
}

/// Axis aligned bounding box in phase space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min: V2,
	pub max: V2
}

impl Bounds {
	/// Bounds of all finite points, None if there are none
	pub fn of(trajectory: &Trajectory) -> Option<Self> {
		let mut finite = trajectory.points().iter()
			.map(|(x, y)| V2::new(*x, *y))
			.filter(|p| p.x.is_finite() && p.y.is_finite());
		let first = finite.next()?;
		let mut out = Self {
			min: first,
			max: first
		};
		for p in finite {
			out.min = out.min.inf(&p);
			out.max = out.max.sup(&p);
		}
		Some(out)
	}
	pub fn size(&self) -> V2 {
		self.max - self.min
	}
	pub fn center(&self) -> V2 {
		(self.min + self.max) / 2.0
	}
}

impl Default for Bounds {
	fn default() -> Self {
		Self {
			min: V2::new(-1.0, -1.0),
			max: V2::new(1.0, 1.0)
		}
	}
}

/// Maps phase space to pixels, `origin` lands on the image center and Y points up
#[derive(Clone, Debug, PartialEq)]
pub struct ImagePosTranslater {
	pub scale: V2,// Pixels per world unit, per axis
	pub origin: V2,
	pub image_size: ImgV2
}

impl ImagePosTranslater {
	pub fn fit(bounds: &Bounds, image_size: ImgV2, margin: u32) -> Self {
		let usable = V2::new(
			(image_size.x.saturating_sub(margin.saturating_mul(2))).max(1) as Float,
			(image_size.y.saturating_sub(margin.saturating_mul(2))).max(1) as Float
		);
		let size = bounds.size();
		// A flat axis (e.g. a pendulum at rest) still gets one world unit of span
		let span = V2::new(
			if size.x > EPSILON {size.x} else {1.0},
			if size.y > EPSILON {size.y} else {1.0}
		);
		Self {
			scale: usable.component_div(&span),
			origin: bounds.center(),
			image_size
		}
	}
	/// Pixel position which may lie outside the image
	pub fn world_to_px_unbounded(&self, pos: V2) -> IntV2 {
		let half = V2::new(self.image_size.x as Float, self.image_size.y as Float) / 2.0;
		let rel = (pos - self.origin).component_mul(&self.scale);
		IntV2::new(
			(half.x + rel.x).floor() as i64,
			(half.y - rel.y).floor() as i64
		)
	}
	pub fn world_to_px(&self, pos: V2) -> Option<ImgV2> {
		self.px_in_image(self.world_to_px_unbounded(pos))
	}
	pub fn px_to_world(&self, px: ImgV2) -> V2 {
		let half = V2::new(self.image_size.x as Float, self.image_size.y as Float) / 2.0;
		V2::new(
			(px.x as Float - half.x) / self.scale.x,
			(half.y - px.y as Float) / self.scale.y
		) + self.origin
	}
	fn px_in_image(&self, px: IntV2) -> Option<ImgV2> {
		if px.x >= 0 && px.y >= 0 && px.x < self.image_size.x as i64 && px.y < self.image_size.y as i64 {
			Some(ImgV2::new(px.x as u32, px.y as u32))
		}
		else {
			None
		}
	}
	fn draw_line(&self, image: &mut RgbImage, a: IntV2, b: IntV2, color: Rgb<u8>) {
		// Bresenham, pixels outside the image are skipped
		let (dx, dy) = ((b.x - a.x).abs(), -(b.y - a.y).abs());
		let limit = 4 * (self.image_size.x as i64 + self.image_size.y as i64);
		if dx > limit || -dy > limit {
			return;
		}
		let (sx, sy) = ((b.x - a.x).signum(), (b.y - a.y).signum());
		let mut err = dx + dy;
		let mut p = a;
		loop {
			if let Some(px) = self.px_in_image(p) {
				image.put_pixel(px.x, px.y, color);
			}
			if p == b {
				break;
			}
			let e2 = 2 * err;
			if e2 >= dy {
				err += dy;
				p.x += sx;
			}
			if e2 <= dx {
				err += dx;
				p.y += sy;
			}
		}
	}
}

/// Draws `trajectory` as a polyline, non-finite samples break the line
pub fn render_trajectory(trajectory: &Trajectory, image: &mut RgbImage, translater: &ImagePosTranslater, color: Rgb<u8>) {
	let mut prev: Option<IntV2> = None;
	for (x, y) in trajectory.points() {
		if !(x.is_finite() && y.is_finite()) {
			prev = None;
			continue;
		}
		let px = translater.world_to_px_unbounded(V2::new(*x, *y));
		translater.draw_line(image, prev.unwrap_or(px), px, color);
		prev = Some(px);
	}
}

/// Lines through angle = 0 and velocity = 0
pub fn render_axes(image: &mut RgbImage, translater: &ImagePosTranslater, color: Rgb<u8>) {
	let zero = translater.world_to_px_unbounded(V2::zeros());
	if zero.y >= 0 && zero.y < image.height() as i64 {
		for px_x in 0..image.width() {
			image.put_pixel(px_x, zero.y as u32, color);
		}
	}
	if zero.x >= 0 && zero.x < image.width() as i64 {
		for px_y in 0..image.height() {
			image.put_pixel(zero.x as u32, px_y, color);
		}
	}
}

/// Fits the view to the trajectory and renders it onto a fresh image
pub fn render_phase_portrait(trajectory: &Trajectory, settings: &PortraitSettings) -> RgbImage {
	let mut image: RgbImage = ImageBuffer::from_pixel(settings.width, settings.height, Rgb(settings.background));
	let bounds = Bounds::of(trajectory).unwrap_or_default();
	let translater = ImagePosTranslater::fit(&bounds, ImgV2::new(settings.width, settings.height), settings.margin);
	if settings.draw_axes {
		render_axes(&mut image, &translater, Rgb(settings.axis_color));
	}
	render_trajectory(trajectory, &mut image, &translater, Rgb(settings.line_color));
	// Done
	image
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_relative_eq;

	fn translater() -> ImagePosTranslater {
		ImagePosTranslater {
			scale: V2::new(10.0, 20.0),
			origin: V2::new(1.0, 0.0),
			image_size: ImgV2::new(100, 100)
		}
	}
	#[test]
	fn world_to_px() {
		let t = translater();
		assert_eq!(t.world_to_px(V2::new(1.0, 0.0)), Some(ImgV2::new(50, 50)));
		// Y points up
		assert_eq!(t.world_to_px(V2::new(2.0, 1.0)), Some(ImgV2::new(60, 30)));
		assert_eq!(t.world_to_px(V2::new(100.0, 0.0)), None);
		assert_eq!(t.world_to_px(V2::new(1.0, -10.0)), None);
		let world = t.px_to_world(ImgV2::new(60, 30));
		assert_relative_eq!(world.x, 2.0);
		assert_relative_eq!(world.y, 1.0);
	}
	#[test]
	fn bounds() {
		let trajectory = Trajectory(vec![(0.0, 1.0), (-2.0, 0.5), (Float::NAN, 100.0), (1.0, -3.0)]);
		let bounds = Bounds::of(&trajectory).unwrap();
		assert_eq!(bounds.min, V2::new(-2.0, -3.0));
		assert_eq!(bounds.max, V2::new(1.0, 1.0));
		assert_eq!(Bounds::of(&Trajectory::default()), None);
	}
	#[test]
	fn fit_contains_trajectory() {
		let d = configure_derivative(Params::default()).unwrap();
		let trajectory = propagate(State::new(1.0, 0.0), &d, 0.01, 1000);
		let bounds = Bounds::of(&trajectory).unwrap();
		let t = ImagePosTranslater::fit(&bounds, ImgV2::new(300, 200), 10);
		for (x, y) in trajectory.points() {
			let px = t.world_to_px(V2::new(*x, *y)).expect("fitted point outside image");
			assert!(px.x >= 9 && px.x <= 291);
			assert!(px.y >= 9 && px.y <= 191);
		}
	}
	#[test]
	fn fit_oversized_margin() {
		let t = ImagePosTranslater::fit(&Bounds::default(), ImgV2::new(64, 64), 3_000_000_000);
		assert!(t.scale.x.is_finite() && t.scale.x > 0.0);
		assert!(t.scale.y.is_finite() && t.scale.y > 0.0);
		let settings = PortraitSettings {
			width: 64,
			height: 64,
			margin: 3_000_000_000,
			..Default::default()
		};
		let image = render_phase_portrait(&Trajectory(vec![(0.0, 1.0), (1.0, 0.0)]), &settings);
		assert_eq!(image.dimensions(), (64, 64));
	}
	#[test]
	fn settings_validation() {
		assert!(PortraitSettings::default().validate().is_ok());
		let oversized = PortraitSettings{width: MAX_IMAGE_SIDE + 1, ..Default::default()};
		assert!(matches!(oversized.validate(), Err(PendulumError::InvalidParameter{name: "portrait width", ..})));
		let no_area = PortraitSettings{width: 64, height: 40, margin: 20, ..Default::default()};
		assert!(matches!(no_area.validate(), Err(PendulumError::InvalidParameter{name: "portrait margin", ..})));
		let huge_margin = PortraitSettings{margin: u32::MAX, ..Default::default()};
		assert!(huge_margin.validate().is_err());
	}
	#[test]
	fn fit_flat_trajectory() {
		let trajectory = Trajectory(vec![(0.0, 0.0); 10]);
		let t = ImagePosTranslater::fit(&Bounds::of(&trajectory).unwrap(), ImgV2::new(100, 100), 0);
		assert!(t.scale.x.is_finite() && t.scale.y.is_finite());
		assert_eq!(t.world_to_px(V2::zeros()), Some(ImgV2::new(50, 50)));
	}
	#[test]
	fn render() {
		let settings = PortraitSettings {
			width: 64,
			height: 64,
			margin: 4,
			draw_axes: false,
			..Default::default()
		};
		let blank = render_phase_portrait(&Trajectory::default(), &settings);
		assert!(blank.pixels().all(|p| *p == Rgb(settings.background)));
		let d = configure_derivative(Params::default()).unwrap();
		let trajectory = propagate(State::new(0.5, 0.0), &d, 0.01, 500);
		let image = render_phase_portrait(&trajectory, &settings);
		let lit = image.pixels().filter(|p| **p == Rgb(settings.line_color)).count();
		assert!(lit > 50, "only {} pixels drawn", lit);
	}
	#[test]
	fn line_is_connected() {
		let t = translater();
		let mut image: RgbImage = ImageBuffer::from_pixel(100, 100, Rgb([0; 3]));
		// Two far apart samples, connected by a horizontal line
		let trajectory = Trajectory(vec![(-2.0, 0.0), (4.0, 0.0)]);
		render_trajectory(&trajectory, &mut image, &t, Rgb([255; 3]));
		for px_x in 20..=80 {
			assert_eq!(*image.get_pixel(px_x, 50), Rgb([255; 3]));
		}
	}
}
