use crate::constants::SAMPLER_MAX_ATTEMPTS;
use crate::geometry::{Point, Size};
use crate::rng::SeededRng;

/// Draw a new top-left position for a `target`-sized control inside `arena`.
///
/// Candidates are uniform over `[0, arena - target]` on each axis. Draws are
/// repeated while the candidate lies closer than `min_distance` to `current`,
/// up to `SAMPLER_MAX_ATTEMPTS` draws; the last candidate is returned either
/// way. An axis where the target does not fit collapses to 0.
pub fn sample_position(
    rng: &mut SeededRng,
    current: Point,
    min_distance: f64,
    arena: Size,
    target: Size,
) -> Point {
    let span_x = (arena.width - target.width).max(0.0);
    let span_y = (arena.height - target.height).max(0.0);
    let min_distance_sq = if min_distance > 0.0 {
        min_distance * min_distance
    } else {
        0.0
    };

    let mut candidate = draw(rng, span_x, span_y);
    let mut attempts = 1;
    while candidate.distance_sq(current) < min_distance_sq && attempts < SAMPLER_MAX_ATTEMPTS {
        candidate = draw(rng, span_x, span_y);
        attempts += 1;
    }
    candidate
}

fn draw(rng: &mut SeededRng, span_x: f64, span_y: f64) -> Point {
    let x = rng.next_unit() * span_x;
    let y = rng.next_unit() * span_y;
    Point::new(x, y)
}
