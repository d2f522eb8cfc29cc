//! Alignment and distribution math over element bounding boxes.
//!
//! Functions here are pure: they take bounding boxes and return the offset
//! each element must move by, in the same order as the input.

use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Edge or center that elements are aligned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Top => "top",
            Alignment::Middle => "middle",
            Alignment::Bottom => "bottom",
        }
    }
}

/// Axis along which elements are distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Horizontal => "horizontal",
            Direction::Vertical => "vertical",
        }
    }
}

/// Union of all boxes, or `None` for an empty slice.
pub fn union_bounds(bounds: &[Rect]) -> Option<Rect> {
    let mut result: Option<Rect> = None;
    for rect in bounds {
        result = Some(match result {
            Some(r) => r.union(*rect),
            None => *rect,
        });
    }
    result
}

/// Offsets that line every box up with the matching edge or center of the
/// union box.
pub fn align_offsets(bounds: &[Rect], alignment: Alignment) -> Vec<Vec2> {
    let Some(union) = union_bounds(bounds) else {
        return Vec::new();
    };
    bounds
        .iter()
        .map(|b| match alignment {
            Alignment::Left => Vec2::new(union.x0 - b.x0, 0.0),
            Alignment::Center => Vec2::new(union.center().x - b.center().x, 0.0),
            Alignment::Right => Vec2::new(union.x1 - b.x1, 0.0),
            Alignment::Top => Vec2::new(0.0, union.y0 - b.y0),
            Alignment::Middle => Vec2::new(0.0, union.center().y - b.center().y),
            Alignment::Bottom => Vec2::new(0.0, union.y1 - b.y1),
        })
        .collect()
}

/// Offsets that space box centers evenly along `direction`.
///
/// Boxes are ordered by center; the first and last stay put and the ones in
/// between move. Fewer than three boxes yields all-zero offsets.
pub fn distribute_offsets(bounds: &[Rect], direction: Direction) -> Vec<Vec2> {
    let mut offsets = vec![Vec2::ZERO; bounds.len()];
    if bounds.len() < 3 {
        return offsets;
    }

    let axis_center = |rect: &Rect| match direction {
        Direction::Horizontal => rect.center().x,
        Direction::Vertical => rect.center().y,
    };
    let centers: Vec<f64> = bounds.iter().map(axis_center).collect();

    let mut order: Vec<usize> = (0..bounds.len()).collect();
    order.sort_by(|&a, &b| centers[a].total_cmp(&centers[b]));

    let first = centers[order[0]];
    let last = centers[order[order.len() - 1]];
    let step = (last - first) / (order.len() - 1) as f64;

    for (rank, &idx) in order.iter().enumerate().take(order.len() - 1).skip(1) {
        let delta = first + step * rank as f64 - centers[idx];
        offsets[idx] = match direction {
            Direction::Horizontal => Vec2::new(delta, 0.0),
            Direction::Vertical => Vec2::new(0.0, delta),
        };
    }
    offsets
}
