//! Color gradient: ordered color stops over [0, 1].
//!
//! Gradients take part in waypoint interpolation, so they carry the same
//! add/sub/scale algebra as the other continuous kinds. Binary operations
//! sample both operands over the union of their stop positions.

use crate::color::Color;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub pos: f64,
    pub color: Color,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn new(mut stops: Vec<GradientStop>) -> Self {
        stops.sort_by(|a, b| a.pos.total_cmp(&b.pos));
        Gradient { stops }
    }

    pub fn two(a: Color, b: Color) -> Self {
        Gradient {
            stops: vec![
                GradientStop { pos: 0.0, color: a },
                GradientStop { pos: 1.0, color: b },
            ],
        }
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Sample the gradient at `pos`, holding the boundary stops outside.
    pub fn color_at(&self, pos: f64) -> Color {
        match self.stops.len() {
            0 => Color::default(),
            1 => self.stops[0].color,
            _ => {
                if pos <= self.stops[0].pos {
                    return self.stops[0].color;
                }
                let last = self.stops.len() - 1;
                if pos >= self.stops[last].pos {
                    return self.stops[last].color;
                }
                let i = self
                    .stops
                    .windows(2)
                    .position(|w| pos >= w[0].pos && pos <= w[1].pos)
                    .unwrap_or(last - 1);
                let (lo, hi) = (&self.stops[i], &self.stops[i + 1]);
                let span = hi.pos - lo.pos;
                if span <= 0.0 {
                    return lo.color;
                }
                let t = (pos - lo.pos) / span;
                lo.color * (1.0 - t) + hi.color * t
            }
        }
    }

    /// Root-mean-square luma over the stops; the gradient's scalar magnitude.
    pub fn mag(&self) -> f64 {
        if self.stops.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.stops.iter().map(|s| s.color.luma().powi(2)).sum();
        (sum / self.stops.len() as f64).sqrt()
    }

    fn union_positions(&self, rhs: &Gradient) -> Vec<f64> {
        let mut pos: Vec<f64> = self
            .stops
            .iter()
            .chain(rhs.stops.iter())
            .map(|s| s.pos)
            .collect();
        pos.sort_by(f64::total_cmp);
        pos.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        pos
    }

    fn combine(&self, rhs: &Gradient, f: impl Fn(Color, Color) -> Color) -> Gradient {
        if self.stops.is_empty() {
            return rhs.clone();
        }
        if rhs.stops.is_empty() {
            return self.clone();
        }
        let stops = self
            .union_positions(rhs)
            .into_iter()
            .map(|pos| GradientStop {
                pos,
                color: f(self.color_at(pos), rhs.color_at(pos)),
            })
            .collect();
        Gradient { stops }
    }

    pub fn add(&self, rhs: &Gradient) -> Gradient {
        self.combine(rhs, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Gradient) -> Gradient {
        self.combine(rhs, |a, b| a - b)
    }

    pub fn scale(&self, k: f64) -> Gradient {
        Gradient {
            stops: self
                .stops
                .iter()
                .map(|s| GradientStop {
                    pos: s.pos,
                    color: s.color * k,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_holds_boundaries() {
        let g = Gradient::two(Color::rgb(0.0, 0.0, 0.0), Color::rgb(1.0, 1.0, 1.0));
        assert_eq!(g.color_at(-1.0), Color::rgb(0.0, 0.0, 0.0));
        assert_eq!(g.color_at(2.0), Color::rgb(1.0, 1.0, 1.0));
        let mid = g.color_at(0.5);
        assert!((mid.r - 0.5).abs() < 1e-12);
    }

    #[test]
    fn add_merges_stop_positions() {
        let a = Gradient::new(vec![
            GradientStop {
                pos: 0.0,
                color: Color::rgb(1.0, 0.0, 0.0),
            },
            GradientStop {
                pos: 1.0,
                color: Color::rgb(1.0, 0.0, 0.0),
            },
        ]);
        let b = Gradient::new(vec![GradientStop {
            pos: 0.5,
            color: Color::rgb(0.0, 1.0, 0.0),
        }]);
        let sum = a.add(&b);
        assert_eq!(sum.stops().len(), 3);
        assert!((sum.color_at(0.5).r - 1.0).abs() < 1e-12);
        assert!((sum.color_at(0.5).g - 1.0).abs() < 1e-12);
    }
}
