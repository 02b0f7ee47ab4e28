use glam::{DMat3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

const MIN_DETERMINANT: f64 = 1e-12;

/// Linear-plus-offset map from iris space to screen pixels:
/// `x = ax*u + bx*v + cx`, `y = ay*u + by*v + cy`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineMapping {
    pub ax: f64,
    pub bx: f64,
    pub cx: f64,
    pub ay: f64,
    pub by: f64,
    pub cy: f64,
}

impl AffineMapping {
    pub fn map(&self, uv: DVec2) -> DVec2 {
        DVec2::new(
            self.ax * uv.x + self.bx * uv.y + self.cx,
            self.ay * uv.x + self.by * uv.y + self.cy,
        )
    }

    pub fn is_finite(&self) -> bool {
        [self.ax, self.bx, self.cx, self.ay, self.by, self.cy]
            .iter()
            .all(|c| c.is_finite())
    }

    /// Least-squares fit from `(uv, screen)` observations via normal
    /// equations on the `[u, v, 1]` basis, solved independently per channel.
    /// Returns `None` when the system is singular (collinear or repeated
    /// observations); the caller falls back rather than using a bad fit.
    pub fn solve(observations: &[(DVec2, DVec2)]) -> Option<Self> {
        if observations.len() < 3 {
            return None;
        }

        let mut m = DMat3::ZERO;
        let mut rx = DVec3::ZERO;
        let mut ry = DVec3::ZERO;

        for (uv, target) in observations {
            let b = DVec3::new(uv.x, uv.y, 1.0);
            m.x_axis += b * b.x;
            m.y_axis += b * b.y;
            m.z_axis += b * b.z;
            rx += b * target.x;
            ry += b * target.y;
        }

        if m.determinant().abs() < MIN_DETERMINANT {
            return None;
        }

        let inv = m.inverse();
        let x = inv * rx;
        let y = inv * ry;

        let mapping = Self {
            ax: x.x,
            bx: x.y,
            cx: x.z,
            ay: y.x,
            by: y.y,
            cy: y.z,
        };
        mapping.is_finite().then_some(mapping)
    }
}
