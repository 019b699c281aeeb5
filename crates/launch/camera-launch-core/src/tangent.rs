//! Analytic tangents for the vertical channel.
//!
//! A quadratic `y(t) = a·t² + b·t + c` is fitted through the launch, apex and
//! landing samples (t in seconds since launch). Its end slopes become the
//! launch and landing tangents, and the apex is forced flat, so a host spline
//! through only three keys reproduces the parabola.

use serde::{Deserialize, Serialize};

use crate::trajectory::SampleRole;

/// Exact-fit quadratic through three samples; `c` is the first height.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuadraticFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    /// Offset of the last sample from the first.
    pub span: f64,
}

impl QuadraticFit {
    /// Fit through `(times[i], heights[i])`.
    ///
    /// Returns `None` when the system is degenerate (two samples share a time,
    /// or `|denominator| < epsilon`).
    pub fn fit(times: [f64; 3], heights: [f64; 3], epsilon: f64) -> Option<Self> {
        let [t0, t1, t2] = times;
        let [y0, y1, y2] = heights;
        let dt1 = t1 - t0;
        let dt2 = t2 - t0;
        let denom = dt1 * dt2 * (dt2 - dt1);
        if !denom.is_finite() || denom.abs() < epsilon {
            return None;
        }
        let a = (dt1 * (y2 - y0) - dt2 * (y1 - y0)) / denom;
        let b = (dt2 * dt2 * (y1 - y0) - dt1 * dt1 * (y2 - y0)) / denom;
        Some(Self {
            a,
            b,
            c: y0,
            span: dt2,
        })
    }

    /// dy/dt at `dt` seconds after the first sample.
    #[inline]
    pub fn slope_at(&self, dt: f64) -> f64 {
        2.0 * self.a * dt + self.b
    }

    #[inline]
    pub fn start_slope(&self) -> f64 {
        self.b
    }

    #[inline]
    pub fn end_slope(&self) -> f64 {
        self.slope_at(self.span)
    }

    pub fn value_at(&self, dt: f64) -> f64 {
        self.a * dt * dt + self.b * dt + self.c
    }
}

/// Tangent angles to assign on one key; `None` leaves that side as written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleTangents {
    pub incoming: Option<f64>,
    pub outgoing: Option<f64>,
}

impl SampleTangents {
    /// Per-role policy: launch gets only an outgoing tangent, the apex is flat
    /// on both sides, landing gets only an incoming tangent.
    pub fn for_role(role: SampleRole, fit: &QuadraticFit) -> Self {
        match role {
            SampleRole::Start => Self {
                incoming: None,
                outgoing: Some(fit.start_slope().atan()),
            },
            SampleRole::Middle => Self {
                incoming: Some(0.0),
                outgoing: Some(0.0),
            },
            SampleRole::End => Self {
                incoming: Some(fit.end_slope().atan()),
                outgoing: None,
            },
        }
    }
}

/// Tangents for the three vertical keys, or `None` (with a warning) when the
/// fit is degenerate and the keys keep their default linear tangents.
pub fn solve_vertical_tangents(
    times: [f64; 3],
    heights: [f64; 3],
    epsilon: f64,
) -> Option<[SampleTangents; 3]> {
    let Some(fit) = QuadraticFit::fit(times, heights, epsilon) else {
        log::warn!(
            "degenerate tangent fit for sample times {times:?}; keeping linear tangents"
        );
        return None;
    };
    Some(SampleRole::ALL.map(|role| SampleTangents::for_role(role, &fit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn recovers_projectile_coefficients() {
        // y = 5 + 20t - 5t^2 sampled at 0, 2, 4
        let y = |t: f64| 5.0 + 20.0 * t - 5.0 * t * t;
        let fit = QuadraticFit::fit([0.0, 2.0, 4.0], [y(0.0), y(2.0), y(4.0)], 1e-10).unwrap();
        approx(fit.a, -5.0, 1e-12);
        approx(fit.b, 20.0, 1e-12);
        approx(fit.start_slope(), 20.0, 1e-12);
        approx(fit.end_slope(), -20.0, 1e-12);
        approx(fit.value_at(3.0), y(3.0), 1e-12);
    }

    #[test]
    fn fit_is_shift_invariant_in_time() {
        let a = QuadraticFit::fit([0.0, 1.0, 3.0], [0.0, 4.0, 1.0], 1e-10).unwrap();
        let b = QuadraticFit::fit([10.0, 11.0, 13.0], [0.0, 4.0, 1.0], 1e-10).unwrap();
        approx(a.a, b.a, 1e-9);
        approx(a.b, b.b, 1e-9);
    }

    #[test]
    fn degenerate_times_yield_no_tangents() {
        assert!(solve_vertical_tangents([0.0, 0.0, 1.0], [0.0, 1.0, 0.0], 1e-10).is_none());
        assert!(solve_vertical_tangents([0.0, 1.0, 1.0], [0.0, 1.0, 0.0], 1e-10).is_none());
        assert!(solve_vertical_tangents([0.0, 0.0, 0.0], [0.0, 0.0, 0.0], 1e-10).is_none());
    }

    #[test]
    fn per_role_policy() {
        let tangents = solve_vertical_tangents([0.0, 1.0, 2.0], [0.0, 5.0, 0.0], 1e-10).unwrap();
        let [start, middle, end] = tangents;
        assert_eq!(start.incoming, None);
        approx(start.outgoing.unwrap(), 10.0f64.atan(), 1e-12);
        assert_eq!(
            middle,
            SampleTangents {
                incoming: Some(0.0),
                outgoing: Some(0.0),
            }
        );
        assert_eq!(end.outgoing, None);
        approx(end.incoming.unwrap(), (-10.0f64).atan(), 1e-12);
    }

    #[test]
    fn apex_stays_flat_for_skewed_samples() {
        // middle sample not at the true apex: fitted slope there is non-zero,
        // but the policy still writes flat tangents
        let tangents = solve_vertical_tangents([0.0, 0.3, 2.0], [0.0, 4.0, -7.0], 1e-10).unwrap();
        assert_eq!(tangents[1].incoming, Some(0.0));
        assert_eq!(tangents[1].outgoing, Some(0.0));
    }
}
