use crate::error::SimError;
use crate::model::trajectory::TimeGrid;

/// Substeps per grid interval never go below this.
pub const MIN_SUBSTEPS: usize = 10;
/// Largest RK4 substep count before switching to backward Euler.
pub const MAX_RK4_SUBSTEPS: usize = 2_000;
/// Substeps per grid interval on the backward Euler path.
pub const IMPLICIT_SUBSTEPS: usize = 100;
/// Target for `total_rate * dt` on the RK4 path, well inside its stability region.
const MAX_RATE_TIMES_DT: f64 = 0.5;

const NEWTON_MAX_ITER: usize = 50;
const NEWTON_TOL: f64 = 1e-14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Classic explicit fourth-order Runge-Kutta.
    Rk4,
    /// Implicit Euler solved with Newton iterations; stable for any step size.
    BackwardEuler,
}

/// Stepping method and substeps per one-day grid interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub method: Method,
    pub substeps: usize,
}

/// Pick RK4 with `total_rate * dt <= 0.5`, or backward Euler when that would
/// take more than [`MAX_RK4_SUBSTEPS`] per day.
pub fn plan_for(total_rate: f64) -> StepPlan {
    let needed = (total_rate / MAX_RATE_TIMES_DT).ceil();
    if needed.is_nan() || needed <= MIN_SUBSTEPS as f64 {
        StepPlan { method: Method::Rk4, substeps: MIN_SUBSTEPS }
    } else if needed > MAX_RK4_SUBSTEPS as f64 {
        StepPlan { method: Method::BackwardEuler, substeps: IMPLICIT_SUBSTEPS }
    } else {
        StepPlan { method: Method::Rk4, substeps: needed as usize }
    }
}

/// Workspace for allocation-free RK4 steps
pub struct Rk4Workspace {
    pub k1: Vec<f64>,
    pub k2: Vec<f64>,
    pub k3: Vec<f64>,
    pub k4: Vec<f64>,
    pub ytmp: Vec<f64>,
}

impl Rk4Workspace {
    pub fn new(n: usize) -> Self {
        Self {
            k1: vec![0.0; n],
            k2: vec![0.0; n],
            k3: vec![0.0; n],
            k4: vec![0.0; n],
            ytmp: vec![0.0; n],
        }
    }

    pub fn resize(&mut self, n: usize) {
        if self.k1.len() != n {
            self.k1.resize(n, 0.0);
            self.k2.resize(n, 0.0);
            self.k3.resize(n, 0.0);
            self.k4.resize(n, 0.0);
            self.ytmp.resize(n, 0.0);
        }
    }
}

/// Fixed-step RK4 using preallocated workspace to avoid allocations per step.
pub fn rk4_step_ws<F>(y: &mut [f64], t: f64, dt: f64, ws: &mut Rk4Workspace, mut f: F)
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    ws.resize(n);

    let (k1, k2, k3, k4, ytmp) = (&mut ws.k1, &mut ws.k2, &mut ws.k3, &mut ws.k4, &mut ws.ytmp);

    f(t, y, k1);

    for i in 0..n {
        ytmp[i] = y[i] + 0.5 * dt * k1[i];
    }
    f(t + 0.5 * dt, ytmp, k2);

    for i in 0..n {
        ytmp[i] = y[i] + 0.5 * dt * k2[i];
    }
    f(t + 0.5 * dt, ytmp, k3);

    for i in 0..n {
        ytmp[i] = y[i] + dt * k3[i];
    }
    f(t + dt, ytmp, k4);

    for i in 0..n {
        y[i] += (dt / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
}

/// Scratch space for backward Euler steps. `jac` and `a` are row-major n x n.
pub struct ImplicitWorkspace {
    pub y_prev: Vec<f64>,
    pub fy: Vec<f64>,
    pub rhs: Vec<f64>,
    pub jac: Vec<f64>,
    pub a: Vec<f64>,
}

impl ImplicitWorkspace {
    pub fn new(n: usize) -> Self {
        Self {
            y_prev: vec![0.0; n],
            fy: vec![0.0; n],
            rhs: vec![0.0; n],
            jac: vec![0.0; n * n],
            a: vec![0.0; n * n],
        }
    }
}

/// One backward Euler step: solve `y1 = y0 + dt * f(t + dt, y1)` by Newton
/// iteration with the analytic Jacobian `jac`. Returns `false` if Newton does
/// not converge or the linear system is singular.
pub fn backward_euler_step<F, J>(y: &mut [f64], t: f64, dt: f64, ws: &mut ImplicitWorkspace, mut f: F, mut jac: J) -> bool
where
    F: FnMut(f64, &[f64], &mut [f64]),
    J: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y.len();
    let t1 = t + dt;
    ws.y_prev.copy_from_slice(y);

    for _ in 0..NEWTON_MAX_ITER {
        f(t1, y, &mut ws.fy);
        jac(t1, y, &mut ws.jac);
        for r in 0..n {
            // -(y - y0 - dt f(y))
            ws.rhs[r] = -(y[r] - ws.y_prev[r] - dt * ws.fy[r]);
            for c in 0..n {
                let identity = if r == c { 1.0 } else { 0.0 };
                ws.a[r * n + c] = identity - dt * ws.jac[r * n + c];
            }
        }
        if !solve_in_place(&mut ws.a, &mut ws.rhs, n) {
            return false;
        }

        let mut step = 0.0f64;
        for r in 0..n {
            y[r] += ws.rhs[r];
            step = step.max(ws.rhs[r].abs());
        }
        let scale = y.iter().fold(1.0f64, |m, v| m.max(v.abs()));
        if step <= NEWTON_TOL * scale {
            return true;
        }
    }
    false
}

/// Gaussian elimination with partial pivoting. Solution is left in `b`.
fn solve_in_place(a: &mut [f64], b: &mut [f64], n: usize) -> bool {
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&p, &q| a[p * n + col].abs().total_cmp(&a[q * n + col].abs()))
            .unwrap_or(col);
        if a[pivot * n + col] == 0.0 || !a[pivot * n + col].is_finite() {
            return false;
        }
        if pivot != col {
            for k in 0..n {
                a.swap(col * n + k, pivot * n + k);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let m = a[row * n + col] / a[col * n + col];
            for k in col..n {
                a[row * n + k] -= m * a[col * n + k];
            }
            b[row] -= m * b[col];
        }
    }
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in row + 1..n {
            acc -= a[row * n + k] * b[k];
        }
        b[row] = acc / a[row * n + row];
    }
    true
}

/// Integrate `f` from `y0` and sample the state at every grid point.
///
/// Each one-day interval is covered by `plan.substeps` steps of `plan.method`.
/// `jac` fills the row-major Jacobian of `f` and is only called on the
/// backward Euler path. The first sample is a copy of `y0`. Fails on the first
/// sample containing NaN or infinity.
pub fn integrate<F, J>(y0: &[f64], grid: &TimeGrid, plan: StepPlan, mut f: F, mut jac: J) -> Result<Vec<Vec<f64>>, SimError>
where
    F: FnMut(f64, &[f64], &mut [f64]),
    J: FnMut(f64, &[f64], &mut [f64]),
{
    let n = y0.len();
    let substeps = plan.substeps.max(1);
    let dt = 1.0 / substeps as f64;
    let mut rk4_ws = Rk4Workspace::new(n);
    let mut implicit_ws = ImplicitWorkspace::new(n);
    let mut y = y0.to_vec();

    let mut out = Vec::with_capacity(grid.len());
    out.push(y.clone());
    for day in 1..=grid.days() {
        let t0 = f64::from(day - 1);
        for k in 0..substeps {
            let t = t0 + k as f64 * dt;
            match plan.method {
                Method::Rk4 => rk4_step_ws(&mut y, t, dt, &mut rk4_ws, &mut f),
                Method::BackwardEuler => {
                    if !backward_euler_step(&mut y, t, dt, &mut implicit_ws, &mut f, &mut jac) {
                        return Err(SimError::unstable(day, "implicit step did not converge"));
                    }
                }
            }
        }
        if let Some(bad) = y.iter().find(|v| !v.is_finite()) {
            return Err(SimError::unstable(day, format!("non-finite state value {}", bad)));
        }
        out.push(y.clone());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RK4_10: StepPlan = StepPlan { method: Method::Rk4, substeps: 10 };

    fn no_jac(_: f64, _: &[f64], _: &mut [f64]) {}

    #[test]
    fn exponential_decay_matches_closed_form() {
        let grid = TimeGrid::default();
        let out = integrate(&[1.0], &grid, RK4_10, |_, y, dy| dy[0] = -0.2 * y[0], no_jac).unwrap();
        assert_eq!(out.len(), 31);
        assert_eq!(out[0], vec![1.0]);
        for (day, y) in out.iter().enumerate() {
            let exact = (-0.2 * day as f64).exp();
            assert!((y[0] - exact).abs() < 1e-8, "day {}: {} vs {}", day, y[0], exact);
        }
    }

    #[test]
    fn does_not_touch_initial_state() {
        let y0 = vec![0.5, 0.5];
        let _ = integrate(
            &y0,
            &TimeGrid::default(),
            RK4_10,
            |_, y, dy| {
                dy[0] = -y[0];
                dy[1] = y[0];
            },
            no_jac,
        )
        .unwrap();
        assert_eq!(y0, vec![0.5, 0.5]);
    }

    #[test]
    fn reports_blow_up() {
        let plan = StepPlan { method: Method::Rk4, substeps: 1 };
        let err = integrate(&[1.0], &TimeGrid::default(), plan, |_, y, dy| dy[0] = y[0] * y[0] * 1e6, no_jac).unwrap_err();
        assert!(matches!(err, SimError::NumericalInstability { .. }));
    }

    #[test]
    fn plan_scales_with_rate() {
        assert_eq!(plan_for(0.0), StepPlan { method: Method::Rk4, substeps: MIN_SUBSTEPS });
        assert_eq!(plan_for(1.2), StepPlan { method: Method::Rk4, substeps: MIN_SUBSTEPS });
        assert_eq!(plan_for(14.2), StepPlan { method: Method::Rk4, substeps: 29 });
        assert_eq!(plan_for(1000.0), StepPlan { method: Method::Rk4, substeps: MAX_RK4_SUBSTEPS });
        assert_eq!(plan_for(1000.5).method, Method::BackwardEuler);
        assert_eq!(plan_for(1e12), StepPlan { method: Method::BackwardEuler, substeps: IMPLICIT_SUBSTEPS });
        assert_eq!(plan_for(f64::NAN).method, Method::Rk4);
    }

    #[test]
    fn rk4_ws_step_is_fourth_order_on_linear_growth() {
        let mut y = vec![1.0];
        let mut ws = Rk4Workspace::new(1);
        rk4_step_ws(&mut y, 0.0, 0.1, &mut ws, |_, y, dy| dy[0] = y[0]);
        let rk4 = 1.0 + 0.1 + 0.01 / 2.0 + 0.001 / 6.0 + 0.0001 / 24.0;
        assert!((y[0] - rk4).abs() < 1e-15);
    }

    #[test]
    fn backward_euler_stays_stable_on_stiff_decay() {
        // x -> y at rate 1e9 per day, far past any explicit stability limit
        let k = 1e9;
        let plan = StepPlan { method: Method::BackwardEuler, substeps: IMPLICIT_SUBSTEPS };
        let out = integrate(
            &[1.0, 0.0],
            &TimeGrid::default(),
            plan,
            |_, y, dy| {
                dy[0] = -k * y[0];
                dy[1] = k * y[0];
            },
            |_, _, j| j.copy_from_slice(&[-k, 0.0, k, 0.0]),
        )
        .unwrap();
        for y in &out[1..] {
            assert!(y[0] >= 0.0 && y[0] < 1e-12);
            assert!((y[0] + y[1] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn backward_euler_step_solves_linear_decay_exactly() {
        let mut y = vec![1.0];
        let mut ws = ImplicitWorkspace::new(1);
        let ok = backward_euler_step(&mut y, 0.0, 0.5, &mut ws, |_, y, dy| dy[0] = -2.0 * y[0], |_, _, j| j[0] = -2.0);
        assert!(ok);
        assert!((y[0] - 0.5).abs() < 1e-15);
    }

    #[test]
    fn solves_pivoted_system() {
        let mut a = vec![0.0, 2.0, 1.0, 1.0];
        let mut b = vec![4.0, 3.0];
        assert!(solve_in_place(&mut a, &mut b, 2));
        assert!((b[0] - 1.0).abs() < 1e-15 && (b[1] - 2.0).abs() < 1e-15);
        let mut singular = vec![0.0; 4];
        assert!(!solve_in_place(&mut singular, &mut [1.0, 1.0], 2));
    }
}
