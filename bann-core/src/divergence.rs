//! Divergence catalog: the five supported decomposable Bregman divergences.
//!
//! Every kind is built from a strictly convex, separable generator
//!
//! ```text
//! φ(x) = Σᵢ f(xᵢ)
//! D_φ(x, y) = φ(x) − φ(y) − ⟨∇φ(y), x − y⟩ = Σᵢ d(xᵢ, yᵢ)
//! ```
//!
//! | tag   | generator f(t)      | D(x, y)                    |
//! |-------|---------------------|----------------------------|
//! | `kl`  | t·ln t − t          | Σ xᵢ ln(xᵢ/yᵢ) − xᵢ + yᵢ   |
//! | `dkl` | (same)              | kl(y, x)                   |
//! | `is`  | −ln t               | Σ xᵢ/yᵢ − ln(xᵢ/yᵢ) − 1    |
//! | `dis` | (same)              | is(y, x)                   |
//! | `se`  | t²                  | Σ (xᵢ − yᵢ)²               |
//!
//! `D_kind(query, point)` is always the value a search ranks by: primal tags
//! put the query in the first slot, dual tags evaluate the primal generator
//! with the arguments reversed.

use std::fmt;
use std::str::FromStr;

use crate::error::{BannError, Result, Role};
use crate::points::PointSet;

// ─────────────────────────────────────────────────────────────────────
// Generators
// ─────────────────────────────────────────────────────────────────────

/// A separable convex generator together with its one-dimensional
/// divergence component, gradient and inverse gradient.
///
/// Each supported kind points at one of the three static generators below.
#[derive(Debug)]
pub struct Generator {
    pub name: &'static str,
    phi: fn(f64) -> f64,
    grad: fn(f64) -> f64,
    grad_inv: fn(f64) -> f64,
    component: fn(f64, f64) -> f64,
}

impl Generator {
    /// φ(x).
    pub fn value(&self, x: &[f64]) -> f64 {
        x.iter().map(|&t| (self.phi)(t)).sum()
    }

    /// ∇φ(x), coordinate-wise.
    pub fn gradient(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&t| (self.grad)(t)).collect()
    }

    /// (∇φ)⁻¹(θ), coordinate-wise.
    pub fn gradient_inverse(&self, theta: &[f64]) -> Vec<f64> {
        theta.iter().map(|&t| (self.grad_inv)(t)).collect()
    }

    /// One coordinate of D_φ(x, y).
    #[inline(always)]
    pub fn component(&self, x: f64, y: f64) -> f64 {
        (self.component)(x, y)
    }

    /// D_φ(x, y) in closed form.
    #[inline]
    pub fn divergence(&self, x: &[f64], y: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), y.len());
        x.iter()
            .zip(y)
            .map(|(&a, &b)| (self.component)(a, b))
            .sum()
    }

    /// D_φ(x, y) straight from the definition φ(x) − φ(y) − ⟨∇φ(y), x − y⟩.
    ///
    /// Numerically worse than [`Generator::divergence`]; kept for checking
    /// the closed forms against the generator.
    pub fn divergence_from_definition(&self, x: &[f64], y: &[f64]) -> f64 {
        let inner: f64 = x
            .iter()
            .zip(y)
            .map(|(&a, &b)| (self.grad)(b) * (a - b))
            .sum();
        self.value(x) - self.value(y) - inner
    }
}

// Components are clamped at zero: the true value is non-negative and the
// leaf scan relies on monotone partial sums.

fn entropy_phi(t: f64) -> f64 {
    if t == 0.0 {
        0.0
    } else {
        t * t.ln() - t
    }
}

fn kl_component(x: f64, y: f64) -> f64 {
    if x == 0.0 {
        return y;
    }
    (x * (x.ln() - y.ln()) - x + y).max(0.0)
}

fn burg_phi(t: f64) -> f64 {
    -t.ln()
}

fn is_component(x: f64, y: f64) -> f64 {
    let r = x / y;
    (r - r.ln() - 1.0).max(0.0)
}

fn burg_grad(t: f64) -> f64 {
    -1.0 / t
}

fn square_phi(t: f64) -> f64 {
    t * t
}

fn square_grad(t: f64) -> f64 {
    2.0 * t
}

fn square_grad_inv(t: f64) -> f64 {
    0.5 * t
}

fn square_component(x: f64, y: f64) -> f64 {
    let d = x - y;
    d * d
}

/// Generalized entropy, generator of the KL divergence.
pub static ENTROPY: Generator = Generator {
    name: "generalized entropy",
    phi: entropy_phi,
    grad: f64::ln,
    grad_inv: f64::exp,
    component: kl_component,
};

/// Burg entropy, generator of the Itakura–Saito divergence.
pub static BURG: Generator = Generator {
    name: "Burg entropy",
    phi: burg_phi,
    grad: burg_grad,
    grad_inv: burg_grad,
    component: is_component,
};

/// Squared norm, generator of the squared Euclidean distance.
pub static SQUARED_NORM: Generator = Generator {
    name: "squared norm",
    phi: square_phi,
    grad: square_grad,
    grad_inv: square_grad_inv,
    component: square_component,
};

// ─────────────────────────────────────────────────────────────────────
// Domains
// ─────────────────────────────────────────────────────────────────────

/// What a coordinate must satisfy to lie in a generator's domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Finite,
    NonNegative,
    Positive,
}

impl Requirement {
    #[inline]
    pub fn admits(self, value: f64) -> bool {
        value.is_finite()
            && match self {
                Requirement::Finite => true,
                Requirement::NonNegative => value >= 0.0,
                Requirement::Positive => value > 0.0,
            }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Requirement::Finite => "finite",
            Requirement::NonNegative => "finite and non-negative",
            Requirement::Positive => "finite and strictly positive",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Divergence kinds
// ─────────────────────────────────────────────────────────────────────

/// One of the five supported divergence tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DivergenceKind {
    /// `kl`: D(query, point) = KL(query ‖ point).
    KullbackLeibler,
    /// `dkl`: D(query, point) = KL(point ‖ query).
    DualKullbackLeibler,
    /// `is`: D(query, point) = IS(query ‖ point).
    ItakuraSaito,
    /// `dis`: D(query, point) = IS(point ‖ query).
    DualItakuraSaito,
    /// `se`: squared Euclidean, its own dual.
    SquaredEuclidean,
}

impl DivergenceKind {
    pub const ALL: [DivergenceKind; 5] = [
        DivergenceKind::KullbackLeibler,
        DivergenceKind::DualKullbackLeibler,
        DivergenceKind::ItakuraSaito,
        DivergenceKind::DualItakuraSaito,
        DivergenceKind::SquaredEuclidean,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            DivergenceKind::KullbackLeibler => "kl",
            DivergenceKind::DualKullbackLeibler => "dkl",
            DivergenceKind::ItakuraSaito => "is",
            DivergenceKind::DualItakuraSaito => "dis",
            DivergenceKind::SquaredEuclidean => "se",
        }
    }

    /// Position in [`DivergenceKind::ALL`].
    pub fn ordinal(self) -> usize {
        match self {
            DivergenceKind::KullbackLeibler => 0,
            DivergenceKind::DualKullbackLeibler => 1,
            DivergenceKind::ItakuraSaito => 2,
            DivergenceKind::DualItakuraSaito => 3,
            DivergenceKind::SquaredEuclidean => 4,
        }
    }

    /// The argument-swapped kind. `se` maps to itself.
    pub fn dual(self) -> Self {
        match self {
            DivergenceKind::KullbackLeibler => DivergenceKind::DualKullbackLeibler,
            DivergenceKind::DualKullbackLeibler => DivergenceKind::KullbackLeibler,
            DivergenceKind::ItakuraSaito => DivergenceKind::DualItakuraSaito,
            DivergenceKind::DualItakuraSaito => DivergenceKind::ItakuraSaito,
            DivergenceKind::SquaredEuclidean => DivergenceKind::SquaredEuclidean,
        }
    }

    /// Whether the primal generator is evaluated with swapped arguments.
    pub fn is_dual(self) -> bool {
        matches!(
            self,
            DivergenceKind::DualKullbackLeibler | DivergenceKind::DualItakuraSaito
        )
    }

    pub fn is_symmetric(self) -> bool {
        self == DivergenceKind::SquaredEuclidean
    }

    pub fn generator(self) -> &'static Generator {
        match self {
            DivergenceKind::KullbackLeibler | DivergenceKind::DualKullbackLeibler => &ENTROPY,
            DivergenceKind::ItakuraSaito | DivergenceKind::DualItakuraSaito => &BURG,
            DivergenceKind::SquaredEuclidean => &SQUARED_NORM,
        }
    }

    /// Domain requirement on the query-side argument.
    pub fn query_requirement(self) -> Requirement {
        match self {
            DivergenceKind::KullbackLeibler => Requirement::NonNegative,
            DivergenceKind::DualKullbackLeibler => Requirement::Positive,
            DivergenceKind::ItakuraSaito | DivergenceKind::DualItakuraSaito => {
                Requirement::Positive
            }
            DivergenceKind::SquaredEuclidean => Requirement::Finite,
        }
    }

    /// Domain requirement on the data-side argument.
    pub fn data_requirement(self) -> Requirement {
        match self {
            DivergenceKind::KullbackLeibler => Requirement::Positive,
            DivergenceKind::DualKullbackLeibler => Requirement::NonNegative,
            DivergenceKind::ItakuraSaito | DivergenceKind::DualItakuraSaito => {
                Requirement::Positive
            }
            DivergenceKind::SquaredEuclidean => Requirement::Finite,
        }
    }

    fn requirement(self, role: Role) -> Requirement {
        match role {
            Role::Data => self.data_requirement(),
            Role::Query => self.query_requirement(),
        }
    }

    /// Checks every coordinate of `point` against this kind's domain.
    /// `index` only feeds the error message.
    pub fn check_point(self, point: &[f64], role: Role, index: usize) -> Result<()> {
        let requirement = self.requirement(role);
        match point.iter().position(|&v| !requirement.admits(v)) {
            None => Ok(()),
            Some(coord) => Err(BannError::Domain {
                kind: self,
                role,
                index,
                coord,
                value: point[coord],
                requirement: requirement.describe(),
            }),
        }
    }

    pub fn check_points(self, points: &PointSet, role: Role) -> Result<()> {
        points
            .iter()
            .enumerate()
            .try_for_each(|(i, p)| self.check_point(p, role, i))
    }

    /// One coordinate of D(query, point).
    #[inline(always)]
    pub fn component(self, q: f64, p: f64) -> f64 {
        let g = self.generator();
        if self.is_dual() {
            g.component(p, q)
        } else {
            g.component(q, p)
        }
    }

    /// D(query, point) without validation. Callers guarantee equal lengths
    /// and in-domain coordinates.
    #[inline]
    pub fn divergence_unchecked(self, query: &[f64], point: &[f64]) -> f64 {
        debug_assert_eq!(query.len(), point.len());
        query
            .iter()
            .zip(point)
            .map(|(&q, &p)| self.component(q, p))
            .sum()
    }

    /// D(query, point), abandoning the sum once it exceeds `bound`.
    ///
    /// Returns `None` when the partial sum passed `bound`. Components are
    /// non-negative, so a `None` means the full value exceeds `bound` too.
    #[inline]
    pub fn divergence_within(self, query: &[f64], point: &[f64], bound: f64) -> Option<f64> {
        let mut sum = 0.0;
        for (&q, &p) in query.iter().zip(point) {
            sum += self.component(q, p);
            if sum > bound {
                return None;
            }
        }
        Some(sum)
    }

    /// Catalog entry point: validated D(x, y) with `x` in the query slot.
    pub fn divergence(self, x: &[f64], y: &[f64]) -> Result<f64> {
        if x.len() != y.len() {
            return Err(BannError::dimension(
                x.len(),
                y.len(),
                format!("`{}` divergence arguments", self.tag()),
            ));
        }
        self.check_point(x, Role::Query, 0)?;
        self.check_point(y, Role::Data, 0)?;
        Ok(self.divergence_unchecked(x, y))
    }

    /// Center minimizing Σ D(c, p) over `members`, with `c` in the query slot.
    ///
    /// Primal kinds place the center in the generator's first argument, so the
    /// minimizer is the gradient-space mean mapped back through (∇φ)⁻¹
    /// (geometric mean for `kl`, harmonic mean for `is`, plain mean for `se`).
    /// Dual kinds place it in the second argument, where the arithmetic mean
    /// is the minimizer for every Bregman divergence.
    pub fn centroid<'a>(self, dim: usize, members: impl Iterator<Item = &'a [f64]>) -> Vec<f64> {
        let g = self.generator();
        let dual_space = !self.is_dual() && !self.is_symmetric();
        let mut acc = vec![0.0; dim];
        let mut count = 0usize;
        for point in members {
            if dual_space {
                for (a, &v) in acc.iter_mut().zip(point) {
                    *a += (g.grad)(v);
                }
            } else {
                for (a, &v) in acc.iter_mut().zip(point) {
                    *a += v;
                }
            }
            count += 1;
        }
        if count == 0 {
            return acc;
        }
        let inv = 1.0 / count as f64;
        acc.iter_mut().for_each(|a| *a *= inv);
        if dual_space {
            g.gradient_inverse(&acc)
        } else {
            acc
        }
    }

    /// Lower bound on D(q, p) for every `p` in a ball whose members satisfy
    /// D(c, p) ≤ `radius`, given the exact `center_div` = D(q, c).
    ///
    /// Only `se` has one: √D is a metric there, so
    /// D(q, p) ≥ (√D(q, c) − √R)². The other kinds return `None` and the
    /// caller must fall back to bounds that hold for them.
    #[inline]
    pub fn ball_lower_bound(self, center_div: f64, radius: f64) -> Option<f64> {
        match self {
            DivergenceKind::SquaredEuclidean => {
                let gap = (center_div.sqrt() - radius.sqrt()).max(0.0);
                Some(gap * gap)
            }
            _ => None,
        }
    }

    /// Upper bound on D(q, p) over the same ball, where one exists.
    #[inline]
    pub fn ball_upper_bound(self, center_div: f64, radius: f64) -> Option<f64> {
        match self {
            DivergenceKind::SquaredEuclidean => {
                let reach = center_div.sqrt() + radius.sqrt();
                Some(reach * reach)
            }
            _ => None,
        }
    }
}

impl fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DivergenceKind {
    type Err = BannError;

    fn from_str(s: &str) -> Result<Self> {
        DivergenceKind::ALL
            .into_iter()
            .find(|k| k.tag() == s)
            .ok_or_else(|| {
                BannError::parameter(
                    "divergence",
                    format!("unknown divergence `{s}`, expected one of kl, dkl, is, dis, se"),
                )
            })
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
