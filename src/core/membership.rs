//! # Funções de Pertinência — Grau de Pertencimento Fuzzy
//!
//! Uma função de pertinência mapeia um valor escalar de evidência `x`
//! para um **grau** em `[0, 1]`: "quanto `x` pertence a esta categoria?".
//!
//! ## Formas Suportadas
//!
//! | Forma | Parâmetros | Comportamento |
//! |-------|------------|---------------|
//! | `Triangular` | `(left, center, right)` | Sobe linear até 1 em `center`, desce até `right` |
//! | `Trapezoidal` | `(a, b, c, d)` | Sobe em `[a,b]`, platô 1 em `[b,c]`, desce em `[c,d]` |
//! | `Gaussian` | `(center, sigma)` | `exp(-(x-center)² / 2σ²)` |
//! | `Sigmoid` | `(center, slope)` | `1 / (1 + exp(-slope·(x-center)))` |
//!
//! ## Formas Degeneradas
//!
//! Um triângulo com `left == center` (ou `center == right`) é um
//! triângulo retângulo: o segmento de comprimento zero vira um **degrau**.
//! Nunca há divisão por zero: o ponto `center` sempre retorna 1.0.
//!
//! ```text
//! triangular(0, 0, 0.2):   1 ┐
//!                            │╲
//!                            │ ╲
//!                          0 └──╲──────
//!                            0  0.2
//! ```
//!
//! ## Validação
//!
//! Parâmetros malformados (`sigma ≤ 0`, breakpoints fora de ordem,
//! valores não finitos) são rejeitados por [`MembershipFunction::validate`],
//! chamada no **registro** da variável, nunca na avaliação.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Descritor de uma função de pertinência (forma + parâmetros).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipFunction {
    /// Triângulo `left ≤ center ≤ right`, com `left < right`.
    Triangular { left: f64, center: f64, right: f64 },
    /// Trapézio `a ≤ b ≤ c ≤ d`, com `a < d`.
    Trapezoidal { a: f64, b: f64, c: f64, d: f64 },
    /// Gaussiana com `sigma > 0`.
    Gaussian { center: f64, sigma: f64 },
    /// Sigmoide com `slope ≠ 0`.
    Sigmoid { center: f64, slope: f64 },
}

impl MembershipFunction {
    /// Atalho para um triângulo.
    pub fn triangular(left: f64, center: f64, right: f64) -> Self {
        MembershipFunction::Triangular { left, center, right }
    }

    /// Atalho para um trapézio.
    pub fn trapezoidal(a: f64, b: f64, c: f64, d: f64) -> Self {
        MembershipFunction::Trapezoidal { a, b, c, d }
    }

    /// Verifica se os parâmetros definem uma forma não degenerada.
    ///
    /// # Erros
    ///
    /// [`EngineError::Configuration`] se algum parâmetro não for finito,
    /// se os breakpoints estiverem fora de ordem, se o suporte tiver
    /// largura zero, se `sigma ≤ 0` ou se `slope == 0`.
    pub fn validate(&self) -> Result<()> {
        let params = self.params();
        if params.iter().any(|p| !p.is_finite()) {
            return Err(EngineError::config(format!(
                "parâmetros não finitos em {}: {:?}",
                self.kind_label(),
                params
            )));
        }

        match *self {
            MembershipFunction::Triangular { left, center, right } => {
                if !(left <= center && center <= right) {
                    return Err(EngineError::config(format!(
                        "triangular exige left ≤ center ≤ right, recebido ({left}, {center}, {right})"
                    )));
                }
                if left == right {
                    return Err(EngineError::config(format!(
                        "triangular com suporte de largura zero em {left}"
                    )));
                }
            }
            MembershipFunction::Trapezoidal { a, b, c, d } => {
                if !(a <= b && b <= c && c <= d) {
                    return Err(EngineError::config(format!(
                        "trapezoidal exige a ≤ b ≤ c ≤ d, recebido ({a}, {b}, {c}, {d})"
                    )));
                }
                if a == d {
                    return Err(EngineError::config(format!(
                        "trapezoidal com suporte de largura zero em {a}"
                    )));
                }
            }
            MembershipFunction::Gaussian { sigma, .. } => {
                if sigma <= 0.0 {
                    return Err(EngineError::config(format!(
                        "gaussiana exige sigma > 0, recebido {sigma}"
                    )));
                }
            }
            MembershipFunction::Sigmoid { slope, .. } => {
                if slope == 0.0 {
                    return Err(EngineError::config("sigmoide exige slope ≠ 0"));
                }
            }
        }
        Ok(())
    }

    /// Grau de pertinência de `x`, sempre em `[0, 1]`.
    ///
    /// Assume parâmetros já validados. Segmentos de largura zero
    /// são tratados como degrau (sem divisão por zero).
    pub fn degree(&self, x: f64) -> f64 {
        let raw = match *self {
            MembershipFunction::Triangular { left, center, right } => {
                if x < left || x > right {
                    0.0
                } else if x == center {
                    1.0
                } else if x < center {
                    // left ≤ x < center ⇒ center − left > 0
                    (x - left) / (center - left)
                } else {
                    (right - x) / (right - center)
                }
            }
            MembershipFunction::Trapezoidal { a, b, c, d } => {
                if x < a || x > d {
                    0.0
                } else if x >= b && x <= c {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            }
            MembershipFunction::Gaussian { center, sigma } => {
                let diff = x - center;
                (-(diff * diff) / (2.0 * sigma * sigma)).exp()
            }
            MembershipFunction::Sigmoid { center, slope } => {
                1.0 / (1.0 + (-slope * (x - center)).exp())
            }
        };
        raw.clamp(0.0, 1.0)
    }

    /// Suporte aproximado `[lo, hi]` da função, usado como faixa padrão
    /// da variável linguística quando nenhuma é informada.
    ///
    /// Para gaussiana usa `center ± 3σ`; para sigmoide, a metade do
    /// universo `[0, 1]` onde ela "liga".
    pub fn support(&self) -> (f64, f64) {
        match *self {
            MembershipFunction::Triangular { left, right, .. } => (left, right),
            MembershipFunction::Trapezoidal { a, d, .. } => (a, d),
            MembershipFunction::Gaussian { center, sigma } => {
                (center - 3.0 * sigma, center + 3.0 * sigma)
            }
            MembershipFunction::Sigmoid { center, slope } => {
                if slope > 0.0 {
                    (center, 1.0_f64.max(center))
                } else {
                    (0.0_f64.min(center), center)
                }
            }
        }
    }

    /// Nome curto da forma, usado em mensagens e logs.
    pub fn kind_label(&self) -> &'static str {
        match self {
            MembershipFunction::Triangular { .. } => "triangular",
            MembershipFunction::Trapezoidal { .. } => "trapezoidal",
            MembershipFunction::Gaussian { .. } => "gaussian",
            MembershipFunction::Sigmoid { .. } => "sigmoid",
        }
    }

    fn params(&self) -> Vec<f64> {
        match *self {
            MembershipFunction::Triangular { left, center, right } => vec![left, center, right],
            MembershipFunction::Trapezoidal { a, b, c, d } => vec![a, b, c, d],
            MembershipFunction::Gaussian { center, sigma } => vec![center, sigma],
            MembershipFunction::Sigmoid { center, slope } => vec![center, slope],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangular_peak_and_edges() {
        let f = MembershipFunction::triangular(0.0, 0.5, 1.0);
        assert_eq!(f.degree(0.0), 0.0);
        assert_eq!(f.degree(0.5), 1.0);
        assert_eq!(f.degree(1.0), 0.0);
        assert!((f.degree(0.25) - 0.5).abs() < 1e-12);
        assert_eq!(f.degree(-0.1), 0.0);
    }

    /// Triângulo retângulo (left == center): o ponto de pico é um degrau.
    #[test]
    fn degenerate_left_triangle_is_a_step() {
        let f = MembershipFunction::triangular(0.0, 0.0, 0.2);
        assert_eq!(f.degree(0.0), 1.0);
        assert!((f.degree(0.1) - 0.5).abs() < 1e-12);
        assert_eq!(f.degree(0.2), 0.0);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn degenerate_right_triangle_is_a_step() {
        let f = MembershipFunction::triangular(0.8, 1.0, 1.0);
        assert_eq!(f.degree(1.0), 1.0);
        assert!((f.degree(0.9) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn trapezoid_plateau() {
        let f = MembershipFunction::trapezoidal(0.0, 0.2, 0.6, 1.0);
        assert_eq!(f.degree(0.4), 1.0);
        assert!((f.degree(0.1) - 0.5).abs() < 1e-12);
        assert!((f.degree(0.8) - 0.5).abs() < 1e-12);
        assert_eq!(f.degree(1.5), 0.0);
    }

    #[test]
    fn gaussian_and_sigmoid_shapes() {
        let g = MembershipFunction::Gaussian { center: 0.5, sigma: 0.1 };
        assert_eq!(g.degree(0.5), 1.0);
        assert!(g.degree(0.7) < g.degree(0.6));

        let s = MembershipFunction::Sigmoid { center: 0.5, slope: 10.0 };
        assert!((s.degree(0.5) - 0.5).abs() < 1e-12);
        assert!(s.degree(0.9) > 0.95);
    }

    #[test]
    fn malformed_parameters_are_rejected() {
        assert!(MembershipFunction::triangular(0.5, 0.2, 0.9).validate().is_err());
        assert!(MembershipFunction::triangular(0.3, 0.3, 0.3).validate().is_err());
        assert!(MembershipFunction::trapezoidal(0.0, 0.5, 0.4, 1.0).validate().is_err());
        assert!(MembershipFunction::Gaussian { center: 0.5, sigma: 0.0 }.validate().is_err());
        assert!(MembershipFunction::Sigmoid { center: 0.5, slope: 0.0 }.validate().is_err());
        assert!(MembershipFunction::triangular(f64::NAN, 0.5, 1.0).validate().is_err());
    }
}
