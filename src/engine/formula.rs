//! Typed quantity formulas
//!
//! Formulas are a closed set of variants evaluated against named numeric
//! variables. The admin tooling stores them in the snapshot in this form,
//! so the engine never interprets free-form expressions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Variables a formula may read
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    PlotArea,
    BuiltUpArea,
    CarpetArea,
    OpenArea,
    Floors,
    Bedrooms,
    Bathrooms,
    Kitchens,
    LivingRooms,
    OtherRooms,
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Variable::PlotArea => "plot_area",
            Variable::BuiltUpArea => "built_up_area",
            Variable::CarpetArea => "carpet_area",
            Variable::OpenArea => "open_area",
            Variable::Floors => "floors",
            Variable::Bedrooms => "bedrooms",
            Variable::Bathrooms => "bathrooms",
            Variable::Kitchens => "kitchens",
            Variable::LivingRooms => "living_rooms",
            Variable::OtherRooms => "other_rooms",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("variable {0} is not bound")]
    UnboundVariable(Variable),

    #[error("no lookup entry for {variable} = {key}")]
    NoLookupMatch { variable: Variable, key: f64 },

    #[error("step limits must be strictly ascending")]
    UnorderedSteps,

    #[error("formula produced a non-finite value")]
    NonFinite,
}

/// Variable bindings for one evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaInputs {
    values: BTreeMap<Variable, f64>,
}

impl FormulaInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, variable: Variable, value: f64) -> Self {
        self.values.insert(variable, value);
        self
    }

    pub fn get(&self, variable: Variable) -> Result<f64, FormulaError> {
        self.values
            .get(&variable)
            .copied()
            .ok_or(FormulaError::UnboundVariable(variable))
    }
}

/// One bracket of a stepped formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub limit: f64,
    /// Whether a value equal to `limit` belongs to this bracket
    #[serde(default)]
    pub inclusive: bool,
    pub value: f64,
}

impl Step {
    fn contains(&self, x: f64) -> bool {
        x < self.limit || (self.inclusive && x == self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupEntry {
    pub key: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formula {
    Constant {
        value: f64,
    },
    /// coefficient * variable + intercept
    Linear {
        variable: Variable,
        coefficient: f64,
        #[serde(default)]
        intercept: f64,
    },
    /// First bracket containing the variable wins, else `otherwise`
    Stepped {
        variable: Variable,
        steps: Vec<Step>,
        otherwise: f64,
    },
    Lookup {
        variable: Variable,
        entries: Vec<LookupEntry>,
        #[serde(default)]
        default: Option<f64>,
    },
    Product {
        factors: Vec<Formula>,
    },
}

const KEY_TOLERANCE: f64 = 1e-9;

impl Formula {
    pub fn evaluate(&self, inputs: &FormulaInputs) -> Result<f64, FormulaError> {
        let value = match self {
            Formula::Constant { value } => *value,
            Formula::Linear {
                variable,
                coefficient,
                intercept,
            } => coefficient * inputs.get(*variable)? + intercept,
            Formula::Stepped {
                variable,
                steps,
                otherwise,
            } => {
                let x = inputs.get(*variable)?;
                steps
                    .iter()
                    .find(|step| step.contains(x))
                    .map(|step| step.value)
                    .unwrap_or(*otherwise)
            }
            Formula::Lookup {
                variable,
                entries,
                default,
            } => {
                let x = inputs.get(*variable)?;
                entries
                    .iter()
                    .find(|entry| (entry.key - x).abs() < KEY_TOLERANCE)
                    .map(|entry| entry.value)
                    .or(*default)
                    .ok_or(FormulaError::NoLookupMatch {
                        variable: *variable,
                        key: x,
                    })?
            }
            Formula::Product { factors } => {
                let mut product = 1.0;
                for factor in factors {
                    product *= factor.evaluate(inputs)?;
                }
                product
            }
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(FormulaError::NonFinite)
        }
    }

    /// Structural checks done once at publish/load time
    pub fn check(&self) -> Result<(), FormulaError> {
        match self {
            Formula::Stepped { steps, .. } => {
                let ascending = steps.windows(2).all(|w| w[0].limit < w[1].limit);
                if ascending {
                    Ok(())
                } else {
                    Err(FormulaError::UnorderedSteps)
                }
            }
            Formula::Product { factors } => factors.iter().try_for_each(Formula::check),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bracket() -> Formula {
        Formula::Stepped {
            variable: Variable::PlotArea,
            steps: vec![
                Step {
                    limit: 1000.0,
                    inclusive: false,
                    value: 0.70,
                },
                Step {
                    limit: 2000.0,
                    inclusive: true,
                    value: 0.75,
                },
            ],
            otherwise: 0.80,
        }
    }

    #[test]
    fn test_stepped_boundaries() {
        let formula = bracket();
        let at = |x: f64| formula.evaluate(&FormulaInputs::new().with(Variable::PlotArea, x));

        assert_eq!(at(999.9), Ok(0.70));
        assert_eq!(at(1000.0), Ok(0.75)); // lower bound belongs to the next bracket
        assert_eq!(at(2000.0), Ok(0.75)); // inclusive upper bound
        assert_eq!(at(2000.1), Ok(0.80));
    }

    #[test]
    fn test_linear_and_product() {
        let formula = Formula::Product {
            factors: vec![
                Formula::Linear {
                    variable: Variable::BuiltUpArea,
                    coefficient: 0.5,
                    intercept: 10.0,
                },
                Formula::Constant { value: 2.0 },
            ],
        };
        let inputs = FormulaInputs::new().with(Variable::BuiltUpArea, 100.0);

        assert_eq!(formula.evaluate(&inputs), Ok(120.0));
    }

    #[test]
    fn test_lookup_default_and_miss() {
        let entries = vec![
            LookupEntry { key: 1.0, value: 1.0 },
            LookupEntry { key: 2.0, value: 1.8 },
        ];
        let strict = Formula::Lookup {
            variable: Variable::Floors,
            entries: entries.clone(),
            default: None,
        };
        let lenient = Formula::Lookup {
            variable: Variable::Floors,
            entries,
            default: Some(2.5),
        };
        let three = FormulaInputs::new().with(Variable::Floors, 3.0);

        assert_eq!(
            strict.evaluate(&FormulaInputs::new().with(Variable::Floors, 2.0)),
            Ok(1.8)
        );
        assert!(matches!(
            strict.evaluate(&three),
            Err(FormulaError::NoLookupMatch { .. })
        ));
        assert_eq!(lenient.evaluate(&three), Ok(2.5));
    }

    #[test]
    fn test_unbound_variable() {
        let formula = Formula::Linear {
            variable: Variable::Kitchens,
            coefficient: 1.0,
            intercept: 0.0,
        };

        assert_eq!(
            formula.evaluate(&FormulaInputs::new()),
            Err(FormulaError::UnboundVariable(Variable::Kitchens))
        );
    }

    #[test]
    fn test_check_rejects_unordered_steps() {
        let formula = Formula::Stepped {
            variable: Variable::PlotArea,
            steps: vec![
                Step {
                    limit: 2000.0,
                    inclusive: false,
                    value: 1.0,
                },
                Step {
                    limit: 1000.0,
                    inclusive: false,
                    value: 2.0,
                },
            ],
            otherwise: 3.0,
        };

        assert_eq!(formula.check(), Err(FormulaError::UnorderedSteps));
        assert_eq!(bracket().check(), Ok(()));
    }

    #[test]
    fn test_deserialize_tagged_formula() {
        let json = r#"{"kind": "linear", "variable": "carpet_area", "coefficient": 0.4}"#;
        let formula: Formula = serde_json::from_str(json).unwrap();

        assert_eq!(
            formula,
            Formula::Linear {
                variable: Variable::CarpetArea,
                coefficient: 0.4,
                intercept: 0.0,
            }
        );
    }
}
