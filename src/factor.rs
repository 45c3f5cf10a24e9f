///! Definition of the factor module
///!
///! A `Factor` is a weighted logical (or counting) function over a handful of `Variable`s. The
///! log-potential a `Factor` contributes to an assignment is `weight * value(assignment)`.

use shared::SharedArray;
use variable::{VariableIndex, VariableValue};

/// Index of a `Factor` in its factor graph
pub type FactorIndex = usize;

/// Index of a `Weight` in its factor graph
pub type WeightIndex = usize;


/// A weight shared by one or more `Factor`s
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weight {
    /// The id of the `Weight`
    pub id: WeightIndex,

    /// The initial value
    pub value: f64,

    /// `true` if learning must leave the `Weight` alone
    pub is_fixed: bool
}

impl Weight {

    pub fn new(id: WeightIndex, value: f64, is_fixed: bool) -> Weight {
        Weight { id, value, is_fixed }
    }

    /// A learnable `Weight`
    pub fn learnable(id: WeightIndex, value: f64) -> Weight {
        Weight::new(id, value, false)
    }

    /// A `Weight` that learning never changes
    pub fn fixed(id: WeightIndex, value: f64) -> Weight {
        Weight::new(id, value, true)
    }

}


/// The role a `Variable` plays in a `Factor`.
///
/// Each `VariableInFactor` is a predicate over its variable's value: it is satisfied when the
/// value equals `equal_to`, or when it does not and the predicate is negated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariableInFactor {
    /// The `Variable` the predicate reads
    pub vid: VariableIndex,

    /// Position of the predicate in its `Factor`; the last position is the head
    pub position: usize,

    /// `false` negates the predicate
    pub is_positive: bool,

    /// The value that satisfies a positive predicate
    pub equal_to: VariableValue
}

impl VariableInFactor {

    /// A predicate on a boolean variable: `var` (or `!var` when `is_positive` is `false`)
    pub fn boolean(vid: VariableIndex, is_positive: bool) -> Self {
        VariableInFactor { vid, position: 0, is_positive, equal_to: 1 }
    }

    /// A predicate on a multinomial variable: `var == value`
    pub fn equals(vid: VariableIndex, value: VariableValue) -> Self {
        VariableInFactor { vid, position: 0, is_positive: true, equal_to: value }
    }

    /// Check the predicate against a value
    #[inline]
    pub fn is_satisfied(&self, value: VariableValue) -> bool {
        (value == self.equal_to) == self.is_positive
    }
}


/// The function a `Factor` computes over the satisfaction of its predicates.
///
/// Where a function distinguishes a head, it is the last predicate and the others form the body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FactorFunction {

    /// `1` if every predicate holds, `0` otherwise. With one predicate this is a bias.
    IsTrue,

    /// `1` if every predicate holds, `-1` otherwise
    And,

    /// `1` if any predicate holds, `-1` otherwise
    Or,

    /// `1` if all predicates agree, `-1` otherwise
    Equal,

    /// `body => head`: `0` if the body is false, `1` if the head holds, `-1` otherwise
    Imply,

    /// `body => head` as a Markov logic clause: `1` if the implication holds, `0` otherwise
    ImplyMln,

    /// The number of body predicates `b` for which `b => head` holds
    Linear,

    /// `log2(1 + n)` where `n` is the `Linear` count
    Ratio,

    /// `1` if the `Linear` count is positive, `0` otherwise
    Logical,

    /// `1` if every predicate holds, `0` otherwise. Used to build features over multinomial
    /// values.
    AndCategorical

}


#[derive(Clone, Debug)]
pub struct Factor {
    /// The id of the `Factor`
    id: FactorIndex,

    function: FactorFunction,

    /// The `Weight` scaling this `Factor`
    weight_id: WeightIndex,

    /// Start of this factor's predicates in the graph's `VariableInFactor` array
    vif_offset: usize,

    /// Number of predicates
    n_variables: usize
}


impl Factor {

    /// Create a new `Factor` whose predicates are stored at
    /// `vifs[vif_offset..vif_offset + n_variables]` of its graph
    pub fn new(id: FactorIndex, function: FactorFunction, weight_id: WeightIndex,
               vif_offset: usize, n_variables: usize) -> Factor {
        Factor { id, function, weight_id, vif_offset, n_variables }
    }

    pub fn id(&self) -> FactorIndex {
        self.id
    }

    pub fn function(&self) -> FactorFunction {
        self.function
    }

    pub fn weight_id(&self) -> WeightIndex {
        self.weight_id
    }

    pub fn n_variables(&self) -> usize {
        self.n_variables
    }

    /// This factor's predicates out of the graph's `VariableInFactor` array
    pub fn variables<'a>(&self, vifs: &'a [VariableInFactor]) -> &'a [VariableInFactor] {
        &vifs[self.vif_offset..self.vif_offset + self.n_variables]
    }

    /// Evaluate the `Factor` against `assignments`, pretending variable `vid` holds `proposal`.
    ///
    /// The result is unweighted; multiply by the `Factor`'s weight to get its log-potential.
    pub fn value(&self, vifs: &[VariableInFactor], assignments: &SharedArray<VariableValue>,
                 vid: VariableIndex, proposal: VariableValue) -> f64 {
        let vifs = self.variables(vifs);
        let satisfied = |vif: &VariableInFactor| {
            let value = if vif.vid == vid { proposal } else { assignments.get(vif.vid) };
            vif.is_satisfied(value)
        };

        evaluate(self.function, vifs, satisfied)
    }
}


/// Evaluate `function` over `vifs`, with `satisfied` deciding each predicate.
fn evaluate<F>(function: FactorFunction, vifs: &[VariableInFactor], satisfied: F) -> f64
    where F: Fn(&VariableInFactor) -> bool
{
    let sign = |b: bool| if b { 1.0 } else { -1.0 };
    let indicator = |b: bool| if b { 1.0 } else { 0.0 };

    match function {
        FactorFunction::IsTrue | FactorFunction::AndCategorical => {
            indicator(vifs.iter().all(|v| satisfied(v)))
        },
        FactorFunction::And => sign(vifs.iter().all(|v| satisfied(v))),
        FactorFunction::Or => sign(vifs.iter().any(|v| satisfied(v))),
        FactorFunction::Equal => {
            match vifs.split_first() {
                Some((first, rest)) => {
                    let s = satisfied(first);
                    sign(rest.iter().all(|v| satisfied(v) == s))
                },
                None => 1.0
            }
        },
        FactorFunction::Imply | FactorFunction::ImplyMln => {
            let (head, body) = match vifs.split_last() {
                Some(split) => split,
                None => return 0.0
            };
            let body_holds = body.iter().all(|v| satisfied(v));
            let head_holds = satisfied(head);

            match (function, body_holds, head_holds) {
                (FactorFunction::Imply, false, _) => 0.0,
                (FactorFunction::Imply, true, h) => sign(h),
                (_, false, _) => 1.0,
                (_, true, h) => indicator(h)
            }
        },
        FactorFunction::Linear | FactorFunction::Ratio | FactorFunction::Logical => {
            let (head, body) = match vifs.split_last() {
                Some(split) => split,
                None => return 0.0
            };
            let head_holds = satisfied(head);

            // a lone predicate counts itself
            let count = if body.is_empty() {
                indicator(head_holds)
            } else {
                body.iter().filter(|v| head_holds || ! satisfied(v)).count() as f64
            };

            match function {
                FactorFunction::Linear => count,
                FactorFunction::Ratio => (1.0 + count).log2(),
                _ => indicator(count > 0.0)
            }
        }
    }
}


#[cfg(test)]
mod tests {

    use super::*;

    /// Evaluate `function` over boolean predicates with the given truth values
    fn truth(function: FactorFunction, values: &[bool]) -> f64 {
        let vifs: Vec<VariableInFactor> = (0..values.len())
            .map(|i| VariableInFactor { vid: i, position: i, is_positive: true, equal_to: 1 })
            .collect();
        evaluate(function, &vifs, |v| values[v.vid])
    }

    #[test]
    fn predicates() {
        let pos = VariableInFactor::boolean(0, true);
        assert!(pos.is_satisfied(1));
        assert!(! pos.is_satisfied(0));

        let neg = VariableInFactor::boolean(0, false);
        assert!(neg.is_satisfied(0));
        assert!(! neg.is_satisfied(1));

        let eq = VariableInFactor::equals(0, 3);
        assert!(eq.is_satisfied(3));
        assert!(! eq.is_satisfied(2));
    }

    #[test]
    fn is_true() {
        assert_eq!(truth(FactorFunction::IsTrue, &[true]), 1.0);
        assert_eq!(truth(FactorFunction::IsTrue, &[false]), 0.0);
        assert_eq!(truth(FactorFunction::AndCategorical, &[true, true]), 1.0);
        assert_eq!(truth(FactorFunction::AndCategorical, &[true, false]), 0.0);
    }

    #[test]
    fn and_or_equal() {
        assert_eq!(truth(FactorFunction::And, &[true, true]), 1.0);
        assert_eq!(truth(FactorFunction::And, &[true, false]), -1.0);
        assert_eq!(truth(FactorFunction::Or, &[false, true]), 1.0);
        assert_eq!(truth(FactorFunction::Or, &[false, false]), -1.0);
        assert_eq!(truth(FactorFunction::Equal, &[false, false]), 1.0);
        assert_eq!(truth(FactorFunction::Equal, &[true, true, true]), 1.0);
        assert_eq!(truth(FactorFunction::Equal, &[true, false]), -1.0);
    }

    #[test]
    fn imply() {
        // body false
        assert_eq!(truth(FactorFunction::Imply, &[false, true]), 0.0);
        assert_eq!(truth(FactorFunction::Imply, &[false, false]), 0.0);
        // body true
        assert_eq!(truth(FactorFunction::Imply, &[true, true]), 1.0);
        assert_eq!(truth(FactorFunction::Imply, &[true, false]), -1.0);

        assert_eq!(truth(FactorFunction::ImplyMln, &[false, false]), 1.0);
        assert_eq!(truth(FactorFunction::ImplyMln, &[true, true]), 1.0);
        assert_eq!(truth(FactorFunction::ImplyMln, &[true, false]), 0.0);
    }

    #[test]
    fn counting() {
        // two of three body predicates are false, so they imply the false head
        assert_eq!(truth(FactorFunction::Linear, &[true, false, false, false]), 2.0);
        assert_eq!(truth(FactorFunction::Linear, &[true, false, false, true]), 3.0);
        assert_eq!(truth(FactorFunction::Linear, &[true]), 1.0);
        assert_eq!(truth(FactorFunction::Linear, &[false]), 0.0);

        assert!((truth(FactorFunction::Ratio, &[true, false, false, true]) - 2.0).abs() < 1e-12);
        assert_eq!(truth(FactorFunction::Ratio, &[false]), 0.0);

        assert_eq!(truth(FactorFunction::Logical, &[true, true, false]), 0.0);
        assert_eq!(truth(FactorFunction::Logical, &[true, false, false]), 1.0);
    }

    #[test]
    fn value_substitutes_proposal() {
        let vifs = vec![
            VariableInFactor { vid: 0, position: 0, is_positive: true, equal_to: 1 },
            VariableInFactor { vid: 1, position: 1, is_positive: true, equal_to: 1 },
        ];
        let factor = Factor::new(0, FactorFunction::And, 0, 0, 2);
        let assignments = SharedArray::from_slice(&[1usize, 0]);

        assert_eq!(factor.value(&vifs, &assignments, 1, 0), -1.0);
        assert_eq!(factor.value(&vifs, &assignments, 1, 1), 1.0);
        // the assignment itself is untouched
        assert_eq!(assignments.get(1), 0);
    }

    #[test]
    fn multinomial_feature() {
        let vifs = vec![VariableInFactor::equals(4, 2)];
        let factor = Factor::new(0, FactorFunction::AndCategorical, 0, 0, 1);
        let assignments = SharedArray::new(5, 0usize);

        for value in 0..4 {
            let expected = if value == 2 { 1.0 } else { 0.0 };
            assert_eq!(factor.value(&vifs, &assignments, 4, value), expected);
        }
    }
}
