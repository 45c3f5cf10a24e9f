//! Defines a `CompactFactorGraph`, an in-memory factor graph laid out in flat arrays.

use factor::{Factor, FactorFunction, FactorIndex, VariableInFactor, Weight, WeightIndex};
use inference::InferenceResult;
use shared::SharedArray;
use util::{GibbsError, Result};
use variable::{DomainType, Variable, VariableIndex, VariableValue};
use super::FactorGraph;

use bidir_map::BidirMap;

/// A factor graph whose factors, predicates and adjacency live in flat arrays.
///
/// # Representation
/// Every `Factor` owns a contiguous run of the `vifs` array (its predicates), and every `Variable`
/// owns a contiguous run of the `adjacency` array (the ids of the `Factor`s it appears in). Both
/// runs are fixed when the graph is built.
pub struct CompactFactorGraph {

    /// The `Variable`s, indexed by id
    variables: Vec<Variable>,

    /// The `Factor`s, indexed by id
    factors: Vec<Factor>,

    /// The predicates of all `Factor`s
    vifs: Vec<VariableInFactor>,

    /// The incident `Factor`s of all `Variable`s
    adjacency: Vec<FactorIndex>,

    /// The declared `Weight`s, indexed by id
    weights: Vec<Weight>,

    /// Optional names of `Variable`s
    names: BidirMap<VariableIndex, String>

}


impl CompactFactorGraph {

    /// The `Weight`s declared with the graph
    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// The predicates of `factor`
    pub fn factor_variables(&self, factor: &Factor) -> &[VariableInFactor] {
        factor.variables(&self.vifs)
    }

    /// The `Factor`s incident to `variable`
    pub fn factors_of<'a>(&'a self, variable: &Variable) -> impl Iterator<Item = &'a Factor> + 'a {
        self.adjacency[variable.factor_range()].iter().map(move |&fid| &self.factors[fid])
    }

    /// Lookup a `Variable` in the graph based on the name
    pub fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.names.get_by_second(&String::from(name)).map(|&vid| &self.variables[vid])
    }

    /// Lookup a `Variable`'s name in the graph
    pub fn lookup_name(&self, var: &Variable) -> Option<&String> {
        self.names.get_by_first(&var.id())
    }
}


impl FactorGraph for CompactFactorGraph {

    fn variables(&self) -> &[Variable] {
        &self.variables
    }

    fn num_weights(&self) -> usize {
        self.weights.len()
    }

    fn potential(&self, variable: &Variable, proposal: VariableValue,
                 assignments: &SharedArray<VariableValue>, weights: &SharedArray<f64>) -> f64 {
        let vid = variable.id();
        self.factors_of(variable)
            .map(|f| weights.get(f.weight_id()) * f.value(&self.vifs, assignments, vid, proposal))
            .sum()
    }

    fn update_weight(&self, variable: &Variable, infrs: &InferenceResult, stepsize: f64) {
        let vid = variable.id();
        let evid = infrs.assignments_evid();
        let free = infrs.assignments_free();

        for factor in self.factors_of(variable) {
            let wid = factor.weight_id();
            if infrs.is_weight_fixed(wid) {
                continue;
            }

            // E[f | evidence] - E[f], each estimated from a single sample
            let gradient = factor.value(&self.vifs, evid, vid, evid.get(vid))
                         - factor.value(&self.vifs, free, vid, free.get(vid));
            infrs.update_weight(wid, stepsize, gradient);
        }
    }

}


/// An implementation of the [builder pattern] for creating a `CompactFactorGraph`.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
pub struct FactorGraphBuilder {

    /// The `Variable`s added to the graph
    variables: Vec<Variable>,

    /// The name <-> variable mapping
    names: BidirMap<VariableIndex, String>,

    /// The `Weight`s added to the graph
    weights: Vec<Weight>,

    /// The `Factor`s added to the graph, not yet laid out
    factors: Vec<(FactorFunction, WeightIndex, Vec<VariableInFactor>)>,

    /// The error state of the builder, if any
    err: Option<GibbsError>

}

impl FactorGraphBuilder {

    /// Construct a new `FactorGraphBuilder`
    pub fn new() -> FactorGraphBuilder {
        FactorGraphBuilder {
            variables: Vec::new(),
            names: BidirMap::new(),
            weights: Vec::new(),
            factors: Vec::new(),
            err: None
        }
    }


    /// Add a `Variable` to the graph. Ids must end up covering `0..n` exactly.
    pub fn with_variable(mut self, var: Variable) -> Self {
        self.variables.push(var);
        self
    }


    /// Add a `Variable` to the graph and give it a name
    pub fn with_named_variable(mut self, var: Variable, name: &str) -> Self {
        if self.err.is_some() {
            return self;
        }

        if self.names.get_by_second(&String::from(name)).is_some() {
            self.err = Some(GibbsError::DuplicateName(String::from(name)));
            return self;
        }

        self.names.insert(var.id(), String::from(name));
        self.with_variable(var)
    }


    /// Declare a `Weight`. Ids must end up covering `0..n` exactly.
    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weights.push(weight);
        self
    }


    /// Add a `Factor` to the graph.
    ///
    /// # Arguments
    /// * `function`: what the `Factor` computes over its predicates
    /// * `weight_id`: the `Weight` that scales the `Factor`
    /// * `vifs`: the predicates, in order; the last one is the head
    pub fn with_factor(mut self, function: FactorFunction, weight_id: WeightIndex,
                       vifs: Vec<VariableInFactor>) -> Self {
        if self.err.is_some() {
            return self;
        }

        if vifs.is_empty() {
            self.err = Some(GibbsError::EmptyFactor(self.factors.len()));
            return self;
        }

        self.factors.push((function, weight_id, vifs));
        self
    }


    /// Build the `CompactFactorGraph`, ensuring consistency of the `Variable`s, `Weight`s and
    /// `Factor`s
    ///
    /// # Errors
    /// * `GibbsError::DuplicateVariable` if a `Variable` id was added twice
    /// * `GibbsError::MissingVariable` if the `Variable` ids have a gap, or a `Factor` or name
    ///   refers to an undeclared `Variable`
    /// * `GibbsError::MissingWeight` if the `Weight` ids have a gap, or a `Factor` refers to an
    ///   undeclared `Weight`
    /// * `GibbsError::WeightMismatch` if a `Weight` id was declared twice
    /// * `GibbsError::InvalidDomain` if a `Variable` is inconsistent
    pub fn build(self) -> Result<CompactFactorGraph> {
        let FactorGraphBuilder { mut variables, names, mut weights, factors, err } = self;
        if let Some(e) = err {
            return Err(e);
        }

        ///////////////////////////////////////////////////////////////////////////////
        // Variables must be exactly 0..n
        variables.sort_by_key(|v| v.id());
        for (i, v) in variables.iter().enumerate() {
            if v.id() < i {
                return Err(GibbsError::DuplicateVariable(v.id()));
            } else if v.id() > i {
                return Err(GibbsError::MissingVariable(i));
            }
            v.validate()?;
        }

        for &vid in names.first_col() {
            if vid >= variables.len() {
                return Err(GibbsError::MissingVariable(vid));
            }
        }

        ///////////////////////////////////////////////////////////////////////////////
        // As must weights
        weights.sort_by_key(|w| w.id);
        for (i, w) in weights.iter().enumerate() {
            if w.id < i {
                return Err(GibbsError::WeightMismatch(format!("weight {} was declared twice", w.id)));
            } else if w.id > i {
                return Err(GibbsError::MissingWeight(i));
            }
        }

        ///////////////////////////////////////////////////////////////////////////////
        // Lay out the factors and their predicates
        let mut laid_out = Vec::with_capacity(factors.len());
        let mut vifs = Vec::new();
        let mut incident: Vec<Vec<FactorIndex>> = vec![Vec::new(); variables.len()];

        for (fid, (function, weight_id, predicates)) in factors.into_iter().enumerate() {
            if weight_id >= weights.len() {
                return Err(GibbsError::MissingWeight(weight_id));
            }

            let offset = vifs.len();
            for (position, mut vif) in predicates.into_iter().enumerate() {
                if vif.vid >= variables.len() {
                    return Err(GibbsError::MissingVariable(vif.vid));
                }

                // a variable may appear more than once in a factor, but is incident to it once
                if incident[vif.vid].last() != Some(&fid) {
                    incident[vif.vid].push(fid);
                }

                vif.position = position;
                vifs.push(vif);
            }

            laid_out.push(Factor::new(fid, function, weight_id, offset, vifs.len() - offset));
        }

        ///////////////////////////////////////////////////////////////////////////////
        // Adjacency and tally offsets
        let mut adjacency = Vec::with_capacity(vifs.len());
        let mut tally_offset = 0;
        for (var, fids) in variables.iter_mut().zip(incident.into_iter()) {
            let start = adjacency.len();
            adjacency.extend(fids);
            var.set_factor_range(start..adjacency.len());

            if var.domain_type() == DomainType::Multinomial {
                var.set_tally_offset(tally_offset);
                tally_offset += var.domain_size();
            }
        }

        Ok(CompactFactorGraph {
            variables,
            factors: laid_out,
            vifs,
            adjacency,
            weights,
            names
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    /// a -> b with a bias on a
    fn chain() -> CompactFactorGraph {
        FactorGraphBuilder::new()
            .with_named_variable(Variable::boolean(0), "a")
            .with_named_variable(Variable::boolean(1), "b")
            .with_weight(Weight::learnable(0, 0.5))
            .with_weight(Weight::fixed(1, 2.0))
            .with_factor(FactorFunction::IsTrue, 0, vec![VariableInFactor::boolean(0, true)])
            .with_factor(FactorFunction::Imply, 1, vec![
                VariableInFactor::boolean(0, true),
                VariableInFactor::boolean(1, true)
            ])
            .build()
            .unwrap()
    }

    #[test]
    fn layout() {
        let fg = chain();
        assert_eq!(fg.num_variables(), 2);
        assert_eq!(fg.num_weights(), 2);
        assert_eq!(fg.factors().len(), 2);

        let a = &fg.variables()[0];
        let b = &fg.variables()[1];
        let fa: Vec<FactorIndex> = fg.factors_of(a).map(|f| f.id()).collect();
        let fb: Vec<FactorIndex> = fg.factors_of(b).map(|f| f.id()).collect();
        assert_eq!(fa, vec![0, 1]);
        assert_eq!(fb, vec![1]);

        let imply = &fg.factors()[1];
        let positions: Vec<usize> = fg.factor_variables(imply).iter().map(|v| v.position).collect();
        assert_eq!(positions, vec![0, 1]);
    }

    #[test]
    fn names() {
        let fg = chain();
        assert_eq!(fg.lookup_variable("b").map(|v| v.id()), Some(1));
        assert!(fg.lookup_variable("c").is_none());
        assert_eq!(fg.lookup_name(&fg.variables()[0]), Some(&String::from("a")));
    }

    #[test]
    fn duplicate_name() {
        let r = FactorGraphBuilder::new()
            .with_named_variable(Variable::boolean(0), "a")
            .with_named_variable(Variable::boolean(1), "a")
            .build();
        match r {
            Err(GibbsError::DuplicateName(ref name)) if name == "a" => (),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("built an invalid graph")
        }
    }

    #[test]
    fn potential() {
        let fg = chain();
        let weights = SharedArray::from_slice(&[0.5, 2.0]);

        // a = 1, b = 0
        let assignments = SharedArray::from_slice(&[1usize, 0]);
        let a = &fg.variables()[0];
        let b = &fg.variables()[1];

        // b = 1 satisfies the implication, b = 0 violates it
        assert!((fg.potential(b, 1, &assignments, &weights) - 2.0).abs() < 1e-12);
        assert!((fg.potential(b, 0, &assignments, &weights) + 2.0).abs() < 1e-12);

        // a = 0 disables the implication and the bias
        assert!((fg.potential(a, 0, &assignments, &weights) - 0.0).abs() < 1e-12);
        assert!((fg.potential(a, 1, &assignments, &weights) - (0.5 - 2.0)).abs() < 1e-12);
    }

    #[test]
    fn tally_offsets() {
        let fg = FactorGraphBuilder::new()
            .with_variable(Variable::multinomial(0, 3))
            .with_variable(Variable::boolean(1))
            .with_variable(Variable::sparse_multinomial(2, 10, &[4, 8]))
            .with_variable(Variable::multinomial(3, 4))
            .build()
            .unwrap();

        let offsets: Vec<usize> = fg.variables().iter().map(|v| v.tally_offset()).collect();
        assert_eq!(offsets, vec![0, 0, 3, 5]);
        assert_eq!(fg.num_tallies(), 9);
    }

    #[test]
    fn variables_out_of_order() {
        let fg = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(1))
            .with_variable(Variable::boolean(0))
            .build()
            .unwrap();
        assert_eq!(fg.variables()[0].id(), 0);
        assert_eq!(fg.variables()[1].id(), 1);
    }

    #[test]
    fn duplicate_variable() {
        let r = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_variable(Variable::boolean(0))
            .build();
        match r {
            Err(GibbsError::DuplicateVariable(0)) => (),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("built an invalid graph")
        }
    }

    #[test]
    fn missing_variable() {
        let r = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_variable(Variable::boolean(2))
            .build();
        match r {
            Err(GibbsError::MissingVariable(1)) => (),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("built an invalid graph")
        }

        let r = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_weight(Weight::learnable(0, 0.0))
            .with_factor(FactorFunction::And, 0, vec![
                VariableInFactor::boolean(0, true),
                VariableInFactor::boolean(5, true)
            ])
            .build();
        match r {
            Err(GibbsError::MissingVariable(5)) => (),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("built an invalid graph")
        }
    }

    #[test]
    fn missing_weight() {
        let r = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_factor(FactorFunction::IsTrue, 0, vec![VariableInFactor::boolean(0, true)])
            .build();
        match r {
            Err(GibbsError::MissingWeight(0)) => (),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("built an invalid graph")
        }

        let r = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_weight(Weight::learnable(1, 0.0))
            .build();
        match r {
            Err(GibbsError::MissingWeight(0)) => (),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("built an invalid graph")
        }
    }

    #[test]
    fn empty_factor() {
        let r = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_weight(Weight::learnable(0, 0.0))
            .with_factor(FactorFunction::Or, 0, vec![])
            .build();
        match r {
            Err(GibbsError::EmptyFactor(0)) => (),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("built an invalid graph")
        }
    }

    #[test]
    fn invalid_domain() {
        let r = FactorGraphBuilder::new()
            .with_variable(Variable::multinomial(0, 3).evidence(3))
            .build();
        assert!(r.is_err());
    }

    #[test]
    fn repeated_variable_in_factor() {
        let fg = FactorGraphBuilder::new()
            .with_variable(Variable::boolean(0))
            .with_weight(Weight::learnable(0, 1.0))
            .with_factor(FactorFunction::Equal, 0, vec![
                VariableInFactor::boolean(0, true),
                VariableInFactor::boolean(0, false)
            ])
            .build()
            .unwrap();

        assert_eq!(fg.factors_of(&fg.variables()[0]).count(), 1);
    }
}
