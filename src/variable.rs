//! Definition of the variable module
//!
//! A `Variable` is a discrete random variable in a factor graph. `Variable`s are identified by a
//! dense integer id and carry the metadata the samplers need: the kind of domain, whether they
//! are evidence, and where their aggregates live in the tally array.

use util::{GibbsError, Result};

use indexmap::IndexSet;

use std::ops::Range;

/// Index of a `Variable` in its factor graph
pub type VariableIndex = usize;

/// A value assigned to a `Variable`
pub type VariableValue = usize;


/// The kind of values a `Variable` ranges over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DomainType {

    /// A binary variable - can take on the values `0` and `1`
    Boolean,

    /// A categorical variable over `0..cardinality`, or over an explicit subset of it
    Multinomial,

    /// A real-valued variable. These may appear in a factor graph but cannot be Gibbs sampled.
    Continuous

}

impl DomainType {

    /// Check if the samplers know how to draw a value for this kind of `Variable`
    pub fn is_sampleable(&self) -> bool {
        match *self {
            DomainType::Boolean | DomainType::Multinomial => true,
            DomainType::Continuous => false
        }
    }

}


#[derive(Clone, Debug)]
pub struct Variable {
    /// The id of the `Variable`
    id: VariableIndex,

    domain_type: DomainType,

    cardinality: usize,

    /// `true` if the value is fixed by the data
    is_evidence: bool,

    /// `true` if the value is fixed by the data and the `Variable` should never be resampled,
    /// even when sampling evidence
    is_observation: bool,

    /// The clamped value, meaningful only for evidence
    evidence_value: VariableValue,

    /// The explicit set of values for a sparse multinomial. The position of a value in the set is
    /// its dense index.
    domain: Option<IndexSet<VariableValue>>,

    /// Start of this variable's cells in the multinomial tally array
    tally_offset: usize,

    /// Range of this variable's incident factors in the graph's adjacency array
    factors: Range<usize>
}


impl Variable {

    /// Construct a new boolean `Variable`
    pub fn boolean(id: VariableIndex) -> Variable {
        Variable::with_domain(id, DomainType::Boolean, 2, None)
    }

    /// Construct a new multinomial `Variable` with values in `0..cardinality`
    pub fn multinomial(id: VariableIndex, cardinality: usize) -> Variable {
        Variable::with_domain(id, DomainType::Multinomial, cardinality, None)
    }

    /// Construct a new multinomial `Variable` that may only take the given values. Values are
    /// enumerated in the order given; duplicates are ignored.
    pub fn sparse_multinomial(id: VariableIndex, cardinality: usize, values: &[VariableValue]) -> Variable {
        let domain = values.iter().cloned().collect();
        Variable::with_domain(id, DomainType::Multinomial, cardinality, Some(domain))
    }

    /// Construct a new continuous `Variable`
    pub fn continuous(id: VariableIndex) -> Variable {
        Variable::with_domain(id, DomainType::Continuous, 0, None)
    }

    fn with_domain(id: VariableIndex, domain_type: DomainType, cardinality: usize,
                   domain: Option<IndexSet<VariableValue>>) -> Variable {
        Variable {
            id,
            domain_type,
            cardinality,
            is_evidence: false,
            is_observation: false,
            evidence_value: 0,
            domain,
            tally_offset: 0,
            factors: 0..0
        }
    }

    /// Mark the `Variable` as evidence, clamped to `value`
    pub fn evidence(mut self, value: VariableValue) -> Variable {
        self.is_evidence = true;
        self.evidence_value = value;
        self
    }

    /// Mark the `Variable` as an observation. Observations are evidence that is never resampled.
    pub fn observation(mut self, value: VariableValue) -> Variable {
        self.is_observation = true;
        self.evidence(value)
    }

    pub fn id(&self) -> VariableIndex {
        self.id
    }

    pub fn domain_type(&self) -> DomainType {
        self.domain_type
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn is_evidence(&self) -> bool {
        self.is_evidence
    }

    pub fn is_observation(&self) -> bool {
        self.is_observation
    }

    pub fn evidence_value(&self) -> VariableValue {
        self.evidence_value
    }

    /// The explicit domain of a sparse multinomial, if any
    pub fn sparse_domain(&self) -> Option<&IndexSet<VariableValue>> {
        self.domain.as_ref()
    }

    pub fn tally_offset(&self) -> usize {
        self.tally_offset
    }

    /// The range of this `Variable`'s incident factors in the graph's adjacency array
    pub fn factor_range(&self) -> Range<usize> {
        self.factors.clone()
    }

    /// The number of values this `Variable` can actually take
    pub fn domain_size(&self) -> usize {
        match self.domain {
            Some(ref values) => values.len(),
            None => self.cardinality
        }
    }

    /// Enumerate the `(value, dense index)` pairs of the domain
    pub fn domain_values(&self) -> Domain<'_> {
        match self.domain {
            Some(ref values) => Domain::Sparse(values.iter().enumerate()),
            None => Domain::Dense(0..self.cardinality)
        }
    }

    /// The dense index of `value`, or `None` if it is outside of the domain
    pub fn domain_index(&self, value: VariableValue) -> Option<usize> {
        match self.domain {
            Some(ref values) => values.get_index_of(&value),
            None if value < self.cardinality => Some(value),
            None => None
        }
    }

    /// The value at dense index `index`
    pub fn domain_value(&self, index: usize) -> Option<VariableValue> {
        match self.domain {
            Some(ref values) => values.get_index(index).cloned(),
            None if index < self.cardinality => Some(index),
            None => None
        }
    }

    /// Check that the `Variable` is internally consistent: sparse domains are non-empty and lie
    /// within the cardinality, and evidence is clamped to a value in the domain.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| GibbsError::InvalidDomain { vid: self.id, reason: String::from(reason) };

        match self.domain_type {
            DomainType::Boolean if self.cardinality != 2 => {
                return Err(invalid("boolean variables have cardinality 2"));
            },
            DomainType::Boolean if self.domain.is_some() => {
                return Err(invalid("boolean variables cannot have a sparse domain"));
            },
            DomainType::Multinomial if self.cardinality == 0 => {
                return Err(invalid("multinomial variables need at least one value"));
            },
            DomainType::Continuous => return Ok(()),
            _ => ()
        }

        if let Some(ref values) = self.domain {
            if values.is_empty() {
                return Err(invalid("sparse domain is empty"));
            }
            if values.iter().any(|&v| v >= self.cardinality) {
                return Err(invalid("sparse domain value exceeds the cardinality"));
            }
        }

        if self.is_evidence && self.domain_index(self.evidence_value).is_none() {
            return Err(invalid("evidence value is outside of the domain"));
        }

        Ok(())
    }

    pub(crate) fn set_tally_offset(&mut self, offset: usize) {
        self.tally_offset = offset;
    }

    pub(crate) fn set_factor_range(&mut self, factors: Range<usize>) {
        self.factors = factors;
    }
}


/// The domain of a `Variable` as a sequence of `(value, dense index)` pairs.
///
/// Dense domains count through `0..cardinality`; sparse domains walk their value set in
/// insertion order. Either way the sequence is finite and the same on every call.
pub enum Domain<'a> {
    Dense(Range<usize>),
    Sparse(::std::iter::Enumerate<::indexmap::set::Iter<'a, VariableValue>>)
}

impl<'a> Iterator for Domain<'a> {

    type Item = (VariableValue, usize);

    fn next(&mut self) -> Option<Self::Item> {
        match *self {
            Domain::Dense(ref mut range) => range.next().map(|i| (i, i)),
            Domain::Sparse(ref mut values) => values.next().map(|(i, &v)| (v, i))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match *self {
            Domain::Dense(ref range) => range.size_hint(),
            Domain::Sparse(ref values) => values.size_hint()
        }
    }

}
