//! Provides an example of how to use gibbs-engine to estimate marginals of a small factor graph.
//!
//! The graph is a handful of rules about a student: difficult courses and low intelligence lead
//! to poor grades, and poor grades to weak letters. A path to a TOML configuration may be given as
//! the first argument.
//!
//!   RUST_LOG=debug cargo run --example inference -- config.toml

extern crate gibbs_engine;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;

use gibbs_engine as g;
use g::FactorGraph;
use tracing_subscriber::EnvFilter;

use std::env;
use std::path::Path;

const DIFFICULTY: usize = 0;
const INTELLIGENCE: usize = 1;
const GRADE: usize = 2;
const SAT: usize = 3;
const LETTER: usize = 4;

fn main() -> g::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match env::args().nth(1) {
        Some(path) => g::Config::load(Path::new(&path))?,
        None => g::Config::default()
    };

    /////////////////////////////////////////////////////
    // Step 1: Build the factor graph
    let fg = build_graph()?;
    let weights = fg.weights().to_vec();

    /////////////////////////////////////////////////////
    // Step 2: Build a sampler with two threads
    let mut sampler = g::GibbsSampler::new(fg, &weights, 2, 0, &config.sampler)?;

    /////////////////////////////////////////////////////
    // Step 3: Burn in and estimate
    let marginals = g::McmcEngine::new(&mut sampler, config.inference.burn_in, config.inference.n_epochs)?
        .infer()?;

    for (v, marginal) in sampler.graph().variables().iter().zip(marginals.iter()) {
        let name = sampler.graph().lookup_name(v).cloned().unwrap_or_default();
        match marginal {
            &Some(g::Marginal::Boolean(p)) => println!("P({} = 1) = {:.3}", name, p),
            &Some(g::Marginal::Multinomial(ref p)) => println!("P({}) = {:.3}", name, p),
            &None => println!("{} = {} (evidence)", name, v.evidence_value())
        }
    }

    info!(epochs = config.inference.n_epochs, "Inference complete");
    Ok(())
}

fn build_graph() -> g::Result<g::CompactFactorGraph> {
    use g::VariableInFactor as Vif;

    g::FactorGraphBuilder::new()
        .with_named_variable(g::Variable::boolean(DIFFICULTY), "difficulty")
        .with_named_variable(g::Variable::boolean(INTELLIGENCE), "intelligence")
        .with_named_variable(g::Variable::multinomial(GRADE, 3), "grade")
        .with_named_variable(g::Variable::boolean(SAT).evidence(1), "sat")
        .with_named_variable(g::Variable::boolean(LETTER).evidence(1), "letter")

        // priors
        .with_weight(g::Weight::fixed(0, -0.4))
        .with_weight(g::Weight::fixed(1, -0.8))
        .with_factor(g::FactorFunction::IsTrue, 0, vec![Vif::boolean(DIFFICULTY, true)])
        .with_factor(g::FactorFunction::IsTrue, 1, vec![Vif::boolean(INTELLIGENCE, true)])

        // intelligence and easy courses give good grades
        .with_weight(g::Weight::fixed(2, 1.5))
        .with_weight(g::Weight::fixed(3, 1.2))
        .with_factor(g::FactorFunction::AndCategorical, 2, vec![
            Vif::boolean(INTELLIGENCE, true),
            Vif::equals(GRADE, 0)
        ])
        .with_factor(g::FactorFunction::AndCategorical, 3, vec![
            Vif::boolean(DIFFICULTY, true),
            Vif::equals(GRADE, 2)
        ])

        // intelligence shows in the SAT
        .with_weight(g::Weight::fixed(4, 2.0))
        .with_factor(g::FactorFunction::Imply, 4, vec![
            Vif::boolean(INTELLIGENCE, true),
            Vif::boolean(SAT, true)
        ])
        .with_factor(g::FactorFunction::Imply, 4, vec![
            Vif::boolean(SAT, true),
            Vif::boolean(INTELLIGENCE, true)
        ])

        // good grades earn strong letters
        .with_weight(g::Weight::fixed(5, 1.8))
        .with_factor(g::FactorFunction::AndCategorical, 5, vec![
            Vif::equals(GRADE, 0),
            Vif::boolean(LETTER, true)
        ])
        .build()
}
