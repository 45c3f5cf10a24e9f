//! Provides an example of how to use gibbs-engine to learn weights from evidence, then infer with
//! them.
//!
//! Every person in a small population either smokes or not, and smoking is tied to cancer through
//! one shared rule weight. Cancer is observed for most of the population; the rest is inferred
//! from the learned weights.
//!
//!   RUST_LOG=gibbs_engine=debug cargo run --example learning

extern crate gibbs_engine;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;

use gibbs_engine as g;
use g::{Estimator, FactorGraph};
use tracing_subscriber::EnvFilter;

const PEOPLE: usize = 40;

/// People past this index have unknown cancer status
const LABELED: usize = 30;

fn main() -> g::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = g::Config::from_toml_str(r#"
        [sampler]
        seed = 11

        [learning]
        n_epochs = 300
        stepsize = 0.02
        decay = 0.99
        regularization = "l2"
        reg_param = 0.01

        [inference]
        burn_in = 100
        n_epochs = 2000
    "#)?;

    /////////////////////////////////////////////////////
    // Step 1: Build the factor graph
    let fg = build_graph()?;
    let weights = fg.weights().to_vec();
    let mut sampler = g::GibbsSampler::new(fg, &weights, 4, 0, &config.sampler)?;

    /////////////////////////////////////////////////////
    // Step 2: Learn the weights from the labeled people
    let mut estimator = g::SgdEstimator::new(config.learning.clone())?;
    let learned = estimator.estimate(&mut sampler)?;
    println!("bias(cancer) = {:.3}", learned[0]);
    println!("smokes => cancer = {:.3}", learned[1]);

    /////////////////////////////////////////////////////
    // Step 3: Infer cancer for the unlabeled people
    let marginals = g::McmcEngine::new(&mut sampler, config.inference.burn_in, config.inference.n_epochs)?
        .infer()?;

    for person in LABELED..PEOPLE {
        if let Some(g::Marginal::Boolean(p)) = marginals[cancer(person)] {
            let smoker = sampler.graph().variables()[smokes(person)].evidence_value();
            println!("person {:2} (smokes = {}): P(cancer) = {:.3}", person, smoker, p);
        }
    }

    info!("Done");
    Ok(())
}

fn smokes(person: usize) -> usize {
    2 * person
}

fn cancer(person: usize) -> usize {
    2 * person + 1
}

fn build_graph() -> g::Result<g::CompactFactorGraph> {
    use g::VariableInFactor as Vif;

    let mut builder = g::FactorGraphBuilder::new()
        .with_weight(g::Weight::learnable(0, 0.0))
        .with_weight(g::Weight::learnable(1, 0.0));

    for person in 0..PEOPLE {
        // every third person smokes; smokers mostly have cancer, non-smokers mostly do not
        let does_smoke = person % 3 == 0;
        let has_cancer = if does_smoke { person % 6 != 3 } else { person % 7 == 0 };

        let cancer_var = g::Variable::boolean(cancer(person));
        let cancer_var = if person < LABELED { cancer_var.evidence(has_cancer as usize) } else { cancer_var };

        builder = builder
            .with_variable(g::Variable::boolean(smokes(person)).observation(does_smoke as usize))
            .with_variable(cancer_var)
            .with_factor(g::FactorFunction::IsTrue, 0, vec![Vif::boolean(cancer(person), true)])
            .with_factor(g::FactorFunction::Imply, 1, vec![
                Vif::boolean(smokes(person), true),
                Vif::boolean(cancer(person), true)
            ]);
    }

    builder.build()
}
