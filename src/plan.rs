//! Build plans: shell-level build instructions attached to resources.
//!
//! ```turtle
//! <http://example.org/paper> a semp:Resource ;
//!     semp:buildVar [ semp:name "SRC" ; semp:value "paper.tex" ] ;
//!     semp:build ( "pdflatex $SRC" "bibtex paper" ) .
//! ```
//!
//! plans as
//!
//! ```text
//! SRC=paper.tex
//! pdflatex $SRC
//! bibtex paper
//! ```
//!
//! Variable assignments come first, then the items of the `semp:build`
//! collection in order. Plans are printed, never executed.

use crate::graph::{Term, TripleSource};
use crate::resource;
use crate::vocab;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("{resource}: build variable {variable} needs exactly one semp:{property}, found {count}")]
    Variable {
        resource: String,
        variable: String,
        property: &'static str,
        count: usize,
    },
    #[error("{resource}: expected at most one semp:build collection, found {count}")]
    Build { resource: String, count: usize },
}

/// The instructions of one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePlan {
    pub uri: String,
    /// `(name, value)` pairs from `semp:buildVar`.
    pub variables: Vec<(String, String)>,
    /// Items of the `semp:build` collection.
    pub steps: Vec<String>,
}

impl ResourcePlan {
    pub fn read(conf: &dyn TripleSource, uri: &str) -> Result<Self, PlanError> {
        let node = Term::iri(uri);

        let variables = conf
            .objects(&node, vocab::BUILD_VAR)
            .iter()
            .map(|var| {
                let name = single(conf, uri, var, vocab::NAME, "name")?;
                let value = single(conf, uri, var, vocab::VALUE, "value")?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>, PlanError>>()?;

        let steps = match conf.objects(&node, vocab::BUILD).as_slice() {
            [] => Vec::new(),
            [head] => conf
                .list(head)
                .iter()
                .map(|item| item.value().to_string())
                .collect(),
            several => {
                return Err(PlanError::Build {
                    resource: uri.to_string(),
                    count: several.len(),
                });
            }
        };

        Ok(Self {
            uri: uri.to_string(),
            variables,
            steps,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.steps.is_empty()
    }

    /// `NAME=value` lines, then one line per build step.
    pub fn lines(&self) -> Vec<String> {
        self.variables
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .chain(self.steps.iter().cloned())
            .collect()
    }
}

fn single(
    conf: &dyn TripleSource,
    resource: &str,
    var: &Term,
    predicate: &str,
    property: &'static str,
) -> Result<String, PlanError> {
    match conf.objects(var, predicate).as_slice() {
        [one] => Ok(one.value().to_string()),
        found => Err(PlanError::Variable {
            resource: resource.to_string(),
            variable: var.to_string(),
            property,
            count: found.len(),
        }),
    }
}

/// Plans of every `semp:Resource` that has build instructions, in resource
/// order.
pub fn plan(conf: &dyn TripleSource) -> Result<Vec<ResourcePlan>, PlanError> {
    let mut plans = Vec::new();
    for uri in resource::resources(conf) {
        let plan = ResourcePlan::read(conf, &uri)?;
        if !plan.is_empty() {
            plans.push(plan);
        }
    }
    Ok(plans)
}
