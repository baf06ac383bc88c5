//! Explicit pipeline context.
//!
//! Threads the analysis artifacts through the stages as plain immutable
//! values: document -> parsed rules -> coverage selection -> synthesized
//! subset document -> event scopes -> trace -> LTS. Every stage is a pure
//! function over what came before; nothing is read back from disk between
//! stages.

use crate::bounds::BoundEnv;
use crate::coverage::{
    find_rules_with_usages, group_by_response, mutually_exclusive_groups, shared_response_groups,
    UsageQuery,
};
use crate::error::{Diagnostic, Error};
use crate::rules::measures::{parse_definitions, Definitions};
use crate::rules::parser::{parse_rules, ParsedRules};
use crate::scope::{build_scopes, ScopeMap};
use crate::synth::{synthesize, verify_round_trip, Selection};
use crate::trace::parse_trace;
use crate::translator::{translate, Translation};
use tracing::info;

/// One analysis session over a rule document.
#[derive(Debug, Clone)]
pub struct Pipeline {
    document: String,
    rules: ParsedRules,
    definitions: Definitions,
    bounds: BoundEnv,
}

impl Pipeline {
    /// Parse the document once; definition-block constants layer over the
    /// default bound environment.
    pub fn new(document: impl Into<String>) -> Self {
        let document = document.into();
        let rules = parse_rules(&document);
        let definitions = parse_definitions(&document);
        let bounds = BoundEnv::default().with_constants(&definitions.constants);
        info!(
            rules = rules.rules.len(),
            measures = definitions.measures.len(),
            skipped = rules.diagnostics.len(),
            "Analyzed rule document"
        );
        Self {
            document,
            rules,
            definitions,
            bounds,
        }
    }

    /// Replace the base bound environment. Document constants still win.
    #[must_use]
    pub fn with_bounds(mut self, bounds: BoundEnv) -> Self {
        self.bounds = bounds.with_constants(&self.definitions.constants);
        self
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn rules(&self) -> &ParsedRules {
        &self.rules
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    pub fn bounds(&self) -> &BoundEnv {
        &self.bounds
    }

    /// Parse diagnostics accumulated so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.rules.diagnostics
    }

    /// Selection of every response shared by more than one rule.
    pub fn shared_response_selection(&self) -> Selection {
        let groups = shared_response_groups(&group_by_response(&self.rules.rules));
        Selection::SharedResponses(groups)
    }

    /// Selection witnessing the declared mutually-exclusive response pairs.
    pub fn exclusive_selection(&self, pairs: &[(String, String)]) -> Selection {
        let groups = group_by_response(&self.rules.rules);
        Selection::MutuallyExclusive(mutually_exclusive_groups(&groups, pairs))
    }

    /// Selection of rules sharing the searched measure usages. Rules keep
    /// document order.
    pub fn measure_selection(&self, terms: &[String]) -> Selection {
        let queries: Vec<UsageQuery> = terms.iter().map(|t| UsageQuery::parse(t)).collect();
        let matching = find_rules_with_usages(&self.rules.rules, &queries);
        let rules = self
            .rules
            .rules
            .iter()
            .map(|r| r.name.clone())
            .filter(|name| matching.contains_key(name))
            .collect();
        Selection::SharedMeasures {
            terms: terms.to_vec(),
            rules,
        }
    }

    /// Synthesize the subset document for a selection and verify the
    /// round-trip contract before handing it out.
    pub fn synthesize(&self, selection: &Selection) -> Result<String, Error> {
        let document = synthesize(selection, &self.rules.full_texts, &self.document)?;
        verify_round_trip(&self.rules, &document)?;
        Ok(document)
    }

    /// Event scopes for a synthesized subset document. Built from the same
    /// rule subset the trace generator runs on.
    pub fn scopes_for(&self, subset_document: &str) -> ScopeMap {
        build_scopes(&parse_rules(subset_document).rules)
    }

    /// Translate a raw trace against the given scopes, folding trace-parse
    /// findings into the translation diagnostics.
    pub fn translate(&self, scopes: &ScopeMap, trace_text: &str) -> Translation {
        let trace = parse_trace(trace_text);
        let mut translation = translate(&trace.entries, scopes, &self.bounds);
        let mut diagnostics = trace.diagnostics;
        diagnostics.append(&mut translation.diagnostics);
        translation.diagnostics = diagnostics;
        translation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
def_start
measure a: boolean
measure age: numeric
constant legalAge = 16
def_end

rule_start
R1 when MeetingUser and {a} then Inform
R2 when MeetingUser and {age} < legalAge then Inform
rule_end";

    #[test]
    fn document_constants_layer_over_defaults() {
        let pipeline = Pipeline::new(DOC);
        assert_eq!(pipeline.bounds().resolve("legalAge"), Some(16));
    }

    #[test]
    fn with_bounds_keeps_document_constants() {
        let pipeline = Pipeline::new(DOC).with_bounds(BoundEnv::empty().with_bound("other", 3));
        assert_eq!(pipeline.bounds().resolve("legalAge"), Some(16));
        assert_eq!(pipeline.bounds().resolve("other"), Some(3));
    }

    #[test]
    fn stages_compose_end_to_end() {
        let pipeline = Pipeline::new(DOC);
        let selection = pipeline.shared_response_selection();
        let subset = pipeline.synthesize(&selection).unwrap();
        let scopes = pipeline.scopes_for(&subset);

        let trace = "\
at time 0: Measure(a=true, age=12)
at time 0: MeetingUser()";
        let translation = pipeline.translate(&scopes, trace);
        assert_eq!(
            translation.lts.to_aut(),
            "des (0, 1, 2)\n(0, \"MeetingUser(a=true, age=12, time=0)\", 1)"
        );
        assert!(translation.diagnostics.is_empty());
    }

    #[test]
    fn measure_selection_keeps_document_order() {
        let pipeline = Pipeline::new(DOC);
        let Selection::SharedMeasures { rules, .. } =
            pipeline.measure_selection(&["a".into(), "age<legalAge".into()])
        else {
            panic!("expected shared-measures selection");
        };
        assert_eq!(rules, vec!["R1", "R2"]);
    }
}
