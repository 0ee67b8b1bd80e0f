//! Ranked selector rules
//!
//! Every heuristic in the extractor is an ordered list of rules evaluated
//! against a region of the document; the first rule that produces a match
//! wins. Patterns are compiled independently so a bad one only disables
//! itself.

use scraper::{ElementRef, Selector};
use std::fmt;
use tracing::{debug, warn};

/// A compiled CSS selector together with its source pattern
#[derive(Debug, Clone)]
pub struct SelectorRule {
    pattern: String,
    selector: Selector,
}

impl SelectorRule {
    /// Compiles a pattern, logging and returning `None` when it is invalid
    pub fn compile(pattern: &str) -> Option<Self> {
        match Selector::parse(pattern) {
            Ok(selector) => Some(Self {
                pattern: pattern.to_string(),
                selector,
            }),
            Err(e) => {
                warn!("Disabling invalid selector '{}': {:?}", pattern, e);
                None
            }
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// All matching descendants of `scope`, in document order
    pub fn select<'a, 'b>(&'b self, scope: ElementRef<'a>) -> scraper::element_ref::Select<'a, 'b> {
        scope.select(&self.selector)
    }
}

/// Ordered selector patterns where the first one that matches wins
#[derive(Debug, Clone, Default)]
pub struct SelectorChain {
    rules: Vec<SelectorRule>,
}

impl SelectorChain {
    /// Compiles every pattern; invalid ones are dropped from the chain
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            rules: patterns
                .iter()
                .filter_map(|p| SelectorRule::compile(p.as_ref()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First element matched by the highest ranked rule that matches at all
    pub fn first_in<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.rules.iter().find_map(|rule| rule.select(scope).next())
    }

    /// First value produced by `f`, trying rules in rank order and each
    /// rule's matches in document order
    pub fn find_map<'a, T, F>(&self, scope: ElementRef<'a>, mut f: F) -> Option<T>
    where
        F: FnMut(ElementRef<'a>) -> Option<T>,
    {
        self.rules
            .iter()
            .find_map(|rule| rule.select(scope).find_map(&mut f))
    }

    /// All elements of the highest ranked rule with at least one match
    pub fn first_group<'a>(&self, scope: ElementRef<'a>) -> Option<(&SelectorRule, Vec<ElementRef<'a>>)> {
        self.rules.iter().find_map(|rule| {
            let matched: Vec<_> = rule.select(scope).collect();
            (!matched.is_empty()).then_some((rule, matched))
        })
    }
}

type RuleFn<T> = Box<dyn Fn(ElementRef<'_>) -> Option<T> + Send + Sync>;

/// Named rules of arbitrary shape, evaluated in insertion order
pub struct RankedRules<T> {
    rules: Vec<(&'static str, RuleFn<T>)>,
}

impl<T> RankedRules<T> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn push<F>(&mut self, name: &'static str, rule: F)
    where
        F: Fn(ElementRef<'_>) -> Option<T> + Send + Sync + 'static,
    {
        self.rules.push((name, Box::new(rule)));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Result of the first rule that matches `region`
    pub fn evaluate(&self, region: ElementRef<'_>) -> Option<T> {
        self.rules.iter().find_map(|(name, rule)| {
            let found = rule(region);
            if found.is_some() {
                debug!(rule = *name, "Rule matched");
            }
            found
        })
    }
}

impl<T> Default for RankedRules<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RankedRules<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|(name, _)| name))
            .finish()
    }
}
