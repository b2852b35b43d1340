//! Builder-style front end over [`DomDifferenceEngine`].
//!
//! ```
//! use xmlunit::{DiffBuilder, StringSource};
//!
//! let diff = DiffBuilder::compare(StringSource::new("<a><b>1</b></a>"))
//!     .with_test(StringSource::new("<a><b>2</b></a>"))
//!     .build()
//!     .unwrap();
//! assert!(diff.has_differences());
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use tracing::debug;

use crate::comparison::{Comparison, ComparisonResult};
use crate::engine::DomDifferenceEngine;
use crate::error::{Error, Result};
use crate::evaluators::{self, DifferenceEvaluator};
use crate::matcher::{NodeMatcher, NodePair};
use crate::node::NodeRef;
use crate::source::{CommentLessSource, Source, WhitespaceStrippedSource};

bitflags! {
    /// Normalisations applied to both documents before comparing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Normalization: u8 {
        /// Trim text and drop whitespace-only text nodes.
        const WHITESPACE = 1;
        /// Drop comments.
        const COMMENTS = 2;
    }
}

/// A comparison whose evaluated result made it into a [`Diff`].
#[derive(Debug, Clone)]
pub struct Difference {
    pub comparison: Comparison,
    pub result: ComparisonResult,
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.comparison, self.result)
    }
}

/// Outcome of a [`DiffBuilder`] run.
#[derive(Debug, Clone)]
pub struct Diff {
    differences: Vec<Difference>,
    result: ComparisonResult,
}

impl Diff {
    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }

    /// The reported differences in the order the engine found them.
    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    /// The most severe result of all comparisons.
    pub fn result(&self) -> ComparisonResult {
        self.result
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.differences.is_empty() {
            return write!(f, "[identical]");
        }
        for (i, difference) in self.differences.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", difference)?;
        }
        Ok(())
    }
}

/// Configures and runs a comparison.
pub struct DiffBuilder {
    control: Box<dyn Source>,
    test: Option<Box<dyn Source>>,
    normalization: Normalization,
    /// Report similar differences too.
    identical: bool,
    stop_on_first_difference: bool,
    node_matcher: Option<Rc<dyn NodeMatcher>>,
    difference_evaluator: Option<Rc<dyn DifferenceEvaluator>>,
    namespace_context: HashMap<String, String>,
}

impl fmt::Debug for DiffBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffBuilder")
            .field("normalization", &self.normalization)
            .field("identical", &self.identical)
            .field("stop_on_first_difference", &self.stop_on_first_difference)
            .field("namespace_context", &self.namespace_context)
            .finish_non_exhaustive()
    }
}

impl DiffBuilder {
    /// Starts a comparison against `control`.
    pub fn compare<S>(control: S) -> Self
    where
        S: Source + 'static,
    {
        DiffBuilder {
            control: Box::new(control),
            test: None,
            normalization: Normalization::empty(),
            identical: true,
            stop_on_first_difference: false,
            node_matcher: None,
            difference_evaluator: None,
            namespace_context: HashMap::new(),
        }
    }

    pub fn with_test<S>(mut self, test: S) -> Self
    where
        S: Source + 'static,
    {
        self.test = Some(Box::new(test));
        self
    }

    /// Only report differences evaluated as [`ComparisonResult::Different`]
    /// or worse.
    pub fn check_for_similar(mut self) -> Self {
        self.identical = false;
        self
    }

    /// Report every difference, similar ones included. This is the default.
    pub fn check_for_identical(mut self) -> Self {
        self.identical = true;
        self
    }

    pub fn ignore_whitespace(mut self) -> Self {
        self.normalization |= Normalization::WHITESPACE;
        self
    }

    pub fn ignore_comments(mut self) -> Self {
        self.normalization |= Normalization::COMMENTS;
        self
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Stop descending at the first difference that is not similar.
    pub fn stop_on_first_difference(mut self) -> Self {
        self.stop_on_first_difference = true;
        self
    }

    pub fn with_node_matcher<M>(mut self, matcher: M) -> Self
    where
        M: NodeMatcher + 'static,
    {
        self.node_matcher = Some(Rc::new(matcher));
        self
    }

    pub fn with_difference_evaluator<E>(mut self, evaluator: E) -> Self
    where
        E: DifferenceEvaluator + 'static,
    {
        self.difference_evaluator = Some(Rc::new(evaluator));
        self
    }

    /// Namespace URI -> prefix mapping used in reported XPaths.
    pub fn with_namespace_context(mut self, uri_to_prefix: HashMap<String, String>) -> Self {
        self.namespace_context = uri_to_prefix;
        self
    }

    /// Runs the comparison.
    ///
    /// Fails with [`Error::InvalidArgument`] when no test source was given,
    /// or with the loader's error when a document cannot be read.
    pub fn build(self) -> Result<Diff> {
        let DiffBuilder {
            control,
            test,
            normalization,
            identical,
            stop_on_first_difference,
            node_matcher,
            difference_evaluator,
            namespace_context,
        } = self;
        let test = test.ok_or(Error::InvalidArgument("test"))?;
        let control = normalized(control, normalization);
        let test = normalized(test, normalization);

        let mut engine = DomDifferenceEngine::new();
        if let Some(matcher) = node_matcher {
            engine.set_node_matcher(move |c: &[NodeRef], t: &[NodeRef]| -> Vec<NodePair> {
                matcher.match_nodes(c, t)
            });
        }
        let evaluator: Rc<dyn DifferenceEvaluator> =
            difference_evaluator.unwrap_or_else(|| Rc::new(evaluators::default));
        let configured = move |c: &Comparison, r: ComparisonResult| evaluator.evaluate(c, r);
        if stop_on_first_difference {
            engine.set_difference_evaluator(evaluators::stop_when_different(configured));
        } else {
            engine.set_difference_evaluator(configured);
        }
        engine.set_namespace_context(namespace_context);

        let collected: Rc<RefCell<Vec<Difference>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = collected.clone();
        engine.add_difference_listener(move |c: &Comparison, r: ComparisonResult| {
            if identical || r != ComparisonResult::Similar {
                sink.borrow_mut().push(Difference {
                    comparison: c.clone(),
                    result: r,
                });
            }
        });

        let result = engine.compare(&*control, &*test)?;
        let differences = collected.take();
        debug!(differences = differences.len(), %result, "diff built");
        Ok(Diff {
            differences,
            result,
        })
    }
}

fn normalized(source: Box<dyn Source>, normalization: Normalization) -> Box<dyn Source> {
    let mut source = source;
    if normalization.contains(Normalization::COMMENTS) {
        source = Box::new(CommentLessSource::new(source));
    }
    if normalization.contains(Normalization::WHITESPACE) {
        source = Box::new(WhitespaceStrippedSource::new(source));
    }
    source
}
