//! XMLUnit - compare XML documents and classify their differences
//!
//! This library walks two XML documents, a *control* and a *test*, side by
//! side and reports every place where they differ. Each difference is a
//! [`Comparison`] of a given [`ComparisonType`] whose outcome is graded as
//! [`ComparisonResult::Equal`], `Similar`, `Different` or `Critical`.
//!
//! # Overview
//!
//! - [`DiffBuilder`] is the usual entry point: it loads two [`Source`]s,
//!   optionally normalises whitespace and comments, and collects the
//!   differences into a [`Diff`].
//! - [`DomDifferenceEngine`] is the configurable engine underneath. Child
//!   nodes are paired by a [`NodeMatcher`], the engine's raw outcomes are
//!   re-graded by a [`DifferenceEvaluator`], and every comparison is
//!   announced to registered [`ComparisonListener`]s.
//! - [`legacy`] holds an older streaming comparison over two node readers
//!   that stops at the first major difference.
//!
//! # Example
//!
//! ```
//! use xmlunit::{ComparisonResult, DiffBuilder, StringSource};
//!
//! let diff = DiffBuilder::compare(StringSource::new("<a><b>x</b></a>"))
//!     .with_test(StringSource::new("<a><b><![CDATA[x]]></b></a>"))
//!     .build()
//!     .unwrap();
//! assert_eq!(diff.result(), ComparisonResult::Similar);
//! ```

pub mod comparison;
pub mod diff;
pub mod engine;
pub mod error;
pub mod evaluators;
pub mod legacy;
pub mod matcher;
pub mod node;
pub mod selectors;
pub mod source;
pub mod xml;
pub mod xpath;

// Re-export commonly used types
pub use comparison::{Comparison, ComparisonResult, ComparisonType, ComparisonValue, Detail};
pub use diff::{Diff, DiffBuilder, Difference, Normalization};
pub use engine::{ComparisonListener, DomDifferenceEngine};
pub use error::{Error, Result};
pub use evaluators::DifferenceEvaluator;
pub use matcher::{DefaultNodeMatcher, NodeMatcher, NodePair};
pub use node::{DocumentInfo, NamespaceContext, Node, NodeContent, NodeRef, NodeType, QName};
pub use selectors::ElementSelector;
pub use source::{
    CommentLessSource, FileSource, NodeSource, Source, StringSource, WhitespaceStrippedSource,
};
pub use xml::{parse_file, parse_str, XmlNodeReader, XmlNodeType, XmlParser};
pub use xpath::XPathContext;
