//! Source generation for recorded operation graphs.
//!
//! A graph recorder hands a pass an [`OperationGraph`](tapegen_ir::OperationGraph)
//! with variable ids assigned, the independent and dependent vectors and a
//! topological visiting order. A [`Language`] turns that into source text.
//! This crate ships the MathML language ([`MathMl`]), which produces an HTML
//! document of MathML equations.
//!
//! # Key Types
//!
//! - [`Language`]: variable policies plus the generation pass
//! - [`GenerationInput`]: everything a pass reads
//! - [`NameGenerator`]: naming convention per variable role
//! - [`RenderContext`]: state of one pass (output, loops, array caches)
//! - [`Partitioner`]: splitting long output into units
//!
//! # Example
//!
//! ```
//! use tapegen_codegen::{assign_variable_ids, GenerationInput, Language, MathMl, MathMlNameGenerator};
//! use tapegen_ir::{Argument, OpKind, OperationGraph};
//!
//! let mut graph = OperationGraph::new();
//! let x = graph.add_leaf(OpKind::Inv);
//! let y = graph.add_unary(OpKind::Sin, x);
//!
//! let language = MathMl::default();
//! let independents = [x];
//! let dependents = [Argument::Node(y)];
//! let order = [y];
//! let min_temp = assign_variable_ids(&mut graph, &language, &independents, &dependents, &order);
//!
//! let input = GenerationInput::new(&graph, &independents, &dependents, min_temp, &order);
//! let html = language.generate(&input, &mut MathMlNameGenerator::new(), None)?;
//! assert!(html.contains("<mi>sin</mi>"));
//! # Ok::<(), tapegen_codegen::CodegenError>(())
//! ```
//!
//! # Debugging
//!
//! Enable tracing with environment variables:
//! - `RUST_LOG=tapegen_codegen=debug` - one event per pass and per unit
//! - `RUST_LOG=tapegen_codegen=trace` - every rendered node and name
//! - `RUST_LOG=tapegen_codegen::names=trace` - name resolution only

mod config;
mod context;
mod error;
mod language;
mod literal;
pub mod mathml;
mod names;
mod partition;
mod promote;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use config::{
    GenerationOptions, MathMlMarkup, DEFAULT_BASE_NAME, DEFAULT_PARAMETER_PRECISION,
    DEFAULT_STYLE,
};
pub use context::{ArraySpace, RenderContext};
pub use error::{CodegenError, ConfigError, Result};
pub use language::{GenerationInput, Language};
pub use literal::{format_general, split_exponent, SplitLiteral};
pub use mathml::{MathMl, MathMlNameGenerator};
pub use names::{index_name, node_pattern, tmp_declaration, NameGenerator, NameResolver};
pub use partition::Partitioner;
pub use promote::assign_variable_ids;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=tapegen_codegen=debug` or `RUST_LOG=tapegen_codegen=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
