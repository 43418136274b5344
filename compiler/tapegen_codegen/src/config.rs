//! Generation options.
//!
//! Options are immutable for the duration of a pass. They are validated
//! once at entry, before anything is rendered.

use crate::error::ConfigError;

/// Significant digits of an `f64` (`DBL_DIG`).
pub const DEFAULT_PARAMETER_PRECISION: usize = f64::DIGITS as usize;

/// Base name of generated units when none is configured.
pub const DEFAULT_BASE_NAME: &str = "algorithm";

/// Options shared by every target language.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationOptions {
    /// Maximum significant digits of numeric literals.
    pub parameter_precision: usize,

    /// Skip dependents that are the constant zero.
    pub ignore_zero_dependent_assign: bool,

    /// Statement budget per output unit. 0 disables partitioning.
    pub max_assignments_per_unit: usize,

    /// Name of the main unit; parts are named `<base>__part_<n>`.
    pub base_name: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            parameter_precision: DEFAULT_PARAMETER_PRECISION,
            ignore_zero_dependent_assign: false,
            max_assignments_per_unit: 0,
            base_name: DEFAULT_BASE_NAME.to_owned(),
        }
    }
}

impl GenerationOptions {
    /// Default options with the given literal precision.
    pub fn with_parameter_precision(parameter_precision: usize) -> Self {
        Self {
            parameter_precision,
            ..Default::default()
        }
    }

    /// Default options with partitioning enabled.
    pub fn with_max_assignments_per_unit(max_assignments_per_unit: usize) -> Self {
        Self {
            max_assignments_per_unit,
            ..Default::default()
        }
    }

    /// Default options with another unit base name.
    pub fn with_base_name(base_name: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            ..Default::default()
        }
    }

    /// Whether output is split into several units.
    #[inline]
    pub fn partitioning(&self) -> bool {
        self.max_assignments_per_unit > 0
    }

    /// Check the options against the destination supplied by the caller.
    pub fn validate(&self, has_destination: bool) -> Result<(), ConfigError> {
        if self.parameter_precision == 0 {
            return Err(ConfigError::ZeroPrecision);
        }
        if self.base_name.is_empty() {
            return Err(ConfigError::EmptyBaseName);
        }
        if self.partitioning() && !has_destination {
            return Err(ConfigError::PartitionWithoutDestination);
        }
        Ok(())
    }
}

/// Structural markup fragments of the MathML emitter.
///
/// Every fragment is injected verbatim, so a caller can retarget the
/// document (e.g. plain `<p>` blocks instead of `<div>` boxes).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct MathMlMarkup {
    pub equation_start: String,
    pub equation_end: String,
    pub for_start: String,
    pub for_end: String,
    pub for_body_start: String,
    pub for_body_end: String,
    pub if_start: String,
    pub if_end: String,
    pub else_if_start: String,
    pub else_if_end: String,
    pub else_start: String,
    pub else_end: String,
    pub cond_body_start: String,
    pub cond_body_end: String,
    pub assign: String,
    pub add_assign: String,
    pub endline: String,

    /// CSS placed in the document head.
    pub style: String,
    /// Script placed in the document head.
    pub javascript: String,
    /// Extra markup placed in the document head.
    pub head_extra: String,
}

/// Style sheet of the default markup.
pub const DEFAULT_STYLE: &str = ".loop{}\n\
    .loopBody{padding-left: 2em;}\n\
    .condIf{}\n\
    .condElseIf{}\n\
    .condElse{}\n\
    .condBody{padding-left: 2em;}\n\
    .dep{color:#600;}\n\
    .indep{color:#060;}\n\
    .tmp{color:#006;}\n";

impl Default for MathMlMarkup {
    fn default() -> Self {
        Self {
            equation_start: "<math display=\"block\">".to_owned(),
            equation_end: "</math>".to_owned(),
            for_start: "<div class='loop'>".to_owned(),
            for_end: "</div>".to_owned(),
            for_body_start: "<div class='loopBody'>".to_owned(),
            for_body_end: "</div>".to_owned(),
            if_start: "<div class='condIf'>".to_owned(),
            if_end: "</div>".to_owned(),
            else_if_start: "<div class='condElseIf'>".to_owned(),
            else_if_end: "</div>".to_owned(),
            else_start: "<div class='condElse'>".to_owned(),
            else_end: "</div>".to_owned(),
            cond_body_start: "<div class='condBody'>".to_owned(),
            cond_body_end: "</div>".to_owned(),
            assign: "<mo>=</mo>".to_owned(),
            add_assign: "<mo>+=</mo>".to_owned(),
            endline: "\n".to_owned(),
            style: DEFAULT_STYLE.to_owned(),
            javascript: String::new(),
            head_extra: String::new(),
        }
    }
}

impl MathMlMarkup {
    /// Default markup with other equation delimiters.
    pub fn with_equation(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            equation_start: start.into(),
            equation_end: end.into(),
            ..Default::default()
        }
    }

    /// Default markup without a style sheet.
    pub fn unstyled() -> Self {
        Self {
            style: String::new(),
            ..Default::default()
        }
    }
}
