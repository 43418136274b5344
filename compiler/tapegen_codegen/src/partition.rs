//! Splitting long output into bounded units.
//!
//! The pass reports how many statements each node produced. Once the
//! budget is reached the buffered body becomes a unit of its own, but
//! only between statements that are outside every loop, so a loop body
//! never spans two units.

use std::collections::BTreeMap;

use crate::names::NameGenerator;

/// Tracks the statement budget and the units produced so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partitioner {
    budget: usize,
    count: usize,
    base_name: String,
    extension: &'static str,
    /// Part names in the order they were produced.
    parts: Vec<String>,
    units: BTreeMap<String, String>,
}

impl Partitioner {
    /// A `budget` of 0 never splits.
    pub fn new(budget: usize, base_name: impl Into<String>, extension: &'static str) -> Self {
        Self {
            budget,
            count: 0,
            base_name: base_name.into(),
            extension,
            parts: Vec::new(),
            units: BTreeMap::new(),
        }
    }

    /// Count statements emitted since the last split.
    pub fn record(&mut self, statements: u32) {
        self.count += statements as usize;
    }

    /// Statements emitted since the last split.
    pub fn pending(&self) -> usize {
        self.count
    }

    /// Whether the buffered body should become a unit now.
    pub fn should_split(&self, loops_open: bool) -> bool {
        self.budget > 0 && self.count >= self.budget && !loops_open
    }

    /// Store `body` as the next part, wrapped in the generator's hooks.
    ///
    /// Returns the part name (without extension).
    pub fn split(&mut self, body: &str, names: &mut dyn NameGenerator) -> &str {
        let name = format!("{}__part_{}", self.base_name, self.parts.len() + 1);
        let mut unit = String::with_capacity(body.len());
        names.prepare_custom_function_variables(&mut unit);
        unit.push_str(body);
        names.finalize_custom_function_variables(&mut unit);

        tracing::debug!(unit = %name, statements = self.count, "flushed output unit");
        self.units.insert(self.file_name(&name), unit);
        self.count = 0;
        self.parts.push(name);
        self.parts.last().map_or("", String::as_str)
    }

    /// Whether any part was produced.
    pub fn has_split(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Part names in order.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// `<name>.<extension>`
    pub fn file_name(&self, name: &str) -> String {
        format!("{name}.{}", self.extension)
    }

    /// File name of the main unit.
    pub fn main_file_name(&self) -> String {
        self.file_name(&self.base_name)
    }

    /// All parts plus `main` under the main file name.
    pub fn into_units(mut self, main: String) -> BTreeMap<String, String> {
        let key = self.main_file_name();
        self.units.insert(key, main);
        self.units
    }
}
