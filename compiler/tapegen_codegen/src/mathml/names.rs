//! Default variable names of the MathML emitter.

use tapegen_ir::IndexPattern;

use super::index::pattern_markup;
use crate::names::NameGenerator;

/// Names variables as subscripted letters: `x_j`, `y_i`, `v_k`, and array
/// slices `a_{o..e}` / `s_{o..e}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MathMlNameGenerator {
    independent: String,
    dependent: String,
    temporary: String,
    array: String,
    sparse_array: String,
    min_temporary_id: usize,
}

impl Default for MathMlNameGenerator {
    fn default() -> Self {
        Self {
            independent: "x".to_owned(),
            dependent: "y".to_owned(),
            temporary: "v".to_owned(),
            array: "a".to_owned(),
            sparse_array: "s".to_owned(),
            min_temporary_id: 0,
        }
    }
}

impl MathMlNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default generator with other letters for independents, dependents
    /// and temporaries.
    pub fn with_letters(
        independent: impl Into<String>,
        dependent: impl Into<String>,
        temporary: impl Into<String>,
    ) -> Self {
        Self {
            independent: independent.into(),
            dependent: dependent.into(),
            temporary: temporary.into(),
            ..Default::default()
        }
    }
}

fn subscript(base: &str, index: usize) -> String {
    format!("<msub><mi>{base}</mi><mn>{index}</mn></msub>")
}

fn slice(base: &str, variable_id: usize, length: usize) -> String {
    let first = variable_id.saturating_sub(1);
    let last = first + length.saturating_sub(1);
    format!("<msub><mi>{base}</mi><mrow><mn>{first}</mn><mo>..</mo><mn>{last}</mn></mrow></msub>")
}

impl NameGenerator for MathMlNameGenerator {
    fn begin_run(&mut self, min_temporary_id: usize) {
        self.min_temporary_id = min_temporary_id;
    }

    fn independent(&mut self, position: usize) -> String {
        subscript(&self.independent, position)
    }

    fn dependent(&mut self, position: usize) -> String {
        subscript(&self.dependent, position)
    }

    fn indexed_dependent(&mut self, _: usize, pattern: &IndexPattern, index_name: &str) -> String {
        format!(
            "<msub><mi>{}</mi><mrow>{}</mrow></msub>",
            self.dependent,
            pattern_markup(pattern.strategy(), index_name)
        )
    }

    fn indexed_independent(
        &mut self,
        _: usize,
        pattern: &IndexPattern,
        index_name: &str,
    ) -> String {
        format!(
            "<msub><mi>{}</mi><mrow>{}</mrow></msub>",
            self.independent,
            pattern_markup(pattern.strategy(), index_name)
        )
    }

    fn temporary(&mut self, variable_id: usize) -> String {
        subscript(
            &self.temporary,
            variable_id.saturating_sub(self.min_temporary_id),
        )
    }

    fn temporary_array(&mut self, variable_id: usize, length: usize) -> String {
        slice(&self.array, variable_id, length)
    }

    fn temporary_sparse_array(&mut self, variable_id: usize, length: usize) -> String {
        slice(&self.sparse_array, variable_id, length)
    }

    fn array_element(&mut self, slot: usize) -> String {
        subscript(&self.array, slot)
    }

    fn sparse_array_element(&mut self, slot: usize) -> String {
        subscript(&self.sparse_array, slot)
    }
}
