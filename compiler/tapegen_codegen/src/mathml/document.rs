//! The HTML document around the rendered statements.

use super::MathMl;
use crate::partition::Partitioner;

impl MathMl {
    /// Everything up to the opening of the algorithm container.
    pub(super) fn document_start(&self, out: &mut String) {
        let base = &self.options.base_name;
        let m = &self.markup;

        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{base}</title>\n"));
        out.push_str(&m.head_extra);
        if !m.style.is_empty() {
            out.push_str("<style>\n");
            out.push_str(&m.style);
            out.push_str("</style>\n");
        }
        if !m.javascript.is_empty() {
            out.push_str("<script type=\"text/javascript\">\n");
            out.push_str(&m.javascript);
            out.push_str("\n</script>\n");
        }
        out.push_str("</head>\n\n<body>\n");
        out.push_str(&format!(
            "<!-- source file for '{base}' (automatically generated by tapegen) -->\n"
        ));
        out.push_str("<div id='algorithm'>\n");
    }

    pub(super) fn document_end(&self, out: &mut String) {
        out.push_str("</div>\n</body>\n</html>");
    }

    /// Links from the main unit to each part, in order.
    pub(super) fn part_links(&self, out: &mut String, partitioner: &Partitioner) {
        for (i, part) in partitioner.parts().iter().enumerate() {
            let file = partitioner.file_name(part);
            out.push_str(&format!("<a href='{file}'>part {}</a><br/>", i + 1));
            out.push_str(&self.markup.endline);
        }
    }
}
