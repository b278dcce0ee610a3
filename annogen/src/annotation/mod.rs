//! Directive discovery on declarations and fields.
//!
//! A directive is a doc comment line on a declaration:
//!
//! ```text
//! /// @api path=/items/:id/ method=GET
//! pub fn get_item(ctx: &Context, id: String) -> Result<Item, Error> { .. }
//! ```
//!
//! Fields carry tag strings on a doc line of their own:
//!
//! ```text
//! /// @tag ent:"id,form" default:"10"
//! pub limit: i32,
//! ```

mod params;
mod scanner;
mod symbol;
mod tag;

pub use params::Params;
pub use scanner::{AnnotatedNode, AnnotationDirective, doc_lines, scan};
pub use symbol::Symbol;
pub use tag::{FieldTags, TAG_MARKER};
