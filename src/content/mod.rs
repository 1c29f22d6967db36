//! Content-stream parsing, serialization and validation.

pub mod graphics_state;
pub mod lexer;
pub mod object_parser;
pub mod operators;
pub mod parser;
pub mod registry;
pub mod serializer;
pub mod validator;

pub use graphics_state::{GraphicsState, GraphicsStateStack, Matrix};
pub use operators::{ImageData, ImageInvocation, OperationKind, PdfOperation, TextShow};
pub use parser::ContentParser;
pub use serializer::serialize_operations;
pub use validator::validate;
