//! Declaration module.
//!
//! Holds the registry of deployable functions and the scanner that turns a
//! list of requested modules into declared metadata keyed by
//! `(module, function)`.

mod types;
mod registry;
mod scanner;

pub use types::{FunctionDeclaration, FunctionKey};
pub use registry::{DeclarationRegistry, RegisteredModule};
pub use scanner::DeclarationScanner;
