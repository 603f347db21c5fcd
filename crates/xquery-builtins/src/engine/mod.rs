pub mod call;
pub mod diagnostics;
pub mod functions;
pub mod registry;
pub mod runtime;
pub mod types;
