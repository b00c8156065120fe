// vsmodelgen — VeriStand model boilerplate generator
//
// Library root. Phases run in order: lexer/parser → layout → codegen, with
// build_files for the optional makefile and build script; pipeline ties them
// together.

pub mod build_files;
pub mod codegen;
pub mod diag;
pub mod layout;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod pipeline;
