//! Entry-point errors.
//!
//! Verdicts inside the analysis are lattice values, never `Result`s;
//! only misuse of the public entry points is an error.

#[derive(Debug, thiserror::Error)]
pub enum EscapeError {
    /// `analyse_function` was called on a declaration-only function.
    #[error("function `{0}` is a declaration and has no body to analyse")]
    Declaration(String),
}
