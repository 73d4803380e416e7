//! Pipeline tests with in-process collaborators.

mod doubles;
