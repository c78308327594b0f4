pub mod arm;
pub mod condition;
pub mod fault;

#[allow(clippy::cast_possible_truncation)]
pub mod flags;

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::module_name_repetitions)]
pub mod machine;
pub mod psr;
pub mod registers;
