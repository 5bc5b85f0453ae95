pub mod guard;
pub mod text;

#[cfg(test)]
mod utils_test;
