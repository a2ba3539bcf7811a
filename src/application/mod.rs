pub mod services;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;
