use std::env::var;

/// Read an ENV var, falling back to a default
///
/// Empty values count as unset
pub fn env_var_or_else<F>(var_name: &str, or_else: F) -> String
where
    F: FnOnce() -> String,
{
    match var(var_name) {
        Ok(value) if !value.is_empty() => value,
        _ => or_else(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_or_else_falls_back() {
        let value = env_var_or_else("SWITCHLY_DOES_NOT_EXIST", || "fallback".to_string());

        assert_eq!("fallback", value);
    }
}
