//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// An unset variable without a default is an error naming `field`.
/// Bare `$VAR` is left alone, so values without `${` are returned unchanged.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let lookup = |var: &str| match std::env::var(var) {
        Ok(found) => Ok(Some(found)),
        Err(_) => Err(var.to_owned()),
    };
    shellexpand::env_with_context(value, lookup)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("CLASSGRAPH_TEST_HOST", "uml.example.org");
        }
        let result = expand_env("https://${CLASSGRAPH_TEST_HOST}/plantuml", "render.server_url");
        assert_eq!(result.unwrap(), "https://uml.example.org/plantuml");
        unsafe {
            std::env::remove_var("CLASSGRAPH_TEST_HOST");
        }
    }

    #[test]
    fn test_expand_default() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("CLASSGRAPH_TEST_UNSET");
        }
        let result = expand_env("${CLASSGRAPH_TEST_UNSET:-http://localhost:8080}", "render.server_url");
        assert_eq!(result.unwrap(), "http://localhost:8080");
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("CLASSGRAPH_TEST_MISSING");
        }
        let err = expand_env("${CLASSGRAPH_TEST_MISSING}", "render.server_url").unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        let message = err.to_string();
        assert!(message.contains("CLASSGRAPH_TEST_MISSING"));
        assert!(message.contains("render.server_url"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        assert_eq!(expand_env("https://example.com/$path", "f").unwrap(), "https://example.com/$path");
    }
}
