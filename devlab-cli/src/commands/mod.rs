//! Command group implementations.

pub mod blueprint;
pub mod devbox;
pub mod object;

use devlab_core::ListQuery;

/// Print a labeled resource as pretty JSON, e.g. `devbox={ ... }`.
pub(crate) fn print_json<T: serde::Serialize>(label: &str, value: &T) -> anyhow::Result<()> {
    println!("{label}={}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Shared `--limit` / `--starting-after` handling for list commands.
pub(crate) fn list_query(limit: Option<u32>, starting_after: Option<String>) -> ListQuery {
    let mut query = ListQuery::new();
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    if let Some(cursor) = starting_after {
        query = query.starting_after(cursor);
    }
    query
}

/// Parse `KEY=VALUE` pairs for repeatable `--env-vars` flags.
pub(crate) fn parse_env_var(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("invalid env var '{s}' (expected KEY=VALUE)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_parsing() {
        assert_eq!(
            parse_env_var("KEY=value").unwrap(),
            ("KEY".to_string(), "value".to_string())
        );
        // Values may contain '='.
        assert_eq!(
            parse_env_var("KEY=a=b").unwrap(),
            ("KEY".to_string(), "a=b".to_string())
        );
        assert!(parse_env_var("notakv").is_err());
    }

    #[test]
    fn list_query_flattens_to_params() {
        let params = list_query(Some(10), Some("dbx_9".into())).to_params();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].0, "limit");
        assert_eq!(params[1].1, "dbx_9");
    }
}
