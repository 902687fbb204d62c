use anyhow::{anyhow, bail, Context as _};
use std::{fs, path::Path};

/// Exports every key of `.env.toml` (relative to the working directory) as an
/// environment variable, so that `envy` can pick it up when building `Config`.
pub fn load_dotenv() -> anyhow::Result<()> {
    load_dotenv_from(Path::new("./.env.toml"))
}

pub fn load_dotenv_from(path: &Path) -> anyhow::Result<()> {
    let contents = fs::read_to_string(path)
        .map_err(|_| anyhow!("no env file found at {}", path.display()))?;
    for (key, value) in parse_dotenv(&contents)? {
        std::env::set_var(key, value);
    }
    Ok(())
}

fn parse_dotenv(contents: &str) -> anyhow::Result<Vec<(String, String)>> {
    let env: toml::map::Map<String, toml::Value> =
        toml::de::from_str(contents).context("invalid env file")?;

    let mut vars = Vec::with_capacity(env.len());
    for (key, value) in env {
        let value = match value {
            toml::Value::String(value) => value,
            toml::Value::Integer(value) => value.to_string(),
            toml::Value::Float(value) => value.to_string(),
            toml::Value::Boolean(value) => value.to_string(),
            _ => bail!("unsupported TOML value in env file for key {}", key),
        };
        vars.push((key, value));
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotenv() {
        let vars = parse_dotenv(
            r#"
            HTTP_PORT = 8080
            DATABASE_URL = "postgres://postgres@localhost/togather"
            LOG_JSON = true
            "#,
        )
        .unwrap();
        assert!(vars.contains(&("HTTP_PORT".into(), "8080".into())));
        assert!(vars.contains(&("LOG_JSON".into(), "true".into())));
        assert!(vars.contains(&(
            "DATABASE_URL".into(),
            "postgres://postgres@localhost/togather".into()
        )));

        assert!(parse_dotenv("NESTED = { a = 1 }").is_err());
    }
}
