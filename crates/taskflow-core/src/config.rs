use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow
};
use chrono_tz::Tz;
use taskflow_shared::datetime::parse_timezone;
use tracing::{
  debug,
  info,
  trace,
  warn
};

pub const CONFIG_ENV_VAR: &str =
  "TASKFLOW_CONFIG";
pub const DEFAULT_BASE_URL: &str =
  "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
  map:              HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "api.base_url".to_string(),
      DEFAULT_BASE_URL.to_string()
    );
    map.insert(
      "api.timeout_secs".to_string(),
      DEFAULT_TIMEOUT_SECS.to_string()
    );
    map.insert(
      "default.command".to_string(),
      "list".to_string()
    );
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match resolve_config_path(
      config_override
    )? {
      | Some(path) => {
        info!(config = %path.display(), "loading config");
        cfg.load_file(&path)?;
      }
      | None => {
        warn!(
          "no config file found; using \
           defaults"
        );
      }
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn base_url(&self) -> String {
    self
      .get("api.base_url")
      .map(|url| {
        url.trim_end_matches('/').to_string()
      })
      .filter(|url| !url.is_empty())
      .unwrap_or_else(|| {
        DEFAULT_BASE_URL.to_string()
      })
  }

  pub fn timeout(
    &self
  ) -> anyhow::Result<Duration> {
    let raw = self
      .get("api.timeout_secs")
      .unwrap_or_else(|| {
        DEFAULT_TIMEOUT_SECS.to_string()
      });
    let secs: u64 =
      raw.trim().parse().with_context(
        || {
          format!(
            "invalid api.timeout_secs: \
             {raw}"
          )
        }
      )?;
    Ok(Duration::from_secs(secs))
  }

  /// Configured zone for "today"; `None`
  /// means the host's local zone.
  pub fn timezone(&self) -> Option<Tz> {
    let raw = self.get("time.timezone")?;
    parse_timezone(&raw, "time.timezone")
  }

  pub fn color(
    &self
  ) -> anyhow::Result<bool> {
    let raw = self
      .get("color")
      .unwrap_or_else(|| "on".to_string());
    match raw.to_ascii_lowercase().as_str()
    {
      | "on" | "yes" | "true" | "1" => {
        Ok(true)
      }
      | "off" | "no" | "false" | "0" => {
        Ok(false)
      }
      | other => {
        Err(anyhow!(
          "invalid color setting: {other}"
        ))
      }
    }
  }

  pub fn export_dir(&self) -> PathBuf {
    self
      .get("export.dir")
      .map(|raw| expand_tilde(Path::new(&raw)))
      .unwrap_or_else(|| PathBuf::from("."))
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    let table = toml::from_str::<
      toml::Table
    >(&text)
    .with_context(|| {
      format!(
        "failed to parse {}",
        path.display()
      )
    })?;

    self
      .loaded_files
      .push(path.clone());

    let mut flat = Vec::new();
    flatten_table("", &table, &mut flat)?;
    for (key, value) in flat {
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

fn flatten_table(
  prefix: &str,
  table: &toml::Table,
  out: &mut Vec<(String, String)>
) -> anyhow::Result<()> {
  for (key, value) in table {
    let full = if prefix.is_empty() {
      key.clone()
    } else {
      format!("{prefix}.{key}")
    };

    let scalar = match value {
      | toml::Value::Table(inner) => {
        flatten_table(&full, inner, out)?;
        continue;
      }
      | toml::Value::String(s) => s.clone(),
      | toml::Value::Integer(i) => {
        i.to_string()
      }
      | toml::Value::Float(f) => {
        f.to_string()
      }
      | toml::Value::Boolean(b) => {
        b.to_string()
      }
      | toml::Value::Datetime(dt) => {
        dt.to_string()
      }
      | toml::Value::Array(_) => {
        return Err(anyhow!(
          "config key {full} must be a \
           scalar value"
        ));
      }
    };
    out.push((full, scalar));
  }
  Ok(())
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if trimmed.is_empty()
      || trimmed == "/dev/null"
    {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      trimmed
    )));
  }

  let Some(config_dir) = dirs::config_dir()
  else {
    debug!(
      "cannot determine config \
       directory"
    );
    return Ok(None);
  };
  let candidate = config_dir
    .join("taskflow")
    .join("config.toml");
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write;
  use std::time::Duration;

  use pretty_assertions::assert_eq;
  use tempfile::NamedTempFile;

  use super::{
    Config,
    DEFAULT_BASE_URL
  };

  fn write_config(
    text: &str
  ) -> NamedTempFile {
    let mut file = NamedTempFile::new()
      .expect("temp config");
    file
      .write_all(text.as_bytes())
      .expect("write config");
    file
  }

  #[test]
  fn defaults_apply_without_file() {
    let cfg = Config::default();
    assert_eq!(
      cfg.base_url(),
      DEFAULT_BASE_URL
    );
    assert_eq!(
      cfg.timeout().expect("timeout"),
      Duration::from_secs(30)
    );
    assert!(cfg.color().expect("color"));
    assert!(cfg.timezone().is_none());
  }

  #[test]
  fn toml_tables_flatten_to_dotted_keys() {
    let file = write_config(
      r#"
color = "off"

[api]
base_url = "https://tasks.example.com/"
timeout_secs = 5

[time]
timezone = "Europe/Berlin"
"#
    );
    let cfg = Config::load(Some(file.path()))
      .expect("load config");
    assert_eq!(
      cfg.base_url(),
      "https://tasks.example.com"
    );
    assert_eq!(
      cfg.timeout().expect("timeout"),
      Duration::from_secs(5)
    );
    assert!(!cfg.color().expect("color"));
    assert_eq!(
      cfg.timezone(),
      Some(chrono_tz::Europe::Berlin)
    );
    assert_eq!(cfg.loaded_files.len(), 1);
  }

  #[test]
  fn overrides_win_over_file() {
    let file = write_config(
      "[api]\nbase_url = \"http://a\"\n"
    );
    let mut cfg =
      Config::load(Some(file.path()))
        .expect("load config");
    cfg.apply_overrides([(
      "rc.api.base_url".to_string(),
      "http://b".to_string()
    )]);
    assert_eq!(cfg.base_url(), "http://b");
  }

  #[test]
  fn arrays_are_rejected() {
    let file =
      write_config("hosts = [\"a\"]\n");
    assert!(
      Config::load(Some(file.path()))
        .is_err()
    );
  }

  #[test]
  fn bad_timeout_is_an_error() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "api.timeout_secs".to_string(),
      "soon".to_string()
    )]);
    assert!(cfg.timeout().is_err());
  }
}
