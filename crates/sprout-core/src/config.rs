use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace
};

const RC_ENV_VAR: &str = "SPROUTRC";
const RC_FILE_NAME: &str = ".sproutrc";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "data.location".to_string(),
      "~/.sprout".to_string()
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
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match resolve_rc_path(rc_override)? {
      | Some(path) => {
        info!(sproutrc = %path.display(), "loading sproutrc");
        cfg.load_file(&path)?;
      }
      | None => {
        debug!(
          "no sproutrc found; using \
           defaults"
        );
      }
    }

    Ok(cfg)
  }

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

  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<Option<bool>> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(key, v))
      .transpose()
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
    self.parse_into(&path, &text)?;
    self.loaded_files.push(path);
    Ok(())
  }

  fn parse_into(
    &mut self,
    path: &Path,
    text: &str
  ) -> anyhow::Result<()> {
    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let line = raw_line
        .split_once('#')
        .map_or(raw_line, |(before, _)| {
          before
        })
        .trim();
      if line.is_empty() {
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  if let Some(path) = override_dir {
    return Ok(path.to_path_buf());
  }

  match cfg.get("data.location") {
    | Some(value) => {
      Ok(expand_tilde(Path::new(&value)))
    }
    | None => {
      let home = dirs::home_dir()
        .ok_or_else(|| {
          anyhow!(
            "cannot determine home \
             directory"
          )
        })?;
      Ok(home.join(".sprout"))
    }
  }
}

fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  Ok(candidate.exists().then_some(candidate))
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

fn parse_bool(
  key: &str,
  s: &str
) -> anyhow::Result<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Ok(true),
    | "0" | "n" | "no" | "off"
    | "false" => Ok(false),
    | other => {
      Err(anyhow!(
        "invalid boolean for {key}: \
         {other}"
      ))
    }
  }
}

#[cfg(test)]
mod tests {
  use std::path::Path;

  use tempfile::tempdir;

  use super::{
    Config,
    resolve_data_dir
  };

  #[test]
  fn file_values_and_overrides_layer() {
    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("sproutrc");
    std::fs::write(
      &rc,
      "# household settings\n\
       timezone = Europe/Dublin\n\
       color=off  # no ansi\n"
    )
    .expect("write rc");

    let mut cfg = Config::load(Some(&rc))
      .expect("load config");
    assert_eq!(
      cfg.get("timezone").as_deref(),
      Some("Europe/Dublin")
    );
    assert_eq!(
      cfg.get_bool("color").expect("bool"),
      Some(false)
    );
    assert_eq!(
      cfg.get("default.command").as_deref(),
      Some("list")
    );

    cfg.apply_overrides(vec![(
      "rc.color".to_string(),
      "on".to_string()
    )]);
    assert_eq!(
      cfg.get_bool("color").expect("bool"),
      Some(true)
    );
    assert_eq!(cfg.loaded_files.len(), 1);
  }

  #[test]
  fn rejects_lines_without_equals() {
    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("sproutrc");
    std::fs::write(&rc, "timezone\n")
      .expect("write rc");
    assert!(Config::load(Some(&rc)).is_err());
  }

  #[test]
  fn explicit_data_dir_wins() {
    let cfg = Config::default();
    let dir = resolve_data_dir(
      &cfg,
      Some(Path::new("/tmp/plants"))
    )
    .expect("resolve");
    assert_eq!(dir, Path::new("/tmp/plants"));
  }
}
