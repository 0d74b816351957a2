//! Init command implementation

use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};
use tracing::info;

use markweave_core::CONFIG_FILES;

const DEFAULT_CONFIG: &str = r##"{
  // Theme overrides, colors as "#RRGGBB" or "#AARRGGBB".
  "theme": {},
  // Node types that are not rendered, e.g. ["Html"].
  "suppress": [],
  "images": true,
  "html": true,
  "soft_break_adds_new_line": false
}
"##;

pub fn run_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILES[0]);

    loop {
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NOFOLLOW);
        }

        match options.open(&config_path) {
            Ok(mut file) => {
                use std::io::Write;
                file.write_all(DEFAULT_CONFIG.as_bytes()).into_diagnostic()?;
                info!("Created {}", config_path.display());
                return Ok(());
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if !force {
                    return Err(miette::miette!(
                        "Config file already exists. Use --force to overwrite."
                    ));
                }

                match std::fs::remove_file(&config_path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e).into_diagnostic(),
                }
            }
            Err(e) => return Err(e).into_diagnostic(),
        }
    }
}
