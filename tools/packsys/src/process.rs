/*!
Run external commands with a real argv vector, an explicit working
directory, and a fully-specified child environment.

The engine composes a minimal base environment for build-system children:
the devtree's host `bin` directory prepended to a fixed system `PATH`, and
`LANG=C` so tool output is stable. Everything else a child sees comes from
the recipe's environment overlay. The engine itself never changes directory
and never mutates its own environment.
*/

use crate::error::{self, Result};
use duct::cmd;
use log::info;
use snafu::{ensure, ResultExt};
use std::collections::BTreeMap;
use std::path::Path;

/// Build the base environment for a child process. `devtree_bin` is the
/// devtree's host bin directory, which takes precedence over the system
/// directories.
pub fn base_env(devtree_bin: &str) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert(
        "PATH".to_string(),
        format!("{}:/usr/bin:/bin:/usr/sbin:/sbin", devtree_bin),
    );
    env.insert("LANG".to_string(), "C".to_string());
    env
}

/// Run a command to completion, streaming its output, and fail on a
/// non-zero exit status. The child sees exactly `env` and runs in `dir`.
pub fn run(argv: &[String], env: &BTreeMap<String, String>, dir: &Path) -> Result<()> {
    ensure!(!argv.is_empty(), error::EmptyCommandSnafu);
    let command = argv.join(" ");
    info!("{} ENV={:?}", command, env);

    let output = cmd(argv[0].as_str(), &argv[1..])
        .dir(dir)
        .full_env(env)
        .unchecked()
        .run()
        .context(error::CommandStartSnafu { command: &command })?;

    ensure!(
        output.status.success(),
        error::CommandStatusSnafu {
            command,
            code: output.status.code().unwrap_or(1),
        }
    );
    Ok(())
}

/// Run a command with the parent's environment and return its trimmed
/// stdout. Used for `git`, which needs the caller's credentials and config.
pub fn read(argv: &[String], dir: &Path) -> Result<String> {
    ensure!(!argv.is_empty(), error::EmptyCommandSnafu);
    let command = argv.join(" ");

    let output = cmd(argv[0].as_str(), &argv[1..])
        .dir(dir)
        .stdout_capture()
        .unchecked()
        .run()
        .context(error::CommandStartSnafu { command: &command })?;

    ensure!(
        output.status.success(),
        error::CommandStatusSnafu {
            command,
            code: output.status.code().unwrap_or(1),
        }
    );
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Like [`run`], but with the parent's environment.
pub fn run_inherited(argv: &[String], dir: &Path) -> Result<()> {
    ensure!(!argv.is_empty(), error::EmptyCommandSnafu);
    let command = argv.join(" ");
    info!("{}", command);

    let output = cmd(argv[0].as_str(), &argv[1..])
        .dir(dir)
        .unchecked()
        .run()
        .context(error::CommandStartSnafu { command: &command })?;

    ensure!(
        output.status.success(),
        error::CommandStatusSnafu {
            command,
            code: output.status.code().unwrap_or(1),
        }
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn success_status() {
        let env = base_env("devtree/x/bin");
        run(&["true".to_string()], &env, &PathBuf::from(".")).unwrap();
    }

    #[test]
    fn failure_status() {
        let env = base_env("devtree/x/bin");
        let result = run(&["false".to_string()], &env, &PathBuf::from("."));
        assert!(matches!(
            result,
            Err(crate::Error::CommandStatus { code: 1, .. })
        ));
    }

    #[test]
    fn captured_stdout() {
        let out = read(
            &["echo".to_string(), "hello".to_string()],
            &PathBuf::from("."),
        )
        .unwrap();
        assert_eq!(out, "hello");
    }
}
