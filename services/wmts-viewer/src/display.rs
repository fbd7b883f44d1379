//! Hand a rendered figure to the platform image viewer.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::info;
use wmts_common::{WmtsError, WmtsResult};

/// The command that opens `path` with the desktop's default viewer.
pub fn viewer_command(path: &Path) -> Command {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        // Empty title argument so paths with spaces are not taken as the title
        c.args(["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    cmd.arg(path);
    cmd
}

/// Open `path` without waiting for the viewer to exit.
pub fn show(path: &Path) -> WmtsResult<()> {
    if !path.exists() {
        return Err(WmtsError::InvalidParameter {
            param: "output".to_string(),
            message: format!("{} does not exist", path.display()),
        });
    }

    let mut cmd = viewer_command(path);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let program = cmd.get_program().to_string_lossy().into_owned();
    cmd.spawn().map_err(|e| {
        WmtsError::InternalError(format!("failed to launch image viewer '{}': {}", program, e))
    })?;

    info!(path = %path.display(), viewer = %program, "Opened figure");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_command_passes_path_last() {
        let cmd = viewer_command(Path::new("/tmp/map figure.png"));
        let last = cmd.get_args().last().unwrap();
        assert_eq!(last, "/tmp/map figure.png");
    }

    #[test]
    fn test_show_missing_file() {
        let err = show(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, WmtsError::InvalidParameter { .. }));
    }
}
