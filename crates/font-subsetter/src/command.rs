//! fontTools `pyftsubset` as an external process.

use std::{
    ffi::{OsStr, OsString},
    process::Command,
};

use log::{debug, info};

use crate::{Error, Result, SubsetRequest, Subsetter};

/// Runs a `pyftsubset`-compatible command line and waits for it.
///
/// The process inherits nothing from the request except its arguments; a
/// non-zero exit becomes [`Error::Failed`] carrying the captured stderr.
#[derive(Debug, Clone)]
pub struct CommandSubsetter {
    program: OsString,
    leading_args: Vec<OsString>,
}

impl CommandSubsetter {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self { program: program.into(), leading_args: Vec::new() }
    }

    /// The `pyftsubset` entry point installed with fontTools.
    pub fn pyftsubset() -> Self {
        Self::new("pyftsubset")
    }

    /// `<python> -m fontTools.subset`, for environments without the entry point.
    pub fn python_module(python: impl Into<OsString>) -> Self {
        Self::new(python).with_leading_args(["-m", "fontTools.subset"])
    }

    /// Arguments placed before the generated ones.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.leading_args.extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Full argument list for a request, leading arguments included.
    pub fn args(&self, request: &SubsetRequest) -> Vec<OsString> {
        let mut args = self.leading_args.clone();
        args.push(request.input().as_os_str().to_os_string());

        let mut output_file = OsString::from("--output-file=");
        output_file.push(request.output());
        args.push(output_file);

        if let Some(flavor) = request.flavor().fonttools_name() {
            args.push(format!("--flavor={flavor}").into());
        }
        args.push(format!("--text={}", request.text()).into());
        args.push(format!("--unicodes={}", request.unicodes_arg()).into());
        if request.drops_layout_features() {
            args.push("--layout-features=".into());
        }
        if request.removes_hinting() {
            args.push("--no-hinting".into());
        }
        if request.retains_glyph_names() {
            args.push("--glyph-names".into());
        }
        args
    }
}

impl Default for CommandSubsetter {
    fn default() -> Self {
        Self::pyftsubset()
    }
}

impl Subsetter for CommandSubsetter {
    fn name(&self) -> &str {
        self.program.to_str().unwrap_or("subsetter")
    }

    fn subset(&self, request: &SubsetRequest) -> Result<()> {
        let args = self.args(request);
        let program = self.program.to_string_lossy().into_owned();
        debug!("{program} {}", args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| Error::Spawn { program: program.clone(), source })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(Error::Failed { program, status: output.status, stderr });
        }

        for line in stderr.lines().filter(|line| !line.trim().is_empty()) {
            debug!("{program}: {line}");
        }
        info!("Subsetted to {}", request.output().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Flavor;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter().map(|a| a.into_string().unwrap()).collect()
    }

    #[test]
    fn test_pyftsubset_args() {
        let request = SubsetRequest::new("src.woff2", "out/optimized.woff2")
            .with_text("home place")
            .with_unicodes([0xe88a, 0xe55f]);

        let args = strings(CommandSubsetter::pyftsubset().args(&request));
        assert_eq!(
            args,
            [
                "src.woff2",
                "--output-file=out/optimized.woff2",
                "--flavor=woff2",
                "--text=home place",
                "--unicodes=0xe88a,0xe55f",
                "--layout-features=",
                "--no-hinting",
            ]
        );
    }

    #[test]
    fn test_python_module_args() {
        let subsetter = CommandSubsetter::python_module("python3");
        let request = SubsetRequest::new("a.ttf", "b.ttf")
            .with_flavor(Flavor::Sfnt)
            .drop_layout_features(false)
            .no_hinting(false)
            .retain_glyph_names(true);

        assert_eq!(subsetter.program(), "python3");
        let args = strings(subsetter.args(&request));
        assert_eq!(
            args,
            [
                "-m",
                "fontTools.subset",
                "a.ttf",
                "--output-file=b.ttf",
                "--text=",
                "--unicodes=",
                "--glyph-names",
            ]
        );
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let subsetter = CommandSubsetter::new("iconslim-no-such-subsetter");
        let err = subsetter.subset(&SubsetRequest::new("a", "b")).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_failure_with_stderr() {
        let subsetter =
            CommandSubsetter::new("sh").with_leading_args(["-c", "echo 'bad font' >&2; exit 3", "sh"]);
        let err = subsetter.subset(&SubsetRequest::new("a", "b")).unwrap_err();
        match err {
            Error::Failed { status, stderr, .. } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr.trim(), "bad font");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_zero_exit_is_success() {
        let subsetter = CommandSubsetter::new("sh").with_leading_args(["-c", "exit 0", "sh"]);
        assert!(subsetter.subset(&SubsetRequest::new("a", "b")).is_ok());
    }
}
