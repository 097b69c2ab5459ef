// Shell command templates for the OpenFOAM tools.
//
// Every tool runs as `<shell> -l -c "source <bashrc> && <script>"` so the
// OpenFOAM environment is loaded before the tool itself.

use std::fmt;
use std::path::{Path, PathBuf};

use super::install::Installation;

/// Environment variable pointing tools at the active installation.
pub const FOAM_RUN_VAR: &str = "FOAM_RUN";

/// A fully prepared external command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment
    pub envs: Vec<(String, String)>,
    pub working_dir: Option<PathBuf>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: Option<&Path>) -> Self {
        self.working_dir = dir.map(Path::to_path_buf);
        self
    }

    /// Wraps `script` so it runs after sourcing the installation's bashrc.
    pub fn foam_shell(shell: &str, install: &Installation, script: &str) -> Self {
        let bashrc = install.bashrc();
        ShellCommand::new(shell)
            .arg("-l")
            .arg("-c")
            .arg(format!(
                "source {} && {}",
                shell_quote(&bashrc.to_string_lossy()),
                script
            ))
            .env(FOAM_RUN_VAR, install.prefix().to_string_lossy())
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') && !arg.contains('"') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", shell_quote(arg))?;
            }
        }
        Ok(())
    }
}

/// Operations on the case that map to an OpenFOAM tool invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FoamTask {
    CheckMesh,
    ConvertMesh { unv: PathBuf },
    Decompose,
    RunParallel { solver: String, processors: u32 },
    Reconstruct,
    /// Free text typed into the terminal input
    Custom(String),
}

impl FoamTask {
    /// Command line executed inside the sourced shell.
    pub fn script(&self) -> String {
        match self {
            FoamTask::CheckMesh => "checkMesh".to_string(),
            FoamTask::ConvertMesh { unv } => {
                format!("ideasUnvToFoam {}", shell_quote(&unv.to_string_lossy()))
            }
            FoamTask::Decompose => "decomposePar".to_string(),
            FoamTask::RunParallel { solver, processors } => {
                format!("mpirun -np {} {} -parallel", processors, shell_quote(solver))
            }
            FoamTask::Reconstruct => "reconstructPar".to_string(),
            FoamTask::Custom(line) => line.clone(),
        }
    }

    /// Tracked tasks occupy the single simulation slot and can be stopped.
    pub fn is_tracked(&self) -> bool {
        matches!(self, FoamTask::RunParallel { .. } | FoamTask::Reconstruct)
    }

    /// Human readable name used in finish messages.
    pub fn label(&self) -> &'static str {
        match self {
            FoamTask::CheckMesh => "checkMesh",
            FoamTask::ConvertMesh { .. } => "Mesh conversion",
            FoamTask::Decompose => "decomposePar",
            FoamTask::RunParallel { .. } => "Simulation",
            FoamTask::Reconstruct => "Reconstruction",
            FoamTask::Custom(_) => "Command",
        }
    }

    pub fn command(&self, shell: &str, install: &Installation, case_dir: Option<&Path>) -> ShellCommand {
        ShellCommand::foam_shell(shell, install, &self.script()).current_dir(case_dir)
    }
}

/// `paraview --data=<case>/<foam_file>`, run directly without a shell.
pub fn paraview_command(program: &str, case_dir: &Path, foam_file: &str) -> ShellCommand {
    ShellCommand::new(program)
        .arg(format!("--data={}", case_dir.join(foam_file).display()))
        .current_dir(Some(case_dir))
}

/// Quotes `s` for a POSIX shell unless it only holds safe characters.
pub fn shell_quote(s: &str) -> String {
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=+,@%".contains(c));
    if safe {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
