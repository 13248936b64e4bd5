use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

mod path_error;
pub use path_error::PathError;

/// Suffixes identifying a testbench inside `tests/`.
pub const TESTBENCH_SUFFIXES: [&str; 2] = ["_tb.sv", "_tb.v"];

/// Fixed on-disk layout of a test area such as `Phase-1`.
///
/// ```text
/// <root>/designs/                        module sources
/// <root>/outputs/                        renamed simulator artifacts
/// <root>/tests/                          testbenches and packages
/// <root>/tests/add_wave_commands/        wave command caches
/// <root>/tests/output/waves/             .wlf dumps and .do formats
/// <root>/tests/output/logs/transcript/   simulation logs
/// <root>/tests/output/logs/compilation/  compilation logs
/// <root>/tests/WORK/<test>/              per-testbench work libraries
/// ```
#[derive(Clone, Debug)]
pub struct TestArea {
    pub root: PathBuf,
    pub designs: PathBuf,
    pub tests: PathBuf,
    pub outputs: PathBuf,
    pub wave_commands: PathBuf,
    pub waves: PathBuf,
    pub transcripts: PathBuf,
    pub compilations: PathBuf,
    pub work: PathBuf,
}

impl TestArea {
    pub fn new<T: AsRef<Path>>(root: T) -> Self {
        let root = root.as_ref().to_path_buf();
        let tests = root.join("tests");
        let output = tests.join("output");
        let logs = output.join("logs");
        Self {
            designs: root.join("designs"),
            outputs: root.join("outputs"),
            wave_commands: tests.join("add_wave_commands"),
            waves: output.join("waves"),
            transcripts: logs.join("transcript"),
            compilations: logs.join("compilation"),
            work: tests.join("WORK"),
            tests,
            root,
        }
    }

    /// Opens an existing area, canonicalizing its root so every derived path is absolute.
    pub fn open<T: AsRef<Path>>(root: T) -> Result<Self, PathError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(PathError::AreaNotFound(root.to_path_buf()));
        }
        Ok(Self::new(root.canonicalize()?))
    }

    /// Creates every derived directory that does not exist yet.
    pub fn prepare(&self) -> Result<(), PathError> {
        for dir in [
            &self.outputs,
            &self.wave_commands,
            &self.waves,
            &self.transcripts,
            &self.compilations,
            &self.work,
        ] {
            if !dir.exists() {
                debug!("Creating dir ({})", dir.to_string_lossy());
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    pub fn paths(&self, test: &str) -> TestPaths {
        let sv = self.tests.join(format!("{test}.sv"));
        let source = if sv.exists() {
            sv
        } else {
            self.tests.join(format!("{test}.v"))
        };

        TestPaths {
            test: test.to_string(),
            source,
            work: self.work.join(test),
            compile_log: self.compilations.join(format!("{test}_compilation.log")),
            transcript_log: self.transcripts.join(format!("{test}_transcript.log")),
            wave: self.waves.join(format!("{test}.wlf")),
            wave_format: self.waves.join(format!("{test}.do")),
            wave_command: self.wave_commands.join(format!("{test}_wave_command.txt")),
            view_transcript: self.waves.join(format!("{test}_transcript")),
        }
    }

    /// Names (without extension) of every testbench in `tests/`, sorted.
    pub fn testbenches(&self) -> Result<Vec<String>, PathError> {
        let mut ret = Vec::new();
        for entry in fs::read_dir(&self.tests)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if TESTBENCH_SUFFIXES.iter().any(|x| name.ends_with(x)) {
                if let Some((stem, _)) = name.rsplit_once('.') {
                    ret.push(stem.to_string());
                }
            }
        }
        ret.sort();
        ret.dedup();
        Ok(ret)
    }

    /// Every regular file directly inside `designs/`, sorted.
    pub fn design_files(&self) -> Result<Vec<PathBuf>, PathError> {
        let mut ret = Vec::new();
        for entry in fs::read_dir(&self.designs)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                ret.push(entry.path());
            }
        }
        ret.sort();
        Ok(ret)
    }

    /// Binary image written by the assembler and loaded by the simulated design.
    pub fn instruction_image(&self) -> PathBuf {
        self.tests.join("instructions.img")
    }

    /// Simulator trace/log artifacts paired with their names under `program`.
    pub fn sim_artifacts(&self, program: &str) -> [(PathBuf, PathBuf); 2] {
        [
            (
                self.outputs.join("verilogsim.trace"),
                self.outputs.join(format!("{program}_verilogsim.trace.txt")),
            ),
            (
                self.outputs.join("verilogsim.log"),
                self.outputs.join(format!("{program}_verilogsim.log.txt")),
            ),
        ]
    }
}

/// Paths owned by a single testbench. Nothing here is shared with another testbench.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestPaths {
    pub test: String,
    pub source: PathBuf,
    pub work: PathBuf,
    pub compile_log: PathBuf,
    pub transcript_log: PathBuf,
    pub wave: PathBuf,
    pub wave_format: PathBuf,
    pub wave_command: PathBuf,
    pub view_transcript: PathBuf,
}

impl TestPaths {
    /// `<library>.<design>` reference handed to the simulator.
    pub fn design_unit(&self) -> String {
        format!("{}.{}", self.work.to_string_lossy(), self.test)
    }
}

pub fn gather_files_with_extension<T: AsRef<Path>>(
    base_dir: T,
    ext: &str,
) -> Result<Vec<PathBuf>, PathError> {
    let mut ret = Vec::new();
    for entry in WalkDir::new(base_dir.as_ref())
        .sort_by_file_name()
        .into_iter()
        .flatten()
    {
        if entry.file_type().is_file() {
            if let Some(x) = entry.path().extension() {
                if x == ext {
                    debug!("Found file ({})", entry.path().to_string_lossy());
                    ret.push(entry.path().to_path_buf());
                }
            }
        }
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout() {
        let area = TestArea::new("/prj/Phase-1");
        let paths = area.paths("alu_tb");

        assert_eq!(
            paths.compile_log,
            PathBuf::from("/prj/Phase-1/tests/output/logs/compilation/alu_tb_compilation.log")
        );
        assert_eq!(
            paths.transcript_log,
            PathBuf::from("/prj/Phase-1/tests/output/logs/transcript/alu_tb_transcript.log")
        );
        assert_eq!(
            paths.wave_command,
            PathBuf::from("/prj/Phase-1/tests/add_wave_commands/alu_tb_wave_command.txt")
        );
        assert_eq!(paths.wave, PathBuf::from("/prj/Phase-1/tests/output/waves/alu_tb.wlf"));
        assert_eq!(paths.wave_format, PathBuf::from("/prj/Phase-1/tests/output/waves/alu_tb.do"));
        assert_eq!(paths.work, PathBuf::from("/prj/Phase-1/tests/WORK/alu_tb"));
        assert_eq!(paths.design_unit(), "/prj/Phase-1/tests/WORK/alu_tb.alu_tb");
    }

    #[test]
    fn paths_are_disjoint_between_tests() {
        let area = TestArea::new("/prj/Phase-1");
        let a = area.paths("alu_tb");
        let b = area.paths("cpu_tb");

        let a = [a.work, a.compile_log, a.transcript_log, a.wave, a.wave_format, a.wave_command];
        let b = [b.work, b.compile_log, b.transcript_log, b.wave, b.wave_format, b.wave_command];
        assert!(a.iter().all(|x| !b.contains(x)));
    }

    #[test]
    fn source_prefers_sv() {
        let tempdir = tempfile::tempdir().unwrap();
        let area = TestArea::new(tempdir.path());
        fs::create_dir_all(&area.tests).unwrap();

        assert_eq!(area.paths("alu_tb").source, area.tests.join("alu_tb.v"));

        fs::write(area.tests.join("alu_tb.sv"), "").unwrap();
        assert_eq!(area.paths("alu_tb").source, area.tests.join("alu_tb.sv"));
    }

    #[test]
    fn find_testbenches() {
        let tempdir = tempfile::tempdir().unwrap();
        let area = TestArea::new(tempdir.path());
        fs::create_dir_all(&area.tests).unwrap();
        fs::write(area.tests.join("cpu_tb.sv"), "").unwrap();
        fs::write(area.tests.join("alu_tb.v"), "").unwrap();
        fs::write(area.tests.join("defs_pkg.sv"), "").unwrap();
        fs::write(area.tests.join("notes.txt"), "").unwrap();

        assert_eq!(area.testbenches().unwrap(), vec!["alu_tb", "cpu_tb"]);
    }

    #[test]
    fn open_missing_area() {
        let tempdir = tempfile::tempdir().unwrap();
        let missing = tempdir.path().join("Phase-9");
        assert!(matches!(
            TestArea::open(&missing),
            Err(PathError::AreaNotFound(_))
        ));
    }

    #[test]
    fn prepare_creates_layout() {
        let tempdir = tempfile::tempdir().unwrap();
        let area = TestArea::open(tempdir.path()).unwrap();
        area.prepare().unwrap();

        assert!(area.wave_commands.is_dir());
        assert!(area.waves.is_dir());
        assert!(area.transcripts.is_dir());
        assert!(area.compilations.is_dir());
        assert!(area.work.is_dir());
        assert!(area.outputs.is_dir());
    }

    #[test]
    fn gather_by_extension() {
        let tempdir = tempfile::tempdir().unwrap();
        let sub = tempdir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(tempdir.path().join("a.v"), "").unwrap();
        fs::write(sub.join("b.v"), "").unwrap();
        fs::write(sub.join("c.sv"), "").unwrap();

        let files = gather_files_with_extension(tempdir.path(), "v").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|x| x.extension().unwrap() == "v"));
    }
}
