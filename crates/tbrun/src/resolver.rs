//! Dependency resolution of testbenches.
//!
//! Module definitions are looked up only in `designs/` and package definitions
//! only in `tests/`. Identifiers found in neither table are treated as
//! simulator built-ins and skipped.

use crate::RunnerError;
use log::{debug, warn};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tbrun_path::{gather_files_with_extension, TestArea};

static MODULE_DEF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*module\s+(\w+)").unwrap());
static PACKAGE_DEF: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*package\s+(\w+)").unwrap());
static MODULE_INST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ms)^\s*(\w+)(?:\s*#\((?:[^()]|\((?:[^()]|\([^()]*\))*\))*\)\s*|\s+)\w+\s*(?:\[\d+:\d+\])?\s*\(.*?\);",
    )
    .unwrap()
});
static IMPORT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*import\s+(\w+)\s*::\*;").unwrap());

const SOURCE_EXTENSIONS: [&str; 2] = ["v", "sv"];

/// Definition name to the absolute path of the file defining it.
#[derive(Clone, Debug, Default)]
pub struct DefinitionTable {
    table: HashMap<String, PathBuf>,
}

impl DefinitionTable {
    fn scan(base_dir: &Path, pattern: &Regex) -> Result<Self, RunnerError> {
        let mut ret = Self::default();
        if !base_dir.is_dir() {
            return Ok(ret);
        }

        for ext in SOURCE_EXTENSIONS {
            for path in gather_files_with_extension(base_dir, ext)? {
                let text = read_source(&path)?;
                for cap in pattern.captures_iter(&text) {
                    ret.insert(&cap[1], &path);
                }
            }
        }
        Ok(ret)
    }

    fn insert(&mut self, name: &str, path: &Path) {
        if let Some(x) = self.table.get(name) {
            if x != path {
                warn!(
                    "\"{}\" is defined in both {} and {}, using the former",
                    name,
                    x.to_string_lossy(),
                    path.to_string_lossy()
                );
            }
            return;
        }
        self.table.insert(name.to_string(), path.to_path_buf());
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.table.get(name).map(|x| x.as_path())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Definitions {
    pub modules: DefinitionTable,
    pub packages: DefinitionTable,
}

impl Definitions {
    pub fn scan(designs: &Path, tests: &Path) -> Result<Self, RunnerError> {
        let modules = DefinitionTable::scan(designs, &MODULE_DEF)?;
        let packages = DefinitionTable::scan(tests, &PACKAGE_DEF)?;
        debug!(
            "Scanned definitions ({} modules, {} packages)",
            modules.len(),
            packages.len()
        );
        Ok(Self { modules, packages })
    }

    fn lookup(&self, name: &str) -> Option<&Path> {
        self.modules.get(name).or_else(|| self.packages.get(name))
    }
}

/// Files to compile for one testbench.
///
/// Every file appears once, and each dependency precedes the files it was
/// discovered from. The testbench itself comes last.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedFileList {
    files: Vec<PathBuf>,
}

impl ResolvedFileList {
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains<T: AsRef<Path>>(&self, path: T) -> bool {
        self.files.iter().any(|x| x == path.as_ref())
    }

    pub fn position<T: AsRef<Path>>(&self, path: T) -> Option<usize> {
        self.files.iter().position(|x| x == path.as_ref())
    }

    /// Total size of the listed files in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.files
            .iter()
            .filter_map(|x| fs::metadata(x).ok())
            .map(|x| x.len())
            .sum()
    }
}

/// Candidate dependency identifiers of a source text: instantiated modules and imported packages.
pub fn dependencies(text: &str) -> BTreeSet<String> {
    let mut ret = BTreeSet::new();
    for cap in MODULE_INST.captures_iter(text) {
        ret.insert(cap[1].to_string());
    }
    for cap in IMPORT.captures_iter(text) {
        ret.insert(cap[1].to_string());
    }
    ret
}

fn read_source(path: &Path) -> Result<String, RunnerError> {
    let text = fs::read(path).map_err(|source| RunnerError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&text).into_owned())
}

/// Resolver of one test area. The definition scan runs once, on first use,
/// even when several tasks resolve concurrently.
pub struct Resolver {
    designs: PathBuf,
    tests: PathBuf,
    definitions: OnceCell<Definitions>,
}

impl Resolver {
    pub fn new(area: &TestArea) -> Self {
        Self {
            designs: area.designs.clone(),
            tests: area.tests.clone(),
            definitions: OnceCell::new(),
        }
    }

    pub fn definitions(&self) -> Result<&Definitions, RunnerError> {
        self.definitions
            .get_or_try_init(|| Definitions::scan(&self.designs, &self.tests))
    }

    pub fn resolve<T: AsRef<Path>>(&self, testbench: T) -> Result<ResolvedFileList, RunnerError> {
        let testbench = testbench.as_ref().to_path_buf();
        let text = read_source(&testbench)?;
        let definitions = self.definitions()?;

        struct Frame {
            path: PathBuf,
            pending: Vec<PathBuf>,
        }

        let mut visited = HashSet::new();
        let mut files = Vec::new();

        visited.insert(testbench.clone());
        let mut stack = vec![Frame {
            pending: pending_files(&text, definitions),
            path: testbench,
        }];

        while let Some(frame) = stack.last_mut() {
            if let Some(next) = frame.pending.pop() {
                if visited.insert(next.clone()) {
                    debug!(
                        "Found dependency ({} -> {})",
                        frame.path.to_string_lossy(),
                        next.to_string_lossy()
                    );
                    let text = read_source(&next)?;
                    stack.push(Frame {
                        pending: pending_files(&text, definitions),
                        path: next,
                    });
                }
            } else if let Some(frame) = stack.pop() {
                files.push(frame.path);
            }
        }

        Ok(ResolvedFileList { files })
    }
}

/// Defining files of the dependencies of `text`, reversed so that popping yields them in name order.
fn pending_files(text: &str, definitions: &Definitions) -> Vec<PathBuf> {
    let mut ret = Vec::new();
    for name in dependencies(text) {
        if let Some(path) = definitions.lookup(&name) {
            if !ret.iter().any(|x: &PathBuf| x == path) {
                ret.push(path.to_path_buf());
            }
        }
    }
    ret.reverse();
    ret
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn area_with(files: &[(&str, &str)]) -> (TestArea, tempfile::TempDir) {
        let tempdir = tempfile::tempdir().unwrap();
        let area = TestArea::new(tempdir.path());
        fs::create_dir_all(&area.designs).unwrap();
        fs::create_dir_all(&area.tests).unwrap();
        for (path, text) in files {
            fs::write(area.root.join(path), text).unwrap();
        }
        (area, tempdir)
    }

    #[test]
    fn extract_dependencies() {
        let text = r#"
import defs_pkg::*;

module cpu_tb();
    logic clk, rst_n;

    cpu #(.WIDTH(16)) iDUT (
        .clk(clk),
        .rst_n(rst_n)
    );

    regfile rf [3:0] (.clk(clk));

    initial begin
        $display("YAHOO!! All tests passed.");
    end
endmodule
"#;
        let deps = dependencies(text);
        assert!(deps.contains("cpu"));
        assert!(deps.contains("regfile"));
        assert!(deps.contains("defs_pkg"));
    }

    #[test]
    fn no_dependencies() {
        let (area, _tempdir) = area_with(&[(
            "tests/alu_tb.sv",
            "module alu_tb();\n  initial $display(\"YAHOO!! All tests passed.\");\nendmodule\n",
        )]);
        let resolver = Resolver::new(&area);
        let files = resolver.resolve(area.tests.join("alu_tb.sv")).unwrap();
        assert_eq!(files.files(), &[area.tests.join("alu_tb.sv")]);
    }

    #[test]
    fn transitive_dependencies() {
        let (area, _tempdir) = area_with(&[
            (
                "tests/cpu_tb.sv",
                "import defs_pkg::*;\nmodule cpu_tb();\n  cpu iDUT (.clk(clk));\nendmodule\n",
            ),
            ("tests/defs_pkg.sv", "package defs_pkg;\nendpackage\n"),
            (
                "designs/cpu.v",
                "module cpu(input clk);\n  alu iALU (.a(a), .b(b));\n  regfile iRF (.clk(clk));\nendmodule\n",
            ),
            ("designs/alu.v", "module alu(input a, input b);\nendmodule\n"),
            (
                "designs/regfile.v",
                "module regfile(input clk);\n  dff iFF [15:0] (.clk(clk));\nendmodule\n",
            ),
            ("designs/dff.v", "module dff(input clk);\nendmodule\n"),
            ("designs/unused.v", "module unused();\nendmodule\n"),
        ]);
        let resolver = Resolver::new(&area);
        let tb = area.tests.join("cpu_tb.sv");
        let files = resolver.resolve(&tb).unwrap();

        assert_eq!(files.len(), 6);
        assert!(!files.contains(area.designs.join("unused.v")));

        let pos = |x: PathBuf| files.position(x).unwrap();
        let cpu = pos(area.designs.join("cpu.v"));
        assert!(pos(area.tests.join("defs_pkg.sv")) < pos(tb.clone()));
        assert!(cpu < pos(tb.clone()));
        assert!(pos(area.designs.join("alu.v")) < cpu);
        assert!(pos(area.designs.join("regfile.v")) < cpu);
        assert!(pos(area.designs.join("dff.v")) < pos(area.designs.join("regfile.v")));
    }

    #[test]
    fn parameterized_instance() {
        let (area, _tempdir) = area_with(&[
            (
                "tests/fifo_tb.sv",
                "module fifo_tb();\n  fifo #(.DEPTH(8), .WIDTH($clog2(16))) iDUT (\n    .clk(clk)\n  );\nendmodule\n",
            ),
            (
                "designs/fifo.v",
                "module fifo #(parameter DEPTH = 4, WIDTH = 8) (input clk);\n  ram #(DEPTH) iRAM (.clk(clk));\nendmodule\n",
            ),
            ("designs/ram.v", "module ram #(parameter N = 1) (input clk);\nendmodule\n"),
        ]);
        let resolver = Resolver::new(&area);
        let tb = area.tests.join("fifo_tb.sv");
        let files = resolver.resolve(&tb).unwrap();

        assert_eq!(
            files.files(),
            &[
                area.designs.join("ram.v"),
                area.designs.join("fifo.v"),
                tb.clone()
            ]
        );
    }

    #[test]
    fn shared_dependency_precedes_all_users() {
        let (area, _tempdir) = area_with(&[
            (
                "tests/top_tb.sv",
                "module top_tb();\n  a uA (.x(x));\n  b uB (.x(x));\nendmodule\n",
            ),
            ("designs/a.v", "module a(input x);\nendmodule\n"),
            (
                "designs/b.v",
                "module b(input x);\n  a uA (.x(x));\nendmodule\n",
            ),
        ]);
        let resolver = Resolver::new(&area);
        let files = resolver.resolve(area.tests.join("top_tb.sv")).unwrap();

        assert_eq!(files.len(), 3);
        assert!(
            files.position(area.designs.join("a.v")).unwrap()
                < files.position(area.designs.join("b.v")).unwrap()
        );
    }

    #[test]
    fn modules_and_packages_stay_in_their_tree() {
        let (area, _tempdir) = area_with(&[
            (
                "tests/x_tb.sv",
                "import helper::*;\nmodule x_tb();\n  widget uW (.a(a));\nendmodule\n",
            ),
            // a package in designs/ and a module in tests/ are never picked up
            ("designs/helper.sv", "package helper;\nendpackage\n"),
            ("tests/widget.sv", "module widget(input a);\nendmodule\n"),
        ]);
        let resolver = Resolver::new(&area);
        let files = resolver.resolve(area.tests.join("x_tb.sv")).unwrap();
        assert_eq!(files.files(), &[area.tests.join("x_tb.sv")]);
    }

    #[test]
    fn cycle_terminates() {
        let (area, _tempdir) = area_with(&[
            (
                "tests/ring_tb.sv",
                "module ring_tb();\n  ping uP (.x(x));\nendmodule\n",
            ),
            (
                "designs/ping.v",
                "module ping(input x);\n  pong uQ (.x(x));\nendmodule\n",
            ),
            (
                "designs/pong.v",
                "module pong(input x);\n  ping uP (.x(x));\nendmodule\n",
            ),
        ]);
        let resolver = Resolver::new(&area);
        let files = resolver.resolve(area.tests.join("ring_tb.sv")).unwrap();
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn unreadable_testbench() {
        let (area, _tempdir) = area_with(&[]);
        let resolver = Resolver::new(&area);
        assert!(matches!(
            resolver.resolve(area.tests.join("missing_tb.sv")),
            Err(RunnerError::ReadFile { .. })
        ));
    }

    #[test]
    fn definitions_are_built_once() {
        let (area, _tempdir) = area_with(&[("designs/alu.v", "module alu();\nendmodule\n")]);
        let resolver = Arc::new(Resolver::new(&area));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                std::thread::spawn(move || {
                    resolver.definitions().unwrap() as *const Definitions as usize
                })
            })
            .collect();
        let addrs: HashSet<_> = handles.into_iter().map(|x| x.join().unwrap()).collect();
        assert_eq!(addrs.len(), 1);
        assert!(resolver.definitions().unwrap().modules.get("alu").is_some());
    }
}
