use crate::toolchain::{Invocation, Toolchain};
use crate::RunnerError;
use log::info;
use std::path::Path;
use tbrun_metadata::Metadata;
use tbrun_path::TestArea;

pub fn invocation(metadata: &Metadata, area: &TestArea, program: &Path) -> Invocation {
    Invocation::from_command(&metadata.tools.assembler)
        .path_arg(program)
        .current_dir(metadata.base_dir())
        .stdout(area.instruction_image())
        .timeout(metadata.test.compile_timeout())
}

/// Assembles `program` into the instruction image of `area`.
///
/// Returns the program identity artifacts are renamed after.
pub async fn assemble<T: Toolchain>(
    toolchain: &T,
    metadata: &Metadata,
    area: &TestArea,
    program: &Path,
) -> Result<String, RunnerError> {
    if !program.is_file() {
        return Err(RunnerError::ProgramNotFound(program.to_path_buf()));
    }
    let program = program.canonicalize()?;
    let name = program
        .file_stem()
        .map(|x| x.to_string_lossy().into_owned())
        .ok_or_else(|| RunnerError::ProgramNotFound(program.clone()))?;

    let invocation = invocation(metadata, area, &program);
    let output = toolchain.execute(&invocation).await?;
    if !output.success() {
        return Err(output.into_error(&invocation.program));
    }

    info!(
        "Assembled ({} -> {})",
        program.to_string_lossy(),
        area.instruction_image().to_string_lossy()
    );
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn command() {
        let area = TestArea::new("/prj/Phase-1");
        let invocation = invocation(
            &Metadata::default(),
            &area,
            Path::new("/prj/TestPrograms/fib.s"),
        );
        assert_eq!(invocation.program, "perl");
        assert_eq!(
            invocation.args,
            vec!["Scripts/assembler.pl", "/prj/TestPrograms/fib.s"]
        );
        assert_eq!(
            invocation.stdout,
            Some(PathBuf::from("/prj/Phase-1/tests/instructions.img"))
        );
        assert_eq!(
            invocation.timeout,
            Metadata::default().test.compile_timeout()
        );
    }
}
