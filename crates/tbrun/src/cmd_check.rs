use crate::linter::lint;
use crate::toolchain::{check_tools, ProcessToolchain};
use crate::OptCheck;
use console::style;
use log::{error, info, warn};
use miette::{IntoDiagnostic, Result};
use tbrun_metadata::Metadata;
use tbrun_path::TestArea;

pub struct CmdCheck {
    opt: OptCheck,
}

impl CmdCheck {
    pub fn new(opt: OptCheck) -> Self {
        Self { opt }
    }

    pub fn exec(&self, metadata: &Metadata) -> Result<bool> {
        let area = TestArea::open(&self.opt.area)?;
        let linter: Vec<_> = metadata.tools.linter.iter().take(1).collect();
        check_tools(&linter)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .into_diagnostic()?;
        let report = runtime.block_on(lint(&ProcessToolchain, metadata, &area))?;

        if report.checked == 0 {
            warn!(
                "No design files found in {}",
                area.designs.to_string_lossy()
            );
            return Ok(true);
        }

        if report.compliant() {
            info!("YAHOO!! All design files are compliant.");
            return Ok(true);
        }

        error!("The following design files are not compliant");
        for x in &report.violations {
            let name = x
                .path
                .file_name()
                .map(|x| x.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("{}", style(format!("Check failed for {name}:")).red().bold());
            println!("{}", x.message);
            println!();
        }
        Ok(false)
    }
}
