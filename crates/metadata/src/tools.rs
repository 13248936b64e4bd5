use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tools {
    #[serde(default = "default_vsim")]
    pub vsim: String,
    #[serde(default = "default_vlog")]
    pub vlog: String,
    /// Design linter, the design file is appended as the last argument
    #[serde(default = "default_linter")]
    pub linter: Vec<String>,
    /// Prefix of linter output reporting a compliant file
    #[serde(default = "default_linter_marker")]
    pub linter_marker: String,
    /// Assembler, the program is appended as the last argument and stdout becomes the image
    #[serde(default = "default_assembler")]
    pub assembler: Vec<String>,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            vsim: default_vsim(),
            vlog: default_vlog(),
            linter: default_linter(),
            linter_marker: default_linter_marker(),
            assembler: default_assembler(),
        }
    }
}

fn default_vsim() -> String {
    "vsim".to_string()
}

fn default_vlog() -> String {
    "vlog".to_string()
}

fn default_linter() -> Vec<String> {
    ["java", "-cp", "Scripts", "Vcheck"]
        .iter()
        .map(|x| x.to_string())
        .collect()
}

fn default_linter_marker() -> String {
    "End of file".to_string()
}

fn default_assembler() -> Vec<String> {
    ["perl", "Scripts/assembler.pl"]
        .iter()
        .map(|x| x.to_string())
        .collect()
}
