//! Fixed prompt texts of a review.

use crate::tools::FlaggedFile;
use std::path::{Path, PathBuf};

pub const ASSISTANT_NAME: &str = "License Assistant";
pub const SCANNER_NAME: &str = "License Scanner";

pub fn instructions() -> String {
    "You are a very skilled AI assistant that specializes in working with open source project \
     licenses. You have access to a sandbox environment where you can investigate a .rpm file, \
     the .src.rpm it was generated from, and the .spec file used to generate it. Your goal is to \
     determine if every .rpm file ships suitable license files, and if those license files are \
     correct. You may access the contents of the .rpm file, the .src.rpm file, and the .spec \
     file through the provided functions. Base every conclusion on what the functions return."
        .to_string()
}

pub fn scan_instructions() -> String {
    "You are a meticulous assistant that searches unpacked source trees for files carrying \
     license information: license texts, copyright notices, license headers and vendored \
     third-party code. You can list and read files of the prepared build tree of a source \
     package. Mark every file that another reviewer should read to judge the licensing of the \
     package, with a short reason."
        .to_string()
}

fn file_list(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| format!("  - {}", f.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn with_inputs(text: String, inputs: &[PathBuf]) -> String {
    if inputs.is_empty() {
        return text;
    }
    format!("{}\n\nFiles available for this review:\n{}", text, file_list(inputs))
}

/// Step 1: inventory of license and documentation files
pub fn inventory(package: &Path, inputs: &[PathBuf]) -> String {
    with_inputs(
        format!(
            "Analyse the contents of the .rpm file {} and list the license and documentation \
             files it contains. Read the license files to find out which licenses they contain.",
            package.display()
        ),
        inputs,
    )
}

/// Step 2: cross-check with the spec file and source package
pub fn compare(package: &Path, inputs: &[PathBuf]) -> String {
    with_inputs(
        format!(
            "Compare the license files packaged in {} with the License tag and %license \
             entries of the .spec file, and with the licenses found in the source package. \
             Point out any license that is declared but not shipped, shipped but not declared, \
             or that does not match the source.",
            package.display()
        ),
        inputs,
    )
}

/// Step 3: the forced assessment
pub fn declare(package: &Path) -> String {
    format!(
        "Record your final assessment of {} with the declare_license_issue function. Use the \
         file name of the .rpm as the file argument.",
        package.display()
    )
}

pub fn api_feedback() -> String {
    "Having analyzed the package, please provide feedback on the API: which function was \
     missing, hard to use, or returned too much or too little information."
        .to_string()
}

/// Deep scan: walk the exploded tree of the source package
pub fn scan(package: &Path, inputs: &[PathBuf]) -> String {
    with_inputs(
        format!(
            "The binary package {} was built from a source package whose prepared build tree \
             you can explore. Walk the tree and mark every file that contains license or \
             copyright information relevant to {}.",
            package.display(),
            package.display()
        ),
        inputs,
    )
}

/// Deep scan: one batch of flagged files for the analysis session
pub fn flagged_batch(batch: &[FlaggedFile], source_package: Option<&Path>) -> String {
    let entries = batch
        .iter()
        .map(|f| match &f.reason {
            Some(reason) => format!("  - {} ({})", f.file, reason),
            None => format!("  - {}", f.file),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let source = source_package
        .map(|p| format!(" of {}", p.display()))
        .unwrap_or_default();

    format!(
        "A scan of the build tree{} flagged these files as carrying license information. \
         Read them with srpm_read_file and note which licenses they contain:\n{}",
        source, entries
    )
}
