use super::MultipleAligner;
use crate::utils::{Error, Result};
use bio::io::fasta;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Command,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MsaTool {
    Mafft,
    ClustalOmega,
    Muscle,
}

impl MsaTool {
    fn detect(program: &Path) -> Option<Self> {
        let stem = program.file_stem()?.to_str()?.to_ascii_lowercase();
        match stem.as_str() {
            "mafft" => Some(MsaTool::Mafft),
            "clustalo" | "clustal-omega" => Some(MsaTool::ClustalOmega),
            "muscle" => Some(MsaTool::Muscle),
            _ => None,
        }
    }

    /// Arguments making the tool read `input` and print aligned FASTA to stdout.
    fn args(&self, input: &Path) -> Vec<String> {
        let input = input.to_string_lossy().into_owned();
        match self {
            MsaTool::Mafft => vec!["--quiet".into(), "--auto".into(), input],
            MsaTool::ClustalOmega => vec![
                "-i".into(),
                input,
                "--outfmt=fasta".into(),
                "--output-order=input-order".into(),
            ],
            MsaTool::Muscle => vec!["-align".into(), input, "-output".into(), "/dev/stdout".into()],
        }
    }
}

/// Multiple alignment delegated to an installed MSA program.
#[derive(Debug, Clone)]
pub struct ExternalAligner {
    program: PathBuf,
    tool: MsaTool,
}

impl ExternalAligner {
    pub fn new(program: impl Into<PathBuf>) -> Result<Self> {
        let program = program.into();
        let tool = MsaTool::detect(&program).ok_or_else(|| {
            Error::AlignmentUnavailable(format!(
                "{} is not a supported MSA program (mafft, clustalo, muscle)",
                program.display()
            ))
        })?;
        Ok(Self { program, tool })
    }

    fn write_input(&self, seqs: &[&str]) -> Result<tempfile::NamedTempFile> {
        let input = tempfile::Builder::new()
            .prefix("hlaref-msa-")
            .suffix(".fa")
            .tempfile()?;
        let mut writer = fasta::Writer::new(input.as_file());
        for (index, seq) in seqs.iter().enumerate() {
            writer.write(&anonymous_id(index), None, seq.as_bytes())?;
        }
        writer.flush()?;
        drop(writer);
        Ok(input)
    }

    fn run(&self, input: &Path) -> Result<Vec<u8>> {
        let unavailable = |message: String| Error::AlignmentUnavailable(message);
        let output = Command::new(&self.program)
            .args(self.tool.args(input))
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    unavailable(format!("{} not found", self.program.display()))
                } else {
                    unavailable(format!("could not run {}: {}", self.program.display(), e))
                }
            })?;
        if !output.status.success() {
            return Err(unavailable(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }
}

impl MultipleAligner for ExternalAligner {
    fn align(&self, seqs: &[&str]) -> Result<Vec<String>> {
        if seqs.is_empty() {
            return Ok(Vec::new());
        }
        let input = self.write_input(seqs)?;
        log::debug!(
            "Running {} on {} sequences",
            self.program.display(),
            seqs.len()
        );
        let stdout = self.run(input.path())?;
        parse_aligned_fasta(&stdout, seqs.len())
    }
}

fn anonymous_id(index: usize) -> String {
    format!("seq{}", index)
}

/// Reads aligned FASTA back into input order.
fn parse_aligned_fasta(data: &[u8], expected: usize) -> Result<Vec<String>> {
    let malformed = |message: String| Error::AlignmentUnavailable(message);
    let mut rows: Vec<Option<String>> = vec![None; expected];
    for record in fasta::Reader::new(data).records() {
        let record = record.map_err(|e| malformed(format!("unreadable MSA output: {}", e)))?;
        let slot = record
            .id()
            .strip_prefix("seq")
            .and_then(|i| i.parse::<usize>().ok())
            .filter(|&i| i < expected)
            .ok_or_else(|| malformed(format!("unexpected sequence id {}", record.id())))?;
        let row = String::from_utf8_lossy(record.seq())
            .chars()
            .map(|c| if c == '.' { '-' } else { c.to_ascii_uppercase() })
            .collect::<String>();
        rows[slot] = Some(row);
    }

    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| row.ok_or_else(|| malformed(format!("{} missing from MSA output", anonymous_id(i)))))
        .collect::<Result<Vec<_>>>()?;
    if let Some(width) = rows.first().map(String::len) {
        if rows.iter().any(|r| r.len() != width) {
            return Err(malformed("MSA rows differ in width".to_string()));
        }
    }
    Ok(rows)
}
