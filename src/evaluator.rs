// Copyright 2026 Phoenix Datasets Contributors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Glue around the official PHOENIX-2014 evaluation script.
//!
//! Scoring itself is delegated to NIST `sclite`, driven through the
//! `evaluatePhoenix2014.sh` script shipped with the corpus; this module only
//! stages the inputs, invokes the script in a scratch directory and parses
//! the textual reports it leaves behind.

use crate::corpus::{Corpus, PhoenixCorpus};
use crate::error::DatasetError;
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const SCRIPT: &str = "evaluatePhoenix2014.sh";
const MERGE_HELPER: &str = "mergectmstm.py";

/// Reports produced by one scoring run.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// sclite system summary (`sys` output)
    pub sum: String,
    /// sclite detailed report, the source of the parsed metrics
    pub dtl: String,
    /// sclite per-utterance alignments
    pub pra: String,
    /// `name = value%` figures from the detailed report:
    /// `total error`, `substitution`, `deletions`, `insertions`
    pub metrics: HashMap<String, f64>,
}

/// # PHOENIX-2014 evaluator
/// Scores gloss hypotheses against the official groundtruth with the corpus'
/// own evaluation script.
pub struct PhoenixEvaluator {
    corpus: PhoenixCorpus,
    folder: PathBuf,
}

impl PhoenixEvaluator {
    /// Fails fast when `sclite` is not on `PATH`; the corpus ships the
    /// official installer tarball under `<root>/evaluation/`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<PhoenixEvaluator, DatasetError> {
        let root = root.as_ref();
        if find_on_path("sclite").is_none() {
            return Err(DatasetError::Evaluation(format!(
                "sclite not found on PATH; it is required for the official WER calculation, \
                 see the installer under {}",
                root.join("evaluation").display()
            )));
        }
        Ok(PhoenixEvaluator {
            corpus: PhoenixCorpus::new(root),
            folder: root.join("evaluation"),
        })
    }

    /// Scores `hyps` (one whitespace-joined gloss sentence per sample, in
    /// id order) against the groundtruth of `split`.
    pub fn evaluate(&self, split: &str, hyps: &[String]) -> Result<EvaluationReport, DatasetError> {
        let records = self.corpus.load_data_frame(split)?;
        if records.len() != hyps.len() {
            warn!(
                "expected {} hypotheses for the {} split, got {}",
                records.len(),
                split,
                hyps.len()
            );
        }

        let ids: Vec<&str> = records.iter().map(|record| record.id.as_str()).collect();
        let ctm = make_ctm(&ids, hyps);

        let scratch = tempfile::tempdir()?;
        self.stage_files(scratch.path(), split)?;
        fix_main_script(&scratch.path().join(SCRIPT))?;
        fix_merge_helper(scratch.path())?;
        fs::write(scratch.path().join("hypothesis.ctm"), ctm)?;

        let output = Command::new(format!("./{}", SCRIPT))
            .arg("hypothesis.ctm")
            .arg(split)
            .current_dir(scratch.path())
            .output()?;
        if !output.status.success() {
            return Err(DatasetError::Evaluation(format!(
                "{} failed: {}",
                SCRIPT,
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let read_report = |extension: &str| -> Result<String, DatasetError> {
            Ok(fs::read_to_string(
                scratch.path().join(format!("out.hypothesis.ctm.{}", extension)),
            )?)
        };
        let sum = read_report("sys")?;
        let dtl = read_report("dtl")?;
        let pra = read_report("pra")?;
        let metrics = parse_dtl(&dtl)?;

        Ok(EvaluationReport {
            sum,
            dtl,
            pra,
            metrics,
        })
    }

    fn stage_files(&self, scratch: &Path, split: &str) -> Result<(), DatasetError> {
        let groundtruth = format!("phoenix2014-groundtruth-{}.stm", split);
        for name in &[SCRIPT, MERGE_HELPER, groundtruth.as_str()] {
            fs::copy(self.folder.join(name), scratch.join(name)).map_err(|e| {
                DatasetError::Evaluation(format!(
                    "cannot stage {} from {}: {}",
                    name,
                    self.folder.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

/// Formats hypotheses as a CTM table in the layout the evaluation script
/// expects. Word positions are zero-padded because the script sorts them as
/// strings; empty hypotheses are written as the single token `[EMPTY]`.
pub fn make_ctm(ids: &[&str], sentences: &[String]) -> String {
    let mut ctm = String::new();
    for (id, sentence) in ids.iter().zip(sentences) {
        let mut words: Vec<&str> = sentence.split_whitespace().collect();
        if words.is_empty() {
            words.push("[EMPTY]");
        }
        for (position, word) in words.iter().enumerate() {
            ctm.push_str(&format!("{} 1 {:06} 1 {}\n", id, position, word));
        }
    }
    ctm
}

/// Formats reference sentences as a TRN transcript, one
/// `sentence (speaker-id)` row per sample.
pub fn make_trn(ids: &[&str], sentences: &[String], speakers: &[&str]) -> String {
    ids.iter()
        .zip(sentences)
        .zip(speakers)
        .map(|((id, sentence), speaker)| format!("{} ({}-{})\n", sentence, speaker, id))
        .collect()
}

/// Parses the `name = value%` figures of the `WORD RECOGNITION PERFORMANCE`
/// section of an sclite detailed report. The redundant `correct` row is
/// dropped.
pub fn parse_dtl(dtl: &str) -> Result<HashMap<String, f64>, DatasetError> {
    let section = dtl
        .split("WORD RECOGNITION PERFORMANCE")
        .nth(1)
        .ok_or_else(|| {
            DatasetError::Evaluation(
                "no WORD RECOGNITION PERFORMANCE section in detailed report".to_owned(),
            )
        })?;

    let mut metrics = HashMap::new();
    for line in section.trim().lines().take(7).filter(|l| !l.trim().is_empty()) {
        let (name, tail) = line.split_once('=').ok_or_else(|| {
            DatasetError::Evaluation(format!("unparseable report line: {}", line))
        })?;
        let value = tail.split_once('%').map(|(v, _)| v).unwrap_or(tail).trim();
        let value: f64 = value.parse().map_err(|_| {
            DatasetError::Evaluation(format!("unparseable report value: {}", line))
        })?;
        let name = name.to_lowercase().replace("percent", "").trim().to_owned();
        if name != "correct" {
            metrics.insert(name, value);
        }
    }
    Ok(metrics)
}

/// Known breakages of the shipped script on current systems: the merge
/// helper must be invoked relative to the working directory, and the `dtl`
/// report is not in the default output list.
fn fix_main_script(path: &Path) -> Result<(), DatasetError> {
    let content = fs::read_to_string(path)?;
    let content = content
        .replace(&format!(" {}", MERGE_HELPER), &format!(" ./{}", MERGE_HELPER))
        .replace("-o sgml sum rsum pra", "-o sgml sum rsum pra dtl");
    fs::write(path, content)?;
    Ok(())
}

/// The shipped python helper mixes tabs and spaces, which newer python
/// versions reject as a TabError. Re-indents with spaces when that happens.
fn fix_merge_helper(scratch: &Path) -> Result<(), DatasetError> {
    let output = Command::new(format!("./{}", MERGE_HELPER))
        .current_dir(scratch)
        .output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("TabError") {
        let path = scratch.join(MERGE_HELPER);
        let content = fs::read_to_string(&path)?;
        fs::write(&path, content.replace('\t', &" ".repeat(8)))?;
    } else if !output.status.success() && !stderr.contains("out of range") {
        return Err(DatasetError::Evaluation(format!(
            "{} is broken: {}",
            MERGE_HELPER, stderr
        )));
    }
    Ok(())
}

fn find_on_path(binary: &str) -> Option<PathBuf> {
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(binary))
            .find(|candidate| candidate.is_file())
    })
}
