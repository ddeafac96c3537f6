//! External dependency check: every required program must be on `PATH` and
//! report a new enough version. All problems are gathered before failing.

use anyhow::Result;

use crate::config::{RequiredProgram, VersionOp};
use crate::error::BatchError;
use crate::process;

/// Extracts a version string from a `--version` style probe.
///
/// Uses stdout, or stderr when stdout is empty (e.g. `java -version`), takes
/// the last word of the first line and strips `"`, `v`, `V` and `+`.
pub fn parse_version_output(stdout: &str, stderr: &str) -> Option<String> {
    let text = if stdout.trim().is_empty() { stderr } else { stdout };
    let word = text.lines().next()?.split_whitespace().last()?;
    let cleaned: String = word
        .chars()
        .filter(|c| !matches!(c, '"' | 'v' | 'V' | '+'))
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn leading_number(part: &str) -> u64 {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

fn major_minor(parts: &[&str]) -> (u64, u64) {
    (
        parts.first().map(|p| leading_number(p)).unwrap_or(0),
        parts.get(1).map(|p| leading_number(p)).unwrap_or(0),
    )
}

/// Compares a found version against a requirement.
///
/// `>=` compares major.minor, then the third component (build suffix after
/// `_` ignored, missing counts as 0) only if the requirement has one.
pub fn version_satisfies(found: &str, op: VersionOp, required: &str) -> bool {
    match op {
        VersionOp::Exactly => found == required,
        VersionOp::AtLeast => {
            let f: Vec<&str> = found.split('.').collect();
            let r: Vec<&str> = required.split('.').collect();
            let (fm, rm) = (major_minor(&f), major_minor(&r));
            if fm != rm {
                return fm > rm;
            }
            match r.get(2) {
                None => true,
                Some(req_patch) => {
                    let found_patch = f
                        .get(2)
                        .and_then(|p| p.split('_').next())
                        .map(leading_number)
                        .unwrap_or(0);
                    found_patch >= leading_number(req_patch)
                }
            }
        }
    }
}

fn requirement_message(req: &RequiredProgram) -> String {
    format!(
        "It is required {} with version {} {}",
        req.program,
        req.op.as_str(),
        req.version
    )
}

/// Probes one program. Returns a problem description, or None if it is fine.
async fn check_program(req: &RequiredProgram) -> Option<String> {
    let not_found = || format!("{} not found in PATH.", req.program);
    let which = match process::run_command(&["which", req.program.as_str()], None).await {
        Ok(out) if out.success => out,
        Ok(_) => return Some(not_found()),
        Err(e) => {
            tracing::warn!("which {}: {:#}", req.program, e);
            return Some(not_found());
        }
    };
    let stdout = which.stdout_lossy();
    let Some(resolved) = stdout.lines().next().map(str::trim).filter(|s| !s.is_empty()) else {
        return Some(not_found());
    };

    let probe = match process::run_command(&[resolved, req.version_flag.as_str()], None).await {
        Ok(out) => out,
        Err(e) => {
            tracing::warn!("{} {}: {:#}", resolved, req.version_flag, e);
            return Some(requirement_message(req));
        }
    };
    let Some(found) = parse_version_output(&probe.stdout_lossy(), &probe.stderr_lossy()) else {
        tracing::warn!("{}: could not determine version", req.program);
        return Some(requirement_message(req));
    };
    tracing::info!("{} ({}) found", req.program, found);

    if version_satisfies(&found, req.op, &req.version) {
        None
    } else {
        Some(requirement_message(req))
    }
}

/// Checks every required program and returns all problems found.
pub async fn check_programs(required: &[RequiredProgram]) -> Vec<String> {
    tracing::info!("Checking dependencies...");
    let mut missing = Vec::new();
    for req in required {
        if let Some(problem) = check_program(req).await {
            missing.push(problem);
        }
    }
    missing
}

/// Fails with [`BatchError::MissingDependencies`] if anything is missing.
pub async fn ensure_programs(required: &[RequiredProgram]) -> Result<()> {
    let missing = check_programs(required).await;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(BatchError::MissingDependencies(missing).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_version_from_stdout() {
        assert_eq!(
            parse_version_output("getSeqENA.py v0.4\n", "").as_deref(),
            Some("0.4")
        );
        assert_eq!(
            parse_version_output("gunzip (gzip) 1.6\nCopyright", "").as_deref(),
            Some("1.6")
        );
    }

    #[test]
    fn parse_version_falls_back_to_stderr() {
        assert_eq!(
            parse_version_output("", "java version \"1.8.0_45\"\nJava(TM) SE").as_deref(),
            Some("1.8.0_45")
        );
    }

    #[test]
    fn parse_version_empty_output() {
        assert_eq!(parse_version_output("", ""), None);
        assert_eq!(parse_version_output("\n", "  "), None);
    }

    #[test]
    fn at_least_major_minor() {
        assert!(version_satisfies("1.6", VersionOp::AtLeast, "1.6"));
        assert!(version_satisfies("2.0", VersionOp::AtLeast, "1.6"));
        assert!(version_satisfies("1.10", VersionOp::AtLeast, "1.6"));
        assert!(!version_satisfies("1.5.9", VersionOp::AtLeast, "1.6"));
        assert!(!version_satisfies("0.3", VersionOp::AtLeast, "0.4"));
    }

    #[test]
    fn at_least_patch_only_when_required() {
        assert!(version_satisfies("3.6.1.110647", VersionOp::AtLeast, "3.6.1"));
        assert!(!version_satisfies("3.6.0", VersionOp::AtLeast, "3.6.1"));
        assert!(!version_satisfies("3.6", VersionOp::AtLeast, "3.6.1"));
        assert!(version_satisfies("1.8.0_45", VersionOp::AtLeast, "1.8"));
        assert!(version_satisfies("1.8.2_45", VersionOp::AtLeast, "1.8.1"));
    }

    #[test]
    fn exact_match() {
        assert!(version_satisfies("2.4", VersionOp::Exactly, "2.4"));
        assert!(!version_satisfies("2.4.1", VersionOp::Exactly, "2.4"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_programs_reported_together() {
        let required = vec![
            RequiredProgram {
                program: "seqbatch-no-such-tool-a".to_string(),
                version_flag: "--version".to_string(),
                op: VersionOp::AtLeast,
                version: "1.0".to_string(),
            },
            RequiredProgram {
                program: "seqbatch-no-such-tool-b".to_string(),
                version_flag: "--version".to_string(),
                op: VersionOp::AtLeast,
                version: "1.0".to_string(),
            },
        ];
        let err = ensure_programs(&required).await.unwrap_err();
        match err.downcast_ref::<BatchError>() {
            Some(BatchError::MissingDependencies(list)) => {
                assert_eq!(list.len(), 2);
                assert_eq!(list[0], "seqbatch-no-such-tool-a not found in PATH.");
                assert_eq!(list[1], "seqbatch-no-such-tool-b not found in PATH.");
            }
            other => panic!("expected MissingDependencies, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn no_requirements_is_ok() {
        ensure_programs(&[]).await.unwrap();
    }
}
