use anyhow::{bail, Context, Result};

use ulp_asm::session::RunRequest;
use ulp_asm::{Command, ProgramSession, SessionConfig};

/// Drops `;` comments anywhere and `#` comments at line start.
fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(';') {
        Some(p) => &line[..p],
        None => line,
    }
}

/// Assembles a whole source file into a loadable image. Each non-blank line
/// is one instruction or `var(...)`; shell-only commands are refused.
pub fn assemble_source(src: &str, cfg: SessionConfig, start_index: usize) -> Result<RunRequest> {
    let mut session = ProgramSession::new(cfg)?;
    for (n, raw) in src.lines().enumerate() {
        let line = strip_comment(raw);
        if line.trim().is_empty() {
            continue;
        }
        let lineno = n + 1;
        let appended = match ulp_asm::shell::parse_command(line) {
            Command::Var(v) => session.append_variable(v),
            Command::Instruction(text) => session.append_instruction(&text),
            other => bail!("line {lineno}: {other:?} is only available in the shell"),
        };
        appended.with_context(|| format!("line {lineno}: {}", raw.trim()))?;
    }
    Ok(session.finalize_for_run(start_index)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blank_lines() {
        let src = "# blink\nmove r0, 1 ; set\n\n  var(7)\nhalt\n";
        let req = assemble_source(src, SessionConfig::default(), 0).unwrap();
        // header + 3 words + epilogue
        assert_eq!(req.image.len(), 12 + 5 * 4);
    }

    #[test]
    fn error_names_the_line() {
        let err = assemble_source("halt\nfoo r1\n", SessionConfig::default(), 0).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn shell_commands_are_refused() {
        assert!(assemble_source("halt\nrun 0\n", SessionConfig::default(), 0).is_err());
    }
}
