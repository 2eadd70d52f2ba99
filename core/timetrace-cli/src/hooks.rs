//! Shell integration scripts printed by `timetrace init`.
//!
//! Each hook times the command itself and hands the result to
//! `timetrace record`, so tracking never wraps or delays the command.

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Powershell,
}

pub fn script(shell: Shell) -> &'static str {
    match shell {
        Shell::Bash | Shell::Zsh => POSIX_HOOK,
        Shell::Powershell => POWERSHELL_HOOK,
    }
}

const POSIX_HOOK: &str = r##"# timetrace auto-tracking for bash/zsh
# Usage:
#   eval "$(timetrace init bash)"   # or zsh
#
# Optional grouping:
#   export TIMETRACE_PROJECT=acme TIMETRACE_TAG=client
#
# Disable:
#   trap - DEBUG; unset -f __timetrace_preexec __timetrace_precmd

__timetrace_now() {
  date -u +%Y-%m-%dT%H:%M:%SZ
}

__timetrace_preexec() {
  [ "${__TIMETRACE_ARMED:-0}" = 1 ] || return 0
  __TIMETRACE_ARMED=0
  __TIMETRACE_CMD="$1"
  __TIMETRACE_START="$(__timetrace_now)"
}

__timetrace_precmd() {
  local exit_code="$?"
  if [ -n "${__TIMETRACE_CMD:-}" ]; then
    command timetrace record \
      --started "$__TIMETRACE_START" --finished "$(__timetrace_now)" \
      --exit "$exit_code" --cwd "$PWD" --command "$__TIMETRACE_CMD" \
      ${TIMETRACE_TAG:+--tag "$TIMETRACE_TAG"} \
      ${TIMETRACE_PROJECT:+--project "$TIMETRACE_PROJECT"} >/dev/null 2>&1 || true
  fi
  __TIMETRACE_CMD=""
  return "$exit_code"
}

__timetrace_arm() {
  __TIMETRACE_ARMED=1
}

__TIMETRACE_ARMED=0

if [ -n "${ZSH_VERSION:-}" ]; then
  autoload -Uz add-zsh-hook
  add-zsh-hook preexec __timetrace_preexec
  add-zsh-hook precmd __timetrace_precmd
  add-zsh-hook precmd __timetrace_arm
elif [ -n "${BASH_VERSION:-}" ]; then
  # DEBUG fires for every simple command; only the first one after a
  # prompt is the command line the user typed.
  trap '__timetrace_preexec "$BASH_COMMAND"' DEBUG
  PROMPT_COMMAND="__timetrace_precmd${PROMPT_COMMAND:+; $PROMPT_COMMAND}; __timetrace_arm"
fi
"##;

const POWERSHELL_HOOK: &str = r##"# timetrace auto-tracking for PowerShell
# Usage:
#   Invoke-Expression (& timetrace init powershell | Out-String)
#
# Optional grouping:
#   $env:TIMETRACE_PROJECT = "acme"
#   $env:TIMETRACE_TAG = "client"

$global:TimetraceLastHistoryId = -1
$global:TimetraceOriginalPrompt = $function:prompt

function global:prompt {
    $succeeded = $?
    try {
        $entry = Get-History -Count 1
        if ($null -ne $entry -and $entry.Id -ne $global:TimetraceLastHistoryId) {
            $global:TimetraceLastHistoryId = $entry.Id
            $exitCode = if ($succeeded) { 0 } elseif ($LASTEXITCODE) { $LASTEXITCODE } else { 1 }
            $recordArgs = @(
                "record",
                "--started", $entry.StartExecutionTime.ToUniversalTime().ToString("o"),
                "--finished", $entry.EndExecutionTime.ToUniversalTime().ToString("o"),
                "--exit", $exitCode,
                "--cwd", (Get-Location).Path,
                "--command", $entry.CommandLine
            )
            if ($env:TIMETRACE_TAG) { $recordArgs += @("--tag", $env:TIMETRACE_TAG) }
            if ($env:TIMETRACE_PROJECT) { $recordArgs += @("--project", $env:TIMETRACE_PROJECT) }
            & timetrace @recordArgs | Out-Null
        }
    } catch {
        # tracking must never break the prompt
    }
    & $global:TimetraceOriginalPrompt
}
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix_hook_records_with_utc_timestamps() {
        let script = script(Shell::Bash);
        assert!(script.contains("timetrace record"));
        assert!(script.contains("date -u +%Y-%m-%dT%H:%M:%SZ"));
        assert!(script.contains("add-zsh-hook precmd"));
        assert_eq!(script, super::script(Shell::Zsh));
    }

    #[test]
    fn powershell_hook_uses_history_timing() {
        let script = script(Shell::Powershell);
        assert!(script.contains("Get-History -Count 1"));
        assert!(script.contains("StartExecutionTime"));
        assert!(script.contains("\"record\""));
    }
}
